//! Tool definitions module.
//!
//! Each tool is defined in its own file; `common` holds the result helpers
//! they share.

pub mod approach_route;
pub mod approach_station;
pub mod common;
pub mod station_number;
pub mod timetable;

pub use approach_route::{ApproachForRouteParams, ApproachForRouteTool};
pub use approach_station::{ApproachForStationParams, ApproachForStationTool};
pub use station_number::{StationNumberParams, StationNumberTool};
pub use timetable::{TimetableParams, TimetableTool};
