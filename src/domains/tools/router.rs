//! Tool Router - builds the rmcp ToolRouter from the tool definitions.
//!
//! Each tool knows how to create its own route; the shared [`BusContext`]
//! is captured by every route.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::domains::bus::BusContext;

use super::definitions::{
    ApproachForRouteTool, ApproachForStationTool, StationNumberTool, TimetableTool,
};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(context: Arc<BusContext>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(StationNumberTool::create_route(context.clone()))
        .with_route(TimetableTool::create_route(context.clone()))
        .with_route(ApproachForRouteTool::create_route(context.clone()))
        .with_route(ApproachForStationTool::create_route(context))
}

#[cfg(test)]
mod tests {
    use super::super::registry::ToolRegistry;
    use super::*;
    use crate::domains::bus::testing::FakeTransitApi;

    struct TestServer {}

    async fn test_context() -> Arc<BusContext> {
        Arc::new(
            BusContext::with_api(Arc::new(FakeTransitApi::sakae_route()))
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_context().await);
        let tools = router.list_all();
        assert_eq!(tools.len(), 4);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"get_station_number"));
        assert!(names.contains(&"get_timetable"));
        assert!(names.contains(&"get_approach_for_route"));
        assert!(names.contains(&"get_approach_for_station"));
    }

    #[tokio::test]
    async fn test_registry_matches_router() {
        let context = test_context().await;
        let registry = ToolRegistry::new(context.clone());
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(context);
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
