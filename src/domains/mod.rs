//! Domains module containing business logic organized by bounded contexts.
//!
//! - **bus**: transit API gateway, reference data and the approach engine
//! - **tools**: MCP tools exposing bus information to clients
//! - **prompts**: ready-made bus questions

pub mod bus;
pub mod prompts;
pub mod tools;
