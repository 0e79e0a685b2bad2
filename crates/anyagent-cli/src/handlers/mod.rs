//! Command handlers.
//!
//! Handlers are thin: they load input, call into `anyagent-mcp` and format the
//! result for the terminal.

pub mod frameworks;
pub mod tools;
