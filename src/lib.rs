//! Instantiate an MCP service template into a fresh, customized project.
//!
//! The engine lives in [`core::templates`]; [`cli`] holds the interactive
//! front end used by the `mcp-template-setup` binary.
#![deny(unsafe_code)]

pub mod cli;
pub mod core;
