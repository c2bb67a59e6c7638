//! # Application Module
//!
//! - [`chatbot`] - the conversation loop over a model and a tool session
//! - [`catalog`] - tool descriptors reshaped for the model API
//! - [`translate`] - tool output to model content, and answer extraction
//! - [`gateway`] - tool calls against the attached session
//! - [`tooling`] - MCP sessions over stdio and streamable HTTP
//! - [`stdio`] - the interactive prompt

pub mod catalog;
pub mod chatbot;
pub mod gateway;
pub mod stdio;
pub mod tooling;
pub mod translate;
