//! A2A (Agent-to-Agent) protocol support for Wayfarer
//!
//! Agents expose a [`TaskHandler`] over HTTP with [`A2aServer`]; callers reach
//! them with [`A2aClient`], or wrap a peer as a local tool with
//! [`RemoteAgentTool`].

pub mod client;
pub mod error;
pub mod protocol;
pub mod serve;
pub mod server;
pub mod tool;

pub use client::{A2aClient, AgentEndpoint};
pub use error::A2aError;
pub use protocol::{AgentCard, AuthConfig, TaskRequest, TaskResponse, TaskStatus};
pub use serve::{ServeHandle, serve};
pub use server::{A2aServer, TaskHandler, TaskOutput};
pub use tool::{RemoteAgentTool, WaitPolicy};
