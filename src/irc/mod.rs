//! IRC protocol layer: line parsing, event dispatch, session management and
//! outbound commands.

pub mod client;
pub mod commands;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod message;
pub mod outbound;

pub use client::{Client, ClientBuilder, ReconnectPolicy, SessionState};
pub use error::Error;
pub use hub::{Hub, WILDCARD};
pub use message::{parse, Message, ParseError};
