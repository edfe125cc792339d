//! Chatline Client
//!
//! Terminal host for the chat widget: the HTTP transport and uploader for
//! the chat backend, desktop clipboard and voice output, configuration, and
//! the interactive session.

pub mod api;
pub mod config;
pub mod platform;
pub mod repl;

pub use api::WidgetClient;
pub use config::Config;
