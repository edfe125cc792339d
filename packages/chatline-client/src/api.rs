//! HTTP client for the chat backend
//!
//! Implements the transport and uploader capabilities against the backend's
//! `/chat` and `/upload` endpoints.

pub mod client;
pub mod types;

pub use client::*;
