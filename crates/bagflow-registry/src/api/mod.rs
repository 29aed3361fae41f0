//! Registry API client modules
//!
//! - `client`: the HTTP client itself
//! - `endpoints`: URL builders
//! - `types`: request/response payloads

pub mod client;
pub mod endpoints;
pub mod types;
