//! Back-office console for the recruitment platform.
//!
//! Every backend call goes through [`client::ApiClient`], which attaches the
//! session's bearer token and renews an expired session transparently.

pub mod client;
pub mod commands;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod models;
pub mod session;
