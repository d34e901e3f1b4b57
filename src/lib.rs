//! Client layer for a classical Chinese poetry backend
//!
//! - `http`: configured request sender with bearer tokens and error mapping
//! - `api`: typed wrappers over the content (v1) and account (v2) endpoints
//! - `hooks`: observable loading/error/result state around API calls
//! - `store`: session and reference-data stores shared across the app
//! - `router`: path-to-view resolution with auth guards
//! - `format`: terminal display helpers

pub mod account;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod format;
pub mod hooks;
pub mod http;
pub mod logging;
pub mod router;
pub mod storage;
pub mod store;
