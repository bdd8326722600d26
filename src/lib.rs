//! routecache - add server-side caching to Next.js API routes
//!
//! Finds App Router route handlers, derives a caching policy from each
//! route path and rewrites the handler's data-fetch query to go through
//! `unstable_cache`. The transformation itself ([`transform::Transformer`])
//! is pure; reading and writing files happens in the `apply` command.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod policy;
pub mod report;
pub mod route;
pub mod transform;
pub mod ui;

pub use error::{RouteCacheError, RouteCacheResult};
