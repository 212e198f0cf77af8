//! kantan-cms-mcp: MCP server for the Kantan CMS
//!
//! This library exposes a Kantan CMS project to AI assistants as a set of
//! tools:
//!
//! - **Content API**: list, count and fetch collections and records, schema
//!   introspection, API key validation
//! - **Documentation**: table of contents, API categories, build and form
//!   integration instructions
//! - **Project bootstrap**: `.env` content and the starter builder template
//!
//! Every tool is one HTTP round trip (or one download-extract sequence);
//! there is no caching, retrying or background work.
//!
//! # Modules
//!
//! - [`config`]: Credentials, settings file and the runtime [`config::CmsConfig`]
//! - [`error`]: Configuration error types
//! - [`cms`]: CMS API and documentation clients
//! - [`stager`]: Starter template download and extraction
//! - [`mcp`]: MCP protocol implementation

pub mod cms;
pub mod config;
pub mod error;
pub mod mcp;
pub mod stager;
