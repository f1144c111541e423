//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `GET /events` - Recent hit/miss events
//! - `POST /invalidate/tags` - Remove entries by tag
//! - `POST /invalidate/pattern` - Remove entries whose URL matches a regex
//! - `DELETE /namespace/:name` - Remove a namespace
//! - `POST /namespace/:name/invalidate/tags` - Invalidate a namespace by tag
//! - `DELETE /entries` - Remove everything
//! - `POST /entries/delete` - Remove the entry for one request
//! - `POST /fetch` - Fetch through the cache

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
