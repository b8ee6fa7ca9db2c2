//! API Module
//!
//! HTTP handlers and routing for the cache readiness and maintenance surface.
//!
//! # Endpoints
//! - `GET /health` - Probe the active cache tier
//! - `GET /stats` - Key census by namespace
//! - `POST /maintenance/flush-temporary` - Remove every temporary key
//! - `DELETE /users/:id/cache` - Remove a user's session and player stats
//! - `DELETE /factions/:id/cache` - Remove a faction's cached state

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
