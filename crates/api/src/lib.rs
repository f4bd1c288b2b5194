//! Herald HTTP API.
//!
//! Endpoints:
//! - POST /api/notify/ — Validate, persist, and schedule a notification
//! - GET  /api/notifications/{id} — A stored notification and its delivery logs
//! - GET  /health — Liveness plus record store reachability

pub mod routes;
pub mod state;
