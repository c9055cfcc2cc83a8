//! # thermodiff-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small **read-only JSON API** over the controller status
//!   registry (`/api/controllers`, `/api/controllers/{device}`)
//! - Serve a `/health` probe
//! - Map domain errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `thermodiff-app` (for the status registry) and
//! `thermodiff-domain` (for types used in response mapping). Never leaks
//! axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
