//! # API Module
//!
//! HTTP endpoints served by `release-radar serve`.
//!
//! ## Endpoints
//!
//! - [`health`] - `GET /health`, application status and version for monitoring
//!   systems and load balancers.
//! - [`release_radar`] - `POST /release-radar`, runs the job for every opted-in
//!   user and returns the `{ succeeded, failed }` summary as JSON. Returns
//!   `409 Conflict` while a run is already in progress.
//!
//! The router itself lives in [`crate::server`].

mod health;
mod trigger;

pub use health::health;
pub use trigger::release_radar;
