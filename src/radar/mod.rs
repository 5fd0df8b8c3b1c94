//! The Release Radar pipeline.
//!
//! ```text
//! ChronJob
//!   └── per user
//!         CredentialStore
//!           -> ReleaseRadarAggregator
//!           -> PlaylistReconciler
//!           -> UserStore::record_run
//! ```

mod aggregate;
mod job;
pub mod playlist;

pub use aggregate::ReleaseRadarAggregator;
pub use job::ChronJob;
pub use playlist::PlaylistReconciler;
