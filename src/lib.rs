//! Release Radar
//!
//! Builds a weekly "Release Radar" playlist for every opted-in Spotify user:
//! resolves the artists a user follows, scans each artist's catalog for
//! releases of the last days, resolves albums down to tracks and replaces the
//! content of the user's playlist with the result.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints (health, run trigger)
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by all components
//! - `management` - Persistent user store
//! - `radar` - Aggregation, playlist reconciliation and the per-user job
//! - `server` - HTTP server wiring
//! - `spotify` - Spotify Web API client, rate limiting and token exchange
//! - `types` - Data structures and type definitions
//! - `utils` - Recency window, uri helpers and release kinds
//!
//! # Example
//!
//! ```ignore
//! use release_radar::{config::{self, Settings}, radar::ChronJob};
//!
//! #[tokio::main]
//! async fn main() -> release_radar::Res<()> {
//!     config::load_env().await?;
//!     let job = ChronJob::from_settings(&Settings::from_env()?).await?;
//!     let summary = job.run().await?;
//!     println!("{} users updated", summary.succeeded.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod radar;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Boxed error alias used at the binary edge, where library [`Error`]s and
/// foreign errors meet.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints `[o] message` to stdout.
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints `[✓] message` to stdout.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints `[!] message` in red and exits with status 1.
///
/// ```ignore
/// let job = match ChronJob::from_settings(&settings).await {
///     Ok(job) => job,
///     Err(e) => error!("Cannot set up release radar job. Err: {}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints `[!] message` in yellow. Does not exit.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
