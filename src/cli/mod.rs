//! # CLI Module
//!
//! Implementations of the `release-radar` subcommands. Each command loads what
//! it needs from [`Settings`](crate::config::Settings), delegates to the
//! library and reports to the terminal with the colored status macros.
//!
//! ## Commands
//!
//! - [`run`] - one Release Radar run for all opted-in users
//! - [`serve`] - HTTP trigger (`POST /release-radar`) and health endpoint
//! - [`schedule`] - cron driven runs, every Friday by default
//! - [`list_users`], [`add_user`], [`set_active`], [`show_user`] - user store
//!   management
//!
//! ## Usage
//!
//! ```bash
//! release-radar users add --email me@example.com --user-id me --refresh-token AQD...
//! release-radar run
//! release-radar schedule --run-now
//! ```

mod run;
mod schedule;
mod serve;
mod users;

pub use run::print_summary;
pub use run::run;
pub use schedule::schedule;
pub use serve::serve;
pub use users::add_user;
pub use users::list_users;
pub use users::set_active;
pub use users::show_user;
