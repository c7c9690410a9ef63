//! Game library launcher: achievement side
//!
//! The root crate owns the launcher's collaborator data ([`library`]) and the
//! [`Launcher`](launcher::Launcher) facade that feeds it to the achievement
//! engine and persists the results. The engine itself lives in the
//! `achievements` crate, persistence in `save`, errors in `error`.

pub mod config;
pub mod launcher;
pub mod library;

pub use achievements;
pub use config::LauncherConfig;
pub use launcher::{Launcher, NotificationLog, display_error};
pub use library::{LibraryError, LibraryStore, collect_snapshot};
