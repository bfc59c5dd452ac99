pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};

pub use crate::adapters::http::ApiClient;
pub use crate::app::AppContext;
pub use crate::config::{cli::LocalStorage, Settings};
pub use crate::core::{dashboard::Dashboard, direct::DirectPurchase, session::SessionManager};
pub use crate::utils::error::{AppError, Result};
