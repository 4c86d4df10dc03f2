//! Command line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::DEFAULT_REFRESH;
use crate::gateway::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Parser)]
#[command(name = "userbook", version, about = "Browse, search and edit user records served by a REST backend")]
pub struct Cli {
    /// Base url of the backend exposing `/users`.
    #[arg(long, env = "USERBOOK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Interval between list refreshes, in milliseconds.
    #[arg(
        long = "refresh-ms",
        env = "USERBOOK_REFRESH_MS",
        default_value_t = DEFAULT_REFRESH.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(100..)
    )]
    pub refresh_ms: u64,

    /// Directory holding theme.conf and keybinds.conf.
    #[arg(long, env = "USERBOOK_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log file; stdout belongs to the terminal UI.
    #[arg(long, env = "USERBOOK_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, env = "USERBOOK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.config_dir
            .clone()
            .unwrap_or_else(crate::app::default_config_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.config_dir().join("userbook.log"))
    }
}
