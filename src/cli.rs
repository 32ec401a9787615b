//! Command-line arguments for lenstui.

use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Parser, Debug)]
#[command(
    name = "lenstui",
    version,
    about = "Remote data dashboard exploration in the terminal"
)]
pub struct Args {
    /// Base URL of the dashboard service (overrides the config file)
    #[arg(long = "url", value_name = "URL")]
    pub service_url: Option<String>,

    /// Send this user-email header with every request (per-user datasets)
    #[arg(long = "email", value_name = "EMAIL")]
    pub user_email: Option<String>,

    /// Rows per page at startup (5, 10, 25, or 50)
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<usize>,

    /// Upload this file to the service before opening the browser view
    #[arg(long = "upload", value_name = "PATH")]
    pub upload: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Write a commented default config file and exit
    #[arg(long = "generate-config")]
    pub generate_config: bool,

    /// Overwrite an existing config file when used with --generate-config
    #[arg(long = "force", requires = "generate_config")]
    pub force: bool,
}
