//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::dial::{DialConfig, Viewport, DEFAULT_GROW_MS};
use crate::services::Lang;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "rainbow-dial")]
#[command(about = "A drag-to-set visual countdown dial with confetti, served over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding the persisted timer and mute flag
    #[arg(long, default_value = "rainbow-dial.json")]
    pub store: PathBuf,

    /// Keep state in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Initial viewport width
    #[arg(long, default_value = "1280")]
    pub width: f64,

    /// Initial viewport height
    #[arg(long, default_value = "800")]
    pub height: f64,

    /// Hint language ("en", "de"); detected from the locale when omitted
    #[arg(long)]
    pub lang: Option<String>,

    /// Growing lead-in before the confetti burst, in milliseconds
    #[arg(long, default_value_t = DEFAULT_GROW_MS)]
    pub grow_ms: i64,

    /// Never schedule desktop notifications
    #[arg(long)]
    pub no_notifications: bool,

    /// Let the host sleep while a countdown runs
    #[arg(long)]
    pub no_keep_awake: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn lang(&self) -> Lang {
        match &self.lang {
            Some(lang) => Lang::from_locale(lang),
            None => Lang::detect(),
        }
    }

    pub fn dial_config(&self) -> DialConfig {
        DialConfig {
            viewport: Viewport::new(self.width.max(1.0), self.height.max(1.0)),
            dial_center: None,
            grow_ms: self.grow_ms.max(0),
        }
    }
}
