//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Edge Scroll - edge-scrolling and corner taps for precision touch pads
#[derive(Parser, Debug)]
#[command(name = "edge-scroll")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded trace through the engine
    Replay {
        /// Trace file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,

        /// Event buffer capacity between the engine and the printer
        #[arg(long, default_value = "1024")]
        buffer: usize,
    },

    /// Resolve a raw HID report descriptor and print the surface it describes
    Describe {
        /// Descriptor file (binary)
        descriptor: PathBuf,

        /// Device name
        #[arg(short, long, default_value = "Touch Pad")]
        name: String,

        /// Vendor id
        #[arg(long, default_value = "0")]
        vendor_id: u16,

        /// Product id
        #[arg(long, default_value = "0")]
        product_id: u16,
    },

    /// List recorded traces
    List {
        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "zones.width_percent", "scroll.speed")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the trace directory
    pub fn traces_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".edge_scroll").join("traces"))
            .unwrap_or_else(|| PathBuf::from("traces"))
    }
}
