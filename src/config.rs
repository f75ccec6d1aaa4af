use chrono::Duration;
use clap::{ArgAction, Args};
use std::path::PathBuf;

use crate::pdf::Pdftoppm;
use crate::workspace::Workspace;

/// Options shared by every command. Each can also be set from the environment.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Directory holding per-session workspaces [default: <tmp>/pdftrim]
    #[arg(long, env = "PDFTRIM_WORKSPACE", global = true)]
    pub workspace: Option<PathBuf>,

    /// pdftoppm binary used to render page previews
    #[arg(long, env = "PDFTRIM_PDFTOPPM", default_value = "pdftoppm", global = true)]
    pub pdftoppm: PathBuf,

    /// Sessions older than this many hours are deleted when the MCP server starts
    #[arg(
        long,
        env = "PDFTRIM_SESSION_TTL_HOURS",
        default_value_t = 24,
        global = true
    )]
    pub session_ttl_hours: i64,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Settings {
    pub fn workspace(&self) -> Workspace {
        let root = self
            .workspace
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("pdftrim"));
        Workspace::new(root)
    }

    pub fn rasterizer(&self) -> Pdftoppm {
        Pdftoppm::new(&self.pdftoppm)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::try_hours(self.session_ttl_hours).unwrap_or(Duration::MAX)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "pdftrim=warn",
            1 => "pdftrim=info",
            _ => "pdftrim=debug",
        }
    }
}
