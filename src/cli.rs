use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;
use crate::pdf::render::DEFAULT_DPI;

#[derive(Parser)]
#[command(name = "pdftrim")]
#[command(about = "Remove pages from PDF files, with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server on stdin/stdout
    Mcp,

    /// Display PDF metadata and page count
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Show which pages a page expression selects, without writing anything
    Select {
        /// PDF file the expression applies to
        path: PathBuf,

        /// Pages to remove (e.g., "2-3,5")
        pages: String,
    },

    /// Write a copy of a PDF with the given pages removed
    #[command(alias = "rm")]
    Remove {
        /// PDF file to remove pages from
        path: PathBuf,

        /// Pages to remove (e.g., "2-3,5")
        pages: String,

        /// Output file [default: edited_<name> next to the input]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an unchanged copy when nothing is selected
        #[arg(long)]
        allow_empty: bool,
    },

    /// Render one page to a PNG thumbnail
    Preview {
        /// PDF file to render from
        path: PathBuf,

        /// Page to render (1-based)
        page: u32,

        /// Resolution in dots per inch
        #[arg(long, default_value_t = DEFAULT_DPI)]
        dpi: u32,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
}
