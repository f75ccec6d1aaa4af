use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Thumbnail resolution used when the caller does not ask for one.
pub const DEFAULT_DPI: u32 = 100;

/// Turns a single page into a PNG image.
pub trait Rasterizer {
    /// Render the page at `index` (zero-based) of the PDF at `pdf` at `dpi`.
    fn render_page(&self, pdf: &Path, index: u32, dpi: u32) -> Result<Vec<u8>>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: PathBuf,
}

impl Pdftoppm {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Pdftoppm {
            binary: binary.into(),
        }
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Pdftoppm::new("pdftoppm")
    }
}

impl Rasterizer for Pdftoppm {
    fn render_page(&self, pdf: &Path, index: u32, dpi: u32) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir().map_err(|e| Error::io(std::env::temp_dir(), e))?;
        let prefix = scratch.path().join("page");
        let page = (index + 1).to_string();

        tracing::debug!(pdf = %pdf.display(), page = %page, dpi, "running {}", self.binary.display());
        let output = Command::new(&self.binary)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                Error::Render(format!("Failed to run {}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Render(format!(
                "{} failed: {}",
                self.binary.display(),
                stderr.trim()
            )));
        }

        // -singlefile writes exactly <prefix>.png
        let image = prefix.with_extension("png");
        std::fs::read(&image).map_err(|_| {
            Error::Render(format!(
                "{} produced no image for page {}",
                self.binary.display(),
                page
            ))
        })
    }
}
