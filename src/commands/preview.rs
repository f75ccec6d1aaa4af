use crate::error::Error;
use crate::pdf::{PdfDocument, Rasterizer};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>, R: Rasterizer>(
    rasterizer: &R,
    path: P,
    page: u32,
    dpi: u32,
    output: Q,
) -> Result<()> {
    let path = path.as_ref();
    let output = output.as_ref();
    let doc = PdfDocument::open(path)?;
    let total_pages = doc.page_count();

    if page == 0 || page > total_pages {
        return Err(Error::PageOutOfRange {
            page,
            total: total_pages,
        }
        .into());
    }

    let png = rasterizer.render_page(path, page - 1, dpi)?;
    std::fs::write(output, png)
        .with_context(|| format!("Failed to write image: {}", output.display()))?;

    println!(
        "Page {} of {} rendered to {}",
        page,
        total_pages,
        output.display()
    );

    Ok(())
}
