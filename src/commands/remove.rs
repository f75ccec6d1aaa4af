use crate::page_range::parse_page_selection;
use crate::pdf::{remove_pages, PdfDocument};
use crate::workspace::OUTPUT_PREFIX;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn run<P: AsRef<Path>>(
    input: P,
    pages: &str,
    output: Option<&Path>,
    allow_empty: bool,
) -> Result<()> {
    let input = input.as_ref();
    let doc = PdfDocument::open(input)?;
    let total_pages = doc.page_count();

    let selection = parse_page_selection(pages, total_pages)
        .with_context(|| format!("Cannot use page selection {:?}", pages))?;

    if selection.is_empty() && !allow_empty {
        tracing::warn!(pages, total_pages, "empty selection, nothing written");
        println!("No pages selected for removal.");
        return Ok(());
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    let edited = remove_pages(&doc, &selection);
    edited.save(&output)?;

    tracing::info!(removed = %selection, input = %input.display(), "removed pages");
    println!(
        "Removed {} page(s), wrote {} of {} page(s) to {}",
        selection.len(),
        edited.page_count(),
        total_pages,
        output.display()
    );

    Ok(())
}

/// `dir/report.pdf` becomes `dir/edited_report.pdf`
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    input.with_file_name(format!("{}{}", OUTPUT_PREFIX, name))
}
