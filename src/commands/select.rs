use crate::page_range::{parse_page_selection, PageSelection};
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, pages: &str) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let total_pages = doc.page_count();
    let selection = parse_page_selection(pages, total_pages)?;

    let kept: PageSelection = selection
        .kept_pages(total_pages)
        .into_iter()
        .map(|page| page - 1)
        .collect();

    println!("File: {}", path.as_ref().display());
    println!("Pages: {}", total_pages);
    println!("Remove: {} ({} page(s))", selection, selection.len());
    println!("Keep: {} ({} page(s))", kept, kept.len());

    if selection.is_empty() {
        println!("No pages selected for removal.");
    }

    Ok(())
}
