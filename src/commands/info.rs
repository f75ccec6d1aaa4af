use crate::commands::remove::default_output_path;
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let doc = PdfDocument::open(path)?;
    let info = doc.get_info();

    println!("File: {}", path.display());
    println!("Pages: {}", info.page_count);

    let fields = [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Creator", &info.creator),
        ("Producer", &info.producer),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    if let Some(date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(date));
    }
    if let Some(date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(date));
    }

    println!("Edited copy: {}", default_output_path(path).display());

    Ok(())
}

/// `D:YYYYMMDDHHmmSS...` as `YYYY-MM-DD HH:mm:SS`; anything else unchanged.
fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    if d.len() < 8 || !d.is_ascii() {
        return date.to_string();
    }

    let mut formatted = format!("{}-{}-{}", &d[0..4], &d[4..6], &d[6..8]);
    if d.len() >= 14 {
        formatted.push_str(&format!(" {}:{}:{}", &d[8..10], &d[10..12], &d[12..14]));
    }
    formatted
}
