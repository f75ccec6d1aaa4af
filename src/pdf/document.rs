use lopdf::{Document, Object, ObjectId};
use std::path::Path;

use super::remove::PageDocument;
use crate::error::{Error, Result};

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A page of a [`PdfDocument`]. Only meaningful within the document it came
/// from and the documents derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfPage(ObjectId);

pub struct PdfDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    /// Set once the page list no longer mirrors the page tree
    edited: bool,
    pub path: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::load_mem(&bytes, path.display().to_string())
    }

    pub fn load_mem(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let doc = Document::load_mem(bytes)
            .map_err(|e| Error::format(format!("Failed to open PDF: {}", name), e))?;
        let pages = doc.get_pages().into_values().collect();
        Ok(PdfDocument {
            doc,
            pages,
            edited: false,
            path: name,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.mod_date = get_string_from_dict(dict, b"ModDate");
            }
        }

        info.page_count = self.page_count();
        info
    }

    /// Serialize the document. The caller's document is left untouched.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = self.doc.clone();
        if self.edited {
            rebuild_page_tree(&mut doc, &self.pages).map_err(|e| {
                Error::format(format!("Failed to rebuild page tree: {}", self.path), e)
            })?;
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).map_err(|e| {
            Error::format(
                format!("Failed to serialize PDF: {}", self.path),
                lopdf::Error::IO(e),
            )
        })?;
        Ok(buffer)
    }

    /// Save to a file. Nothing is written if serialization fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| Error::io(path, e))
    }

    #[cfg(test)]
    pub(crate) fn page_content(&self, index: u32) -> Vec<u8> {
        self.doc
            .get_page_content(self.pages[index as usize])
            .expect("page content")
    }
}

impl PageDocument for PdfDocument {
    type Page = PdfPage;

    fn page_count(&self) -> u32 {
        PdfDocument::page_count(self)
    }

    fn page(&self, index: u32) -> Option<PdfPage> {
        self.pages.get(index as usize).copied().map(PdfPage)
    }

    fn derive_empty(&self) -> Self {
        PdfDocument {
            doc: self.doc.clone(),
            pages: Vec::new(),
            edited: true,
            path: self.path.clone(),
        }
    }

    fn append_page(&mut self, page: PdfPage) {
        self.pages.push(page.0);
        self.edited = true;
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        PdfDocument::to_bytes(self)
    }
}

/// Replace the page tree with a single flat node listing `pages` in order,
/// then drop everything that is no longer reachable.
fn rebuild_page_tree(doc: &mut Document, pages: &[ObjectId]) -> lopdf::Result<()> {
    let root_id = doc.catalog()?.get(b"Pages")?.as_reference()?;

    // Intermediate nodes go away, so their attributes must move onto the pages.
    let inherited: Vec<_> = pages
        .iter()
        .map(|&id| inherited_attributes(doc, id))
        .collect();

    for (&page_id, attributes) in pages.iter().zip(inherited) {
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in attributes {
            page.set(key, value);
        }
        page.set("Parent", Object::Reference(root_id));
    }

    let root = doc.get_dictionary_mut(root_id)?;
    root.set(
        "Kids",
        Object::Array(pages.iter().map(|&id| Object::Reference(id)).collect()),
    );
    root.set("Count", Object::Integer(pages.len() as i64));

    let pruned = doc.prune_objects();
    tracing::debug!(pruned = pruned.len(), kept = pages.len(), "rebuilt page tree");
    Ok(())
}

fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return found;
    };

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    // Depth guard against malformed trees with Parent cycles
    while let Some(node_id) = parent {
        if missing.is_empty() || depth > 64 {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // Check for UTF-16 BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        // Latin-1 / PDFDocEncoding (simplified)
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
