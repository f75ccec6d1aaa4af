use crate::error::Result;
use crate::page_range::PageSelection;

/// The page-level capabilities the remover needs from a PDF backend.
pub trait PageDocument: Sized {
    type Page;

    fn page_count(&self) -> u32;

    /// Page at a zero-based index
    fn page(&self, index: u32) -> Option<Self::Page>;

    /// A new document sharing this one's resources but holding no pages
    fn derive_empty(&self) -> Self;

    fn append_page(&mut self, page: Self::Page);

    fn to_bytes(&self) -> Result<Vec<u8>>;
}

/// Build a new document from every page of `document` whose zero-based index
/// is not in `selection`, keeping their original order.
pub fn remove_pages<D: PageDocument>(document: &D, selection: &PageSelection) -> D {
    let mut edited = document.derive_empty();
    for index in 0..document.page_count() {
        if selection.contains(index) {
            continue;
        }
        if let Some(page) = document.page(index) {
            edited.append_page(page);
        }
    }
    edited
}
