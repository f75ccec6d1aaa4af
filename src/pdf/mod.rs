pub mod document;
pub mod remove;
pub mod render;

#[cfg(test)]
pub(crate) mod fixtures;

pub use document::PdfDocument;
pub use remove::remove_pages;
pub use render::{Pdftoppm, Rasterizer};
