//! Per-session storage.
//!
//! Every upload gets its own directory under the workspace root, named by a
//! fresh UUID:
//!
//! ```text
//! <root>/<session id>/
//!     session.json          metadata
//!     source.pdf            the uploaded document
//!     previews/             cached page thumbnails
//!     edited_<file name>    output of the last removal
//! ```
//!
//! Sessions are looked up from disk by id, so nothing is shared between
//! sessions even when two uploads carry the same file name.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::page_range::{parse_page_selection, PageSelection};
use crate::pdf::{remove_pages, PdfDocument, Rasterizer};

const METADATA_FILE: &str = "session.json";
const SOURCE_FILE: &str = "source.pdf";
const PREVIEW_DIR: &str = "previews";

pub const OUTPUT_PREFIX: &str = "edited_";
pub const OUTPUT_MIME: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub file_name: String,
    pub page_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    pub output_path: PathBuf,
    pub removed: Vec<u32>,
    pub remaining: u32,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Workspace { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_dir(&self, id: Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Store an uploaded document in a new session.
    ///
    /// The bytes must parse as a PDF; otherwise nothing is written.
    pub fn create_session(&self, file_name: &str, bytes: &[u8]) -> Result<Session> {
        let file_name = sanitize_file_name(file_name);
        let doc = PdfDocument::load_mem(bytes, file_name.clone())?;

        let id = Uuid::new_v4();
        let session = Session {
            id,
            file_name,
            page_count: doc.page_count(),
            created_at: Utc::now(),
            dir: self.session_dir(id),
        };

        if let Err(e) = session.write(bytes) {
            let _ = std::fs::remove_dir_all(&session.dir);
            return Err(e);
        }

        tracing::info!(
            session = %session.id,
            file = %session.file_name,
            pages = session.page_count,
            dir = %session.dir().display(),
            "created session"
        );
        Ok(session)
    }

    pub fn open_session(&self, id: Uuid) -> Result<Session> {
        let dir = self.session_dir(id);
        let metadata_path = dir.join(METADATA_FILE);
        let raw = match std::fs::read(&metadata_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::UnknownSession(id)),
            Err(e) => return Err(Error::io(metadata_path, e)),
        };

        let mut session: Session = serde_json::from_slice(&raw)?;
        session.dir = dir;
        Ok(session)
    }

    /// Delete a session and everything stored in it.
    pub fn close_session(&self, id: Uuid) -> Result<()> {
        let dir = self.session_dir(id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::info!(session = %id, "closed session");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::UnknownSession(id)),
            Err(e) => Err(Error::io(dir, e)),
        }
    }

    /// Delete sessions created more than `max_age` ago. Returns their ids.
    pub fn prune_expired(&self, max_age: Duration) -> Result<Vec<Uuid>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.root, e)),
        };

        // A max age reaching past the representable range expires nothing
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            return Ok(Vec::new());
        };
        let mut pruned = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| Uuid::parse_str(name).ok())
            else {
                continue;
            };

            // Directories without readable metadata are left alone
            let Ok(session) = self.open_session(id) else {
                continue;
            };
            if session.created_at < cutoff {
                match self.close_session(id) {
                    Ok(()) => pruned.push(id),
                    Err(e) => tracing::warn!(session = %id, "Failed to prune session: {}", e),
                }
            }
        }

        if !pruned.is_empty() {
            tracing::warn!(count = pruned.len(), "pruned expired sessions");
        }
        Ok(pruned)
    }
}

impl Session {
    fn write(&self, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(self.dir.join(PREVIEW_DIR))
            .map_err(|e| Error::io(&self.dir, e))?;

        let source = self.source_path();
        std::fs::write(&source, bytes).map_err(|e| Error::io(source, e))?;

        let metadata_path = self.dir.join(METADATA_FILE);
        let metadata = serde_json::to_vec_pretty(self)?;
        std::fs::write(&metadata_path, metadata).map_err(|e| Error::io(metadata_path, e))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.join(SOURCE_FILE)
    }

    /// Download name for the edited document
    pub fn output_name(&self) -> String {
        format!("{}{}", OUTPUT_PREFIX, self.file_name)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(self.output_name())
    }

    fn preview_path(&self, page: u32, dpi: u32) -> PathBuf {
        self.dir
            .join(PREVIEW_DIR)
            .join(format!("page-{:04}-{}dpi.png", page, dpi))
    }

    pub fn document(&self) -> Result<PdfDocument> {
        PdfDocument::open(self.source_path())
    }

    pub fn select(&self, pages: &str) -> Result<PageSelection> {
        Ok(parse_page_selection(pages, self.page_count)?)
    }

    /// Path to a PNG of 1-based `page`, rendering it on first request.
    pub fn preview<R: Rasterizer>(&self, rasterizer: &R, page: u32, dpi: u32) -> Result<PathBuf> {
        if page == 0 || page > self.page_count {
            return Err(Error::PageOutOfRange {
                page,
                total: self.page_count,
            });
        }

        let path = self.preview_path(page, dpi);
        if path.exists() {
            tracing::debug!(session = %self.id, page, dpi, "preview cache hit");
            return Ok(path);
        }

        let png = rasterizer.render_page(&self.source_path(), page - 1, dpi)?;
        std::fs::write(&path, png).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }

    /// Write the document minus `selection` to [`Session::output_path`].
    pub fn remove_pages(&self, selection: &PageSelection) -> Result<RemovalOutcome> {
        if selection.is_empty() {
            return Err(Error::EmptySelection);
        }

        let doc = self.document()?;
        let edited = remove_pages(&doc, selection);
        let output_path = self.output_path();
        edited.save(&output_path)?;

        let outcome = RemovalOutcome {
            output_path,
            removed: selection.page_numbers(),
            remaining: edited.page_count(),
        };
        tracing::info!(
            session = %self.id,
            removed = %selection,
            remaining = outcome.remaining,
            "wrote {}",
            outcome.output_path.display()
        );
        Ok(outcome)
    }
}

/// Keep only the final path component of an uploaded file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or("").trim();
    match base {
        "" | "." | ".." => "document.pdf".to_string(),
        _ => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;
    use std::cell::Cell;

    struct FakeRasterizer {
        calls: Cell<u32>,
    }

    impl Rasterizer for FakeRasterizer {
        fn render_page(&self, _pdf: &Path, index: u32, dpi: u32) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            Ok(format!("png:{}:{}", index, dpi).into_bytes())
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\a.pdf"), "a.pdf");
        assert_eq!(sanitize_file_name(".."), "document.pdf");
        assert_eq!(sanitize_file_name(""), "document.pdf");
    }

    #[test]
    fn test_create_and_open_session() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());

        let session = workspace
            .create_session("report.pdf", &fixtures::sample_pdf(3))
            .unwrap();
        assert_eq!(session.page_count, 3);
        assert!(session.source_path().exists());

        let reopened = workspace.open_session(session.id).unwrap();
        assert_eq!(reopened.file_name, "report.pdf");
        assert_eq!(reopened.page_count, 3);
        assert_eq!(reopened.dir(), session.dir());
    }

    #[test]
    fn test_same_file_name_does_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());

        let a = workspace
            .create_session("same.pdf", &fixtures::sample_pdf(2))
            .unwrap();
        let b = workspace
            .create_session("same.pdf", &fixtures::sample_pdf(5))
            .unwrap();
        assert_ne!(a.dir(), b.dir());
        assert_eq!(workspace.open_session(a.id).unwrap().page_count, 2);
        assert_eq!(workspace.open_session(b.id).unwrap().page_count, 5);
    }

    #[test]
    fn test_rejects_non_pdf_upload() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());

        let err = workspace
            .create_session("notes.pdf", b"definitely not a pdf")
            .unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_session() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let id = Uuid::new_v4();
        assert!(matches!(
            workspace.open_session(id),
            Err(Error::UnknownSession(missing)) if missing == id
        ));
        assert!(matches!(
            workspace.close_session(id),
            Err(Error::UnknownSession(_))
        ));
    }

    #[test]
    fn test_remove_pages_writes_edited_output() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let session = workspace
            .create_session("book.pdf", &fixtures::sample_pdf(10))
            .unwrap();

        let selection = session.select("2-3,5").unwrap();
        let outcome = session.remove_pages(&selection).unwrap();
        assert_eq!(outcome.removed, vec![2, 3, 5]);
        assert_eq!(outcome.remaining, 7);
        assert!(outcome.output_path.ends_with("edited_book.pdf"));

        let bytes = std::fs::read(&outcome.output_path).unwrap();
        assert_eq!(fixtures::page_markers(&bytes), vec![1, 4, 6, 7, 8, 9, 10]);
        // the upload itself is untouched
        let source = std::fs::read(session.source_path()).unwrap();
        assert_eq!(fixtures::page_markers(&source).len(), 10);
    }

    #[test]
    fn test_empty_selection_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let session = workspace
            .create_session("book.pdf", &fixtures::sample_pdf(4))
            .unwrap();

        let selection = session.select("99").unwrap();
        assert!(matches!(
            session.remove_pages(&selection),
            Err(Error::EmptySelection)
        ));
        assert!(!session.output_path().exists());
    }

    #[test]
    fn test_bad_expression_is_parse_error() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let session = workspace
            .create_session("book.pdf", &fixtures::sample_pdf(4))
            .unwrap();
        assert!(matches!(session.select("2,x,3"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_preview_is_cached_and_bounded() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let session = workspace
            .create_session("book.pdf", &fixtures::sample_pdf(3))
            .unwrap();
        let rasterizer = FakeRasterizer {
            calls: Cell::new(0),
        };

        let path = session.preview(&rasterizer, 2, 100).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png:1:100");
        session.preview(&rasterizer, 2, 100).unwrap();
        assert_eq!(rasterizer.calls.get(), 1);

        session.preview(&rasterizer, 2, 150).unwrap();
        assert_eq!(rasterizer.calls.get(), 2);

        assert!(matches!(
            session.preview(&rasterizer, 0, 100),
            Err(Error::PageOutOfRange { page: 0, total: 3 })
        ));
        assert!(matches!(
            session.preview(&rasterizer, 4, 100),
            Err(Error::PageOutOfRange { page: 4, total: 3 })
        ));
    }

    #[test]
    fn test_prune_expired() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let session = workspace
            .create_session("old.pdf", &fixtures::sample_pdf(1))
            .unwrap();

        assert!(workspace.prune_expired(Duration::hours(1)).unwrap().is_empty());
        let pruned = workspace.prune_expired(Duration::zero() - Duration::seconds(1)).unwrap();
        assert_eq!(pruned, vec![session.id]);
        assert!(!session.dir().exists());
    }

    #[test]
    fn test_prune_with_unbounded_age() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let session = workspace
            .create_session("keep.pdf", &fixtures::sample_pdf(1))
            .unwrap();

        assert!(workspace.prune_expired(Duration::MAX).unwrap().is_empty());
        assert!(session.dir().exists());
    }

    #[test]
    fn test_prune_skips_unreadable_sessions() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let old = workspace
            .create_session("old.pdf", &fixtures::sample_pdf(1))
            .unwrap();
        let corrupt = Uuid::new_v4();
        std::fs::create_dir_all(root.path().join(corrupt.to_string())).unwrap();
        std::fs::write(
            root.path().join(corrupt.to_string()).join(METADATA_FILE),
            b"{not json",
        )
        .unwrap();

        let pruned = workspace
            .prune_expired(Duration::zero() - Duration::seconds(1))
            .unwrap();
        assert_eq!(pruned, vec![old.id]);
        assert!(root.path().join(corrupt.to_string()).exists());
    }

    #[test]
    fn test_prune_missing_root() {
        let workspace = Workspace::new("/nonexistent/pdftrim-workspace");
        assert!(workspace.prune_expired(Duration::hours(1)).unwrap().is_empty());
    }
}
