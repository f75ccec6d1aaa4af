use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::commands::remove::default_output_path;
use crate::config::Settings;
use crate::error::Error;
use crate::page_range::{parse_page_selection, PageSelection};
use crate::pdf::render::DEFAULT_DPI;
use crate::pdf::{remove_pages, PdfDocument, Pdftoppm};
use crate::workspace::{Session, Workspace, OUTPUT_MIME};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSelectPagesRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Pages to remove (e.g., '2-3,5')")]
    pub pages: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfRemovePagesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages to remove (e.g., '2-3,5')")]
    pub pages: String,
    #[schemars(description = "Output file path (default: edited_<name> next to the source)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SessionOpenRequest {
    #[schemars(description = "Path to the PDF file to upload into a new session")]
    pub path: String,
    #[schemars(description = "File name to record for the upload (default: the file's own name)")]
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SessionRequest {
    #[schemars(description = "Session id returned by session_open")]
    pub session_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SessionPreviewRequest {
    #[schemars(description = "Session id returned by session_open")]
    pub session_id: String,
    #[schemars(description = "Page to preview (1-based)")]
    pub page: u32,
    #[schemars(description = "Resolution in dots per inch (default: 100)")]
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SessionPagesRequest {
    #[schemars(description = "Session id returned by session_open")]
    pub session_id: String,
    #[schemars(description = "Pages to remove (e.g., '2-3,5')")]
    pub pages: String,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
    workspace: Workspace,
    rasterizer: Pdftoppm,
}

impl PdfServer {
    pub fn new(workspace: Workspace, rasterizer: Pdftoppm) -> Self {
        Self {
            tool_router: Self::tool_router(),
            workspace,
            rasterizer,
        }
    }

    fn session(&self, session_id: &str) -> Result<Session, Error> {
        let id = Uuid::parse_str(session_id.trim())
            .map_err(|_| Error::InvalidSessionId(session_id.to_string()))?;
        self.workspace.open_session(id)
    }

    fn select_pages(&self, path: &str, pages: &str) -> Result<SelectionResult, Error> {
        let total = PdfDocument::open(path)?.page_count();
        let selection = parse_page_selection(pages, total)?;
        Ok(selection_result(&selection, total))
    }

    fn remove_pages_from_file(&self, req: PdfRemovePagesRequest) -> Result<RemoveResult, Error> {
        let doc = PdfDocument::open(&req.path)?;
        let selection = parse_page_selection(&req.pages, doc.page_count())?;
        if selection.is_empty() {
            return Err(Error::EmptySelection);
        }

        let output = match req.output {
            Some(output) => PathBuf::from(output),
            None => default_output_path(Path::new(&req.path)),
        };
        let edited = remove_pages(&doc, &selection);
        edited.save(&output)?;
        tracing::info!(removed = %selection, output = %output.display(), "removed pages");

        Ok(RemoveResult {
            output_path: output.display().to_string(),
            removed: selection.page_numbers(),
            page_count: edited.page_count(),
            session_id: None,
            file_name: None,
            mime_type: OUTPUT_MIME.to_string(),
        })
    }

    fn open_session(&self, req: SessionOpenRequest) -> Result<SessionResult, Error> {
        let bytes = std::fs::read(&req.path).map_err(|e| Error::io(&req.path, e))?;
        let file_name = req.file_name.unwrap_or(req.path);
        let session = self.workspace.create_session(&file_name, &bytes)?;
        Ok(SessionResult {
            session_id: session.id.to_string(),
            output_name: session.output_name(),
            file_name: session.file_name,
            page_count: session.page_count,
        })
    }

    fn preview_page(&self, req: SessionPreviewRequest) -> Result<PreviewResult, Error> {
        let session = self.session(&req.session_id)?;
        let image_path = session.preview(&self.rasterizer, req.page, req.dpi)?;
        Ok(PreviewResult {
            page: req.page,
            page_count: session.page_count,
            dpi: req.dpi,
            image_path: image_path.display().to_string(),
        })
    }

    fn select_session_pages(&self, req: SessionPagesRequest) -> Result<SelectionResult, Error> {
        let session = self.session(&req.session_id)?;
        let selection = session.select(&req.pages)?;
        Ok(selection_result(&selection, session.page_count))
    }

    fn remove_session_pages(&self, req: SessionPagesRequest) -> Result<RemoveResult, Error> {
        let session = self.session(&req.session_id)?;
        let selection = session.select(&req.pages)?;
        let outcome = session.remove_pages(&selection)?;
        Ok(RemoveResult {
            output_path: outcome.output_path.display().to_string(),
            removed: outcome.removed,
            page_count: outcome.remaining,
            session_id: Some(session.id.to_string()),
            file_name: Some(session.output_name()),
            mime_type: OUTPUT_MIME.to_string(),
        })
    }

    fn close_session(&self, req: SessionRequest) -> Result<CloseResult, Error> {
        let session = self.session(&req.session_id)?;
        self.workspace.close_session(session.id)?;
        Ok(CloseResult {
            session_id: session.id.to_string(),
            closed: true,
        })
    }
}

/// Serialize a tool result, or describe what went wrong.
fn respond<T: Serialize>(result: Result<T, Error>) -> String {
    match result {
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(Error::EmptySelection) => format!("Warning: {}.", Error::EmptySelection),
        Err(e) => format!("Error: {}", e),
    }
}

fn selection_result(selection: &PageSelection, total_pages: u32) -> SelectionResult {
    SelectionResult {
        total_pages,
        remove: selection.page_numbers(),
        keep: selection.kept_pages(total_pages),
        canonical: selection.to_expression(),
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, creator, producer, creation date, and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        respond(PdfDocument::open(&path).map(|doc| {
            let info = doc.get_info();
            PdfInfoResult {
                path,
                page_count: info.page_count,
                title: info.title,
                author: info.author,
                creator: info.creator,
                producer: info.producer,
                creation_date: info.creation_date,
            }
        }))
    }

    #[tool(description = "Check a page expression like '2-3,5' against a PDF and list the 1-based pages it would remove and keep. Out-of-range pages are ignored; one malformed token rejects the whole expression.")]
    fn pdf_select_pages(&self, Parameters(req): Parameters<PdfSelectPagesRequest>) -> String {
        respond(self.select_pages(&req.path, &req.pages))
    }

    #[tool(description = "Remove pages from a PDF and save the remaining pages, in order, to a new file")]
    fn pdf_remove_pages(&self, Parameters(req): Parameters<PdfRemovePagesRequest>) -> String {
        respond(self.remove_pages_from_file(req))
    }

    #[tool(description = "Upload a PDF into a new, isolated session. Returns the session id used by the other session_* tools.")]
    fn session_open(&self, Parameters(req): Parameters<SessionOpenRequest>) -> String {
        respond(self.open_session(req))
    }

    #[tool(description = "Render one page (1-based) of a session's document to a PNG thumbnail and return its path")]
    fn session_preview(&self, Parameters(req): Parameters<SessionPreviewRequest>) -> String {
        respond(self.preview_page(req))
    }

    #[tool(description = "Check a page expression like '2-3,5' against a session's document")]
    fn session_select_pages(&self, Parameters(req): Parameters<SessionPagesRequest>) -> String {
        respond(self.select_session_pages(req))
    }

    #[tool(description = "Remove pages from a session's document. The edited PDF (named edited_<file name>) is written into the session and its path returned.")]
    fn session_remove_pages(&self, Parameters(req): Parameters<SessionPagesRequest>) -> String {
        respond(self.remove_session_pages(req))
    }

    #[tool(description = "Close a session and delete everything stored in it")]
    fn session_close(&self, Parameters(req): Parameters<SessionRequest>) -> String {
        respond(self.close_session(req))
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SelectionResult {
    pub total_pages: u32,
    pub remove: Vec<u32>,
    pub keep: Vec<u32>,
    pub canonical: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RemoveResult {
    pub output_path: String,
    pub removed: Vec<u32>,
    pub page_count: u32,
    pub session_id: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SessionResult {
    pub session_id: String,
    pub file_name: String,
    pub page_count: u32,
    pub output_name: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PreviewResult {
    pub page: u32,
    pub page_count: u32,
    pub dpi: u32,
    pub image_path: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CloseResult {
    pub session_id: String,
    pub closed: bool,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page removal tools. Use session_open to upload a PDF into its own session, \
                 session_preview to look at a page, session_select_pages to check a page \
                 expression such as '2-3,5', and session_remove_pages to produce the edited copy. \
                 pdf_info, pdf_select_pages and pdf_remove_pages work directly on file paths."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(settings: &Settings) -> Result<()> {
    let workspace = settings.workspace();
    match workspace.prune_expired(settings.session_ttl()) {
        Ok(pruned) => tracing::debug!(pruned = pruned.len(), "checked for expired sessions"),
        Err(e) => tracing::warn!("Failed to prune sessions: {}", e),
    }

    tracing::info!(workspace = %workspace.root().display(), "starting MCP server");
    let server = PdfServer::new(workspace, settings.rasterizer());

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
