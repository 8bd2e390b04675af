//! Document reading: plain text formats are returned verbatim, binary office
//! formats get a descriptive placeholder instead of raw bytes.

use std::path::Path;

use crate::error::WorkspaceError;

/// Extensions read as UTF-8 text.
const TEXT_EXTENSIONS: &[&str] = &[
    "md", "txt", "json", "csv", "log", "yaml", "yml", "xml", "html", "htm", "css", "js", "ts",
    "py", "rs", "sh", "bash", "zsh", "toml", "ini", "cfg", "conf",
];

/// Binary document formats we recognize but do not extract.
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "xlsx", "xls", "pptx"];

/// Read a file for the model: text formats verbatim, recognized documents
/// and unknown binaries as placeholders the model can act on.
pub async fn parse_document(path: &Path) -> Result<String, WorkspaceError> {
    if !path.exists() {
        return Err(WorkspaceError::NotFound {
            path: path.display().to_string(),
        });
    }

    let ext = extension(path);
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(tokio::fs::read_to_string(path).await?);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(format!(
            "[{}: {}. Use copy_to_workbench and `exec` with a converter to extract its text.]",
            file_type_description(path),
            name
        ));
    }

    // Unknown extension: try text anyway, fall back to a binary note.
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(_) => Ok(format!(
            "[Binary file: {}, cannot read content directly]",
            name
        )),
    }
}

/// Whether the agent can get something useful out of `read_file` here.
pub fn is_readable_file(path: &Path) -> bool {
    let ext = extension(path);
    TEXT_EXTENSIONS.contains(&ext.as_str()) || DOCUMENT_EXTENSIONS.contains(&ext.as_str())
}

/// Human-readable file type label for listings.
pub fn file_type_description(path: &Path) -> String {
    match extension(path).as_str() {
        "pdf" => "PDF document".to_string(),
        "docx" => "Word document".to_string(),
        "xlsx" => "Excel spreadsheet".to_string(),
        "xls" => "Excel spreadsheet (legacy)".to_string(),
        "pptx" => "PowerPoint presentation".to_string(),
        "md" => "Markdown".to_string(),
        "txt" => "Text file".to_string(),
        "json" => "JSON data".to_string(),
        "csv" => "CSV data".to_string(),
        "" => "file".to_string(),
        other => format!(".{} file", other),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
