//! Directory listing tool.
//!
//! Returns a JSON array of entry names, directories suffixed with `/`.
//! Recursive listings hold paths relative to the requested root.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::Deserialize;
use walkdir::WalkDir;
use yaa_core::error::ToolError;
use yaa_core::tool::ToolDefinition;

pub const NAME: &str = "list_files";

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListFilesInput {
    /// Optional relative path to list files from. Defaults to current directory if not provided.
    #[serde(default)]
    pub path: String,

    /// If true, also include files from all subdirectories
    #[serde(default)]
    pub recursive: bool,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "List files and directories at a given path. If no path is provided, lists files \
         in the current directory.",
        list_files,
    )
}

async fn list_files(input: ListFilesInput) -> Result<String, ToolError> {
    let root = resolve_path(&input.path, home_dir());
    let recursive = input.recursive;

    let entries = tokio::task::spawn_blocking(move || collect_entries(&root, recursive))
        .await
        .map_err(|e| ToolError::failed(NAME, e))??;

    serde_json::to_string(&entries).map_err(|e| ToolError::failed(NAME, e))
}

/// Expand a leading `~` to the home directory; empty means `.`.
fn resolve_path(path: &str, home: Option<PathBuf>) -> PathBuf {
    if path.is_empty() {
        return PathBuf::from(".");
    }

    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

fn collect_entries(root: &Path, recursive: bool) -> Result<Vec<String>, ToolError> {
    let fail = |e: &dyn std::fmt::Display| ToolError::failed(NAME, format!("{}: {e}", root.display()));

    if recursive {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| fail(&e))?;
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let mut name = relative.to_string_lossy().into_owned();
            if entry.file_type().is_dir() {
                name.push('/');
            }
            entries.push(name);
        }
        return Ok(entries);
    }

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| fail(&e))? {
        let entry = entry.map_err(|e| fail(&e))?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().map_err(|e| fail(&e))?.is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();
    Ok(entries)
}
