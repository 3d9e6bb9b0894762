//! Template fetcher.
//!
//! The merge engine that fills templates with data lives outside this
//! service; the API only needs "fetch template content by name". Static
//! assets are served directly by `ServeDir` and never pass through here.

use std::io::{Error, ErrorKind};
use std::path::PathBuf;

/// Reads named templates from a directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Create a store over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Fetch a template's content by file name.
    ///
    /// # Errors
    ///
    /// `NotFound` for missing templates and for names that could escape the
    /// template directory.
    pub async fn get(&self, name: &str) -> std::io::Result<String> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if !valid {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("no such template: {name:?}"),
            ));
        }

        tokio::fs::read_to_string(self.dir.join(name)).await
    }
}
