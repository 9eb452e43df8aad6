use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use uuid::Uuid;

/// Saves submitted sources under a root directory
///
/// Each submission gets its own `<root>/<uuid>/` directory, so concurrent
/// submissions never share a file.
#[derive(Debug, Clone)]
pub struct SourceStore {
    root: PathBuf,
}

impl SourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a source file and return its path
    #[instrument(skip(self, source), fields(len = source.len()))]
    pub async fn save(&self, source: &[u8], file_name: &str) -> io::Result<PathBuf> {
        let dir = self.root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, source).await?;

        debug!(path = %path.display(), "source saved");
        Ok(path)
    }
}
