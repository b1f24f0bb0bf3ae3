use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use crate::error::{CaptionError, Result};
use crate::identifier::VideoId;

/// Per-request working directory, removed when dropped.
///
/// Concurrent requests for the same video get distinct directories.
#[derive(Debug)]
pub struct ScratchDir {
    invocation_id: Uuid,
    dir: TempDir,
}

impl ScratchDir {
    /// Create under `root`, or the system temp directory when `None`
    pub fn create(root: Option<&Path>, video: &VideoId) -> Result<Self> {
        let invocation_id = Uuid::new_v4();
        let prefix = format!("captions-{}-{}-", video, invocation_id.simple());

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let root_path: PathBuf = root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        let dir = builder
            .tempdir_in(&root_path)
            .map_err(|source| CaptionError::Scratch {
                root: root_path.clone(),
                source,
            })?;

        Ok(Self { invocation_id, dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }
}
