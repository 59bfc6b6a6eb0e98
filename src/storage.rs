//! Flat artifact directories.
//!
//! Every id maps to exactly one `<id>.<ext>` file. Writers go through a
//! `<id>.<ext>.<seq>.part` sibling of their own that is moved into place once
//! complete, so an artifact path that exists always holds a whole file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tracing::warn;

use crate::{GroupId, Result};

pub const PART_SUFFIX: &str = "part";

static PART_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
    ext: &'static str,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>, ext: &'static str) -> Self {
        Self {
            root: root.into(),
            ext,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn file_name(&self, id: GroupId) -> String {
        format!("{id}.{}", self.ext)
    }

    pub fn artifact_path(&self, id: GroupId) -> PathBuf {
        self.root.join(self.file_name(id))
    }

    /// A part file path for `id` that no other writer in this process gets.
    pub fn part_path(&self, id: GroupId) -> PathBuf {
        let seq = PART_SEQ.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!(
            "{}.{}-{seq}.{PART_SUFFIX}",
            self.file_name(id),
            std::process::id()
        ))
    }

    pub async fn exists(&self, id: GroupId) -> Result<bool> {
        Ok(fs::try_exists(self.artifact_path(id)).await?)
    }

    /// Links a finished part file in as the artifact of `id` and drops the part file.
    ///
    /// An artifact that is already there is left untouched. Returns whether this
    /// call created it.
    pub async fn commit(&self, part: &Path, id: GroupId) -> Result<bool> {
        let created = match fs::hard_link(part, self.artifact_path(id)).await {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => false,
            Err(err) => return Err(err.into()),
        };
        if let Err(err) = self.discard(part).await {
            warn!("Couldn't remove {}: {err}", part.display());
        }
        Ok(created)
    }

    /// Drops whatever a failed attempt left behind.
    pub async fn discard(&self, part: &Path) -> Result<()> {
        match fs::remove_file(part).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    /// Writes a whole buffer through a part file, replacing any previous artifact.
    pub async fn write(&self, id: GroupId, bytes: &[u8]) -> Result<PathBuf> {
        let part = self.part_path(id);
        let path = self.artifact_path(id);
        let written = match fs::write(&part, bytes).await {
            Ok(()) => fs::rename(&part, &path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            if let Err(cleanup) = self.discard(&part).await {
                warn!("Couldn't remove {}: {cleanup}", part.display());
            }
            return Err(err.into());
        }
        Ok(path)
    }
}

pub fn is_part_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PART_SUFFIX)
}
