use crate::extract::has_media_extension;
use crate::identity::PageIdentity;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Route prefix under which store directories are served as static files.
pub const PUBLIC_DOWNLOADS_PREFIX: &str = "/downloads";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResource {
    pub file_name: String,
    pub public_path: String,
}

/// One directory per page identity under `root`. The only component that
/// creates or enumerates those directories.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn page_dir(&self, identity: &PageIdentity) -> PathBuf {
        self.root.join(identity.as_str())
    }

    pub fn exists(&self, identity: &PageIdentity) -> bool {
        self.page_dir(identity).is_dir()
    }

    /// Creates the page directory (and the root) if missing.
    pub fn ensure(&self, identity: &PageIdentity) -> Result<PathBuf> {
        let dir = self.page_dir(identity);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn has_media(&self, identity: &PageIdentity) -> Result<bool> {
        if !self.exists(identity) {
            return Ok(false);
        }
        Ok(!self.media_file_names(identity)?.is_empty())
    }

    /// Media files stored for `identity`, sorted by name.
    ///
    /// A missing directory is [`EngineError::StoreNotFound`]; a directory
    /// with no media files is [`EngineError::StoreEmpty`].
    pub fn list(&self, identity: &PageIdentity) -> Result<Vec<StoredResource>> {
        if !self.exists(identity) {
            return Err(EngineError::StoreNotFound(identity.to_string()));
        }
        let names = self.media_file_names(identity)?;
        if names.is_empty() {
            return Err(EngineError::StoreEmpty(identity.to_string()));
        }
        Ok(names
            .into_iter()
            .map(|file_name| StoredResource {
                public_path: format!("{PUBLIC_DOWNLOADS_PREFIX}/{identity}/{file_name}"),
                file_name,
            })
            .collect())
    }

    fn media_file_names(&self, identity: &PageIdentity) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.page_dir(identity))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if has_media_extension(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
