//! Persisted bookmark set.
//!
//! The only client state that survives a restart: one JSON file holding
//! the list of bookmarked vacancy ids. The file is read once when the
//! store opens and rewritten in full on every toggle.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use shared::domain::VacancyId;
use tracing::warn;

pub struct BookmarkStore {
    path: PathBuf,
    ids: BTreeSet<VacancyId>,
}

impl BookmarkStore {
    /// Opens the store at `path`. A missing file is an empty set; a
    /// malformed file is treated as empty rather than refusing to start,
    /// and will be overwritten on the next toggle.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<i64>>(&raw) {
                Ok(ids) => ids.into_iter().map(VacancyId).collect(),
                Err(error) => {
                    warn!(path = %path.display(), %error, "bookmark file is malformed, starting empty");
                    BTreeSet::new()
                }
            },
            Err(_) => BTreeSet::new(),
        };
        Self { path, ids }
    }

    /// Flips the bookmark state of `id` and rewrites the file. Returns
    /// whether the id is bookmarked after the toggle.
    pub fn toggle(&mut self, id: VacancyId) -> anyhow::Result<bool> {
        let bookmarked = if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        };
        self.persist()?;
        Ok(bookmarked)
    }

    pub fn contains(&self, id: VacancyId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &BTreeSet<VacancyId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| *p != Path::new("")) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create bookmark directory '{}'", parent.display())
            })?;
        }
        let raw: Vec<i64> = self.ids.iter().map(|id| id.0).collect();
        let encoded = serde_json::to_string(&raw).context("failed to encode bookmarks")?;
        fs::write(&self.path, encoded)
            .with_context(|| format!("failed to write bookmarks to '{}'", self.path.display()))
    }
}
