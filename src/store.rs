//! Collaborators the engine talks to at its edges: snapshot persistence and
//! the binary payload (audio file) lookup.

use crate::config;
use crate::model::{Song, SongKey};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

pub trait SnapshotStore {
    fn save_snapshot(&mut self, songs: &[Song]) -> Result<()>;

    /// `None` when nothing was ever saved, as opposed to a saved empty list.
    fn load_snapshot(&mut self) -> Result<Option<Vec<Song>>>;
}

pub trait PayloadStore {
    fn has_payload(&self, key: &SongKey) -> bool;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct PlaylistFile {
    #[serde(default)]
    songs: Vec<Song>,
}

/// Flat JSON file holding the ordered song list.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(root: &Path) -> Self {
        Self::new(config::playlist_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn save_snapshot(&mut self, songs: &[Song]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            config::ensure_dir(parent)?;
        }
        let file = PlaylistFile {
            songs: songs.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), songs = songs.len(), "playlist saved");
        Ok(())
    }

    fn load_snapshot(&mut self) -> Result<Option<Vec<Song>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read playlist file {}", self.path.display()))?;
        let file: PlaylistFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse playlist file {}", self.path.display()))?;
        Ok(Some(file.songs))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    songs: Option<Vec<Song>>,
    saves: usize,
    fail_saves: bool,
}

/// Snapshot store kept in memory. Clones share state, so a caller can keep a
/// handle to inspect what the engine saved.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_songs(songs: Vec<Song>) -> Self {
        let store = Self::new();
        store.state.borrow_mut().songs = Some(songs);
        store
    }

    pub fn songs(&self) -> Vec<Song> {
        self.state.borrow().songs.clone().unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.state.borrow().saves
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().fail_saves = failing;
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save_snapshot(&mut self, songs: &[Song]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_saves {
            anyhow::bail!("memory store is set to fail");
        }
        state.songs = Some(songs.to_vec());
        state.saves += 1;
        Ok(())
    }

    fn load_snapshot(&mut self) -> Result<Option<Vec<Song>>> {
        Ok(self.state.borrow().songs.clone())
    }
}

/// Looks for `<title> - <artist>.<ext>` under a directory.
#[derive(Debug, Clone)]
pub struct DirPayloadStore {
    dir: PathBuf,
}

impl DirPayloadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &SongKey) -> Option<PathBuf> {
        let stem = key.file_stem();
        AUDIO_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl PayloadStore for DirPayloadStore {
    fn has_payload(&self, key: &SongKey) -> bool {
        self.path_for(key).is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPayloads;

impl PayloadStore for NoPayloads {
    fn has_payload(&self, _key: &SongKey) -> bool {
        false
    }
}
