use crate::error::{PlaylistError, Result};
use crate::key_index::KeyIndex;
use crate::model::{
    Direction, Settings, Song, SongKey, SortDirection, SortField, TitleSortPolicy,
};
use crate::queue::BoundedQueue;
use crate::sequence::{NodeId, OrderedSequence};
use crate::sorted_index::{KeySelector, SortKey, SortedIndex};
use crate::store::{MemorySnapshotStore, NoPayloads, PayloadStore, SnapshotStore};
use rand::RngExt;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::fmt;
use tracing::{debug, info, warn};

const DEMO_SONGS: &[(&str, &str)] = &[
    ("Song 1", "Artist A"),
    ("Song 2", "Artist B"),
    ("Song 3", "Artist C"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub song: Song,
    pub is_current: bool,
    pub is_selected: bool,
    pub has_payload: bool,
}

/// What the presentation layer renders: the active list (scope or whole
/// playlist) plus cursor keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistView {
    pub entries: Vec<ViewEntry>,
    pub current: Option<SongKey>,
    pub selected: Option<SongKey>,
    pub scoped: bool,
    pub count: usize,
    pub playing: bool,
}

/// Owns the playlist and keeps its three views in step.
///
/// `sequence` is the source of truth for order and handles; `keys` and
/// `sorted` only hold [`NodeId`]s into it. Every mutating call updates all
/// three, fixes the cursors, and then hands the new order to the snapshot
/// store. A failed save is logged and otherwise ignored.
pub struct PlaylistEngine {
    sequence: OrderedSequence,
    keys: KeyIndex,
    sorted: SortedIndex,
    sorted_direction: SortDirection,
    sorted_stale: bool,
    title_policy: TitleSortPolicy,
    current: Option<NodeId>,
    selected: Option<NodeId>,
    scope: Vec<SongKey>,
    scoped: bool,
    up_next: BoundedQueue<SongKey>,
    history: BoundedQueue<SongKey>,
    snapshots: Box<dyn SnapshotStore>,
    payloads: Box<dyn PayloadStore>,
    rng: SmallRng,
}

impl fmt::Debug for PlaylistEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaylistEngine")
            .field("len", &self.sequence.len())
            .field("current", &self.current_key())
            .field("selected", &self.selected_key())
            .field("scoped", &self.scoped)
            .field("sorted_stale", &self.sorted_stale)
            .finish_non_exhaustive()
    }
}

impl PlaylistEngine {
    /// Engine backed by an in-memory store and no payloads.
    pub fn new(settings: &Settings) -> Self {
        Self::with_stores(
            settings,
            Box::new(MemorySnapshotStore::new()),
            Box::new(NoPayloads),
        )
    }

    pub fn with_stores(
        settings: &Settings,
        snapshots: Box<dyn SnapshotStore>,
        payloads: Box<dyn PayloadStore>,
    ) -> Self {
        Self {
            sequence: OrderedSequence::new(),
            keys: KeyIndex::new(),
            sorted: SortedIndex::new(KeySelector::new(
                settings.sorted_view_field,
                TitleSortPolicy::Full,
            )),
            sorted_direction: SortDirection::Ascending,
            sorted_stale: false,
            title_policy: settings.title_sort,
            current: None,
            selected: None,
            scope: Vec::new(),
            scoped: false,
            up_next: BoundedQueue::new(),
            history: BoundedQueue::bounded(settings.history_len),
            snapshots,
            payloads,
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    /// Builds the engine from the store's snapshot, in stored order. Entries
    /// that fail validation or repeat a key are skipped. Demo songs are seeded
    /// only when the store has never saved anything.
    pub fn load(
        settings: &Settings,
        snapshots: Box<dyn SnapshotStore>,
        payloads: Box<dyn PayloadStore>,
    ) -> anyhow::Result<Self> {
        let mut engine = Self::with_stores(settings, snapshots, payloads);
        let Some(songs) = engine.snapshots.load_snapshot()? else {
            if settings.seed_demo_songs {
                for (title, artist) in DEMO_SONGS {
                    engine.insert_song(Song::new(*title, *artist));
                }
                info!(songs = engine.len(), "seeded demo playlist");
                engine.persist();
            }
            return Ok(engine);
        };

        for song in songs {
            let Ok((title, artist)) = validated_fields(&song.title, &song.artist) else {
                warn!(title = %song.title, artist = %song.artist, "skipping invalid stored song");
                continue;
            };
            let key = SongKey::new(title.clone(), artist.clone());
            if engine.keys.contains_key(&key) {
                warn!(%key, "skipping duplicate stored song");
                continue;
            }
            engine.insert_song(Song {
                title,
                artist,
                ..song
            });
        }
        info!(songs = engine.len(), "playlist loaded");
        Ok(engine)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// `(sequence, key index, sorted index)` sizes.
    pub fn index_sizes(&self) -> (usize, usize, usize) {
        (self.sequence.len(), self.keys.len(), self.sorted.len())
    }

    pub fn songs(&self) -> Vec<Song> {
        self.sequence.to_vec()
    }

    pub fn songs_reversed(&self) -> Vec<Song> {
        self.sequence
            .iter_rev()
            .map(|(_, song)| song.clone())
            .collect()
    }

    pub fn get(&self, key: &SongKey) -> Option<&Song> {
        self.keys.get(key).and_then(|id| self.sequence.get(id))
    }

    pub fn handle(&self, key: &SongKey) -> Option<NodeId> {
        self.keys.get(key)
    }

    pub fn contains(&self, key: &SongKey) -> bool {
        self.keys.contains_key(key)
    }

    pub fn current(&self) -> Option<&Song> {
        self.current.and_then(|id| self.sequence.get(id))
    }

    pub fn current_key(&self) -> Option<SongKey> {
        self.current().map(Song::key)
    }

    pub fn selected(&self) -> Option<&Song> {
        self.selected.and_then(|id| self.sequence.get(id))
    }

    pub fn selected_key(&self) -> Option<SongKey> {
        self.selected().map(Song::key)
    }

    pub fn state(&self) -> PlaybackState {
        if self.current.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    pub fn scope_len(&self) -> usize {
        self.scope.len()
    }

    pub fn scoped_songs(&self) -> Vec<Song> {
        self.scope
            .iter()
            .filter_map(|key| self.get(key))
            .cloned()
            .collect()
    }

    pub fn title_policy(&self) -> TitleSortPolicy {
        self.title_policy
    }

    pub fn set_title_policy(&mut self, policy: TitleSortPolicy) {
        self.title_policy = policy;
    }

    pub fn has_payload(&self, key: &SongKey) -> bool {
        self.payloads.has_payload(key)
    }

    pub fn add_item(&mut self, title: &str, artist: &str) -> Result<NodeId> {
        self.add_song(Song::new(title, artist))
    }

    /// Adds a fully-formed song, keeping its timestamp and duration.
    pub fn add_song(&mut self, song: Song) -> Result<NodeId> {
        let (title, artist) = validated_fields(&song.title, &song.artist)?;
        let key = SongKey::new(title.clone(), artist.clone());
        if self.keys.contains_key(&key) {
            return Err(PlaylistError::DuplicateKey(key));
        }

        let id = self.insert_song(Song {
            title,
            artist,
            ..song
        });
        info!(%key, "song added");
        self.persist();
        Ok(id)
    }

    pub fn remove_item(&mut self, key: &SongKey) -> Result<Song> {
        let id = self
            .keys
            .get(key)
            .ok_or_else(|| PlaylistError::NotFound(key.clone()))?;

        let fallback = self
            .sequence
            .next_of(id)
            .or_else(|| self.sequence.prev_of(id));
        if self.current == Some(id) {
            self.current = fallback;
        }
        if self.selected == Some(id) {
            self.selected = fallback;
        }

        let sort_key = self.sequence.get(id).map(|song| self.sorted.key_for(song));
        let song = self
            .sequence
            .remove(id)
            .ok_or_else(|| PlaylistError::NotFound(key.clone()))?;
        self.keys.remove(key);
        if self.sorted_stale {
            self.rebuild_sorted();
        } else if let Some(sort_key) = sort_key {
            self.sorted.remove_entry(&sort_key, id);
        }

        if self.scoped {
            self.scope.retain(|scoped| scoped != key);
        }
        self.up_next.retain(|queued| queued != key);
        self.history.retain(|played| played != key);

        info!(%key, remaining = self.sequence.len(), "song removed");
        self.persist();
        Ok(song)
    }

    pub fn edit_item(&mut self, old_key: &SongKey, new_title: &str, new_artist: &str) -> Result<()> {
        let (title, artist) = validated_fields(new_title, new_artist)?;
        let id = self
            .keys
            .get(old_key)
            .ok_or_else(|| PlaylistError::NotFound(old_key.clone()))?;
        let new_key = SongKey::new(title.clone(), artist.clone());
        if new_key != *old_key && self.keys.contains_key(&new_key) {
            return Err(PlaylistError::DuplicateKey(new_key));
        }

        let before = self.sequence.get(id).map(|song| self.sorted.key_for(song));
        if let Some(song) = self.sequence.get_mut(id) {
            song.title = title;
            song.artist = artist;
        }
        let after = self.sequence.get(id).map(|song| self.sorted.key_for(song));
        if before != after {
            self.sorted_stale = true;
        }

        self.keys.remove(old_key);
        self.keys.put(new_key.clone(), id);
        for key in self
            .scope
            .iter_mut()
            .chain(self.up_next.iter_mut())
            .chain(self.history.iter_mut())
        {
            if key == old_key {
                *key = new_key.clone();
            }
        }

        info!(from = %old_key, to = %new_key, "song edited");
        self.persist();
        Ok(())
    }

    pub fn advance(&mut self, direction: Direction) -> Result<Song> {
        let target = if self.scoped {
            self.scoped_neighbor(direction)?
        } else {
            self.sequence_neighbor(direction)?
        };
        self.set_current(target)
    }

    pub fn play_random(&mut self) -> Result<Song> {
        let target = if self.scoped {
            if self.scope.is_empty() {
                return Err(PlaylistError::EmptyCollection);
            }
            let pick = self.rng.random_range(0..self.scope.len());
            let key = &self.scope[pick];
            self.keys
                .get(key)
                .ok_or_else(|| PlaylistError::NotFound(key.clone()))?
        } else {
            self.sequence
                .random_node(&mut self.rng)
                .ok_or(PlaylistError::EmptyCollection)?
        };
        self.set_current(target)
    }

    /// Starts playback at the selection, else the current song, else the
    /// first song of the active list.
    pub fn play(&mut self) -> Result<Song> {
        if self.sequence.is_empty() {
            return Err(PlaylistError::EmptyCollection);
        }

        let target = self
            .selected
            .take()
            .or(self.current)
            .or_else(|| {
                if self.scoped {
                    self.scope.first().and_then(|key| self.keys.get(key))
                } else {
                    None
                }
            })
            .or_else(|| self.sequence.front())
            .ok_or(PlaylistError::EmptyCollection)?;
        self.set_current(target)
    }

    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            debug!("playback stopped");
        }
    }

    pub fn select(&mut self, key: &SongKey) -> Result<()> {
        let id = self
            .keys
            .get(key)
            .ok_or_else(|| PlaylistError::NotFound(key.clone()))?;
        self.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn reorder(&mut self, field: SortField, direction: SortDirection) {
        let selector = KeySelector::new(field, self.title_policy);
        let current_key = self.current_key();
        let selected_key = self.selected_key();

        let mut songs = self.sequence.to_vec();
        songs.sort_by_cached_key(|song| (selector.key(song), song.title.to_lowercase()));
        if direction == SortDirection::Descending {
            songs.reverse();
        }

        self.sequence.clear();
        for song in songs {
            self.sequence.push_back(song);
        }
        self.keys.clear();
        for (id, song) in self.sequence.iter() {
            self.keys.put(song.key(), id);
        }
        self.rebuild_sorted();

        self.current = current_key.and_then(|key| self.keys.get(&key));
        self.selected = selected_key.and_then(|key| self.keys.get(&key));

        info!(field = field.label(), ?direction, "playlist reordered");
        self.persist();
    }

    /// Exact composite-key hit first (`"title | artist"`), then songs whose
    /// title equals `term`, then every other song whose title or artist
    /// contains it. Comparisons ignore case; ties keep playlist order. The
    /// result becomes the navigation scope.
    pub fn search(&mut self, term: &str) -> Vec<Song> {
        let term = term.trim();
        let needle = term.to_lowercase();
        let mut results: Vec<SongKey> = Vec::new();

        if let Some(key) = parse_key(term).filter(|key| self.keys.contains_key(key)) {
            results.push(key);
        }
        for (_, song) in self.sequence.iter() {
            if song.title.to_lowercase() == needle
                && !results.iter().any(|key| song.matches_key(key))
            {
                results.push(song.key());
            }
        }
        for (_, song) in self.sequence.iter() {
            let hit = song.title.to_lowercase().contains(&needle)
                || song.artist.to_lowercase().contains(&needle);
            if hit && !results.iter().any(|key| song.matches_key(key)) {
                results.push(song.key());
            }
        }

        debug!(term, hits = results.len(), "search scope set");
        self.scope = results;
        self.scoped = true;
        self.scoped_songs()
    }

    pub fn clear_search_scope(&mut self) {
        self.scope.clear();
        self.scoped = false;
    }

    /// In-order traversal of the sorted index.
    pub fn sorted_view(&mut self) -> Vec<Song> {
        if self.sorted_stale {
            self.rebuild_sorted();
        }
        let mut ids = self.sorted.in_order();
        if self.sorted_direction == SortDirection::Descending {
            ids.reverse();
        }
        ids.into_iter()
            .filter_map(|id| self.sequence.get(id))
            .cloned()
            .collect()
    }

    pub fn set_sorted_view(&mut self, field: SortField, direction: SortDirection) {
        let selector = KeySelector::new(field, TitleSortPolicy::Full);
        if selector == self.sorted.selector() && direction == self.sorted_direction {
            return;
        }
        self.sorted_direction = direction;
        self.sorted.rebuild(selector, self.sequence.iter());
        self.sorted_stale = false;
    }

    /// Exact lookup on the sorted index's field. Text fields compare
    /// lowercase; `AddedAt` expects epoch milliseconds.
    pub fn find_by_sort_key(&mut self, raw: &str) -> Option<Song> {
        if self.sorted_stale {
            self.rebuild_sorted();
        }
        let key = match self.sorted.selector().field {
            SortField::AddedAt => SortKey::Number(raw.trim().parse().ok()?),
            SortField::Title | SortField::Artist => SortKey::Text(raw.trim().to_lowercase()),
        };
        let id = self.sorted.search(&key)?;
        self.sequence.get(id).cloned()
    }

    pub fn schedule(&mut self, key: &SongKey) -> Result<()> {
        if !self.keys.contains_key(key) {
            return Err(PlaylistError::NotFound(key.clone()));
        }
        self.up_next.enqueue(key.clone());
        debug!(%key, queued = self.up_next.len(), "song scheduled");
        Ok(())
    }

    pub fn play_scheduled(&mut self) -> Result<Song> {
        while let Some(key) = self.up_next.dequeue() {
            if let Some(id) = self.keys.get(&key) {
                return self.set_current(id);
            }
        }
        Err(PlaylistError::EmptyCollection)
    }

    pub fn up_next(&self) -> Vec<SongKey> {
        self.up_next.to_vec()
    }

    pub fn history(&self) -> Vec<SongKey> {
        self.history.to_vec()
    }

    pub fn view(&self) -> PlaylistView {
        let songs = if self.scoped {
            self.scoped_songs()
        } else {
            self.sequence.to_vec()
        };
        let current = self.current_key();
        let selected = self.selected_key();
        let entries: Vec<ViewEntry> = songs
            .into_iter()
            .map(|song| {
                let key = song.key();
                ViewEntry {
                    is_current: current.as_ref() == Some(&key),
                    is_selected: selected.as_ref() == Some(&key),
                    has_payload: self.payloads.has_payload(&key),
                    song,
                }
            })
            .collect();

        PlaylistView {
            count: entries.len(),
            entries,
            current,
            selected,
            scoped: self.scoped,
            playing: self.is_playing(),
        }
    }

    fn insert_song(&mut self, song: Song) -> NodeId {
        let key = song.key();
        let id = self.sequence.push_back(song);
        self.keys.put(key, id);
        if let Some(song) = self.sequence.get(id) {
            self.sorted.insert(id, song);
        }
        id
    }

    fn sequence_neighbor(&self, direction: Direction) -> Result<NodeId> {
        if self.sequence.is_empty() {
            return Err(PlaylistError::EmptyCollection);
        }
        let next = match self.current {
            Some(id) => self.sequence.neighbor(id, direction),
            None => match direction {
                Direction::Next => self.sequence.front(),
                Direction::Prev => self.sequence.back(),
            },
        };
        next.ok_or(PlaylistError::EmptyCollection)
    }

    fn scoped_neighbor(&self, direction: Direction) -> Result<NodeId> {
        let len = self.scope.len();
        if len == 0 {
            return Err(PlaylistError::EmptyCollection);
        }

        let position = self
            .current()
            .and_then(|song| self.scope.iter().position(|key| song.matches_key(key)));
        let target = match (position, direction) {
            (Some(index), Direction::Next) => (index + 1) % len,
            (Some(index), Direction::Prev) => (index + len - 1) % len,
            (None, Direction::Next) => 0,
            (None, Direction::Prev) => len - 1,
        };
        let key = &self.scope[target];
        self.keys
            .get(key)
            .ok_or_else(|| PlaylistError::NotFound(key.clone()))
    }

    fn set_current(&mut self, id: NodeId) -> Result<Song> {
        let song = self
            .sequence
            .get(id)
            .cloned()
            .ok_or(PlaylistError::EmptyCollection)?;
        self.current = Some(id);
        self.history.enqueue(song.key());
        debug!(key = %song.key(), "now playing");
        Ok(song)
    }

    fn rebuild_sorted(&mut self) {
        let selector = self.sorted.selector();
        self.sorted.rebuild(selector, self.sequence.iter());
        self.sorted_stale = false;
    }

    fn persist(&mut self) {
        let songs = self.sequence.to_vec();
        if let Err(err) = self.snapshots.save_snapshot(&songs) {
            warn!(error = %format!("{err:#}"), "failed to save playlist snapshot");
        }
    }
}

fn validated_fields(title: &str, artist: &str) -> Result<(String, String)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PlaylistError::Validation { field: "title" });
    }
    let artist = artist.trim();
    if artist.is_empty() {
        return Err(PlaylistError::Validation { field: "artist" });
    }
    Ok((title.to_string(), artist.to_string()))
}

/// Parses `"title | artist"` into a key.
pub fn parse_key(raw: &str) -> Option<SongKey> {
    let (title, artist) = raw.split_once('|')?;
    let (title, artist) = validated_fields(title, artist).ok()?;
    Some(SongKey::new(title, artist))
}
