use playdeck::config;
use playdeck::engine::PlaylistEngine;
use playdeck::model::{Settings, Song, SongKey, SortDirection, SortField};
use playdeck::store::{DirPayloadStore, JsonSnapshotStore, MemorySnapshotStore, NoPayloads};
use std::fs;
use tempfile::tempdir;

fn load_from(root: &std::path::Path, settings: &Settings) -> PlaylistEngine {
    PlaylistEngine::load(
        settings,
        Box::new(JsonSnapshotStore::in_dir(root)),
        Box::new(DirPayloadStore::new(config::payload_dir(root))),
    )
    .expect("load")
}

#[test]
fn first_run_seeds_demo_songs_and_writes_them() {
    let dir = tempdir().expect("tempdir");
    let engine = load_from(dir.path(), &Settings::default());
    assert_eq!(engine.len(), 3);
    assert!(config::playlist_path(dir.path()).exists());

    let reloaded = load_from(dir.path(), &Settings::default());
    assert_eq!(reloaded.songs(), engine.songs());
}

#[test]
fn emptied_playlist_stays_empty_after_restart() {
    let dir = tempdir().expect("tempdir");
    let mut engine = load_from(dir.path(), &Settings::default());
    for song in engine.songs() {
        engine.remove_item(&song.key()).expect("remove");
    }
    assert!(engine.is_empty());

    let reloaded = load_from(dir.path(), &Settings::default());
    assert!(reloaded.is_empty());
    let raw = fs::read_to_string(config::playlist_path(dir.path())).expect("read");
    assert!(raw.contains("\"songs\": []"));
}

#[test]
fn memory_store_distinguishes_never_saved_from_emptied() {
    let store = MemorySnapshotStore::new();
    let mut engine =
        PlaylistEngine::load(&Settings::default(), Box::new(store.clone()), Box::new(NoPayloads))
            .expect("load");
    assert_eq!(engine.len(), 3);
    for song in engine.songs() {
        engine.remove_item(&song.key()).expect("remove");
    }

    let reloaded =
        PlaylistEngine::load(&Settings::default(), Box::new(store.clone()), Box::new(NoPayloads))
            .expect("load");
    assert_eq!(reloaded.len(), 0);
}

#[test]
fn seeding_can_be_disabled() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings {
        seed_demo_songs: false,
        ..Settings::default()
    };
    let engine = load_from(dir.path(), &settings);
    assert!(engine.is_empty());
    assert!(!config::playlist_path(dir.path()).exists());
}

#[test]
fn order_survives_restart() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings {
        seed_demo_songs: false,
        ..Settings::default()
    };
    let mut engine = load_from(dir.path(), &settings);
    for (title, artist) in [("Alpha", "X"), ("Beta", "Y"), ("Gamma", "X")] {
        engine.add_item(title, artist).expect("add");
    }
    engine.reorder(SortField::Artist, SortDirection::Descending);
    let before = engine.songs();

    let reloaded = load_from(dir.path(), &settings);
    assert_eq!(reloaded.songs(), before);
    assert_eq!(reloaded.index_sizes(), (3, 3, 3));
    assert_eq!(reloaded.current_key(), None);
}

#[test]
fn load_skips_invalid_and_duplicate_entries() {
    let mut blank = Song::new("  ", "x");
    blank.added_at_ms = 1;
    let store = MemorySnapshotStore::with_songs(vec![
        Song::new(" a ", "x"),
        blank,
        Song::new("a", "x"),
        Song::new("b", "y"),
    ]);
    let engine = PlaylistEngine::load(&Settings::default(), Box::new(store), Box::new(NoPayloads))
        .expect("load");

    let keys: Vec<SongKey> = engine.songs().iter().map(Song::key).collect();
    assert_eq!(keys, vec![SongKey::new("a", "x"), SongKey::new("b", "y")]);
}

#[test]
fn corrupt_playlist_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    fs::write(config::playlist_path(dir.path()), "[oops").expect("write");
    let result = PlaylistEngine::load(
        &Settings::default(),
        Box::new(JsonSnapshotStore::in_dir(dir.path())),
        Box::new(NoPayloads),
    );
    let err = result.expect_err("corrupt file");
    assert!(format!("{err:#}").contains("playlist.json"));
}

#[test]
fn payload_files_show_up_in_view() {
    let dir = tempdir().expect("tempdir");
    let payloads = config::payload_dir(dir.path());
    fs::create_dir_all(&payloads).expect("mkdir");
    fs::write(payloads.join("Song 1 - Artist A.mp3"), b"ID3").expect("write");

    let engine = load_from(dir.path(), &Settings::default());
    let view = engine.view();
    let flagged: Vec<&str> = view
        .entries
        .iter()
        .filter(|entry| entry.has_payload)
        .map(|entry| entry.song.title.as_str())
        .collect();
    assert_eq!(flagged, vec!["Song 1"]);
}
