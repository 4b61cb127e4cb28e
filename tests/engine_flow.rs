use playdeck::engine::{PlaybackState, PlaylistEngine};
use playdeck::error::PlaylistError;
use playdeck::model::{Direction, Settings, SongKey, SortDirection, SortField};
use playdeck::store::{MemorySnapshotStore, NoPayloads};

fn titles(engine: &PlaylistEngine) -> Vec<String> {
    engine.songs().into_iter().map(|song| song.title).collect()
}

#[test]
fn add_sort_and_wrap_through_playlist() {
    let mut engine = PlaylistEngine::new(&Settings::default());
    engine.add_item("Alpha", "X").expect("add");
    engine.add_item("Beta", "Y").expect("add");
    engine.add_item("Gamma", "X").expect("add");

    engine.reorder(SortField::Artist, SortDirection::Ascending);
    assert_eq!(titles(&engine), vec!["Alpha", "Gamma", "Beta"]);

    for expected in ["Alpha", "Gamma", "Beta", "Alpha"] {
        let song = engine.advance(Direction::Next).expect("advance");
        assert_eq!(song.title, expected);
    }
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn removing_playing_song_hands_over_to_neighbor() {
    let mut engine = PlaylistEngine::new(&Settings::default());
    for title in ["a", "b", "c"] {
        engine.add_item(title, "x").expect("add");
    }
    engine.advance(Direction::Prev).expect("tail");
    assert_eq!(engine.current_key(), Some(SongKey::new("c", "x")));

    engine.remove_item(&SongKey::new("c", "x")).expect("remove");
    assert_eq!(engine.current_key(), Some(SongKey::new("b", "x")));
    assert_eq!(engine.index_sizes(), (2, 2, 2));
}

#[test]
fn stale_handles_do_not_resolve_after_clear_and_reload() {
    let mut engine = PlaylistEngine::new(&Settings::default());
    engine.add_item("a", "x").expect("add");
    let old = engine.handle(&SongKey::new("a", "x")).expect("handle");

    engine.remove_item(&SongKey::new("a", "x")).expect("remove");
    engine.add_item("a", "x").expect("re-add");
    let new = engine.handle(&SongKey::new("a", "x")).expect("handle");
    assert_ne!(old, new);
}

#[test]
fn search_scope_drives_navigation_until_cleared() {
    let mut engine = PlaylistEngine::new(&Settings::default());
    for (title, artist) in [("Cat", "A"), ("Dog", "C"), ("Bat", "B")] {
        engine.add_item(title, artist).expect("add");
    }

    let hits = engine.search("AT");
    assert_eq!(hits.len(), 2);
    assert_eq!(engine.advance(Direction::Prev).expect("prev").title, "Bat");
    assert_eq!(engine.advance(Direction::Prev).expect("prev").title, "Cat");

    engine.clear_search_scope();
    assert!(!engine.is_scoped());
    assert_eq!(engine.advance(Direction::Next).expect("next").title, "Dog");
}

#[test]
fn edit_keeps_position_and_updates_sorted_view() {
    let store = MemorySnapshotStore::new();
    let mut engine = PlaylistEngine::with_stores(
        &Settings::default(),
        Box::new(store.clone()),
        Box::new(NoPayloads),
    );
    for title in ["b", "c", "d"] {
        engine.add_item(title, "x").expect("add");
    }
    engine.edit_item(&SongKey::new("d", "x"), "a", "x").expect("edit");

    assert_eq!(titles(&engine), vec!["b", "c", "a"]);
    let sorted: Vec<String> = engine
        .sorted_view()
        .into_iter()
        .map(|song| song.title)
        .collect();
    assert_eq!(sorted, vec!["a", "b", "c"]);

    let saved: Vec<String> = store.songs().into_iter().map(|song| song.title).collect();
    assert_eq!(saved, vec!["b", "c", "a"]);
}

#[test]
fn errors_leave_playlist_untouched() {
    let store = MemorySnapshotStore::new();
    let mut engine = PlaylistEngine::with_stores(
        &Settings::default(),
        Box::new(store.clone()),
        Box::new(NoPayloads),
    );
    engine.add_item("a", "x").expect("add");
    let saves = store.save_count();

    assert_eq!(
        engine.add_item("a", "x"),
        Err(PlaylistError::DuplicateKey(SongKey::new("a", "x")))
    );
    assert!(matches!(
        engine.edit_item(&SongKey::new("a", "x"), "", "x"),
        Err(PlaylistError::Validation { field: "title" })
    ));
    assert!(engine.remove_item(&SongKey::new("z", "x")).is_err());

    assert_eq!(store.save_count(), saves);
    assert_eq!(titles(&engine), vec!["a"]);
}
