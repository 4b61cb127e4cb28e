#![no_main]

use libfuzzer_sys::fuzz_target;
use playdeck::engine::PlaylistEngine;
use playdeck::model::{Direction, Settings, SongKey, SortDirection, SortField};

fuzz_target!(|data: &[u8]| {
    let mut engine = PlaylistEngine::new(&Settings::default());

    for pair in data.chunks(2) {
        let op = pair[0];
        let arg = pair.get(1).copied().unwrap_or_default();
        let key = SongKey::new(format!("t{}", arg % 7), format!("a{}", arg % 3));
        match op % 10 {
            0 | 1 => {
                let _ = engine.add_item(&key.title, &key.artist);
            }
            2 => {
                let _ = engine.remove_item(&key);
            }
            3 => {
                let _ = engine.edit_item(&key, &format!("e{}", arg % 5), "a0");
            }
            4 => {
                let _ = engine.advance(Direction::Next);
            }
            5 => {
                let _ = engine.advance(Direction::Prev);
            }
            6 => {
                let _ = engine.play_random();
            }
            7 => {
                let field = match arg % 3 {
                    0 => SortField::Title,
                    1 => SortField::Artist,
                    _ => SortField::AddedAt,
                };
                engine.reorder(field, SortDirection::Descending);
            }
            8 => {
                if arg % 2 == 0 {
                    engine.search(&key.title);
                } else {
                    engine.clear_search_scope();
                }
            }
            _ => {
                let _ = engine.sorted_view();
            }
        }

        let (sequence, keys, sorted) = engine.index_sizes();
        assert_eq!(sequence, keys);
        assert_eq!(sequence, sorted);
        if let Some(current) = engine.current_key() {
            assert!(engine.contains(&current));
        }
    }
});
