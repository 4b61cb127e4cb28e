use crate::config;
use crate::engine::{PlaylistEngine, PlaylistView, parse_key};
use crate::model::{Direction, Settings, Song, SortDirection, SortField, TitleSortPolicy};
use crate::store::{DirPayloadStore, JsonSnapshotStore};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::{info, warn};

const HELP: &str = "Commands: list [rev] | sorted | add <title> | <artist> [| <seconds>] | rm <title> | <artist> | edit <title> | <artist> => <title> | <artist> | info <title> | <artist> | next | prev | random | play | stop | select <title> | <artist> | unselect | search <term> | clear | sort <title|artist|added> [asc|desc] | view <title|artist|added> [asc|desc] | find <value> | queue <title> | <artist> | playnext | history | policy <first|full> | quit";

#[derive(Debug, Clone, Default)]
pub struct AppStartupOptions {
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub engine: PlaylistEngine,
    pub status: String,
    settings: Settings,
    settings_root: Option<PathBuf>,
}

impl App {
    pub fn new(engine: PlaylistEngine, settings: Settings, settings_root: Option<PathBuf>) -> Self {
        Self {
            engine,
            status: String::from("Ready"),
            settings,
            settings_root,
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let root = match options.config_dir {
        Some(dir) => dir,
        None => config::config_root()?,
    };
    let settings = config::load_settings(&root)?;
    let engine = PlaylistEngine::load(
        &settings,
        Box::new(JsonSnapshotStore::in_dir(&root)),
        Box::new(DirPayloadStore::new(config::payload_dir(&root))),
    )?;
    info!(root = %root.display(), songs = engine.len(), "playdeck started");

    let mut app = App::new(engine, settings, Some(root));
    let stdin = std::io::stdin();
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", render_view(&app.engine.view()))?;

    for line in stdin.lock().lines() {
        let line = line?;
        let outcome = run_command(&mut app, &line);
        writeln!(out, "{}", app.status)?;
        out.flush()?;
        if outcome == CommandOutcome::Quit {
            break;
        }
    }
    Ok(())
}

pub fn run_command(app: &mut App, raw: &str) -> CommandOutcome {
    let input = raw.trim();
    if input.is_empty() {
        app.set_status("No command");
        return CommandOutcome::Continue;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => app.set_status(HELP),
        "quit" | "exit" => {
            app.set_status("Bye");
            return CommandOutcome::Quit;
        }
        "list" => {
            if rest == "rev" {
                let lines = render_songs(&app.engine.songs_reversed());
                app.set_status(lines);
            } else {
                let view = app.engine.view();
                app.set_status(render_view(&view));
            }
        }
        "sorted" => {
            let songs = app.engine.sorted_view();
            app.set_status(render_songs(&songs));
        }
        "add" => add_command(app, rest),
        "rm" => {
            let Some(key) = parse_key(rest) else {
                app.set_status("Usage: rm <title> | <artist>");
                return CommandOutcome::Continue;
            };
            match app.engine.remove_item(&key) {
                Ok(song) => app.set_status(format!("Removed {}", song.details())),
                Err(err) => app.set_status(err.to_string()),
            }
        }
        "edit" => {
            let parsed = rest
                .split_once("=>")
                .and_then(|(old, new)| Some((parse_key(old)?, new.split_once('|')?)));
            let Some((old_key, (title, artist))) = parsed else {
                app.set_status("Usage: edit <title> | <artist> => <title> | <artist>");
                return CommandOutcome::Continue;
            };
            match app.engine.edit_item(&old_key, title, artist) {
                Ok(()) => app.set_status(format!("Edited {old_key}")),
                Err(err) => app.set_status(err.to_string()),
            }
        }
        "info" => {
            let Some(song) = parse_key(rest).and_then(|key| app.engine.get(&key).cloned()) else {
                app.set_status("Usage: info <title> | <artist> (song must exist)");
                return CommandOutcome::Continue;
            };
            let payload = if app.engine.has_payload(&song.key()) {
                "audio available"
            } else {
                "no audio"
            };
            app.set_status(format!(
                "{} | added {} | {payload}",
                song.details(),
                added_date(&song)
            ));
        }
        "next" => playback_status(app, |engine| engine.advance(Direction::Next)),
        "prev" => playback_status(app, |engine| engine.advance(Direction::Prev)),
        "random" => playback_status(app, PlaylistEngine::play_random),
        "play" => playback_status(app, PlaylistEngine::play),
        "playnext" => playback_status(app, PlaylistEngine::play_scheduled),
        "stop" => {
            app.engine.stop();
            app.set_status("Stopped");
        }
        "select" => {
            let Some(key) = parse_key(rest) else {
                app.set_status("Usage: select <title> | <artist>");
                return CommandOutcome::Continue;
            };
            match app.engine.select(&key) {
                Ok(()) => app.set_status(format!("Selected {key}")),
                Err(err) => app.set_status(err.to_string()),
            }
        }
        "unselect" => {
            app.engine.clear_selection();
            app.set_status("Selection cleared");
        }
        "queue" => {
            let Some(key) = parse_key(rest) else {
                app.set_status("Usage: queue <title> | <artist>");
                return CommandOutcome::Continue;
            };
            match app.engine.schedule(&key) {
                Ok(()) => app.set_status(format!("Queued {key}")),
                Err(err) => app.set_status(err.to_string()),
            }
        }
        "history" => {
            let played: Vec<String> = app
                .engine
                .history()
                .iter()
                .map(ToString::to_string)
                .collect();
            if played.is_empty() {
                app.set_status("Nothing played yet");
            } else {
                app.set_status(played.join("\n"));
            }
        }
        "search" => {
            if rest.is_empty() {
                app.set_status("Usage: search <term>");
                return CommandOutcome::Continue;
            }
            let hits = app.engine.search(rest);
            if hits.is_empty() {
                app.set_status(format!("No songs match '{rest}'"));
            } else {
                app.set_status(format!("Found {} songs:\n{}", hits.len(), render_songs(&hits)));
            }
        }
        "clear" => {
            app.engine.clear_search_scope();
            app.set_status("Search cleared");
        }
        "sort" | "view" => {
            let Some((field, direction)) = parse_sort_args(rest) else {
                app.set_status(format!("Usage: {command} <title|artist|added> [asc|desc]"));
                return CommandOutcome::Continue;
            };
            if command == "sort" {
                app.engine.reorder(field, direction);
                app.set_status(format!("Sorted by {}", field.label()));
            } else {
                app.engine.set_sorted_view(field, direction);
                app.settings.sorted_view_field = field;
                save_settings(app);
                let songs = app.engine.sorted_view();
                app.set_status(render_songs(&songs));
            }
        }
        "find" => match app.engine.find_by_sort_key(rest) {
            Some(song) => app.set_status(format!("Found {}", song.details())),
            None => app.set_status("Song not found"),
        },
        "policy" => {
            let policy = match rest {
                "first" => TitleSortPolicy::FirstLetter,
                "full" => TitleSortPolicy::Full,
                _ => {
                    app.set_status("Usage: policy <first|full>");
                    return CommandOutcome::Continue;
                }
            };
            app.engine.set_title_policy(policy);
            app.settings.title_sort = policy;
            save_settings(app);
            app.set_status(format!("Title sort policy: {policy:?}"));
        }
        other => app.set_status(format!("Unknown command '{other}', try 'help'")),
    }
    CommandOutcome::Continue
}

fn save_settings(app: &App) {
    let Some(root) = &app.settings_root else {
        return;
    };
    if let Err(err) = config::save_settings(root, &app.settings) {
        warn!(error = %format!("{err:#}"), "failed to save settings");
    }
}

fn add_command(app: &mut App, rest: &str) {
    let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
    let (title, artist, seconds) = match parts.as_slice() {
        [title, artist] => (*title, *artist, None),
        [title, artist, seconds] => (*title, *artist, Some(*seconds)),
        _ => {
            app.set_status("Usage: add <title> | <artist> [| <seconds>]");
            return;
        }
    };

    let mut song = Song::new(title, artist);
    if let Some(raw) = seconds {
        match raw.parse::<u32>() {
            Ok(seconds) => song.duration_seconds = Some(seconds),
            Err(_) => {
                app.set_status("Duration must be whole seconds");
                return;
            }
        }
    }

    match app.engine.add_song(song) {
        Ok(_) => app.set_status(format!("Added {} - {}", title, artist)),
        Err(err) => app.set_status(err.to_string()),
    }
}

fn playback_status(
    app: &mut App,
    action: impl FnOnce(&mut PlaylistEngine) -> crate::error::Result<Song>,
) {
    match action(&mut app.engine) {
        Ok(song) => app.set_status(format!("Playing: {}", song.details())),
        Err(err) => app.set_status(err.to_string()),
    }
}

fn parse_sort_args(rest: &str) -> Option<(SortField, SortDirection)> {
    let mut words = rest.split_whitespace();
    let field = SortField::parse(words.next()?)?;
    let direction = match words.next() {
        Some(raw) => SortDirection::parse(raw)?,
        None => SortDirection::Ascending,
    };
    Some((field, direction))
}

fn added_date(song: &Song) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(song.added_at_ms) * 1_000_000)
        .map(|stamp| stamp.date().to_string())
        .unwrap_or_else(|_| String::from("unknown"))
}

pub fn render_songs(songs: &[Song]) -> String {
    if songs.is_empty() {
        return String::from("Playlist is empty");
    }
    songs
        .iter()
        .enumerate()
        .map(|(index, song)| format!("{:>3}. {} - {}", index + 1, song.title, song.artist))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_view(view: &PlaylistView) -> String {
    if view.entries.is_empty() {
        return String::from("Playlist is empty");
    }

    let mut lines = Vec::with_capacity(view.entries.len() + 1);
    if view.scoped {
        lines.push(format!("Search results ({})", view.count));
    }
    for (index, entry) in view.entries.iter().enumerate() {
        let marker = if entry.is_current && view.playing {
            '>'
        } else if entry.is_selected {
            '*'
        } else {
            ' '
        };
        let audio = if entry.has_payload { " [audio]" } else { "" };
        lines.push(format!(
            "{marker}{:>3}. {} - {}{audio}",
            index + 1,
            entry.song.title,
            entry.song.artist
        ));
    }
    lines.join("\n")
}
