use crate::model::Settings;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "playdeck";
const SETTINGS_FILE: &str = "settings.json";
const PLAYLIST_FILE: &str = "playlist.json";
const PAYLOAD_DIR: &str = "payloads";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("PLAYDECK_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn playlist_path(root: &Path) -> PathBuf {
    root.join(PLAYLIST_FILE)
}

pub fn payload_dir(root: &Path) -> PathBuf {
    root.join(PAYLOAD_DIR)
}

pub fn ensure_dir(root: &Path) -> Result<()> {
    fs::create_dir_all(root).with_context(|| format!("failed to create {}", root.display()))
}

pub fn load_settings(root: &Path) -> Result<Settings> {
    let path = settings_path(root);
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(root: &Path, settings: &Settings) -> Result<()> {
    ensure_dir(root)?;
    let path = settings_path(root);
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
