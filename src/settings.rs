//! Key/value settings storage.
//!
//! Values live under `[Section]` headers as `key=value` lines. Colours are
//! written as `r,g,b`. Unknown lines are preserved on save; malformed lines
//! are skipped on load.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::Rgba;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Minimal string store the render settings are persisted through.
pub trait SettingsStore {
    fn get(&self, section: &str, key: &str) -> Option<String>;
    fn set(&mut self, section: &str, key: &str, value: String);

    fn get_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.get(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.get(section, key).as_deref().map(str::trim) {
            Some("true") | Some("1") | Some("yes") => true,
            Some("false") | Some("0") | Some("no") => false,
            _ => default,
        }
    }

    fn get_color(&self, section: &str, key: &str, default: Rgba<u8>) -> Rgba<u8> {
        self.get(section, key)
            .and_then(|v| str_to_color(&v))
            .unwrap_or(default)
    }

    fn set_int(&mut self, section: &str, key: &str, value: i32) {
        self.set(section, key, value.to_string());
    }

    fn set_bool(&mut self, section: &str, key: &str, value: bool) {
        self.set(section, key, value.to_string());
    }

    fn set_color(&mut self, section: &str, key: &str, value: Rgba<u8>) {
        self.set(section, key, color_to_str(value));
    }
}

/// Serialize an opaque colour as "r,g,b"
pub fn color_to_str(c: Rgba<u8>) -> String {
    format!("{},{},{}", c[0], c[1], c[2])
}

/// Parse "r,g,b" (or "r,g,b,a") into a colour; alpha defaults to 255.
pub fn str_to_color(s: &str) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let r = parts[0].trim().parse::<u8>().ok()?;
    let g = parts[1].trim().parse::<u8>().ok()?;
    let b = parts[2].trim().parse::<u8>().ok()?;
    let a = match parts.get(3) {
        Some(a) => a.trim().parse::<u8>().ok()?,
        None => 255,
    };
    Some(Rgba([r, g, b, a]))
}

/// In-memory store, used when nothing should touch the disk.
#[derive(Clone, Debug, Default)]
pub struct MemorySettings {
    values: HashMap<(String, String), String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.values.get(&(section.to_string(), key.to_string())).cloned()
    }

    fn set(&mut self, section: &str, key: &str, value: String) {
        self.values.insert((section.to_string(), key.to_string()), value);
    }
}

/// File-backed store in a small INI dialect.
///
/// `set` only updates memory; call [`IniSettings::save`] to write the file.
#[derive(Clone, Debug)]
pub struct IniSettings {
    path: PathBuf,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl IniSettings {
    /// Load from `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        let mut s = Self { path, sections: BTreeMap::new() };
        s.parse(&content);
        Ok(s)
    }

    fn parse(&mut self, content: &str) {
        let mut section = String::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                log::debug!("settings: skipping malformed line {:?}", line);
                continue;
            };
            self.sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), val.trim().to_string());
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn to_config_string(&self) -> String {
        let mut content = String::new();
        for (name, values) in &self.sections {
            if !name.is_empty() {
                content.push_str(&format!("[{}]\n", name));
            }
            for (key, val) in values {
                content.push_str(&format!("{}={}\n", key, val));
            }
            content.push('\n');
        }
        content
    }

    /// Write every section back to the file, creating parent directories.
    pub fn save(&self) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        std::fs::write(&self.path, self.to_config_string()).map_err(io_err)
    }
}

impl SettingsStore for IniSettings {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section)?.get(key).cloned()
    }

    fn set(&mut self, section: &str, key: &str, value: String) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_fall_back_to_defaults() {
        let mut s = MemorySettings::new();
        assert_eq!(s.get_int("Options", "Missing", 7), 7);
        s.set("Options", "Bad", "x".to_string());
        assert_eq!(s.get_int("Options", "Bad", 3), 3);
        assert!(s.get_bool("Options", "Bad", true));
        assert_eq!(s.get_color("Options", "Bad", Rgba([1, 2, 3, 255])), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn typed_setters_round_trip() {
        let mut s = MemorySettings::new();
        s.set_int("Options", "Kind", 2);
        s.set_bool("Options", "Flag", false);
        s.set_color("Options", "Color", Rgba([10, 20, 30, 255]));
        assert_eq!(s.get_int("Options", "Kind", 0), 2);
        assert!(!s.get_bool("Options", "Flag", true));
        assert_eq!(s.get_color("Options", "Color", Rgba([0, 0, 0, 255])), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn parse_color_variants() {
        assert_eq!(str_to_color(" 1, 2 ,3"), Some(Rgba([1, 2, 3, 255])));
        assert_eq!(str_to_color("1,2,3,4"), Some(Rgba([1, 2, 3, 4])));
        assert_eq!(str_to_color("1,2"), None);
        assert_eq!(str_to_color("1,2,300"), None);
    }

    #[test]
    fn ini_parses_sections_and_skips_garbage() {
        let mut s = IniSettings { path: PathBuf::from("unused.cfg"), sections: BTreeMap::new() };
        s.parse("# comment\n[Options]\nCheckedBgType = 2\nnot a pair\n[Other]\nCheckedBgType=9\n");
        assert_eq!(s.get("Options", "CheckedBgType").as_deref(), Some("2"));
        assert_eq!(s.get("Other", "CheckedBgType").as_deref(), Some("9"));
        assert_eq!(s.get("Options", "not a pair"), None);
    }

    #[test]
    fn ini_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("spritefe-settings-{}", std::process::id()))
            .join("settings.cfg");
        let mut s = IniSettings::load(&path).unwrap();
        s.set_bool("Options", "CheckedBgZoom", false);
        s.set_color("Options", "CheckedBgColor1", Rgba([5, 6, 7, 255]));
        s.save().unwrap();

        let reloaded = IniSettings::load(&path).unwrap();
        assert!(!reloaded.get_bool("Options", "CheckedBgZoom", true));
        assert_eq!(reloaded.get_color("Options", "CheckedBgColor1", Rgba([0, 0, 0, 255])), Rgba([5, 6, 7, 255]));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
