//! TOML configuration loading: embedded defaults plus a user override.

use serde::Deserialize;

use celesta_types::{InvalidLayout, KeyLayout, ToneId, DEFAULT_TRANSPOSE};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// The reconfiguration surface consumed by the engine: the visible key
/// window and its tier layout. Applied atomically; the arbitration records
/// are rebuilt whenever it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardConfig {
    pub layout: KeyLayout,
    /// Number of visible keys.
    pub key_count: usize,
    /// Tone of the leftmost visible key.
    pub lowest_tone: u8,
}

impl KeyboardConfig {
    /// Map a visible key index to its tone. `None` when the index is
    /// outside the key window or the tone falls outside the tone space.
    pub fn tone_for_key(&self, key: usize) -> Option<ToneId> {
        if key >= self.key_count {
            return None;
        }
        ToneId::from_i32(self.lowest_tone as i32 + key as i32)
    }

    /// Validate and build a config from raw reconfiguration input.
    pub fn build(layout: &str, key_count: usize, lowest_tone: u8) -> Result<Self, InvalidLayout> {
        Ok(Self {
            layout: KeyLayout::parse(layout)?,
            key_count,
            lowest_tone,
        })
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            layout: KeyLayout::default(),
            key_count: 88,
            lowest_tone: 21,
        }
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    keyboard: KeyboardSection,
    #[serde(default)]
    input: InputSection,
}

#[derive(Deserialize, Default)]
struct KeyboardSection {
    layout: Option<String>,
    key_count: Option<usize>,
    lowest_tone: Option<u8>,
}

#[derive(Deserialize, Default)]
struct InputSection {
    transpose: Option<i32>,
}

pub struct Config {
    keyboard: KeyboardSection,
    input: InputSection,
}

impl Config {
    /// Load the embedded defaults merged with the user override, if any.
    /// A malformed or unreadable user file is logged and ignored.
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("embedded config.toml must parse");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_keyboard(&mut base.keyboard, user.keyboard);
                            merge_input(&mut base.input, user.input);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            keyboard: base.keyboard,
            input: base.input,
        }
    }

    /// The configured keyboard. An invalid layout string in the config is
    /// logged and replaced by the standard layout.
    pub fn keyboard(&self) -> KeyboardConfig {
        let fallback = KeyboardConfig::default();
        let layout = match self.keyboard.layout.as_deref() {
            Some(s) => match KeyLayout::parse(s) {
                Ok(layout) => layout,
                Err(e) => {
                    log::warn!(target: "config", "ignoring configured layout {:?}: {}", s, e);
                    fallback.layout.clone()
                }
            },
            None => fallback.layout.clone(),
        };
        KeyboardConfig {
            layout,
            key_count: self.keyboard.key_count.unwrap_or(fallback.key_count),
            lowest_tone: self.keyboard.lowest_tone.unwrap_or(fallback.lowest_tone),
        }
    }

    pub fn transpose(&self) -> i32 {
        self.input.transpose.unwrap_or(DEFAULT_TRANSPOSE)
    }

    #[cfg(test)]
    fn from_toml_str(contents: &str) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("embedded config.toml must parse");
        let user: ConfigFile = toml::from_str(contents).unwrap_or_default();
        merge_keyboard(&mut base.keyboard, user.keyboard);
        merge_input(&mut base.input, user.input);
        Config {
            keyboard: base.keyboard,
            input: base.input,
        }
    }
}

fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|dir| dir.join("celesta").join("config.toml"))
}

fn merge_keyboard(base: &mut KeyboardSection, user: KeyboardSection) {
    if user.layout.is_some() {
        base.layout = user.layout;
    }
    if user.key_count.is_some() {
        base.key_count = user.key_count;
    }
    if user.lowest_tone.is_some() {
        base.lowest_tone = user.lowest_tone;
    }
}

fn merge_input(base: &mut InputSection, user: InputSection) {
    if user.transpose.is_some() {
        base.transpose = user.transpose;
    }
}
