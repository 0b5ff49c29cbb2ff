use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{ConfigError, ConfigResult, ConfigValidator};

/// Default upper bound on the pending buffer of a single stream (1 MiB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// The literal open/close markers that wrap inline thought content.
///
/// Exactly one pair is active per stream. Both historical conventions are
/// available as presets; anything else can be supplied as a custom pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterPair {
    pub open: String,
    pub close: String,
}

impl DelimiterPair {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// `<<<THOUGHT>>>` ... `<<<END>>>`, the convention the translation prompt asks for.
    pub fn bracketed() -> Self {
        Self::new("<<<THOUGHT>>>", "<<<END>>>")
    }

    /// `<think>` ... `</think>`, emitted natively by many reasoning models.
    pub fn think_tags() -> Self {
        Self::new("<think>", "</think>")
    }

    pub fn from_preset(preset: DelimiterPreset) -> Self {
        match preset {
            DelimiterPreset::Bracketed => Self::bracketed(),
            DelimiterPreset::ThinkTags => Self::think_tags(),
        }
    }
}

impl Default for DelimiterPair {
    fn default() -> Self {
        Self::bracketed()
    }
}

impl fmt::Display for DelimiterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ... {}", self.open, self.close)
    }
}

/// Named delimiter conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterPreset {
    Bracketed,
    ThinkTags,
}

impl FromStr for DelimiterPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "bracketed" => Ok(Self::Bracketed),
            "think_tags" | "think" => Ok(Self::ThinkTags),
            _ => Err(ConfigError::InvalidValue {
                field: "delimiters".to_string(),
                value: s.to_string(),
                reason: "expected 'bracketed' or 'think_tags'".to_string(),
            }),
        }
    }
}

/// Configuration of one translation stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Marker pair delimiting inline thought content
    #[serde(default)]
    pub delimiters: DelimiterPair,
    /// User preference for displaying thoughts. Thought text is computed
    /// either way; renderers consult this flag.
    #[serde(default)]
    pub show_thoughts: bool,
    /// Maximum bytes held in the pending buffer while a thought is open
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

fn default_max_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER_SIZE
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            delimiters: DelimiterPair::default(),
            show_thoughts: false,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl StreamConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: StreamConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseFailed {
                reason: e.to_string(),
            })?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&contents)
    }
}
