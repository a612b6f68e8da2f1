use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{ConfigResult, ExtractSnafu, InvalidParameterSnafu, MissingFileSnafu};

pub const CONFIG_DIRECTORY_NAME: &str = "bubble";
pub const CONFIG_FILE_NAME: &str = "bubble.json";
pub const ENV_PREFIX: &str = "BUBBLE_";

/// Reaction catalog shown in the picker, in display order.
pub const DEFAULT_REACTIONS: [&str; 6] = ["👍", "❤️", "😂", "😮", "😢", "🙏"];

/// Spring used to return the bubble to rest after a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Distance from rest below which the spring may settle.
    pub rest_delta: f32,
    /// Speed below which the spring may settle.
    pub rest_speed: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 400.0,
            damping: 30.0,
            mass: 1.0,
            rest_delta: 0.5,
            rest_speed: 0.5,
        }
    }
}

/// Tunables for one bubble instance.
///
/// The reply threshold and drag extent are empirical; both stay configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BubbleConfig {
    pub long_press_ms: u64,
    pub reply_threshold: f32,
    pub max_drag: f32,
    /// Fraction of out-of-bounds pointer travel that still moves the bubble.
    pub drag_elasticity: f32,
    /// Pointer travel that turns a press into a drag.
    pub jitter_threshold: f32,
    pub frame_interval_ms: u64,
    pub spring: SpringConfig,
    pub reactions: Vec<String>,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            reply_threshold: 60.0,
            max_drag: 100.0,
            drag_elasticity: 0.2,
            jitter_threshold: 6.0,
            frame_interval_ms: 16,
            spring: SpringConfig::default(),
            reactions: DEFAULT_REACTIONS.iter().map(|emoji| emoji.to_string()).collect(),
        }
    }
}

impl BubbleConfig {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(CONFIG_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".bubble"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(CONFIG_FILE_NAME)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Loads defaults, then the JSON file when it exists, then `BUBBLE_*` variables.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if path.exists() {
            figment = figment.merge(Json::file(path));
        } else {
            tracing::info!("bubble config not found at {:?}, using defaults", path);
        }

        Self::extract(figment.merge(Self::env()))
    }

    /// `BUBBLE_LONG_PRESS_MS` maps to `longPressMs`, `BUBBLE_SPRING__REST_DELTA`
    /// to `spring.restDelta`.
    fn env() -> Env {
        Env::prefixed(ENV_PREFIX)
            .map(|key| env_key_path(key.as_str()).into())
            .lowercase(false)
    }

    /// Loads an explicitly requested file; a missing file is an error here.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return MissingFileSnafu {
                stage: "locate-bubble-config",
                path: path.to_path_buf(),
            }
            .fail();
        }

        Self::load(path)
    }

    fn extract(figment: Figment) -> ConfigResult<Self> {
        let config = figment.extract::<Self>().context(ExtractSnafu {
            stage: "extract-bubble-config",
        })?;
        config.validated()
    }

    /// Rejects parameter combinations the gesture and press logic cannot honour.
    pub fn validated(mut self) -> ConfigResult<Self> {
        let stage = "validate-bubble-config";

        if !(self.max_drag.is_finite() && self.max_drag > 0.0) {
            return InvalidParameterSnafu {
                stage,
                parameter: "maxDrag",
                details: format!("must be a positive number, got {}", self.max_drag),
            }
            .fail();
        }
        if !(self.reply_threshold.is_finite()
            && self.reply_threshold >= 0.0
            && self.reply_threshold < self.max_drag)
        {
            return InvalidParameterSnafu {
                stage,
                parameter: "replyThreshold",
                details: format!(
                    "must lie in [0, maxDrag={}), got {}",
                    self.max_drag, self.reply_threshold
                ),
            }
            .fail();
        }
        if !(0.0..=1.0).contains(&self.drag_elasticity) {
            return InvalidParameterSnafu {
                stage,
                parameter: "dragElasticity",
                details: format!("must lie in [0, 1], got {}", self.drag_elasticity),
            }
            .fail();
        }
        if !(self.jitter_threshold.is_finite() && self.jitter_threshold >= 0.0) {
            return InvalidParameterSnafu {
                stage,
                parameter: "jitterThreshold",
                details: format!("must be non-negative, got {}", self.jitter_threshold),
            }
            .fail();
        }
        if self.spring.stiffness <= 0.0 || self.spring.mass <= 0.0 || self.spring.damping < 0.0 {
            return InvalidParameterSnafu {
                stage,
                parameter: "spring",
                details: format!("stiffness and mass must be positive: {:?}", self.spring),
            }
            .fail();
        }

        // Blank entries are dropped rather than rendered as empty buttons.
        self.reactions = self
            .reactions
            .into_iter()
            .map(|emoji| emoji.trim().to_string())
            .filter(|emoji| !emoji.is_empty())
            .collect();
        if self.reactions.is_empty() {
            return InvalidParameterSnafu {
                stage,
                parameter: "reactions",
                details: "reaction catalog must not be empty".to_string(),
            }
            .fail();
        }
        let mut seen = HashSet::with_capacity(self.reactions.len());
        if let Some(duplicate) = self.reactions.iter().find(|emoji| !seen.insert(*emoji)) {
            return InvalidParameterSnafu {
                stage,
                parameter: "reactions",
                details: format!("reaction '{duplicate}' is listed twice"),
            }
            .fail();
        }

        Ok(self)
    }
}

fn env_key_path(raw: &str) -> String {
    raw.to_ascii_lowercase()
        .split("__")
        .map(camel_case)
        .collect::<Vec<_>>()
        .join(".")
}

fn camel_case(segment: &str) -> String {
    let mut words = segment.split('_').filter(|word| !word.is_empty());
    let mut key = words.next().unwrap_or_default().to_string();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            key.push(first.to_ascii_uppercase());
            key.push_str(chars.as_str());
        }
    }
    key
}
