#![deny(unsafe_code)]
//! Scenario replay for the bubble engine.
//!
//! A scenario is one message snapshot plus a timestamped list of input events.
//! Replaying runs it through the virtual-clock simulation and reports every
//! intent the bubble emitted together with its final view.

use std::path::{Path, PathBuf};

use bubble_engine::{
    BubbleConfig, BubbleIntent, BubbleView, ConfigError, DisplayMessage, Rect, ScheduledEvent,
    Simulation, SnapshotError,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReplayError {
    #[snafu(display("failed to read scenario at {path:?} on `{stage}`: {source}"))]
    ReadScenario {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to parse scenario at {path:?} on `{stage}`: {source}"))]
    ParseScenario {
        stage: &'static str,
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("failed to load bubble config on `{stage}`: {source}"))]
    Config {
        stage: &'static str,
        source: ConfigError,
    },
    #[snafu(display("scenario snapshot rejected on `{stage}`: {source}"))]
    InvalidSnapshot {
        stage: &'static str,
        source: SnapshotError,
    },
    #[snafu(display("failed to serialize replay output on `{stage}`: {source}"))]
    SerializeReport {
        stage: &'static str,
        source: serde_json::Error,
    },
}

pub type ReplayResult<T> = Result<T, ReplayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerFlags {
    pub react: bool,
    pub reply: bool,
}

impl Default for HandlerFlags {
    fn default() -> Self {
        Self {
            react: true,
            reply: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub message: DisplayMessage,
    #[serde(default)]
    pub handlers: HandlerFlags,
    #[serde(default)]
    pub bounds: Option<Rect>,
    /// Feed reaction intents back into the snapshot, as the message store would.
    #[serde(default = "default_reflect_reactions")]
    pub reflect_reactions: bool,
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

impl Scenario {
    pub fn load(path: &Path) -> ReplayResult<Self> {
        let content = std::fs::read_to_string(path).context(ReadScenarioSnafu {
            stage: "read-scenario-file",
            path: path.to_path_buf(),
        })?;

        serde_json::from_str(&content).context(ParseScenarioSnafu {
            stage: "parse-scenario-json",
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayOptions {
    /// Run animation timers to completion after the last event.
    pub settle: bool,
    /// Reject snapshots that break reaction invariants instead of warning.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub intents: Vec<BubbleIntent>,
    pub view: Option<BubbleView>,
    pub elapsed_ms: u64,
}

impl ReplayReport {
    /// One JSON object per intent, then the final view.
    pub fn to_json_lines(&self) -> ReplayResult<Vec<String>> {
        let mut lines = Vec::with_capacity(self.intents.len() + 1);
        for intent in &self.intents {
            lines.push(serde_json::to_string(intent).context(SerializeReportSnafu {
                stage: "serialize-intent",
            })?);
        }

        let tail = ReportTail {
            view: self.view.as_ref(),
            elapsed_ms: self.elapsed_ms,
        };
        lines.push(serde_json::to_string(&tail).context(SerializeReportSnafu {
            stage: "serialize-view",
        })?);
        Ok(lines)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportTail<'a> {
    view: Option<&'a BubbleView>,
    elapsed_ms: u64,
}

pub fn load_config(path: Option<&Path>) -> ReplayResult<BubbleConfig> {
    let result = match path {
        Some(path) => BubbleConfig::load_file(path),
        None => BubbleConfig::load(&BubbleConfig::default_config_path()),
    };
    result.context(ConfigSnafu {
        stage: "load-bubble-config",
    })
}

pub fn replay(
    scenario: Scenario,
    config: BubbleConfig,
    options: ReplayOptions,
) -> ReplayResult<ReplayReport> {
    if let Err(error) = scenario.message.validate() {
        if options.strict {
            return Err(error).context(InvalidSnapshotSnafu {
                stage: "validate-scenario-snapshot",
            });
        }
        tracing::warn!("replaying inconsistent snapshot: {}", error);
    }

    let mut simulation = Simulation::new(
        scenario.message,
        config,
        scenario.handlers.react,
        scenario.handlers.reply,
    );
    if scenario.reflect_reactions {
        simulation = simulation.reflecting_reactions();
    }
    if let Some(bounds) = scenario.bounds {
        simulation.send(bubble_engine::BubbleEvent::Layout { bounds });
    }

    tracing::info!(events = scenario.events.len(), "replaying scenario");
    simulation.run(&scenario.events);
    if options.settle {
        simulation.settle();
    }

    Ok(ReplayReport {
        intents: simulation.intents(),
        view: simulation.view(),
        elapsed_ms: simulation.elapsed().as_millis() as u64,
    })
}

fn default_reflect_reactions() -> bool {
    true
}
