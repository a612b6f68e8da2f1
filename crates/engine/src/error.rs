use std::path::PathBuf;

use snafu::Snafu;

use crate::message::MessageId;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to extract bubble config on `{stage}`: {source}"))]
    Extract {
        stage: &'static str,
        #[snafu(source(from(figment::Error, Box::new)))]
        source: Box<figment::Error>,
    },
    #[snafu(display("bubble config file {path:?} does not exist"))]
    MissingFile { stage: &'static str, path: PathBuf },
    #[snafu(display("invalid bubble config parameter `{parameter}`: {details}"))]
    InvalidParameter {
        stage: &'static str,
        parameter: &'static str,
        details: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SnapshotError {
    #[snafu(display("message '{message_id}' lists reaction '{emoji}' more than once"))]
    DuplicateReaction {
        stage: &'static str,
        message_id: MessageId,
        emoji: String,
    },
    #[snafu(display("message '{message_id}' marks reaction '{emoji}' as reacted with a zero count"))]
    InconsistentReaction {
        stage: &'static str,
        message_id: MessageId,
        emoji: String,
    },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
