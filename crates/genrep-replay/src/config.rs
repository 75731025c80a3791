//! Recorder configuration.
//!
//! [`RecorderConfig`] carries everything the recorder needs from the host
//! that is not a per-frame collaborator: where replays live, the checksum
//! cadence, the identity of the running build, and how loudly to report
//! consistency mismatches.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::ReplayHeader;

/// Errors returned by [`RecorderConfig::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The checksum interval must be at least one frame.
    #[error("crc_interval must be greater than zero")]
    ZeroCrcInterval,
    /// A required name is empty.
    #[error("{field} must not be empty")]
    EmptyName {
        /// The offending field.
        field: &'static str,
    },
    /// A file or directory name contains a path separator.
    #[error("{field} '{value}' must be a plain name, not a path")]
    NotAPlainName {
        /// The offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// How a detected consistency mismatch is reported.
///
/// A mismatch is never fatal; the severity only picks the log level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MismatchSeverity {
    /// Record the mismatch without logging.
    Silent,
    /// Log at `warn`.
    #[default]
    Warn,
    /// Log at `error`.
    Error,
}

/// Identity of the running build, stamped into every recording.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildInfo {
    /// Human-readable version string.
    pub version_string: String,
    /// Build-time string.
    pub build_time: String,
    /// Numeric version.
    pub version_number: u32,
    /// Checksum of the executable.
    pub exe_checksum: u32,
    /// Checksum of the data files.
    pub data_checksum: u32,
}

/// One way a recording's build differs from the running build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionDifference {
    /// Version strings differ.
    VersionString {
        /// Value stored in the replay.
        recorded: String,
        /// Value of the running build.
        running: String,
    },
    /// Build-time strings differ.
    BuildTime {
        /// Value stored in the replay.
        recorded: String,
        /// Value of the running build.
        running: String,
    },
    /// Numeric versions differ.
    VersionNumber {
        /// Value stored in the replay.
        recorded: u32,
        /// Value of the running build.
        running: u32,
    },
    /// Executable checksums differ.
    ExeChecksum {
        /// Value stored in the replay.
        recorded: u32,
        /// Value of the running build.
        running: u32,
    },
    /// Data checksums differ.
    DataChecksum {
        /// Value stored in the replay.
        recorded: u32,
        /// Value of the running build.
        running: u32,
    },
}

impl fmt::Display for VersionDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionString { recorded, running } => {
                write!(f, "version string '{recorded}' != '{running}'")
            }
            Self::BuildTime { recorded, running } => {
                write!(f, "build time '{recorded}' != '{running}'")
            }
            Self::VersionNumber { recorded, running } => {
                write!(f, "version number {recorded:#x} != {running:#x}")
            }
            Self::ExeChecksum { recorded, running } => {
                write!(f, "exe checksum {recorded:#010x} != {running:#010x}")
            }
            Self::DataChecksum { recorded, running } => {
                write!(f, "data checksum {recorded:#010x} != {running:#010x}")
            }
        }
    }
}

impl BuildInfo {
    /// Every field in which `header` was recorded by a different build.
    pub fn differences(&self, header: &ReplayHeader) -> Vec<VersionDifference> {
        let mut diffs = Vec::new();
        if header.version_string != self.version_string {
            diffs.push(VersionDifference::VersionString {
                recorded: header.version_string.clone(),
                running: self.version_string.clone(),
            });
        }
        if header.build_time != self.build_time {
            diffs.push(VersionDifference::BuildTime {
                recorded: header.build_time.clone(),
                running: self.build_time.clone(),
            });
        }
        if header.version_number != self.version_number {
            diffs.push(VersionDifference::VersionNumber {
                recorded: header.version_number,
                running: self.version_number,
            });
        }
        if header.exe_checksum != self.exe_checksum {
            diffs.push(VersionDifference::ExeChecksum {
                recorded: header.exe_checksum,
                running: self.exe_checksum,
            });
        }
        if header.data_checksum != self.data_checksum {
            diffs.push(VersionDifference::DataChecksum {
                recorded: header.data_checksum,
                running: self.data_checksum,
            });
        }
        diffs
    }
}

/// Configuration for a [`Recorder`](crate::Recorder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Root of the user's data directory.
    pub user_data_dir: PathBuf,
    /// Name of the replay directory under `user_data_dir`.
    pub replay_dir_name: String,
    /// Extension of replay files, without the dot.
    pub replay_extension: String,
    /// File stem of the recording that is overwritten every session.
    pub last_replay_stem: String,
    /// Display name stored in new recordings.
    pub last_replay_display_name: String,
    /// Frames between checksum samples.
    pub crc_interval: u32,
    /// Identity of the running build.
    pub build: BuildInfo,
    /// How consistency mismatches are reported.
    pub crc_mismatch_severity: MismatchSeverity,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let user_data_dir = dirs_next::data_dir()
            .map(|dir| dir.join("genrep"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            user_data_dir,
            replay_dir_name: "Replays".into(),
            replay_extension: "rep".into(),
            last_replay_stem: "00000000".into(),
            last_replay_display_name: "Last Replay".into(),
            crc_interval: 100,
            build: BuildInfo::default(),
            crc_mismatch_severity: MismatchSeverity::default(),
        }
    }
}

impl RecorderConfig {
    /// A default configuration rooted at `user_data_dir`.
    pub fn with_user_data_dir(user_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_data_dir: user_data_dir.into(),
            ..Self::default()
        }
    }

    /// Check the configuration for values the recorder cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crc_interval == 0 {
            return Err(ConfigError::ZeroCrcInterval);
        }
        for (field, value) in [
            ("replay_dir_name", &self.replay_dir_name),
            ("replay_extension", &self.replay_extension),
            ("last_replay_stem", &self.last_replay_stem),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyName { field });
            }
            if value.contains(['/', '\\']) || value == ".." {
                return Err(ConfigError::NotAPlainName {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Directory holding replay files.
    pub fn replay_dir(&self) -> PathBuf {
        self.user_data_dir.join(&self.replay_dir_name)
    }

    /// File name of the recording overwritten every session, e.g. `00000000.rep`.
    pub fn last_replay_file_name(&self) -> String {
        format!("{}.{}", self.last_replay_stem, self.replay_extension)
    }

    /// Full path of the recording overwritten every session.
    pub fn last_replay_path(&self) -> PathBuf {
        self.replay_dir().join(self.last_replay_file_name())
    }
}
