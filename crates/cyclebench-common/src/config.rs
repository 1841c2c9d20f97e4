//! Configuration structures for the benchmark.
//!
//! Supports TOML deserialization with sensible defaults; the CLI's
//! positional arguments always override the `[run]` section.

use crate::error::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level benchmark configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BenchConfig {
    /// Measurement run parameters.
    pub run: RunConfig,

    /// Real-time scheduling configuration.
    pub realtime: RealtimeConfig,

    /// Report output configuration.
    pub output: OutputConfig,
}

/// Measurement run parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Nominal period between samples.
    #[serde(with = "humantime_serde")]
    pub period: Duration,

    /// Total number of sampling cycles.
    pub cycles: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10),
            cycles: 1000,
        }
    }
}

impl RunConfig {
    /// The nominal period as integer nanoseconds, saturating on the
    /// (rejected by `validate`) case of a period that exceeds `u64`.
    #[must_use]
    pub fn period_ns(&self) -> u64 {
        u64::try_from(self.period.as_nanos()).unwrap_or(u64::MAX)
    }

    /// Check that the run parameters describe a measurable run.
    ///
    /// # Errors
    ///
    /// Returns `BenchError::Config` for a zero period, a period that does
    /// not fit in 64-bit nanoseconds, or a zero cycle count. Invalid values
    /// are never clamped.
    pub fn validate(&self) -> BenchResult<()> {
        if self.period.is_zero() {
            return Err(BenchError::Config("period must be positive".into()));
        }
        if u64::try_from(self.period.as_nanos()).is_err() {
            return Err(BenchError::Config(format!(
                "period {:?} exceeds the 64-bit nanosecond range",
                self.period
            )));
        }
        if self.cycles == 0 {
            return Err(BenchError::Config("cycle count must be at least 1".into()));
        }
        Ok(())
    }
}

/// Real-time scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Enable real-time setup (requires privileges).
    pub enabled: bool,

    /// Scheduler policy: "fifo", "rr" (round-robin), or "other".
    pub policy: SchedPolicy,

    /// Scheduler priority (1-99 for RT policies).
    pub priority: u8,

    /// CPU the measurement thread is pinned to, if any.
    pub cpu_affinity: Option<usize>,

    /// Lock all memory pages (mlockall).
    pub lock_memory: bool,

    /// Pre-fault stack size in bytes.
    pub prefault_stack_size: usize,

    /// Treat privilege failures (EPERM) as fatal instead of downgrading
    /// to warnings.
    pub strict: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: SchedPolicy::Rr,
            priority: 49,
            cpu_affinity: Some(0),
            lock_memory: true,
            prefault_stack_size: 128 * 1024,
            strict: false,
        }
    }
}

impl RealtimeConfig {
    /// Check that the scheduling parameters are coherent.
    ///
    /// # Errors
    ///
    /// Returns `BenchError::Config` if an RT policy is combined with a
    /// priority outside 1-99.
    pub fn validate(&self) -> BenchResult<()> {
        if self.enabled
            && self.policy != SchedPolicy::Other
            && !(1..=99).contains(&self.priority)
        {
            return Err(BenchError::Config(format!(
                "priority {} out of range 1-99 for policy {:?}",
                self.priority, self.policy
            )));
        }
        Ok(())
    }
}

/// Scheduler policy for the measurement thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchedPolicy {
    /// SCHED_FIFO: first-in-first-out real-time.
    Fifo,
    /// SCHED_RR: round-robin real-time.
    #[default]
    Rr,
    /// SCHED_OTHER: normal time-sharing (non-RT).
    Other,
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File the report is duplicated to, in addition to stdout.
    pub timestamp_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timestamp_file: Some(PathBuf::from("timestamps.txt")),
        }
    }
}

impl BenchConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns the first `BenchError::Config` found.
    pub fn validate(&self) -> BenchResult<()> {
        self.run.validate()?;
        self.realtime.validate()
    }
}

/// Configuration-file errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` in humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
