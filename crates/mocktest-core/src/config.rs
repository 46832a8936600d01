//! mocktest configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Marks, DEFAULT_MARKS_CORRECT, DEFAULT_MARKS_WRONG};

/// Top-level mocktest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MocktestConfig {
    /// Marks for a correct answer on imported or added questions.
    #[serde(default = "default_marks_correct")]
    pub marks_correct: f64,
    /// Marks for a wrong answer on imported or added questions.
    #[serde(default = "default_marks_wrong")]
    pub marks_wrong: f64,
    /// Wall-clock period of one tick. Every tick is counted as one second,
    /// so anything other than 1000 only speeds up demos and tests.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Bank used by `take` when none is given on the command line.
    #[serde(default)]
    pub default_bank: Option<PathBuf>,
    /// Where attempt reports are written.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

fn default_marks_correct() -> f64 {
    DEFAULT_MARKS_CORRECT
}
fn default_marks_wrong() -> f64 {
    DEFAULT_MARKS_WRONG
}
fn default_tick_interval() -> u64 {
    1000
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("./mocktest-results")
}

impl Default for MocktestConfig {
    fn default() -> Self {
        Self {
            marks_correct: default_marks_correct(),
            marks_wrong: default_marks_wrong(),
            tick_interval_ms: default_tick_interval(),
            default_bank: None,
            report_dir: default_report_dir(),
        }
    }
}

impl MocktestConfig {
    /// The marking scheme this configuration describes.
    pub fn marks(&self) -> Marks {
        Marks {
            correct: self.marks_correct,
            wrong: self.marks_wrong,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject values the rest of the system cannot work with.
    pub fn ensure_valid(&self) -> Result<()> {
        anyhow::ensure!(
            self.marks_correct.is_finite() && self.marks_wrong.is_finite(),
            "marks must be finite numbers"
        );
        anyhow::ensure!(self.tick_interval_ms > 0, "tick_interval_ms must be positive");
        Ok(())
    }

    /// Apply `MOCKTEST_MARKS_CORRECT` / `MOCKTEST_MARKS_WRONG` style
    /// overrides. Unparsable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (var, slot) in [
            ("MOCKTEST_MARKS_CORRECT", &mut self.marks_correct),
            ("MOCKTEST_MARKS_WRONG", &mut self.marks_wrong),
        ] {
            if let Some(raw) = lookup(var) {
                match raw.trim().parse::<f64>() {
                    Ok(v) => *slot = v,
                    Err(_) => tracing::warn!("ignoring {var}={raw:?}: not a number"),
                }
            }
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `mocktest.toml` in the current directory
/// 2. `~/.config/mocktest/config.toml`
///
/// Environment variable overrides: `MOCKTEST_MARKS_CORRECT`, `MOCKTEST_MARKS_WRONG`.
pub fn load_config() -> Result<MocktestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MocktestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("mocktest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<MocktestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => MocktestConfig::default(),
    };

    config.apply_overrides(|var| std::env::var(var).ok());
    config.ensure_valid()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mocktest"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MocktestConfig::default();
        assert_eq!(config.marks(), Marks::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.default_bank.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let config: MocktestConfig = toml::from_str(
            r#"
marks_correct = 4.0
default_bank = "banks/physics.json"
"#,
        )
        .unwrap();
        assert_eq!(config.marks_correct, 4.0);
        assert_eq!(config.marks_wrong, DEFAULT_MARKS_WRONG);
        assert_eq!(config.default_bank, Some(PathBuf::from("banks/physics.json")));
    }

    #[test]
    fn overrides() {
        let mut config = MocktestConfig::default();
        config.apply_overrides(|var| match var {
            "MOCKTEST_MARKS_CORRECT" => Some("3".into()),
            "MOCKTEST_MARKS_WRONG" => Some("lots".into()),
            _ => None,
        });
        assert_eq!(config.marks_correct, 3.0);
        assert_eq!(config.marks_wrong, DEFAULT_MARKS_WRONG);
    }

    #[test]
    fn zero_tick_interval_is_invalid() {
        let config = MocktestConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.ensure_valid().is_err());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mocktest.toml");
        std::fs::write(&path, "marks_wrong = -1.0\ntick_interval_ms = 250\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
    }

    #[test]
    fn missing_explicit_path_fails() {
        let err = load_config_from(Some(Path::new("definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
