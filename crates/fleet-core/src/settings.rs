use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classifier::Thresholds;
use crate::error::Result;
use crate::report::ReportFilter;

/// Accepted `--view` values.
pub const VIEWS: [&str; 3] = ["table", "watch", "report"];

/// Accepted `--theme` values.
pub const THEMES: [&str; 4] = ["light", "dark", "classic", "auto"];

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Recommend KEEP / SELL / INSPECT for every truck in the fleet
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fleet-eval",
    about = "Recommend KEEP / SELL / INSPECT for every truck in the fleet",
    version
)]
pub struct Settings {
    /// Directory containing the CSV or xlsx exports
    #[arg(long, env = "FLEET_EVAL_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// View mode
    #[arg(long, default_value = "table", value_parser = VIEWS)]
    pub view: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = THEMES)]
    pub theme: String,

    /// Only show these decisions (KEEP, SELL, INSPECT)
    #[arg(long, value_delimiter = ',')]
    pub decision: Vec<String>,

    /// Only show these ownership classes (owned, leased, unknown)
    #[arg(long, value_delimiter = ',')]
    pub ownership: Vec<String>,

    /// Only show units whose identifier matches this regex
    #[arg(long)]
    pub unit_pattern: Option<String>,

    /// Write the filtered records to this file and exit
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json", "xlsx"])]
    pub export_format: String,

    /// JSON file overriding the decision thresholds
    #[arg(long)]
    pub rules_file: Option<PathBuf>,

    /// Seconds between input checks in watch mode (1-300)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=300))]
    pub refresh_rate: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Parameters remembered between runs in `~/.fleet-eval/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,
}

impl LastUsedParams {
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".fleet-eval").join("last_used.json")
    }

    /// Load from `path`; a missing or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Write to `path` via a temp file and rename.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)
    }

    pub fn clear_at(path: &Path) -> std::io::Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, fill gaps from the last-used file and
    /// persist the result for next time.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(path = %config_path.display(), error = %e, "could not clear saved settings");
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI (or env) always wins over the remembered value.
        if !is_arg_explicitly_set(&matches, "input_dir") && settings.input_dir.is_none() {
            settings.input_dir = last.input_dir;
        }
        // Remembered values bypass clap, so they are checked against the
        // same choices here.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                if VIEWS.contains(&v.as_str()) {
                    settings.view = v;
                } else {
                    tracing::warn!(view = %v, "ignoring unknown saved view");
                }
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                if THEMES.contains(&v.as_str()) {
                    settings.theme = v;
                } else {
                    tracing::warn!(theme = %v, "ignoring unknown saved theme");
                }
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate.filter(|v| (1..=300).contains(v)) {
                settings.refresh_rate = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "rules_file") && settings.rules_file.is_none() {
            settings.rules_file = last.rules_file;
        }

        settings = settings.apply_debug();

        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!(path = %config_path.display(), error = %e, "could not save settings");
        }

        settings
    }

    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Input directory, defaulting to the working directory.
    pub fn input_dir(&self) -> PathBuf {
        self.input_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Thresholds from `--rules-file`, or the defaults.
    pub fn thresholds(&self) -> Result<Thresholds> {
        match &self.rules_file {
            Some(path) => Thresholds::load_from(path),
            None => Ok(Thresholds::default()),
        }
    }

    /// Filter assembled from `--decision`, `--ownership` and `--unit-pattern`.
    pub fn report_filter(&self) -> Result<ReportFilter> {
        ReportFilter::from_labels(
            &self.decision,
            &self.ownership,
            self.unit_pattern.as_deref(),
        )
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            input_dir: s.input_dir.clone(),
            view: Some(s.view.clone()),
            theme: Some(s.theme.clone()),
            refresh_rate: Some(s.refresh_rate),
            rules_file: s.rules_file.clone(),
        }
    }
}

/// `true` when `name` came from the command line or the environment rather
/// than a default.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;
    use crate::report::OwnershipFilter;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            input_dir: Some(PathBuf::from("/srv/exports")),
            view: Some("report".to_string()),
            theme: Some("dark".to_string()),
            refresh_rate: Some(30),
            rules_file: Some(PathBuf::from("/srv/rules.json")),
        };
        params.save_to(&path).expect("save");
        assert_eq!(LastUsedParams::load_from(&path), params);
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("light".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["fleet-eval"]);
        assert_eq!(settings.view, "table");
        assert_eq!(settings.theme, "auto");
        assert!(settings.decision.is_empty());
        assert!(settings.ownership.is_empty());
        assert!(settings.unit_pattern.is_none());
        assert!(settings.export.is_none());
        assert_eq!(settings.export_format, "csv");
        assert_eq!(settings.refresh_rate, 10);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_decision_list_is_comma_separated() {
        let settings = Settings::parse_from(["fleet-eval", "--decision", "KEEP,SELL"]);
        assert_eq!(settings.decision, vec!["KEEP", "SELL"]);
    }

    #[test]
    fn test_settings_rejects_unknown_view() {
        let result = Settings::try_parse_from(["fleet-eval", "--view", "pie"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_refresh_rate_range() {
        assert!(Settings::try_parse_from(["fleet-eval", "--refresh-rate", "0"]).is_err());
        assert!(Settings::try_parse_from(["fleet-eval", "--refresh-rate", "301"]).is_err());
    }

    #[test]
    fn test_report_filter_from_settings() {
        let settings = Settings::parse_from([
            "fleet-eval",
            "--decision",
            "sell",
            "--ownership",
            "owned,unknown",
        ]);
        let filter = settings.report_filter().expect("filter");
        assert_eq!(filter.decisions.len(), 1);
        assert!(filter.decisions.contains(&Decision::Sell));
        assert!(filter.ownership.contains(&OwnershipFilter::Unknown));
        assert!(!filter.ownership.contains(&OwnershipFilter::LeasedFinanced));
    }

    #[test]
    fn test_thresholds_default_without_rules_file() {
        let settings = Settings::parse_from(["fleet-eval"]);
        assert_eq!(settings.thresholds().unwrap(), Thresholds::default());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            input_dir: Some(PathBuf::from("/srv/exports")),
            theme: Some("dark".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(vec!["fleet-eval".into()], &config_path);
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.input_dir(), PathBuf::from("/srv/exports"));
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            view: Some("watch".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec![
                "fleet-eval".into(),
                "--theme".into(),
                "light".into(),
                "--view".into(),
                "report".into(),
            ],
            &config_path,
        );
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.view, "report");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("classic".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["fleet-eval".into(), "--clear".into()],
            &config_path,
        );
        assert!(!config_path.exists());
        assert_eq!(settings.theme, "auto");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            vec!["fleet-eval".into(), "--debug".into()],
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        Settings::load_with_last_used_impl(
            vec!["fleet-eval".into(), "--theme".into(), "classic".into()],
            &config_path,
        );
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.theme, Some("classic".to_string()));
        assert_eq!(loaded.view, Some("table".to_string()));
    }

    #[test]
    fn test_load_with_last_used_ignores_invalid_saved_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config_path,
            r#"{"view": "pie", "theme": "neon", "refresh_rate": 0}"#,
        )
        .unwrap();

        let settings = Settings::load_with_last_used_impl(vec!["fleet-eval".into()], &config_path);
        assert_eq!(settings.view, "table");
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.refresh_rate, 10);

        // The next save replaces the bad values.
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.view, Some("table".to_string()));
    }

    #[test]
    fn test_load_with_last_used_survives_unwritable_config() {
        let tmp = TempDir::new().expect("tempdir");
        // The config directory is a regular file, so saving cannot succeed.
        let blocker = tmp.path().join(".fleet-eval");
        std::fs::write(&blocker, "not a directory").unwrap();
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["fleet-eval".into(), "--theme".into(), "dark".into()],
            &config_path,
        );
        assert_eq!(settings.theme, "dark");
        assert!(!config_path.exists());
        assert!(LastUsedParams::from(&settings).save_to(&config_path).is_err());
    }

    #[test]
    fn test_clear_survives_unremovable_config() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        // A directory where the file should be cannot be removed as a file.
        std::fs::create_dir_all(&config_path).unwrap();

        let settings = Settings::load_with_last_used_impl(
            vec!["fleet-eval".into(), "--clear".into()],
            &config_path,
        );
        assert!(settings.clear);
        assert!(config_path.is_dir());
    }

    #[test]
    fn test_settings_accepts_xlsx_export_format() {
        let settings = Settings::parse_from(["fleet-eval", "--export-format", "xlsx"]);
        assert_eq!(settings.export_format, "xlsx");
        assert!(Settings::try_parse_from(["fleet-eval", "--export-format", "xls"]).is_err());
    }
}
