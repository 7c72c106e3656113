mod bootstrap;
mod text_report;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use fleet_core::report::sort_by_decision;
use fleet_core::settings::Settings;
use fleet_data::analysis::run_evaluation;
use fleet_data::export::{export_records, ExportFormat};
use fleet_runtime::orchestrator::WatchOrchestrator;
use fleet_ui::app::{App, ViewMode};

/// What to do after loading settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Table,
    Watch,
    Report,
}

impl FromStr for View {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(View::Table),
            "watch" => Ok(View::Watch),
            "report" => Ok(View::Report),
            unknown => anyhow::bail!("Unknown view mode: {}", unknown),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    let view: View = settings.view.parse()?;

    let tui_active = settings.export.is_none() && view != View::Report;
    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref(), tui_active)?;

    tracing::info!("fleet-eval v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("View: {}, Theme: {}", settings.view, settings.theme);

    let input_dir = settings.input_dir();
    let thresholds = settings.thresholds()?;
    let filter = settings.report_filter()?;
    let export_format: ExportFormat = settings.export_format.parse()?;

    // One-shot export: no TUI.
    if let Some(path) = &settings.export {
        let report = run_evaluation(&input_dir, &thresholds)?;
        let mut records = filter.apply(&report.records);
        sort_by_decision(&mut records);
        let written = export_records(records, path, export_format)?;
        println!("Exported {} records to {}", written, path.display());
        return Ok(());
    }

    let export_path = PathBuf::from(format!("fleet-evaluation.{}", export_format));

    match view {
        View::Table => {
            let report = run_evaluation(&input_dir, &thresholds)?;
            let app = App::new(
                &settings.theme,
                ViewMode::Table,
                &input_dir,
                filter,
                export_path,
                export_format,
            );
            app.run_table(report).await?;
        }

        View::Watch => {
            tracing::info!("Watching {}", input_dir.display());

            let orchestrator = WatchOrchestrator::new(
                u64::from(settings.refresh_rate),
                input_dir.clone(),
                thresholds,
            );
            let (rx, handle) = orchestrator.start();

            let app = App::new(
                &settings.theme,
                ViewMode::Watch,
                &input_dir,
                filter,
                export_path,
                export_format,
            );

            // Ctrl+C is also caught at the OS level in case it arrives while
            // the terminal is not in raw mode.
            tokio::select! {
                result = app.run_watch(rx) => {
                    handle.abort();
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; stopping watch task");
                    handle.abort();
                }
            }
        }

        View::Report => {
            let report = run_evaluation(&input_dir, &thresholds)?;
            let mut records = filter.apply(&report.records);
            sort_by_decision(&mut records);
            print!("{}", text_report::render(&records, &report.metadata, &filter));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_parses_known_modes() {
        assert_eq!("table".parse::<View>().unwrap(), View::Table);
        assert_eq!("watch".parse::<View>().unwrap(), View::Watch);
        assert_eq!("report".parse::<View>().unwrap(), View::Report);
    }

    #[test]
    fn test_unknown_view_is_an_error() {
        let err = "pie".parse::<View>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown view mode: pie");
    }
}
