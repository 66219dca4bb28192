//! The `scrape` command: one aggregation run written to the JSON sinks.

use std::io::Write;
use std::path::Path;

use eventflow_scrapers::{AggregateReport, Aggregator};
use tracing::{error, info};

use crate::cli::{ExportFormat, ScrapeArgs};
use crate::config::EventflowConfig;
use crate::error::{CliError, CliResult};
use crate::export;

/// Runs every selected source and writes the merged events.
pub async fn run(config: &EventflowConfig, args: &ScrapeArgs) -> CliResult<()> {
    let mut sources = config.sources.clone();
    if args.no_details {
        sources.fetch_details = false;
    }

    let mut aggregator = Aggregator::from_config(&sources, &config.http, &args.only)?;
    info!(sources = ?aggregator.sources(), "starting scrape");
    let report = aggregator.run().await;

    let pretty = config.output.pretty;
    let body = export::render(&report.events, args.format, pretty)?;
    write_output(args.output.as_deref().or(config.output.path.as_deref()), &body)?;

    if let Some(dir) = args.split_dir.as_deref().or(config.output.split_dir.as_deref()) {
        write_split(dir, &report, args.format, pretty)?;
    }

    if args.strict {
        check_strict(&report)?;
    }
    Ok(())
}

/// Fails when any source that ran produced nothing.
pub fn check_strict(report: &AggregateReport) -> CliResult<()> {
    let empty = report.empty_sources();
    if empty.is_empty() {
        return Ok(());
    }
    error!(sources = ?empty, "sources produced no events");
    Err(CliError::EmptySources(empty))
}

/// Writes `body` to `path`, or stdout when no path is given.
pub fn write_output(path: Option<&Path>, body: &str) -> CliResult<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, format!("{body}\n"))?;
            info!(path = %path.display(), "events written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{body}")?;
        }
    }
    Ok(())
}

/// Writes one `<source>.json` per source into `dir`.
pub fn write_split(
    dir: &Path,
    report: &AggregateReport,
    format: ExportFormat,
    pretty: bool,
) -> CliResult<()> {
    std::fs::create_dir_all(dir)?;
    for summary in &report.sources {
        let events = report.events_from(summary.source);
        let body = export::render(&events, format, pretty)?;
        write_output(Some(&dir.join(format!("{}.json", summary.source))), &body)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use eventflow_core::{Event, EventMap, EventSpan};
    use eventflow_scrapers::{SourceKind, SourceSummary};

    fn report() -> AggregateReport {
        let untimed = |summary: &str, link: &str| Event::new(summary, link, EventSpan::Unknown);
        let mut events = EventMap::new();
        events.insert(0, untimed("Comedy Night", "https://a.example.com/e/1"));
        events.insert(1, untimed("Jazz Night", "https://c.example.edu/e/2"));
        events.insert(2, untimed("Lecture", "https://c.example.edu/e/3"));
        AggregateReport {
            events,
            sources: vec![
                SourceSummary {
                    source: SourceKind::Arena,
                    ids: vec![0],
                    elapsed: Duration::from_millis(5),
                },
                SourceSummary {
                    source: SourceKind::Athletics,
                    ids: vec![],
                    elapsed: Duration::from_millis(1),
                },
                SourceSummary {
                    source: SourceKind::General,
                    ids: vec![1, 2],
                    elapsed: Duration::from_millis(9),
                },
            ],
        }
    }

    #[test]
    fn writes_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/events.json");
        write_output(Some(&path), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn split_files_per_source() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), &report(), ExportFormat::Raw, false).unwrap();

        let general: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("general.json")).unwrap())
                .unwrap();
        assert_eq!(general.as_object().unwrap().len(), 2);
        assert_eq!(general["2"]["summary"], "Lecture");

        let athletics = std::fs::read_to_string(dir.path().join("athletics.json")).unwrap();
        assert_eq!(athletics.trim(), "{}");
        assert!(dir.path().join("arena.json").exists());
    }

    #[test]
    fn strict_mode_names_empty_sources() {
        let err = check_strict(&report()).unwrap_err();
        assert!(matches!(&err, CliError::EmptySources(s) if s == &[SourceKind::Athletics]));
        assert_eq!(err.exit_code(), 2);

        let mut full = report();
        full.sources.remove(1);
        assert!(check_strict(&full).is_ok());
    }
}
