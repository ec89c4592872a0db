//! Load command - Stream newline-delimited JSON records into a table
//!
//! Each non-blank line must be a JSON object with an `OriginEntityCode`
//! key. Records are buffered by the connector and flushed on the configured
//! threshold and sync interval; a final flush runs once the input is
//! exhausted.
//!
//! # Usage
//!
//! ```bash
//! snowflake-export load Orders orders.ndjson
//! tail -f orders.ndjson | snowflake-export load Orders -
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use snowflake_export::{Config, Record, SyncScheduler};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::Target;

/// Load command arguments
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Table name
    pub name: String,

    /// Input file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,
}

pub async fn run(target: &Target, config: &Config, args: LoadArgs) -> Result<()> {
    let reader = open(&args.input).await?;

    let (scheduler, handle) = SyncScheduler::new(
        Arc::clone(&target.connector),
        config.connector.sync_interval(),
    );
    let task = tokio::spawn(scheduler.run());

    // Whatever was buffered before a bad line is still flushed below
    let stored = store_all(target, &args.name, reader).await;

    let report = handle.flush().await?;
    handle.shutdown()?;
    let metrics = task.await.context("sync scheduler panicked")?;
    let stored = stored?;

    let retained = target.connector.count().await;
    info!(
        container = %args.name,
        stored,
        flushed = metrics.records_flushed,
        flush_errors = metrics.flush_errors,
        dropped = metrics.records_dropped,
        retained,
        "load finished"
    );
    println!(
        "loaded {} records into {} ({} flushed in {} flushes)",
        stored, args.name, metrics.records_flushed, metrics.flush_count
    );

    if retained > 0 {
        bail!(
            "{} records could not be written ({} partitions failed on the last flush)",
            retained,
            report.partitions_failed
        );
    }
    Ok(())
}

async fn open(input: &Path) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if input == Path::new("-") {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("failed to open {}", input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Store every record from `reader`, returning how many were buffered
async fn store_all<R>(target: &Target, container: &str, reader: R) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let ctx = target.context();
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut stored = 0;

    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        line_no += 1;
        let Some(record) = parse_line(line_no, &line)? else {
            continue;
        };
        target
            .connector
            .store_data(&ctx, target.connection_id, container, record)
            .await
            .with_context(|| format!("line {}: failed to buffer record", line_no))?;
        stored += 1;
    }

    debug!(lines = line_no, stored, "input exhausted");
    Ok(stored)
}

/// Parse one input line; blank lines yield `None`
fn parse_line(line_no: usize, line: &str) -> Result<Option<Record>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_str(line).with_context(|| format!("line {}: invalid JSON", line_no))?;
    let record = Record::from_json(value).with_context(|| format!("line {}", line_no))?;
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use snowflake_export::Value;

    use super::*;

    #[test]
    fn test_parse_object_keeps_key_order() {
        let record = parse_line(1, r#"{"OriginEntityCode":"/O#1","Name":"Ada","Total":12}"#)
            .unwrap()
            .unwrap();

        let columns: Vec<_> = record.columns().collect();
        assert_eq!(columns, ["OriginEntityCode", "Name", "Total"]);
        assert_eq!(record.get("Total"), Some(&Value::Integer(12)));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert!(parse_line(1, "").unwrap().is_none());
        assert!(parse_line(2, "   \t").unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_names_the_line() {
        let err = parse_line(7, "{not json").unwrap_err();
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = parse_line(3, "[1, 2]").unwrap_err();
        assert!(format!("{:#}", err).contains("expected a JSON object"));
    }

    #[tokio::test]
    async fn test_open_reads_file_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"OriginEntityCode":"/O#1"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"OriginEntityCode":"/O#2"}}"#).unwrap();

        let mut lines = open(file.path()).await.unwrap().lines();
        let mut records = Vec::new();
        let mut line_no = 0;
        while let Some(line) = lines.next_line().await.unwrap() {
            line_no += 1;
            records.extend(parse_line(line_no, &line).unwrap());
        }

        assert_eq!(line_no, 3);
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = open(Path::new("/nonexistent/orders.ndjson")).await.err().unwrap();
        assert!(err.to_string().contains("failed to open"));
    }
}
