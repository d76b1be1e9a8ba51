//! CSV write/parse adapter
//!
//! Writes `id,label,value` rows through buffered `tokio::io` streams and parses
//! them back line by line. Formatting and parsing run on the scheduler, so both
//! directions yield every [`YIELD_EVERY_ROWS`] rows to keep the heartbeat fed.

use super::{timed, Adapter, AdapterFuture, ScratchDir};
use crate::domain::{AdapterError, TaskKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

const PROBE_ROWS: usize = 16;
const BULK_ROWS: usize = 50_000;
const YIELD_EVERY_ROWS: usize = 256;
const HEADER: &str = "id,label,value";

pub struct CsvAsync {
    scratch: Arc<ScratchDir>,
}

impl CsvAsync {
    #[must_use]
    pub fn new(scratch: Arc<ScratchDir>) -> Self {
        Self { scratch }
    }
}

#[derive(Debug, PartialEq)]
struct Row {
    id: usize,
    label: String,
    value: f64,
}

fn parse_row(line: &str) -> Result<Row, AdapterError> {
    let corrupt = || AdapterError::Corrupt(format!("malformed row: {line}"));

    let mut fields = line.split(',');
    let id = fields.next().and_then(|f| f.parse().ok()).ok_or_else(corrupt)?;
    let label = fields.next().ok_or_else(corrupt)?.to_string();
    let value = fields.next().and_then(|f| f.parse().ok()).ok_or_else(corrupt)?;
    if fields.next().is_some() {
        return Err(corrupt());
    }
    Ok(Row { id, label, value })
}

async fn write_rows(path: &Path, rows: usize) -> Result<(), AdapterError> {
    let mut writer = BufWriter::new(tokio::fs::File::create(path).await?);
    writer.write_all(HEADER.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    for id in 0..rows {
        let line = format!("{id},row-{id},{}.5\n", id % 1000);
        writer.write_all(line.as_bytes()).await?;
        if (id + 1) % YIELD_EVERY_ROWS == 0 {
            tokio::task::yield_now().await;
        }
    }
    writer.flush().await?;
    Ok(())
}

async fn read_rows(path: &Path) -> Result<usize, AdapterError> {
    let reader = BufReader::new(tokio::fs::File::open(path).await?);
    let mut lines = reader.lines();

    match lines.next_line().await? {
        Some(header) if header == HEADER => {}
        other => return Err(AdapterError::Corrupt(format!("unexpected header: {other:?}"))),
    }

    let mut parsed = 0;
    while let Some(line) = lines.next_line().await? {
        let row = parse_row(&line)?;
        if row.id != parsed {
            return Err(AdapterError::Corrupt(format!("row {} out of order", row.id)));
        }
        parsed += 1;
        if parsed % YIELD_EVERY_ROWS == 0 {
            tokio::task::yield_now().await;
        }
    }
    Ok(parsed)
}

async fn round_trip(path: PathBuf, rows: usize) -> Result<(), AdapterError> {
    write_rows(&path, rows).await?;
    let parsed = read_rows(&path).await?;
    if parsed != rows {
        return Err(AdapterError::Corrupt(format!("wrote {rows} rows, parsed {parsed}")));
    }
    Ok(())
}

impl Adapter for CsvAsync {
    fn name(&self) -> &'static str {
        "csv-async"
    }

    fn description(&self) -> &'static str {
        "CSV rows written and parsed through buffered tokio::io streams"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        let rows = match kind {
            TaskKind::Probe => PROBE_ROWS,
            TaskKind::Blocking => BULK_ROWS,
        };
        Box::pin(timed(self.scratch.with_file("csv", move |path| round_trip(path, rows))))
    }
}
