//! Report writing - the sink side of the pipeline
//!
//! One report file per capture file. The text format mirrors the historical
//! `field=value` dumps the old capture tooling produced; the JSON-lines
//! format is for downstream tools.

use anyhow::{Context, Result};
use chrono::Utc;
use mote_log_decoder::{DecodeFault, DecodedRecord, FaultCounters, RecordIterator};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable `field=value` lines
    #[default]
    Txt,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

/// Outcome of decoding one capture file
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub capture: PathBuf,
    pub report: PathBuf,
    pub records: usize,
    pub faults: usize,
    pub counters: FaultCounters,
}

/// A single report line, serialized as-is in JSON-lines mode
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ReportLine<'a> {
    Record(&'a DecodedRecord),
    Fault(&'a DecodeFault),
}

/// Report file path for a capture: `<stem>.<ext>` in `output_dir`, or next
/// to the capture when no output directory is configured
pub fn report_path(capture: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = capture.file_stem().unwrap_or_else(|| capture.as_os_str());
    let mut name = PathBuf::from(stem);
    name.set_extension(format.extension());
    match output_dir {
        Some(dir) => dir.join(name),
        None => capture.with_extension(format.extension()),
    }
}

/// Drain one pipeline into a report file
pub fn write_report<I>(
    mut pipeline: RecordIterator<I>,
    capture: &Path,
    report: &Path,
    format: OutputFormat,
) -> Result<FileSummary>
where
    I: Iterator<Item = u8>,
{
    let file = File::create(report)
        .with_context(|| format!("Failed to create report file: {:?}", report))?;
    let mut out = BufWriter::new(file);

    if format == OutputFormat::Txt {
        writeln!(out, "# capture: {}", capture.display())?;
        writeln!(out, "# decoded: {}", Utc::now().to_rfc3339())?;
    }

    let mut records = 0usize;
    let mut faults = 0usize;

    for item in &mut pipeline {
        match (&item, format) {
            (Ok(record), OutputFormat::Txt) => {
                write!(out, "{} mote=0x{:04X}", record.label(), record.mote)?;
                for field in &record.fields {
                    write!(out, " {}={}", field.name, field.value)?;
                }
                writeln!(out)?;
            }
            (Err(fault), OutputFormat::Txt) => {
                writeln!(out, "! {}", fault)?;
            }
            (Ok(record), OutputFormat::Jsonl) => {
                writeln!(out, "{}", serde_json::to_string(&ReportLine::Record(record))?)?;
            }
            (Err(fault), OutputFormat::Jsonl) => {
                writeln!(out, "{}", serde_json::to_string(&ReportLine::Fault(fault))?)?;
            }
        }
        match item {
            Ok(_) => records += 1,
            Err(_) => faults += 1,
        }
    }

    let counters = pipeline.counters();
    if format == OutputFormat::Txt {
        writeln!(
            out,
            "# records={} faults={} unterminated_frames={} stray_escapes={}",
            records, faults, counters.unterminated_frames, counters.stray_escapes
        )?;
    }
    out.flush()?;

    Ok(FileSummary {
        capture: capture.to_path_buf(),
        report: report.to_path_buf(),
        records,
        faults,
        counters,
    })
}
