//! Mote Log CLI Application
//!
//! Command-line front end for the mote-log-decoder library. It adds the
//! glue the library deliberately leaves out:
//! - Capture file discovery (explicit paths or directory scan)
//! - One independent pipeline per capture file, run in parallel
//! - Text / JSON-lines report writing
//! - Per-file fault counter summaries

use anyhow::{bail, Context, Result};
use clap::Parser;
use mote_log_decoder::{Decoder, DecoderConfig};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

mod config;
mod report;

use report::{FileSummary, OutputFormat};

/// Mote Log Reader - decode serial telemetry captures from mesh motes
#[derive(Parser, Debug)]
#[command(name = "mote-log-cli")]
#[command(about = "Decode HDLC-framed telemetry captures from mesh motes", long_about = None)]
#[command(version)]
struct Args {
    /// Capture file(s) to decode
    #[arg(value_name = "FILE")]
    captures: Vec<PathBuf>,

    /// Decode every regular file in this directory
    #[arg(short = 'd', long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Directory for report files (default: next to each capture)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Report format (default: txt, or the config file's choice)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Only decode records from this mote id (can be repeated)
    #[arg(short, long, value_name = "ID")]
    mote: Vec<u16>,

    /// Maximum number of records to decode per capture
    #[arg(long, value_name = "COUNT")]
    max_records: Option<usize>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    log::info!("Mote Log CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", mote_log_decoder::VERSION);

    // Flags first, config file as the fallback for anything not given
    let file_config = args
        .config
        .as_deref()
        .map(config::load_config)
        .transpose()?;

    let captures = gather_captures(&args, file_config.as_ref())?;
    if captures.is_empty() {
        println!("Mote Log Reader - no captures specified");
        println!("\nQuick Start:");
        println!("  mote-log-cli capture.bin");
        println!("  mote-log-cli --input-dir captures/ --format jsonl");
        println!("  mote-log-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let decoder_config = build_decoder_config(&args, file_config.as_ref());
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output.output_dir.clone()));
    let format = resolve_format(args.format, file_config.as_ref());

    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    log::info!("Decoding {} capture file(s)", captures.len());

    // Each capture gets its own pipeline; nothing mutable is shared, so the
    // files can be processed fully in parallel
    let results: Vec<(PathBuf, Result<FileSummary>)> = captures
        .par_iter()
        .map(|capture| {
            let result = process_capture(
                capture,
                output_dir.as_deref(),
                format,
                decoder_config.clone(),
            );
            (capture.clone(), result)
        })
        .collect();

    let mut failed = 0usize;
    for (capture, result) in &results {
        match result {
            Ok(summary) => {
                log::info!(
                    "{}: {} records, {} faults -> {}",
                    capture.display(),
                    summary.records,
                    summary.faults,
                    summary.report.display()
                );
                let c = summary.counters;
                if c.unterminated_frames > 0 || c.stray_escapes > 0 {
                    log::warn!(
                        "{}: {} unterminated frame(s), {} stray escape byte(s)",
                        capture.display(),
                        c.unterminated_frames,
                        c.stray_escapes
                    );
                }
            }
            Err(e) => {
                failed += 1;
                log::error!("{}: {:#}", capture.display(), e);
            }
        }
    }

    if !args.quiet {
        let records: usize = results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|s| s.records)
            .sum();
        let faults: usize = results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|s| s.faults)
            .sum();
        println!(
            "Decoded {} capture(s): {} records, {} frame faults",
            results.len() - failed,
            records,
            faults
        );
    }

    if failed > 0 {
        bail!("{} of {} capture(s) could not be processed", failed, results.len());
    }
    Ok(())
}

/// Decode one capture file and write its report
fn process_capture(
    capture: &Path,
    output_dir: Option<&Path>,
    format: OutputFormat,
    decoder_config: DecoderConfig,
) -> Result<FileSummary> {
    let decoder = Decoder::new();
    let pipeline = decoder
        .decode_file(capture, decoder_config)
        .with_context(|| format!("Failed to open capture: {:?}", capture))?;

    let report = report::report_path(capture, output_dir, format);
    report::write_report(pipeline, capture, &report, format)
}

/// Collect capture paths from the command line, the input directory, and
/// the config file
fn gather_captures(args: &Args, file_config: Option<&config::AppConfig>) -> Result<Vec<PathBuf>> {
    let mut captures = args.captures.clone();

    if let Some(cfg) = file_config {
        captures.extend(cfg.input.files.iter().cloned());
    }

    let scan_dir = args
        .input_dir
        .clone()
        .or_else(|| file_config.and_then(|c| c.input.capture_dir.clone()));
    if let Some(dir) = scan_dir {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to scan input directory: {:?}", dir))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                captures.push(path);
            }
        }
    }

    captures.sort();
    captures.dedup();
    Ok(captures)
}

/// Report format: an explicit flag always wins, the config file is the
/// fallback, txt the default
fn resolve_format(
    arg: Option<OutputFormat>,
    file_config: Option<&config::AppConfig>,
) -> OutputFormat {
    arg.or_else(|| file_config.map(|c| c.output.format))
        .unwrap_or_default()
}

/// Merge CLI flags and config file into the library config
fn build_decoder_config(args: &Args, file_config: Option<&config::AppConfig>) -> DecoderConfig {
    let mut config = DecoderConfig::new();

    if !args.mote.is_empty() {
        config = config.with_mote_filter(args.mote.clone());
    } else if let Some(motes) = file_config.and_then(|c| c.filter.motes.clone()) {
        config = config.with_mote_filter(motes);
    }

    if let Some(classes) = file_config.and_then(|c| c.filter.classes.clone()) {
        config = config.with_class_filter(classes);
    }

    if let Some(max) = args
        .max_records
        .or_else(|| file_config.and_then(|c| c.filter.max_records))
    {
        config = config.with_max_records(max);
    }

    config
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use mote_log_decoder::framing::escape;
    use std::io::Write as _;

    #[test]
    fn test_process_capture_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("node-1.bin");

        let mut wire = Vec::new();
        wire.extend(escape(&[b'S', 0x01, 0x02, 0x02, 0x2A, 0x00])); // MyDagRank=42
        wire.extend(escape(&[b'I', 0x01, 0x02, 0x05, 0x00, 0x03, 0x00, 0x07, 0x00]));
        std::fs::File::create(&capture)
            .unwrap()
            .write_all(&wire)
            .unwrap();

        let summary =
            process_capture(&capture, None, OutputFormat::Txt, DecoderConfig::new()).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.faults, 0);

        let text = std::fs::read_to_string(&summary.report).unwrap();
        assert!(text.contains("status/MyDagRank mote=0x0201 myDagRank=42"));
        assert!(text.contains("calling_component=5"));
    }

    #[test]
    fn test_resolve_format_precedence() {
        let jsonl_config: config::AppConfig = toml::from_str(
            "[input]\nfiles = []\n\n[output]\nformat = \"jsonl\"\n",
        )
        .unwrap();

        // An explicit flag wins over the config file, even when it names
        // the default format
        assert_eq!(
            resolve_format(Some(OutputFormat::Txt), Some(&jsonl_config)),
            OutputFormat::Txt
        );
        assert_eq!(
            resolve_format(Some(OutputFormat::Jsonl), None),
            OutputFormat::Jsonl
        );
        // No flag: the config file decides
        assert_eq!(
            resolve_format(None, Some(&jsonl_config)),
            OutputFormat::Jsonl
        );
        // Neither: txt
        assert_eq!(resolve_format(None, None), OutputFormat::Txt);
    }

    #[test]
    fn test_gather_captures_dedup_and_scan() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"").unwrap();
        std::fs::write(&b, b"").unwrap();

        let args = Args {
            captures: vec![a.clone()],
            input_dir: Some(dir.path().to_path_buf()),
            output_dir: None,
            format: None,
            mote: vec![],
            max_records: None,
            config: None,
            verbose: 0,
            quiet: false,
        };
        let captures = gather_captures(&args, None).unwrap();
        assert_eq!(captures, vec![a, b]);
    }
}
