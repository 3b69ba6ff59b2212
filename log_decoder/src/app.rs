use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    log::{decode_log, FrameKind, LogError},
    report::{ReportFormat, RunReport},
    table::{
        expand_validity_flags, FrameTable, TableWriter, DEFAULT_DELIMITER,
        DEFAULT_FLOAT_PRECISION, MAX_FLOAT_PRECISION,
    },
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "decode_log",
    author,
    version,
    about = "Decode a flight-computer telemetry log into a delimited table",
    long_about = None
)]
pub struct Args {
    /// Frame kind stored in the log
    #[arg(value_enum)]
    pub kind: FrameKind,

    /// Binary log file to decode
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination for the decoded table
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Keep GPS validity flags packed instead of expanding them into columns
    #[arg(long)]
    pub raw_flags: bool,

    /// Field separator for the output table
    #[arg(long, default_value_t = DEFAULT_DELIMITER, value_parser = parse_delimiter)]
    pub delimiter: char,

    /// Decimal digits written for floating-point columns
    #[arg(long, default_value_t = DEFAULT_FLOAT_PRECISION, value_parser = parse_precision)]
    pub precision: usize,

    /// Format of the run summary printed to stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub kind: FrameKind,
    pub input: PathBuf,
    pub output: PathBuf,
    pub expand_flags: bool,
    pub delimiter: char,
    pub precision: usize,
    pub report: ReportFormat,
}

impl From<Args> for AppConfig {
    fn from(value: Args) -> Self {
        Self {
            kind: value.kind,
            input: value.input,
            output: value.output,
            expand_flags: !value.raw_flags,
            delimiter: value.delimiter,
            precision: value.precision,
            report: value.report,
        }
    }
}

fn parse_delimiter(value: &str) -> Result<char, String> {
    let delimiter = match value {
        "\\t" | "tab" => '\t',
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(format!("expected a single character, got '{value}'")),
            }
        }
    };
    TableWriter::new(delimiter, DEFAULT_FLOAT_PRECISION)
        .map(|writer| writer.delimiter())
        .map_err(|err| err.to_string())
}

fn parse_precision(value: &str) -> Result<usize, String> {
    let precision: usize = value
        .parse()
        .map_err(|_| format!("expected a number of digits, got '{value}'"))?;
    if precision > MAX_FLOAT_PRECISION {
        return Err(format!("at most {MAX_FLOAT_PRECISION} digits are supported"));
    }
    Ok(precision)
}

/// Logs go to stderr; stdout carries only the run report.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Decode `config.input` and write its table to `config.output`.
///
/// Nothing is written unless the whole log decodes.
pub fn run(config: &AppConfig) -> Result<RunReport> {
    let writer = TableWriter::new(config.delimiter, config.precision)
        .context("invalid output table format")?;
    let started = Instant::now();

    let log = decode_log(&config.input, config.kind)
        .map_err(handle_decode_error)
        .with_context(|| {
            format!(
                "failed to decode {} log {}",
                config.kind,
                config.input.display()
            )
        })?;
    info!(firmware = %log.header, kind = %log.kind, "Decoding log");

    let mut table = FrameTable::from_log(&log)?;
    let derived_columns = if config.expand_flags {
        expand_validity_flags(&mut table)?
    } else {
        0
    };

    writer
        .write_to_path(&table, &config.output)
        .with_context(|| format!("failed to write table to {}", config.output.display()))?;

    let report = RunReport::new(
        config.input.clone(),
        config.output.clone(),
        &log,
        &table,
        derived_columns,
        started.elapsed(),
    );
    info!(
        frames = report.frames,
        columns = report.columns,
        elapsed_ms = report.elapsed_ms,
        output = %config.output.display(),
        "Decoded log",
    );
    Ok(report)
}

fn handle_decode_error(err: LogError) -> LogError {
    match err.record() {
        Some(record) => error!(record, error = %err, "Log decode failed"),
        None => error!(error = %err, "Log decode failed"),
    }
    err
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use std::fs::{self, File};

    use tempfile::tempdir;

    use super::*;
    use crate::log::{Frame, GpsFrame, LogHeader, LogWriter, StateFrame};

    fn write_log(path: &std::path::Path, frames: &[Frame]) {
        let header = LogHeader::new("pal_9k5 v1.0.2").expect("header");
        let mut writer = LogWriter::new(File::create(path).expect("create log"), &header)
            .expect("log writer");
        for frame in frames {
            writer.write_frame(frame).expect("write frame");
        }
        writer.finish().expect("finish log");
    }

    fn config(kind: FrameKind, input: PathBuf, output: PathBuf) -> AppConfig {
        AppConfig {
            kind,
            input,
            output,
            expand_flags: true,
            delimiter: DEFAULT_DELIMITER,
            precision: DEFAULT_FLOAT_PRECISION,
            report: ReportFormat::Text,
        }
    }

    #[test]
    fn cli_args_defaults_then_use_expected_values() {
        let args = Args::try_parse_from(["decode_log", "gps", "in.bin", "out.csv"])
            .expect("default args parse");
        let config = AppConfig::from(args);

        assert_eq!(config.kind, FrameKind::Gps);
        assert_eq!(config.input, PathBuf::from("in.bin"));
        assert_eq!(config.output, PathBuf::from("out.csv"));
        assert!(config.expand_flags);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.precision, 6);
        assert_eq!(config.report, ReportFormat::Text);
    }

    #[test]
    fn cli_args_custom_inputs_then_override_defaults() {
        let args = Args::try_parse_from([
            "decode_log",
            "state",
            "in.bin",
            "out.tsv",
            "--raw-flags",
            "--delimiter",
            "\\t",
            "--precision",
            "3",
            "--report",
            "json",
        ])
        .expect("custom args parse");

        let config = AppConfig::from(args);
        assert_eq!(config.kind, FrameKind::State);
        assert!(!config.expand_flags);
        assert_eq!(config.delimiter, '\t');
        assert_eq!(config.precision, 3);
        assert_eq!(config.report, ReportFormat::Json);
    }

    #[test]
    fn cli_args__unknown_kind__then_usage_error() {
        let err = Args::try_parse_from(["decode_log", "baro", "in.bin", "out.csv"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn cli_args__missing_output__then_usage_error() {
        let err = Args::try_parse_from(["decode_log", "sensor", "in.bin"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn cli_args__numeric_delimiter_or_large_precision__then_rejected() {
        for args in [
            ["decode_log", "gps", "a", "b", "--delimiter", "."],
            ["decode_log", "gps", "a", "b", "--delimiter", "ab"],
            ["decode_log", "gps", "a", "b", "--precision", "18"],
            ["decode_log", "gps", "a", "b", "--precision", "-1"],
        ] {
            assert!(Args::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn init_tracing__called_twice__then_second_is_noop() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn run__gps_log__then_writes_expanded_table() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("gps.bin");
        let output = dir.path().join("gps.csv");
        let frames: Vec<Frame> = (0..4)
            .map(|i| {
                Frame::from(GpsFrame {
                    timestamp: 1_000 * i,
                    valid_flags: 0x109,
                    num_sats: 12,
                    ..GpsFrame::default()
                })
            })
            .collect();
        write_log(&input, &frames);

        let report = run(&config(FrameKind::Gps, input, output.clone())).expect("run succeeds");

        assert_eq!(report.frames, 4);
        assert_eq!(report.derived_columns, 10);
        assert_eq!(report.header, "pal_9k5 v1.0.2");
        let text = fs::read_to_string(&output).expect("read output");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].ends_with(",invalid_llh"));
        assert!(lines[1..].iter().all(|line| line.split(',').count() == 32));
    }

    #[test]
    fn run__raw_flags__then_no_derived_columns() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("gps.bin");
        let output = dir.path().join("gps.csv");
        write_log(&input, &[Frame::from(GpsFrame::default())]);

        let mut config = config(FrameKind::Gps, input, output.clone());
        config.expand_flags = false;
        let report = run(&config).expect("run succeeds");

        assert_eq!(report.derived_columns, 0);
        assert_eq!(report.columns, GpsFrame::SCHEMA.len());
        let text = fs::read_to_string(&output).expect("read output");
        assert!(text.lines().next().expect("header").ends_with(",accuracy_hdg"));
    }

    #[test]
    fn run__wrong_kind__then_schema_mismatch_and_no_output() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("state.bin");
        let output = dir.path().join("state.csv");
        write_log(&input, &[Frame::from(StateFrame::default())]);

        let err = run(&config(FrameKind::Gps, input, output.clone())).unwrap_err();

        let log_error = err.downcast_ref::<LogError>().expect("log error in chain");
        assert!(matches!(log_error, LogError::SchemaMismatch { record: 0, .. }));
        assert_eq!(log_error.record(), Some(0));
        assert!(err.to_string().contains("failed to decode gps log"));
        assert!(!output.exists());
    }

    #[test]
    fn run__missing_input__then_io_error() {
        let dir = tempdir().expect("tempdir");
        let err = run(&config(
            FrameKind::Sensor,
            dir.path().join("absent.bin"),
            dir.path().join("out.csv"),
        ))
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LogError>(),
            Some(LogError::Io { .. })
        ));
    }

    #[test]
    fn run__invalid_delimiter__then_fails_before_reading() {
        let dir = tempdir().expect("tempdir");
        let mut config = config(
            FrameKind::Sensor,
            dir.path().join("absent.bin"),
            dir.path().join("out.csv"),
        );
        config.delimiter = '-';

        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("invalid output table format"));
    }
}
