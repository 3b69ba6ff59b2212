//! Run summary printed by `decode_log`.
//!
//! Supports text and JSON output formats.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{log::LogFile, table::FrameTable};

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// What one decode run read and wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Firmware identifier from the log header.
    pub header: String,
    pub kind: &'static str,
    pub frames: usize,
    pub columns: usize,
    pub derived_columns: usize,
    pub bytes_read: u64,
    pub elapsed_ms: f64,
}

impl RunReport {
    pub fn new(
        input: PathBuf,
        output: PathBuf,
        log: &LogFile,
        table: &FrameTable,
        derived_columns: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            input,
            output,
            header: log.header.as_str().to_owned(),
            kind: log.kind.name(),
            frames: log.len(),
            columns: table.width(),
            derived_columns,
            bytes_read: log.bytes_read,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).context("failed to serialize run report")
            }
        }
    }

    fn render_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Input:   {}\n", self.input.display()));
        output.push_str(&format!("Header:  {}\n", self.header));
        output.push_str(&format!("Kind:    {}\n", self.kind));
        output.push_str(&format!("Frames:  {}\n", self.frames));
        output.push_str(&format!("Columns: {}", self.columns));
        if self.derived_columns > 0 {
            output.push_str(&format!(" ({} derived)", self.derived_columns));
        }
        output.push('\n');
        output.push_str(&format!("Bytes:   {}\n", self.bytes_read));
        output.push_str(&format!("Output:  {}\n", self.output.display()));
        output.push_str(&format!("Elapsed: {:.3} ms", self.elapsed_ms));

        output
    }
}
