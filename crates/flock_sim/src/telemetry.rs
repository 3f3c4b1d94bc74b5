//! Per-tick timing telemetry.
//!
//! One [`FrameSample`] is recorded for every tick that runs. The CSV sink
//! writes a `Timestamp, FPS` table and flushes after every row, so a crash
//! loses at most the row being written.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::TelemetryError;

/// Header row of the timing table.
pub const CSV_HEADER: &str = "Timestamp, FPS";

/// Timestamp layout, millisecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Timing of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub timestamp: DateTime<Local>,
    /// Instantaneous frames per second, `1 / dt`.
    pub fps: f32,
}

impl FrameSample {
    /// Sample for a frame of `dt` seconds taken now. A non-positive `dt`
    /// reports 0 FPS.
    #[must_use]
    pub fn from_delta(dt: f32) -> Self {
        Self {
            timestamp: Local::now(),
            fps: if dt > 0.0 { 1.0 / dt } else { 0.0 },
        }
    }
}

/// Append-only sink for frame samples.
pub trait TelemetrySink {
    /// # Errors
    ///
    /// Returns [`TelemetryError`] if the sample could not be stored.
    fn record(&mut self, sample: FrameSample) -> Result<(), TelemetryError>;
}

/// Writes samples as CSV rows.
#[derive(Debug)]
pub struct CsvTelemetry<W: Write> {
    writer: W,
}

impl CsvTelemetry<BufWriter<File>> {
    /// Create (or truncate) the file at `path` and write the header.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Io`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvTelemetry<W> {
    /// Wrap a writer and emit the header row.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Io`] if the header cannot be written.
    pub fn new(mut writer: W) -> Result<Self, TelemetryError> {
        writeln!(writer, "{CSV_HEADER}")?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for CsvTelemetry<W> {
    fn record(&mut self, sample: FrameSample) -> Result<(), TelemetryError> {
        writeln!(
            self.writer,
            "{}, {}",
            sample.timestamp.format(TIMESTAMP_FORMAT),
            sample.fps
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps samples in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTelemetry {
    pub samples: Vec<FrameSample>,
}

impl TelemetrySink for MemoryTelemetry {
    fn record(&mut self, sample: FrameSample) -> Result<(), TelemetryError> {
        self.samples.push(sample);
        Ok(())
    }
}

/// Discards samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetry;

impl TelemetrySink for NullTelemetry {
    fn record(&mut self, _sample: FrameSample) -> Result<(), TelemetryError> {
        Ok(())
    }
}
