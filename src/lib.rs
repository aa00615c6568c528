use csv::{ReaderBuilder, StringRecord, Trim};
use plotters::style::RGBColor;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
pub mod chart;
pub mod plot;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DEFAULT_LOG_FILE: &str = "log.csv";
pub const FIELDS_PER_ROW: usize = 3;

/// Errors raised while loading the controller log
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("log file '{}' not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("could not read log file: {0}")]
    Io(#[from] std::io::Error),
}

/// The three logged columns, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Error,
    Derivative,
    Mv,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Error, Channel::Derivative, Channel::Mv];

    pub fn label(self) -> &'static str {
        match self {
            Channel::Error => "Error",
            Channel::Derivative => "Derivative",
            Channel::Mv => "MV (Output)",
        }
    }

    pub fn color(self) -> RGBColor {
        match self {
            Channel::Error => RGBColor(0, 0, 255),
            Channel::Derivative => RGBColor(255, 165, 0),
            Channel::Mv => RGBColor(128, 0, 128),
        }
    }
}

/// One controller step: error, its derivative and the manipulated variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub error: f64,
    pub derivative: f64,
    pub mv: f64,
}

impl LogRecord {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Error => self.error,
            Channel::Derivative => self.derivative,
            Channel::Mv => self.mv,
        }
    }

    fn from_record(record: &StringRecord, line: u64) -> Result<LogRecord, LoadError> {
        if record.len() != FIELDS_PER_ROW {
            return Err(LoadError::MalformedRow {
                line,
                reason: format!(
                    "expected {} fields, found {}",
                    FIELDS_PER_ROW,
                    record.len()
                ),
            });
        }
        let mut values = [0f64; FIELDS_PER_ROW];
        for ((v, field), channel) in values.iter_mut().zip(record.iter()).zip(Channel::ALL.iter()) {
            *v = field.parse::<f64>().map_err(|_| LoadError::MalformedRow {
                line,
                reason: format!("{} value '{}' is not a number", channel.label(), field),
            })?;
        }
        Ok(LogRecord {
            error: values[0],
            derivative: values[1],
            mv: values[2],
        })
    }
}

/// read failures stay I/O errors, everything else the reader rejects is a bad row
fn load_error_from_csv(e: csv::Error, fallback_line: u64) -> LoadError {
    let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
    debug!("rejected line {}: {}", line, e);
    let reason = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => LoadError::Io(io),
        _ => LoadError::MalformedRow { line, reason },
    }
}

/// The controller log, the row index is the time axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogTable {
    records: Vec<LogRecord>,
}

impl LogTable {
    /// Reads a headerless csv with the columns error, derivative, mv.
    /// Any row without exactly three numeric fields aborts the load,
    /// no partial table is returned.
    pub fn from_csv(fin: &Path) -> Result<LogTable, LoadError> {
        // opening a directory succeeds on unix, only the first read fails
        if fin.is_dir() {
            return Err(LoadError::FileNotFound(fin.to_path_buf()));
        }
        let file = File::open(fin).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::FileNotFound(fin.to_path_buf()),
            _ => LoadError::Io(e),
        })?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);
        let mut table = LogTable::default();
        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| load_error_from_csv(e, i as u64 + 1))?;
            let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 1);
            match LogRecord::from_record(&record, line) {
                Ok(r) => table.records.push(r),
                Err(e) => {
                    debug!("rejected line {}: {:?}", line, record);
                    return Err(e);
                }
            }
        }
        info!("loaded {} rows from {}", table.len(), fin.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records[..]
    }

    /// row index as f64, shared by the three panels
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.records.len()).map(|i| i as f64).collect()
    }

    pub fn column(&self, channel: Channel) -> Vec<f64> {
        self.records.iter().map(|r| r.get(channel)).collect()
    }
}

impl From<Vec<LogRecord>> for LogTable {
    fn from(records: Vec<LogRecord>) -> LogTable {
        LogTable { records }
    }
}

/// Loads the log at `fin`, the binary passes `PlotConfig::log_file_path`
pub fn load(fin: &Path) -> Result<LogTable, LoadError> {
    LogTable::from_csv(fin)
}

/// Min and max over the finite values, None if there are none
pub fn finite_min_and_max(s: &[f64]) -> Option<(f64, f64)> {
    let mut finite = s.iter().copied().filter(|v| v.is_finite());
    let (mut min, mut max) = match finite.next() {
        Some(v) => (v, v),
        None => return None,
    };
    for es in finite {
        if es > max {
            max = es
        }
        if es < min {
            min = es
        }
    }
    Some((min, max))
}
