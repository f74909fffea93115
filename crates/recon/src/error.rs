use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// No person-source file name contained the day token.
    EmptySource { dir: String, token: String },
    /// A person-source file lacks one of the projected columns.
    MissingColumn { file: String, column: String },
    /// A requested channel is not a column of the transposed metric table.
    ColumnResolution { file: String, column: String },
    /// File name does not carry any configured day tag.
    UnrecognizedDayTag(String),
    /// File name does not follow `Day N - Metric`.
    MetricNameNotFound(String),
    /// Timestamp cell present but not parseable.
    TimestampParse { file: String, value: String },
    /// Person-source value cell present but not numeric.
    ValueParse { file: String, column: String, value: String },
    /// CSV read error.
    Csv { file: String, message: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate day, bad template, etc.).
    ConfigValidation(String),
    /// IO error (directory listing, file open, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySource { dir, token } => {
                write!(f, "no file in '{dir}' matches day token '{token}'")
            }
            Self::MissingColumn { file, column } => {
                write!(f, "file '{file}': missing column '{column}'")
            }
            Self::ColumnResolution { file, column } => {
                write!(f, "file '{file}': channel '{column}' not found after transposition")
            }
            Self::UnrecognizedDayTag(name) => {
                write!(f, "'{name}' does not contain a recognized day tag")
            }
            Self::MetricNameNotFound(name) => {
                write!(f, "'{name}' does not match 'Day N - <metric>'")
            }
            Self::TimestampParse { file, value } => {
                write!(f, "file '{file}': cannot parse timestamp '{value}'")
            }
            Self::ValueParse { file, column, value } => {
                write!(f, "file '{file}', column '{column}': cannot parse value '{value}'")
            }
            Self::Csv { file, message } => write!(f, "file '{file}': {message}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
