//! Formatting utilities for command output.
//!
//! Every command prints through [`Formattable`], in JSON, YAML or CSV.
//! Tabular resources implement [`CsvRecordProducer`] and get all three
//! formats for free, both for single items ([`format_item`]) and lists.

use serde::Serialize;
use std::str::FromStr;

pub const JSON: &str = "json";
pub const YAML: &str = "yaml";
pub const CSV: &str = "csv";

/// Error types that can occur during formatting operations
#[derive(Debug, thiserror::Error)]
pub enum FormattingError {
    /// Error when an unsupported output format is requested
    #[error("invalid output format {0}")]
    UnsupportedOutputFormat(String),
    /// Error specific to CSV operations
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    /// Error when converting bytes to UTF-8 string
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("JSON serialization error: {0}")]
    JsonSerializationError(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    YamlSerializationError(#[from] serde_yaml::Error),

    #[error("CSV writer into inner error: {0}")]
    CsvIntoInnerError(#[from] csv::IntoInnerError<csv::Writer<Vec<u8>>>),
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd)]
pub struct OutputFormatOptions {
    pub with_headers: bool,
    pub pretty: bool,
}

/// Enum representing the supported output formats
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum OutputFormat {
    /// JSON (JavaScript Object Notation) format
    Json(OutputFormatOptions),
    /// YAML format
    Yaml(OutputFormatOptions),
    /// CSV (Comma-Separated Values) format
    Csv(OutputFormatOptions),
}

impl OutputFormat {
    /// Returns a vector of all supported format names as strings
    pub fn names() -> Vec<&'static str> {
        vec![JSON, YAML, CSV]
    }

    pub fn from_string_with_options(
        format_str: &str,
        options: OutputFormatOptions,
    ) -> Result<OutputFormat, FormattingError> {
        let normalized_format = format_str.to_lowercase();
        match normalized_format.as_str() {
            JSON => Ok(OutputFormat::Json(options)),
            YAML | "yml" => Ok(OutputFormat::Yaml(options)),
            CSV => Ok(OutputFormat::Csv(options)),
            _ => Err(FormattingError::UnsupportedOutputFormat(normalized_format)),
        }
    }

    pub fn options(&self) -> &OutputFormatOptions {
        match self {
            OutputFormat::Json(options)
            | OutputFormat::Yaml(options)
            | OutputFormat::Csv(options) => options,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Json(OutputFormatOptions::default())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OutputFormat::Json(_) => write!(f, "{}", JSON),
            OutputFormat::Yaml(_) => write!(f, "{}", YAML),
            OutputFormat::Csv(_) => write!(f, "{}", CSV),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FormattingError;

    fn from_str(format_str: &str) -> Result<OutputFormat, FormattingError> {
        Self::from_string_with_options(format_str, OutputFormatOptions::default())
    }
}

pub trait Formattable {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError>;
}

/// Trait for producing CSV records from data
pub trait CsvRecordProducer {
    /// Returns the header row for the CSV output
    fn csv_header() -> Vec<&'static str>;

    /// Converts one item into a CSV record
    fn as_csv_record(&self) -> Vec<String>;
}

fn to_json<T: Serialize + ?Sized>(
    value: &T,
    options: &OutputFormatOptions,
) -> Result<String, FormattingError> {
    if options.pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn to_csv<'a, T, I>(items: I, options: &OutputFormatOptions) -> Result<String, FormattingError>
where
    T: CsvRecordProducer + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    if options.with_headers {
        wtr.write_record(T::csv_header())?;
    }
    for item in items {
        wtr.write_record(item.as_csv_record())?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

/// Format a single tabular item.
pub fn format_item<T>(item: &T, f: &OutputFormat) -> Result<String, FormattingError>
where
    T: Serialize + CsvRecordProducer,
{
    match f {
        OutputFormat::Json(options) => to_json(item, options),
        OutputFormat::Yaml(_) => Ok(serde_yaml::to_string(item)?),
        OutputFormat::Csv(options) => to_csv(std::iter::once(item), options),
    }
}

impl<T> Formattable for Vec<T>
where
    T: Serialize + CsvRecordProducer,
{
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        match f {
            OutputFormat::Json(options) => to_json(self, options),
            OutputFormat::Yaml(_) => Ok(serde_yaml::to_string(self)?),
            OutputFormat::Csv(options) => to_csv(self.iter(), options),
        }
    }
}
