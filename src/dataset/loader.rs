//! Delimited-text corpus loader.
//!
//! The expected layout is one header row of feature names followed by one
//! row of numeric values per sample. Tabs separate fields by default.

use crate::core::error::{ForestError, Result};
use crate::dataset::{DataPoint, DataSet};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Field delimiter
    pub delimiter: char,
    /// Comment character; lines starting with it are skipped
    pub comment_char: Option<char>,
    /// Maximum number of samples to read
    pub max_rows: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            delimiter: '\t',
            comment_char: Some('#'),
            max_rows: None,
        }
    }
}

/// Reads [`DataSet`]s from delimited text.
#[derive(Debug, Clone, Default)]
pub struct DataSetLoader {
    config: LoaderConfig,
}

impl DataSetLoader {
    /// Creates a loader with the given settings.
    pub fn new(config: LoaderConfig) -> Self {
        DataSetLoader { config }
    }

    /// Set delimiter character
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Set maximum rows to read
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.config.max_rows = Some(max_rows);
        self
    }

    /// Loads a corpus from a file.
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<DataSet> {
        let path = path.as_ref();
        log::info!("Loading corpus: {}", path.display());

        if !path.is_file() {
            return Err(ForestError::data_loading(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        let file = File::open(path).map_err(|e| {
            ForestError::data_loading(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        let data = self.load_reader(file)?;

        log::info!(
            "Loaded {} points with {} features from {}",
            data.len(),
            data.num_features(),
            path.display()
        );
        Ok(data)
    }

    /// Loads a corpus from any reader.
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<DataSet> {
        let delimiter = ascii_byte("delimiter", self.config.delimiter)?;
        let comment = self
            .config
            .comment_char
            .map(|c| ascii_byte("comment character", c))
            .transpose()?;
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .comment(comment)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| ForestError::data_loading(format!("Failed to read headers: {}", e)))?
            .clone();
        let names: Vec<String> = headers
            .iter()
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return Err(ForestError::data_loading("Header row names no features"));
        }

        let mut data = DataSet::new(names);
        for (row, result) in reader.records().enumerate() {
            if self.config.max_rows.is_some_and(|max| data.len() >= max) {
                log::info!("Reached max_rows limit of {}, stopping", data.len());
                break;
            }
            let record = result?;
            // Header is line 1.
            let line = record.position().map_or(row + 2, |p| p.line() as usize);
            if let Some(point) = self.parse_record(&record, data.num_features(), line)? {
                data.add_data_point(point);
            }
        }

        Ok(data)
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        expected: usize,
        line: usize,
    ) -> Result<Option<DataPoint>> {
        let fields: Vec<&str> = record.iter().filter(|field| !field.is_empty()).collect();
        if fields.is_empty() {
            return Ok(None);
        }
        if fields.len() != expected {
            return Err(ForestError::data_loading(format!(
                "Inconsistent column count at line {}: expected {}, got {}",
                line,
                expected,
                fields.len()
            )));
        }

        let features = fields
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|_| {
                    ForestError::data_loading(format!(
                        "Non-numeric value '{}' at line {}",
                        field, line
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Some(DataPoint::new(features)))
    }
}

/// Loads a tab-delimited corpus with default settings.
pub fn read_data_set<P: AsRef<Path>>(path: P) -> Result<DataSet> {
    DataSetLoader::default().load_path(path)
}

/// The csv reader splits on single bytes.
fn ascii_byte(what: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ForestError::data_loading(format!(
            "{} {:?} is not an ASCII character",
            what, c
        )))
    }
}
