//! Reading record collections from disk and writing results back.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::info;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::decade::DecadeBin;
use crate::error::{Error, Result};
use crate::ngram::{FrequencyTable, HistogramKind};
use crate::record::{Record, parse_records};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Loads the records of a JSON file.
pub fn load_file(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_records(&text, &path.display().to_string())
}

/// Writes a histogram sorted by descending count. JSON output is an array
/// of `{"<field>": key, "occurrences": count}` objects, CSV output has the
/// same two columns.
pub fn write_histogram(
    table: &FrequencyTable,
    kind: HistogramKind,
    path: &Path,
    format: ExportFormat,
) -> Result<()> {
    let field = kind.field_name();
    match format {
        ExportFormat::Json => {
            let entries: Vec<Value> = table
                .sorted()
                .into_iter()
                .map(|(key, count)| {
                    let mut entry = Map::new();
                    entry.insert(field.to_string(), Value::String(key));
                    entry.insert("occurrences".to_string(), Value::from(count));
                    Value::Object(entry)
                })
                .collect();
            write_json(&entries, path)?;
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record([field, "occurrences"])?;
            for (key, count) in table.sorted() {
                writer.write_record([key, count.to_string()])?;
            }
            writer.flush().map_err(|e| Error::io(path, e))?;
        }
    }
    info!("wrote {} entries to {}", table.len(), path.display());
    Ok(())
}

/// Reads a JSON histogram written by [`write_histogram`].
pub fn read_histogram(path: &Path, kind: HistogramKind) -> Result<FrequencyTable> {
    let source = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let document: Value = serde_json::from_str(&text).map_err(|e| Error::format(&source, e))?;
    let entries = document
        .as_array()
        .ok_or_else(|| Error::format(&source, "histogram is not an array"))?;

    let field = kind.field_name();
    let mut table = FrequencyTable::new();
    for (i, entry) in entries.iter().enumerate() {
        let key = entry.get(field).and_then(Value::as_str);
        let count = entry.get("occurrences").and_then(Value::as_u64);
        match (key, count) {
            (Some(key), Some(count)) => table.add_count(key, count),
            _ => {
                return Err(Error::format(
                    &source,
                    format!("entry #{i} lacks '{field}' or 'occurrences'"),
                ));
            }
        }
    }
    Ok(table)
}

/// Writes records, unmodified, as a JSON array.
pub fn write_records(records: &[Record], path: &Path) -> Result<()> {
    write_json(records, path)
}

/// Writes one `<stem>_<bin>.json` file per decade bin into `dir`.
pub fn write_decade_bins(
    bins: &[(DecadeBin, Vec<Record>)],
    dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let mut written = Vec::with_capacity(bins.len());
    for (bin, members) in bins {
        let path = dir.join(format!("{stem}_{}.json", bin.name));
        write_records(members, &path)?;
        info!("{}: {} records -> {}", bin.name, members.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

pub(crate) fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| Error::io(path, e.into()))?;
    writer.flush().map_err(|e| Error::io(path, e))
}
