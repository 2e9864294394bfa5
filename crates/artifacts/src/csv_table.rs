//! Shared plumbing for the CSV artifacts: header lookup, typed field
//! parsing with row context, and buffered atomic writing.

use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::atomic_write::atomic_write;
use crate::error::{ArtifactError, Result};

/// Column positions of a table, resolved once from its header row.
pub(crate) struct Header {
    table: &'static str,
    record: StringRecord,
}

impl Header {
    pub(crate) fn read<R: Read>(table: &'static str, reader: &mut csv::Reader<R>) -> Result<Self> {
        Ok(Self {
            table,
            record: reader.headers()?.clone(),
        })
    }

    pub(crate) fn optional(&self, column: &str) -> Option<usize> {
        self.record.iter().position(|h| h.trim() == column)
    }

    pub(crate) fn require(&self, column: &str) -> Result<usize> {
        self.optional(column).ok_or_else(|| ArtifactError::MissingColumn {
            table: self.table.to_string(),
            column: column.to_string(),
        })
    }
}

/// One data row with enough context to report where a bad field is.
pub(crate) struct Row<'a> {
    pub(crate) table: &'static str,
    pub(crate) record: &'a StringRecord,
}

impl Row<'_> {
    fn line(&self) -> u64 {
        self.record.position().map_or(0, |p| p.line())
    }

    pub(crate) fn text(&self, index: usize) -> &str {
        self.record.get(index).map_or("", str::trim)
    }

    pub(crate) fn bad(&self, column: &str, detail: impl Display) -> ArtifactError {
        ArtifactError::Decode(format!(
            "{} line {}, column `{}`: {}",
            self.table,
            self.line(),
            column,
            detail
        ))
    }

    pub(crate) fn parse<T>(&self, index: usize, column: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.text(index);
        raw.parse::<T>()
            .map_err(|e| self.bad(column, format_args!("{raw:?}: {e}")))
    }

    /// `0/1/true/false`, case-insensitive.
    pub(crate) fn flag(&self, index: usize, column: &str) -> Result<bool> {
        match self.text(index).to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(self.bad(column, format_args!("{other:?} is not a 0/1 flag"))),
        }
    }

    pub(crate) fn date(&self, index: usize, column: &str) -> Result<NaiveDate> {
        let raw = self.text(index);
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| self.bad(column, format_args!("{raw:?}: {e}")))
    }
}

pub(crate) fn open(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| ArtifactError::io(path, e))?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
}

pub(crate) fn bool_cell(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Serialise `rows` under `header` in memory, then persist atomically.
pub(crate) fn write_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    let mut n = 0usize;
    for row in rows {
        writer.write_record(&row)?;
        n += 1;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ArtifactError::Encode(e.to_string()))?;
    atomic_write(path, &bytes)?;
    tracing::info!("wrote {} rows to {}", n, path.display());
    Ok(())
}
