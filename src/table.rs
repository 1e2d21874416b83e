//! Decompression and column projection of the UCSC table dumps
//!
//! Each dump is a gzip-compressed, tab-separated, headerless text file. Rows
//! are projected into typed records as they are read; a row that is too
//! short for the projection aborts the read.

use crate::error::{Error, FS_OPEN_TABLE, MalformedRowError, Result};
use crate::types::Table;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// A `knownGene` row projected to the columns the join needs
///
/// Built from zero-based columns {11, 0, 7, 3, 4}.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneRow {
    /// Join key (column 11)
    pub transcript_id: String,
    /// Leading name column (column 0), the first field of the output
    pub name: String,
    /// Exon count (column 7)
    pub exon_count: String,
    /// Transcription start (column 3)
    pub tx_start: String,
    /// Transcription end (column 4)
    pub tx_end: String,
}

impl GeneRow {
    /// Minimum column count of a `knownGene` row
    pub const REQUIRED_COLUMNS: usize = 12;

    /// Project one split line
    ///
    /// `line` is the 1-based line number, used only for error reporting.
    pub fn from_fields(fields: &[&str], line: usize) -> Result<Self> {
        check_width(Table::KnownGene, fields, Self::REQUIRED_COLUMNS, line)?;
        Ok(Self {
            transcript_id: fields[11].to_string(),
            name: fields[0].to_string(),
            exon_count: fields[7].to_string(),
            tx_start: fields[3].to_string(),
            tx_end: fields[4].to_string(),
        })
    }
}

/// A `knownCanonical` row projected to its transcript id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalRow {
    /// Join key (column 4)
    pub transcript_id: String,
}

impl CanonicalRow {
    /// Minimum column count of a `knownCanonical` row
    pub const REQUIRED_COLUMNS: usize = 5;

    /// Project one split line
    pub fn from_fields(fields: &[&str], line: usize) -> Result<Self> {
        check_width(Table::KnownCanonical, fields, Self::REQUIRED_COLUMNS, line)?;
        Ok(Self {
            transcript_id: fields[4].to_string(),
        })
    }
}

fn check_width(table: Table, fields: &[&str], required: usize, line: usize) -> Result<()> {
    if fields.len() < required {
        return Err(Error::MalformedRow(MalformedRowError {
            table: table.name(),
            line,
            found: fields.len(),
            required,
        }));
    }
    Ok(())
}

/// Read tab-separated rows from `reader`, projecting each with `project`
///
/// Row order is preserved. Trailing `\r` is stripped and blank lines at the
/// end of the stream are ignored; a blank line followed by more data is
/// reported as a malformed row.
pub fn project_rows<R, T, F>(reader: R, path: &Path, mut project: F) -> Result<Vec<T>>
where
    R: BufRead,
    F: FnMut(&[&str], usize) -> Result<T>,
{
    let mut rows = Vec::new();
    let mut pending_blank: Option<usize> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::Decompress {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let line_no = idx + 1;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            pending_blank.get_or_insert(line_no);
            continue;
        }
        if let Some(blank) = pending_blank.take() {
            project(&[], blank)?;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        rows.push(project(&fields, line_no)?);
    }

    Ok(rows)
}

/// Open a gzip file and return a buffered reader over its decompressed text
pub fn open_gz(path: &Path) -> Result<BufReader<MultiGzDecoder<File>>> {
    let file = File::open(path).map_err(|e| Error::filesystem(FS_OPEN_TABLE, path, e))?;
    Ok(BufReader::new(MultiGzDecoder::new(file)))
}

/// Decompress and project a `knownGene` dump
pub fn read_gene_table(path: &Path) -> Result<Vec<GeneRow>> {
    let rows = project_rows(open_gz(path)?, path, GeneRow::from_fields)?;
    debug!(?path, rows = rows.len(), "projected gene table");
    Ok(rows)
}

/// Decompress and project a `knownCanonical` dump
pub fn read_canonical_table(path: &Path) -> Result<Vec<CanonicalRow>> {
    let rows = project_rows(open_gz(path)?, path, CanonicalRow::from_fields)?;
    debug!(?path, rows = rows.len(), "projected canonical table");
    Ok(rows)
}
