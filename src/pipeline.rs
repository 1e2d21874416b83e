//! The extract-transform-join pipeline
//!
//! Stages run in order and stop at the first error:
//! fetch → decompress/project → sort → merge join → sort/dedup → write.
//! The working directory guard removes every intermediate file on all exit
//! paths, and the output only appears at its final path once complete.

use crate::config::Config;
use crate::error::{Error, FS_PERSIST_OUTPUT, FS_READ_OUTPUT, FS_WRITE_OUTPUT, Result};
use crate::fetch::{DownloadedTables, Fetcher};
use crate::table::{CanonicalRow, GeneRow, read_canonical_table, read_gene_table};
use crate::types::Stage;
use crate::workdir::WorkDir;
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// First line of every output file
pub const HEADER: &str = "Transcript(ucsc/known) exons start end";

/// Rows that carry a join key
pub trait Keyed {
    /// The key rows are sorted and joined on
    fn key(&self) -> &str;
}

impl Keyed for GeneRow {
    fn key(&self) -> &str {
        &self.transcript_id
    }
}

impl Keyed for CanonicalRow {
    fn key(&self) -> &str {
        &self.transcript_id
    }
}

/// One output row: (name, exonCount, txStart, txEnd)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinedRow {
    /// Gene table column 0
    pub name: String,
    /// Gene table column 7
    pub exon_count: String,
    /// Gene table column 3
    pub tx_start: String,
    /// Gene table column 4
    pub tx_end: String,
}

impl From<&GeneRow> for JoinedRow {
    fn from(gene: &GeneRow) -> Self {
        Self {
            name: gene.name.clone(),
            exon_count: gene.exon_count.clone(),
            tx_start: gene.tx_start.clone(),
            tx_end: gene.tx_end.clone(),
        }
    }
}

impl fmt::Display for JoinedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name, self.exon_count, self.tx_start, self.tx_end
        )
    }
}

/// Stable ascending sort by key, byte-wise
pub fn sort_by_key<T: Keyed>(rows: &mut [T]) {
    rows.sort_by(|a, b| a.key().as_bytes().cmp(b.key().as_bytes()));
}

/// Inner equi-join of two key-sorted sequences
///
/// Emits one row per matching (canonical, gene) pair, in key order. Canonical
/// ids without a gene row are dropped; duplicated canonical ids produce
/// duplicated rows.
pub fn merge_join(canonical: &[CanonicalRow], genes: &[GeneRow]) -> Vec<JoinedRow> {
    let mut joined = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < canonical.len() && j < genes.len() {
        let key = canonical[i].key();
        match key.as_bytes().cmp(genes[j].key().as_bytes()) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let left_end = run_end(canonical, i);
                let right_end = run_end(genes, j);
                for _ in i..left_end {
                    joined.extend(genes[j..right_end].iter().map(JoinedRow::from));
                }
                i = left_end;
                j = right_end;
            }
        }
    }

    joined
}

/// End (exclusive) of the run of rows sharing `rows[start]`'s key
fn run_end<T: Keyed>(rows: &[T], start: usize) -> usize {
    let key = rows[start].key();
    start
        + rows[start..]
            .iter()
            .take_while(|row| row.key() == key)
            .count()
}

/// Render rows as output lines, sorted by first field, exact duplicates removed
///
/// Dedup compares the rendered lines, so rows whose fields differ but print
/// identically collapse. Ties on the first field are broken by the whole
/// line, which keeps identical lines adjacent and the order total.
pub fn sort_and_dedup(rows: &[JoinedRow]) -> Vec<String> {
    let mut lines: Vec<String> = rows.iter().map(ToString::to_string).collect();
    lines.sort_by(|a, b| {
        first_field(a)
            .as_bytes()
            .cmp(first_field(b).as_bytes())
            .then_with(|| a.as_bytes().cmp(b.as_bytes()))
    });
    lines.dedup();
    lines
}

fn first_field(line: &str) -> &str {
    line.split(' ').next().unwrap_or(line)
}

/// Write the header and `lines` to `writer`, one per line
pub fn write_rows<W: Write>(mut writer: W, lines: &[String]) -> std::io::Result<()> {
    writeln!(writer, "{}", HEADER)?;
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}

/// Write the output file at `path`, flushed and synced to disk
pub fn write_output(path: &Path, rows: &[String]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::filesystem(FS_WRITE_OUTPUT, path, e))?;
    let mut writer = BufWriter::new(file);
    write_rows(&mut writer, rows).map_err(|e| Error::filesystem(FS_WRITE_OUTPUT, path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| Error::filesystem(FS_WRITE_OUTPUT, path, e.into_error()))?;
    file.sync_all()
        .map_err(|e| Error::filesystem(FS_WRITE_OUTPUT, path, e))?;
    Ok(())
}

/// Move a finished file from the working directory to its final path
///
/// Falls back to copying through a temporary sibling of `dest` when a plain
/// rename is not possible (e.g. across filesystems), so `dest` is always
/// replaced atomically.
pub fn persist_output(staged: &Path, dest: &Path) -> Result<()> {
    if std::fs::rename(staged, dest).is_ok() {
        return Ok(());
    }

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut sibling = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| Error::filesystem(FS_PERSIST_OUTPUT, dest, e))?;
    let mut source =
        File::open(staged).map_err(|e| Error::filesystem(FS_PERSIST_OUTPUT, staged, e))?;
    std::io::copy(&mut source, sibling.as_file_mut())
        .map_err(|e| Error::filesystem(FS_PERSIST_OUTPUT, dest, e))?;
    sibling
        .as_file()
        .sync_all()
        .map_err(|e| Error::filesystem(FS_PERSIST_OUTPUT, dest, e))?;
    sibling
        .persist(dest)
        .map_err(|e| Error::filesystem(FS_PERSIST_OUTPUT, dest, e.error))?;
    Ok(())
}

/// Summarize the staged output, then move it to `dest`
///
/// The staged file is read before the move, so once `dest` exists nothing
/// else can fail.
pub fn publish(staged: &Path, dest: &Path, preview_lines: usize) -> Result<(usize, Vec<String>)> {
    let summary = read_back(staged, preview_lines)?;
    persist_output(staged, dest)?;
    Ok(summary)
}

/// Line count and leading lines of a written output file
pub fn read_back(path: &Path, preview_lines: usize) -> Result<(usize, Vec<String>)> {
    let file = File::open(path).map_err(|e| Error::filesystem(FS_READ_OUTPUT, path, e))?;
    let mut count = 0;
    let mut preview = Vec::with_capacity(preview_lines);
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::filesystem(FS_READ_OUTPUT, path, e))?;
        if preview.len() < preview_lines {
            preview.push(line);
        }
        count += 1;
    }
    Ok((count, preview))
}

/// Row counts produced by the transform stages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowCounts {
    /// Rows projected from the canonical table
    pub canonical: usize,
    /// Rows projected from the gene table
    pub genes: usize,
    /// Rows emitted by the join, duplicates included
    pub joined: usize,
    /// Rows written after dedup
    pub unique: usize,
}

/// Result of a successful run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Final output path
    pub output: PathBuf,
    /// Number of lines in the output, header included
    pub line_count: usize,
    /// Leading lines of the output
    pub preview: Vec<String>,
    /// Row counts per stage
    pub counts: RowCounts,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created {}", self.output.display())?;
        writeln!(f, "{} {}", self.line_count, self.output.display())?;
        for line in &self.preview {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Decompress, join and write, staging the output as `staged`
///
/// Blocking; run it off the async runtime.
pub fn transform(tables: &DownloadedTables, staged: &Path) -> Result<RowCounts> {
    debug!(stage = %Stage::Decompress, "projecting tables");
    let mut canonical = read_canonical_table(&tables.known_canonical)?;
    let mut genes = read_gene_table(&tables.known_gene)?;

    debug!(stage = %Stage::Sort, "sorting by transcript id");
    sort_by_key(&mut canonical);
    sort_by_key(&mut genes);

    debug!(stage = %Stage::Join, "joining");
    let joined = merge_join(&canonical, &genes);
    let lines = sort_and_dedup(&joined);

    debug!(stage = %Stage::Write, ?staged, "writing output");
    write_output(staged, &lines)?;

    Ok(RowCounts {
        canonical: canonical.len(),
        genes: genes.len(),
        joined: joined.len(),
        unique: lines.len(),
    })
}

/// Run the whole pipeline for `config`
///
/// On success the output exists at `config.output_path()` and the working
/// directory is gone. On failure nothing is written at the output path and
/// the working directory is removed as the guard drops.
pub async fn run(config: &Config) -> Result<Summary> {
    config.validate()?;
    let output = config.output_path();
    let work = WorkDir::create_in(&config.work_parent())?;

    info!(assembly = %config.assembly, output = ?output, "starting");

    let fetcher = Fetcher::new(config)?;
    let tables = fetcher.fetch_tables(config, work.path()).await?;

    let staged = work.join(
        &output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string()),
    );
    let counts = {
        let staged = staged.clone();
        tokio::task::spawn_blocking(move || transform(&tables, &staged))
            .await
            .map_err(|e| Error::Task(e.to_string()))??
    };
    info!(
        canonical = counts.canonical,
        genes = counts.genes,
        joined = counts.joined,
        unique = counts.unique,
        "joined tables"
    );

    let (line_count, preview) = publish(&staged, &output, config.preview_lines)?;
    work.close_or_warn();
    info!(output = ?output, lines = line_count, "done");

    Ok(Summary {
        output,
        line_count,
        preview,
        counts,
    })
}
