//! Core types for known-canonical

use std::fmt;

/// Pipeline stage, used to attribute errors and log progress
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Config validation and working directory creation
    Setup,
    /// Downloading the upstream tables
    Fetch,
    /// Decompressing and projecting table rows
    Decompress,
    /// Sorting projected rows by transcript id
    Sort,
    /// Merge-joining canonical ids against gene rows
    Join,
    /// Writing and moving the output file
    Write,
    /// Removing the working directory
    Cleanup,
}

impl Stage {
    /// Lowercase stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Fetch => "fetch",
            Stage::Decompress => "decompress",
            Stage::Sort => "sort",
            Stage::Join => "join",
            Stage::Write => "write",
            Stage::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two upstream UCSC tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    /// `knownGene`: one row per transcript with coordinates and exon count
    KnownGene,
    /// `knownCanonical`: one row per gene cluster naming its canonical transcript
    KnownCanonical,
}

impl Table {
    /// Upstream table name
    pub fn name(&self) -> &'static str {
        match self {
            Table::KnownGene => "knownGene",
            Table::KnownCanonical => "knownCanonical",
        }
    }

    /// Name of the compressed dump on the download host
    pub fn file_name(&self) -> String {
        format!("{}.txt.gz", self.name())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
