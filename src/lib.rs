//! # known-canonical
//!
//! Builds a table of canonical transcripts and their coordinates from the
//! UCSC `knownGene` and `knownCanonical` dumps of one genome assembly.
//!
//! The pipeline downloads both gzip dumps, projects the needed columns into
//! typed rows, merge-joins them on transcript id, sorts and deduplicates the
//! result and writes it under a fixed header:
//!
//! ```text
//! Transcript(ucsc/known) exons start end
//! uc001aaa.3 3 11873 14409
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use known_canonical::{Config, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         assembly: "hg19".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let summary = run(&config).await?;
//!     print!("{summary}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Table downloads
pub mod fetch;
/// Sort, join, dedup and write stages
pub mod pipeline;
/// Decompression and column projection
pub mod table;
/// Core types
pub mod types;
/// Scoped working directory
pub mod workdir;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, FetchError, FilesystemError, MalformedRowError, Result};
pub use pipeline::{HEADER, JoinedRow, RowCounts, Summary, run};
pub use table::{CanonicalRow, GeneRow};
pub use types::{Stage, Table};
