//! HTTP download of the upstream table dumps

use crate::config::Config;
use crate::error::{Error, FS_WRITE_DOWNLOAD, FetchError, Result};
use crate::types::Table;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

/// Local copies of both downloaded dumps
#[derive(Clone, Debug)]
pub struct DownloadedTables {
    /// Path of `knownGene.txt.gz`
    pub known_gene: PathBuf,
    /// Path of `knownCanonical.txt.gz`
    pub known_canonical: PathBuf,
}

/// HTTP client for the table downloads
///
/// No retries: any failed transfer is returned to the caller as fatal.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build a client with the configured User-Agent and optional timeout
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Error::Config {
            message: format!("failed to create HTTP client: {}", e),
            key: None,
        })?;
        Ok(Self { client })
    }

    /// Download `url` into `dest`, returning the number of bytes written
    ///
    /// Fails on transport errors, non-2xx statuses and empty bodies. A
    /// partially written `dest` is left for the working directory guard to
    /// remove.
    pub async fn fetch_to_file(&self, url: &Url, dest: &Path) -> Result<u64> {
        debug!(url = %url, ?dest, "fetching");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::filesystem(FS_WRITE_DOWNLOAD, dest, e))?;

        let mut bytes: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(url, &e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::filesystem(FS_WRITE_DOWNLOAD, dest, e))?;
            bytes += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Error::filesystem(FS_WRITE_DOWNLOAD, dest, e))?;

        if bytes == 0 {
            return Err(FetchError::Empty {
                url: url.to_string(),
            }
            .into());
        }

        info!(url = %url, bytes, "downloaded");
        Ok(bytes)
    }

    /// Download one table into `dir`, named after its upstream dump
    pub async fn fetch_table(&self, config: &Config, table: Table, dir: &Path) -> Result<PathBuf> {
        let url = config.table_url(table)?;
        let dest = dir.join(table.file_name());
        self.fetch_to_file(&url, &dest).await?;
        Ok(dest)
    }

    /// Download both tables into `dir`, canonical table first
    pub async fn fetch_tables(&self, config: &Config, dir: &Path) -> Result<DownloadedTables> {
        let known_canonical = self.fetch_table(config, Table::KnownCanonical, dir).await?;
        let known_gene = self.fetch_table(config, Table::KnownGene, dir).await?;
        Ok(DownloadedTables {
            known_gene,
            known_canonical,
        })
    }
}

fn transport_error(url: &Url, e: &reqwest::Error) -> Error {
    let reason = if e.is_timeout() {
        format!("timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    FetchError::Transport {
        url: url.to_string(),
        reason,
    }
    .into()
}
