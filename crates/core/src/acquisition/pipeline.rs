//! The download-and-convert pipeline for wanted records.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::config::AcquisitionConfig;
use super::error::{AcquireError, DownloadError};
use super::types::{AcquireStatus, AcquisitionSummary};
use crate::converter::{content_id, ConverterError, SongConverter};
use crate::metrics;
use crate::retry::RetryPolicy;
use crate::source::FetchError;
use crate::store::{SongStore, WantedSong};

/// Acquires every record marked wanted but not yet downloaded.
///
/// Records are processed one at a time so no two steps ever write to the
/// same record concurrently; each step (existence check, download, import,
/// package) retries independently under the shared policy, and a failure in
/// one record never affects its siblings.
pub struct AcquisitionPipeline {
    store: Arc<dyn SongStore>,
    converter: Arc<dyn SongConverter>,
    client: Client,
    policy: RetryPolicy,
    config: AcquisitionConfig,
}

impl AcquisitionPipeline {
    pub fn new(
        config: AcquisitionConfig,
        store: Arc<dyn SongStore>,
        converter: Arc<dyn SongConverter>,
        policy: RetryPolicy,
    ) -> Result<Self, AcquireError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AcquireError::Setup(e.to_string()))?;

        Ok(Self {
            store,
            converter,
            client,
            policy,
            config,
        })
    }

    /// Runs one acquisition pass over the wanted set.
    pub async fn run(&self) -> Result<AcquisitionSummary, AcquireError> {
        let ids = self.store.wanted_undownloaded()?;
        if ids.is_empty() {
            info!("no wanted songs awaiting acquisition");
            return Ok(AcquisitionSummary::default());
        }

        let songs = self.store.lookup(&ids)?;
        info!(count = songs.len(), "starting acquisition run");

        tokio::fs::create_dir_all(&self.config.download_dir)
            .await
            .map_err(|e| AcquireError::Setup(e.to_string()))?;

        let mut summary = AcquisitionSummary {
            attempted: songs.len(),
            ..Default::default()
        };

        for song in &songs {
            let started = std::time::Instant::now();
            let result = self.acquire_one(song).await;
            let result_label = match &result {
                Ok(AcquireStatus::Completed { .. }) => "success",
                Ok(AcquireStatus::Skipped) => "skipped",
                Err(_) => "failed",
            };
            metrics::ACQUISITION_DURATION
                .with_label_values(&[result_label])
                .observe(started.elapsed().as_secs_f64());

            match result {
                Ok(AcquireStatus::Completed { package_path }) => {
                    info!(
                        file_id = %song.file_id,
                        package = %package_path.display(),
                        "song acquired"
                    );
                    metrics::DOWNLOADS_TOTAL.with_label_values(&["success"]).inc();
                    summary.completed += 1;
                }
                Ok(AcquireStatus::Skipped) => {
                    metrics::DOWNLOADS_TOTAL.with_label_values(&["skipped"]).inc();
                    summary.skipped += 1;
                }
                // Store unreachability is the one failure that kills the run.
                Err(AcquireError::Store(e)) => return Err(AcquireError::Store(e)),
                Err(e) => {
                    warn!(file_id = %song.file_id, error = %e, "failed to acquire song");
                    metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                    summary.failed += 1;
                }
            }
        }

        info!(
            attempted = summary.attempted,
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            "acquisition run finished"
        );

        Ok(summary)
    }

    /// Drives one record through check, download, convert and record.
    async fn acquire_one(&self, song: &WantedSong) -> Result<AcquireStatus, AcquireError> {
        if song.download_url.is_empty() {
            warn!(file_id = %song.file_id, "record carries no download URL, skipping");
            return Ok(AcquireStatus::Skipped);
        }

        let url = self.absolute_url(&song.download_url);

        if !self.asset_is_live(&song.file_id, &url).await? {
            info!(file_id = %song.file_id, "asset not yet published, skipping for now");
            return Ok(AcquireStatus::Skipped);
        }

        let archive = self.download(&song.file_id, &url).await?;

        let id = content_id(&song.artist, &song.title);
        let import_dir = self
            .run_converter_step(&song.file_id, "import", || {
                let converter = Arc::clone(&self.converter);
                let archive = archive.clone();
                async move { converter.import(&archive).await }
            })
            .await?;

        let package_path = self
            .run_converter_step(&song.file_id, "package", || {
                let converter = Arc::clone(&self.converter);
                let id = id.clone();
                let import_dir = import_dir.clone();
                async move { converter.package(&id, &import_dir).await }
            })
            .await?;

        // The intermediate representation has served its purpose.
        if let Err(e) = tokio::fs::remove_dir_all(&import_dir).await {
            warn!(
                file_id = %song.file_id,
                path = %import_dir.display(),
                error = %e,
                "failed to remove import directory"
            );
        }

        self.store
            .record_download_path(&song.file_id, &package_path.to_string_lossy())?;

        Ok(AcquireStatus::Completed { package_path })
    }

    /// Resolves a listing download URL against the asset host.
    fn absolute_url(&self, download_url: &str) -> String {
        if download_url.starts_with("http://") || download_url.starts_with("https://") {
            download_url.to_string()
        } else {
            format!(
                "{}{}",
                self.config.asset_base_url.trim_end_matches('/'),
                download_url
            )
        }
    }

    /// Lightweight existence check against the asset URL.
    ///
    /// An error status means the asset is not published yet, which is a
    /// skip, not a failure. Connection problems retry like any fetch.
    async fn asset_is_live(&self, file_id: &str, url: &str) -> Result<bool, AcquireError> {
        let head_timeout = Duration::from_secs(self.config.head_timeout_secs);
        self.policy
            .run("head_check", |_| {
                let client = self.client.clone();
                let url = url.to_string();
                async move {
                    let response = client
                        .head(&url)
                        .timeout(head_timeout)
                        .send()
                        .await
                        .map_err(|e| DownloadError::Http(FetchError::from_request(e)))?;

                    let status = response.status();
                    Ok::<bool, DownloadError>(
                        !status.is_client_error() && !status.is_server_error(),
                    )
                }
            })
            .await
            .map_err(|source| AcquireError::Download {
                file_id: file_id.to_string(),
                source,
            })
    }

    /// Streams the asset into the staging directory, named by file id.
    async fn download(&self, file_id: &str, url: &str) -> Result<PathBuf, AcquireError> {
        let staging_path = self.config.download_dir.join(file_id);
        debug!(file_id, url, staging = %staging_path.display(), "downloading asset");

        self.policy
            .run("download_asset", |_| {
                let client = self.client.clone();
                let url = url.to_string();
                let path = staging_path.clone();
                async move {
                    let response = client
                        .get(&url)
                        .send()
                        .await
                        .map_err(|e| DownloadError::Http(FetchError::from_request(e)))?;

                    let status = response.status();
                    if !status.is_success() {
                        return Err(DownloadError::Http(FetchError::from_status(
                            status.as_u16(),
                        )));
                    }

                    let mut file = tokio::fs::File::create(&path).await?;
                    let mut stream = response.bytes_stream();
                    while let Some(chunk) = stream.next().await {
                        let chunk =
                            chunk.map_err(|e| DownloadError::Http(FetchError::from_request(e)))?;
                        file.write_all(&chunk).await?;
                    }
                    file.flush().await?;

                    Ok(path)
                }
            })
            .await
            .map_err(|source| AcquireError::Download {
                file_id: file_id.to_string(),
                source,
            })
    }

    /// Runs one converter step under the retry policy, with metrics.
    async fn run_converter_step<F, Fut>(
        &self,
        file_id: &str,
        step: &'static str,
        make: F,
    ) -> Result<PathBuf, AcquireError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<PathBuf, ConverterError>>,
    {
        let result = self.policy.run(step, |_| make()).await;

        match &result {
            Ok(_) => metrics::CONVERSIONS_TOTAL
                .with_label_values(&[step, "success"])
                .inc(),
            Err(_) => metrics::CONVERSIONS_TOTAL
                .with_label_values(&[step, "failed"])
                .inc(),
        }

        result.map_err(|source| AcquireError::Convert {
            file_id: file_id.to_string(),
            source,
        })
    }
}
