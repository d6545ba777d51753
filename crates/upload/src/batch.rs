//! Uploads an ordered list of files, one session per file.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mediasend_protocol::MediaId;
use mediasend_transfer::{FALLBACK_CONTENT_TYPE, SNIFF_LEN, detect_content_type, validate_media_size};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::session::UploadSession;
use crate::transport::MediaTransport;
use crate::types::UploadEvent;

/// Whether `content_type` must be the only media item of a post.
pub fn is_special_media(content_type: &str) -> bool {
    content_type.contains("video") || content_type.contains("gif")
}

/// A file opened, measured and typed, rewound to its start.
struct OpenedMedia {
    file: File,
    size: u64,
    content_type: String,
}

/// Runs one [`UploadSession`] per file, in order.
pub struct MediaBatch {
    transport: Arc<dyn MediaTransport>,
    config: UploadConfig,
    events: Option<mpsc::Sender<UploadEvent>>,
}

impl MediaBatch {
    pub fn new(transport: Arc<dyn MediaTransport>, config: UploadConfig) -> Self {
        Self {
            transport,
            config,
            events: None,
        }
    }

    /// Forwards every session's events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<UploadEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Uploads `paths` and returns their media ids in order.
    ///
    /// A video or GIF replaces every id collected before it and ends the
    /// batch; later paths are skipped. The first failure aborts the batch.
    pub async fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<MediaId>, UploadError> {
        if paths.is_empty() {
            return Err(UploadError::NoMedia);
        }

        let mut ids = Vec::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            let media = self.open_media(path).await?;
            info!(
                path = %path.display(),
                size = media.size,
                content_type = %media.content_type,
                "uploading media"
            );

            let special = is_special_media(&media.content_type);
            let mut session = UploadSession::new(
                Arc::clone(&self.transport),
                self.config.clone(),
                media.size,
                media.content_type,
            );
            if let Some(tx) = &self.events {
                session = session.with_events(tx.clone());
            }
            let media_id = session.run(media.file).await?;

            if special {
                if !ids.is_empty() {
                    warn!(
                        replaced = ids.len(),
                        "video or GIF replaces previously uploaded media"
                    );
                }
                let skipped = &paths[i + 1..];
                if !skipped.is_empty() {
                    warn!(
                        skipped = skipped.len(),
                        "only one video or GIF can be attached; ignoring remaining files"
                    );
                }
                return Ok(vec![media_id]);
            }
            ids.push(media_id);
        }

        Ok(ids)
    }

    async fn open_media(&self, path: &Path) -> Result<OpenedMedia, UploadError> {
        let mut file = File::open(path).await?;
        let size = file.metadata().await?.len();
        validate_media_size(size, self.config.max_media_bytes)?;

        let mut head = Vec::with_capacity(SNIFF_LEN);
        (&mut file).take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
        let content_type = match detect_content_type(&head, Some(path)) {
            Ok(ct) => ct,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    "{e}; using {FALLBACK_CONTENT_TYPE}"
                );
                FALLBACK_CONTENT_TYPE.to_string()
            }
        };
        file.seek(SeekFrom::Start(0)).await?;
        debug!(path = %path.display(), %content_type, "media opened");

        Ok(OpenedMedia {
            file,
            size,
            content_type,
        })
    }
}
