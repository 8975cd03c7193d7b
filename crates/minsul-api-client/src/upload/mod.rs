//! File uploads.
//!
//! Files up to the chunk threshold go up in one multipart request under a
//! wall-clock deadline. Larger files are split into fixed-size chunks sent
//! strictly in order, each as its own authenticated request; the server
//! reassembles them and reports the final URL on the response that completes
//! the file. Nothing is retried: any failure ends the upload.

mod source;
mod state;

pub use source::UploadSource;
pub use state::{UploadEvent, UploadState};

use bytes::Bytes;
use minsul_core::models::{mime_from_filename, UploadProgress, UploadSession, UploadedFile};
use minsul_core::{ApiResponse, UploadCategory, UploadResult};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::RequestOptions;
use crate::error::{ClientError, ClientResult};
use crate::ApiClient;

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Per-upload knobs supplied by the caller.
#[derive(Clone, Default)]
pub struct UploadOptions {
    pub cancel: Option<CancellationToken>,
    pub on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("cancel", &self.cancel)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    async fn cancelled(&self) {
        match &self.cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    }

    fn report(&self, progress: UploadProgress) {
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }
}

impl ApiClient {
    /// Upload a local file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        category: UploadCategory,
    ) -> ClientResult<UploadResult> {
        let source = UploadSource::open(path).await?;
        self.upload(&source, category, &UploadOptions::default())
            .await
    }

    /// Upload an in-memory buffer under `name`.
    pub async fn upload_bytes(
        &self,
        name: &str,
        data: impl Into<bytes::Bytes>,
        category: UploadCategory,
    ) -> ClientResult<UploadResult> {
        let source = UploadSource::from_bytes(name, data);
        self.upload(&source, category, &UploadOptions::default())
            .await
    }

    /// Upload `source` to `category`, choosing whole-file or chunked transfer by size.
    pub async fn upload(
        &self,
        source: &UploadSource,
        category: UploadCategory,
        options: &UploadOptions,
    ) -> ClientResult<UploadResult> {
        let policy = self.upload_policy();
        policy.validate()?;
        let state = UploadState::Idle
            .advance(
                UploadEvent::Submit {
                    name: source.name().to_string(),
                    size: source.size(),
                },
                policy,
            )
            .inspect_err(|e| warn!(file = %source.name(), error = %e, "upload rejected"))?
            .advance(UploadEvent::Route, policy)?;

        let result = match state {
            UploadState::ChunkedUpload { .. } => {
                self.run_chunked(state, source, category, options).await
            }
            UploadState::SimpleUpload { .. } => {
                self.run_simple(state, source, category, options).await
            }
            other => Err(ClientError::InvalidTransition {
                state: other.name(),
                event: UploadEvent::Route.name(),
            }),
        };

        match &result {
            Ok(uploaded) => info!(
                file = %source.name(),
                category = %category,
                url = %uploaded.url,
                "upload completed"
            ),
            Err(e) => warn!(
                file = %source.name(),
                category = %category,
                error_code = e.error_code(),
                error = %e,
                "upload failed"
            ),
        }
        result
    }

    async fn run_chunked(
        &self,
        mut state: UploadState,
        source: &UploadSource,
        category: UploadCategory,
        options: &UploadOptions,
    ) -> ClientResult<UploadResult> {
        let policy = self.upload_policy();
        if let UploadState::ChunkedUpload { session, .. } = &state {
            info!(
                temp_file_id = %session.temp_file_id,
                total_chunks = session.total_chunks,
                size = session.original_size,
                "starting chunked upload"
            );
        }

        loop {
            let event = match &state {
                UploadState::Completed(_) => break,
                UploadState::ChunkedUpload {
                    session,
                    next_index,
                } => {
                    let index = *next_index;
                    if index > 0 {
                        self.pause_between_chunks(policy.inter_chunk_delay, options)
                            .await?;
                    }
                    if options.is_cancelled() {
                        return Err(ClientError::Cancelled);
                    }

                    let event = self.send_chunk(source, session, index, category).await?;
                    if let UploadEvent::ChunkAccepted { .. } = event {
                        options.report(UploadProgress {
                            chunks_sent: index + 1,
                            total_chunks: session.total_chunks,
                            bytes_sent: session.chunk_range(index).end,
                            total_bytes: session.original_size,
                        });
                    }
                    event
                }
                other => {
                    return Err(ClientError::InvalidTransition {
                        state: other.name(),
                        event: "chunk",
                    })
                }
            };
            state = state.advance(event, policy)?;
        }

        match state {
            UploadState::Completed(result) => Ok(result),
            other => Err(ClientError::InvalidTransition {
                state: other.name(),
                event: "finish",
            }),
        }
    }

    async fn pause_between_chunks(
        &self,
        delay: Duration,
        options: &UploadOptions,
    ) -> ClientResult<()> {
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = options.cancelled() => Err(ClientError::Cancelled),
        }
    }

    async fn send_chunk(
        &self,
        source: &UploadSource,
        session: &UploadSession,
        index: u32,
        category: UploadCategory,
    ) -> ClientResult<UploadEvent> {
        let data = source.read_range(session.chunk_range(index)).await?;
        debug!(
            temp_file_id = %session.temp_file_id,
            chunk = index,
            bytes = data.len(),
            "sending chunk"
        );

        let form = Form::new()
            .part("file", file_part(&session.original_name, data)?)
            .text("chunkIndex", index.to_string())
            .text("totalChunks", session.total_chunks.to_string())
            .text("tempFileId", session.temp_file_id.clone())
            .text("originalSize", session.original_size.to_string())
            .text("originalName", session.original_name.clone());

        let response = self
            .authenticated_fetch(
                Method::POST,
                &category.chunk_path(),
                RequestOptions::new().multipart(form),
            )
            .await?;

        Ok(match read_upload_response(response, "Chunk upload failed").await? {
            Ok(file) => UploadEvent::ChunkAccepted { index, file },
            Err((status, body)) => UploadEvent::ChunkRejected {
                index,
                status,
                body,
            },
        })
    }

    async fn run_simple(
        &self,
        state: UploadState,
        source: &UploadSource,
        category: UploadCategory,
        options: &UploadOptions,
    ) -> ClientResult<UploadResult> {
        let policy = self.upload_policy();
        let deadline = policy.simple_upload_timeout;
        if options.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let attempt = async {
            let data = source.read_all().await?;
            let form = Form::new().part("file", file_part(source.name(), data)?);
            let response = self
                .authenticated_fetch(
                    Method::POST,
                    &category.upload_path(),
                    RequestOptions::new().multipart(form).timeout(deadline),
                )
                .await?;
            read_upload_response(response, "File upload failed").await
        };

        let outcome = tokio::select! {
            outcome = tokio::time::timeout(deadline, attempt) => outcome,
            _ = options.cancelled() => return Err(ClientError::Cancelled),
        };

        let event = match outcome {
            Ok(Ok(Ok(file))) => UploadEvent::SimpleAccepted(file),
            Ok(Ok(Err((status, body)))) => UploadEvent::SimpleRejected { status, body },
            Ok(Err(ClientError::Http(e))) if e.is_timeout() => {
                return Err(ClientError::UploadTimeout(deadline))
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ClientError::UploadTimeout(deadline)),
        };

        let state = state.advance(event, policy)?;
        match state {
            UploadState::Completed(result) => {
                options.report(UploadProgress {
                    chunks_sent: 1,
                    total_chunks: 1,
                    bytes_sent: source.size(),
                    total_bytes: source.size(),
                });
                Ok(result)
            }
            other => Err(ClientError::InvalidTransition {
                state: other.name(),
                event: "finish",
            }),
        }
    }
}

/// Multipart file part over the chunk buffer, without copying it.
fn file_part(name: &str, data: Bytes) -> ClientResult<Part> {
    let len = data.len() as u64;
    Ok(Part::stream_with_length(data, len)
        .file_name(name.to_string())
        .mime_str(mime_from_filename(name))?)
}

/// Split an upload response into the accepted file or `(status, body)`.
///
/// A 2xx response whose envelope reports `success: false` counts as rejected,
/// with the backend message as body.
async fn read_upload_response(
    response: Response,
    fallback: &str,
) -> ClientResult<Result<UploadedFile, (u16, String)>> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Ok(Err((status.as_u16(), body)));
    }

    let envelope: ApiResponse<UploadedFile> = serde_json::from_str(&body)
        .map_err(|e| ClientError::Decode(format!("Invalid upload response: {}", e)))?;
    if !envelope.success {
        return Ok(Err((status.as_u16(), envelope.error_message(fallback))));
    }
    Ok(Ok(envelope.data.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_part_keeps_chunk_length() {
        let chunk = Bytes::from_static(b"0123456789abcdef").slice(4..12);
        let form = Form::new().part("file", file_part("photo.png", chunk).unwrap());
        let boundary = form.boundary().to_string();

        let request = reqwest::Client::new()
            .post("http://localhost/upload")
            .multipart(form)
            .build()
            .unwrap();
        let length = request
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap();
        let framing = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n\r\n--{b}--\r\n",
            b = boundary
        );
        assert_eq!(length, framing.len() + 8);
    }
}
