//! Upload state machine.
//!
//! `Idle -> SizeChecked -> (ChunkedUpload | SimpleUpload) -> Completed`. A failed
//! transition returns the error instead of a state; the upload is then over
//! and a retry starts again from `Idle` with a new session.

use minsul_core::models::{UploadSession, UploadedFile};
use minsul_core::{UploadPolicy, UploadResult};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    SizeChecked {
        name: String,
        size: u64,
    },
    ChunkedUpload {
        session: UploadSession,
        next_index: u32,
    },
    SimpleUpload {
        name: String,
        size: u64,
    },
    Completed(UploadResult),
}

#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A file was handed to the orchestrator.
    Submit { name: String, size: u64 },
    /// Pick whole-file or chunked upload for the checked file.
    Route,
    /// The server accepted chunk `index`.
    ChunkAccepted { index: u32, file: UploadedFile },
    /// The server rejected chunk `index`.
    ChunkRejected { index: u32, status: u16, body: String },
    /// The whole-file upload succeeded.
    SimpleAccepted(UploadedFile),
    /// The whole-file upload was rejected.
    SimpleRejected { status: u16, body: String },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::SizeChecked { .. } => "size_checked",
            UploadState::ChunkedUpload { .. } => "chunked_upload",
            UploadState::SimpleUpload { .. } => "simple_upload",
            UploadState::Completed(_) => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Completed(_))
    }

    /// Apply one event.
    pub fn advance(self, event: UploadEvent, policy: &UploadPolicy) -> ClientResult<UploadState> {
        match (self, event) {
            (UploadState::Idle, UploadEvent::Submit { name, size }) => {
                if size > policy.max_file_size {
                    return Err(ClientError::FileTooLarge {
                        size,
                        max: policy.max_file_size,
                    });
                }
                Ok(UploadState::SizeChecked { name, size })
            }

            (UploadState::SizeChecked { name, size }, UploadEvent::Route) => {
                if size > policy.chunk_threshold {
                    Ok(UploadState::ChunkedUpload {
                        session: UploadSession::new(name, size, policy.chunk_size),
                        next_index: 0,
                    })
                } else {
                    Ok(UploadState::SimpleUpload { name, size })
                }
            }

            (
                UploadState::ChunkedUpload {
                    session,
                    next_index,
                },
                UploadEvent::ChunkAccepted { index, file },
            ) if index == next_index => {
                // The server's completion signal wins over our own chunk count.
                if let Some(url) = file.completed_url().map(str::to_string) {
                    return Ok(UploadState::Completed(UploadResult::from_response(
                        &url,
                        file,
                        &session.original_name,
                        session.original_size,
                    )));
                }
                let next_index = index + 1;
                if next_index >= session.total_chunks {
                    return Err(ClientError::UploadIncomplete {
                        total_chunks: session.total_chunks,
                    });
                }
                Ok(UploadState::ChunkedUpload {
                    session,
                    next_index,
                })
            }

            (
                UploadState::ChunkedUpload { next_index, .. },
                UploadEvent::ChunkRejected {
                    index,
                    status,
                    body,
                },
            ) if index == next_index => Err(ClientError::ChunkUploadFailed {
                index,
                status,
                body,
            }),

            (UploadState::SimpleUpload { name, size }, UploadEvent::SimpleAccepted(file)) => {
                match file.completed_url().map(str::to_string) {
                    Some(url) => Ok(UploadState::Completed(UploadResult::from_response(
                        &url, file, &name, size,
                    ))),
                    None => Err(ClientError::Decode(
                        "upload response did not include a file URL".to_string(),
                    )),
                }
            }

            (UploadState::SimpleUpload { .. }, UploadEvent::SimpleRejected { status, body }) => {
                Err(ClientError::UploadFailed { status, body })
            }

            (state, event) => Err(ClientError::InvalidTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }
}

impl UploadEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UploadEvent::Submit { .. } => "submit",
            UploadEvent::Route => "route",
            UploadEvent::ChunkAccepted { .. } => "chunk_accepted",
            UploadEvent::ChunkRejected { .. } => "chunk_rejected",
            UploadEvent::SimpleAccepted(_) => "simple_accepted",
            UploadEvent::SimpleRejected { .. } => "simple_rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minsul_core::constants::{KIB, MIB};

    fn policy() -> UploadPolicy {
        UploadPolicy::default()
    }

    fn submit(size: u64) -> ClientResult<UploadState> {
        let policy = policy();
        UploadState::Idle
            .advance(
                UploadEvent::Submit {
                    name: "file.bin".into(),
                    size,
                },
                &policy,
            )?
            .advance(UploadEvent::Route, &policy)
    }

    fn accepted(index: u32, url: &str) -> UploadEvent {
        UploadEvent::ChunkAccepted {
            index,
            file: UploadedFile {
                url: Some(url.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn small_files_use_simple_upload() {
        for size in [0, 1, MIB - 1, MIB] {
            assert!(matches!(submit(size), Ok(UploadState::SimpleUpload { .. })));
        }
    }

    #[test]
    fn large_files_are_chunked() {
        for size in [MIB + 1, 2 * MIB, 50 * MIB] {
            match submit(size) {
                Ok(UploadState::ChunkedUpload {
                    session,
                    next_index,
                }) => {
                    assert_eq!(next_index, 0);
                    assert_eq!(session.total_chunks as u64, size.div_ceil(512 * KIB));
                }
                other => panic!("expected chunked upload for {}, got {:?}", size, other),
            }
        }
    }

    #[test]
    fn oversized_files_are_rejected() {
        assert!(matches!(
            submit(50 * MIB + 1),
            Err(ClientError::FileTooLarge { size, .. }) if size == 50 * MIB + 1
        ));
    }

    #[test]
    fn empty_url_advances_to_next_chunk() {
        let state = submit(2 * MIB).unwrap();
        let state = state.advance(accepted(0, ""), &policy()).unwrap();
        assert!(matches!(
            state,
            UploadState::ChunkedUpload { next_index: 1, .. }
        ));
    }

    #[test]
    fn url_completes_even_before_last_chunk() {
        let state = submit(2 * MIB).unwrap();
        let state = state
            .advance(accepted(0, "/uploads/posts/a.bin"), &policy())
            .unwrap();
        match state {
            UploadState::Completed(result) => {
                assert_eq!(result.url, "/uploads/posts/a.bin");
                assert_eq!(result.size, 2 * MIB);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn last_chunk_without_url_is_incomplete() {
        let mut state = submit(2 * MIB).unwrap();
        for index in 0..3 {
            state = state.advance(accepted(index, ""), &policy()).unwrap();
        }
        assert!(matches!(
            state.advance(accepted(3, ""), &policy()),
            Err(ClientError::UploadIncomplete { total_chunks: 4 })
        ));
    }

    #[test]
    fn rejected_chunk_fails_with_index() {
        let state = submit(2 * MIB).unwrap();
        let state = state.advance(accepted(0, ""), &policy()).unwrap();
        let err = state
            .advance(
                UploadEvent::ChunkRejected {
                    index: 1,
                    status: 413,
                    body: "too big".into(),
                },
                &policy(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::ChunkUploadFailed { index: 1, status: 413, .. }
        ));
    }

    #[test]
    fn out_of_order_chunk_is_invalid() {
        let state = submit(2 * MIB).unwrap();
        assert!(matches!(
            state.advance(accepted(2, ""), &policy()),
            Err(ClientError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn simple_rejection_carries_status() {
        let state = submit(10).unwrap();
        assert!(matches!(
            state.advance(
                UploadEvent::SimpleRejected {
                    status: 500,
                    body: "boom".into()
                },
                &policy()
            ),
            Err(ClientError::UploadFailed { status: 500, .. })
        ));
    }

    #[test]
    fn simple_success_without_url_is_an_error() {
        let state = submit(10).unwrap();
        assert!(matches!(
            state.advance(UploadEvent::SimpleAccepted(UploadedFile::default()), &policy()),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn completed_state_accepts_no_events() {
        let state = UploadState::Completed(UploadResult::from_response(
            "/u",
            UploadedFile::default(),
            "a.txt",
            1,
        ));
        assert!(state.is_terminal());
        assert!(matches!(
            state.advance(UploadEvent::Route, &policy()),
            Err(ClientError::InvalidTransition {
                state: "completed",
                event: "route"
            })
        ));
    }
}
