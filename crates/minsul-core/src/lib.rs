//! Minsul Core Library
//!
//! This crate provides the domain models, client configuration, upload policy and
//! permission checks shared by the Minsul API client and CLI. It performs no I/O
//! beyond reading the process environment.

pub mod config;
pub mod constants;
pub mod models;
pub mod permissions;

// Re-export commonly used types
pub use config::{ClientConfig, PolicyError, UploadPolicy};
pub use models::{
    ApiResponse, Pagination, ServiceType, TokenPair, UploadCategory, UploadResult, UploadSession,
};
