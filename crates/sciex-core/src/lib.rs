//! SCIEX Core - Domain models, errors, and shared configuration
//!
//! This crate defines the abstractions shared by the extraction pipeline
//! and its front ends:
//! - The `ContextRecord` output unit returned to clients
//! - The `SciexError` umbrella error type
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, ContextConfig, LoggingConfig, ModelConfig, ServerConfig, UploadConfig,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for SCIEX operations
#[derive(Error, Debug)]
pub enum SciexError {
    /// Request did not carry a usable file
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Uploaded file is not a PDF
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// PDF could not be opened or its text could not be read
    #[error("Text extraction failed: {0}")]
    Extraction(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// NER model artifact is missing or unreadable
    #[error("NER model unavailable at {}", path.display())]
    ModelUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// NER model artifact exists but cannot be used
    #[error("Invalid NER model: {0}")]
    InvalidModel(String),

    /// Model inference failed
    #[error("Entity recognition failed: {0}")]
    Recognition(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SciexError>;

// ============================================================================
// Output Records
// ============================================================================

/// A recognized entity together with its offsets and surrounding context
///
/// `start` and `end` are char offsets into the normalized document text,
/// so `text` equals the chars in `start..end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContextRecord {
    /// Entity surface text
    #[schema(example = "Aspirin")]
    pub text: String,

    /// Char offset where the entity starts
    #[schema(example = 26)]
    pub start: usize,

    /// Char offset one past the entity's last char
    #[schema(example = 33)]
    pub end: usize,

    /// Enclosing sentence or character window, whitespace-collapsed
    #[schema(example = "Patients received 10mg of Aspirin daily.")]
    pub context: String,
}
