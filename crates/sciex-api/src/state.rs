//! Application state management
//!
//! Author: hephaex@gmail.com

use sciex_core::{AppConfig, Result};
use sciex_extractor::{ExtractionPipeline, LexiconModel};
use std::sync::Arc;
use std::time::Instant;

use crate::upload::UploadStore;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Extraction pipeline, absent when the model failed to load at startup
    pub pipeline: Option<ExtractionPipeline>,
    /// Upload storage
    pub uploads: UploadStore,
}

impl AppState {
    /// Create state around an already constructed pipeline
    pub fn new(config: AppConfig, pipeline: Option<ExtractionPipeline>) -> Result<Self> {
        let uploads = UploadStore::open(&config.upload.dir)?;

        Ok(Self {
            config,
            start_time: Instant::now(),
            pipeline,
            uploads,
        })
    }

    /// Load the configured model once and build the state around it.
    ///
    /// A model that cannot be loaded is logged and leaves the server running
    /// without a pipeline; extraction requests then fail until restart.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let pipeline = match LexiconModel::load(&config.model.path) {
            Ok(model) => {
                tracing::info!(
                    "Loaded NER model '{}' ({} terms, {} patterns)",
                    sciex_extractor::EntityRecognizer::name(&model),
                    model.term_count(),
                    model.pattern_count()
                );
                Some(ExtractionPipeline::new(
                    Arc::new(model),
                    config.context.window_size,
                ))
            }
            Err(e) => {
                tracing::error!("NER model unavailable, extraction disabled: {}", e);
                None
            }
        };

        Self::new(config, pipeline)
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
