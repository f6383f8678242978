//! Shared application state for the web server.

use std::sync::Arc;

use specimen_core::{
    Config, Database, ImageProcessor, MediaStore, ObservationSink, SpeciesClassifier,
};

use super::auth::SessionStore;

/// Ten years; longer lifetimes are clamped.
const MAX_SESSION_TTL_MINUTES: u64 = 60 * 24 * 365 * 10;

/// Everything a handler needs. Cloned per request; all fields are cheap
/// handles.
#[derive(Clone)]
pub struct AppState {
    /// Validate → decode → classify
    pub processor: ImageProcessor,
    /// Users and observation listing
    pub db: Database,
    /// Where new observations are recorded
    pub sink: Arc<dyn ObservationSink>,
    /// Uploaded photo storage
    pub media: MediaStore,
    pub sessions: Arc<SessionStore>,
    /// URL prefix for media files, with leading and trailing `/`
    pub media_url: String,
}

impl AppState {
    pub fn new(config: &Config, classifier: Arc<SpeciesClassifier>, db: Database) -> Self {
        let ttl_minutes = config.server.session_ttl_minutes.min(MAX_SESSION_TTL_MINUTES) as i64;
        Self {
            processor: ImageProcessor::new(config, classifier),
            sink: Arc::new(db.clone()),
            db,
            media: MediaStore::new(config.media_root()),
            sessions: Arc::new(SessionStore::new(chrono::Duration::minutes(ttl_minutes))),
            media_url: config.server.media_url.clone(),
        }
    }
}
