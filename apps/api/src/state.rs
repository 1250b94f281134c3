use std::sync::Arc;

use crate::matching::archive::DocumentArchive;
use crate::matching::cv_source::CvLoader;
use crate::matching::MatchingPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MatchingPipeline>,
    pub cv_loader: CvLoader,
    /// S3-compatible archive for generated PDFs. `None` when not configured.
    pub archive: Option<Arc<dyn DocumentArchive>>,
}
