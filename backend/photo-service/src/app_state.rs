//! Shared application state
//!
//! Everything handlers need, behind trait objects so the HTTP layer can be
//! driven with other backends in tests.

use crate::config::MediaConfig;
use crate::db::PhotoRepository;
use crate::geocoding::ReverseGeocoder;
use crate::storage::MediaStorage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PhotoRepository>,
    pub storage: Arc<dyn MediaStorage>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub media: MediaConfig,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn PhotoRepository>,
        storage: Arc<dyn MediaStorage>,
        geocoder: Arc<dyn ReverseGeocoder>,
        media: MediaConfig,
    ) -> Self {
        Self {
            repo,
            storage,
            geocoder,
            media,
        }
    }
}
