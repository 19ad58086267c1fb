//! Photo Service
//!
//! Photo-sharing backend: users publish posts with text, images and an
//! optional location, then comment on and like each other's posts.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod geocoding;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod serialization;
pub mod services;
pub mod storage;

pub use app_state::AppState;
pub use config::Config;
pub use error::{AppError, Result};
