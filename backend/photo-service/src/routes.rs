//! Route configuration
//!
//! Health probes are public; everything under `/api` requires a bearer token.

use crate::error::AppError;
use crate::handlers;
use crate::middleware::JwtAuthMiddleware;
use actix_web::web;

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(form_config())
        .app_data(query_config())
        .app_data(path_config())
        .route("/health", web::get().to(handlers::health_check))
        .route("/health/ready", web::get().to(handlers::readiness_check))
        .route("/health/live", web::get().to(handlers::liveness_check))
        .service(
            web::scope("/api")
                .wrap(JwtAuthMiddleware)
                .service(
                    web::resource("/posts")
                        .route(web::get().to(handlers::list_posts))
                        .route(web::post().to(handlers::create_post)),
                )
                .service(
                    web::resource("/posts/{id}")
                        .route(web::get().to(handlers::get_post))
                        .route(web::put().to(handlers::update_post))
                        .route(web::patch().to(handlers::update_post))
                        .route(web::delete().to(handlers::delete_post)),
                )
                .route("/posts/{id}/like", web::post().to(handlers::like_post))
                .service(
                    web::resource("/posts/{post_id}/comments")
                        .route(web::get().to(handlers::list_comments))
                        .route(web::post().to(handlers::create_comment)),
                )
                .service(
                    web::resource("/posts/{post_id}/comments/{id}")
                        .route(web::get().to(handlers::get_comment))
                        .route(web::put().to(handlers::update_comment))
                        .route(web::patch().to(handlers::update_comment))
                        .route(web::delete().to(handlers::delete_comment)),
                ),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn form_config() -> web::FormConfig {
    web::FormConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(err.to_string()).into())
}
