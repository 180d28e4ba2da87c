/// HTTP handlers for shorts-service endpoints
///
/// This module contains handlers for:
/// - Posts: create and fetch posts (JWT protected)
/// - Shorts: encoding-provider webhook and shorts lookup
use actix_web::{web, HttpResponse};

use crate::middleware::JwtAuthMiddleware;

pub mod posts;
pub mod shorts;

pub use posts::{create_post, get_post};
pub use shorts::{encoding_callback, get_shorts};

/// Mount every API route under `/api/v1`.
///
/// The encoding webhook is called by the provider and carries no user token,
/// so only the post routes sit behind `auth`.
pub fn register_routes(cfg: &mut web::ServiceConfig, auth: JwtAuthMiddleware) {
    cfg.service(
        web::scope("/api/v1")
            .route(
                "/health",
                web::get()
                    .to(|| async { HttpResponse::Ok().json(serde_json::json!({"status": "ok"})) }),
            )
            .route(
                "/health/ready",
                web::get().to(|| async { HttpResponse::Ok().finish() }),
            )
            .route(
                "/health/live",
                web::get().to(|| async { HttpResponse::Ok().finish() }),
            )
            .service(
                web::scope("/shorts")
                    .route("/encoding-callback", web::post().to(encoding_callback))
                    .route("/{upload_key}", web::get().to(get_shorts)),
            )
            .service(
                web::scope("/posts")
                    .wrap(auth)
                    .route("", web::post().to(create_post))
                    .route("/{id}", web::get().to(get_post)),
            ),
    );
}
