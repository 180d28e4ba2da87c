/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{CreatePostRequest, PostResponse};
use crate::services::PostService;

/// Create a new post, optionally linked to an uploaded short video
pub async fn create_post(
    service: web::Data<PostService>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service.create_post(user_id.0, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// Get a post by ID
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = service
        .get_post(*post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}
