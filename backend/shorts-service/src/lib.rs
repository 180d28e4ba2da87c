//! Shorts Service
//!
//! Links short-video uploads to posts. Posts and encoding callbacks arrive in
//! either order; both paths reconcile onto one Shorts record per upload key
//! and push a notification for every encoding state change.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
