/// Service layer for posts and shorts
///
/// This module provides business logic for:
/// - Shorts service: post/encoding reconciliation
/// - Post service: post creation
/// - Notifications: queued encoding-state pushes
pub mod notifications;
pub mod posts;
pub mod shorts;

pub use notifications::{
    EncodeStateNotifier, HttpNotificationClient, NotificationDispatcher, NotificationError,
    NotificationSink, RetryPolicy,
};
pub use posts::PostService;
pub use shorts::{upload_key_from_file_path, ShortsService};
