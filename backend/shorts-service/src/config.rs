/// Configuration management for shorts-service
///
/// Loads configuration from environment variables with sensible defaults.
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub notification: NotificationConfig,
    pub auth: AuthConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Object storage URL templates. Asset URLs are `head + upload_key + tail`.
#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub shorts: UrlTemplate,
    pub thumbnail: UrlTemplate,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UrlTemplate {
    pub head: String,
    pub tail: String,
}

impl UrlTemplate {
    pub fn new(head: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            tail: tail.into(),
        }
    }

    pub fn render(&self, upload_key: &str) -> String {
        let mut url = String::with_capacity(self.head.len() + upload_key.len() + self.tail.len());
        url.push_str(&self.head);
        url.push_str(upload_key);
        url.push_str(&self.tail);
        url
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotificationConfig {
    pub base_url: String,
    pub max_retries: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // A missing .env file is fine outside local development.
        let _ = dotenvy::dotenv();

        Ok(Config {
            app: AppConfig {
                host: env_or("SHORTS_SERVICE_HOST", "0.0.0.0"),
                port: env_or("SHORTS_SERVICE_PORT", "8080").parse().unwrap_or(8080),
                env: env_or("APP_ENV", "development"),
            },
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", "postgresql://localhost/phochak"),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", "10")
                    .parse()
                    .unwrap_or(10),
            },
            storage: StorageConfig {
                shorts: UrlTemplate::new(
                    required("NCP_SHORTS_STREAMING_URL_PREFIX_HEAD")?,
                    required("NCP_SHORTS_STREAMING_URL_PREFIX_TAIL")?,
                ),
                thumbnail: UrlTemplate::new(
                    required("NCP_THUMBNAIL_URL_PREFIX_HEAD")?,
                    required("NCP_THUMBNAIL_URL_PREFIX_TAIL")?,
                ),
            },
            notification: NotificationConfig {
                base_url: env_or("NOTIFICATION_SERVICE_URL", "http://localhost:8000"),
                max_retries: env_or("NOTIFICATION_MAX_RETRIES", "3").parse().unwrap_or(3),
            },
            auth: AuthConfig {
                jwt_secret: required("JWT_SECRET")?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required(key: &str) -> Result<String, Box<dyn std::error::Error>> {
    std::env::var(key).map_err(|_| format!("{key} must be set").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_wraps_upload_key() {
        let template = UrlTemplate::new("https://cdn.example.com/hls/", "/index.m3u8");
        assert_eq!(
            template.render("abc123"),
            "https://cdn.example.com/hls/abc123/index.m3u8"
        );
    }

    #[test]
    fn render_with_empty_parts() {
        let template = UrlTemplate::new("", "");
        assert_eq!(template.render("abc123"), "abc123");
    }
}
