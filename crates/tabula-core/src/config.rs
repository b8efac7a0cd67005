use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub upload: UploadPolicy,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// Backend origin, without the `/api` suffix.
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Analysis and merge calls run model inference server-side and get a longer deadline.
    #[serde(default = "default_analysis_timeout_secs")]
    pub analysis_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            analysis_timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_analysis_timeout_secs() -> u64 {
    180
}

/// Which files the upload flows admit.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    /// Lower-case extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["csv".into(), "xlsx".into(), "xls".into()],
            allowed_mime_types: vec![
                "text/csv".into(),
                "application/csv".into(),
                "text/plain".into(),
                "application/vnd.ms-excel".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".into(),
            ],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    /// How long a fetched query stays fresh.
    pub freshness_secs: u64,
    /// Retries granted to list/detail reads. Mutations never retry.
    pub read_retries: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            freshness_secs: 300,
            read_retries: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://analysis.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://analysis.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.upload.max_size_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.cache.read_retries, 1);
    }
}
