use serde::Deserialize;

use crate::{error::MediaStoreError, services::cloudinary::SignatureAlgorithm};

#[derive(Deserialize, Debug, Clone)]
pub struct EnvVars {
    #[serde(alias = "PORT")]
    #[serde(default = "port_default")]
    pub port: u16,
    #[serde(alias = "FRONTEND_URL")]
    #[serde(default = "frontend_url_default")]
    pub frontend_url: String,
    #[serde(alias = "CLOUDINARY_CLOUD_NAME")]
    pub cloudinary_cloud_name: Option<String>,
    #[serde(alias = "CLOUDINARY_API_KEY")]
    pub cloudinary_api_key: Option<String>,
    #[serde(alias = "CLOUDINARY_API_SECRET")]
    pub cloudinary_api_secret: Option<String>,
    #[serde(alias = "CLOUDINARY_API_URL")]
    #[serde(default = "cloudinary_api_url_default")]
    pub cloudinary_api_url: String,
    #[serde(alias = "CLOUDINARY_SIGNATURE_ALGORITHM")]
    #[serde(default = "cloudinary_signature_algorithm_default")]
    pub cloudinary_signature_algorithm: String,
    #[serde(alias = "CLIPDROP_API_KEY")]
    pub clipdrop_api_key: Option<String>,
    #[serde(alias = "CLIPDROP_API_URL")]
    #[serde(default = "clipdrop_api_url_default")]
    pub clipdrop_api_url: String,
    #[serde(alias = "RATE_LIMIT_ENABLED")]
    #[serde(default = "rate_limit_enabled_default")]
    pub rate_limit_enabled: bool,
    #[serde(alias = "RATE_LIMIT_PER_MINUTE")]
    #[serde(default = "rate_limit_per_minute_default")]
    pub rate_limit_per_minute: u32,
}

fn port_default() -> u16 {
    3000
}

fn frontend_url_default() -> String {
    "http://localhost:5173".to_string()
}

fn cloudinary_api_url_default() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

fn cloudinary_signature_algorithm_default() -> String {
    "sha1".to_string()
}

fn clipdrop_api_url_default() -> String {
    "https://clipdrop-api.co/remove-background/v1".to_string()
}

fn rate_limit_enabled_default() -> bool {
    true
}

fn rate_limit_per_minute_default() -> u32 {
    20
}

/// Cloudinary account credentials. All three fields are non-empty once built.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl CloudinaryCredentials {
    pub fn new(
        cloud_name: Option<&str>,
        api_key: Option<&str>,
        api_secret: Option<&str>,
    ) -> Result<Self, MediaStoreError> {
        match (non_empty(cloud_name), non_empty(api_key), non_empty(api_secret)) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(CloudinaryCredentials {
                cloud_name: cloud_name.to_string(),
                api_key: api_key.to_string(),
                api_secret: api_secret.to_string(),
            }),
            _ => Err(MediaStoreError::NotConfigured),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl EnvVars {
    pub fn cloudinary_credentials(&self) -> Result<CloudinaryCredentials, MediaStoreError> {
        CloudinaryCredentials::new(
            self.cloudinary_cloud_name.as_deref(),
            self.cloudinary_api_key.as_deref(),
            self.cloudinary_api_secret.as_deref(),
        )
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm, MediaStoreError> {
        self.cloudinary_signature_algorithm.parse()
    }
}
