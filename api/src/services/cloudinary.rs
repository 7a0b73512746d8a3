use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::{image_processor::OUTPUT_CONTENT_TYPE, MediaStore};
use crate::{
    config::CloudinaryCredentials, error::MediaStoreError, models::server_models::StoredImage,
    utils::public_id::PublicIdGenerator,
};

pub const UPLOAD_FOLDER: &str = "image-transformation";
const RESOURCE_TYPE: &str = "image";
const NOT_FOUND_RESULT: &str = "not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1,
    Sha256,
}

impl FromStr for SignatureAlgorithm {
    type Err = MediaStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(MediaStoreError::InvalidSignatureAlgorithm(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResult {
    result: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Cloudinary upload API client. Every request is signed with the account secret.
pub struct CloudinaryClient {
    client: Client,
    api_url: String,
    credentials: CloudinaryCredentials,
    signature_algorithm: SignatureAlgorithm,
    public_ids: PublicIdGenerator,
}

impl CloudinaryClient {
    pub fn new(
        client: Client,
        api_url: &str,
        credentials: CloudinaryCredentials,
        signature_algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
            signature_algorithm,
            public_ids: PublicIdGenerator::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_url, self.credentials.cloud_name, RESOURCE_TYPE, action
        )
    }

    /// Signs `params` the way Cloudinary expects: sorted `k=v` pairs joined by
    /// `&`, followed by the API secret, hex digest.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<_> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        to_sign.push_str(&self.credentials.api_secret);

        match self.signature_algorithm {
            SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(to_sign.as_bytes())),
            SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(to_sign.as_bytes())),
        }
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(&self, image: Bytes, file_name: &str) -> Result<StoredImage, MediaStoreError> {
        let public_id = self.public_ids.generate(file_name);
        let params = [
            ("folder", UPLOAD_FOLDER.to_string()),
            ("public_id", public_id.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = self.sign(&params);

        let file = multipart::Part::bytes(image.to_vec())
            .file_name(file_name.to_string())
            .mime_str(OUTPUT_CONTENT_TYPE)?;
        let form = params
            .into_iter()
            .fold(multipart::Form::new(), |form, (key, value)| form.text(key, value))
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .part("file", file);

        tracing::debug!(public_id = %public_id, "uploading image to Cloudinary");
        let response = self.client.post(self.endpoint("upload")).multipart(form).send().await?;
        let body = checked_body(response).await?;

        let result = serde_json::from_slice::<Option<UploadResult>>(&body)
            .ok()
            .flatten()
            .ok_or(MediaStoreError::NoResult)?;

        tracing::info!(public_id = %result.public_id, url = %result.secure_url, "image stored");
        Ok(StoredImage {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaStoreError> {
        let params = [
            ("invalidate", "true".to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = self.sign(&params);

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("api_key", self.credentials.api_key.clone()));
        form.push(("signature", signature));

        let response = self.client.post(self.endpoint("destroy")).form(&form).send().await?;
        let body = checked_body(response).await?;

        let result = serde_json::from_slice::<DestroyResult>(&body)
            .ok()
            .and_then(|r| r.result);
        if result.as_deref() == Some(NOT_FOUND_RESULT) {
            tracing::warn!(public_id = %public_id, "image was already absent from Cloudinary");
        } else {
            tracing::info!(public_id = %public_id, result = ?result, "image deleted");
        }

        Ok(())
    }
}

/// Returns the body of a successful response, or the Cloudinary error message.
async fn checked_body(response: Response) -> Result<Bytes, MediaStoreError> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_slice::<ErrorBody>(&body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| format!("Cloudinary request failed with status {status}"));
    tracing::error!(status = %status, error = %message, "Cloudinary request failed");
    Err(MediaStoreError::Upstream(message))
}
