use crate::config::CloudinaryConfig;
use crate::models::ImageUpload;
use anyhow::{anyhow, Context, Result};
use axum::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Accepted by the media host; anything else is refused on its side.
pub const ALLOWED_FORMATS: &str = "jpg,png,jpeg,pdf";

/// Longest edge capped at 800px, aspect kept, never upscaled.
pub const INGEST_TRANSFORMATION: &str = "c_limit,h_800,w_800";

/// Remote image hosting. Returns the durable URL of the stored file.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload_image(&self, image: ImageUpload) -> Result<String>;
}

pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: String,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build Cloudinary HTTP client")?;
        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// The parameters covered by the request signature, sorted by name.
    fn signed_params(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        vec![
            ("allowed_formats", ALLOWED_FORMATS.to_string()),
            ("folder", self.config.folder.clone()),
            ("timestamp", timestamp.to_string()),
            ("transformation", INGEST_TRANSFORMATION.to_string()),
        ]
    }
}

pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload_image(&self, image: ImageUpload) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp();
        let params = self.signed_params(timestamp);
        let signature = sign_params(&params, &self.config.api_secret);

        let file = Part::bytes(image.data.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .with_context(|| format!("Invalid content type: {}", image.content_type))?;

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .context("Failed to reach Cloudinary")?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .with_context(|| format!("Unreadable Cloudinary response (status {status})"))?;

        if !status.is_success() {
            let reason = body
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "no error message".to_string());
            return Err(anyhow!("Cloudinary rejected {}: {status} {reason}", image.file_name));
        }

        let url = body
            .secure_url
            .ok_or_else(|| anyhow!("Cloudinary response missing secure_url"))?;
        tracing::debug!("Uploaded {} to {}", image.file_name, url);
        Ok(url)
    }
}
