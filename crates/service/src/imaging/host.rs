use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use configs::ImageConfig;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{info, instrument, warn};

use super::ImageError;

/// Destination for optimized contact photos.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store a JPEG and return its public URL.
    async fn upload(&self, jpeg: Vec<u8>) -> Result<String, ImageError>;
}

/// Signed uploads to Cloudinary's image upload endpoint.
pub struct CloudinaryHost {
    client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary request signature: sorted `key=value` pairs joined by `&`,
/// followed by the API secret, SHA-1 hex encoded.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryHost {
    pub fn from_config(cfg: &ImageConfig) -> Result<Self, ImageError> {
        if !cfg.is_configured() {
            return Err(ImageError::Config("cloud_name, api_key and api_secret are required".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: cfg.upload_base_url.trim_end_matches('/').to_string(),
            cloud_name: cfg.cloud_name.clone(),
            api_key: cfg.api_key.clone(),
            api_secret: cfg.api_secret.clone(),
            folder: cfg.folder.clone().filter(|f| !f.trim().is_empty()),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.base_url, self.cloud_name)
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    #[instrument(skip(self, jpeg), fields(bytes = jpeg.len(), cloud = %self.cloud_name))]
    async fn upload(&self, jpeg: Vec<u8>) -> Result<String, ImageError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ImageError::Upload(e.to_string()))?
            .as_secs()
            .to_string();

        let mut signed: Vec<(&str, &str)> = vec![("timestamp", timestamp.as_str())];
        if let Some(folder) = self.folder.as_deref() {
            signed.push(("folder", folder));
        }
        let signature = sign(&signed, &self.api_secret);

        let file = Part::bytes(jpeg)
            .file_name("contact.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| ImageError::Upload(e.to_string()))?;
        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.clone())
            .text("signature", signature);
        if let Some(folder) = &self.folder {
            form = form.text("folder", folder.clone());
        }

        let resp = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageError::Upload(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %body, "image host rejected upload");
            return Err(ImageError::Upload(format!("image host returned {status}")));
        }
        let body: UploadResponse = resp.json().await.map_err(|e| ImageError::Upload(e.to_string()))?;
        info!(url = %body.secure_url, "image uploaded");
        Ok(body.secure_url)
    }
}

/// Used when no credentials are configured: every upload fails, requests
/// without an image are unaffected.
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _jpeg: Vec<u8>) -> Result<String, ImageError> {
        Err(ImageError::Config("set CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET".into()))
    }
}

pub fn host_from_config(cfg: &ImageConfig) -> Arc<dyn ImageHost> {
    match CloudinaryHost::from_config(cfg) {
        Ok(host) => {
            info!(cloud = %cfg.cloud_name, folder = ?cfg.folder, "cloudinary image host enabled");
            Arc::new(host)
        }
        Err(e) => {
            warn!(error = %e, "image uploads disabled");
            Arc::new(DisabledImageHost)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Multipart, routing::post, Json, Router};
    use std::collections::HashMap;

    fn cfg(base_url: String) -> ImageConfig {
        ImageConfig {
            cloud_name: "demo".into(),
            api_key: "key-123".into(),
            api_secret: "s3cret".into(),
            folder: Some("contacts".into()),
            upload_base_url: base_url,
            ..Default::default()
        }
    }

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let a = sign(&[("timestamp", "1315060510"), ("folder", "contacts")], "abcd");
        let b = sign(&[("folder", "contacts"), ("timestamp", "1315060510")], "abcd");
        assert_eq!(a, b);

        let mut hasher = Sha1::new();
        hasher.update(b"folder=contacts&timestamp=1315060510abcd");
        assert_eq!(a, hex::encode(hasher.finalize()));
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn unconfigured_host_is_rejected() {
        let err = CloudinaryHost::from_config(&ImageConfig::default()).err().expect("error");
        assert!(matches!(err, ImageError::Config(_)));
    }

    #[tokio::test]
    async fn disabled_host_fails_uploads() {
        let res = DisabledImageHost.upload(vec![1, 2, 3]).await;
        assert!(matches!(res, Err(ImageError::Config(_))));
    }

    #[tokio::test]
    async fn uploads_signed_multipart_and_returns_secure_url() -> anyhow::Result<()> {
        async fn fake_upload(mut mp: Multipart) -> Json<serde_json::Value> {
            let mut fields = HashMap::new();
            while let Some(field) = mp.next_field().await.expect("field") {
                let name = field.name().unwrap_or_default().to_string();
                let data = field.bytes().await.expect("bytes");
                fields.insert(name, data.to_vec());
            }
            let text = |k: &str| String::from_utf8(fields.get(k).cloned().unwrap_or_default()).unwrap_or_default();
            let (timestamp, folder) = (text("timestamp"), text("folder"));
            let expected = sign(&[("timestamp", timestamp.as_str()), ("folder", folder.as_str())], "s3cret");
            let ok = text("api_key") == "key-123" && text("signature") == expected && fields.get("file").map_or(false, |f| f == b"jpeg-bytes");
            Json(serde_json::json!({ "secure_url": if ok { "https://res.test/demo/ok.jpg" } else { "https://res.test/demo/bad.jpg" } }))
        }

        let app = Router::new().route("/v1_1/demo/image/upload", post(fake_upload));
        let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let host = CloudinaryHost::from_config(&cfg(format!("http://{addr}/v1_1")))?;
        let url = host.upload(b"jpeg-bytes".to_vec()).await?;
        assert_eq!(url, "https://res.test/demo/ok.jpg");
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_upload_error() -> anyhow::Result<()> {
        let app = Router::new().route(
            "/v1_1/demo/image/upload",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad signature") }),
        );
        let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let host = CloudinaryHost::from_config(&cfg(format!("http://{addr}/v1_1")))?;
        let err = host.upload(vec![0xff, 0xd8]).await.unwrap_err();
        assert!(matches!(err, ImageError::Upload(ref m) if m.contains("401")));
        Ok(())
    }
}
