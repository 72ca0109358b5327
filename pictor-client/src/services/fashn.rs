//! FASHN virtual try-on API
//!
//! Dresses a model image in a garment image. Jobs are started with
//! `POST /v1/run` and followed with `GET /v1/status/{id}`.

use async_trait::async_trait;
use pictor_core::{PayloadSchema, PollPolicy, ServiceProfile, StatusVocabulary, UnknownStatusPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::{AuthScheme, HttpService, JobHandle, ServiceConfig, StatusClient, SubmissionClient};

/// Which part of the outfit the garment image shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GarmentCategory {
    Tops,
    Bottoms,
    OnePieces,
}

impl GarmentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tops => "tops",
            Self::Bottoms => "bottoms",
            Self::OnePieces => "one-pieces",
        }
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GarmentCategory {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tops" => Ok(Self::Tops),
            "bottoms" => Ok(Self::Bottoms),
            "one-pieces" => Ok(Self::OnePieces),
            other => Err(ClientError::InvalidRequest(format!(
                "unknown garment category {:?} (expected tops, bottoms or one-pieces)",
                other
            ))),
        }
    }
}

/// A try-on job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnRequest {
    /// URL of the person to dress
    pub model_image: String,
    /// URL of the garment
    pub garment_image: String,
    pub category: GarmentCategory,
    /// Whether the garment photo is a flat-lay shot rather than worn
    pub flat_lay: bool,
}

impl TryOnRequest {
    fn validate(&self) -> Result<()> {
        crate::require_http_url("model_image", &self.model_image)?;
        crate::require_http_url("garment_image", &self.garment_image)
    }
}

/// Response to `POST /v1/run`
#[derive(Debug, Clone, Deserialize)]
struct RunAccepted {
    id: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

/// Client for the FASHN API
#[derive(Debug, Clone)]
pub struct FashnClient {
    http: HttpService,
    profile: ServiceProfile,
}

impl FashnClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.fashn.ai";

    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self {
            http: HttpService::new(config, AuthScheme::Bearer)?,
            profile: ServiceProfile::new(
                "fashn",
                StatusVocabulary::FASHN,
                PayloadSchema::output_list(),
            ),
        })
    }

    /// Twelve checks five seconds apart; statuses outside the documented set
    /// are reported instead of waited out
    pub fn default_policy() -> PollPolicy {
        PollPolicy::new(12, Duration::from_secs(5)).with_unknown_status(UnknownStatusPolicy::Fail)
    }

    fn status_url(&self, id: &str) -> String {
        self.http.url(&format!("v1/status/{}", id))
    }
}

fn handle_from(accepted: RunAccepted) -> Result<JobHandle> {
    if let Some(error) = accepted.error.filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s,
            Value::Object(ref map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            other => other.to_string(),
        };
        return Err(ClientError::Rejected(message));
    }

    match accepted.id {
        Some(id) => Ok(JobHandle::new(id)?),
        None => Err(ClientError::ParseError(
            "run response has no prediction id".to_string(),
        )),
    }
}

#[async_trait]
impl SubmissionClient for FashnClient {
    type Job = TryOnRequest;

    async fn submit(&self, job: &TryOnRequest) -> Result<JobHandle> {
        job.validate()?;

        let url = self.http.url("v1/run");
        debug!(
            "Requesting try-on (category: {}, flat_lay: {})",
            job.category, job.flat_lay
        );
        let response = self.http.post(&url).json(job).send().await?;

        let accepted: RunAccepted = match self.http.handle_response(response).await {
            Ok(accepted) => accepted,
            Err(e) if e.is_rate_limited() => {
                warn!("FASHN rate limit exceeded, wait before trying again");
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        handle_from(accepted)
    }
}

#[async_trait]
impl StatusClient for FashnClient {
    fn profile(&self) -> &ServiceProfile {
        &self.profile
    }

    async fn poll(&self, handle: &JobHandle) -> Result<Value> {
        let url = match handle.poll_url() {
            Some(url) => url.to_string(),
            None => self.status_url(handle.id()),
        };
        let response = self.http.get(&url).send().await?;

        self.http.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pictor_core::JobStatus;
    use serde_json::json;

    fn client() -> FashnClient {
        FashnClient::new(ServiceConfig::new(FashnClient::DEFAULT_BASE_URL, "fa-test")).unwrap()
    }

    fn request() -> TryOnRequest {
        TryOnRequest {
            model_image: "https://cdn.example.com/model.jpg".to_string(),
            garment_image: "https://cdn.example.com/garment.jpg".to_string(),
            category: GarmentCategory::OnePieces,
            flat_lay: true,
        }
    }

    #[test]
    fn test_request_body() {
        assert_eq!(
            serde_json::to_value(request()).unwrap(),
            json!({
                "model_image": "https://cdn.example.com/model.jpg",
                "garment_image": "https://cdn.example.com/garment.jpg",
                "category": "one-pieces",
                "flat_lay": true
            })
        );
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("tops".parse::<GarmentCategory>().unwrap(), GarmentCategory::Tops);
        assert_eq!(
            "one-pieces".parse::<GarmentCategory>().unwrap(),
            GarmentCategory::OnePieces
        );
        assert!("dresses".parse::<GarmentCategory>().is_err());
        assert_eq!(GarmentCategory::Bottoms.to_string(), "bottoms");
    }

    #[test]
    fn test_status_url() {
        assert_eq!(
            client().status_url("123a87r9-4129-4bb3"),
            "https://api.fashn.ai/v1/status/123a87r9-4129-4bb3"
        );
    }

    #[test]
    fn test_handle_from_run_response() {
        let accepted: RunAccepted =
            serde_json::from_value(json!({"id": "123a87r9", "error": null})).unwrap();
        let handle = handle_from(accepted).unwrap();
        assert_eq!(handle.id(), "123a87r9");
        assert_eq!(handle.poll_url(), None);
    }

    #[test]
    fn test_run_response_with_error_is_rejected() {
        let accepted: RunAccepted = serde_json::from_value(json!({
            "id": null,
            "error": {"name": "ImageLoadError", "message": "garment image unreachable"}
        }))
        .unwrap();
        match handle_from(accepted).unwrap_err() {
            ClientError::Rejected(message) => assert_eq!(message, "garment image unreachable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_response_without_id() {
        let accepted: RunAccepted = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            handle_from(accepted).unwrap_err(),
            ClientError::ParseError(_)
        ));
    }

    #[test]
    fn test_default_policy_fails_on_unknown_status() {
        let policy = FashnClient::default_policy();
        assert_eq!(policy.max_attempts, 12);
        assert_eq!(policy.unknown_status, UnknownStatusPolicy::Fail);
    }

    #[test]
    fn test_profile() {
        let client = client();
        let payload = json!({"id": "1", "status": "completed", "output": ["https://cdn/o.png"], "error": null});
        assert_eq!(client.profile().read_status(&payload).0, JobStatus::Completed);
        assert_eq!(
            client.profile().schema.artifact(&payload).as_deref(),
            Some("https://cdn/o.png")
        );
    }

    #[tokio::test]
    async fn test_submit_validates_urls_before_sending() {
        let mut req = request();
        req.garment_image = "garment_image.jpg".to_string();
        let err = client().submit(&req).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
