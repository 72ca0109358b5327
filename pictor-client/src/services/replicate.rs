//! Replicate predictions API, used for relighting product photos
//!
//! A prediction is created with `POST /v1/predictions` and read back from the
//! `urls.get` link of the response. Statuses are `starting`, `processing`,
//! `succeeded`, `failed` and `canceled`.

use async_trait::async_trait;
use pictor_core::{PayloadSchema, PollPolicy, ServiceProfile, StatusVocabulary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::services::lighting::LightingEffect;
use crate::{AuthScheme, HttpService, JobHandle, ServiceConfig, StatusClient, SubmissionClient};

/// Model version of the IC-Light relighting model (zsxkib/ic-light)
pub const IC_LIGHT_VERSION: &str = "d41bcb10d8c159868f4cfbd7c6a2ca01484f7d39e4613419d5952c61562f1ba7";

/// Input of an IC-Light prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelightRequest {
    pub subject_image: String,
    pub prompt: String,
    pub cfg: f32,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub light_source: String,
    pub highres_scale: f32,
    pub output_format: String,
    pub lowres_denoise: f32,
    pub output_quality: u32,
    pub appended_prompt: String,
    pub highres_denoise: f32,
    pub negative_prompt: String,
    pub number_of_images: u32,
}

impl RelightRequest {
    /// A request with the default generation settings
    pub fn new(subject_image: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            subject_image: subject_image.into(),
            prompt: prompt.into(),
            cfg: 1.0,
            steps: 25,
            width: 512,
            height: 512,
            light_source: "None".to_string(),
            highres_scale: 1.5,
            output_format: "jpg".to_string(),
            lowres_denoise: 0.9,
            output_quality: 80,
            appended_prompt: "best quality".to_string(),
            highres_denoise: 0.5,
            negative_prompt: "lowres, bad anatomy, bad hands, cropped, worst quality".to_string(),
            number_of_images: 1,
        }
    }

    /// A request using a preset's prompt
    pub fn with_effect(subject_image: impl Into<String>, effect: LightingEffect) -> Self {
        Self::new(subject_image, effect.prompt())
    }

    fn validate(&self) -> Result<()> {
        crate::require_http_url("subject_image", &self.subject_image)?;
        if self.prompt.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "prompt cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    version: &'a str,
    input: &'a RelightRequest,
}

#[derive(Debug, Clone, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

/// Response to `POST /v1/predictions`
#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    id: String,
    urls: Option<PredictionUrls>,
}

/// Client for Replicate predictions of one model version
#[derive(Debug, Clone)]
pub struct ReplicateClient {
    http: HttpService,
    version: String,
    profile: ServiceProfile,
}

impl ReplicateClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.replicate.com";

    /// Creates a client for the IC-Light model
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Self::with_version(config, IC_LIGHT_VERSION)
    }

    pub fn with_version(config: ServiceConfig, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "model version cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            http: HttpService::new(config, AuthScheme::Bearer)?,
            version,
            profile: ServiceProfile::new(
                "replicate",
                StatusVocabulary::REPLICATE,
                PayloadSchema::output_list(),
            ),
        })
    }

    /// Relighting usually finishes within a minute; allow three
    pub fn default_policy() -> PollPolicy {
        PollPolicy::new(60, Duration::from_secs(3))
    }

    fn prediction_url(&self, id: &str) -> String {
        self.http.url(&format!("v1/predictions/{}", id))
    }

    fn handle_from(&self, prediction: Prediction) -> Result<JobHandle> {
        let poll_url = prediction
            .urls
            .and_then(|urls| urls.get)
            .unwrap_or_else(|| self.prediction_url(&prediction.id));
        Ok(JobHandle::with_poll_url(prediction.id, poll_url)?)
    }
}

#[async_trait]
impl SubmissionClient for ReplicateClient {
    type Job = RelightRequest;

    async fn submit(&self, job: &RelightRequest) -> Result<JobHandle> {
        job.validate()?;

        let url = self.http.url("v1/predictions");
        debug!("Creating prediction for model version {}", self.version);
        let response = self
            .http
            .post(&url)
            .json(&CreatePrediction {
                version: &self.version,
                input: job,
            })
            .send()
            .await?;

        let prediction: Prediction = self.http.handle_response(response).await?;
        self.handle_from(prediction)
    }
}

#[async_trait]
impl StatusClient for ReplicateClient {
    fn profile(&self) -> &ServiceProfile {
        &self.profile
    }

    async fn poll(&self, handle: &JobHandle) -> Result<Value> {
        let url = match handle.poll_url() {
            Some(url) => url.to_string(),
            None => self.prediction_url(handle.id()),
        };
        let response = self.http.get(&url).send().await?;

        self.http.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pictor_core::{JobStatus, UnknownStatusPolicy};
    use serde_json::json;

    fn client() -> ReplicateClient {
        ReplicateClient::new(ServiceConfig::new(ReplicateClient::DEFAULT_BASE_URL, "r8_test"))
            .unwrap()
    }

    #[test]
    fn test_default_policy_retries_unknown_status() {
        let policy = ReplicateClient::default_policy();
        assert_eq!(policy.unknown_status, UnknownStatusPolicy::Retry);
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.validate(), Ok(()));
    }

    #[test]
    fn test_create_prediction_body() {
        let input = RelightRequest::with_effect("https://cdn/product.jpg", LightingEffect::Spotlight);
        let body = serde_json::to_value(CreatePrediction {
            version: IC_LIGHT_VERSION,
            input: &input,
        })
        .unwrap();

        assert_eq!(body["version"], IC_LIGHT_VERSION);
        assert_eq!(body["input"]["subject_image"], "https://cdn/product.jpg");
        assert_eq!(body["input"]["prompt"], LightingEffect::Spotlight.prompt());
        assert_eq!(body["input"]["steps"], 25);
        assert_eq!(body["input"]["width"], 512);
        assert_eq!(body["input"]["light_source"], "None");
        assert_eq!(body["input"]["output_format"], "jpg");
        assert_eq!(body["input"]["number_of_images"], 1);
    }

    #[test]
    fn test_handle_uses_get_url() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "gm3qorzdhgbfurvjtvhg6dckhu",
            "status": "starting",
            "urls": {
                "get": "https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu",
                "cancel": "https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu/cancel"
            }
        }))
        .unwrap();

        let handle = client().handle_from(prediction).unwrap();
        assert_eq!(handle.id(), "gm3qorzdhgbfurvjtvhg6dckhu");
        assert_eq!(
            handle.poll_url(),
            Some("https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu")
        );
    }

    #[test]
    fn test_handle_falls_back_to_prediction_url() {
        let prediction: Prediction = serde_json::from_value(json!({"id": "abc"})).unwrap();
        let handle = client().handle_from(prediction).unwrap();
        assert_eq!(
            handle.poll_url(),
            Some("https://api.replicate.com/v1/predictions/abc")
        );
    }

    #[test]
    fn test_canceled_prediction_is_a_failure() {
        let client = client();
        let payload = json!({"id": "abc", "status": "canceled", "output": null, "error": null});
        assert_eq!(client.profile().read_status(&payload).0, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_prompt() {
        let err = client()
            .submit(&RelightRequest::new("https://cdn/product.jpg", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
