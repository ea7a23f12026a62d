use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::{GenerationClient, RefinementClient};
use crate::{
    config::Config,
    error::{AdForgeError, Result},
    models::{
        CampaignRequestBody, CampaignResponseBody, CampaignResult, ErrorBody, GenerationRequest,
        RefineRequest, RefineRequestBody, RefineResponse,
    },
};

/// Talks to the campaign API over HTTP.
#[derive(Clone)]
pub struct HttpCampaignClient {
    client: Client,
    base_url: String,
}

impl HttpCampaignClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .map_err(|e| AdForgeError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();
        log::info!("POST {} [req:{}]", url, request_id);

        let response = self
            .client
            .post(&url)
            .header("x-request-id", &request_id)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log::error!("request to {} failed [req:{}]: {}", url, request_id, e);
                AdForgeError::from(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = error_from_response(status, &bytes);
            log::error!("{} answered {} [req:{}]: {}", url, status, request_id, err);
            return Err(err);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            log::error!("undecodable response from {} [req:{}]: {}", url, request_id, e);
            AdForgeError::ResponseError(e.to_string())
        })
    }
}

/// Maps a non-2xx response to an error. Only a JSON body with a `detail`
/// string counts as a structured service failure.
pub(crate) fn error_from_response(status: StatusCode, body: &[u8]) -> AdForgeError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(detail),
        }) => AdForgeError::ServiceError {
            status: status.as_u16(),
            detail,
        },
        _ => AdForgeError::ResponseError(format!("unexpected status {}", status)),
    }
}

#[async_trait]
impl GenerationClient for HttpCampaignClient {
    async fn generate(&self, request: GenerationRequest) -> Result<CampaignResult> {
        let body = CampaignRequestBody::from(&request);
        let response: CampaignResponseBody = self.post_json("/api/campaign", &body).await?;
        Ok(response.into_result(&request.image))
    }
}

#[async_trait]
impl RefinementClient for HttpCampaignClient {
    async fn refine(&self, request: RefineRequest) -> Result<RefineResponse> {
        let body = RefineRequestBody::from(&request);
        self.post_json("/api/refine", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERATION_FALLBACK_MESSAGE;

    #[test]
    fn detail_body_becomes_service_error() {
        let err = error_from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"detail": "Image too large"}"#,
        );
        assert!(matches!(
            &err,
            AdForgeError::ServiceError { status: 500, detail } if detail == "Image too large"
        ));
        assert_eq!(err.user_message(GENERATION_FALLBACK_MESSAGE), "Image too large");
    }

    #[test]
    fn unstructured_body_falls_back() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(
            err.user_message(GENERATION_FALLBACK_MESSAGE),
            GENERATION_FALLBACK_MESSAGE
        );

        let err = error_from_response(StatusCode::BAD_REQUEST, br#"{"error": "nope"}"#);
        assert!(matches!(err, AdForgeError::ResponseError(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = Config::new().with_api_url("http://localhost:8000/");
        let client = HttpCampaignClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
