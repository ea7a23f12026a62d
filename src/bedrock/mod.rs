pub mod image_client;
pub mod text_client;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::{
    config::{Credentials, Region},
    error::{ProvideErrorMetadata, SdkError},
    operation::invoke_model::InvokeModelError,
    primitives::Blob,
    Client,
};
use serde_json::Value;

use crate::{
    client::{GenerationClient, RefinementClient},
    config::BedrockConfig,
    error::{AdForgeError, Result},
    models::{CampaignResult, GenerationRequest, RefineRequest, RefineResponse},
};

pub use image_client::ImageClient;
pub use text_client::TextClient;

/// Runs the whole campaign pipeline in-process against Amazon Bedrock:
/// product analysis and copy with the text model, restyling with the image model.
#[derive(Clone)]
pub struct BedrockCampaignService {
    text_client: TextClient,
    image_client: ImageClient,
}

impl BedrockCampaignService {
    pub async fn new(config: BedrockConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region().to_string()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "adforge",
            ));
        }

        let client = Client::new(&loader.load().await);
        log::info!(
            "Bedrock client ready in {} (text: {}, image: {})",
            config.region(),
            config.text_model(),
            config.image_model()
        );

        Ok(Self {
            text_client: TextClient::new(client.clone(), config.text_model()),
            image_client: ImageClient::new(client, config.image_model()),
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

#[async_trait]
impl GenerationClient for BedrockCampaignService {
    async fn generate(&self, request: GenerationRequest) -> Result<CampaignResult> {
        log::info!("Analyzing product image");
        let product = self.text_client.analyze_product(&request.image).await?;

        log::info!("Generating marketing copy and styled image");
        let (copy, styled) = futures::join!(
            self.text_client
                .write_copy(&product, request.creative_brief.as_deref()),
            self.image_client.restyle(&product, request.style),
        );

        let styled_image = match styled {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Styled image unavailable: {}", e);
                None
            }
        };

        Ok(CampaignResult {
            product_analysis: product,
            marketing_copy: copy?,
            styled_image,
            original_image: request.image.encoded(),
        })
    }
}

#[async_trait]
impl RefinementClient for BedrockCampaignService {
    async fn refine(&self, request: RefineRequest) -> Result<RefineResponse> {
        let refined_text = self.text_client.refine(&request).await?;
        Ok(RefineResponse { refined_text })
    }
}

/// Sends a JSON payload to `model_id` and decodes the JSON answer.
pub(crate) async fn invoke_json(client: &Client, model_id: &str, payload: &Value) -> Result<Value> {
    let body = serde_json::to_vec(payload)?;
    log::debug!("Invoking model {} ({} byte payload)", model_id, body.len());

    let response = client
        .invoke_model()
        .model_id(model_id)
        .content_type("application/json")
        .accept("application/json")
        .body(Blob::new(body))
        .send()
        .await
        .map_err(invoke_error)?;

    serde_json::from_slice(&response.body.into_inner())
        .map_err(|e| AdForgeError::ResponseError(e.to_string()))
}

fn invoke_error(e: SdkError<InvokeModelError>) -> AdForgeError {
    match e.as_service_error() {
        Some(service_error) => {
            log::error!(
                "Bedrock service error {:?}: {:?}",
                service_error.code(),
                service_error.message()
            );
            AdForgeError::AwsServiceError(format!(
                "{} - {}",
                service_error.code().unwrap_or("unknown"),
                service_error.message().unwrap_or("no message")
            ))
        }
        None => {
            log::error!("AWS SDK error: {:?}", e);
            AdForgeError::AwsError(e.to_string())
        }
    }
}

/// Pulls the outermost `{...}` out of model output that may wrap JSON in prose.
pub(crate) fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end])
        .ok()
        .filter(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_found_inside_prose() {
        let text = "Sure! Here you go:\n```json\n{\"name\": \"Elixir\", \"mood\": \"luxury\"}\n```";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["name"], "Elixir");
    }

    #[test]
    fn unusable_output_gives_none() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("} backwards {").is_none());
        assert!(extract_json_object("{not: valid}").is_none());
    }
}
