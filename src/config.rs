use std::env;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TEXT_MODEL: &str = "amazon.nova-lite-v1:0";
pub const DEFAULT_IMAGE_MODEL: &str = "amazon.nova-canvas-v1:0";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub port: Option<u16>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub bedrock: Option<BedrockConfig>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let api_url = env::var("ADFORGE_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let timeout_secs = env::var("ADFORGE_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse().ok());

        Config {
            port,
            api_url,
            timeout_secs,
            bedrock: Some(BedrockConfig::from_env()),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_bedrock(mut self, config: BedrockConfig) -> Self {
        self.bedrock = Some(config);
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let region = env::var("AWS_REGION")
            .or_else(|_| env::var("AWS_DEFAULT_REGION"))
            .ok();

        BedrockConfig {
            region,
            access_key: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            text_model: env::var("ADFORGE_TEXT_MODEL").ok(),
            image_model: env::var("ADFORGE_IMAGE_MODEL").ok(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_models(mut self, text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        self.text_model = Some(text_model.into());
        self.image_model = Some(image_model.into());
        self
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }
}
