pub mod http;

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::Result,
    models::{CampaignResult, GenerationRequest, RefineRequest, RefineResponse},
};

pub use http::HttpCampaignClient;

/// Submits an image, style and optional brief; returns the finished campaign.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<CampaignResult>;
}

/// Rewrites one piece of copy according to a natural-language instruction.
#[async_trait]
pub trait RefinementClient: Send + Sync {
    async fn refine(&self, request: RefineRequest) -> Result<RefineResponse>;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    async fn generate(&self, request: GenerationRequest) -> Result<CampaignResult> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<T: RefinementClient + ?Sized> RefinementClient for Arc<T> {
    async fn refine(&self, request: RefineRequest) -> Result<RefineResponse> {
        (**self).refine(request).await
    }
}
