#![allow(dead_code)]

use adforge::{
    AdForgeError, CampaignResult, EncodedImage, GenerationClient, GenerationRequest, ImageAsset,
    MarketingCopy, ProductAnalysis, RefineRequest, RefineResponse, RefinementClient, Result,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub fn jpeg() -> ImageAsset {
    ImageAsset::from_bytes(JPEG.to_vec())
}

pub fn png() -> ImageAsset {
    ImageAsset::from_bytes(PNG.to_vec())
}

pub fn campaign(headline: &str) -> CampaignResult {
    CampaignResult {
        product_analysis: ProductAnalysis {
            name: "Zenith Headphones".into(),
            category: "Audio".into(),
            mood: "minimal".into(),
            key_features: vec!["noise cancelling".into(), "40h battery".into()],
            target_audience: "commuters".into(),
            color_palette: vec!["#101010".into(), "#F5F5F5".into()],
        },
        marketing_copy: MarketingCopy {
            instagram_caption: "Silence the world. Hear the music. 🎧".into(),
            email_subject: "Your commute just got quieter".into(),
            ad_headline: headline.into(),
            ad_body: "Forty hours of pure sound.".into(),
            hashtags: vec!["sale".into(), "newdrop".into()],
        },
        styled_image: Some(EncodedImage("c3R5bGVk".into())),
        original_image: EncodedImage("placeholder".into()),
    }
}

/// Polls `cond` between scheduler yields, failing the test after five seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition was not reached in time");
}

pub enum Reply {
    Campaign(CampaignResult),
    Detail(String),
    Transport,
}

/// Generation stub that counts calls and can hold responses until released.
pub struct StubGenerator {
    reply: Reply,
    gate: Option<Notify>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl StubGenerator {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            gate: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(reply: Reply) -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new(reply)
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationClient for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<CampaignResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reply {
            Reply::Campaign(result) => Ok(result.clone()),
            Reply::Detail(detail) => Err(AdForgeError::ServiceError {
                status: 500,
                detail: detail.clone(),
            }),
            Reply::Transport => Err(AdForgeError::RequestError(
                "error sending request: connection refused".into(),
            )),
        }
    }
}

/// Refinement stub answering `<current>-<instruction>`.
#[derive(Default)]
pub struct AppendingRefiner {
    gate: Option<Notify>,
    fail_with: Mutex<Option<AdForgeError>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<RefineRequest>>,
}

impl AppendingRefiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, error: AdForgeError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RefineRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefinementClient for AppendingRefiner {
    async fn refine(&self, request: RefineRequest) -> Result<RefineResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(error) = self.fail_with.lock().unwrap().take() {
            return Err(error);
        }
        Ok(RefineResponse {
            refined_text: format!("{}-{}", request.current_text, request.instruction),
        })
    }
}
