use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::campaign::{CampaignResult, CopyField, MarketingCopy, ProductAnalysis};
use super::image::{EncodedImage, ImageAsset};
use crate::error::AdForgeError;

/// Visual and tonal direction for the restyled hero image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    #[default]
    Professional,
    Luxury,
    Playful,
    Minimal,
}

impl StylePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            StylePreset::Professional => "professional",
            StylePreset::Luxury => "luxury",
            StylePreset::Playful => "playful",
            StylePreset::Minimal => "minimal",
        }
    }

    /// Unknown names fall back to the default preset.
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StylePreset {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(StylePreset::Professional),
            "luxury" => Ok(StylePreset::Luxury),
            "playful" => Ok(StylePreset::Playful),
            "minimal" => Ok(StylePreset::Minimal),
            other => Err(AdForgeError::ConfigError(format!(
                "unknown style preset: {}",
                other
            ))),
        }
    }
}

/// Built fresh for every generation attempt.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image: ImageAsset,
    pub style: StylePreset,
    pub creative_brief: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineRequest {
    pub current_text: String,
    pub instruction: String,
    pub field: CopyField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineResponse {
    pub refined_text: String,
}

/// JSON body of `POST /api/campaign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRequestBody {
    pub image: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default, rename = "user_prompt", skip_serializing_if = "Option::is_none")]
    pub creative_brief: Option<String>,
}

impl From<&GenerationRequest> for CampaignRequestBody {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            image: request.image.to_base64(),
            style: Some(request.style.as_str().to_string()),
            creative_brief: request
                .creative_brief
                .as_ref()
                .map(|brief| brief.trim().to_string())
                .filter(|brief| !brief.is_empty()),
        }
    }
}

/// JSON body returned by `POST /api/campaign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignResponseBody {
    pub product_analysis: ProductAnalysis,
    pub marketing_copy: MarketingCopy,
    #[serde(default)]
    pub styled_image: Option<EncodedImage>,
    #[serde(default)]
    pub original_image: Option<EncodedImage>,
}

impl CampaignResponseBody {
    /// Fills `original_image` from the submitted asset when the service omits it.
    pub fn into_result(self, submitted: &ImageAsset) -> CampaignResult {
        CampaignResult {
            product_analysis: self.product_analysis,
            marketing_copy: self.marketing_copy,
            styled_image: self.styled_image,
            original_image: self.original_image.unwrap_or_else(|| submitted.encoded()),
        }
    }
}

impl From<CampaignResult> for CampaignResponseBody {
    fn from(result: CampaignResult) -> Self {
        Self {
            product_analysis: result.product_analysis,
            marketing_copy: result.marketing_copy,
            styled_image: result.styled_image,
            original_image: Some(result.original_image),
        }
    }
}

/// JSON body of `POST /api/refine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineRequestBody {
    pub current_text: String,
    pub refinement_prompt: String,
    pub context: String,
}

impl From<&RefineRequest> for RefineRequestBody {
    fn from(request: &RefineRequest) -> Self {
        Self {
            current_text: request.current_text.clone(),
            refinement_prompt: request.instruction.clone(),
            context: request.field.key().to_string(),
        }
    }
}

/// Structured failure body, e.g. `{"detail": "Image too large"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_names_parse_with_fallback() {
        assert_eq!(StylePreset::from_name_lossy("Luxury"), StylePreset::Luxury);
        assert_eq!(
            StylePreset::from_name_lossy("vaporwave"),
            StylePreset::Professional
        );
        assert!("vaporwave".parse::<StylePreset>().is_err());
    }

    #[test]
    fn blank_brief_is_not_sent() {
        let request = GenerationRequest {
            image: ImageAsset::from_bytes(vec![0xFF, 0xD8, 0xFF, 0x00]),
            style: StylePreset::Professional,
            creative_brief: Some("   ".into()),
        };
        let body = CampaignRequestBody::from(&request);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["style"], "professional");
        assert!(json.get("user_prompt").is_none());
        assert_eq!(json["image"], request.image.to_base64());
    }

    #[test]
    fn response_without_images_is_valid() {
        let json = r#"{
            "product_analysis": {"name": "Zenith", "category": "Audio", "mood": "minimal"},
            "marketing_copy": {
                "instagram_caption": "c", "email_subject": "s",
                "ad_headline": "h", "ad_body": "b", "hashtags": ["sound"]
            }
        }"#;
        let body: CampaignResponseBody = serde_json::from_str(json).unwrap();
        let submitted = ImageAsset::from_bytes(vec![1, 2, 3]);
        let result = body.into_result(&submitted);
        assert!(result.styled_image.is_none());
        assert_eq!(result.original_image, submitted.encoded());
        assert!(result.product_analysis.key_features.is_empty());
    }

    #[test]
    fn refine_body_uses_field_key_as_context() {
        let request = RefineRequest {
            current_text: "Buy Now".into(),
            instruction: "make it louder".into(),
            field: CopyField::AdHeadline,
        };
        let body = RefineRequestBody::from(&request);
        assert_eq!(body.context, "ad_headline");
        assert_eq!(body.refinement_prompt, "make it louder");
    }
}
