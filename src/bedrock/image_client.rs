use aws_sdk_bedrockruntime::Client;
use serde::Deserialize;
use serde_json::json;

use super::invoke_json;
use crate::{
    error::{AdForgeError, Result},
    models::{EncodedImage, ProductAnalysis, StylePreset},
};

const NEGATIVE_PROMPT: &str =
    "text, watermark, low quality, blurry, distorted, deformed, ugly, bad anatomy, pixelated, grain";

#[derive(Deserialize)]
struct CanvasResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Nova Canvas text-to-image calls for the campaign hero shot.
#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    model_id: String,
}

impl ImageClient {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    pub async fn restyle(&self, product: &ProductAnalysis, style: StylePreset) -> Result<EncodedImage> {
        let payload = json!({
            "taskType": "TEXT_IMAGE",
            "textToImageParams": {
                "text": style_prompt(product, style),
                "negativeText": NEGATIVE_PROMPT
            },
            "imageGenerationConfig": {
                "numberOfImages": 1,
                "height": 1024,
                "width": 1024,
                "cfgScale": 9.0
            }
        });

        log::info!("Generating {} image with model: {}", style, self.model_id);
        let value = invoke_json(&self.client, &self.model_id, &payload).await?;
        let response: CanvasResponse = serde_json::from_value(value)
            .map_err(|e| AdForgeError::ResponseError(e.to_string()))?;

        if let Some(error) = response.error.filter(|error| !error.is_empty()) {
            return Err(AdForgeError::ResponseError(error));
        }
        response
            .images
            .into_iter()
            .next()
            .map(EncodedImage)
            .ok_or_else(|| AdForgeError::ResponseError("No images generated".into()))
    }
}

fn style_prompt(product: &ProductAnalysis, style: StylePreset) -> String {
    let name = &product.name;
    let colors = product.color_palette.join(", ");
    let scene = match style {
        StylePreset::Professional => format!(
            "high-end commercial product photography of {}, soft studio lighting, pastel {} background, \
             sharp focus, 8k, highly detailed, advertising standard, rule of thirds, clean composition",
            name, colors
        ),
        StylePreset::Luxury => format!(
            "cinematic 3D render style of {}, dramatic neon lighting, dark elegant background, floating elements, \
             ray tracing, futuristic, premium advertising, glowing edges",
            name
        ),
        StylePreset::Playful => format!(
            "artistic top-down shot of {}, textured background with smeared {} paint, high contrast, vibrant, \
             pop art style, creative composition, social media trend",
            name, colors
        ),
        StylePreset::Minimal => format!(
            "architectural product photography of {}, pure solid background, hard shadows, geometric composition, \
             design magazine style, 8k resolution",
            name
        ),
    };
    format!(
        "{}, masterpiece, professional color grading, sharp details, no text, no watermarks",
        scene
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductAnalysis {
        ProductAnalysis {
            name: "EcoChronos Watch".into(),
            category: "Accessories".into(),
            mood: "luxury".into(),
            key_features: vec![],
            target_audience: String::new(),
            color_palette: vec!["#2E4A3B".into(), "#F2E8D5".into()],
        }
    }

    #[test]
    fn every_preset_names_the_product() {
        for style in [
            StylePreset::Professional,
            StylePreset::Luxury,
            StylePreset::Playful,
            StylePreset::Minimal,
        ] {
            let prompt = style_prompt(&product(), style);
            assert!(prompt.contains("EcoChronos Watch"), "{}", style);
            assert!(prompt.ends_with("no watermarks"));
        }
    }

    #[test]
    fn palette_feeds_colour_driven_presets() {
        assert!(style_prompt(&product(), StylePreset::Professional).contains("#2E4A3B, #F2E8D5"));
        assert!(!style_prompt(&product(), StylePreset::Minimal).contains("#2E4A3B"));
    }
}
