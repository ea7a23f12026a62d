use aws_sdk_bedrockruntime::Client;
use serde_json::{json, Value};

use super::{extract_json_object, invoke_json};
use crate::{
    error::{AdForgeError, Result},
    models::{parse_hashtags, ImageAsset, MarketingCopy, ProductAnalysis, RefineRequest},
};

const ANALYSIS_PROMPT: &str = r##"Analyze this product image. Return JSON only:
{
    "name": "Product name",
    "category": "Category",
    "key_features": ["feature1", "feature2", "feature3"],
    "target_audience": "Target audience",
    "color_palette": ["#hex1", "#hex2"],
    "mood": "professional/playful/luxury/minimal"
}"##;

/// Nova Lite calls: image analysis, copywriting and refinement.
#[derive(Clone)]
pub struct TextClient {
    client: Client,
    model_id: String,
}

impl TextClient {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    async fn converse(&self, content: Value, max_tokens: u32, temperature: f32) -> Result<String> {
        let payload = json!({
            "schemaVersion": "messages-v1",
            "messages": [{ "role": "user", "content": content }],
            "inferenceConfig": {
                "maxTokens": max_tokens,
                "temperature": temperature
            }
        });

        let response = invoke_json(&self.client, &self.model_id, &payload).await?;
        response["output"]["message"]["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find_map(|block| block["text"].as_str()))
            .map(str::to_string)
            .ok_or_else(|| AdForgeError::ResponseError("model returned no text".into()))
    }

    pub async fn analyze_product(&self, image: &ImageAsset) -> Result<ProductAnalysis> {
        let content = json!([
            {
                "image": {
                    "format": image.media_type().format(),
                    "source": { "bytes": image.to_base64() }
                }
            },
            { "text": ANALYSIS_PROMPT }
        ]);

        let text = self.converse(content, 1024, 0.7).await?;
        Ok(analysis_from_output(&text))
    }

    pub async fn write_copy(
        &self,
        product: &ProductAnalysis,
        creative_brief: Option<&str>,
    ) -> Result<MarketingCopy> {
        let text = self
            .converse(json!([{ "text": copy_prompt(product, creative_brief) }]), 1024, 0.8)
            .await?;
        Ok(copy_from_output(&text, product))
    }

    pub async fn refine(&self, request: &RefineRequest) -> Result<String> {
        let prompt = format!(
            "Refine this marketing copy based on the user's request.\n\n\
             Context: {}\n\
             Current Text: \"{}\"\n\
             User Request: \"{}\"\n\n\
             Return ONLY the refined text. Do not include quotes or explanations.",
            request.field.key(),
            request.current_text,
            request.instruction
        );

        let text = self.converse(json!([{ "text": prompt }]), 512, 0.7).await?;
        let refined = strip_wrapping_quotes(text.trim());
        if refined.is_empty() {
            return Err(AdForgeError::ResponseError("model returned empty text".into()));
        }
        Ok(refined.to_string())
    }
}

fn copy_prompt(product: &ProductAnalysis, creative_brief: Option<&str>) -> String {
    let mut prompt = format!(
        "Create marketing copy for {} ({}).\nFeatures: {}\nTarget: {}\n",
        product.name,
        product.category,
        product.key_features.join(", "),
        if product.target_audience.is_empty() {
            "General"
        } else {
            product.target_audience.as_str()
        }
    );
    if let Some(brief) = creative_brief.map(str::trim).filter(|brief| !brief.is_empty()) {
        prompt.push_str(&format!("Creative direction: {}\n", brief));
    }
    prompt.push_str(
        r#"
Return JSON only:
{
    "instagram_caption": "Caption with emojis",
    "email_subject": "Email subject line",
    "ad_headline": "Ad headline",
    "ad_body": "Ad body text",
    "hashtags": ["tag1", "tag2", "tag3"]
}"#,
    );
    prompt
}

fn text_or(value: &Value, key: &str, default: &str) -> String {
    value[key]
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn list_or(value: &Value, key: &str, default: &[&str]) -> Vec<String> {
    match value[key].as_array() {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|item| item.to_string()).collect(),
    }
}

/// Unparseable output degrades to a generic analysis rather than failing.
fn analysis_from_output(text: &str) -> ProductAnalysis {
    let value = extract_json_object(text).unwrap_or_else(|| {
        log::warn!("Product analysis was not JSON, using defaults");
        Value::Null
    });

    ProductAnalysis {
        name: text_or(&value, "name", "Product"),
        category: text_or(&value, "category", "General"),
        mood: text_or(&value, "mood", "professional"),
        key_features: list_or(&value, "key_features", &["Quality", "Value"]),
        target_audience: text_or(&value, "target_audience", "General consumers"),
        color_palette: list_or(&value, "color_palette", &["#000000", "#FFFFFF"]),
    }
}

fn copy_from_output(text: &str, product: &ProductAnalysis) -> MarketingCopy {
    let value = extract_json_object(text).unwrap_or_else(|| {
        log::warn!("Marketing copy was not JSON, using defaults");
        Value::Null
    });

    let hashtags = list_or(&value, "hashtags", &["newproduct", "trending", "musthave"])
        .iter()
        .flat_map(|tag| parse_hashtags(tag))
        .collect();

    MarketingCopy {
        instagram_caption: text_or(
            &value,
            "instagram_caption",
            &format!("Check out {}!", product.name),
        ),
        email_subject: text_or(&value, "email_subject", &format!("Discover {}", product.name)),
        ad_headline: text_or(&value, "ad_headline", &format!("{} - Made for You", product.name)),
        ad_body: text_or(&value, "ad_body", "Experience quality like never before."),
        hashtags,
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(text)
}
