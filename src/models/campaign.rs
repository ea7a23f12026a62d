use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::image::EncodedImage;
use crate::error::AdForgeError;

pub const HASHTAG_MARKER: char = '#';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub name: String,
    pub category: String,
    pub mood: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub color_palette: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingCopy {
    pub instagram_caption: String,
    pub email_subject: String,
    pub ad_headline: String,
    pub ad_body: String,
    #[serde(deserialize_with = "deserialize_hashtags")]
    pub hashtags: Vec<String>,
}

/// One independently refinable key of [`MarketingCopy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyField {
    InstagramCaption,
    EmailSubject,
    AdHeadline,
    AdBody,
    Hashtags,
}

impl CopyField {
    pub const ALL: [CopyField; 5] = [
        CopyField::InstagramCaption,
        CopyField::EmailSubject,
        CopyField::AdHeadline,
        CopyField::AdBody,
        CopyField::Hashtags,
    ];

    /// Wire key, also sent to the refinement service as context.
    pub fn key(&self) -> &'static str {
        match self {
            CopyField::InstagramCaption => "instagram_caption",
            CopyField::EmailSubject => "email_subject",
            CopyField::AdHeadline => "ad_headline",
            CopyField::AdBody => "ad_body",
            CopyField::Hashtags => "hashtags",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CopyField::InstagramCaption => "Instagram",
            CopyField::EmailSubject => "Email Subject",
            CopyField::AdHeadline => "Ad Headline",
            CopyField::AdBody => "Ad Body",
            CopyField::Hashtags => "Hashtags",
        }
    }
}

impl fmt::Display for CopyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CopyField {
    type Err = AdForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CopyField::ALL
            .into_iter()
            .find(|field| field.key() == wanted)
            .ok_or_else(|| AdForgeError::UnknownField(wanted.to_string()))
    }
}

impl MarketingCopy {
    /// The field as editable text. Hashtags render as `#a #b`.
    pub fn field_text(&self, field: CopyField) -> String {
        match field {
            CopyField::InstagramCaption => self.instagram_caption.clone(),
            CopyField::EmailSubject => self.email_subject.clone(),
            CopyField::AdHeadline => self.ad_headline.clone(),
            CopyField::AdBody => self.ad_body.clone(),
            CopyField::Hashtags => render_hashtags(&self.hashtags),
        }
    }

    pub fn set_field(&mut self, field: CopyField, value: &str) {
        match field {
            CopyField::InstagramCaption => self.instagram_caption = value.to_string(),
            CopyField::EmailSubject => self.email_subject = value.to_string(),
            CopyField::AdHeadline => self.ad_headline = value.to_string(),
            CopyField::AdBody => self.ad_body = value.to_string(),
            CopyField::Hashtags => self.hashtags = parse_hashtags(value),
        }
    }
}

/// Splits free text into bare hashtag tokens: separators are whitespace,
/// commas and the marker itself, so no token ever contains the marker.
pub fn parse_hashtags(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == HASHTAG_MARKER)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn render_hashtags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("{}{}", HASHTAG_MARKER, tag))
        .collect::<Vec<_>>()
        .join(" ")
}

fn deserialize_hashtags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.iter().flat_map(|tag| parse_hashtags(tag)).collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignResult {
    pub product_analysis: ProductAnalysis,
    pub marketing_copy: MarketingCopy,
    /// `None` when restyling failed upstream; the campaign is still usable.
    #[serde(default)]
    pub styled_image: Option<EncodedImage>,
    pub original_image: EncodedImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy() -> MarketingCopy {
        MarketingCopy {
            instagram_caption: "caption".into(),
            email_subject: "subject".into(),
            ad_headline: "Buy Now".into(),
            ad_body: "body".into(),
            hashtags: vec!["sale".into(), "newdrop".into()],
        }
    }

    #[test]
    fn field_keys_round_trip() {
        for field in CopyField::ALL {
            assert_eq!(field.key().parse::<CopyField>().unwrap(), field);
        }
        assert!(matches!(
            "product_name".parse::<CopyField>(),
            Err(AdForgeError::UnknownField(key)) if key == "product_name"
        ));
    }

    #[test]
    fn hashtags_render_and_parse_back() {
        let copy = copy();
        let rendered = copy.field_text(CopyField::Hashtags);
        assert_eq!(rendered, "#sale #newdrop");
        assert_eq!(parse_hashtags(&rendered), copy.hashtags);
    }

    #[test]
    fn hashtag_tokens_never_contain_marker() {
        assert_eq!(
            parse_hashtags("#one,two  ##three#four"),
            vec!["one", "two", "three", "four"]
        );
        assert!(parse_hashtags(" # , ").is_empty());
    }

    #[test]
    fn service_hashtags_are_normalised() {
        let json = r##"{
            "instagram_caption": "c",
            "email_subject": "s",
            "ad_headline": "h",
            "ad_body": "b",
            "hashtags": ["#sale", "newdrop", ""]
        }"##;
        let copy: MarketingCopy = serde_json::from_str(json).unwrap();
        assert_eq!(copy.hashtags, vec!["sale", "newdrop"]);
    }

    #[test]
    fn missing_copy_key_is_rejected() {
        let json = r#"{"instagram_caption": "c", "email_subject": "s", "ad_headline": "h", "hashtags": []}"#;
        assert!(serde_json::from_str::<MarketingCopy>(json).is_err());
    }

    #[test]
    fn set_field_touches_only_that_field() {
        let mut edited = copy();
        edited.set_field(CopyField::AdHeadline, "Shop Today");
        let mut expected = copy();
        expected.ad_headline = "Shop Today".into();
        assert_eq!(edited, expected);
    }
}
