use serde::{Deserialize, Serialize, Serializer};

use super::{AspectRatio, ImagePayload, ImageSize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl From<&ImagePayload> for InlineData {
    fn from(image: &ImagePayload) -> Self {
        Self {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        }
    }
}

/// One content part of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

impl Part {
    pub fn image(image: &ImagePayload) -> Self {
        Part::InlineData {
            inline_data: image.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }

    pub fn as_inline_data(&self) -> Option<&InlineData> {
        match self {
            Part::InlineData { inline_data } => Some(inline_data),
            Part::Text { .. } => None,
        }
    }
}

/// Per-request generation settings. `None` means the block is left out of the
/// request entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationConfig {
    #[default]
    None,
    Image {
        aspect_ratio: AspectRatio,
        image_size: ImageSize,
    },
    Thinking {
        budget: u32,
    },
}

impl GenerationConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, GenerationConfig::None)
    }
}

/// Ordered parts plus optional configuration, sent as one `generateContent` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestEnvelope {
    pub parts: Vec<Part>,
    pub config: GenerationConfig,
}

impl RequestEnvelope {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            parts,
            config: GenerationConfig::None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::StudioError::SerializationError(e.to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBody<'a> {
    contents: [WireContent<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: &'a [Part],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum WireGenerationConfig {
    ImageConfig {
        #[serde(rename = "aspectRatio")]
        aspect_ratio: AspectRatio,
        #[serde(rename = "imageSize")]
        image_size: ImageSize,
    },
    ThinkingConfig {
        #[serde(rename = "thinkingBudget")]
        thinking_budget: u32,
    },
}

impl Serialize for RequestEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let generation_config = match self.config {
            GenerationConfig::None => None,
            GenerationConfig::Image {
                aspect_ratio,
                image_size,
            } => Some(WireGenerationConfig::ImageConfig {
                aspect_ratio,
                image_size,
            }),
            GenerationConfig::Thinking { budget } => Some(WireGenerationConfig::ThinkingConfig {
                thinking_budget: budget,
            }),
        };

        WireBody {
            contents: [WireContent {
                role: "user",
                parts: &self.parts,
            }],
            generation_config,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape_without_config() {
        let image = ImagePayload::new("AAAA", "image/jpeg");
        let envelope = RequestEnvelope::new(vec![Part::image(&image), Part::text("describe")]);

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AAAA" } },
                        { "text": "describe" }
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_wire_shape_with_image_config() {
        let envelope = RequestEnvelope::new(vec![Part::text("a red cube")]).with_config(
            GenerationConfig::Image {
                aspect_ratio: AspectRatio::Wide,
                image_size: ImageSize::Size2K,
            },
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value["generationConfig"],
            json!({ "imageConfig": { "aspectRatio": "16:9", "imageSize": "2K" } })
        );
    }

    #[test]
    fn test_wire_shape_with_thinking_config() {
        let envelope = RequestEnvelope::new(vec![Part::text("why?")])
            .with_config(GenerationConfig::Thinking { budget: 1024 });

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value["generationConfig"],
            json!({ "thinkingConfig": { "thinkingBudget": 1024 } })
        );
    }

    #[test]
    fn test_part_accessors() {
        let text = Part::text("hello");
        assert_eq!(text.as_text(), Some("hello"));
        assert!(text.as_inline_data().is_none());

        let image = Part::image(&ImagePayload::png("AAAA"));
        assert_eq!(image.as_inline_data().unwrap().mime_type, "image/png");
        assert!(image.as_text().is_none());
    }
}
