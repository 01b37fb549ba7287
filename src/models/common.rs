use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StudioError;

/// Opaque API key used to authorize remote calls.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(***)")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    TextureSwap,
    Generate,
    Analyze,
}

impl Operation {
    pub fn all() -> [Operation; 3] {
        [Operation::TextureSwap, Operation::Generate, Operation::Analyze]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TextureSwap => "texture_swap",
            Operation::Generate => "generate",
            Operation::Analyze => "analyze",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Operation::TextureSwap => "Texture Studio",
            Operation::Generate => "Pro Generator",
            Operation::Analyze => "Deep Analysis",
        }
    }

    /// Image-producing operations fail when the response holds no image.
    pub fn produces_image(&self) -> bool {
        !matches!(self, Operation::Analyze)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "16:9")]
    Wide,
}

impl AspectRatio {
    pub fn all() -> [AspectRatio; 5] {
        [
            AspectRatio::Square,
            AspectRatio::Portrait,
            AspectRatio::Landscape,
            AspectRatio::Tall,
            AspectRatio::Wide,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Tall => "9:16",
            AspectRatio::Wide => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AspectRatio::all()
            .into_iter()
            .find(|ratio| {
                ratio.as_str() == needle || format!("{:?}", ratio).to_ascii_lowercase() == needle
            })
            .ok_or_else(|| {
                StudioError::ConfigError(format!(
                    "Unsupported aspect ratio '{}', expected one of: {}",
                    s,
                    AspectRatio::all().map(|r| r.as_str()).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    Size1K,
    #[serde(rename = "2K")]
    Size2K,
    #[serde(rename = "4K")]
    Size4K,
}

impl ImageSize {
    pub fn all() -> [ImageSize; 3] {
        [ImageSize::Size1K, ImageSize::Size2K, ImageSize::Size4K]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Size1K => "1K",
            ImageSize::Size2K => "2K",
            ImageSize::Size4K => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_uppercase();
        ImageSize::all()
            .into_iter()
            .find(|size| size.as_str() == needle)
            .ok_or_else(|| {
                StudioError::ConfigError(format!(
                    "Unsupported image size '{}', expected one of: 1K, 2K, 4K",
                    s
                ))
            })
    }
}
