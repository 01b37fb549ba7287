//! Pure request construction, one function per operation.

use crate::{
    config::ModelSet,
    models::{
        AspectRatio, GenerationConfig, ImagePayload, ImageSize, Operation, Part, RequestEnvelope,
    },
};

/// Upper bound on the thinking tokens requested for extended analysis.
pub const THINKING_BUDGET: u32 = 32768;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltRequest {
    pub operation: Operation,
    pub model: String,
    pub envelope: RequestEnvelope,
}

pub fn texture_swap_prompt(instruction: &str) -> String {
    format!(
        "You are an expert image editor.\n\
         Image 1 is the TARGET environment/object.\n\
         Image 2 is the REFERENCE texture/material.\n\
         \n\
         User Request: {}\n\
         \n\
         Instruction: Edit Image 1 by applying the material/texture characteristics from Image 2 \
         to the specified object in Image 1.\n\
         Maintain the lighting and perspective of Image 1 as much as possible, but replace the \
         surface material.\n\
         Return ONLY the edited image.",
        instruction
    )
}

/// Target image, reference image, then the templated instruction. The template
/// refers to the images by position, so this order must not change.
pub fn build_texture_swap(
    models: &ModelSet,
    target: &ImagePayload,
    reference: &ImagePayload,
    instruction: &str,
) -> BuiltRequest {
    BuiltRequest {
        operation: Operation::TextureSwap,
        model: models.texture.clone(),
        envelope: RequestEnvelope::new(vec![
            Part::image(target),
            Part::image(reference),
            Part::text(texture_swap_prompt(instruction)),
        ]),
    }
}

pub fn build_generate(
    models: &ModelSet,
    prompt: &str,
    aspect_ratio: AspectRatio,
    image_size: ImageSize,
) -> BuiltRequest {
    BuiltRequest {
        operation: Operation::Generate,
        model: models.generation.clone(),
        envelope: RequestEnvelope::new(vec![Part::text(prompt)]).with_config(
            GenerationConfig::Image {
                aspect_ratio,
                image_size,
            },
        ),
    }
}

pub fn build_analyze(
    models: &ModelSet,
    image: &ImagePayload,
    prompt: &str,
    extended_reasoning: bool,
) -> BuiltRequest {
    let config = if extended_reasoning {
        GenerationConfig::Thinking {
            budget: THINKING_BUDGET,
        }
    } else {
        GenerationConfig::None
    };

    BuiltRequest {
        operation: Operation::Analyze,
        model: models.analysis.clone(),
        envelope: RequestEnvelope::new(vec![Part::image(image), Part::text(prompt)])
            .with_config(config),
    }
}
