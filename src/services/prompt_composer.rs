// src/services/prompt_composer.rs
//
// Deterministic instruction assembly for the generative service. Clause
// order is load-bearing: the downstream model weighs earlier instructions
// more heavily, so the fidelity mandate anchors every prompt, followed by
// scene, style, and only then the optional modifiers.
use crate::models::{DirectionCategory, SelectedBackground, VisualStyle};

/// Non-negotiable block prefixed to every composite-generation prompt.
pub const MANDATE_BLOCK: &str = "\
CORE PRINCIPLES (Non-negotiable):
- Product Fidelity: The original product must remain completely unchanged, preserving all details.
- Context: The product must be placed logically and naturally within the scene.
- Quality: The final image must be of hyper-realistic, professional quality, free of any digital artifacts.
- Scale: The product's scale must be perfectly realistic for the surrounding environment.
- Text Sharpness: Any text or logos on the product must be perfectly sharp, readable, and unaltered.
First, perfectly identify and isolate the main product from the supplied image, completely discard its original background, and recompose it as instructed below.";

/// Compose the full instruction for one `(image, background)` generation job.
///
/// Clause order: mandate block, scene description, style mandate, direction
/// fragments (comma-joined, category order), optional color-harmonization
/// clause, optional negative clause. Unselected categories and an empty
/// (post-trim) negative prompt contribute nothing.
pub fn compose(
    style: &VisualStyle,
    background: &SelectedBackground,
    palette: &[String],
) -> String {
    let mut prompt = String::from(MANDATE_BLOCK);

    prompt.push_str("\n\nSCENE DESCRIPTION: ");
    prompt.push_str(background.prompt.trim());

    prompt.push_str("\n\nSTYLE MANDATE: ");
    prompt.push_str(style.prompt.trim());

    let fragments: Vec<&str> = DirectionCategory::ALL
        .iter()
        .filter_map(|category| background.directions.get(category))
        .map(String::as_str)
        .filter(|f| !f.trim().is_empty())
        .collect();
    if !fragments.is_empty() {
        prompt.push_str("\n\nPHOTOGRAPHIC DIRECTION: ");
        prompt.push_str(&fragments.join(", "));
    }

    if background.match_palette && !palette.is_empty() {
        prompt.push_str("\n\nHARMONIZE COLORS: Grade the scene so its lighting and color harmonize with the product's dominant colors: ");
        prompt.push_str(&palette.join(", "));
        prompt.push('.');
    }

    let negative = background.negative_prompt.trim();
    if !negative.is_empty() {
        prompt.push_str("\n\nNEGATIVE PROMPT: The scene must NOT contain any of the following: ");
        prompt.push_str(negative);
        prompt.push('.');
    }

    prompt
}

/// Instruction for cutting the product out of its original photo.
pub fn background_removal_instruction() -> String {
    "Perfectly identify and isolate the main product in this image. Remove the background entirely and output the product alone on a fully transparent background, preserving every detail, edge, and any text or logos exactly as they appear.".to_string()
}

/// Instruction for the in-place upscale operation.
pub fn upscale_instruction() -> String {
    "Upscale this image to a higher resolution. Enhance fine detail and sharpness without altering the composition, colors, or any element of the scene. The product must remain pixel-faithful to the original.".to_string()
}

/// Instruction for an instructed edit of an already-generated image.
pub fn reimagine_instruction(edit: &str) -> String {
    format!(
        "Edit this image as follows: {}. Apply only the requested change; every other element of the scene and the product itself must remain exactly as in the original image.",
        edit.trim()
    )
}

/// Instruction for expanding the canvas and filling the revealed area.
pub fn outpaint_instruction() -> String {
    "Expand this image outward on all sides, extending the existing scene naturally into the newly revealed canvas. The original content must remain unchanged at the center, and the extension must match its lighting, perspective, and style seamlessly.".to_string()
}

/// Instruction for a fresh take that keeps the same scene intent.
pub fn variation_instruction(original_prompt: &str) -> String {
    format!(
        "Create a new variation of this image: same product, same overall scene intent, but a distinctly different camera angle, lighting condition, or composition. Original intent, for reference: {}",
        original_prompt
    )
}

/// Instruction asking the model to describe the image as a reusable prompt.
pub fn describe_instruction() -> String {
    "Describe this image as a single, detailed text-to-image generation prompt that would recreate it as closely as possible. Respond with the prompt text only.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DirectionCategory;

    fn style(prompt: &str) -> VisualStyle {
        VisualStyle {
            name: "Test".into(),
            description: String::new(),
            icon: String::new(),
            prompt: prompt.into(),
        }
    }

    fn offsets(haystack: &str, needles: &[&str]) -> Vec<usize> {
        needles
            .iter()
            .map(|needle| {
                haystack
                    .find(needle)
                    .unwrap_or_else(|| panic!("missing clause: {needle}"))
            })
            .collect()
    }

    #[test]
    fn clause_order_is_fixed() {
        let mut bg = SelectedBackground::new("Beach", "A beach at sunset.");
        bg.directions.insert(
            DirectionCategory::CameraAngle,
            "A dramatic low-angle shot".into(),
        );
        bg.directions
            .insert(DirectionCategory::Lighting, "captured during the golden hour".into());
        bg.match_palette = true;
        bg.negative_prompt = "people, text".into();

        let palette = vec!["#d03030".to_string(), "#3030d0".to_string()];
        let prompt = compose(&style("Claymation style."), &bg, &palette);

        let positions = offsets(
            &prompt,
            &[
                "CORE PRINCIPLES",
                "A beach at sunset.",
                "Claymation style.",
                "A dramatic low-angle shot",
                "HARMONIZE COLORS",
                "NEGATIVE PROMPT",
            ],
        );
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn direction_fragments_follow_category_order() {
        let mut bg = SelectedBackground::new("Studio", "A studio.");
        bg.directions
            .insert(DirectionCategory::FilmEmulation, "on Kodak Portra 400".into());
        bg.directions.insert(
            DirectionCategory::CameraAngle,
            "A dramatic low-angle shot".into(),
        );

        let prompt = compose(&style("Noir."), &bg, &[]);
        let angle = prompt.find("A dramatic low-angle shot").unwrap();
        let film = prompt.find("on Kodak Portra 400").unwrap();
        assert!(angle < film);
    }

    #[test]
    fn spec_example_scenario() {
        let mut bg = SelectedBackground::new("Beach", "A beach at sunset.");
        bg.directions.insert(
            DirectionCategory::CameraAngle,
            "A dramatic low-angle shot".into(),
        );
        bg.match_palette = false;
        bg.negative_prompt = String::new();

        let prompt = compose(&style("Claymation style."), &bg, &[]);

        let positions = offsets(
            &prompt,
            &[
                "CORE PRINCIPLES",
                "A beach at sunset.",
                "Claymation style.",
                "A dramatic low-angle shot",
            ],
        );
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!prompt.contains("HARMONIZE COLORS"));
        assert!(!prompt.contains("NEGATIVE PROMPT"));
    }

    #[test]
    fn match_palette_without_colors_adds_nothing() {
        let mut bg = SelectedBackground::new("Studio", "A studio.");
        bg.match_palette = true;
        let prompt = compose(&style("Noir."), &bg, &[]);
        assert!(!prompt.contains("HARMONIZE COLORS"));
    }

    #[test]
    fn whitespace_negative_prompt_is_dropped() {
        let mut bg = SelectedBackground::new("Studio", "A studio.");
        bg.negative_prompt = "   \n  ".into();
        let prompt = compose(&style("Noir."), &bg, &[]);
        assert!(!prompt.contains("NEGATIVE PROMPT"));
    }

    #[test]
    fn empty_directions_add_no_clause() {
        let bg = SelectedBackground::new("Studio", "A studio.");
        let prompt = compose(&style("Noir."), &bg, &[]);
        assert!(!prompt.contains("PHOTOGRAPHIC DIRECTION"));
    }
}
