// src/catalog.rs
//
// Static reference data: visual styles, the curated background library,
// photographic direction fragments, and animation presets. Entries are
// read-only; user selections copy what they need into the project.
use crate::models::{DirectionCategory, VisualStyle};
use serde::Serialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, Serialize)]
pub struct CuratedBackground {
    pub name: &'static str,
    pub prompt: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackgroundCategory {
    pub category: &'static str,
    pub locations: &'static [CuratedBackground],
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionOption {
    pub name: &'static str,
    pub prompt: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimationPreset {
    pub name: &'static str,
    pub prompt: &'static str,
}

pub static VISUAL_STYLES: LazyLock<Vec<VisualStyle>> = LazyLock::new(|| {
    [
        (
            "Hyper Realistic",
            "Ultra-detailed, photorealistic rendering with lifelike textures and lighting.",
            r#"<svg viewBox="0 0 24 24"><path d="M12 2L6 7l6 5 6-5-6-5z"/><path d="M6 17l6 5 6-5"/></svg>"#,
            "A hyper-realistic, high-resolution macro photograph of the product. Emphasize lifelike textures and natural, soft-window lighting that highlights crisp details, making it indistinguishable from a real photo.",
        ),
        (
            "3D Claymation",
            "Charming, handcrafted look with visible fingerprints and soft, rounded shapes.",
            r#"<svg viewBox="0 0 24 24"><path d="M20.4 4.6a5.4 5.4 0 0 0-7.6 0l-.7.7a5.4 5.4 0 0 0 0 7.6l.7.7a5.4 5.4 0 0 0 7.6 0l.7-.7a5.4 5.4 0 0 0 0-7.6z"/></svg>"#,
            "A close-up shot of the product, rendered in a 3D claymation style. Everything should look handcrafted from modeling clay, with soft, rounded edges, visible fingerprints, and a slightly imperfect, tactile quality under warm, soft lighting.",
        ),
        (
            "Ghibli-Inspired",
            "Lush, hand-painted anime style with a sense of wonder and beautiful landscapes.",
            r#"<svg viewBox="0 0 24 24"><path d="M12.5 11.5a2.5 2.5 0 0 1-5 0V7a5 5 0 0 1 10 0v4.5a2.5 2.5 0 0 1-5 0Z"/></svg>"#,
            "An illustration of the product in a Ghibli-inspired anime style. The product should be the clear focus, set against a lush, hand-painted watercolor background with soft, nostalgic lighting to create a whimsical atmosphere.",
        ),
        (
            "Vintage Polaroid",
            "Faded colors, soft focus, and a classic white border for a nostalgic, retro feel.",
            r#"<svg viewBox="0 0 24 24"><rect x="2" y="2" width="20" height="20" rx="2"/></svg>"#,
            "A simulated vintage Polaroid photograph of the product. Apply a soft focus with a shallow depth of field, a faded color palette with a warm yellow tint, light leaks, and a classic instant film border.",
        ),
        (
            "Isometric 3D",
            "Clean, stylized 3D graphics on a floating diorama with a playful aesthetic.",
            r#"<svg viewBox="0 0 24 24"><path d="m22 8-10 7-10-7"/><path d="M12 22V12"/></svg>"#,
            "A clean, isometric 3D illustration of the product as the central element on a small, floating diorama. Use simplified geometry, a bright color palette, and soft, ambient lighting.",
        ),
        (
            "Pop Art",
            "Bold outlines, vibrant, blocky colors, and Ben-Day dots, in the style of Warhol.",
            r#"<svg viewBox="0 0 24 24"><circle cx="7" cy="7" r="1"/><circle cx="17" cy="7" r="1"/><circle cx="7" cy="17" r="1"/><circle cx="17" cy="17" r="1"/></svg>"#,
            "A vibrant Pop Art composition featuring the product. Use bold, black outlines, flat planes of saturated color, and incorporate halftone or Ben-Day dot patterns in the background to make the product stand out.",
        ),
        (
            "Cinematic Noir",
            "High-contrast black and white, dramatic shadows, and a moody, mysterious atmosphere.",
            r#"<svg viewBox="0 0 24 24"><path d="M12 3a6 6 0 0 0 9 9 9 9 0 1 1-9-9Z"/></svg>"#,
            "A cinematic film noir style shot of the product. Use high-contrast black and white with dramatic, low-key lighting to cast long, deep shadows, creating a mysterious and moody atmosphere.",
        ),
        (
            "Pixel Art",
            "Retro 16-bit video game aesthetic with a limited color palette and visible pixels.",
            r#"<svg viewBox="0 0 24 24"><rect x="3" y="3" width="7" height="7"/><rect x="14" y="3" width="7" height="7"/><rect x="3" y="14" width="7" height="7"/><rect x="14" y="14" width="7" height="7"/></svg>"#,
            "A 16-bit pixel art sprite of the product. The image should be composed of visible square pixels and use a limited color palette, presented as if it were an item in a classic SNES video game.",
        ),
    ]
    .into_iter()
    .map(|(name, description, icon, prompt)| VisualStyle {
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        prompt: prompt.to_string(),
    })
    .collect()
});

pub static BACKGROUND_LIBRARY: &[BackgroundCategory] = &[
    BackgroundCategory {
        category: "Aspirational Lifestyle & Home",
        locations: &[
            CuratedBackground {
                name: "The Sun-drenched Scandinavian Loft",
                prompt: "A medium shot of the product on a table in a sun-drenched Scandinavian loft. The scene is captured with soft morning light streaming through large windows, creating gentle highlights on the product. Minimalist furniture is artfully blurred in the background.",
            },
            CuratedBackground {
                name: "The Artisan's Workshop",
                prompt: "A close-up shot of the product on a workbench in a beautiful, messy artisan's workshop. Warm, focused light illuminates the product, with raw materials like wood shavings and neatly hung tools visible in the soft-focus background.",
            },
            CuratedBackground {
                name: "The Zen Reading Nook",
                prompt: "A cozy, quiet reading nook. The composition is a tight shot focusing on the product placed next to a stack of books, with the soft glow of a single warm lamp creating a calm, focused mood against a dark wall.",
            },
            CuratedBackground {
                name: "The Bustling Parisian Café Terrace",
                prompt: "A chic Parisian café terrace. The product is the sharp focus on a small, round metal table, with a croissant and coffee nearby. A shallow depth of field blurs the classic architecture and a stylish passerby in the background.",
            },
        ],
    },
    BackgroundCategory {
        category: "Rugged & Natural Settings",
        locations: &[
            CuratedBackground {
                name: "The Misty Redwood Forest Floor",
                prompt: "The floor of a misty redwood forest. The product rests on a bed of rich moss, with dappled light breaking through the foggy canopy to create beautiful, natural spotlights on it.",
            },
            CuratedBackground {
                name: "The Volcanic Black Sand Beach at Dusk",
                prompt: "A dramatic volcanic black sand beach at dusk. The shot is a low-angle view, capturing the high contrast of waves crashing and sending white seafoam over the dark, wet sand that reflects the purple sky.",
            },
            CuratedBackground {
                name: "The Salt Flats at Midday",
                prompt: "A vast, minimalist salt flat landscape. The shot emphasizes the immense sense of scale, with the product casting a single, harsh shadow on the perfectly flat, white expanse under a deep blue sky.",
            },
            CuratedBackground {
                name: "The African Savannah at Sunset",
                prompt: "On a termite mound in the vast, golden African savannah. The scene is a dramatic silhouette shot, with the product and a herd of elephants in the distant background against a fiery sunset.",
            },
        ],
    },
    BackgroundCategory {
        category: "Futuristic & Sci-Fi Scenarios",
        locations: &[
            CuratedBackground {
                name: "The Neon-Soaked Cyberpunk Alleyway",
                prompt: "A wet, reflective cyberpunk alleyway. The scene is lit by bright pink and blue neon signs, with steam rising from a vent and reflecting on the wet ground around the product.",
            },
            CuratedBackground {
                name: "The Zero-Gravity Space Station Hub",
                prompt: "The interior of a zero-gravity space station hub. The product floats weightlessly in the foreground, with small, spherical water droplets suspended nearby, in front of a large window showing a stunning view of Earth.",
            },
            CuratedBackground {
                name: "The Bioluminescent Alien Jungle",
                prompt: "A mysterious alien jungle at night. The scene is lit by the mysterious, bioluminescent blue and purple glow of exotic, strange and beautiful plants and fungi surrounding the product.",
            },
        ],
    },
    BackgroundCategory {
        category: "E-commerce & Studio Setups",
        locations: &[
            CuratedBackground {
                name: "Clean E-commerce White Background",
                prompt: "The product is shot on a seamless, pure white (#FFFFFF) cyclorama background. Use even, soft, and shadowless lighting to clearly display all product details for an e-commerce listing.",
            },
            CuratedBackground {
                name: "Product on a Pedestal",
                prompt: "A minimalist studio shot where the product is placed on a simple geometric pedestal made of concrete or marble, against a solid-colored background.",
            },
            CuratedBackground {
                name: "Reflective Surface Studio",
                prompt: "The product is placed on a glossy, reflective black surface, creating a perfect, mirror-like reflection underneath it. The scene is lit with soft, dramatic studio lights.",
            },
            CuratedBackground {
                name: "Hard Light & Shadow Play",
                prompt: "A modern studio shot using a single, hard light source to cast sharp, graphic, and elongated shadows from the product, creating a high-fashion, dramatic look.",
            },
        ],
    },
];

/// One-line scene prompts drawn for the "surprise me" random batch.
pub static DIVERSE_BACKGROUND_PROMPTS: &[&str] = &[
    "on a modern, minimalist beach house terrace overlooking a serene ocean at sunset.",
    "in a lush, private garden with vibrant flowers and soft, dappled sunlight.",
    "in a chic New York City loft apartment with exposed brick and a view of the skyline.",
    "on a rustic wooden table in a sunlit, cozy kitchen with fresh herbs.",
    "on a dramatic volcanic black sand beach with moody, overcast skies.",
    "on a sleek, futuristic product display with neon lights and a reflective surface.",
    "in a tranquil zen garden with raked sand, mossy rocks, and a cherry blossom tree.",
    "in a cozy, dimly lit library with towering bookshelves and a warm fireplace.",
];

pub static DIRECTIONS: &[(DirectionCategory, &[DirectionOption])] = &[
    (
        DirectionCategory::CameraAngle,
        &[
            DirectionOption { name: "Eye-Level", prompt: "An eye-level shot" },
            DirectionOption { name: "Low Angle", prompt: "A dramatic low-angle shot" },
            DirectionOption { name: "High Angle", prompt: "A high-angle shot looking down" },
            DirectionOption { name: "Dutch Angle", prompt: "A dynamic dutch-angle shot" },
            DirectionOption {
                name: "Bird's-Eye View",
                prompt: "A bird's-eye view looking straight down at the product",
            },
        ],
    ),
    (
        DirectionCategory::ShotType,
        &[
            DirectionOption { name: "Wide Shot", prompt: "A wide shot of the product" },
            DirectionOption { name: "Medium Shot", prompt: "A medium shot of the product" },
            DirectionOption { name: "Close-Up", prompt: "A close-up shot focusing on" },
            DirectionOption {
                name: "Macro Shot",
                prompt: "An extreme macro shot of the product's texture",
            },
        ],
    ),
    (
        DirectionCategory::Lighting,
        &[
            DirectionOption {
                name: "Soft, Diffused",
                prompt: "bathed in soft, diffused window light.",
            },
            DirectionOption {
                name: "Hard, Direct",
                prompt: "lit by a single source of hard, direct light, creating dramatic shadows.",
            },
            DirectionOption {
                name: "Golden Hour",
                prompt: "captured during the golden hour, with warm, long shadows.",
            },
            DirectionOption {
                name: "Rim Lighting",
                prompt: "dramatically backlit, creating a bright rim of light around the product's silhouette.",
            },
            DirectionOption {
                name: "Neon",
                prompt: "illuminated by the vibrant glow of pink and blue neon signs.",
            },
        ],
    ),
    (
        DirectionCategory::Composition,
        &[
            DirectionOption {
                name: "Rule of Thirds",
                prompt: "A composition using the rule of thirds, placing the product on the right",
            },
            DirectionOption {
                name: "Symmetrical",
                prompt: "A perfectly centered and symmetrical composition",
            },
            DirectionOption {
                name: "Negative Space",
                prompt: "A minimalist composition with a large area of negative space around the product",
            },
        ],
    ),
    (
        DirectionCategory::Focus,
        &[
            DirectionOption {
                name: "Deep Depth of Field",
                prompt: "shot with a deep depth of field, keeping the entire scene in sharp focus.",
            },
            DirectionOption {
                name: "Shallow Depth of Field",
                prompt: "shot with a very shallow depth of field, creating a beautifully blurred background.",
            },
            DirectionOption {
                name: "Lens Flare",
                prompt: "with a dramatic, cinematic lens flare from the sun.",
            },
        ],
    ),
    (
        DirectionCategory::ColorPalette,
        &[
            DirectionOption {
                name: "Monochromatic Palette",
                prompt: "using a cool, monochromatic blue color palette.",
            },
            DirectionOption {
                name: "Complementary Palette",
                prompt: "a dynamic composition using the complementary colors of orange and blue.",
            },
            DirectionOption {
                name: "Desaturated / Muted Tones",
                prompt: "a desaturated and muted color palette for a moody, cinematic feel.",
            },
        ],
    ),
    (
        DirectionCategory::FilmEmulation,
        &[
            DirectionOption {
                name: "Classic Polaroid 600",
                prompt: "photo taken on a Polaroid 600 camera, with its characteristic soft focus and faded colors.",
            },
            DirectionOption {
                name: "Kodak Portra 400 Film",
                prompt: "shot on Kodak Portra 400 film, with warm tones, rich color, and a cinematic quality.",
            },
            DirectionOption {
                name: "Disposable Camera with Flash",
                prompt: "a nostalgic photo taken on a disposable camera with a harsh direct flash and grainy texture.",
            },
        ],
    ),
];

pub static ANIMATION_PRESETS: &[AnimationPreset] = &[
    AnimationPreset {
        name: "Subtle Ambiance",
        prompt: "Create a subtle ambiance with gentle motion in the background (e.g., steam rising, leaves rustling, clouds drifting).",
    },
    AnimationPreset {
        name: "Product Spotlight",
        prompt: "Create a slow, elegant 360-degree rotation of the product.",
    },
    AnimationPreset {
        name: "3D Photo Parallax",
        prompt: "Generate a subtle 3D parallax camera pan effect, giving the image a sense of depth.",
    },
];

pub fn find_style(name: &str) -> Option<&'static VisualStyle> {
    VISUAL_STYLES.iter().find(|s| s.name == name)
}

pub fn find_background(name: &str) -> Option<&'static CuratedBackground> {
    BACKGROUND_LIBRARY
        .iter()
        .flat_map(|cat| cat.locations.iter())
        .find(|loc| loc.name == name)
}

pub fn find_direction(
    category: DirectionCategory,
    name: &str,
) -> Option<&'static DirectionOption> {
    DIRECTIONS
        .iter()
        .find(|(cat, _)| *cat == category)
        .and_then(|(_, options)| options.iter().find(|opt| opt.name == name))
}

pub fn find_animation_preset(name: &str) -> Option<&'static AnimationPreset> {
    ANIMATION_PRESETS.iter().find(|preset| preset.name == name)
}

/// Full catalog payload served to clients.
pub fn catalog_payload() -> serde_json::Value {
    serde_json::json!({
        "styles": &*VISUAL_STYLES,
        "backgrounds": BACKGROUND_LIBRARY,
        "directions": DIRECTIONS
            .iter()
            .map(|(category, options)| {
                serde_json::json!({
                    "category": category.label(),
                    "options": options,
                })
            })
            .collect::<Vec<_>>(),
        "animation_presets": ANIMATION_PRESETS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_lookup_is_exact() {
        assert!(find_style("Hyper Realistic").is_some());
        assert!(find_style("hyper realistic").is_none());
    }

    #[test]
    fn low_angle_direction_resolves() {
        let opt = find_direction(DirectionCategory::CameraAngle, "Low Angle").unwrap();
        assert_eq!(opt.prompt, "A dramatic low-angle shot");
    }

    #[test]
    fn every_background_name_is_unique() {
        let mut names: Vec<&str> = BACKGROUND_LIBRARY
            .iter()
            .flat_map(|cat| cat.locations.iter().map(|loc| loc.name))
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn directions_cover_all_categories_in_order() {
        let cats: Vec<_> = DIRECTIONS.iter().map(|(c, _)| *c).collect();
        assert_eq!(cats, DirectionCategory::ALL.to_vec());
    }
}
