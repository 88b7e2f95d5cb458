// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Maximum product images held by a single project.
pub const MAX_PRODUCT_IMAGES: usize = 10;

/// Maximum repetitions a single background selection may request.
pub const MAX_BACKGROUND_COUNT: u32 = 10;

/// Ceiling on the total number of generation jobs a single batch may dispatch.
pub const GENERATION_CEILING: u32 = 100;

/// Background-removal lifecycle of an uploaded product image.
///
/// `Processing` is persisted so a reload mid-flight shows the image as
/// in-progress rather than silently unprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Unprocessed,
    Processing,
    Processed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: Uuid,
    pub original_name: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub mime_type: String,
    #[serde(default, with = "base64_bytes_opt")]
    pub processed_data: Option<Vec<u8>>,
    #[serde(default)]
    pub processed_mime_type: Option<String>,
    #[serde(default)]
    pub status: ProcessingStatus,
    #[serde(default)]
    pub palette: Vec<String>,
}

impl ProductImage {
    /// Bytes and MIME type to feed the generative service: the cut-out
    /// version when background removal has completed, the original otherwise.
    pub fn generation_source(&self) -> (&[u8], &str) {
        match (&self.processed_data, &self.processed_mime_type) {
            (Some(data), Some(mime)) if self.status == ProcessingStatus::Processed => {
                (data, mime)
            }
            _ => (&self.data, &self.mime_type),
        }
    }

    pub fn is_processed(&self) -> bool {
        self.status == ProcessingStatus::Processed
    }
}

/// Photographic direction categories, in prompt composition order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DirectionCategory {
    #[serde(rename = "Camera Angle")]
    CameraAngle,
    #[serde(rename = "Shot Type")]
    ShotType,
    #[serde(rename = "Lighting")]
    Lighting,
    #[serde(rename = "Composition")]
    Composition,
    #[serde(rename = "Focus")]
    Focus,
    #[serde(rename = "Color & Palette")]
    ColorPalette,
    #[serde(rename = "Camera & Film Emulation")]
    FilmEmulation,
}

impl DirectionCategory {
    pub const ALL: [DirectionCategory; 7] = [
        DirectionCategory::CameraAngle,
        DirectionCategory::ShotType,
        DirectionCategory::Lighting,
        DirectionCategory::Composition,
        DirectionCategory::Focus,
        DirectionCategory::ColorPalette,
        DirectionCategory::FilmEmulation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DirectionCategory::CameraAngle => "Camera Angle",
            DirectionCategory::ShotType => "Shot Type",
            DirectionCategory::Lighting => "Lighting",
            DirectionCategory::Composition => "Composition",
            DirectionCategory::Focus => "Focus",
            DirectionCategory::ColorPalette => "Color & Palette",
            DirectionCategory::FilmEmulation => "Camera & Film Emulation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedBackground {
    pub id: Uuid,
    pub name: String,
    pub prompt: String,
    pub count: u32,
    #[serde(default)]
    pub directions: BTreeMap<DirectionCategory, String>,
    #[serde(default)]
    pub match_palette: bool,
    #[serde(default)]
    pub negative_prompt: String,
}

impl SelectedBackground {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            prompt: prompt.into(),
            count: 1,
            directions: BTreeMap::new(),
            match_palette: false,
            negative_prompt: String::new(),
        }
    }
}

/// Video animation lifecycle of a generated image. A failed or timed-out
/// animation reverts to `Idle`; only a terminal URI reaches `Ready`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VideoState {
    #[default]
    Idle,
    Generating,
    Ready {
        url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: Uuid,
    /// Id of the product image this result was generated from. Always a
    /// member of the owning project's `product_images`.
    pub source_id: Uuid,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub mime_type: String,
    /// The exact instruction string sent to the generative service.
    pub prompt: String,
    pub background_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub video: VideoState,
}

/// Static catalog entry describing a rendering style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualStyle {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub prompt: String,
}

/// A reusable snapshot of a style plus background selections, keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub style: Option<VisualStyle>,
    pub backgrounds: Vec<SelectedBackground>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub product_images: Vec<ProductImage>,
    #[serde(default)]
    pub selected_style: Option<VisualStyle>,
    #[serde(default)]
    pub selected_backgrounds: Vec<SelectedBackground>,
    #[serde(default)]
    pub generated_images: Vec<GeneratedImage>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            product_images: Vec::new(),
            selected_style: None,
            selected_backgrounds: Vec::new(),
            generated_images: Vec::new(),
        }
    }

    pub fn processed_images(&self) -> Vec<&ProductImage> {
        self.product_images
            .iter()
            .filter(|img| img.is_processed())
            .collect()
    }

    /// Total jobs a generate action would dispatch right now.
    pub fn planned_jobs(&self) -> u32 {
        let images = self.processed_images().len() as u32;
        let repetitions: u32 = self.selected_backgrounds.iter().map(|bg| bg.count).sum();
        images * repetitions
    }
}

/// Serde helper storing raw bytes as base64 strings instead of JSON arrays.
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}

mod base64_bytes_opt {
    use base64::{Engine as _, engine::general_purpose};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        data: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_some(&general_purpose::STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| general_purpose::STANDARD.decode(&s))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_image_bytes_round_trip_as_base64() {
        let img = ProductImage {
            id: Uuid::new_v4(),
            original_name: "mug.png".into(),
            data: vec![0x89, 0x50, 0x4E, 0x47],
            mime_type: "image/png".into(),
            processed_data: Some(vec![1, 2, 3]),
            processed_mime_type: Some("image/png".into()),
            status: ProcessingStatus::Processed,
            palette: vec!["#aabbcc".into()],
        };
        let json = serde_json::to_string(&img).unwrap();
        assert!(json.contains("iVBORw"), "data should be base64, got {json}");
        let back: ProductImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, img.data);
        assert_eq!(back.processed_data, img.processed_data);
        assert_eq!(back.status, ProcessingStatus::Processed);
    }

    #[test]
    fn generation_source_prefers_processed_bytes() {
        let mut img = ProductImage {
            id: Uuid::new_v4(),
            original_name: "mug.png".into(),
            data: vec![1],
            mime_type: "image/jpeg".into(),
            processed_data: Some(vec![2]),
            processed_mime_type: Some("image/png".into()),
            status: ProcessingStatus::Processed,
            palette: vec![],
        };
        assert_eq!(img.generation_source(), (&[2u8][..], "image/png"));

        img.status = ProcessingStatus::Failed;
        assert_eq!(img.generation_source(), (&[1u8][..], "image/jpeg"));
    }

    #[test]
    fn direction_categories_keep_composition_order() {
        let mut map = BTreeMap::new();
        map.insert(DirectionCategory::FilmEmulation, "film".to_string());
        map.insert(DirectionCategory::CameraAngle, "angle".to_string());
        map.insert(DirectionCategory::Lighting, "light".to_string());
        let order: Vec<_> = map.keys().copied().collect();
        assert_eq!(
            order,
            vec![
                DirectionCategory::CameraAngle,
                DirectionCategory::Lighting,
                DirectionCategory::FilmEmulation,
            ]
        );
    }

    #[test]
    fn planned_jobs_counts_processed_images_only() {
        let mut project = Project::new("Test");
        for processed in [true, true, false] {
            project.product_images.push(ProductImage {
                id: Uuid::new_v4(),
                original_name: "p.png".into(),
                data: vec![0],
                mime_type: "image/png".into(),
                processed_data: processed.then(|| vec![0]),
                processed_mime_type: processed.then(|| "image/png".to_string()),
                status: if processed {
                    ProcessingStatus::Processed
                } else {
                    ProcessingStatus::Unprocessed
                },
                palette: vec![],
            });
        }
        let mut bg = SelectedBackground::new("Beach", "A beach at sunset.");
        bg.count = 3;
        project.selected_backgrounds.push(bg);
        project
            .selected_backgrounds
            .push(SelectedBackground::new("Loft", "A loft."));

        // 2 processed images x (3 + 1) repetitions
        assert_eq!(project.planned_jobs(), 8);
    }

    #[test]
    fn video_state_defaults_to_idle_on_old_payloads() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "source_id": Uuid::new_v4(),
            "data": "",
            "mime_type": "image/png",
            "prompt": "p",
            "background_name": "b",
            "created_at": Utc::now(),
        });
        let img: GeneratedImage = serde_json::from_value(json).unwrap();
        assert_eq!(img.video, VideoState::Idle);
    }
}
