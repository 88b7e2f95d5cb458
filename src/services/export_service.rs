// src/services/export_service.rs
use crate::errors::BackdropError;
use crate::models::{GeneratedImage, Project};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

fn stem(image: &GeneratedImage) -> String {
    let short_id = &image.id.to_string()[..8];
    format!("{}-{}", slug(&image.background_name), short_id)
}

pub fn download_name(image: &GeneratedImage) -> String {
    format!("{}.{}", stem(image), extension(&image.mime_type))
}

fn sidecar(project: &Project, image: &GeneratedImage) -> String {
    let product = project
        .product_images
        .iter()
        .find(|p| p.id == image.source_id)
        .map(|p| p.original_name.as_str())
        .unwrap_or("unknown");

    format!(
        "Product: {}\nStyle: {}\nBackground: {}\nGenerated: {}\nPrompt:\n{}\n",
        product,
        project
            .selected_style
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("none"),
        image.background_name,
        image.created_at.to_rfc3339(),
        image.prompt,
    )
}

/// Zip every generated image together with a sidecar text file recording
/// the product, style, background, timestamp, and the composed prompt.
pub fn export_project(project: &Project) -> Result<Vec<u8>, BackdropError> {
    if project.generated_images.is_empty() {
        return Err(BackdropError::Validation(
            "Project has no generated images to export".to_string(),
        ));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for image in &project.generated_images {
        let stem = stem(image);

        writer
            .start_file(format!("{}.{}", stem, extension(&image.mime_type)), options)
            .map_err(|e| BackdropError::Serialization(format!("Zip error: {}", e)))?;
        writer
            .write_all(&image.data)
            .map_err(|e| BackdropError::Serialization(format!("Zip write error: {}", e)))?;

        writer
            .start_file(format!("{}.txt", stem), options)
            .map_err(|e| BackdropError::Serialization(format!("Zip error: {}", e)))?;
        writer
            .write_all(sidecar(project, image).as_bytes())
            .map_err(|e| BackdropError::Serialization(format!("Zip write error: {}", e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| BackdropError::Serialization(format!("Zip finalize error: {}", e)))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProcessingStatus, ProductImage, VideoState, VisualStyle};
    use chrono::Utc;
    use std::io::Read;
    use uuid::Uuid;
    use zip::ZipArchive;

    fn project_with_results() -> Project {
        let mut project = Project::new("Campaign");
        let source_id = Uuid::new_v4();
        project.product_images.push(ProductImage {
            id: source_id,
            original_name: "ceramic-mug.png".into(),
            data: vec![1],
            mime_type: "image/png".into(),
            processed_data: None,
            processed_mime_type: None,
            status: ProcessingStatus::Processed,
            palette: vec![],
        });
        project.selected_style = Some(VisualStyle {
            name: "Cinematic Noir".into(),
            description: String::new(),
            icon: String::new(),
            prompt: "Noir.".into(),
        });
        for _ in 0..2 {
            project.generated_images.push(GeneratedImage {
                id: Uuid::new_v4(),
                source_id,
                data: vec![0xAA, 0xBB],
                mime_type: "image/png".into(),
                prompt: "the full composed prompt".into(),
                background_name: "The Zen Reading Nook".into(),
                created_at: Utc::now(),
                video: VideoState::Idle,
            });
        }
        project
    }

    #[test]
    fn archive_holds_an_image_and_sidecar_per_result() {
        let project = project_with_results();
        let bytes = export_project(&project).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 4);

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names.iter().filter(|n| n.ends_with(".png")).count(), 2);
        assert_eq!(names.iter().filter(|n| n.ends_with(".txt")).count(), 2);

        let sidecar_name = names.iter().find(|n| n.ends_with(".txt")).unwrap().clone();
        let mut sidecar = String::new();
        archive
            .by_name(&sidecar_name)
            .unwrap()
            .read_to_string(&mut sidecar)
            .unwrap();
        assert!(sidecar.contains("Product: ceramic-mug.png"));
        assert!(sidecar.contains("Style: Cinematic Noir"));
        assert!(sidecar.contains("Background: The Zen Reading Nook"));
        assert!(sidecar.contains("the full composed prompt"));
    }

    #[test]
    fn empty_project_cannot_be_exported() {
        let project = Project::new("Empty");
        assert!(matches!(
            export_project(&project).unwrap_err(),
            BackdropError::Validation(_)
        ));
    }

    #[test]
    fn download_name_is_slugged_with_extension() {
        let project = project_with_results();
        let name = download_name(&project.generated_images[0]);
        assert!(name.starts_with("the-zen-reading-nook-"));
        assert!(name.ends_with(".png"));
    }
}
