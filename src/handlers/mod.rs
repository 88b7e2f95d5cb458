// src/handlers/mod.rs
pub mod generation;
pub mod projects;
pub mod selections;
pub mod uploads;

use crate::errors::BackdropError;
use crate::models::{GeneratedImage, Project};
use uuid::Uuid;

/// Look up a generated image in a project snapshot.
pub(crate) fn find_generated(
    project: &Project,
    id: Uuid,
) -> Result<&GeneratedImage, BackdropError> {
    project
        .generated_images
        .iter()
        .find(|img| img.id == id)
        .ok_or_else(|| BackdropError::NotFound("Generated image".to_string()))
}
