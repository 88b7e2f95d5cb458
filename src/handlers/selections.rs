// src/handlers/selections.rs
use crate::AppState;
use crate::catalog;
use crate::errors::BackdropError;
use crate::models::{
    DirectionCategory, GENERATION_CEILING, MAX_BACKGROUND_COUNT, Preset, SelectedBackground,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

pub async fn get_catalog() -> HttpResponse {
    HttpResponse::Ok().json(catalog::catalog_payload())
}

#[derive(Debug, Deserialize)]
pub struct SetStyleRequest {
    pub name: String,
}

pub async fn set_style(
    data: web::Data<AppState>,
    body: web::Json<SetStyleRequest>,
) -> Result<HttpResponse, BackdropError> {
    let style = catalog::find_style(&body.name)
        .ok_or_else(|| BackdropError::NotFound("Visual style".to_string()))?
        .clone();

    let (_, project) = data
        .store
        .update_active(move |project| {
            project.selected_style = Some(style);
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(project))
}

fn validate_count(count: u32, processed_images: u32) -> Result<(), BackdropError> {
    if count == 0 {
        return Err(BackdropError::Validation(
            "Background count must be at least 1".to_string(),
        ));
    }
    if count > MAX_BACKGROUND_COUNT {
        return Err(BackdropError::LimitExceeded(format!(
            "Background count is capped at {}",
            MAX_BACKGROUND_COUNT
        )));
    }
    if count * processed_images.max(1) > GENERATION_CEILING {
        return Err(BackdropError::LimitExceeded(format!(
            "{} repetitions across {} processed images would exceed the ceiling of {} generations",
            count, processed_images, GENERATION_CEILING
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct AddBackgroundRequest {
    /// Curated background name; mutually exclusive with `prompt`.
    pub name: Option<String>,
    /// Custom scene prompt.
    pub prompt: Option<String>,
}

pub async fn add_background(
    data: web::Data<AppState>,
    body: web::Json<AddBackgroundRequest>,
) -> Result<HttpResponse, BackdropError> {
    let body = body.into_inner();

    let (name, prompt) = match (body.name, body.prompt) {
        (Some(name), _) => {
            let curated = catalog::find_background(&name)
                .ok_or_else(|| BackdropError::NotFound("Background".to_string()))?;
            (curated.name.to_string(), curated.prompt.to_string())
        }
        (None, Some(prompt)) => {
            let prompt = prompt.trim().to_string();
            if prompt.is_empty() {
                return Err(BackdropError::Validation(
                    "Custom background prompt must not be empty".to_string(),
                ));
            }
            ("Custom Scene".to_string(), prompt)
        }
        (None, None) => {
            return Err(BackdropError::Validation(
                "Provide a curated background name or a custom prompt".to_string(),
            ));
        }
    };

    let (_, project) = data
        .store
        .update_active(move |project| {
            let processed = project.processed_images().len() as u32;

            // Re-selecting an already-selected prompt bumps its count
            // instead of duplicating the row.
            if let Some(existing) = project
                .selected_backgrounds
                .iter_mut()
                .find(|bg| bg.prompt == prompt)
            {
                validate_count(existing.count + 1, processed)?;
                existing.count += 1;
                return Ok(());
            }

            project
                .selected_backgrounds
                .push(SelectedBackground::new(name, prompt));
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(project))
}

#[derive(Debug, Deserialize)]
pub struct DirectionUpdate {
    pub category: DirectionCategory,
    /// Option name from the catalog; `null` clears the category.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBackgroundRequest {
    pub count: Option<u32>,
    pub match_palette: Option<bool>,
    pub negative_prompt: Option<String>,
    pub direction: Option<DirectionUpdate>,
}

pub async fn update_background(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBackgroundRequest>,
) -> Result<HttpResponse, BackdropError> {
    let background_id = path.into_inner();
    let UpdateBackgroundRequest {
        count,
        match_palette,
        negative_prompt,
        direction,
    } = body.into_inner();

    let direction = match direction {
        Some(DirectionUpdate {
            category,
            name: Some(name),
        }) => {
            let option = catalog::find_direction(category, &name)
                .ok_or_else(|| BackdropError::NotFound("Direction".to_string()))?;
            Some((category, Some(option.prompt.to_string())))
        }
        Some(DirectionUpdate {
            category,
            name: None,
        }) => Some((category, None)),
        None => None,
    };

    let (_, project) = data
        .store
        .update_active(move |project| {
            let processed = project.processed_images().len() as u32;
            let background = project
                .selected_backgrounds
                .iter_mut()
                .find(|bg| bg.id == background_id)
                .ok_or_else(|| BackdropError::NotFound("Background selection".to_string()))?;

            if let Some(count) = count {
                validate_count(count, processed)?;
                background.count = count;
            }
            if let Some(match_palette) = match_palette {
                background.match_palette = match_palette;
            }
            if let Some(negative_prompt) = negative_prompt {
                background.negative_prompt = negative_prompt;
            }
            match direction {
                Some((category, Some(fragment))) => {
                    background.directions.insert(category, fragment);
                }
                Some((category, None)) => {
                    background.directions.remove(&category);
                }
                None => {}
            }
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(project))
}

pub async fn remove_background_selection(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let background_id = path.into_inner();

    let (_, project) = data
        .store
        .update_active(|project| {
            let before = project.selected_backgrounds.len();
            project
                .selected_backgrounds
                .retain(|bg| bg.id != background_id);
            if project.selected_backgrounds.len() == before {
                return Err(BackdropError::NotFound("Background selection".to_string()));
            }
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(project))
}

pub async fn clear_backgrounds(
    data: web::Data<AppState>,
) -> Result<HttpResponse, BackdropError> {
    let (_, project) = data
        .store
        .update_active(|project| {
            project.selected_backgrounds.clear();
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(project))
}

#[derive(Debug, Deserialize)]
pub struct SavePresetRequest {
    pub name: String,
}

/// Snapshot the active project's style and background selections under a
/// name. Saving over an existing name replaces it.
pub async fn save_preset(
    data: web::Data<AppState>,
    body: web::Json<SavePresetRequest>,
) -> Result<HttpResponse, BackdropError> {
    let name = body.into_inner().name.trim().to_string();
    if name.is_empty() {
        return Err(BackdropError::Validation(
            "Preset name must not be empty".to_string(),
        ));
    }

    let project = data
        .store
        .active_project()
        .await
        .ok_or_else(|| BackdropError::NotFound("Active project".to_string()))?;

    let preset = Preset {
        name: name.clone(),
        style: project.selected_style.clone(),
        backgrounds: project.selected_backgrounds.clone(),
    };
    data.store.save_preset(preset).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "saved": name })))
}

pub async fn list_presets(data: web::Data<AppState>) -> Result<HttpResponse, BackdropError> {
    Ok(HttpResponse::Ok().json(data.store.presets().await))
}

pub async fn delete_preset(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BackdropError> {
    let name = path.into_inner();
    data.store.delete_preset(&name).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": name })))
}

pub async fn apply_preset(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BackdropError> {
    let preset = data
        .store
        .find_preset(&path.into_inner())
        .await
        .ok_or_else(|| BackdropError::NotFound("Preset".to_string()))?;

    let (_, project) = data
        .store
        .update_active(move |project| {
            project.selected_style = preset.style;
            project.selected_backgrounds = preset
                .backgrounds
                .into_iter()
                .map(|mut bg| {
                    // Fresh ids so selections stay unique per project.
                    bg.id = Uuid::new_v4();
                    bg
                })
                .collect();
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(project))
}
