// src/handlers/generation.rs
use crate::AppState;
use crate::catalog;
use crate::errors::BackdropError;
use crate::handlers::find_generated;
use crate::models::{Project, VideoState};
use crate::services::export_service;
use actix_web::{HttpResponse, web};
use log::info;
use serde::Deserialize;
use uuid::Uuid;

async fn active_project(data: &web::Data<AppState>) -> Result<Project, BackdropError> {
    data.store
        .active_project()
        .await
        .ok_or_else(|| BackdropError::NotFound("Active project".to_string()))
}

/// Fan out one generation batch over the active project's selections and
/// fold the survivors back in.
pub async fn generate(data: web::Data<AppState>) -> Result<HttpResponse, BackdropError> {
    let project = active_project(&data).await?;
    let images = data.engine.generate_batch(&project).await?;

    info!(
        "batch for project {} produced {} image(s)",
        project.id,
        images.len()
    );

    let produced = images.len();
    let (_, project) = data
        .store
        .update_active(move |project| {
            project.generated_images.extend(images);
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "generated": produced,
        "project": project
    })))
}

#[derive(Debug, Deserialize)]
pub struct RandomBatchRequest {
    pub count: u32,
}

pub async fn generate_random(
    data: web::Data<AppState>,
    body: web::Json<RandomBatchRequest>,
) -> Result<HttpResponse, BackdropError> {
    let project = active_project(&data).await?;
    let images = data.engine.generate_random(&project, body.count).await?;

    let produced = images.len();
    let (_, project) = data
        .store
        .update_active(move |project| {
            project.generated_images.extend(images);
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "generated": produced,
        "project": project
    })))
}

/// Swap a generated image's bytes in place, keeping its id.
async fn replace_in_place(
    data: &web::Data<AppState>,
    image_id: Uuid,
    part: crate::services::gemini_service::ImagePart,
) -> Result<Project, BackdropError> {
    let (_, project) = data
        .store
        .update_active(move |project| {
            let image = project
                .generated_images
                .iter_mut()
                .find(|img| img.id == image_id)
                .ok_or_else(|| BackdropError::NotFound("Generated image".to_string()))?;
            image.data = part.data;
            image.mime_type = part.mime_type;
            Ok(())
        })
        .await?;
    Ok(project)
}

pub async fn upscale(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let image_id = path.into_inner();
    let project = active_project(&data).await?;
    let image = find_generated(&project, image_id)?;

    let part = data.postprocessor.upscale(image).await?;
    let project = replace_in_place(&data, image_id, part).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[derive(Debug, Deserialize)]
pub struct ReimagineRequest {
    pub instruction: String,
}

pub async fn reimagine(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ReimagineRequest>,
) -> Result<HttpResponse, BackdropError> {
    let image_id = path.into_inner();
    let project = active_project(&data).await?;
    let image = find_generated(&project, image_id)?;

    let part = data.postprocessor.reimagine(image, &body.instruction).await?;
    let project = replace_in_place(&data, image_id, part).await?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn outpaint(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let image_id = path.into_inner();
    let project = active_project(&data).await?;
    let image = find_generated(&project, image_id)?;

    let part = data.postprocessor.outpaint(image).await?;
    let project = replace_in_place(&data, image_id, part).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[derive(Debug, Deserialize)]
pub struct VariationsRequest {
    pub count: u32,
}

pub async fn variations(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<VariationsRequest>,
) -> Result<HttpResponse, BackdropError> {
    let image_id = path.into_inner();
    let project = active_project(&data).await?;
    let image = find_generated(&project, image_id)?;

    let results = data.postprocessor.variations(image, body.count).await?;
    let produced = results.len();

    let (_, project) = data
        .store
        .update_active(move |project| {
            project.generated_images.extend(results);
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "generated": produced,
        "project": project
    })))
}

pub async fn describe(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let project = active_project(&data).await?;
    let image = find_generated(&project, path.into_inner())?;

    let prompt = data.postprocessor.describe(image).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "prompt": prompt })))
}

#[derive(Debug, Deserialize)]
pub struct AnimateRequest {
    /// Free-form motion prompt; mutually exclusive with `preset`.
    pub prompt: Option<String>,
    /// Name of a catalog animation preset.
    pub preset: Option<String>,
    pub aspect_ratio: Option<String>,
}

/// Animate a generated image. The image's video state is `Generating` while
/// the operation polls and reverts to `Idle` on failure or timeout.
pub async fn animate(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AnimateRequest>,
) -> Result<HttpResponse, BackdropError> {
    let image_id = path.into_inner();
    let body = body.into_inner();

    let prompt = match (body.prompt, body.preset) {
        (Some(prompt), _) if !prompt.trim().is_empty() => prompt,
        (_, Some(preset)) => catalog::find_animation_preset(&preset)
            .ok_or_else(|| BackdropError::NotFound("Animation preset".to_string()))?
            .prompt
            .to_string(),
        _ => {
            return Err(BackdropError::Validation(
                "Provide a motion prompt or an animation preset".to_string(),
            ));
        }
    };
    let aspect_ratio = body.aspect_ratio.unwrap_or_else(|| "16:9".to_string());

    let (image, _) = data
        .store
        .update_active(|project| {
            let image = project
                .generated_images
                .iter_mut()
                .find(|img| img.id == image_id)
                .ok_or_else(|| BackdropError::NotFound("Generated image".to_string()))?;
            if image.video == VideoState::Generating {
                return Err(BackdropError::Validation(
                    "A video is already being generated for this image".to_string(),
                ));
            }
            image.video = VideoState::Generating;
            Ok(image.clone())
        })
        .await?;

    let result = data.postprocessor.animate(&image, &prompt, &aspect_ratio).await;

    let video = match &result {
        Ok(url) => VideoState::Ready { url: url.clone() },
        Err(_) => VideoState::Idle,
    };
    let (_, project) = data
        .store
        .update_active(move |project| {
            if let Some(image) = project
                .generated_images
                .iter_mut()
                .find(|img| img.id == image_id)
            {
                image.video = video;
            }
            Ok(())
        })
        .await?;

    result?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn download(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let project = active_project(&data).await?;
    let image = find_generated(&project, path.into_inner())?;

    Ok(HttpResponse::Ok()
        .content_type(image.mime_type.clone())
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"{}\"",
                export_service::download_name(image)
            ),
        ))
        .body(image.data.clone()))
}

pub async fn export_archive(data: web::Data<AppState>) -> Result<HttpResponse, BackdropError> {
    let project = active_project(&data).await?;
    let archive = export_service::export_project(&project)?;

    Ok(HttpResponse::Ok()
        .content_type("application/zip")
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"{}-backdrops.zip\"",
                project.name.to_lowercase().replace(' ', "-")
            ),
        ))
        .body(archive))
}
