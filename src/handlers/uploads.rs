// src/handlers/uploads.rs
use crate::AppState;
use crate::errors::BackdropError;
use crate::models::{MAX_PRODUCT_IMAGES, ProcessingStatus, ProductImage};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::TryStreamExt;
use log::info;
use uuid::Uuid;

/// Largest edge shipped to the generative service; bigger uploads are
/// downscaled on ingest.
const MAX_EDGE: u32 = 2048;

pub async fn upload_images(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, BackdropError> {
    let mut staged: Vec<ProductImage> = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| BackdropError::Validation(format!("Malformed upload: {}", e)))?
    {
        let content_disposition = field.content_disposition();
        let filename = content_disposition
            .get_filename()
            .ok_or_else(|| BackdropError::Validation("No filename provided".to_string()))?
            .to_string();

        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !content_type.starts_with("image/") {
            return Err(BackdropError::Validation(format!(
                "'{}' is not an image upload ({})",
                filename, content_type
            )));
        }

        let mut image_data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| BackdropError::Validation(format!("Upload stream error: {}", e)))?
        {
            image_data.extend_from_slice(&chunk);
        }

        data.images.validate_image(&image_data)?;
        let processed_data = data.images.resize_if_needed(&image_data, MAX_EDGE)?;
        let palette = data.images.extract_palette(&processed_data);

        staged.push(ProductImage {
            id: Uuid::new_v4(),
            original_name: filename,
            data: processed_data,
            mime_type: content_type,
            processed_data: None,
            processed_mime_type: None,
            status: ProcessingStatus::Unprocessed,
            palette,
        });
    }

    if staged.is_empty() {
        return Err(BackdropError::Validation(
            "No image files in upload".to_string(),
        ));
    }

    let count = staged.len();
    let ids: Vec<Uuid> = staged.iter().map(|img| img.id).collect();

    let (_, project) = data
        .store
        .update_active(move |project| {
            if project.product_images.len() + staged.len() > MAX_PRODUCT_IMAGES {
                return Err(BackdropError::LimitExceeded(format!(
                    "A project holds at most {} product images",
                    MAX_PRODUCT_IMAGES
                )));
            }
            project.product_images.extend(staged);
            Ok(())
        })
        .await?;

    info!("uploaded {} image(s) to project {}", count, project.id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "project_id": project.id,
        "uploaded_images": ids,
        "count": count
    })))
}

pub async fn delete_image(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let image_id = path.into_inner();

    let (_, project) = data
        .store
        .update_active(|project| {
            let before = project.product_images.len();
            project.product_images.retain(|img| img.id != image_id);
            if project.product_images.len() == before {
                return Err(BackdropError::NotFound("Product image".to_string()));
            }
            // Results derived from the removed image would dangle otherwise.
            project
                .generated_images
                .retain(|img| img.source_id != image_id);
            Ok(())
        })
        .await?;

    Ok(HttpResponse::Ok().json(project))
}

/// Run background removal for one product image. The status enum is
/// persisted through the whole transition so a mid-flight reload cannot
/// observe a half-processed record.
pub async fn remove_background(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let image_id = path.into_inner();

    let (source, _) = data
        .store
        .update_active(|project| {
            let image = project
                .product_images
                .iter_mut()
                .find(|img| img.id == image_id)
                .ok_or_else(|| BackdropError::NotFound("Product image".to_string()))?;
            image.status = ProcessingStatus::Processing;
            Ok((image.data.clone(), image.mime_type.clone()))
        })
        .await?;

    let (bytes, mime_type) = source;
    let result = data.postprocessor.remove_background(&bytes, &mime_type).await;

    match result {
        Ok(part) => {
            let (_, project) = data
                .store
                .update_active(|project| {
                    let image = project
                        .product_images
                        .iter_mut()
                        .find(|img| img.id == image_id)
                        .ok_or_else(|| BackdropError::NotFound("Product image".to_string()))?;
                    image.processed_data = Some(part.data);
                    image.processed_mime_type = Some(part.mime_type);
                    image.status = ProcessingStatus::Processed;
                    Ok(())
                })
                .await?;
            Ok(HttpResponse::Ok().json(project))
        }
        Err(e) => {
            data.store
                .update_active(|project| {
                    if let Some(image) = project
                        .product_images
                        .iter_mut()
                        .find(|img| img.id == image_id)
                    {
                        image.status = ProcessingStatus::Failed;
                    }
                    Ok(())
                })
                .await?;
            Err(e)
        }
    }
}
