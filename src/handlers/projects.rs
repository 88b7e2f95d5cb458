// src/handlers/projects.rs
use crate::AppState;
use crate::errors::BackdropError;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
}

pub async fn create_project(
    data: web::Data<AppState>,
    body: web::Json<CreateProjectRequest>,
) -> Result<HttpResponse, BackdropError> {
    let name = body.into_inner().name.filter(|n| !n.trim().is_empty());
    let project = data.store.create_project(name).await;
    Ok(HttpResponse::Created().json(project))
}

pub async fn list_projects(data: web::Data<AppState>) -> Result<HttpResponse, BackdropError> {
    let summaries = data.store.summaries().await;
    Ok(HttpResponse::Ok().json(summaries))
}

pub async fn get_active_project(
    data: web::Data<AppState>,
) -> Result<HttpResponse, BackdropError> {
    match data.store.active_project().await {
        Some(project) => Ok(HttpResponse::Ok().json(project)),
        None => Err(BackdropError::NotFound("Active project".to_string())),
    }
}

pub async fn get_project(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    match data.store.get(path.into_inner()).await {
        Some(project) => Ok(HttpResponse::Ok().json(project)),
        None => Err(BackdropError::NotFound("Project".to_string())),
    }
}

pub async fn activate_project(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let project = data.store.activate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn delete_project(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BackdropError> {
    let id = path.into_inner();
    data.store.delete(id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": id })))
}
