// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use log::info;
use std::sync::Arc;

mod catalog;
mod config;
mod errors;
mod handlers;
mod models;
mod services;

use crate::config::Config;
use crate::handlers::{generation, projects, selections, uploads};
use crate::services::{
    GeminiService, GenerationEngine, GenerativeBackend, ImageProcessor, MemoryStorage,
    PostProcessor, ProjectStore, RedisStorage, Storage,
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<ProjectStore>,
    engine: Arc<GenerationEngine>,
    postprocessor: Arc<PostProcessor>,
    images: Arc<ImageProcessor>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting backdrop service...");

    let config = Config::from_env()?;

    let storage: Arc<dyn Storage> = if config.redis_url == "memory" {
        info!("Using in-memory storage; state will not survive restarts");
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(RedisStorage::new(&config.redis_url).await?)
    };
    let store = Arc::new(ProjectStore::load(storage).await);

    let backend: Arc<dyn GenerativeBackend> =
        Arc::new(GeminiService::new(config.gemini_api_key.clone()));
    let engine = Arc::new(GenerationEngine::new(Arc::clone(&backend)));
    let postprocessor = Arc::new(PostProcessor::new(backend));
    let images = Arc::new(ImageProcessor::new());

    let app_state = AppState {
        store,
        engine,
        postprocessor,
        images,
    };

    info!("Starting HTTP server on {}:{}", config.host, config.port);

    let bind_addr = (config.host.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api/v1")
                    .route("/catalog", web::get().to(selections::get_catalog))
                    .route("/projects", web::post().to(projects::create_project))
                    .route("/projects", web::get().to(projects::list_projects))
                    .route(
                        "/projects/active",
                        web::get().to(projects::get_active_project),
                    )
                    .route("/projects/{id}", web::get().to(projects::get_project))
                    .route(
                        "/projects/{id}/activate",
                        web::post().to(projects::activate_project),
                    )
                    .route("/projects/{id}", web::delete().to(projects::delete_project))
                    .route("/uploads", web::post().to(uploads::upload_images))
                    .route("/uploads/{id}", web::delete().to(uploads::delete_image))
                    .route(
                        "/uploads/{id}/remove-background",
                        web::post().to(uploads::remove_background),
                    )
                    .route("/style", web::put().to(selections::set_style))
                    .route("/backgrounds", web::post().to(selections::add_background))
                    .route(
                        "/backgrounds",
                        web::delete().to(selections::clear_backgrounds),
                    )
                    .route(
                        "/backgrounds/{id}",
                        web::patch().to(selections::update_background),
                    )
                    .route(
                        "/backgrounds/{id}",
                        web::delete().to(selections::remove_background_selection),
                    )
                    .route("/presets", web::get().to(selections::list_presets))
                    .route("/presets", web::post().to(selections::save_preset))
                    .route(
                        "/presets/{name}",
                        web::delete().to(selections::delete_preset),
                    )
                    .route(
                        "/presets/{name}/apply",
                        web::post().to(selections::apply_preset),
                    )
                    .route("/generate", web::post().to(generation::generate))
                    .route(
                        "/generate/random",
                        web::post().to(generation::generate_random),
                    )
                    .route(
                        "/generated/{id}/upscale",
                        web::post().to(generation::upscale),
                    )
                    .route(
                        "/generated/{id}/reimagine",
                        web::post().to(generation::reimagine),
                    )
                    .route(
                        "/generated/{id}/outpaint",
                        web::post().to(generation::outpaint),
                    )
                    .route(
                        "/generated/{id}/variations",
                        web::post().to(generation::variations),
                    )
                    .route(
                        "/generated/{id}/describe",
                        web::post().to(generation::describe),
                    )
                    .route(
                        "/generated/{id}/animate",
                        web::post().to(generation::animate),
                    )
                    .route(
                        "/generated/{id}/download",
                        web::get().to(generation::download),
                    )
                    .route("/export", web::get().to(generation::export_archive)),
            )
            .route("/health", web::get().to(health_check))
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "backdrop",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
