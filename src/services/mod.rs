// src/services/mod.rs
pub mod export_service;
pub mod gemini_service;
pub mod generation_engine;
pub mod image_processor;
pub mod post_processor;
pub mod project_store;
pub mod prompt_composer;
pub mod storage_service;

pub use gemini_service::{GeminiService, GenerativeBackend};
pub use generation_engine::GenerationEngine;
pub use image_processor::ImageProcessor;
pub use post_processor::PostProcessor;
pub use project_store::ProjectStore;
pub use storage_service::{MemoryStorage, RedisStorage, Storage};
