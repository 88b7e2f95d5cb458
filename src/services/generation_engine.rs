// src/services/generation_engine.rs
use crate::catalog::DIVERSE_BACKGROUND_PROMPTS;
use crate::errors::BackdropError;
use crate::models::{
    GENERATION_CEILING, GeneratedImage, MAX_BACKGROUND_COUNT, Project, SelectedBackground,
    VideoState,
};
use crate::services::gemini_service::{GenerativeBackend, Outcome};
use crate::services::prompt_composer;
use bytes::Bytes;
use chrono::Utc;
use futures_util::future::join_all;
use log::warn;
use rand::seq::SliceRandom;
use std::sync::Arc;
use uuid::Uuid;

/// One `(image, background, repetition)` triple ready to dispatch.
struct PlannedJob {
    source_id: Uuid,
    background_name: String,
    prompt: String,
    image: Bytes,
    mime_type: String,
}

/// Fans a project's selections out into concurrent generation calls and
/// collects whatever succeeds.
pub struct GenerationEngine {
    backend: Arc<dyn GenerativeBackend>,
}

impl GenerationEngine {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Generate for every selected background of the active project.
    pub async fn generate_batch(
        &self,
        project: &Project,
    ) -> Result<Vec<GeneratedImage>, BackdropError> {
        let jobs = plan_jobs(project, &project.selected_backgrounds)?;
        self.run(jobs).await
    }

    /// Generate `count` images against randomly drawn scene prompts,
    /// ignoring the project's background selections.
    pub async fn generate_random(
        &self,
        project: &Project,
        count: u32,
    ) -> Result<Vec<GeneratedImage>, BackdropError> {
        if count == 0 {
            return Err(BackdropError::Validation(
                "Random batch count must be at least 1".to_string(),
            ));
        }

        let mut pool: Vec<&str> = DIVERSE_BACKGROUND_PROMPTS.to_vec();
        pool.shuffle(&mut rand::thread_rng());

        let backgrounds: Vec<SelectedBackground> = (0..count as usize)
            .map(|i| {
                SelectedBackground::new("Random Scene", pool[i % pool.len()])
            })
            .collect();

        let jobs = plan_jobs(project, &backgrounds)?;
        self.run(jobs).await
    }

    /// Dispatch all jobs concurrently and await them jointly. Individual
    /// failures are logged and dropped; only a batch with zero successes is
    /// an error.
    async fn run(&self, jobs: Vec<PlannedJob>) -> Result<Vec<GeneratedImage>, BackdropError> {
        let total = jobs.len();
        let futures = jobs.into_iter().map(|job| {
            let backend = Arc::clone(&self.backend);
            async move {
                let source = (job.image.as_ref(), job.mime_type.as_str());
                match backend.generate(Some(source), &job.prompt).await {
                    Ok(Outcome::Images(parts)) => Some(
                        parts
                            .into_iter()
                            .map(|part| GeneratedImage {
                                id: Uuid::new_v4(),
                                source_id: job.source_id,
                                data: part.data,
                                mime_type: part.mime_type,
                                prompt: job.prompt.clone(),
                                background_name: job.background_name.clone(),
                                created_at: Utc::now(),
                                video: VideoState::Idle,
                            })
                            .collect::<Vec<_>>(),
                    ),
                    Ok(Outcome::Text(_)) => {
                        warn!(
                            "generation job for background '{}' returned text only",
                            job.background_name
                        );
                        None
                    }
                    Ok(Outcome::Blocked { reason }) => {
                        warn!(
                            "generation job for background '{}' blocked: {}",
                            job.background_name, reason
                        );
                        None
                    }
                    Err(e) => {
                        warn!(
                            "generation job for background '{}' failed: {}",
                            job.background_name, e
                        );
                        None
                    }
                }
            }
        });

        let images: Vec<GeneratedImage> = join_all(futures)
            .await
            .into_iter()
            .flatten()
            .flatten()
            .collect();

        if images.is_empty() {
            return Err(BackdropError::Generation(format!(
                "All {} generation jobs failed",
                total
            )));
        }

        Ok(images)
    }
}

/// Expand `(processed image x background x repetition)` into concrete jobs,
/// rejecting the batch before dispatch if it breaks an invariant or the
/// generation ceiling.
fn plan_jobs(
    project: &Project,
    backgrounds: &[SelectedBackground],
) -> Result<Vec<PlannedJob>, BackdropError> {
    let style = project.selected_style.as_ref().ok_or_else(|| {
        BackdropError::Validation("Select a visual style before generating".to_string())
    })?;

    let processed = project.processed_images();
    if processed.is_empty() {
        return Err(BackdropError::Validation(
            "No processed product images to generate from".to_string(),
        ));
    }

    if backgrounds.is_empty() {
        return Err(BackdropError::Validation(
            "Select at least one background before generating".to_string(),
        ));
    }

    let mut repetitions: u32 = 0;
    for bg in backgrounds {
        if bg.count == 0 || bg.count > MAX_BACKGROUND_COUNT {
            return Err(BackdropError::Validation(format!(
                "Background '{}' has invalid count {}",
                bg.name, bg.count
            )));
        }
        repetitions += bg.count;
    }

    let total = processed.len() as u32 * repetitions;
    if total > GENERATION_CEILING {
        return Err(BackdropError::LimitExceeded(format!(
            "Batch of {} generations exceeds the ceiling of {}",
            total, GENERATION_CEILING
        )));
    }

    let mut jobs = Vec::with_capacity(total as usize);
    for img in &processed {
        let (data, mime_type) = img.generation_source();
        let image = Bytes::copy_from_slice(data);
        for bg in backgrounds {
            let prompt = prompt_composer::compose(style, bg, &img.palette);
            for _ in 0..bg.count {
                jobs.push(PlannedJob {
                    source_id: img.id,
                    background_name: bg.name.clone(),
                    prompt: prompt.clone(),
                    image: image.clone(),
                    mime_type: mime_type.to_string(),
                });
            }
        }
    }

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::models::{ProcessingStatus, ProductImage};
    use crate::services::testing::FakeBackend;
    use std::collections::HashSet;

    fn processed_image() -> ProductImage {
        ProductImage {
            id: Uuid::new_v4(),
            original_name: "product.png".into(),
            data: vec![1, 2, 3],
            mime_type: "image/png".into(),
            processed_data: Some(vec![4, 5, 6]),
            processed_mime_type: Some("image/png".into()),
            status: ProcessingStatus::Processed,
            palette: vec![],
        }
    }

    fn project_with(images: usize, counts: &[u32]) -> Project {
        let mut project = Project::new("Test");
        project.selected_style = Some(catalog::VISUAL_STYLES[0].clone());
        for _ in 0..images {
            project.product_images.push(processed_image());
        }
        for (i, count) in counts.iter().enumerate() {
            let mut bg = SelectedBackground::new(format!("Scene {i}"), format!("Scene {i}."));
            bg.count = *count;
            project.selected_backgrounds.push(bg);
        }
        project
    }

    #[tokio::test]
    async fn full_batch_yields_images_times_counts() {
        let project = project_with(2, &[2, 1]);
        let backend = Arc::new(FakeBackend::ok());
        let engine = GenerationEngine::new(backend.clone());

        let images = engine.generate_batch(&project).await.unwrap();
        assert_eq!(images.len(), 6); // 2 images x (2 + 1)

        let valid_sources: HashSet<Uuid> =
            project.product_images.iter().map(|img| img.id).collect();
        assert!(images.iter().all(|img| valid_sources.contains(&img.source_id)));
        assert!(images.iter().all(|img| !img.prompt.is_empty()));
    }

    #[tokio::test]
    async fn single_failure_drops_one_result_only() {
        let project = project_with(2, &[2, 1]);
        let backend = Arc::new(FakeBackend::failing_on(&[3]));
        let engine = GenerationEngine::new(backend);

        let images = engine.generate_batch(&project).await.unwrap();
        assert_eq!(images.len(), 5);
    }

    #[tokio::test]
    async fn all_failures_raise_terminal_error() {
        let project = project_with(1, &[2]);
        let backend = Arc::new(FakeBackend::all_failing());
        let engine = GenerationEngine::new(backend);

        let err = engine.generate_batch(&project).await.unwrap_err();
        assert!(matches!(err, BackdropError::Generation(_)));
    }

    #[tokio::test]
    async fn batch_over_ceiling_is_rejected_before_dispatch() {
        // 2 processed images x 51 repetitions = 102 > 100.
        let project = project_with(2, &[10, 10, 10, 10, 10, 1]);
        let backend = Arc::new(FakeBackend::ok());
        let engine = GenerationEngine::new(backend.clone());

        let err = engine.generate_batch(&project).await.unwrap_err();
        assert!(matches!(err, BackdropError::LimitExceeded(_)));
        assert_eq!(backend.generate_calls(), 0, "nothing should be dispatched");
    }

    #[tokio::test]
    async fn missing_style_is_a_validation_error() {
        let mut project = project_with(1, &[1]);
        project.selected_style = None;
        let engine = GenerationEngine::new(Arc::new(FakeBackend::ok()));

        let err = engine.generate_batch(&project).await.unwrap_err();
        assert!(matches!(err, BackdropError::Validation(_)));
    }

    #[tokio::test]
    async fn unprocessed_images_do_not_generate() {
        let mut project = project_with(1, &[1]);
        project.product_images[0].status = ProcessingStatus::Unprocessed;
        let engine = GenerationEngine::new(Arc::new(FakeBackend::ok()));

        let err = engine.generate_batch(&project).await.unwrap_err();
        assert!(matches!(err, BackdropError::Validation(_)));
    }

    #[tokio::test]
    async fn random_batch_draws_from_the_diverse_pool() {
        let project = project_with(1, &[]);
        let engine = GenerationEngine::new(Arc::new(FakeBackend::ok()));

        let images = engine.generate_random(&project, 3).await.unwrap();
        assert_eq!(images.len(), 3);
        assert!(images.iter().all(|img| img.background_name == "Random Scene"));
    }
}
