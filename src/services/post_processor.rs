// src/services/post_processor.rs
use crate::errors::BackdropError;
use crate::models::{GeneratedImage, MAX_BACKGROUND_COUNT, VideoState};
use crate::services::gemini_service::{GenerativeBackend, ImagePart, Outcome};
use crate::services::prompt_composer;
use chrono::Utc;
use futures_util::future::join_all;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

/// Fixed wait between video operation polls.
pub const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Polls before an in-flight video operation is declared timed out.
pub const VIDEO_POLL_MAX_ATTEMPTS: u32 = 30;

/// Routes a single generated image plus an operation to the matching
/// external call shape. In-place operations (upscale, re-imagine, outpaint)
/// hand back replacement bytes for the same id; variations produce new
/// records; animation runs the bounded submit-and-poll loop.
pub struct PostProcessor {
    backend: Arc<dyn GenerativeBackend>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl PostProcessor {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            poll_interval: VIDEO_POLL_INTERVAL,
            max_poll_attempts: VIDEO_POLL_MAX_ATTEMPTS,
        }
    }

    #[cfg(test)]
    pub fn with_polling(
        backend: Arc<dyn GenerativeBackend>,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            backend,
            poll_interval,
            max_poll_attempts,
        }
    }

    /// Single-image edit call; the response must carry image data.
    async fn edit(
        &self,
        data: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<ImagePart, BackdropError> {
        match self
            .backend
            .generate(Some((data, mime_type)), instruction)
            .await?
        {
            Outcome::Images(mut parts) => Ok(parts.remove(0)),
            Outcome::Text(_) => Err(BackdropError::Generation(
                "Service returned no image for this edit".to_string(),
            )),
            Outcome::Blocked { reason } => Err(BackdropError::Generation(format!(
                "Edit was blocked: {}",
                reason
            ))),
        }
    }

    /// Replacement bytes for an in-place upscale of `image`.
    pub async fn upscale(&self, image: &GeneratedImage) -> Result<ImagePart, BackdropError> {
        self.edit(
            &image.data,
            &image.mime_type,
            &prompt_composer::upscale_instruction(),
        )
        .await
    }

    /// Replacement bytes for an instructed edit of `image`.
    pub async fn reimagine(
        &self,
        image: &GeneratedImage,
        instruction: &str,
    ) -> Result<ImagePart, BackdropError> {
        if instruction.trim().is_empty() {
            return Err(BackdropError::Validation(
                "Edit instruction must not be empty".to_string(),
            ));
        }
        self.edit(
            &image.data,
            &image.mime_type,
            &prompt_composer::reimagine_instruction(instruction),
        )
        .await
    }

    /// Replacement bytes for an outpainted (uncropped) version of `image`.
    pub async fn outpaint(&self, image: &GeneratedImage) -> Result<ImagePart, BackdropError> {
        self.edit(
            &image.data,
            &image.mime_type,
            &prompt_composer::outpaint_instruction(),
        )
        .await
    }

    /// Cut the product out of an uploaded photo.
    pub async fn remove_background(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<ImagePart, BackdropError> {
        self.edit(
            data,
            mime_type,
            &prompt_composer::background_removal_instruction(),
        )
        .await
    }

    /// N parallel variation calls; partial success is kept, a batch with
    /// zero successes is an error.
    pub async fn variations(
        &self,
        image: &GeneratedImage,
        count: u32,
    ) -> Result<Vec<GeneratedImage>, BackdropError> {
        if count == 0 || count > MAX_BACKGROUND_COUNT {
            return Err(BackdropError::Validation(format!(
                "Variation count must be between 1 and {}",
                MAX_BACKGROUND_COUNT
            )));
        }

        let instruction = prompt_composer::variation_instruction(&image.prompt);
        let futures = (0..count).map(|_| {
            let instruction = instruction.clone();
            async move {
                match self.edit(&image.data, &image.mime_type, &instruction).await {
                    Ok(part) => Some(part),
                    Err(e) => {
                        warn!("variation job failed: {}", e);
                        None
                    }
                }
            }
        });

        let results: Vec<GeneratedImage> = join_all(futures)
            .await
            .into_iter()
            .flatten()
            .map(|part| GeneratedImage {
                id: Uuid::new_v4(),
                source_id: image.source_id,
                data: part.data,
                mime_type: part.mime_type,
                prompt: instruction.clone(),
                background_name: image.background_name.clone(),
                created_at: Utc::now(),
                video: VideoState::Idle,
            })
            .collect();

        if results.is_empty() {
            return Err(BackdropError::Generation(format!(
                "All {} variation jobs failed",
                count
            )));
        }

        Ok(results)
    }

    /// Ask the service to express the image as a reusable generation prompt.
    pub async fn describe(&self, image: &GeneratedImage) -> Result<String, BackdropError> {
        match self
            .backend
            .generate(
                Some((&image.data, &image.mime_type)),
                &prompt_composer::describe_instruction(),
            )
            .await?
        {
            Outcome::Text(text) => Ok(text.trim().to_string()),
            Outcome::Images(_) => Err(BackdropError::Generation(
                "Expected a text description, got image data".to_string(),
            )),
            Outcome::Blocked { reason } => Err(BackdropError::Generation(format!(
                "Prompt extraction was blocked: {}",
                reason
            ))),
        }
    }

    /// Submit an image-to-video operation and poll it to completion.
    ///
    /// The poll loop is bounded: after `max_poll_attempts` pending responses
    /// the operation is reported as timed out and the caller reverts the
    /// image's video state to idle.
    pub async fn animate(
        &self,
        image: &GeneratedImage,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<String, BackdropError> {
        let operation = self
            .backend
            .start_video((&image.data, &image.mime_type), prompt, aspect_ratio)
            .await?;

        for _ in 0..self.max_poll_attempts {
            sleep(self.poll_interval).await;
            if let Some(url) = self.backend.poll_video(&operation).await? {
                return Ok(url);
            }
        }

        Err(BackdropError::Generation(format!(
            "Video generation did not finish within {} polls",
            self.max_poll_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeBackend;

    fn generated() -> GeneratedImage {
        GeneratedImage {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            data: vec![9, 9, 9],
            mime_type: "image/png".into(),
            prompt: "original prompt".into(),
            background_name: "Beach".into(),
            created_at: Utc::now(),
            video: VideoState::Idle,
        }
    }

    #[tokio::test]
    async fn upscale_returns_replacement_bytes() {
        let backend = Arc::new(FakeBackend::ok());
        let processor = PostProcessor::new(backend);

        let part = processor.upscale(&generated()).await.unwrap();
        assert_eq!(part.mime_type, "image/png");
        assert_ne!(part.data, vec![9, 9, 9]);
    }

    #[tokio::test]
    async fn reimagine_rejects_empty_instruction() {
        let processor = PostProcessor::new(Arc::new(FakeBackend::ok()));
        let err = processor.reimagine(&generated(), "  ").await.unwrap_err();
        assert!(matches!(err, BackdropError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_edit_surfaces_error_and_sends_one_call() {
        let backend = Arc::new(FakeBackend::all_failing());
        let processor = PostProcessor::new(backend.clone());

        let err = processor.outpaint(&generated()).await.unwrap_err();
        assert!(matches!(err, BackdropError::Generation(_)));
        assert_eq!(backend.generate_calls(), 1);
    }

    #[tokio::test]
    async fn variations_tolerate_partial_failure() {
        let backend = Arc::new(FakeBackend::failing_on(&[1]));
        let processor = PostProcessor::new(backend);
        let source = generated();

        let results = processor.variations(&source, 3).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|img| img.source_id == source.source_id));
        assert!(results.iter().all(|img| img.id != source.id));
    }

    #[tokio::test]
    async fn describe_returns_trimmed_text() {
        let backend = Arc::new(FakeBackend::text("  a prompt  "));
        let processor = PostProcessor::new(backend);

        let text = processor.describe(&generated()).await.unwrap();
        assert_eq!(text, "a prompt");
    }

    #[tokio::test]
    async fn animate_polls_until_ready() {
        let backend = Arc::new(FakeBackend::video(3, "https://videos/clip.mp4"));
        let processor =
            PostProcessor::with_polling(backend.clone(), Duration::from_millis(1), 10);

        let url = processor
            .animate(&generated(), "gentle motion", "16:9")
            .await
            .unwrap();
        assert_eq!(url, "https://videos/clip.mp4");
        assert_eq!(backend.polls(), 3);
    }

    #[tokio::test]
    async fn animate_times_out_after_bounded_polls() {
        let backend = Arc::new(FakeBackend::video_never_ready());
        let processor =
            PostProcessor::with_polling(backend.clone(), Duration::from_millis(1), 4);

        let err = processor
            .animate(&generated(), "gentle motion", "16:9")
            .await
            .unwrap_err();
        assert!(matches!(err, BackdropError::Generation(_)));
        assert_eq!(backend.polls(), 4);
    }
}
