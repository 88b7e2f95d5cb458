// src/services/project_store.rs
use crate::errors::BackdropError;
use crate::models::{Preset, Project};
use crate::services::storage_service::Storage;
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const PROJECTS_KEY: &str = "backdrop:projects";
const ACTIVE_KEY: &str = "backdrop:active_project";
const PRESETS_KEY: &str = "backdrop:presets";

const UNTITLED_NAME: &str = "Untitled Project";

#[derive(Default)]
struct StoreState {
    projects: Vec<Project>,
    active_id: Option<Uuid>,
    presets: Vec<Preset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub product_images: usize,
    pub selected_backgrounds: usize,
    pub generated_images: usize,
    /// Jobs a generate action would dispatch right now.
    pub planned_jobs: u32,
}

/// All projects, the active project id, and saved presets, kept in memory
/// and re-serialized to the storage backend after every mutation. Every
/// mutating flow goes through [`ProjectStore::update_active`] so the
/// "is there an active project" branch exists exactly once.
pub struct ProjectStore {
    storage: Arc<dyn Storage>,
    state: RwLock<StoreState>,
}

impl ProjectStore {
    /// Load persisted state. A missing, corrupt, or unreadable payload
    /// degrades to empty state; the last-active project id is restored only
    /// if that project still exists.
    pub async fn load(storage: Arc<dyn Storage>) -> Self {
        let projects: Vec<Project> = read_key(storage.as_ref(), PROJECTS_KEY)
            .await
            .unwrap_or_default();
        let presets: Vec<Preset> = read_key(storage.as_ref(), PRESETS_KEY)
            .await
            .unwrap_or_default();

        let active_id = match storage.get(ACTIVE_KEY).await {
            Ok(Some(raw)) => raw
                .trim_matches('"')
                .parse::<Uuid>()
                .ok()
                .filter(|id| projects.iter().any(|p| p.id == *id)),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read {}: {}", ACTIVE_KEY, e);
                None
            }
        };

        Self {
            storage,
            state: RwLock::new(StoreState {
                projects,
                active_id,
                presets,
            }),
        }
    }

    /// Apply `mutate` to the active project, auto-creating and activating an
    /// untitled project first if none is active. Commits (and persists) only
    /// when the mutation succeeds; a failed mutation leaves no trace, not
    /// even the auto-created project.
    pub async fn update_active<R>(
        &self,
        mutate: impl FnOnce(&mut Project) -> Result<R, BackdropError>,
    ) -> Result<(R, Project), BackdropError> {
        let mut state = self.state.write().await;

        let existing = state
            .active_id
            .and_then(|id| state.projects.iter().position(|p| p.id == id));

        let mut project = match existing {
            Some(idx) => state.projects[idx].clone(),
            None => Project::new(UNTITLED_NAME),
        };

        let result = mutate(&mut project)?;

        match existing {
            Some(idx) => state.projects[idx] = project.clone(),
            None => {
                state.active_id = Some(project.id);
                state.projects.push(project.clone());
            }
        }

        self.persist(&state).await;
        Ok((result, project))
    }

    pub async fn active_project(&self) -> Option<Project> {
        let state = self.state.read().await;
        let id = state.active_id?;
        state.projects.iter().find(|p| p.id == id).cloned()
    }

    pub async fn get(&self, id: Uuid) -> Option<Project> {
        let state = self.state.read().await;
        state.projects.iter().find(|p| p.id == id).cloned()
    }

    pub async fn summaries(&self) -> Vec<ProjectSummary> {
        let state = self.state.read().await;
        state
            .projects
            .iter()
            .map(|p| ProjectSummary {
                id: p.id,
                name: p.name.clone(),
                created_at: p.created_at,
                active: state.active_id == Some(p.id),
                product_images: p.product_images.len(),
                selected_backgrounds: p.selected_backgrounds.len(),
                generated_images: p.generated_images.len(),
                planned_jobs: p.planned_jobs(),
            })
            .collect()
    }

    /// Explicitly create a new project and make it active.
    pub async fn create_project(&self, name: Option<String>) -> Project {
        let mut state = self.state.write().await;
        let project = Project::new(name.unwrap_or_else(|| UNTITLED_NAME.to_string()));
        state.active_id = Some(project.id);
        state.projects.push(project.clone());
        self.persist(&state).await;
        project
    }

    pub async fn activate(&self, id: Uuid) -> Result<Project, BackdropError> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| BackdropError::NotFound("Project".to_string()))?;
        state.active_id = Some(id);
        self.persist(&state).await;
        Ok(project)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), BackdropError> {
        let mut state = self.state.write().await;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Err(BackdropError::NotFound("Project".to_string()));
        }
        if state.active_id == Some(id) {
            state.active_id = None;
        }
        self.persist(&state).await;
        Ok(())
    }

    /// Save a preset; an existing preset with the same name is replaced.
    pub async fn save_preset(&self, preset: Preset) {
        let mut state = self.state.write().await;
        state.presets.retain(|p| p.name != preset.name);
        state.presets.push(preset);
        self.persist(&state).await;
    }

    pub async fn presets(&self) -> Vec<Preset> {
        self.state.read().await.presets.clone()
    }

    pub async fn find_preset(&self, name: &str) -> Option<Preset> {
        self.state
            .read()
            .await
            .presets
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    pub async fn delete_preset(&self, name: &str) -> Result<(), BackdropError> {
        let mut state = self.state.write().await;
        let before = state.presets.len();
        state.presets.retain(|p| p.name != name);
        if state.presets.len() == before {
            return Err(BackdropError::NotFound("Preset".to_string()));
        }
        self.persist(&state).await;
        Ok(())
    }

    /// Write the full state back to storage. Failures are logged and the
    /// in-memory session carries on; the next successful write catches up.
    async fn persist(&self, state: &StoreState) {
        write_key(self.storage.as_ref(), PROJECTS_KEY, &state.projects).await;
        write_key(self.storage.as_ref(), PRESETS_KEY, &state.presets).await;
        match state.active_id {
            Some(id) => {
                if let Err(e) = self.storage.set(ACTIVE_KEY, &id.to_string()).await {
                    warn!("Failed to persist {}: {}", ACTIVE_KEY, e);
                }
            }
            None => {
                if let Err(e) = self.storage.clear(ACTIVE_KEY).await {
                    warn!("Failed to clear {}: {}", ACTIVE_KEY, e);
                }
            }
        }
    }
}

async fn read_key<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    match storage.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding corrupt payload under {}: {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            None
        }
    }
}

async fn write_key<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => {
            if let Err(e) = storage.set(key, &raw).await {
                warn!("Failed to persist {}: {}", key, e);
            }
        }
        Err(e) => warn!("Failed to serialize {}: {}", key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SelectedBackground;
    use crate::services::storage_service::MemoryStorage;

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[tokio::test]
    async fn update_active_auto_creates_exactly_once() {
        let store = ProjectStore::load(storage()).await;

        let (_, first) = store
            .update_active(|p| {
                p.selected_backgrounds
                    .push(SelectedBackground::new("Beach", "A beach."));
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(first.name, "Untitled Project");

        let (_, second) = store
            .update_active(|p| {
                p.selected_backgrounds
                    .push(SelectedBackground::new("Loft", "A loft."));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.selected_backgrounds.len(), 2);
        assert_eq!(store.summaries().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_no_auto_created_project() {
        let store = ProjectStore::load(storage()).await;

        let result: Result<((), Project), _> = store
            .update_active(|_| Err(BackdropError::Validation("nope".to_string())))
            .await;

        assert!(result.is_err());
        assert!(store.summaries().await.is_empty());
        assert!(store.active_project().await.is_none());
    }

    #[tokio::test]
    async fn state_round_trips_through_storage() {
        let backing = storage();

        {
            let store = ProjectStore::load(backing.clone()).await;
            store.create_project(Some("Campaign".to_string())).await;
            store
                .update_active(|p| {
                    let mut bg = SelectedBackground::new("Beach", "A beach.");
                    bg.count = 3;
                    p.selected_backgrounds.push(bg);
                    Ok(())
                })
                .await
                .unwrap();
            store
                .save_preset(Preset {
                    name: "Summer".to_string(),
                    style: None,
                    backgrounds: vec![SelectedBackground::new("Beach", "A beach.")],
                })
                .await;
        }

        let reloaded = ProjectStore::load(backing).await;
        let active = reloaded.active_project().await.expect("active restored");
        assert_eq!(active.name, "Campaign");
        assert_eq!(active.selected_backgrounds[0].count, 3);
        assert_eq!(reloaded.presets().await.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_payload_degrades_to_empty_state() {
        let backing = storage();
        backing.set(PROJECTS_KEY, "{not json").await.unwrap();
        backing.set(ACTIVE_KEY, "also-not-a-uuid").await.unwrap();

        let store = ProjectStore::load(backing).await;
        assert!(store.summaries().await.is_empty());
        assert!(store.active_project().await.is_none());
    }

    #[tokio::test]
    async fn stale_active_id_is_dropped_on_load() {
        let backing = storage();
        backing
            .set(ACTIVE_KEY, &Uuid::new_v4().to_string())
            .await
            .unwrap();

        let store = ProjectStore::load(backing).await;
        assert!(store.active_project().await.is_none());
    }

    #[tokio::test]
    async fn deleting_the_active_project_clears_activation() {
        let store = ProjectStore::load(storage()).await;
        let project = store.create_project(None).await;

        store.delete(project.id).await.unwrap();
        assert!(store.active_project().await.is_none());
        assert!(store.summaries().await.is_empty());
        assert!(matches!(
            store.delete(project.id).await.unwrap_err(),
            BackdropError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn presets_are_last_write_wins_by_name() {
        let store = ProjectStore::load(storage()).await;

        store
            .save_preset(Preset {
                name: "Summer".to_string(),
                style: None,
                backgrounds: vec![],
            })
            .await;
        store
            .save_preset(Preset {
                name: "Summer".to_string(),
                style: None,
                backgrounds: vec![SelectedBackground::new("Beach", "A beach.")],
            })
            .await;

        let presets = store.presets().await;
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].backgrounds.len(), 1);
    }
}
