use std::sync::Arc;

use storage::seed::seed_sample_catalogue;
use storage::{InMemoryRepository, Storage};

use crate::Clock;
use crate::catalogue_service::CatalogueService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::sessions::SessionLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalogue: Arc<CatalogueService>,
    progress: Arc<ProgressService>,
    session_loop: Arc<SessionLoopService>,
}

impl AppServices {
    /// Build services over in-memory storage loaded with the sample catalogue.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if seeding fails.
    pub async fn in_memory_seeded(clock: Clock) -> Result<Self, AppServicesError> {
        let repo = InMemoryRepository::new();
        seed_sample_catalogue(&repo).await?;
        tracing::debug!("sample catalogue seeded");
        Ok(Self::from_storage(clock, &Storage::from_repository(repo)))
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        let catalogue = Arc::new(CatalogueService::new(
            clock,
            Arc::clone(&storage.banks),
            Arc::clone(&storage.questions),
        ));
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&storage.progress)));
        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            Arc::clone(&storage.banks),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.progress),
        ));

        Self {
            catalogue,
            progress,
            session_loop,
        }
    }

    /// Shuffle planned sessions instead of keeping bank order.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        let session_loop = self.session_loop.as_ref().clone().with_shuffle(shuffle);
        self.session_loop = Arc::new(session_loop);
        self
    }

    #[must_use]
    pub fn catalogue(&self) -> Arc<CatalogueService> {
        Arc::clone(&self.catalogue)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }
}
