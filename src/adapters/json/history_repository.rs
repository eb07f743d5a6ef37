use async_trait::async_trait;
use std::path::PathBuf;

use super::JsonCollectionFile;
use crate::domain::errors::StoreResult;
use crate::domain::models::TestRunRecord;
use crate::domain::ports::RunHistoryRepository;

/// Run history persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct JsonRunHistoryRepository {
    file: JsonCollectionFile<TestRunRecord>,
}

impl JsonRunHistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonCollectionFile::new(path),
        }
    }
}

#[async_trait]
impl RunHistoryRepository for JsonRunHistoryRepository {
    async fn load_all(&self) -> StoreResult<Vec<TestRunRecord>> {
        self.file.load().await
    }

    async fn save_all(&self, runs: &[TestRunRecord]) -> StoreResult<()> {
        self.file.save(runs).await
    }
}
