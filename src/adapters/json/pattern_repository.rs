use async_trait::async_trait;
use std::path::PathBuf;

use super::JsonCollectionFile;
use crate::domain::errors::StoreResult;
use crate::domain::models::FailurePattern;
use crate::domain::ports::PatternRepository;

/// Failure patterns persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct JsonPatternRepository {
    file: JsonCollectionFile<FailurePattern>,
}

impl JsonPatternRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonCollectionFile::new(path),
        }
    }
}

#[async_trait]
impl PatternRepository for JsonPatternRepository {
    async fn load_all(&self) -> StoreResult<Vec<FailurePattern>> {
        self.file.load().await
    }

    async fn save_all(&self, patterns: &[FailurePattern]) -> StoreResult<()> {
        self.file.save(patterns).await
    }
}
