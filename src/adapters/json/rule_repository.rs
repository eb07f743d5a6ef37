use async_trait::async_trait;
use std::path::PathBuf;

use super::JsonCollectionFile;
use crate::domain::errors::StoreResult;
use crate::domain::models::AdaptiveRule;
use crate::domain::ports::RuleRepository;

/// Adaptive rules persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct JsonRuleRepository {
    file: JsonCollectionFile<AdaptiveRule>,
}

impl JsonRuleRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonCollectionFile::new(path),
        }
    }
}

#[async_trait]
impl RuleRepository for JsonRuleRepository {
    async fn load_all(&self) -> StoreResult<Vec<AdaptiveRule>> {
        self.file.load().await
    }

    async fn save_all(&self, rules: &[AdaptiveRule]) -> StoreResult<()> {
        self.file.save(rules).await
    }
}
