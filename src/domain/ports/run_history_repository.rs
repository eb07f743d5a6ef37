use crate::domain::errors::StoreResult;
use crate::domain::models::TestRunRecord;
use async_trait::async_trait;

/// Repository trait for the test-run history
#[async_trait]
pub trait RunHistoryRepository: Send + Sync {
    /// Load every recorded run in the order it was recorded
    async fn load_all(&self) -> StoreResult<Vec<TestRunRecord>>;

    /// Replace the stored history with `runs`
    async fn save_all(&self, runs: &[TestRunRecord]) -> StoreResult<()>;
}
