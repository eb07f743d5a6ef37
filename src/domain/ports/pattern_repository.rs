use crate::domain::errors::StoreResult;
use crate::domain::models::FailurePattern;
use async_trait::async_trait;

/// Repository trait for the failure-pattern collection
///
/// The collection is persisted as a whole: `save_all` replaces whatever was
/// stored before. There is no append log and no schema version.
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Load every stored pattern
    ///
    /// A store that does not exist yet yields an empty collection.
    async fn load_all(&self) -> StoreResult<Vec<FailurePattern>>;

    /// Replace the stored collection with `patterns`
    async fn save_all(&self, patterns: &[FailurePattern]) -> StoreResult<()>;
}
