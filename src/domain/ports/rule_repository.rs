use crate::domain::errors::StoreResult;
use crate::domain::models::AdaptiveRule;
use async_trait::async_trait;

/// Repository trait for the adaptive-rule collection
///
/// Same whole-collection replace semantics as
/// [`PatternRepository`](super::PatternRepository).
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Load every stored rule, oldest first
    async fn load_all(&self) -> StoreResult<Vec<AdaptiveRule>>;

    /// Replace the stored collection with `rules`
    async fn save_all(&self, rules: &[AdaptiveRule]) -> StoreResult<()>;
}
