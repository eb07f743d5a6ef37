//! CLI command implementations.

pub mod apply;
pub mod cycle;
pub mod dashboard;
pub mod generate;
pub mod history;
pub mod init;
pub mod insights;
pub mod patterns;
pub mod rules;
pub mod run;

use crate::domain::models::TestType;

/// Parse a test type argument such as `e2e`.
pub fn parse_test_type(s: &str) -> Result<TestType, String> {
    TestType::from_str(s).ok_or_else(|| {
        format!("unknown test type '{s}', expected one of: e2e, unit, integration, performance")
    })
}
