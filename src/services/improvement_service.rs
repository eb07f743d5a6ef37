//! File-level rule application: read, back up, rewrite.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::models::{AppliedRule, Diagnostic, Outcome};
use crate::services::rule_applicator::RuleApplicator;
use crate::services::rule_book::RuleBook;

const COMPONENT: &str = "improvement_service";

/// What happened to one test file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileImprovement {
    pub file_path: PathBuf,
    pub improvements_applied: Vec<AppliedRule>,
    pub backup_created: Option<PathBuf>,
}

/// Sibling backup path: `login_test.py` becomes `login_test.py.backup`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

pub struct ImprovementService {
    applicator: RuleApplicator,
    dry_run: bool,
}

impl ImprovementService {
    pub fn new(applicator: RuleApplicator) -> Self {
        Self {
            applicator,
            dry_run: false,
        }
    }

    /// Compute the edits without touching the file or the rule store.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply eligible rules to `path`.
    ///
    /// When at least one rule matched, the original content is written to a
    /// sibling backup before the file is overwritten, and the rule list is
    /// persisted with its refreshed `last_applied` stamps. An unreadable file
    /// or a failed write yields `Failed` and leaves the rule list untouched.
    pub async fn apply_to_file(
        &self,
        path: &Path,
        rules: &mut RuleBook,
    ) -> Outcome<FileImprovement> {
        let original = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read test file");
                let message = format!("read {}: {e}", path.display());
                return Outcome::failed(Diagnostic::new(COMPONENT, message));
            }
        };

        // Stamps land on the real rules only once the file is rewritten.
        let mut scratch = rules.rules().to_vec();
        let application = self.applicator.apply_rules(&original, &mut scratch);
        if self.dry_run || !application.changed() {
            return Outcome::Complete(FileImprovement {
                file_path: path.to_path_buf(),
                improvements_applied: application.applied,
                backup_created: None,
            });
        }

        let backup = backup_path(path);
        if let Err(e) = tokio::fs::write(&backup, &original).await {
            warn!(
                path = %backup.display(),
                error = %e,
                "Cannot write backup, leaving file untouched"
            );
            let message = format!("backup {}: {e}", backup.display());
            return Outcome::failed(Diagnostic::new(COMPONENT, message));
        }

        if let Err(e) = tokio::fs::write(path, &application.text).await {
            warn!(path = %path.display(), error = %e, "Cannot write improved test file");
            let message = format!("write {}: {e}", path.display());
            return Outcome::failed(Diagnostic::new(COMPONENT, message));
        }

        info!(
            path = %path.display(),
            applied = application.applied.len(),
            "Applied adaptive improvements"
        );

        for (rule, stamped) in rules.rules_mut().iter_mut().zip(&scratch) {
            rule.last_applied = stamped.last_applied;
        }
        let improvement = FileImprovement {
            file_path: path.to_path_buf(),
            improvements_applied: application.applied,
            backup_created: Some(backup),
        };
        rules.save().await.map(|()| improvement)
    }
}
