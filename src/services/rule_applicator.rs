//! Kind-specific, idempotent text transforms driven by adaptive rules.
//!
//! The applicator only transforms text in memory. Reading, backing up and
//! writing files is [`ImprovementService`](super::improvement_service)'s job.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::domain::models::{AdaptiveRule, AppliedRule, FailureKind};

/// A text transform for one failure kind.
///
/// `apply` returns `None` when its guard says the edit is already present or
/// there is nothing to edit. It must never panic.
pub trait RuleTransform: Send + Sync {
    fn kind(&self) -> FailureKind;
    fn apply(&self, text: &str) -> Option<String>;
}

/// A click whose first argument is a whole string literal or a bare name.
static CLICK_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\.click\(\s*("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|[A-Za-z_]\w*)"#)
        .expect("valid click regex")
});

/// Injects an explicit wait before every click that names its target.
///
/// A line holding several clicks gets one wait per click, and a click that
/// is awaited gets an awaited wait.
pub struct ExplicitWaitTransform;

impl RuleTransform for ExplicitWaitTransform {
    fn kind(&self) -> FailureKind {
        FailureKind::TimingIssue
    }

    fn apply(&self, text: &str) -> Option<String> {
        if !text.contains("click(") || text.contains("wait_for_selector") {
            return None;
        }

        let mut out = String::with_capacity(text.len() + 64);
        let mut injected = 0usize;

        for line in text.split_inclusive('\n') {
            let indent: String = line
                .chars()
                .take_while(|c| c.is_whitespace() && *c != '\n')
                .collect();
            for caps in CLICK_CALL.captures_iter(line) {
                let start = caps.get(0).map_or(0, |m| m.start());
                let awaited = line[..start].trim_end().ends_with("await");
                let prefix = if awaited { "await " } else { "" };
                out.push_str(&format!(
                    "{indent}{prefix}{}.wait_for_selector({}, timeout=30000)\n",
                    &caps[1], &caps[2]
                ));
                injected += 1;
            }
            out.push_str(line);
        }

        (injected > 0).then_some(out)
    }
}

const SELECTOR_ADVISORY: &str =
    "# ADAPTIVE SUGGESTION: Consider using data-testid selectors for better stability\n";

/// Prepends an advisory comment when raw id selectors are used.
pub struct StableSelectorAdvisory;

impl RuleTransform for StableSelectorAdvisory {
    fn kind(&self) -> FailureKind {
        FailureKind::ElementSelector
    }

    fn apply(&self, text: &str) -> Option<String> {
        let raw_id_selector = text.contains("\"#") || text.contains("'#");
        if !raw_id_selector || text.contains("data-testid") {
            return None;
        }
        Some(format!("{SELECTOR_ADVISORY}{text}"))
    }
}

const RETRY_PRELUDE: &str = "import time\nfrom requests.adapters import HTTPAdapter\nfrom urllib3.util.retry import Retry\n\n";

/// Prepends retry-capable imports to code making outbound HTTP calls.
pub struct NetworkRetryTransform;

impl RuleTransform for NetworkRetryTransform {
    fn kind(&self) -> FailureKind {
        FailureKind::NetworkIssue
    }

    fn apply(&self, text: &str) -> Option<String> {
        if !text.contains("requests.") || text.to_lowercase().contains("retry") {
            return None;
        }
        Some(format!("{RETRY_PRELUDE}{text}"))
    }
}

/// Result of running the rule list over one unit of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub text: String,
    pub applied: Vec<AppliedRule>,
}

impl Application {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

pub struct RuleApplicator {
    transforms: Vec<Box<dyn RuleTransform>>,
    confidence_threshold: f64,
}

impl RuleApplicator {
    pub fn new(confidence_threshold: f64) -> Self {
        Self::with_transforms(
            confidence_threshold,
            vec![
                Box::new(ExplicitWaitTransform),
                Box::new(StableSelectorAdvisory),
                Box::new(NetworkRetryTransform),
            ],
        )
    }

    pub fn with_transforms(
        confidence_threshold: f64,
        transforms: Vec<Box<dyn RuleTransform>>,
    ) -> Self {
        Self {
            transforms,
            confidence_threshold,
        }
    }

    /// Apply every eligible rule in list order.
    ///
    /// Each rule that changes the text gets its `last_applied` stamped.
    pub fn apply_rules(&self, text: &str, rules: &mut [AdaptiveRule]) -> Application {
        self.apply_rules_at(text, rules, Utc::now())
    }

    pub fn apply_rules_at(
        &self,
        text: &str,
        rules: &mut [AdaptiveRule],
        now: DateTime<Utc>,
    ) -> Application {
        let mut current = text.to_string();
        let mut applied = Vec::new();

        for rule in rules
            .iter_mut()
            .filter(|r| r.confidence >= self.confidence_threshold)
        {
            let kind = rule.failure_kind;
            let Some(transform) = self.transforms.iter().find(|t| t.kind() == kind) else {
                continue;
            };

            match transform.apply(&current) {
                Some(modified) => {
                    debug!(
                        rule_id = %rule.rule_id,
                        pattern_kind = %rule.failure_kind,
                        "Rule applied"
                    );
                    current = modified;
                    rule.last_applied = Some(now);
                    applied.push(AppliedRule::from(&*rule));
                }
                None => {
                    debug!(rule_id = %rule.rule_id, "Rule guard matched, skipped");
                }
            }
        }

        Application {
            text: current,
            applied,
        }
    }
}
