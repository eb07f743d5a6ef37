//! Insight model: ranked observations derived from run history.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Area an insight is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Performance,
    Quality,
    Reliability,
    Coverage,
    AiAnalysis,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Quality => "quality",
            Self::Reliability => "reliability",
            Self::Coverage => "coverage",
            Self::AiAnalysis => "ai_analysis",
        }
    }
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totally ordered severity: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric rank used for ordering insights.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Lenient parse; anything unrecognized ranks lowest.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked, human-readable observation. Recomputed on every analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl InsightRecord {
    pub fn new(
        category: InsightCategory,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        confidence: f64,
    ) -> Self {
        Self {
            category,
            title: title.into(),
            description: description.into(),
            severity,
            recommendations: Vec::new(),
            confidence,
            data: BTreeMap::new(),
        }
    }

    pub fn with_recommendations<I, S>(mut self, recommendations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recommendations = recommendations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Ranking order: severity descending, then confidence descending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .severity
            .rank()
            .cmp(&self.severity.rank())
            .then_with(|| {
                other
                    .confidence
                    .partial_cmp(&self.confidence)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

/// Stable-sort insights into ranking order.
pub fn rank_insights(insights: &mut [InsightRecord]) {
    insights.sort_by(InsightRecord::rank_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(title: &str, severity: Severity, confidence: f64) -> InsightRecord {
        InsightRecord::new(InsightCategory::Quality, title, "", severity, confidence)
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::parse_lenient("HIGH"), Severity::High);
        assert_eq!(Severity::parse_lenient("catastrophic"), Severity::Low);
    }

    #[test]
    fn test_rank_insights_severity_then_confidence() {
        let mut insights = vec![
            insight("a", Severity::Medium, 0.9),
            insight("b", Severity::High, 0.7),
            insight("c", Severity::Medium, 0.95),
            insight("d", Severity::Critical, 0.1),
        ];
        rank_insights(&mut insights);
        let titles: Vec<_> = insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let mut insights = vec![
            insight("first", Severity::Medium, 0.8),
            insight("second", Severity::Medium, 0.8),
        ];
        rank_insights(&mut insights);
        assert_eq!(insights[0].title, "first");
        assert_eq!(insights[1].title, "second");
    }
}
