//! Typed result for best-effort operations.
//!
//! Core operations never surface collaborator or storage trouble as an error.
//! Instead they return an [`Outcome`] so the caller can tell "fully succeeded"
//! apart from "used a fallback" and "could not do anything".

use serde::Serialize;

/// One observable problem encountered while an operation degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub component: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.component, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Everything worked as intended.
    Complete(T),
    /// A value was produced, but some step fell back or was skipped.
    Degraded {
        value: T,
        diagnostics: Vec<Diagnostic>,
    },
    /// No value could be produced.
    Failed { diagnostics: Vec<Diagnostic> },
}

impl<T> Outcome<T> {
    /// `Complete` when `diagnostics` is empty, `Degraded` otherwise.
    pub fn from_parts(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        if diagnostics.is_empty() {
            Self::Complete(value)
        } else {
            Self::Degraded { value, diagnostics }
        }
    }

    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self::Failed {
            diagnostics: vec![diagnostic],
        }
    }

    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Complete(value) | Self::Degraded { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Complete(value) | Self::Degraded { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Complete(_) => &[],
            Self::Degraded { diagnostics, .. } | Self::Failed { diagnostics } => diagnostics,
        }
    }

    /// Split into the optional value and every diagnostic collected.
    pub fn into_parts(self) -> (Option<T>, Vec<Diagnostic>) {
        match self {
            Self::Complete(value) => (Some(value), Vec::new()),
            Self::Degraded { value, diagnostics } => (Some(value), diagnostics),
            Self::Failed { diagnostics } => (None, diagnostics),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Complete(value) => Outcome::Complete(f(value)),
            Self::Degraded { value, diagnostics } => Outcome::Degraded {
                value: f(value),
                diagnostics,
            },
            Self::Failed { diagnostics } => Outcome::Failed { diagnostics },
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Complete(_) => "complete",
            Self::Degraded { .. } => "degraded",
            Self::Failed { .. } => "failed",
        }
    }
}
