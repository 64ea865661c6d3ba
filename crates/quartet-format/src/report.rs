//! Analysis report: the fix log, warnings and the current subject label.
//!
//! A [`Report`] is threaded `&mut` through every analysis call. Messages are
//! prefixed with the subject that is current when they are recorded (a file
//! name, an instrument slot, a channel), and each one is also emitted as a
//! `tracing` event so verbose command-line runs can follow along.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A repair that changed the decoded structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Subject current when the fix was applied.
    pub subject: String,
    /// Human-readable description of the repair.
    pub message: String,
}

/// A non-fatal finding that did not change anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Subject current when the warning was raised.
    pub subject: String,
    /// Warning message.
    pub message: String,
    /// Byte offset (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subject.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.subject, self.message)
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.subject.is_empty() {
            write!(f, "{}: ", self.subject)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (at offset {})", offset)?;
        }
        Ok(())
    }
}

/// Ordered record of everything an analysis repaired or noticed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Current subject label.
    pub subject: String,
    /// Applied repairs, in order.
    pub fixes: Vec<Fix>,
    /// Non-fatal findings, in order.
    pub warnings: Vec<Warning>,
}

impl Report {
    /// Create an empty report for a subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            fixes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether any repair was applied, i.e. output differs from input.
    pub fn is_modified(&self) -> bool {
        !self.fixes.is_empty()
    }

    /// Replace the subject label and return the previous one.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> String {
        std::mem::replace(&mut self.subject, subject.into())
    }

    /// Run `f` with `subject` appended to the current label.
    pub fn scoped<T>(&mut self, subject: impl fmt::Display, f: impl FnOnce(&mut Self) -> T) -> T {
        let label = if self.subject.is_empty() {
            subject.to_string()
        } else {
            format!("{}: {}", self.subject, subject)
        };
        let saved = self.set_subject(label);
        let out = f(self);
        self.subject = saved;
        out
    }

    /// Record a repair.
    pub fn fix(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(subject = %self.subject, "fixed: {}", message);
        self.fixes.push(Fix {
            subject: self.subject.clone(),
            message,
        });
    }

    /// Record a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warn_at(message, None);
    }

    /// Record a warning at a byte offset.
    pub fn warn_at(&mut self, message: impl Into<String>, offset: Option<usize>) {
        let message = message.into();
        tracing::warn!(subject = %self.subject, "{}", message);
        self.warnings.push(Warning {
            subject: self.subject.clone(),
            message,
            offset,
        });
    }

    /// Append the entries of another report.
    pub fn merge(&mut self, other: Report) {
        self.fixes.extend(other.fixes);
        self.warnings.extend(other.warnings);
    }
}
