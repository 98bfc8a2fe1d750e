use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Created,
    Updated,
    Unchanged,
    Applied,
    InSync,
    Drifted,
    Missing,
    Deleted,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A declared value that differs from what the cluster reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    pub field: String,
    pub declared: String,
    pub observed: String,
}

impl Drift {
    pub fn new(field: impl Into<String>, declared: impl ToString, observed: impl ToString) -> Self {
        Self {
            field: field.into(),
            declared: declared.to_string(),
            observed: observed.to_string(),
        }
    }
}

/// Outcome of one run for one manifest resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub kind: &'static str,
    pub name: String,
    /// External identifier: the intent id for ACLs, the topic or connector name otherwise.
    pub id: Option<String>,
    pub phase: Phase,
    /// Grants built, observed or deleted, depending on the run.
    pub grants: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub drift: Vec<Drift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResourceStatus {
    pub fn new(kind: &'static str, name: impl Into<String>, phase: Phase) -> Self {
        Self {
            kind,
            name: name.into(),
            id: None,
            phase,
            grants: 0,
            drift: Vec::new(),
            message: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_grants(mut self, grants: usize) -> Self {
        self.grants = grants;
        self
    }

    pub fn with_drift(mut self, drift: Vec<Drift>) -> Self {
        self.drift = drift;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Every status produced by one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub resources: Vec<ResourceStatus>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ResourceStatus> {
        self.resources.iter().filter(|s| s.phase == Phase::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn count(&self, phase: Phase) -> usize {
        self.resources.iter().filter(|s| s.phase == phase).count()
    }
}
