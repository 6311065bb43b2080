//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use fixtrack::jobs::{JobPatch, JobStatus};
use fixtrack::lifecycle::NewJob;

/// Builder for `NewJob` inputs.
pub struct NewJobBuilder {
    customer_id: String,
    equipment: String,
    description: Option<String>,
    assigned_to: Option<String>,
}

impl NewJobBuilder {
    pub fn new(customer_id: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            equipment: "Google Pixel 8".to_string(),
            description: None,
            assigned_to: None,
        }
    }

    pub fn equipment(mut self, equipment: &str) -> Self {
        self.equipment = equipment.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn build(self) -> NewJob {
        NewJob {
            customer_id: self.customer_id,
            equipment: self.equipment,
            description: self.description,
            assigned_to: self.assigned_to,
        }
    }
}

/// Builder for `JobPatch` updates.
#[derive(Default)]
pub struct PatchBuilder {
    patch: JobPatch,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.patch.status = Some(status);
        self
    }

    pub fn assign(mut self, user_id: &str) -> Self {
        self.patch.assigned_to = Some(Some(user_id.to_string()));
        self
    }

    pub fn unassign(mut self) -> Self {
        self.patch.assigned_to = Some(None);
        self
    }

    pub fn equipment(mut self, equipment: &str) -> Self {
        self.patch.equipment = Some(equipment.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.patch.description = Some(Some(description.to_string()));
        self
    }

    pub fn expected_version(mut self, version: i64) -> Self {
        self.patch.expected_version = Some(version);
        self
    }

    pub fn build(self) -> JobPatch {
        self.patch
    }
}
