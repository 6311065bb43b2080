//! Job domain types: status vocabulary and transition planning.

pub mod status;
pub mod transition;

pub use status::{label_for_code, slugify_label, status_code_for_label, JobStatus};
pub use transition::{plan_transition, AssignmentChange, JobPatch, TransitionPlan};
