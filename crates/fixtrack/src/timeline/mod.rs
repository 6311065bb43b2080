//! Status timeline: note parsing and interval reconstruction.

pub mod parser;
pub mod reconstruct;

pub use parser::{render_status_change_note, ParsedStatusChange, StatusChangeParser};
pub use reconstruct::{
    changes_from_events, changes_from_notes, parse_timestamp, reconstruct, StatusChange,
    StatusTimelineEntry,
};
