//! Search lifecycle: orchestration, school filters and preference
//! persistence.

mod filters;
mod orchestrator;
mod prefs;

pub use filters::FilterPreferences;
pub use orchestrator::{
    CategorySnapshot, SearchError, SearchOrchestrator, SearchPhase, SearchSnapshot,
    SelectionView,
};
pub use prefs::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore, PrefsError};
