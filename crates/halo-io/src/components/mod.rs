//! Dioxus UI components for halo.
//!
//! Provides the photo upload zone, the zoom and pan sliders, the history
//! grid and its full-resolution modal.

mod editor_controls;
mod history_grid;
mod history_modal;
mod upload;

pub use editor_controls::EditorControls;
pub use history_grid::{HistoryGrid, HistoryView};
pub use history_modal::HistoryModal;
pub use upload::FileUpload;
