//! halo-io: Browser I/O and Dioxus component library.
//!
//! Handles the `IndexedDB` history engine, canvas presentation, the
//! animation-frame loop, Blob URLs and downloads, and provides reusable
//! UI components for the halo web application.

pub mod canvas;
pub mod components;
pub mod download;
pub mod frame_loop;
pub mod idb;
pub mod raster;

pub use components::{EditorControls, FileUpload, HistoryGrid, HistoryModal, HistoryView};
pub use frame_loop::FrameLoop;
pub use idb::IdbEngine;
