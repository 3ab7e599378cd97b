//! File upload component with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use halo_compose::input::{self, ALLOWED_EXTENSIONS};

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called once a file passed validation, before its bytes are read.
    on_reading: EventHandler<()>,
    /// Called with the raw file bytes and filename after a successful read.
    on_upload: EventHandler<(Vec<u8>, String)>,
}

/// A drag-and-drop zone with a file picker button.
///
/// Accepts PNG, JPEG, BMP, and WebP images no larger than
/// [`MAX_FILE_SIZE_MB`](halo_compose::config::MAX_FILE_SIZE_MB). Oversized
/// files are rejected before they are read and the picker is reset so the
/// same file can be chosen again.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut filename = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);
    // Bumped to remount the <input>, which clears its selection.
    let mut input_generation = use_signal(|| 0u32);

    let process_files = move |files: Vec<FileData>| async move {
        let Some(file) = files.first() else {
            return;
        };
        let name = file.name();
        if !input::has_allowed_extension(&name) {
            error.set(Some(format!("Unsupported file type: {name}")));
            input_generation += 1;
            return;
        }
        if let Err(e) = input::validate_file_size(file.size()) {
            error.set(Some(e.to_string()));
            input_generation += 1;
            return;
        }

        props.on_reading.call(());
        match file.read_bytes().await {
            Ok(bytes) => {
                filename.set(Some(name.clone()));
                error.set(None);
                props.on_upload.call((bytes.to_vec(), name));
            }
            Err(e) => {
                error.set(Some(format!("Failed to read file: {e}")));
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files()).await;
    };

    let border_class = if dragging() {
        "border-[var(--border-accent)] bg-[var(--surface-active)]"
    } else {
        "border-[var(--border-muted)] bg-[var(--surface)]"
    };
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    rsx! {
        div {
            class: "border-2 border-dashed rounded-lg p-6 text-center transition-colors {border_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            if let Some(ref name) = filename() {
                p { class: "text-[var(--text-success)] mb-2",
                    "Loaded: {name}"
                }
            }

            if let Some(ref err) = error() {
                p { class: "text-[var(--text-error)] mb-2",
                    "{err}"
                }
            }

            p { class: "text-[var(--text-secondary)] mb-3",
                "Drop a photo here or "
            }

            label {
                class: "inline-block px-4 py-2 bg-[var(--btn-primary)] hover:bg-[var(--btn-primary-hover)] rounded cursor-pointer text-white font-medium transition-colors",
                input {
                    key: "{input_generation}",
                    r#type: "file",
                    accept: "{accept}",
                    class: "hidden",
                    onchange: handle_files,
                }
                "Choose Photo"
            }

            p { class: "text-[var(--muted)] text-sm mt-2",
                "PNG, JPEG, BMP, WebP up to {halo_compose::config::MAX_FILE_SIZE_MB} MB"
            }
        }
    }
}
