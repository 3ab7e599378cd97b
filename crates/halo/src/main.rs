use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use halo_compose::config::{CANVAS_HEIGHT, CANVAS_WIDTH, DOWNLOAD_FILENAME};
use halo_compose::{
    Gallery, HistoryRecord, HistoryStore, NewRecord, PixmapSurface, RecordId, Session,
    SliderRanges, StoreError, StorePhase,
};
use halo_io::raster::BlobUrl;
use halo_io::{
    EditorControls, FileUpload, FrameLoop, HistoryGrid, HistoryModal, HistoryView, IdbEngine,
    canvas, download,
};

const CANVAS_ID: &str = "avatar-canvas";

fn main() {
    dioxus::launch(app);
}

/// Long-lived, non-reactive editor state shared by every handler.
///
/// Only one handler runs at a time on the main thread, and none of them
/// holds a borrow across an `.await`.
struct Editor {
    session: RefCell<Session>,
    surface: RefCell<PixmapSurface>,
    store: HistoryStore<IdbEngine>,
    frame_loop: RefCell<Option<FrameLoop>>,
}

impl Editor {
    fn new() -> Result<Self, String> {
        let assets = halo_compose::default_assets().map_err(|e| e.to_string())?;
        let surface = PixmapSurface::new(CANVAS_WIDTH, CANVAS_HEIGHT).map_err(|e| e.to_string())?;
        Ok(Self {
            session: RefCell::new(Session::new(assets)),
            surface: RefCell::new(surface),
            store: HistoryStore::new(IdbEngine),
            frame_loop: RefCell::new(None),
        })
    }

    /// Redraw the canvas whenever the session has changed.
    fn start_render_loop(self: &Rc<Self>) {
        let canvas_el = match canvas::find_canvas(CANVAS_ID) {
            Ok(el) => el,
            Err(e) => {
                tracing::error!(error = %e, "render loop not started");
                return;
            }
        };
        let editor = Rc::clone(self);
        let frame_loop = FrameLoop::start(move || {
            let session = editor.session.borrow();
            let mut surface = editor.surface.borrow_mut();
            if session.render_if_dirty(&mut *surface)
                && let Err(e) = canvas::blit(&surface, &canvas_el)
            {
                tracing::warn!(error = %e, "canvas update failed");
            }
        });
        *self.frame_loop.borrow_mut() = Some(frame_loop);
    }
}

/// Re-read the store and rebuild the grid from scratch.
async fn refresh_history(
    editor: &Editor,
    mut history: Signal<Option<Rc<HistoryView>>>,
    mut history_error: Signal<Option<String>>,
) {
    let listed = editor.store.list().await;
    history_error.set(list_error(&listed));
    match listed {
        Ok(records) => match HistoryView::new(Gallery::from_records(records)) {
            Ok(view) => history.set(Some(Rc::new(view))),
            Err(e) => history_error.set(Some(format!(
                "Could not display history: {}",
                halo_io::idb::js_err(&e)
            ))),
        },
        Err(_) => history.set(None),
    }
}

/// The history panel message after a refresh; a successful list clears it.
fn list_error(listed: &Result<Vec<HistoryRecord>, StoreError>) -> Option<String> {
    listed.as_ref().err().map(ToString::to_string)
}

/// Root application component.
///
/// Owns the [`Editor`] and wires the upload zone, sliders, canvas,
/// download button, history grid and modal together.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    let editor = use_hook(|| Editor::new().map(Rc::new));

    let mut ranges = use_signal(|| Option::<SliderRanges>::None);
    let mut loading = use_signal(|| false);
    let mut saving = use_signal(|| false);
    let mut message = use_signal(|| Option::<String>::None);
    let history = use_signal(|| Option::<Rc<HistoryView>>::None);
    let history_error = use_signal(|| Option::<String>::None);
    let mut modal = use_signal(|| Option::<Rc<BlobUrl>>::None);

    // --- Startup: store -> first redraw -> gallery -> render loop ---
    let startup_editor = editor.clone();
    use_effect(move || {
        let Ok(editor) = startup_editor.clone() else {
            return;
        };
        spawn(async move {
            if let Err(e) = editor.store.init().await {
                tracing::warn!(error = %e, "history disabled");
            }
            editor.session.borrow().request_redraw();
            refresh_history(&editor, history, history_error).await;
            editor.start_render_loop();
        });
    });

    let editor = match editor {
        Ok(editor) => editor,
        Err(e) => {
            return rsx! {
                p { class: "p-6 text-[var(--text-error)]", "Failed to start: {e}" }
            };
        }
    };

    // --- Upload ---
    let on_reading = move |()| {
        loading.set(true);
        message.set(None);
    };
    let on_upload = {
        let editor = Rc::clone(&editor);
        move |(bytes, name): (Vec<u8>, String)| {
            let editor = Rc::clone(&editor);
            spawn(async move {
                // Let the loading overlay paint before the blocking decode.
                gloo_timers::future::TimeoutFuture::new(0).await;
                let result = editor.session.borrow_mut().load_bytes(&bytes);
                match result {
                    Ok(()) => {
                        tracing::info!(file = %name, "photo loaded");
                        ranges.set(editor.session.borrow().slider_ranges());
                    }
                    Err(e) => message.set(Some(e.to_string())),
                }
                loading.set(false);
            });
        }
    };

    // --- Sliders ---
    let on_scale = {
        let editor = Rc::clone(&editor);
        move |v: f64| {
            let mut session = editor.session.borrow_mut();
            session.set_scale(v);
            ranges.set(session.slider_ranges());
        }
    };
    let on_offset_x = {
        let editor = Rc::clone(&editor);
        move |v: f64| {
            let mut session = editor.session.borrow_mut();
            session.set_offset_x(v);
            ranges.set(session.slider_ranges());
        }
    };
    let on_offset_y = {
        let editor = Rc::clone(&editor);
        move |v: f64| {
            let mut session = editor.session.borrow_mut();
            session.set_offset_y(v);
            ranges.set(session.slider_ranges());
        }
    };

    // --- Download: export -> save -> refresh -> download ---
    let on_download = {
        let editor = Rc::clone(&editor);
        move |_| {
            let exported = {
                let session = editor.session.borrow();
                let mut surface = editor.surface.borrow_mut();
                session.export(&mut surface)
            };
            let export = match exported {
                Ok(export) => export,
                Err(e) => {
                    message.set(Some(e.to_string()));
                    return;
                }
            };
            message.set(None);
            saving.set(true);

            let editor = Rc::clone(&editor);
            spawn(async move {
                let record = NewRecord {
                    thumbnail: export.thumbnail,
                    full: export.full.clone(),
                };
                // An unavailable store was reported once at startup.
                if !matches!(editor.store.phase(), StorePhase::Failed(_)) {
                    match editor.store.save(record).await {
                        Ok(_) => refresh_history(&editor, history, history_error).await,
                        Err(e) => message.set(Some(format!("Saving to history failed: {e}"))),
                    }
                }
                if let Err(e) = download::trigger_download(&export.full, DOWNLOAD_FILENAME) {
                    message.set(Some(format!("Download failed: {e}")));
                }
                saving.set(false);
            });
        }
    };

    // --- History modal ---
    let on_open = move |id: RecordId| {
        let Some(view) = history() else {
            return;
        };
        let Some(detail) = view.gallery().open(id) else {
            return;
        };
        match BlobUrl::new(&detail.image) {
            Ok(url) => modal.set(Some(Rc::new(url))),
            Err(e) => message.set(Some(format!(
                "Could not open image: {}",
                halo_io::idb::js_err(&e)
            ))),
        }
    };
    let on_close = move |()| modal.set(None);

    let button_enabled = !saving();
    let enabled_class = "px-4 py-2 bg-[var(--btn-primary)] hover:bg-[var(--btn-primary-hover)] rounded text-white font-medium transition-colors cursor-pointer";
    let disabled_class =
        "px-4 py-2 bg-[var(--btn-disabled)] rounded text-[var(--text-disabled)] cursor-not-allowed";

    rsx! {
        // Tailwind CSS utilities compiled by build.rs.
        style { dangerous_inner_html: include_str!(env!("TAILWIND_CSS_PATH")) }
        style { dangerous_inner_html: include_str!("../theme.css") }

        div { class: "min-h-screen bg-(--bg) text-(--text) flex flex-col",
            header { class: "px-6 py-4 border-b border-(--border)",
                h1 { class: "text-2xl", "halo" }
                p { class: "text-(--muted) text-sm",
                    "Place your photo in the frame, adjust, and download"
                }
            }

            div { class: "flex-1 flex flex-col lg:flex-row gap-6 p-6",
                // Left column: canvas + controls
                div { class: "flex-1 flex flex-col gap-4 items-center",
                    div { class: "relative w-full max-w-[512px]",
                        canvas {
                            id: CANVAS_ID,
                            width: "{CANVAS_WIDTH}",
                            height: "{CANVAS_HEIGHT}",
                            class: "w-full aspect-square rounded bg-[var(--surface)]",
                        }
                        if loading() {
                            div { class: "absolute inset-0 flex items-center justify-center bg-black/40 rounded",
                                p { class: "text-white text-lg animate-pulse", "Loading..." }
                            }
                        }
                    }

                    div { class: "w-full max-w-[512px]",
                        EditorControls {
                            ranges: ranges(),
                            on_scale: on_scale,
                            on_offset_x: on_offset_x,
                            on_offset_y: on_offset_y,
                        }
                    }

                    if let Some(ref msg) = message() {
                        div { class: "w-full max-w-[512px] bg-(--error-bg) border border-(--error-border) rounded p-3",
                            p { class: "text-(--text-error) text-sm", "{msg}" }
                        }
                    }

                    button {
                        class: if button_enabled { enabled_class } else { disabled_class },
                        disabled: saving(),
                        onclick: on_download,
                        if saving() { "Saving..." } else { "Download" }
                    }

                    div { class: "w-full max-w-[512px]",
                        FileUpload {
                            on_reading: on_reading,
                            on_upload: on_upload,
                        }
                    }
                }

                // Right column: history
                div { class: "lg:w-96 flex-shrink-0",
                    if let Some(ref err) = history_error() {
                        p { class: "text-(--text-error) text-sm", "History unavailable: {err}" }
                    }
                    HistoryGrid {
                        view: history(),
                        on_open: on_open,
                    }
                }
            }

            if let Some(image) = modal() {
                HistoryModal {
                    image: image,
                    on_close: on_close,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use halo_compose::EncodedImage;

    use super::*;

    #[test]
    fn successful_refresh_clears_history_message() {
        let failed = Err(StoreError::Transaction("disk full".into()));
        assert!(list_error(&failed).is_some_and(|m| m.contains("disk full")));

        let recovered = Ok(vec![HistoryRecord {
            id: RecordId(1),
            thumbnail: EncodedImage::new(vec![1]),
            full: EncodedImage::new(vec![2]),
            timestamp: 5,
        }]);
        assert_eq!(list_error(&recovered), None);
        assert_eq!(list_error(&Ok(Vec::new())), None);
    }
}
