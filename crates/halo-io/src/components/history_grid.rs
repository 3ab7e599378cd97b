//! Grid of previously saved composites.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdDownload;
use halo_compose::{Gallery, GalleryEntry, RecordId};
use wasm_bindgen::JsValue;

use crate::raster::BlobUrl;

/// A [`Gallery`] with an object URL for every thumbnail.
///
/// URLs are revoked when the value is dropped, so keep it alive for as
/// long as the grid shows it.
#[derive(Debug)]
pub struct HistoryView {
    gallery: Gallery,
    thumbnails: Vec<BlobUrl>,
}

impl HistoryView {
    /// Create object URLs for every entry in `gallery`.
    ///
    /// # Errors
    ///
    /// Returns the browser's error if any URL cannot be created.
    pub fn new(gallery: Gallery) -> Result<Self, JsValue> {
        let thumbnails = gallery
            .entries()
            .iter()
            .map(|e| BlobUrl::new(e.thumbnail()))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            gallery,
            thumbnails,
        })
    }

    /// The underlying gallery.
    #[must_use]
    pub const fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    fn cells(&self) -> impl Iterator<Item = (&GalleryEntry, &BlobUrl)> {
        self.gallery.entries().iter().zip(&self.thumbnails)
    }
}

/// Props for the [`HistoryGrid`] component.
#[derive(Props, Clone)]
pub struct HistoryGridProps {
    /// What to show. `None` while history is unavailable.
    view: Option<Rc<HistoryView>>,
    /// Called with the id of a clicked thumbnail.
    on_open: EventHandler<RecordId>,
}

impl PartialEq for HistoryGridProps {
    fn eq(&self, other: &Self) -> bool {
        let views_eq = match (&self.view, &other.view) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        views_eq && self.on_open == other.on_open
    }
}

/// Saved composites, newest first, each with a thumbnail download link.
#[component]
pub fn HistoryGrid(props: HistoryGridProps) -> Element {
    let Some(view) = props.view else {
        return rsx! {};
    };
    let on_open = props.on_open;

    rsx! {
        div { class: "space-y-3",
            h3 { class: "text-lg font-semibold text-[var(--text-heading)]", "History" }

            if view.gallery().is_empty() {
                p { class: "text-[var(--muted)] text-sm", "No saved avatars yet." }
            } else {
                div { class: "grid grid-cols-3 sm:grid-cols-4 gap-3",
                    for (entry, url) in view.cells() {
                        div {
                            key: "{entry.id()}",
                            class: "flex flex-col items-center gap-1",
                            img {
                                src: "{url.as_str()}",
                                alt: "{entry.alt_text()}",
                                class: "w-full aspect-square rounded cursor-pointer hover:opacity-80 transition-opacity",
                                onclick: {
                                    let id = entry.id();
                                    move |_| on_open.call(id)
                                },
                            }
                            a {
                                href: "{url.as_str()}",
                                download: "{entry.thumbnail_download_name()}",
                                class: "flex items-center gap-1 text-xs text-[var(--text-secondary)] hover:underline",
                                Icon { icon: LdDownload, width: 12, height: 12 }
                                "Download"
                            }
                        }
                    }
                }
            }
        }
    }
}
