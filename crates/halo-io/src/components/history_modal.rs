//! Full-resolution view of a saved composite.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdX;

use crate::raster::BlobUrl;

/// The composite is shown whole, corners included.
const IMAGE_CLASS: &str = "max-w-[90vw] max-h-[90vh] rounded";

/// Props for the [`HistoryModal`] component.
#[derive(Props, Clone)]
pub struct HistoryModalProps {
    /// Object URL of the full-resolution PNG.
    image: Rc<BlobUrl>,
    /// Called when the close button or the backdrop is clicked.
    on_close: EventHandler<()>,
}

impl PartialEq for HistoryModalProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.image, &other.image) && self.on_close == other.on_close
    }
}

/// Overlay showing one saved composite at full resolution.
#[component]
pub fn HistoryModal(props: HistoryModalProps) -> Element {
    let on_close = props.on_close;

    rsx! {
        div {
            class: "fixed inset-0 z-50 flex items-center justify-center bg-black/70",
            onclick: move |_| on_close.call(()),
            div {
                class: "relative max-w-[90vw] max-h-[90vh]",
                // Clicks on the image itself must not reach the backdrop.
                onclick: move |evt| evt.stop_propagation(),
                button {
                    class: "absolute -top-3 -right-3 w-8 h-8 flex items-center justify-center rounded-full bg-[var(--surface)] text-[var(--text)] shadow",
                    aria_label: "Close",
                    onclick: move |evt| {
                        evt.stop_propagation();
                        on_close.call(());
                    },
                    Icon { icon: LdX, width: 16, height: 16 }
                }
                img {
                    src: "{props.image.as_str()}",
                    alt: "Saved avatar",
                    class: IMAGE_CLASS,
                }
            }
        }
    }
}
