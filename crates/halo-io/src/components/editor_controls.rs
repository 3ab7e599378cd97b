//! Zoom and pan sliders.

use dioxus::prelude::*;
use halo_compose::SliderRanges;
use halo_compose::config::{MAX_SCALE, MIN_SCALE, SCALE_STEP};

/// Props for the [`EditorControls`] component.
#[derive(Props, Clone, PartialEq)]
pub struct EditorControlsProps {
    /// Slider ranges and values; `None` disables every slider.
    ranges: Option<SliderRanges>,
    /// Zoom slider moved.
    on_scale: EventHandler<f64>,
    /// Horizontal pan slider moved.
    on_offset_x: EventHandler<f64>,
    /// Vertical pan slider moved.
    on_offset_y: EventHandler<f64>,
}

/// Zoom, horizontal and vertical pan sliders for the user's photo.
///
/// Pan ranges are symmetric around zero and shrink to nothing when the
/// photo exactly covers the circle on that axis.
#[component]
pub fn EditorControls(props: EditorControlsProps) -> Element {
    let enabled = props.ranges.is_some();
    let r = props.ranges.unwrap_or(SliderRanges {
        scale_min: MIN_SCALE,
        scale_max: MAX_SCALE,
        scale_step: SCALE_STEP,
        scale: MIN_SCALE,
        max_offset_x: 0.0,
        max_offset_y: 0.0,
        offset_x: 0.0,
        offset_y: 0.0,
    });

    let on_scale = props.on_scale;
    let on_offset_x = props.on_offset_x;
    let on_offset_y = props.on_offset_y;

    rsx! {
        div { class: "flex flex-col gap-3",
            {render_slider("zoom", "Zoom", enabled, r.scale, r.scale_min, r.scale_max, r.scale_step, 2, move |v| on_scale.call(v))}
            {render_slider("offset-x", "Horizontal", enabled, r.offset_x, -r.max_offset_x, r.max_offset_x, 1.0, 0, move |v| on_offset_x.call(v))}
            {render_slider("offset-y", "Vertical", enabled, r.offset_y, -r.max_offset_y, r.max_offset_y, 1.0, 0, move |v| on_offset_y.call(v))}
        }
    }
}

/// Render a labeled range slider.
#[allow(clippy::too_many_arguments)]
fn render_slider(
    id: &str,
    label: &str,
    enabled: bool,
    value: f64,
    min: f64,
    max: f64,
    step: f64,
    decimals: usize,
    on_input: impl Fn(f64) + 'static,
) -> Element {
    let display = format!("{value:.decimals$}");
    let id = id.to_string();
    let label = label.to_string();

    rsx! {
        div { class: "flex flex-col gap-1",
            div { class: "flex justify-between text-sm",
                label { r#for: "{id}",
                    class: "text-[var(--text-heading)] font-medium",
                    "{label}"
                }
                span { class: "text-[var(--text-secondary)] tabular-nums",
                    "{display}"
                }
            }
            input {
                r#type: "range",
                id: "{id}",
                min: "{min}",
                max: "{max}",
                step: "{step}",
                value: "{value}",
                disabled: !enabled,
                class: "w-full accent-[var(--btn-primary)]",
                oninput: move |e| {
                    match e.value().parse::<f64>() {
                        Ok(v) => on_input(v),
                        Err(err) => {
                            web_sys::console::warn_1(
                                &format!("slider parse failure: {err:?} from {:?}", e.value())
                                    .into(),
                            );
                        }
                    }
                },
            }
        }
    }
}
