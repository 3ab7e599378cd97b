//! A `requestAnimationFrame` loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

type RafClosure = Closure<dyn FnMut(f64)>;

/// Calls a function once per display frame until dropped.
pub struct FrameLoop {
    callback: Rc<RefCell<Option<RafClosure>>>,
    handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    /// Start calling `on_frame` every animation frame.
    ///
    /// The loop keeps running until the returned value is dropped. If
    /// there is no `window` the loop never starts.
    pub fn start(mut on_frame: impl FnMut() + 'static) -> Self {
        let callback: Rc<RefCell<Option<RafClosure>>> = Rc::new(RefCell::new(None));
        let handle = Rc::new(Cell::new(None));

        let next = Rc::clone(&callback);
        let next_handle = Rc::clone(&handle);
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
            on_frame();
            next_handle.set(schedule(&next));
        }) as Box<dyn FnMut(f64)>));

        handle.set(schedule(&callback));
        Self { callback, handle }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
        // Breaks the closure's reference to itself.
        self.callback.borrow_mut().take();
    }
}

fn schedule(callback: &Rc<RefCell<Option<RafClosure>>>) -> Option<i32> {
    let window = web_sys::window()?;
    let callback = callback.borrow();
    let closure = callback.as_ref()?;
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .ok()
}
