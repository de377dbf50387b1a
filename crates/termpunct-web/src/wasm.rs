#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function};
use termpunct_core::controller::{Dispatch, ImePunctuationController};
use termpunct_core::error::{PreferenceError, PreferenceResult};
use termpunct_core::preferences::PreferenceStore;
use termpunct_core::sink::RecordingSink;
use termpunct_core::{PassthroughConfig, SurfaceEvent};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CompositionEvent, Event, HtmlTextAreaElement, InputEvent};

use crate::dom::{DomEventFields, LISTENED_EVENTS, surface_event_from_dom};
use crate::host::{ListenerSet, ListenerTarget, deliver_while_attached};

/// Feature flag store backed by `window.localStorage`.
///
/// Missing `window`, disabled storage and `SecurityError`s all surface as
/// [`PreferenceError::Unavailable`], which the flag resolves to enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStoragePreferences;

impl PreferenceStore for LocalStoragePreferences {
    fn name(&self) -> &str {
        "LocalStoragePreferences"
    }

    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        let window =
            web_sys::window().ok_or_else(|| PreferenceError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| PreferenceError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| PreferenceError::Unavailable("localStorage disabled".into()))?;
        storage
            .get_item(key)
            .map_err(|e| PreferenceError::Unavailable(format!("{e:?}")))
    }
}

type Controller = ImePunctuationController<LocalStoragePreferences, RecordingSink>;

/// State shared between the exported object, DOM listeners and queued
/// microtasks.
struct Shared {
    controller: RefCell<Controller>,
    on_write: Function,
}

impl Shared {
    fn dispatch(self: &Rc<Self>, event: &SurfaceEvent) {
        let outcome = self.controller.borrow_mut().dispatch(event);
        if let Dispatch::Deferred { .. } = outcome {
            self.schedule_drain();
        }
    }

    /// Queue a drain on the JS microtask queue, after every listener of the
    /// current dispatch (including the engine's `onData`) has run.
    fn schedule_drain(self: &Rc<Self>) {
        let shared = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            shared.drain();
        });
    }

    fn drain(&self) {
        // Collect first so `onWrite` may call back into us without a
        // conflicting borrow.
        let writes: Vec<String> = {
            let mut controller = self.controller.borrow_mut();
            controller.run_deferred();
            controller.arbiter_mut().sink_mut().drain().collect()
        };
        deliver_while_attached(
            writes,
            || self.controller.borrow().is_attached(),
            |text| {
                if let Err(err) = self.on_write.call1(&JsValue::NULL, &JsValue::from_str(text)) {
                    warn!(?err, "onWrite callback threw");
                }
            },
        );
    }
}

impl ListenerTarget for HtmlTextAreaElement {
    type Callback = Closure<dyn FnMut(Event)>;
    type Error = JsValue;

    fn add_listener(&self, kind: &'static str, callback: &Self::Callback) -> Result<(), JsValue> {
        self.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
    }

    fn remove_listener(&self, kind: &'static str, callback: &Self::Callback) -> Result<(), JsValue> {
        self.remove_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
    }
}

fn dom_fields(event: &Event) -> DomEventFields {
    if let Some(input) = event.dyn_ref::<InputEvent>() {
        return DomEventFields {
            data: input.data(),
            is_composing: input.is_composing(),
            key: None,
        };
    }
    if let Some(composition) = event.dyn_ref::<CompositionEvent>() {
        return DomEventFields {
            data: composition.data(),
            ..DomEventFields::default()
        };
    }
    DomEventFields::default()
}

/// IME punctuation passthrough for one terminal view.
#[wasm_bindgen]
pub struct ImePunctuationPassthrough {
    shared: Rc<Shared>,
    listeners: Option<ListenerSet<HtmlTextAreaElement>>,
}

#[wasm_bindgen]
impl ImePunctuationPassthrough {
    /// Attach to the terminal's hidden `<textarea>`.
    ///
    /// `config_json` is an optional `PassthroughConfig` JSON document. Without
    /// a textarea no listeners are registered, but the keydown and `onData`
    /// entry points still work.
    #[wasm_bindgen(constructor)]
    pub fn new(
        textarea: Option<HtmlTextAreaElement>,
        on_write: Function,
        config_json: Option<String>,
    ) -> Result<ImePunctuationPassthrough, JsValue> {
        let config = match config_json {
            Some(json) => PassthroughConfig::from_json_str(&json)
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => PassthroughConfig::default(),
        };
        let shared = Rc::new(Shared {
            controller: RefCell::new(ImePunctuationController::attach(
                LocalStoragePreferences,
                RecordingSink::new(),
                &config,
            )),
            on_write,
        });

        let listeners = match textarea {
            Some(target) => {
                // Dropping `listeners` on an early return unregisters the ones
                // already added.
                let mut listeners = ListenerSet::new(target);
                for kind in LISTENED_EVENTS {
                    let shared = Rc::clone(&shared);
                    let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                        if let Some(surface) = surface_event_from_dom(kind, dom_fields(&event)) {
                            shared.dispatch(&surface);
                        }
                    });
                    listeners.add(kind, closure)?;
                }
                Some(listeners)
            }
            None => {
                debug!("no textarea; ime punctuation listeners not registered");
                None
            }
        };

        Ok(Self { shared, listeners })
    }

    /// Signal a keydown that may commit IME punctuation.
    #[wasm_bindgen(js_name = onImePunctuationKeydown)]
    pub fn on_ime_punctuation_keydown(&self) {
        self.shared.controller.borrow_mut().on_ime_punctuation_keydown();
    }

    /// Forward the terminal engine's `onData` payload.
    #[wasm_bindgen(js_name = handleOnData)]
    pub fn handle_on_data(&self, data: &str) {
        self.shared.controller.borrow_mut().handle_on_data(data);
    }

    /// Whether passthrough is currently enabled by the stored preference.
    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.shared.controller.borrow().arbiter().is_enabled()
    }

    /// Drain the decision trace as an array of JSONL strings.
    #[wasm_bindgen(js_name = drainTraceJsonl)]
    pub fn drain_trace_jsonl(&self) -> Result<Array, JsValue> {
        let lines = self
            .shared
            .controller
            .borrow_mut()
            .arbiter_mut()
            .drain_trace_jsonl()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(lines.into_iter().map(JsValue::from).collect())
    }

    /// Remove DOM listeners and cancel queued checks. Idempotent.
    pub fn cleanup(&mut self) {
        if let Some(mut listeners) = self.listeners.take() {
            listeners.remove_all();
        }
        self.shared.controller.borrow_mut().cleanup();
    }
}

// `free()` from JS without a prior `cleanup()` still detaches, and queued
// microtasks holding `Shared` find the controller detached.
impl Drop for ImePunctuationPassthrough {
    fn drop(&mut self) {
        self.cleanup();
    }
}
