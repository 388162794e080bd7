//! WebAssembly bindings.
//!
//! This module provides JavaScript-friendly wrappers around a [`Session`]
//! so a browser page can render the state.

use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;
use crate::session::{parse_script, ScriptLoad, BREAK_MARKER};
use crate::session::log::Snapshot;
use crate::{EngineConfig, Session};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

/// Outcome of a script load as seen from JavaScript.
#[derive(Debug, serde::Serialize)]
struct ScriptReport {
    queued: usize,
    errors: Vec<String>,
}

impl From<&ScriptLoad> for ScriptReport {
    fn from(load: &ScriptLoad) -> Self {
        Self {
            queued: load.queued,
            errors: load.errors(),
        }
    }
}

/// WebAssembly-friendly session wrapper.
#[wasm_bindgen]
pub struct WasmSession {
    session: Session,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a new session with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            session: Session::new(EngineConfig::default()),
        }
    }

    /// Execute one instruction line.
    #[wasm_bindgen]
    pub fn execute(&mut self, line: &str) -> Result<(), JsError> {
        self.session
            .execute(line)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Load a script.
    ///
    /// Failing lines do not stop the load. Returns a JSON object
    /// `{"queued": n, "errors": ["line: message", ...]}`.
    #[wasm_bindgen]
    pub fn load_script(&mut self, source: &str) -> Result<String, JsError> {
        let load = self.session.load_script(parse_script(source), BREAK_MARKER);
        to_js(&ScriptReport::from(&load))
    }

    /// Run the next reserved line. Returns the line, or `undefined` if none.
    #[wasm_bindgen]
    pub fn step_reserved(&mut self) -> Result<Option<String>, JsError> {
        match self.session.step_reserved() {
            Some(step) => step
                .result
                .map(|()| Some(step.line))
                .map_err(|e| JsError::new(&e.to_string())),
            None => Ok(None),
        }
    }

    /// Registers, memory and stacks as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        to_js(&Snapshot::capture(self.session.cpu()))
    }

    /// Labels as a flat JSON object, name to address.
    #[wasm_bindgen]
    pub fn labels_json(&self) -> Result<String, JsError> {
        to_js(&self.session.labels().iter().collect::<BTreeMap<_, _>>())
    }

    /// History as a JSON array.
    #[wasm_bindgen]
    pub fn history_json(&self) -> Result<String, JsError> {
        to_js(&self.session.history())
    }

    /// Reserved lines as a JSON array, next first.
    #[wasm_bindgen]
    pub fn reserved_json(&self) -> Result<String, JsError> {
        to_js(&self.session.reserved().collect::<Vec<_>>())
    }
}

impl Default for WasmSession {
    fn default() -> Self {
        Self::new()
    }
}
