//! Errors raised while locating the browser environment or reading
//! configuration. The widget logic itself never fails.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SidebarError {
    #[error("no global `window` object")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("invalid sidebar configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid sidebar configuration object: {0}")]
    ConfigObject(#[from] serde_wasm_bindgen::Error),

    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for SidebarError {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::JSON::stringify(&value)
                    .ok()
                    .and_then(|s| s.as_string())
            })
            .unwrap_or_else(|| format!("{value:?}"));
        Self::Js(message)
    }
}

impl From<SidebarError> for JsValue {
    fn from(err: SidebarError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

pub type Result<T, E = SidebarError> = std::result::Result<T, E>;
