use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::outline::Marker;
use crate::storage::SCROLL_OFFSET_KEY;

pub(crate) const DEFAULT_HOST_TAG: &str = "mdbook-sidebar-scrollbox";
pub(crate) const DEFAULT_SIDEBAR_SELECTOR: &str = "#mdbook-sidebar";

/// Per-page settings for the sidebar widget.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SidebarConfig {
    /// Parent-directory segments from the current page to the book root.
    pub path_to_root: String,

    /// Outline markup to inject. `None` keeps whatever the host already holds.
    pub outline: Option<String>,

    pub scroll_offset_key: String,

    /// Page-level sidebar container, used to find the active entry to center.
    pub sidebar_selector: String,

    /// Tag of the elements the start function attaches to.
    pub host_tag: String,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            path_to_root: String::new(),
            outline: None,
            scroll_offset_key: SCROLL_OFFSET_KEY.to_string(),
            sidebar_selector: DEFAULT_SIDEBAR_SELECTOR.to_string(),
            host_tag: DEFAULT_HOST_TAG.to_string(),
        }
    }
}

impl SidebarConfig {
    pub fn with_path_to_root(mut self, path_to_root: impl Into<String>) -> Self {
        self.path_to_root = path_to_root.into();
        self
    }

    pub fn with_outline(mut self, outline: impl Into<String>) -> Self {
        self.outline = Some(outline.into());
        self
    }

    /// Overlay the keys present in `overrides` (a JSON object) onto `self`.
    ///
    /// Keys missing from the object keep their current value; unknown keys
    /// are ignored.
    pub fn merged_with(&self, overrides: &serde_json::Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
            for (key, value) in overrides {
                base.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::from_value(base)?)
    }

    /// CSS selector for the active entry inside the page-level sidebar.
    pub fn page_active_selector(&self) -> String {
        format!("{} .{}", self.sidebar_selector, Marker::Active)
    }

    /// Browser configuration.
    ///
    /// Starts from the defaults, then takes the page's `window.path_to_root`
    /// global, then the keys of the `window.SIDEBAR_CONFIG` object.
    pub fn from_window() -> Result<Self> {
        let mut config = Self::default();
        let Some(window) = web_sys::window() else {
            return Ok(config);
        };

        if let Some(path) = window.get("path_to_root").and_then(|v| v.as_string()) {
            config.path_to_root = path;
        }

        if let Some(overrides) = window.get("SIDEBAR_CONFIG") {
            if !overrides.is_undefined() && overrides.is_object() {
                let overrides: serde_json::Value =
                    serde_wasm_bindgen::from_value(overrides.into())?;
                config = config.merged_with(&overrides)?;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let c = SidebarConfig::default();
        assert_eq!(c.path_to_root, "");
        assert!(c.outline.is_none());
        assert_eq!(c.scroll_offset_key, "sidebar-scroll-offset");
        assert_eq!(c.host_tag, "mdbook-sidebar-scrollbox");
        assert_eq!(c.page_active_selector(), "#mdbook-sidebar .active");
    }

    #[test]
    fn test_merge_keeps_missing_keys() {
        let base = SidebarConfig::default().with_path_to_root("../");
        let merged = base
            .merged_with(&json!({ "outline": "<ol></ol>", "unknown": 1 }))
            .expect("merge");
        assert_eq!(merged.path_to_root, "../");
        assert_eq!(merged.outline.as_deref(), Some("<ol></ol>"));
        assert_eq!(merged.scroll_offset_key, "sidebar-scroll-offset");
    }

    #[test]
    fn test_merge_overrides_present_keys() {
        let base = SidebarConfig::default().with_path_to_root("../");
        let merged = base
            .merged_with(&json!({ "path_to_root": "", "sidebar_selector": "#nav" }))
            .expect("merge");
        assert_eq!(merged.path_to_root, "");
        assert_eq!(merged.page_active_selector(), "#nav .active");
    }

    #[test]
    fn test_merge_rejects_wrong_types() {
        let base = SidebarConfig::default();
        assert!(base.merged_with(&json!({ "path_to_root": 3 })).is_err());
    }

    #[test]
    fn test_deserialize_partial_object() {
        let c: SidebarConfig =
            serde_json::from_str(r#"{"path_to_root":"../../"}"#).expect("config should parse");
        assert_eq!(c.path_to_root, "../../");
        assert_eq!(c.host_tag, "mdbook-sidebar-scrollbox");
    }
}
