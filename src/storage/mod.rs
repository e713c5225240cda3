use std::cell::RefCell;
use std::collections::HashMap;

pub(crate) const SCROLL_OFFSET_KEY: &str = "sidebar-scroll-offset";

/// Minimal key-value view of session-scoped storage.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// Read a value and delete it in the same step.
    fn take(&self, key: &str) -> Option<String> {
        let value = self.get(key);
        self.remove(key);
        value
    }
}

/// `window.sessionStorage`. Every call is a no-op when storage is unavailable
/// (sandboxed frames, privacy modes).
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSessionStore;

impl BrowserSessionStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.session_storage().ok().flatten())
    }
}

impl SessionStore for BrowserSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, value).is_err() {
                log::warn!("sessionStorage rejected write to {key}");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// In-memory store for headless use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

pub(crate) fn save_scroll_offset<S: SessionStore + ?Sized>(store: &S, key: &str, offset: f64) {
    store.set(key, &offset.to_string());
}

/// Parse a stored offset. Unparsable values count as absent.
pub(crate) fn parse_scroll_offset(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_take_reads_once() {
        let store = MemoryStore::new();
        store.set(SCROLL_OFFSET_KEY, "120");
        assert_eq!(store.take(SCROLL_OFFSET_KEY).as_deref(), Some("120"));
        assert!(store.take(SCROLL_OFFSET_KEY).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_scroll_offset_formats_like_js_numbers() {
        let store = MemoryStore::new();
        save_scroll_offset(&store, SCROLL_OFFSET_KEY, 120.0);
        assert_eq!(store.get(SCROLL_OFFSET_KEY).as_deref(), Some("120"));

        save_scroll_offset(&store, SCROLL_OFFSET_KEY, -12.5);
        assert_eq!(store.get(SCROLL_OFFSET_KEY).as_deref(), Some("-12.5"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_parse_scroll_offset() {
        assert_eq!(parse_scroll_offset("120"), Some(120.0));
        assert_eq!(parse_scroll_offset(" 80.25 "), Some(80.25));
        assert_eq!(parse_scroll_offset("-4"), Some(-4.0));
        assert!(parse_scroll_offset("").is_none());
        assert!(parse_scroll_offset("abc").is_none());
        assert!(parse_scroll_offset("NaN").is_none());
        assert!(parse_scroll_offset("inf").is_none());
    }
}
