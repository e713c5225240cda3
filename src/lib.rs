//! Table-of-contents sidebar for generated book sites.
//!
//! The outline markup is built once per book; this crate renders it into the
//! page, highlights the current chapter, keeps the sidebar scroll position
//! across navigations and wires the fold toggles.

mod components;

pub mod config;
pub mod dom;
pub mod error;
pub mod outline;
pub mod sidebar;
pub mod storage;

pub use components::SidebarScrollbox;
pub use config::SidebarConfig;
pub use error::SidebarError;
pub use sidebar::{attach, AttachReport, HeadlessSidebar, ScrollAction, SidebarHost};

use wasm_bindgen::prelude::*;

fn init_logging() {
    #[cfg(feature = "console-logging")]
    {
        console_log::init_with_level(log::Level::Debug).ok();
    }
}

fn config_from_js(config: &JsValue) -> Result<SidebarConfig, SidebarError> {
    let base = SidebarConfig::from_window()?;
    if config.is_undefined() || config.is_null() {
        return Ok(base);
    }
    let overrides: serde_json::Value = serde_wasm_bindgen::from_value(config.clone())?;
    base.merged_with(&overrides)
}

/// Attach the sidebar to an existing element.
///
/// This is the body of the `<mdbook-sidebar-scrollbox>` connected callback:
/// custom-element glue can call it with `this` and an optional config object.
/// Hosts the start function already attached are skipped.
#[wasm_bindgen(js_name = attachSidebar)]
pub fn attach_sidebar(host: web_sys::HtmlElement, config: JsValue) -> Result<(), JsValue> {
    let config = config_from_js(&config)?;
    dom::connect(host, &config)?;
    Ok(())
}

/// Mount a [`SidebarScrollbox`] component as the last child of `parent`.
#[wasm_bindgen(js_name = mountSidebar)]
pub fn mount_sidebar(parent: web_sys::HtmlElement, config: JsValue) -> Result<(), JsValue> {
    use leptos::prelude::*;

    let config = config_from_js(&config)?;
    leptos::mount::mount_to(parent, move || {
        view! { <SidebarScrollbox config=config /> }
    })
    .forget();
    Ok(())
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::outline::OutlineNode;
    use crate::storage::{BrowserSessionStore, SessionStore, SCROLL_OFFSET_KEY};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const OUTLINE: &str = concat!(
        r#"<ol class="chapter">"#,
        r#"<li class="chapter-item "><span class="chapter-link-wrapper"><a href="intro.html">Intro</a></span></li>"#,
        r#"<li class="chapter-item "><span class="chapter-link-wrapper"><a href="guide.html">Guide</a><a class="chapter-fold-toggle"><div>❱</div></a></span>"#,
        r#"<ol class="section"><li class="chapter-item "><span class="chapter-link-wrapper"><a href="https://example.com/">Out</a></span></li></ol></li>"#,
        r#"</ol>"#,
    );

    fn fresh_host() -> web_sys::HtmlElement {
        let document = web_sys::window().unwrap().document().unwrap();
        let host = document
            .create_element("mdbook-sidebar-scrollbox")
            .unwrap()
            .dyn_into::<web_sys::HtmlElement>()
            .unwrap();
        document.body().unwrap().append_child(&host).unwrap();
        host
    }

    #[wasm_bindgen_test]
    fn test_session_store_take_roundtrip() {
        let store = BrowserSessionStore;
        store.set(SCROLL_OFFSET_KEY, "120");
        assert_eq!(store.take(SCROLL_OFFSET_KEY).as_deref(), Some("120"));
        assert!(store.get(SCROLL_OFFSET_KEY).is_none());
    }

    #[wasm_bindgen_test]
    fn test_connect_rewrites_links_and_consumes_offset() {
        BrowserSessionStore.set(SCROLL_OFFSET_KEY, "10");
        let host = fresh_host();
        let config = SidebarConfig::default()
            .with_path_to_root("../")
            .with_outline(OUTLINE);

        let report = dom::connect(host.clone(), &config)
            .expect("connect")
            .expect("fresh host");
        assert_eq!(report.links, 4);
        assert_eq!(report.rewritten, 2);
        assert!(BrowserSessionStore.get(SCROLL_OFFSET_KEY).is_none());

        let first = host.query_selector("a").unwrap().unwrap();
        assert_eq!(first.get_attribute("href").as_deref(), Some("../intro.html"));
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_fold_toggle_click_flips_group() {
        let host = fresh_host();
        let config = SidebarConfig::default().with_outline(OUTLINE);
        dom::connect(host.clone(), &config).expect("connect");

        let toggle = host
            .query_selector(".chapter-fold-toggle")
            .unwrap()
            .unwrap()
            .dyn_into::<web_sys::HtmlElement>()
            .unwrap();
        let group = toggle.parent().and_then(|p| p.parent()).unwrap();
        assert!(!group.has_class("expanded"));
        toggle.click();
        assert!(group.has_class("expanded"));
        toggle.click();
        assert!(!group.has_class("expanded"));
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_link_click_records_offset() {
        let host = fresh_host();
        let config = SidebarConfig::default().with_outline(OUTLINE);
        dom::connect(host.clone(), &config).expect("connect");

        let link = host
            .query_selector("a")
            .unwrap()
            .unwrap()
            .dyn_into::<web_sys::HtmlElement>()
            .unwrap();
        // Keep the click from navigating the test page away.
        link.set_attribute("href", "#").unwrap();
        link.click();
        assert!(BrowserSessionStore.take(SCROLL_OFFSET_KEY).is_some());
        host.remove();
    }

    // A tall spacer pushes the current page's entry well below the fold.
    fn scrolling_outline() -> String {
        let address = web_sys::window().unwrap().location().href().unwrap();
        let current = crate::outline::current_page_identity(&address);
        format!(
            r#"<div style="height:1000px"></div><ol class="chapter"><li class="chapter-item "><span class="chapter-link-wrapper"><a href="{current}">Here</a></span></li></ol><div style="height:1000px"></div>"#
        )
    }

    fn scrolling_host() -> web_sys::HtmlElement {
        let host = fresh_host();
        host.set_attribute("style", "display:block;height:100px;overflow-y:auto")
            .unwrap();
        host
    }

    #[wasm_bindgen_test]
    fn test_connect_applies_stored_offset_to_scroll_top() {
        BrowserSessionStore.set(SCROLL_OFFSET_KEY, "980");
        let host = scrolling_host();
        let config = SidebarConfig::default().with_outline(scrolling_outline());

        let report = dom::connect(host.clone(), &config)
            .expect("connect")
            .expect("fresh host");
        assert_eq!(report.active, 1);
        let ScrollAction::Restored(delta) = report.scroll else {
            panic!("expected a restored offset, got {:?}", report.scroll);
        };
        assert!(delta > 0.0);
        assert!((f64::from(host.scroll_top()) - delta).abs() <= 1.0);
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_connect_twice_restores_offset_once() {
        BrowserSessionStore.set(SCROLL_OFFSET_KEY, "980");
        let host = scrolling_host();
        let config = SidebarConfig::default().with_outline(scrolling_outline());

        let first = dom::connect(host.clone(), &config).expect("connect");
        assert!(matches!(
            first.map(|r| r.scroll),
            Some(ScrollAction::Restored(_))
        ));
        let scrolled = host.scroll_top();
        assert!(scrolled > 0);

        // Start function and custom-element glue both reaching the host.
        let second = dom::connect(host.clone(), &config).expect("connect");
        assert!(second.is_none());
        assert_eq!(host.scroll_top(), scrolled);
        assert!(BrowserSessionStore.get(SCROLL_OFFSET_KEY).is_none());

        // Still exactly one click listener: one click, one stored value.
        let link = host
            .query_selector("a")
            .unwrap()
            .unwrap()
            .dyn_into::<web_sys::HtmlElement>()
            .unwrap();
        link.set_attribute("href", "#").unwrap();
        link.click();
        assert!(BrowserSessionStore.take(SCROLL_OFFSET_KEY).is_some());
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_config_from_js_object() {
        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"path_to_root".into(), &"../../".into()).unwrap();
        js_sys::Reflect::set(&obj, &"sidebar_selector".into(), &"#nav".into()).unwrap();

        let config = config_from_js(&obj.into()).expect("config");
        assert_eq!(config.path_to_root, "../../");
        assert_eq!(config.page_active_selector(), "#nav .active");
        assert_eq!(config.scroll_offset_key, "sidebar-scroll-offset");

        let bad = js_sys::Object::new();
        js_sys::Reflect::set(&bad, &"path_to_root".into(), &JsValue::from_f64(3.0)).unwrap();
        assert!(config_from_js(&bad.into()).is_err());
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    init_logging();

    let attached = SidebarConfig::from_window().and_then(|config| dom::connect_all(&config));
    match attached {
        Ok(n) => log::debug!("attached {n} sidebar(s)"),
        Err(err) => log::warn!("sidebar start failed: {err}"),
    }
}
