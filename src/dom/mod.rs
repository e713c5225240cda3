use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlAnchorElement, HtmlElement, NodeList};

use crate::config::SidebarConfig;
use crate::error::{Result, SidebarError};
use crate::outline::{toggle_fold, Marker, OutlineNode};
use crate::sidebar::{self, AttachReport, SidebarHost};
use crate::storage::BrowserSessionStore;

// Toggles are page-wide; a second sidebar on the page must not wire them twice.
const WIRED_ATTR: &str = "data-fold-wired";
// Set on a host once it is attached; the start function and custom-element glue may both reach it.
const CONNECTED_ATTR: &str = "data-sidebar-connected";

impl OutlineNode for Element {
    fn tag(&self) -> String {
        self.tag_name()
    }

    fn has_class(&self, class: &str) -> bool {
        self.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        let _ = self.class_list().add_1(class);
    }

    fn toggle_class(&self, class: &str) -> bool {
        self.class_list().toggle(class).unwrap_or(false)
    }

    fn parent(&self) -> Option<Self> {
        self.parent_element()
    }

    fn href_attr(&self) -> Option<String> {
        self.get_attribute("href")
    }

    fn set_href(&self, href: &str) {
        let _ = self.set_attribute("href", href);
    }

    fn resolved_href(&self) -> Option<String> {
        self.dyn_ref::<HtmlAnchorElement>().map(|a| a.href())
    }
}

/// A live sidebar element in the page.
#[derive(Clone, Debug)]
pub struct WebSidebar {
    host: HtmlElement,
    document: Document,
    page_active_selector: String,
}

impl WebSidebar {
    pub fn new(host: HtmlElement, config: &SidebarConfig) -> Result<Self> {
        let document = host.owner_document().ok_or(SidebarError::NoDocument)?;
        Ok(Self {
            host,
            document,
            page_active_selector: config.page_active_selector(),
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.host
    }
}

fn elements(list: Result<NodeList, wasm_bindgen::JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return vec![];
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl SidebarHost for WebSidebar {
    type Node = Element;

    fn set_outline(&self, markup: &str) {
        self.host.set_inner_html(markup);
    }

    fn links(&self) -> Vec<Element> {
        elements(self.host.query_selector_all("a"))
    }

    fn fold_toggles(&self) -> Vec<Element> {
        let selector = format!(".{}", Marker::ChapterFoldToggle);
        elements(self.document.query_selector_all(&selector))
    }

    fn active_link(&self) -> Option<Element> {
        let selector = format!(".{}", Marker::Active);
        self.host.query_selector(&selector).ok().flatten()
    }

    fn page_active_link(&self) -> Option<Element> {
        self.document
            .query_selector(&self.page_active_selector)
            .ok()
            .flatten()
    }

    fn offset_top(&self, node: &Element) -> f64 {
        node.get_bounding_client_rect().top() - self.host.get_bounding_client_rect().top()
    }

    fn scroll_by(&self, delta: f64) {
        self.host.scroll_by_with_x_and_y(0.0, delta);
    }

    fn center_in_view(&self, node: &Element) {
        let options = web_sys::ScrollIntoViewOptions::new();
        options.set_block(web_sys::ScrollLogicalPosition::Center);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }
}

/// Attach the sidebar to `host` and install its event handlers.
///
/// The handlers live as long as the page, so their closures are leaked.
/// A host that is already connected is left alone and yields `None`; a second
/// attach would find the scroll offset consumed and undo its restore.
pub fn connect(host: HtmlElement, config: &SidebarConfig) -> Result<Option<AttachReport>> {
    if host.has_attribute(CONNECTED_ATTR) {
        log::debug!("sidebar host already connected, skipping");
        return Ok(None);
    }
    let window = web_sys::window().ok_or(SidebarError::NoWindow)?;
    let address = window.location().href()?;

    host.set_attribute(CONNECTED_ATTR, "")?;
    let web = WebSidebar::new(host, config)?;
    let report = sidebar::attach(&web, &BrowserSessionStore, config, &address);

    listen_for_link_clicks(&web, &config.scroll_offset_key)?;
    listen_for_fold_toggles(&web)?;

    Ok(Some(report))
}

fn listen_for_link_clicks(web: &WebSidebar, key: &str) -> Result<()> {
    let handler_host = web.clone();
    let key = key.to_string();
    let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
        let Some(target) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        sidebar::record_click(&handler_host, &BrowserSessionStore, &key, &target);
    });

    let options = web_sys::AddEventListenerOptions::new();
    options.set_passive(true);
    web.element()
        .add_event_listener_with_callback_and_add_event_listener_options(
            "click",
            cb.as_ref().unchecked_ref(),
            &options,
        )?;
    cb.forget();
    Ok(())
}

fn listen_for_fold_toggles(web: &WebSidebar) -> Result<()> {
    let toggles: Vec<Element> = web
        .fold_toggles()
        .into_iter()
        .filter(|t| !t.has_attribute(WIRED_ATTR))
        .collect();
    if toggles.is_empty() {
        return Ok(());
    }

    let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
        if let Some(toggle) = ev.current_target().and_then(|t| t.dyn_into::<Element>().ok()) {
            toggle_fold(&toggle);
        }
    });
    for toggle in &toggles {
        toggle.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        toggle.set_attribute(WIRED_ATTR, "")?;
    }
    cb.forget();
    Ok(())
}

/// Attach to every `config.host_tag` element already in the document.
///
/// Returns how many hosts were newly connected.
pub fn connect_all(config: &SidebarConfig) -> Result<usize> {
    let document = web_sys::window()
        .ok_or(SidebarError::NoWindow)?
        .document()
        .ok_or(SidebarError::NoDocument)?;

    let hosts = document.get_elements_by_tag_name(&config.host_tag);
    let mut attached = 0;
    for i in 0..hosts.length() {
        let Some(host) = hosts.item(i).and_then(|el| el.dyn_into::<HtmlElement>().ok()) else {
            continue;
        };
        if connect(host, config)?.is_some() {
            attached += 1;
        }
    }
    Ok(attached)
}
