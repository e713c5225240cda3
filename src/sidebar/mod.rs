pub mod headless;

pub use headless::HeadlessSidebar;

use crate::config::SidebarConfig;
use crate::outline::{
    current_page_identity, is_current_link, mark_active, normalize_href, OutlineNode,
};
use crate::storage::{parse_scroll_offset, save_scroll_offset, SessionStore};

/// The element the outline is rendered into, plus the page around it.
pub trait SidebarHost {
    type Node: OutlineNode;

    fn set_outline(&self, markup: &str);

    /// Every anchor inside the host, in document order.
    fn links(&self) -> Vec<Self::Node>;

    /// Every fold toggle on the page.
    fn fold_toggles(&self) -> Vec<Self::Node>;

    /// The first active entry inside the host.
    fn active_link(&self) -> Option<Self::Node>;

    /// The active entry of the page-level sidebar. Usually the same element.
    fn page_active_link(&self) -> Option<Self::Node> {
        self.active_link()
    }

    /// Distance in pixels from the host's top edge to the node's top edge.
    fn offset_top(&self, node: &Self::Node) -> f64;

    fn scroll_by(&self, delta: f64);

    /// Scroll so the node sits in the vertical center of its container.
    fn center_in_view(&self, node: &Self::Node);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollAction {
    /// Scrolled by the given delta to put the active entry where it was clicked.
    Restored(f64),
    /// No stored offset; the active entry was centered.
    Centered,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttachReport {
    pub links: usize,
    pub rewritten: usize,
    pub active: usize,
    pub scroll: ScrollAction,
}

/// Render the outline into `host` and bring it in line with the current page.
///
/// Event wiring is left to the caller; the handlers it installs should call
/// [`record_click`] and [`crate::outline::toggle_fold`].
pub fn attach<H, S>(
    host: &H,
    store: &S,
    config: &SidebarConfig,
    current_address: &str,
) -> AttachReport
where
    H: SidebarHost,
    S: SessionStore + ?Sized,
{
    if let Some(outline) = &config.outline {
        host.set_outline(outline);
    }

    let current_page = current_page_identity(current_address);
    let links = host.links();
    let mut rewritten = 0;
    let mut active = 0;

    for (i, link) in links.iter().enumerate() {
        if let Some(href) = link.href_attr() {
            if let Some(normalized) = normalize_href(&href, &config.path_to_root) {
                link.set_href(&normalized);
                rewritten += 1;
            }
        }

        let resolved = link.resolved_href();
        if is_current_link(resolved.as_deref(), &current_page, i, &config.path_to_root) {
            let expanded = mark_active(link);
            log::debug!("active link {resolved:?}, expanded {expanded} chapter items");
            active += 1;
        }
    }

    let scroll = restore_scroll(host, store, &config.scroll_offset_key);

    let report = AttachReport {
        links: links.len(),
        rewritten,
        active,
        scroll,
    };
    log::debug!("sidebar attached to {current_page}: {report:?}");
    report
}

/// Consume the offset saved by the last sidebar click and scroll to match.
pub fn restore_scroll<H, S>(host: &H, store: &S, key: &str) -> ScrollAction
where
    H: SidebarHost,
    S: SessionStore + ?Sized,
{
    match store.take(key) {
        Some(raw) => {
            // Navigated by clicking in the sidebar: keep the entry under the pointer.
            let Some(active) = host.active_link() else {
                return ScrollAction::None;
            };
            let Some(stored) = parse_scroll_offset(&raw) else {
                log::warn!("ignoring unparsable sidebar offset {raw:?}");
                return ScrollAction::None;
            };
            let delta = host.offset_top(&active) - stored;
            host.scroll_by(delta);
            ScrollAction::Restored(delta)
        }
        None => {
            // Navigated some other way, e.g. the next/previous chapter buttons.
            let Some(active) = host.page_active_link() else {
                return ScrollAction::None;
            };
            host.center_in_view(&active);
            ScrollAction::Centered
        }
    }
}

/// Click handler body: remember where a clicked link sat inside the host.
///
/// Only direct hits on an anchor count; a click on a child of the anchor is
/// ignored. Returns the stored offset.
pub fn record_click<H, S>(host: &H, store: &S, key: &str, target: &H::Node) -> Option<f64>
where
    H: SidebarHost,
    S: SessionStore + ?Sized,
{
    if !target.is_tag("A") {
        return None;
    }
    let offset = host.offset_top(target);
    save_scroll_offset(store, key, offset);
    Some(offset)
}
