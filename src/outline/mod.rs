pub mod tree;

pub use tree::{OutlineTree, TreeNode};

/// Class names the outline markup and the widget agree on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Marker {
    Active,
    Expanded,
    ChapterItem,
    ChapterFoldToggle,
}

/// The element handle the sidebar logic walks.
///
/// Implemented for `web_sys::Element` in the browser and for [`TreeNode`] in
/// the headless backend. Mutations go through `&self`, like the DOM.
pub trait OutlineNode: Clone {
    /// Upper-case tag name (`"A"`, `"LI"`), as the DOM reports it.
    fn tag(&self) -> String;
    fn has_class(&self, class: &str) -> bool;
    fn add_class(&self, class: &str);
    /// Returns whether the class is present afterwards.
    fn toggle_class(&self, class: &str) -> bool;
    fn parent(&self) -> Option<Self>;
    /// The raw `href` attribute.
    fn href_attr(&self) -> Option<String>;
    fn set_href(&self, href: &str);
    /// The `href` resolved against the document address.
    fn resolved_href(&self) -> Option<String>;

    fn is_tag(&self, tag: &str) -> bool {
        self.tag().eq_ignore_ascii_case(tag)
    }
}

/// Strip fragment and query, and map a trailing `/` to its index document.
pub fn current_page_identity(address: &str) -> String {
    let page = address.split('#').next().unwrap_or_default();
    let page = page.split('?').next().unwrap_or_default();

    let mut page = page.to_string();
    if page.ends_with('/') {
        page.push_str("index.html");
    }
    page
}

/// True for `scheme://...` (lowercase letters and `+` only) and `//host/...`.
pub fn is_network_address(href: &str) -> bool {
    let Some(pos) = href.find("//") else {
        return false;
    };
    let prefix = &href[..pos];
    if prefix.is_empty() {
        return true;
    }

    let Some(scheme) = prefix.strip_suffix(':') else {
        return false;
    };
    !scheme.is_empty() && scheme.bytes().all(|b| b.is_ascii_lowercase() || b == b'+')
}

/// The root-relative form of `href`, or `None` when it must stay as written.
pub fn normalize_href(href: &str, path_to_root: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') || is_network_address(href) {
        return None;
    }
    Some(format!("{path_to_root}{href}"))
}

/// Whether the link at `index` (document order) is the current page's entry.
///
/// The index page aliases the first chapter, so on a root-level
/// `.../index.html` the first link is current even without an exact match.
pub fn is_current_link(
    resolved_href: Option<&str>,
    current_page: &str,
    index: usize,
    path_to_root: &str,
) -> bool {
    if resolved_href == Some(current_page) {
        return true;
    }
    index == 0 && path_to_root.is_empty() && current_page.ends_with("/index.html")
}

/// Mark `link` active and expand every enclosing chapter item up to the root.
///
/// Returns the number of chapter items touched.
pub fn mark_active<N: OutlineNode>(link: &N) -> usize {
    link.add_class(Marker::Active.as_ref());

    let mut expanded = 0;
    let mut parent = link.parent();
    while let Some(el) = parent {
        if el.is_tag("LI") && el.has_class(Marker::ChapterItem.as_ref()) {
            el.add_class(Marker::Expanded.as_ref());
            expanded += 1;
        }
        parent = el.parent();
    }
    expanded
}

/// Flip `expanded` on the chapter item that owns a fold toggle.
///
/// The toggle sits in the item's link wrapper, so the item is its grandparent.
pub fn toggle_fold<N: OutlineNode>(toggle: &N) -> Option<bool> {
    let group = toggle.parent()?.parent()?;
    Some(group.toggle_class(Marker::Expanded.as_ref()))
}
