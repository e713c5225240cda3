use std::cell::{Cell, RefCell};

use crate::config::DEFAULT_HOST_TAG;
use crate::outline::{Marker, OutlineTree, TreeNode};

use super::SidebarHost;

/// A sidebar host without a browser.
///
/// The outline lives in an [`OutlineTree`] whose links resolve against the
/// page address. There is no layout engine, so element offsets are whatever
/// [`HeadlessSidebar::set_offset`] assigned (0 otherwise), and scrolling only
/// moves a counter.
#[derive(Debug)]
pub struct HeadlessSidebar {
    tree: OutlineTree,
    offsets: RefCell<Vec<(TreeNode, f64)>>,
    scroll_top: Cell<f64>,
    centered: RefCell<Option<TreeNode>>,
}

impl HeadlessSidebar {
    pub fn new(page_address: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            tree: OutlineTree::new(DEFAULT_HOST_TAG).with_base(page_address)?,
            offsets: RefCell::new(vec![]),
            scroll_top: Cell::new(0.0),
            centered: RefCell::new(None),
        })
    }

    pub fn tree(&self) -> &OutlineTree {
        &self.tree
    }

    pub fn set_offset(&self, node: &TreeNode, offset: f64) {
        let mut offsets = self.offsets.borrow_mut();
        match offsets.iter_mut().find(|(n, _)| n == node) {
            Some((_, v)) => *v = offset,
            None => offsets.push((node.clone(), offset)),
        }
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top.get()
    }

    pub fn set_scroll_top(&self, value: f64) {
        self.scroll_top.set(value);
    }

    /// The last element passed to `center_in_view`.
    pub fn centered(&self) -> Option<TreeNode> {
        self.centered.borrow().clone()
    }
}

impl SidebarHost for HeadlessSidebar {
    type Node = TreeNode;

    fn set_outline(&self, markup: &str) {
        self.offsets.borrow_mut().clear();
        self.centered.replace(None);
        self.tree.set_inner_html(markup);
    }

    fn links(&self) -> Vec<TreeNode> {
        self.tree.select_by_tag("a")
    }

    fn fold_toggles(&self) -> Vec<TreeNode> {
        self.tree
            .select_by_class(Marker::ChapterFoldToggle.as_ref())
    }

    fn active_link(&self) -> Option<TreeNode> {
        self.tree
            .select_by_class(Marker::Active.as_ref())
            .into_iter()
            .next()
    }

    fn offset_top(&self, node: &TreeNode) -> f64 {
        self.offsets
            .borrow()
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }

    fn scroll_by(&self, delta: f64) {
        self.scroll_top.set(self.scroll_top.get() + delta);
    }

    fn center_in_view(&self, node: &TreeNode) {
        self.centered.replace(Some(node.clone()));
    }
}
