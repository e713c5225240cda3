use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use url::Url;

use super::OutlineNode;

const ROOT: usize = 0;

const VOID_TAGS: &[&str] = &[
    "AREA", "BASE", "BR", "COL", "EMBED", "HR", "IMG", "INPUT", "LINK", "META", "SOURCE",
    "TRACK", "WBR",
];

#[derive(Debug, Clone)]
enum Child {
    Element(usize),
    Text(String),
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<Child>,
}

impl ElementData {
    fn new(tag: String, attrs: Vec<(String, String)>, parent: Option<usize>) -> Self {
        Self {
            tag,
            attrs,
            parent,
            children: vec![],
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
struct Arena {
    // Index order is document order; index 0 is the host element.
    nodes: Vec<ElementData>,
    base: Option<Url>,
}

/// An in-memory element tree holding a rendered outline.
///
/// The parser understands the markup the site generator emits: nested
/// lists, quoted attributes, text and comments. Like a browser, an `<li>`
/// start tag closes an `<li>` still open in the same list, and stray end
/// tags are dropped.
#[derive(Clone)]
pub struct OutlineTree {
    arena: Rc<RefCell<Arena>>,
}

impl OutlineTree {
    pub fn new(host_tag: &str) -> Self {
        let root = ElementData::new(host_tag.to_ascii_uppercase(), vec![], None);
        Self {
            arena: Rc::new(RefCell::new(Arena {
                nodes: vec![root],
                base: None,
            })),
        }
    }

    /// Address that relative hrefs resolve against.
    pub fn with_base(self, base: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base)?;
        self.arena.borrow_mut().base = Some(base);
        Ok(self)
    }

    pub fn root(&self) -> TreeNode {
        self.node(ROOT)
    }

    /// Replace everything under the host element with `markup`.
    pub fn set_inner_html(&self, markup: &str) {
        let mut arena = self.arena.borrow_mut();
        arena.nodes.truncate(1);
        arena.nodes[ROOT].children.clear();
        parse_into(&mut arena, markup);
    }

    /// Descendants of the host with the given tag, in document order.
    pub fn select_by_tag(&self, tag: &str) -> Vec<TreeNode> {
        self.select(|el| el.tag.eq_ignore_ascii_case(tag))
    }

    /// Descendants of the host carrying `class`, in document order.
    pub fn select_by_class(&self, class: &str) -> Vec<TreeNode> {
        self.select(|el| el.classes().contains(&class))
    }

    /// First descendant whose `href` attribute equals `href`.
    pub fn find_link(&self, href: &str) -> Option<TreeNode> {
        self.select(|el| el.tag == "A" && el.attr("href") == Some(href))
            .into_iter()
            .next()
    }

    fn select(&self, pred: impl Fn(&ElementData) -> bool) -> Vec<TreeNode> {
        let ids: Vec<usize> = {
            let arena = self.arena.borrow();
            (1..arena.nodes.len())
                .filter(|&id| pred(&arena.nodes[id]))
                .collect()
        };
        ids.into_iter().map(|id| self.node(id)).collect()
    }

    fn node(&self, id: usize) -> TreeNode {
        TreeNode {
            arena: Rc::clone(&self.arena),
            id,
        }
    }
}

impl fmt::Debug for OutlineTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        f.debug_struct("OutlineTree")
            .field("elements", &arena.nodes.len())
            .field("base", &arena.base.as_ref().map(Url::as_str))
            .finish()
    }
}

/// Handle to one element of an [`OutlineTree`].
#[derive(Clone)]
pub struct TreeNode {
    arena: Rc<RefCell<Arena>>,
    id: usize,
}

impl TreeNode {
    pub fn attr(&self, name: &str) -> Option<String> {
        self.arena.borrow().nodes[self.id]
            .attr(name)
            .map(str::to_string)
    }

    /// Text content of the element and its descendants.
    pub fn text(&self) -> String {
        fn collect(arena: &Arena, id: usize, out: &mut String) {
            for child in &arena.nodes[id].children {
                match child {
                    Child::Text(t) => out.push_str(t),
                    Child::Element(c) => collect(arena, *c, out),
                }
            }
        }

        let arena = self.arena.borrow();
        let mut out = String::new();
        collect(&arena, self.id, &mut out);
        out
    }

    fn handle(&self, id: usize) -> TreeNode {
        TreeNode {
            arena: Rc::clone(&self.arena),
            id,
        }
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena) && self.id == other.id
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        let el = &arena.nodes[self.id];
        f.debug_struct("TreeNode")
            .field("id", &self.id)
            .field("tag", &el.tag)
            .field("class", &el.attr("class"))
            .field("href", &el.attr("href"))
            .finish()
    }
}

impl OutlineNode for TreeNode {
    fn tag(&self) -> String {
        self.arena.borrow().nodes[self.id].tag.clone()
    }

    fn has_class(&self, class: &str) -> bool {
        self.arena.borrow().nodes[self.id].classes().contains(&class)
    }

    fn add_class(&self, class: &str) {
        let mut arena = self.arena.borrow_mut();
        let el = &mut arena.nodes[self.id];
        let mut classes: Vec<String> = el.classes().into_iter().map(String::from).collect();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            el.set_attr("class", classes.join(" "));
        }
    }

    fn toggle_class(&self, class: &str) -> bool {
        let mut arena = self.arena.borrow_mut();
        let el = &mut arena.nodes[self.id];
        let mut classes: Vec<String> = el.classes().into_iter().map(String::from).collect();
        let present = if classes.iter().any(|c| c == class) {
            classes.retain(|c| c != class);
            false
        } else {
            classes.push(class.to_string());
            true
        };
        el.set_attr("class", classes.join(" "));
        present
    }

    fn parent(&self) -> Option<Self> {
        let parent = self.arena.borrow().nodes[self.id].parent?;
        Some(self.handle(parent))
    }

    fn href_attr(&self) -> Option<String> {
        self.attr("href")
    }

    fn set_href(&self, href: &str) {
        self.arena.borrow_mut().nodes[self.id].set_attr("href", href.to_string());
    }

    fn resolved_href(&self) -> Option<String> {
        let arena = self.arena.borrow();
        let href = arena.nodes[self.id].attr("href")?;
        // Like `HTMLAnchorElement.href`: unresolvable values come back as written.
        let resolved = match &arena.base {
            Some(base) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        };
        Some(resolved)
    }
}

fn parse_into(arena: &mut Arena, markup: &str) {
    let mut stack: Vec<usize> = vec![ROOT];
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map(|i| &after[i + 3..]).unwrap_or("");
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').unwrap_or(after.len());
            let name = after[..end].trim().to_ascii_uppercase();
            close_element(arena, &mut stack, &name);
            rest = after.get(end + 1..).unwrap_or("");
            continue;
        }

        let opens_tag = rest.starts_with('<')
            && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic());
        if opens_tag {
            let end = tag_end(rest);
            let (name, attrs, self_closing) = parse_start_tag(&rest[1..end]);
            open_element(arena, &mut stack, name, attrs, self_closing);
            rest = rest.get(end + 1..).unwrap_or("");
            continue;
        }

        let skip = usize::from(rest.starts_with('<'));
        let next = rest[skip..]
            .find('<')
            .map(|i| i + skip)
            .unwrap_or(rest.len());
        let top = stack.last().copied().unwrap_or(ROOT);
        arena.nodes[top]
            .children
            .push(Child::Text(rest[..next].to_string()));
        rest = &rest[next..];
    }
}

fn open_element(
    arena: &mut Arena,
    stack: &mut Vec<usize>,
    tag: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
) {
    if tag == "LI" {
        for pos in (1..stack.len()).rev() {
            let open = arena.nodes[stack[pos]].tag.as_str();
            if open == "LI" {
                stack.truncate(pos);
                break;
            }
            if open == "OL" || open == "UL" {
                break;
            }
        }
    }

    let parent = stack.last().copied().unwrap_or(ROOT);
    let id = arena.nodes.len();
    let is_void = self_closing || VOID_TAGS.contains(&tag.as_str());
    arena.nodes.push(ElementData::new(tag, attrs, Some(parent)));
    arena.nodes[parent].children.push(Child::Element(id));
    if !is_void {
        stack.push(id);
    }
}

fn close_element(arena: &Arena, stack: &mut Vec<usize>, tag: &str) {
    if let Some(pos) = (1..stack.len()).rev().find(|&p| arena.nodes[stack[p]].tag == tag) {
        stack.truncate(pos);
    }
}

/// Index of the `>` closing the tag that starts `s`, skipping quoted values.
fn tag_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return i,
            None => {}
        }
    }
    s.len()
}

fn parse_start_tag(inner: &str) -> (String, Vec<(String, String)>, bool) {
    let trimmed = inner.trim_end();
    let self_closing = trimmed.ends_with('/');
    let body = trimmed.trim_end_matches('/');

    let name_end = body
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(body.len());
    let name = body[..name_end].to_ascii_uppercase();

    let mut attrs = Vec::new();
    let mut rest = body[name_end..].trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let mut value = String::new();
        if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            match after.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after[1..];
                    let close = body.find(q).unwrap_or(body.len());
                    value = body[..close].to_string();
                    rest = body.get(close + 1..).unwrap_or("");
                }
                _ => {
                    let end = after
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(after.len());
                    value = after[..end].to_string();
                    rest = &after[end..];
                }
            }
        }

        if !key.is_empty() {
            attrs.push((key, value));
        }
        rest = rest.trim_start();
    }

    (name, attrs, self_closing)
}
