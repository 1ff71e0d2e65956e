//! Tolerant HTML tag scanner.
//!
//! Builds an element arena good enough to answer the deck's questions (ids,
//! classes, attributes, ancestry, text) from hand-written slide pages. It does
//! not decode entities or implement the HTML tree-construction algorithm:
//! unbalanced closing tags pop to the nearest matching open element and stray
//! ones are dropped.

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#,
    )
    .expect("valid tag regex")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/"'>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid attribute regex")
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text, not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub type NodeId = usize;

pub const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
pub struct Node {
    /// Lowercase tag name; `#document` for the root.
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Text directly inside this element.
    pub text: String,
}

impl Node {
    fn new(tag: &str, attrs: Vec<(String, String)>, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs,
            parent,
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|name| name == class))
    }

    /// `contenteditable` present and not explicitly `false`.
    pub fn is_editable(&self) -> bool {
        self.attr("contenteditable")
            .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
    }
}

#[derive(Debug, Clone)]
pub struct HtmlTree {
    nodes: Vec<Node>,
}

impl HtmlTree {
    pub fn parse(html: &str) -> Self {
        let mut nodes = vec![Node::new("#document", Vec::new(), None)];
        let mut open: Vec<NodeId> = vec![ROOT];
        let mut pos = 0;

        while let Some(caps) = TAG.captures_at(html, pos) {
            let Some(whole) = caps.get(0) else { break };
            let current = open.last().copied().unwrap_or(ROOT);
            nodes[current].text.push_str(&html[pos..whole.start()]);
            pos = whole.end();

            let Some(name) = caps.get(2) else {
                continue;
            };
            let tag = name.as_str().to_ascii_lowercase();
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

            if closing {
                if let Some(depth) = open.iter().rposition(|&id| id != ROOT && nodes[id].tag == tag)
                {
                    open.truncate(depth);
                }
                continue;
            }

            let raw_attrs = caps.get(3).map_or("", |m| m.as_str()).trim_end();
            let self_closing = raw_attrs.ends_with('/');
            let attrs = parse_attrs(raw_attrs.trim_end_matches('/'));

            let id = nodes.len();
            nodes.push(Node::new(&tag, attrs, Some(current)));
            nodes[current].children.push(id);

            if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
                continue;
            }
            if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                let end = find_closing(html, pos, &tag).unwrap_or(html.len());
                nodes[id].text.push_str(&html[pos..end]);
                pos = end;
            }
            open.push(id);
        }

        let current = open.last().copied().unwrap_or(ROOT);
        nodes[current].text.push_str(&html[pos..]);
        Self { nodes }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// All elements below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev());
        }
        out
    }

    pub fn descendants_with_class(&self, id: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.nodes[n].has_class(class))
            .collect()
    }

    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(ROOT)
            .into_iter()
            .find(|&n| self.nodes[n].id() == Some(element_id))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(ROOT)
            .into_iter()
            .find(|&n| self.nodes[n].tag == tag)
    }

    /// Nearest element, starting at `id` itself, that satisfies `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            if n == ROOT {
                return None;
            }
            if pred(&self.nodes[n]) {
                return Some(n);
            }
            cursor = self.nodes[n].parent;
        }
        None
    }

    /// Concatenated text of `id` and its descendants, whitespace collapsed.
    pub fn text(&self, id: NodeId) -> String {
        let mut raw = self.nodes[id].text.clone();
        for n in self.descendants(id) {
            raw.push(' ');
            raw.push_str(&self.nodes[n].text);
        }
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR.captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            Some((name, value.to_string()))
        })
        .collect()
}

fn find_closing(html: &str, from: usize, tag: &str) -> Option<usize> {
    let needle = format!("</{tag}");
    html[from..]
        .to_ascii_lowercase()
        .find(&needle)
        .map(|offset| from + offset)
}
