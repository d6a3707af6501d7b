use std::{
    fmt::{self, Write},
    sync::{Arc, RwLock},
};

// Node is one entry of the display tree handed from the renderer to the host.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    Region(ContentRegion),
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn style(self, value: impl Into<String>) -> Self {
        self.attr("style", value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_html(&mut out);
        out
    }

    pub fn write_html<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            write!(out, " {}=\"{}\"", name, escape(value))?;
        }
        out.write_char('>')?;
        if is_void(self.tag) {
            return Ok(());
        }
        for child in &self.children {
            child.write_html(out)?;
        }
        write!(out, "</{}>", self.tag)
    }
}

impl Node {
    pub fn write_html<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Node::Element(e) => e.write_html(out),
            Node::Text(t) => out.write_str(&escape(t)),
            Node::Region(r) => r.write_html(out),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<String> for Node {
    fn from(t: String) -> Self {
        Node::Text(t)
    }
}

impl From<&str> for Node {
    fn from(t: &str) -> Self {
        Node::Text(t.to_string())
    }
}

impl From<ContentRegion> for Node {
    fn from(r: ContentRegion) -> Self {
        Node::Region(r)
    }
}

/// ContentRegion is the one mutable spot of a rendered page: a container
/// element whose children get replaced wholesale on every refresh. Clones
/// share the same container.
#[derive(Debug, Clone)]
pub struct ContentRegion {
    container: Arc<RwLock<Element>>,
}

impl ContentRegion {
    pub fn new(container: Element) -> Self {
        Self {
            container: Arc::new(RwLock::new(container)),
        }
    }

    pub fn set_content(&self, node: impl Into<Node>) {
        // A poisoned lock only means a reader panicked mid-render; the
        // element itself is still whole.
        let mut container = self.container.write().unwrap_or_else(|e| e.into_inner());
        container.children = vec![node.into()];
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = self.write_html(&mut out);
        out
    }

    pub fn write_html<W: Write>(&self, out: &mut W) -> fmt::Result {
        let container = self.container.read().unwrap_or_else(|e| e.into_inner());
        container.write_html(out)
    }

    #[cfg(test)]
    pub fn current(&self) -> Element {
        self.container
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "meta" | "br" | "hr" | "img" | "input" | "link")
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
impl Element {
    /// All descendant elements (self included) with the given tag, in
    /// document order.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(tag, &mut found);
        found
    }

    fn collect<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        if self.tag == tag {
            found.push(self);
        }
        for child in &self.children {
            if let Node::Element(e) = child {
                e.collect(tag, found);
            }
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Element(e) => out.push_str(&e.text_content()),
                Node::Text(t) => out.push_str(t),
                Node::Region(r) => out.push_str(&r.current().text_content()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_elements() {
        let table = Element::new("table").class("table").child(
            Element::new("tr")
                .child(Element::new("td").attr("width", "30%").text("MTU"))
                .child(Element::new("td").text("1280")),
        );
        assert_eq!(
            table.to_html(),
            r#"<table class="table"><tr><td width="30%">MTU</td><td>1280</td></tr></table>"#
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        let e = Element::new("span")
            .attr("title", "a\"b")
            .text("<script>&");
        assert_eq!(
            e.to_html(),
            r#"<span title="a&quot;b">&lt;script&gt;&amp;</span>"#
        );
    }

    #[test]
    fn void_elements_have_no_close_tag() {
        let e = Element::new("meta").attr("charset", "utf-8");
        assert_eq!(e.to_html(), r#"<meta charset="utf-8">"#);
    }

    #[test]
    fn region_replaces_children_in_every_clone() {
        let region = ContentRegion::new(Element::new("div"));
        let page = Element::new("body").child(region.clone());
        region.set_content(Element::new("p").text("first"));
        region.set_content(Element::new("p").text("second"));
        assert_eq!(page.to_html(), "<body><div><p>second</p></div></body>");
        assert_eq!(region.current().children.len(), 1);
    }
}
