//! Lenient HTML tree used to find and rewrite translatable elements.
//!
//! The parser never fails: unterminated tags degrade to text, unclosed elements
//! are closed at end of input and stray end tags are dropped. Text and attribute
//! values are kept exactly as written (entities are not decoded), so untouched
//! parts of a page serialize back to the same markup.

use std::fmt;

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements implicitly closed by an opening tag of the same name.
const SELF_NESTING_CLOSED: &[&str] = &["li", "p", "option", "tr", "td", "th", "dt", "dd"];

/// Location of an element as child indices from the document root.
pub type NodePath = Vec<usize>;

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Raw text, emitted verbatim.
    Text(String),
    /// Comment body without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Doctype or processing instruction, kept verbatim including delimiters.
    Declaration(String),
}

/// A single attribute. `value` is `None` for valueless attributes (`<span i18n>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    /// Attribute value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// A markup element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// Look up an attribute by (case-insensitive) name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Whether the attribute is present, with or without a value.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute value, replacing an existing one in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove all attributes matching `predicate`. Returns how many were removed.
    pub fn remove_attrs(&mut self, mut predicate: impl FnMut(&str) -> bool) -> usize {
        let before = self.attrs.len();
        self.attrs.retain(|a| !predicate(&a.name));
        before - self.attrs.len()
    }

    /// Serialized content of the element.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&mut out, &self.children, &|_| false);
        out
    }

    /// Serialized content with attributes matching `skip_attr` left out.
    #[must_use]
    pub fn inner_html_without(&self, skip_attr: &dyn Fn(&str) -> bool) -> String {
        let mut out = String::new();
        write_nodes(&mut out, &self.children, skip_attr);
        out
    }

    /// Replace the content with a raw markup fragment.
    pub fn set_inner_html(&mut self, fragment: impl Into<String>) {
        self.children = vec![Node::Text(fragment.into())];
    }

    fn is_void(&self) -> bool {
        is_one_of(&self.name, VOID_ELEMENTS)
    }
}

/// A parsed markup document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    /// Parse markup. Never fails.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        Parser::new(source).run()
    }

    /// Serialize the document.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(256);
        write_nodes(&mut out, &self.children, &|_| false);
        out
    }

    /// Elements in document order, with their locations.
    #[must_use]
    pub fn elements(&self) -> Elements<'_> {
        let mut stack = Vec::new();
        push_children(&mut stack, &[], &self.children);
        Elements { stack }
    }

    /// Element at `path`, if the path still points to one.
    #[must_use]
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let (first, rest) = path.split_first()?;
        let mut element = match self.children.get(*first)? {
            Node::Element(e) => e,
            _ => return None,
        };
        for index in rest {
            element = match element.children.get(*index)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        Some(element)
    }

    /// Mutable element at `path`, if the path still points to one.
    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let (first, rest) = path.split_first()?;
        let mut element = match self.children.get_mut(*first)? {
            Node::Element(e) => e,
            _ => return None,
        };
        for index in rest {
            element = match element.children.get_mut(*index)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        Some(element)
    }

    /// Visit every element mutably, parents before children.
    pub fn for_each_element_mut(&mut self, mut visit: impl FnMut(&mut Element)) {
        fn walk(nodes: &mut [Node], visit: &mut dyn FnMut(&mut Element)) {
            for node in nodes {
                if let Node::Element(element) = node {
                    visit(element);
                    walk(&mut element.children, visit);
                }
            }
        }
        walk(&mut self.children, &mut visit);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Pre-order iterator over the elements of a [`Document`].
#[derive(Debug)]
pub struct Elements<'a> {
    stack: Vec<(NodePath, &'a Element)>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = (NodePath, &'a Element);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, element) = self.stack.pop()?;
        push_children(&mut self.stack, &path, &element.children);
        Some((path, element))
    }
}

fn push_children<'a>(stack: &mut Vec<(NodePath, &'a Element)>, parent: &[usize], nodes: &'a [Node]) {
    // Reversed so the first child is popped first
    for (index, node) in nodes.iter().enumerate().rev() {
        if let Node::Element(element) = node {
            let mut path = parent.to_vec();
            path.push(index);
            stack.push((path, element));
        }
    }
}

fn is_one_of(name: &str, set: &[&str]) -> bool {
    set.iter().any(|n| n.eq_ignore_ascii_case(name))
}

fn write_nodes(out: &mut String, nodes: &[Node], skip_attr: &dyn Fn(&str) -> bool) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            Node::Declaration(raw) => out.push_str(raw),
            Node::Element(element) => write_element(out, element, skip_attr),
        }
    }
}

fn write_element(out: &mut String, element: &Element, skip_attr: &dyn Fn(&str) -> bool) {
    out.push('<');
    out.push_str(&element.name);
    for attr in element.attrs.iter().filter(|a| !skip_attr(&a.name)) {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            out.push('=');
            write_attr_value(out, value);
        }
    }

    if element.self_closing && element.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');

    if element.is_void() {
        return;
    }

    write_nodes(out, &element.children, skip_attr);
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_attr_value(out: &mut String, value: &str) {
    if !value.contains('"') {
        out.push('"');
        out.push_str(value);
        out.push('"');
    } else if !value.contains('\'') {
        out.push('\'');
        out.push_str(value);
        out.push('\'');
    } else {
        out.push('"');
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
}

/// Recursive-descent-free parser: a cursor plus a stack of open elements.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
    text_start: usize,
    root: Vec<Node>,
    open: Vec<Element>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            text_start: 0,
            root: Vec::new(),
            open: Vec::new(),
        }
    }

    fn run(mut self) -> Document {
        while let Some(offset) = self.src[self.pos..].find('<') {
            let start = self.pos + offset;
            self.pos = start;
            if !self.markup_at(start) {
                // Not a construct we recognize, the `<` stays text
                self.pos = start + 1;
            }
        }
        self.pos = self.src.len();
        self.flush_text(self.src.len());

        while let Some(element) = self.open.pop() {
            self.push(Node::Element(element));
        }

        Document {
            children: self.root,
        }
    }

    /// Try to consume a construct starting at `start`. Returns false if the `<`
    /// should be treated as text.
    fn markup_at(&mut self, start: usize) -> bool {
        let rest = &self.src[start..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            self.flush_text(start);
            self.push(Node::Comment(comment.to_string()));
            self.advance_to(start + consumed);
            return true;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let Some(end) = rest.find('>') else {
                return false;
            };
            self.flush_text(start);
            self.push(Node::Declaration(rest[..=end].to_string()));
            self.advance_to(start + end + 1);
            return true;
        }

        if let Some(after) = rest.strip_prefix("</") {
            let Some(end) = after.find('>') else {
                return false;
            };
            let name = after[..end].trim();
            if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
                return false;
            }
            self.flush_text(start);
            self.close(name);
            self.advance_to(start + 2 + end + 1);
            return true;
        }

        if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            return self.start_tag(start);
        }

        false
    }

    fn start_tag(&mut self, start: usize) -> bool {
        let Some((mut element, end)) = parse_start_tag(self.src, start) else {
            return false;
        };
        self.flush_text(start);
        self.advance_to(end);

        if is_one_of(&element.name, SELF_NESTING_CLOSED)
            && self
                .open
                .last()
                .is_some_and(|top| top.name.eq_ignore_ascii_case(&element.name))
        {
            let name = element.name.clone();
            self.close(&name);
        }

        if element.self_closing || element.is_void() {
            self.push(Node::Element(element));
            return true;
        }

        if is_one_of(&element.name, RAW_TEXT_ELEMENTS) {
            let body = &self.src[end..];
            let (content_end, resume) = match find_end_tag(body, &element.name) {
                Some((content_end, tag_end)) => (end + content_end, end + tag_end),
                None => (self.src.len(), self.src.len()),
            };
            if content_end > end {
                element
                    .children
                    .push(Node::Text(self.src[end..content_end].to_string()));
            }
            self.push(Node::Element(element));
            self.advance_to(resume);
            return true;
        }

        self.open.push(element);
        true
    }

    /// Close the innermost open element named `name`, closing everything inside it.
    fn close(&mut self, name: &str) {
        let Some(index) = self
            .open
            .iter()
            .rposition(|e| e.name.eq_ignore_ascii_case(name))
        else {
            tracing::trace!(tag = name, "dropping stray end tag");
            return;
        };
        while self.open.len() > index {
            if let Some(element) = self.open.pop() {
                self.push(Node::Element(element));
            }
        }
    }

    fn push(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            let text = self.src[self.text_start..end].to_string();
            self.push(Node::Text(text));
        }
        self.text_start = end;
    }

    fn advance_to(&mut self, pos: usize) {
        self.pos = pos;
        self.text_start = pos;
    }
}

/// Parse `<name attr…>` at `start`. Returns the element and the offset after `>`.
fn parse_start_tag(src: &str, start: usize) -> Option<(Element, usize)> {
    let bytes = src.as_bytes();
    let mut i = start + 1;

    let name_start = i;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let mut element = Element::new(&src[name_start..i]);

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match *bytes.get(i)? {
            b'>' => return Some((element, i + 1)),
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                element.self_closing = true;
                return Some((element, i + 2));
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = src[attr_start..i].to_string();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if bytes.get(j) != Some(&b'=') {
            element.attrs.push(Attribute { name, value: None });
            continue;
        }

        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let value = match *bytes.get(j)? {
            quote @ (b'"' | b'\'') => {
                let close = src[j + 1..].find(quote as char)?;
                let value = &src[j + 1..j + 1 + close];
                i = j + 1 + close + 1;
                value
            }
            _ => {
                let value_start = j;
                while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                    j += 1;
                }
                i = j;
                &src[value_start..j]
            }
        };
        element.attrs.push(Attribute {
            name,
            value: Some(value.to_string()),
        });
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

/// Find `</name>` case-insensitively. Returns (content end, offset after `>`).
fn find_end_tag(body: &str, name: &str) -> Option<(usize, usize)> {
    let lower = body.to_ascii_lowercase();
    let needle = format!("</{}", name.to_ascii_lowercase());
    let mut from = 0;
    while let Some(found) = lower[from..].find(&needle) {
        let at = from + found;
        let after = at + needle.len();
        match lower.as_bytes().get(after) {
            Some(b'>') => return Some((at, after + 1)),
            Some(b) if b.is_ascii_whitespace() => {
                let close = lower[after..].find('>')?;
                return Some((at, after + close + 1));
            }
            _ => from = after,
        }
    }
    None
}
