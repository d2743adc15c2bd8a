//! # In-Memory Document
//!
//! A small element tree standing in for a browser page. It supports the
//! handful of operations the client needs: lookup by id, descendant
//! selectors of the form `#id tag`, text and value edits, and HTML output.

use askama_escape::{escape, Html};

use crate::error::StockError;

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    id: Option<String>,
    text: String,
    value: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            text: String::new(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Own text content, excluding children.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn append_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn remove_children(&mut self) {
        self.children.clear();
    }

    fn matches(&self, step: &Step) -> bool {
        match step {
            Step::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Step::Tag(tag) => self.tag.eq_ignore_ascii_case(tag),
        }
    }

    /// Child-index path to the first descendant matching `steps`, searched
    /// depth-first in document order.
    fn locate(&self, steps: &[Step]) -> Option<Vec<usize>> {
        let (first, rest) = steps.split_first()?;
        for (i, child) in self.children.iter().enumerate() {
            if child.matches(first) {
                if rest.is_empty() {
                    return Some(vec![i]);
                }
                if let Some(mut tail) = child.locate(rest) {
                    tail.insert(0, i);
                    return Some(tail);
                }
            }
            if let Some(mut tail) = child.locate(steps) {
                tail.insert(0, i);
                return Some(tail);
            }
        }
        None
    }

    fn at_path(&self, path: &[usize]) -> Option<&Element> {
        path.iter().try_fold(self, |el, &i| el.children.get(i))
    }

    fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        path.iter().try_fold(self, |el, &i| el.children.get_mut(i))
    }

    fn write_html(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = &self.id {
            out.push_str(&format!(" id=\"{}\"", escape(id, Html)));
        }
        if let Some(value) = &self.value {
            out.push_str(&format!(" value=\"{}\"", escape(value, Html)));
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            out.push('\n');
            return;
        }
        out.push_str(&escape(&self.text, Html).to_string());
        if self.children.is_empty() {
            out.push_str(&format!("</{}>\n", self.tag));
            return;
        }
        out.push('\n');
        for child in &self.children {
            child.write_html(out, depth + 1);
        }
        out.push_str(&indent);
        out.push_str(&format!("</{}>\n", self.tag));
    }
}

const VOID_TAGS: &[&str] = &["input", "br", "hr", "meta", "img"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Id(String),
    Tag(String),
}

/// Parses a descendant selector made of `#id` and bare tag names.
fn parse_selector(selector: &str) -> Result<Vec<Step>, StockError> {
    let steps: Vec<Step> = selector
        .split_whitespace()
        .map(|part| match part.strip_prefix('#') {
            Some(id) if !id.is_empty() => Ok(Step::Id(id.to_string())),
            None if part.chars().all(|c| c.is_ascii_alphanumeric()) => Ok(Step::Tag(part.to_string())),
            _ => Err(StockError::Config(format!("unsupported selector `{selector}`"))),
        })
        .collect::<Result<_, _>>()?;
    if steps.is_empty() {
        return Err(StockError::Config("empty selector".to_string()));
    }
    Ok(steps)
}

/// A page: one root element plus lookup helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// The product page: status banner, paging controls and the product
    /// table with an empty body.
    pub fn product_page(page_size: i64, page_index: i64) -> Self {
        let header = ["Name", "Current stock", "Max stock"]
            .into_iter()
            .fold(Element::new("tr"), |tr, h| tr.with_child(Element::new("th").with_text(h)));

        let body = Element::new("body")
            .with_child(Element::new("div").with_id("status"))
            .with_child(
                Element::new("div")
                    .with_child(Element::new("input").with_id("page_size").with_value(page_size.to_string()))
                    .with_child(Element::new("input").with_id("page_index").with_value(page_index.to_string()))
                    .with_child(Element::new("button").with_id("previous").with_text("Previous"))
                    .with_child(Element::new("button").with_id("next").with_text("Next")),
            )
            .with_child(
                Element::new("table")
                    .with_id("table")
                    .with_child(Element::new("thead").with_child(header))
                    .with_child(Element::new("tbody")),
            );

        Self::new(Element::new("html").with_child(body))
    }

    /// The product page without paging controls, for the unparameterized
    /// and live variants.
    pub fn product_page_without_controls() -> Self {
        let mut doc = Self::product_page(0, 0);
        if let Some(body) = doc.root.children.first_mut() {
            body.children.retain(|el| !el.children.iter().any(|c| c.tag == "input"));
        }
        doc
    }

    /// First element matching `selector`, searched among the root's
    /// descendants.
    pub fn query_selector(&self, selector: &str) -> Result<Option<&Element>, StockError> {
        let steps = parse_selector(selector)?;
        Ok(self.root.locate(&steps).and_then(|path| self.root.at_path(&path)))
    }

    pub fn query_selector_mut(&mut self, selector: &str) -> Result<Option<&mut Element>, StockError> {
        let steps = parse_selector(selector)?;
        Ok(match self.root.locate(&steps) {
            Some(path) => self.root.at_path_mut(&path),
            None => None,
        })
    }

    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        let steps = [Step::Id(id.to_string())];
        self.root.locate(&steps).and_then(|path| self.root.at_path(&path))
    }

    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        let steps = [Step::Id(id.to_string())];
        let path = self.root.locate(&steps)?;
        self.root.at_path_mut(&path)
    }

    /// Cell texts of every row under `selector`, or `None` when nothing
    /// matches.
    pub fn table_rows(&self, selector: &str) -> Option<Vec<Vec<String>>> {
        let body = self.query_selector(selector).ok()??;
        Some(
            body.children()
                .iter()
                .map(|row| row.children().iter().map(|cell| cell.text().to_string()).collect())
                .collect(),
        )
    }

    /// Serializes the page as HTML. All text is escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.root.write_html(&mut out, 0);
        out
    }
}
