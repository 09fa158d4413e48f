//! Parsed documents and element selections.
//!
//! Thin wrapper over [`scraper`]. A [`Selection`] is an ordered set of
//! elements that can be narrowed further (children, descendant search) or
//! reduced to a scalar string (text, attribute value).

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::error::AppError;

/// Elements whose text never counts as visible page text.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Parse a CSS selector expression.
pub fn parse_selector(expr: &str) -> Result<Selector, AppError> {
    Selector::parse(expr).map_err(|e| AppError::SelectorError {
        selector: expr.to_string(),
        message: e.to_string(),
    })
}

/// A fetched and parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Visible text of the whole document, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in self.html.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
            });
            if !hidden {
                out.push_str(text);
            }
        }
        out.trim().to_string()
    }

    /// All elements matching `selector`, in document order.
    pub fn find(&self, selector: &Selector) -> Selection<'_> {
        Selection {
            nodes: self.html.select(selector).collect(),
        }
    }
}

/// An ordered, duplicate-free set of elements from one document.
#[derive(Clone, Default)]
pub struct Selection<'a> {
    nodes: Vec<ElementRef<'a>>,
}

impl<'a> Selection<'a> {
    pub fn from_element(element: ElementRef<'a>) -> Self {
        Self {
            nodes: vec![element],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn elements(&self) -> &[ElementRef<'a>] {
        &self.nodes
    }

    /// Element children of every element in the selection.
    pub fn children(&self) -> Selection<'a> {
        Self::dedup(
            self.nodes
                .iter()
                .flat_map(|el| el.children().filter_map(ElementRef::wrap)),
        )
    }

    /// Descendants of every element in the selection that match `selector`.
    pub fn find(&self, selector: &Selector) -> Selection<'a> {
        Self::dedup(self.nodes.iter().flat_map(|el| el.select(selector)))
    }

    /// Combined text content of all elements, trimmed.
    pub fn text(&self) -> String {
        let text: String = self.nodes.iter().flat_map(|el| el.text()).collect();
        text.trim().to_string()
    }

    /// Attribute value of the first element, if present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.nodes.first().and_then(|el| el.value().attr(name))
    }

    fn dedup(nodes: impl Iterator<Item = ElementRef<'a>>) -> Selection<'a> {
        let mut seen = HashSet::new();
        Selection {
            nodes: nodes.filter(|el| seen.insert(el.id())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head><title>Listing</title><style>body { color: red; }</style></head>
        <body>
            <ul>
                <li class="item"><a href="/a">Alpha</a> <span>one</span></li>
                <li class="item"><a href="/b">Beta</a></li>
            </ul>
            <script>var hidden = 1;</script>
        </body>
        </html>
    "#;

    #[test]
    fn test_document_text_skips_hidden_tags() {
        let doc = Document::parse(PAGE);
        let text = doc.text();
        assert!(text.contains("Listing"));
        assert!(text.contains("Alpha"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_find_in_document_order() {
        let doc = Document::parse(PAGE);
        let items = doc.find(&parse_selector(".item").unwrap());
        assert_eq!(items.len(), 2);
        assert_eq!(items.text(), "Alpha oneBeta");
    }

    #[test]
    fn test_children_and_nested_find() {
        let doc = Document::parse(PAGE);
        let list = doc.find(&parse_selector("ul").unwrap());
        assert_eq!(list.children().len(), 2);

        let links = list.find(&parse_selector("a").unwrap());
        assert_eq!(links.len(), 2);
        assert_eq!(links.attr("href"), Some("/a"));
    }

    #[test]
    fn test_find_deduplicates_nested_matches() {
        let doc = Document::parse(r#"<div class="x"><div class="x"><a href="/1">1</a></div></div>"#);
        let outer = doc.find(&parse_selector(".x").unwrap());
        assert_eq!(outer.len(), 2);
        assert_eq!(outer.find(&parse_selector("a").unwrap()).len(), 1);
    }

    #[test]
    fn test_attr_missing_and_empty_selection() {
        let doc = Document::parse(PAGE);
        let items = doc.find(&parse_selector(".item").unwrap());
        assert_eq!(items.attr("data-id"), None);

        let none = doc.find(&parse_selector(".missing").unwrap());
        assert!(none.is_empty());
        assert_eq!(none.text(), "");
        assert_eq!(none.attr("href"), None);
    }

    #[test]
    fn test_invalid_selector() {
        let err = parse_selector("div[").err().unwrap();
        assert!(matches!(err, AppError::SelectorError { .. }));
    }
}
