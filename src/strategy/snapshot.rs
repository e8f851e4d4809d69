//! DOM snapshots the strategies read from
//!
//! A `PageSource` is what the in-page instrumentation hands back on every
//! polling attempt: the current URL, the serialized document (with hidden
//! elements tagged `data-rs-hidden`) and optionally the rendered text.
//! `PageSnapshot` parses it once so every extractor in an attempt works on
//! the same immutable view.
//!
//! `PageSnapshot` wraps `scraper::Html`, which is not `Send`. Build it, use
//! it and drop it between two await points.

use ego_tree::NodeRef;
use std::collections::HashSet;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Attribute the instrumentation sets on elements that are not rendered
pub const HIDDEN_MARKER_ATTR: &str = "data-rs-hidden";

/// Raw page capture, as produced by the instrumentation script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSource {
    pub url: String,
    pub html: String,
    /// Rendered text (`document.body.innerText`) when the capture had it
    #[serde(default)]
    pub text: Option<String>,
}

impl PageSource {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            text: None,
        }
    }
}

/// Where to look for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// CSS selector, e.g. `[data-testid="price-and-discounted-price"]`
    Css(&'static str),
    /// Path lookup, e.g. `//*[@id="no_availability_msg"]/div[1]`
    Path(&'static str),
}

/// Parsed, immutable view of a page at one polling attempt
pub struct PageSnapshot {
    url: String,
    document: Html,
    text: String,
}

impl PageSnapshot {
    #[must_use]
    pub fn parse(source: &PageSource) -> Self {
        let document = Html::parse_document(&source.html);
        let text = match &source.text {
            Some(text) => text.clone(),
            None => rendered_text(&document),
        };
        Self {
            url: source.url.clone(),
            document,
            text,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Visible text of the whole page
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Case-insensitive search of the page text for any of `phrases`
    #[must_use]
    pub fn contains_any_phrase<'p>(&self, phrases: &[&'p str]) -> Option<&'p str> {
        let haystack = self.text.to_lowercase();
        phrases
            .iter()
            .copied()
            .find(|p| haystack.contains(&p.to_lowercase()))
    }

    /// All elements matched by a locator, in document order
    #[must_use]
    pub fn select(&self, locator: &Locator) -> Vec<ElementRef<'_>> {
        match locator {
            Locator::Css(css) => match Selector::parse(css) {
                Ok(selector) => self.document.select(&selector).collect(),
                Err(e) => {
                    debug!("Skipping unparsable selector {css}: {e:?}");
                    Vec::new()
                }
            },
            Locator::Path(path) => match PathExpr::parse(path) {
                Some(expr) => expr.evaluate(&self.document),
                None => {
                    debug!("Skipping unparsable path {path}");
                    Vec::new()
                }
            },
        }
    }

    /// First locator (in order) that matches a rendered element
    #[must_use]
    pub fn first_visible(&self, locators: &[Locator]) -> Option<Locator> {
        locators
            .iter()
            .find(|loc| self.select(loc).into_iter().any(is_visible))
            .copied()
    }

    /// Text of the first rendered, non-empty element across `locators`
    #[must_use]
    pub fn first_visible_text(&self, locators: &[Locator]) -> Option<String> {
        locators.iter().find_map(|loc| {
            self.select(loc)
                .into_iter()
                .filter(|el| is_visible(*el))
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }
}

/// Collapsed text content of an element
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether an element would be rendered
///
/// Trusts the instrumentation's `data-rs-hidden` marker and falls back to
/// static signals (`hidden`, `aria-hidden`, inline `display:none` /
/// `visibility:hidden`) on the element or any ancestor.
#[must_use]
pub fn is_visible(element: ElementRef<'_>) -> bool {
    let mut node: Option<NodeRef<'_, Node>> = Some(*element);
    while let Some(current) = node {
        if let Some(el) = current.value().as_element() {
            if el.attr(HIDDEN_MARKER_ATTR).is_some() || el.attr("hidden").is_some() {
                return false;
            }
            if el.attr("aria-hidden") == Some("true") {
                return false;
            }
            if let Some(style) = el.attr("style") {
                let style: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if style.contains("display:none") || style.contains("visibility:hidden") {
                    return false;
                }
            }
        }
        node = current.parent();
    }
    true
}

const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

fn rendered_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let in_non_rendered = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| NON_RENDERED_TAGS.contains(&el.name()))
        });
        if in_non_rendered {
            continue;
        }
        if let Some(parent) = node.parent().and_then(ElementRef::wrap)
            && !is_visible(parent)
        {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    parts.join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    /// `None` for `*`
    name: Option<String>,
    attrs: Vec<(String, String)>,
    /// 1-based
    position: Option<usize>,
}

/// Subset of XPath used for path-based lookups
///
/// Supports absolute (`/html/body/div[2]`) and anywhere (`//*[@id="x"]/p`)
/// paths made of name tests (`div`, `*`), positional predicates (`[2]`) and
/// attribute equality predicates (`[@id="x"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathExpr {
    steps: Vec<Step>,
}

impl PathExpr {
    fn parse(path: &str) -> Option<Self> {
        let path = path.trim();
        if !path.starts_with('/') {
            return None;
        }

        let mut steps = Vec::new();
        let mut rest = path;
        while !rest.is_empty() {
            let axis = if let Some(r) = rest.strip_prefix("//") {
                rest = r;
                Axis::Descendant
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
                Axis::Child
            } else {
                return None;
            };

            let end = step_end(rest);
            let (raw_step, tail) = rest.split_at(end);
            rest = tail;
            steps.push(parse_step(axis, raw_step)?);
        }

        if steps.is_empty() { None } else { Some(Self { steps }) }
    }

    fn evaluate<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let mut current: Vec<NodeRef<'a, Node>> = vec![document.tree.root()];

        for step in &self.steps {
            let mut next: Vec<NodeRef<'a, Node>> = Vec::new();
            for context in &current {
                let candidates: Vec<NodeRef<'a, Node>> = match step.axis {
                    Axis::Child => context.children().collect(),
                    Axis::Descendant => context.descendants().skip(1).collect(),
                };
                let matched = candidates
                    .into_iter()
                    .filter(|node| step_matches(step, *node));
                match step.position {
                    Some(pos) => next.extend(matched.skip(pos.saturating_sub(1)).take(1)),
                    None => next.extend(matched),
                }
            }
            let mut seen = HashSet::new();
            next.retain(|node| seen.insert(node.id()));
            current = next;
            if current.is_empty() {
                break;
            }
        }

        current.into_iter().filter_map(ElementRef::wrap).collect()
    }
}

fn step_end(rest: &str) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => return i,
            _ => {}
        }
    }
    rest.len()
}

fn parse_step(axis: Axis, raw: &str) -> Option<Step> {
    let (name_part, mut preds) = match raw.find('[') {
        Some(i) => (&raw[..i], &raw[i..]),
        None => (raw, ""),
    };
    let name_part = name_part.trim();
    if name_part.is_empty() {
        return None;
    }

    let mut step = Step {
        axis,
        name: (name_part != "*").then(|| name_part.to_ascii_lowercase()),
        attrs: Vec::new(),
        position: None,
    };

    while let Some(stripped) = preds.strip_prefix('[') {
        let close = stripped.find(']')?;
        let pred = stripped[..close].trim();
        preds = &stripped[close + 1..];

        if let Ok(pos) = pred.parse::<usize>() {
            if pos == 0 {
                return None;
            }
            step.position = Some(pos);
        } else if let Some(attr_pred) = pred.strip_prefix('@') {
            let (attr, value) = attr_pred.split_once('=')?;
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            step.attrs.push((attr.trim().to_string(), value.to_string()));
        } else {
            return None;
        }
    }

    Some(step)
}

fn step_matches(step: &Step, node: NodeRef<'_, Node>) -> bool {
    let Some(el) = node.value().as_element() else {
        return false;
    };
    if let Some(name) = &step.name
        && el.name() != name
    {
        return false;
    }
    step.attrs
        .iter()
        .all(|(attr, value)| el.attr(attr) == Some(value.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>t</title><style>.x{}</style></head>
<body>
  <div id="main">
    <div class="room"><span>Deluxe Room</span></div>
    <div class="room"><span>Suite</span></div>
  </div>
  <div id="banner" style="display: none"><p>Sold out</p></div>
  <script>var price = "₹ 9,999";</script>
</body></html>"#;

    fn snapshot() -> PageSnapshot {
        PageSnapshot::parse(&PageSource::new("https://example.com", PAGE))
    }

    #[test]
    fn test_path_lookup_positional() {
        let snap = snapshot();
        let found = snap.select(&Locator::Path("/html/body/div[1]/div[2]/span"));
        assert_eq!(found.len(), 1);
        assert_eq!(element_text(found[0]), "Suite");
    }

    #[test]
    fn test_path_lookup_by_id_anywhere() {
        let snap = snapshot();
        let found = snap.select(&Locator::Path(r#"//*[@id="main"]/div/span"#));
        let texts: Vec<String> = found.into_iter().map(element_text).collect();
        assert_eq!(texts, vec!["Deluxe Room", "Suite"]);
    }

    #[test]
    fn test_invalid_paths_match_nothing() {
        let snap = snapshot();
        assert!(snap.select(&Locator::Path("html/body")).is_empty());
        assert!(snap.select(&Locator::Path("/html/body/div[0]")).is_empty());
        assert!(snap.select(&Locator::Css("div[[")).is_empty());
    }

    #[test]
    fn test_hidden_elements_are_not_visible() {
        let snap = snapshot();
        assert_eq!(snap.first_visible(&[Locator::Css("#banner p")]), None);
        assert_eq!(
            snap.first_visible(&[Locator::Css("#banner p"), Locator::Css(".room span")]),
            Some(Locator::Css(".room span"))
        );
    }

    #[test]
    fn test_rendered_text_skips_scripts_and_hidden() {
        let snap = snapshot();
        assert!(snap.text().contains("Deluxe Room"));
        assert!(!snap.text().contains("Sold out"));
        assert!(!snap.text().contains("9,999"));
    }

    #[test]
    fn test_instrumentation_marker_hides() {
        let html = r#"<html><body><span class="p" data-rs-hidden="1">₹ 100</span></body></html>"#;
        let snap = PageSnapshot::parse(&PageSource::new("https://example.com", html));
        assert_eq!(snap.first_visible_text(&[Locator::Css(".p")]), None);
    }
}
