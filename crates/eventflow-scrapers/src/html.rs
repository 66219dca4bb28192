//! Typed HTML queries.
//!
//! Every lookup returns `Option`, so a missing node is handled at the call
//! site instead of surfacing later as an empty string.

use scraper::{ElementRef, Selector};
use url::Url;

/// Compiles a selector literal. Only used with constants, so a parse
/// failure is a programming error.
pub(crate) fn css(selector: &'static str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid selector {selector:?}: {e:?}"))
}

/// The first descendant of `scope` matching `selector`.
pub(crate) fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// The text content of `element`, whitespace collapsed.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The collapsed text of the first match, if it exists and is non-empty.
pub(crate) fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    first(scope, selector)
        .map(text_of)
        .filter(|text| !text.is_empty())
}

/// An attribute of the first match, if both exist.
pub(crate) fn first_attr<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    name: &str,
) -> Option<&'a str> {
    first(scope, selector).and_then(|el| el.value().attr(name))
}

/// Resolves `href` against the page it appeared on. Fragments are dropped.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}
