//! HTML-trust primitives: `mark_safe` and the template "safe" filter.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::callsite::CallSite;
use crate::error::{Blocked, Error};
use crate::intercept::{decide, Decision};
use crate::policy::Signature;

/// A string carrying an HTML-trust bit.
///
/// Trusted markup renders verbatim; untrusted markup is escaped by
/// [`render`](Markup::render). The neutralized substitutes return the
/// caller's input as *untrusted* markup, so downstream rendering
/// re-applies escaping and reflected scripts come out inert.
///
/// # Examples
///
/// ```
/// use callguard::Markup;
///
/// let untrusted = Markup::untrusted("<b>hi</b>");
/// assert_eq!(untrusted.render(), "&lt;b&gt;hi&lt;/b&gt;");
///
/// let trusted = Markup::trusted("<b>hi</b>");
/// assert_eq!(trusted.render(), "<b>hi</b>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    text: String,
    trusted: bool,
}

impl Markup {
    /// Wraps text that will render verbatim.
    pub fn trusted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trusted: true,
        }
    }

    /// Wraps text that will be escaped on render.
    pub fn untrusted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trusted: false,
        }
    }

    /// Returns whether this markup renders without escaping.
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Returns the raw text, regardless of trust.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Renders the markup: verbatim when trusted, HTML-escaped otherwise.
    pub fn render(&self) -> Cow<'_, str> {
        if self.trusted {
            Cow::Borrowed(&self.text)
        } else {
            escape(&self.text)
        }
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escapes the five HTML-significant characters.
///
/// Entity choices match the usual template-engine table, so escaped output
/// is comparable with what a framework's auto-escaping would produce.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Provider of HTML-trust capabilities.
pub trait MarkupTrust: Send + Sync {
    /// Marks a string as safe for verbatim rendering.
    fn mark_safe(&self, site: &CallSite, text: String) -> Result<Markup, Error>;

    /// The template "safe" filter: disables auto-escaping for a value.
    fn safe_filter(&self, site: &CallSite, text: String) -> Result<Markup, Error>;
}

/// The real implementation: both operations grant trust.
#[derive(Debug, Default)]
pub struct HostMarkup;

impl MarkupTrust for HostMarkup {
    fn mark_safe(&self, _site: &CallSite, text: String) -> Result<Markup, Error> {
        Ok(Markup::trusted(text))
    }

    fn safe_filter(&self, _site: &CallSite, text: String) -> Result<Markup, Error> {
        Ok(Markup::trusted(text))
    }
}

/// Decision-aware wrapper installed over the original markup provider.
pub(crate) struct GuardedMarkup {
    original: Arc<dyn MarkupTrust>,
}

impl GuardedMarkup {
    pub(crate) fn new(original: Arc<dyn MarkupTrust>) -> Self {
        Self { original }
    }
}

impl MarkupTrust for GuardedMarkup {
    fn mark_safe(&self, site: &CallSite, text: String) -> Result<Markup, Error> {
        match decide(Signature::MarkSafe, site) {
            Decision::Defer => self.original.mark_safe(site, text),
            Decision::Block => Err(Blocked::new(Signature::MarkSafe, site).into()),
            // Hand the input back untrusted so escaping re-applies.
            Decision::Neutralize => Ok(Markup::untrusted(text)),
        }
    }

    fn safe_filter(&self, site: &CallSite, text: String) -> Result<Markup, Error> {
        match decide(Signature::SafeFilter, site) {
            Decision::Defer => self.original.safe_filter(site, text),
            Decision::Block => Err(Blocked::new(Signature::SafeFilter, site).into()),
            Decision::Neutralize => Ok(Markup::untrusted(text)),
        }
    }
}
