//! Closed vocabularies of HTML tag and attribute names.
//!
//! The oracle can read a named attribute but cannot list them, so these
//! lists bound what a fresh attribute name can range over.

use crate::context::Relation;
use domlogic_kanren::{member_of, Term};

pub const KNOWN_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt",
    "em", "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins",
    "kbd", "label", "legend", "li", "link", "main", "map", "mark", "menu", "meta", "meter",
    "nav", "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "picture",
    "pre", "progress", "q", "rp", "rt", "ruby", "s", "samp", "script", "search", "section",
    "select", "slot", "small", "source", "span", "strong", "style", "sub", "summary", "sup",
    "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "time", "title",
    "tr", "track", "u", "ul", "var", "video", "wbr",
];

/// Tried in this order when an attribute name is fresh.
pub const KNOWN_ATTRIBUTES: &[&str] = &[
    "id", "class", "name", "type", "value", "href", "src", "alt", "title", "style", "lang",
    "dir", "hidden", "tabindex", "accesskey", "role", "disabled", "readonly", "required",
    "checked", "selected", "multiple", "placeholder", "maxlength", "minlength", "min", "max",
    "step", "pattern", "size", "rows", "cols", "wrap", "for", "form", "action", "method",
    "enctype", "target", "rel", "download", "media", "width", "height", "colspan", "rowspan",
    "headers", "scope", "label", "autocomplete", "autofocus", "contenteditable", "draggable",
    "spellcheck", "translate", "content", "charset", "http-equiv", "async", "defer",
    "crossorigin", "integrity", "loading", "srcset", "sizes", "usemap", "controls", "autoplay",
    "loop", "muted", "poster", "preload", "datetime", "cite", "open", "list", "accept",
    "aria-label", "aria-hidden", "aria-describedby", "aria-labelledby", "aria-expanded",
    "aria-selected", "aria-checked", "aria-disabled",
];

/// `t` is a known tag name.
pub fn known_tag(t: impl Into<Term>) -> Relation {
    member_of(t, KNOWN_TAGS.iter().map(|s| Term::from(*s)).collect())
}

/// `a` is a known attribute name.
pub fn known_attribute(a: impl Into<Term>) -> Relation {
    member_of(a, KNOWN_ATTRIBUTES.iter().map(|s| Term::from(*s)).collect())
}
