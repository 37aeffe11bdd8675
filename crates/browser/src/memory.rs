//! An in-memory document that answers oracle queries from parsed HTML.
//!
//! Serves `query --html FILE` and the relation tests. Selectors are matched
//! with `scraper`, so any scope accepted by the browser works here too.
//! Layout is not computed: sizes and locations are zero unless placed
//! explicitly. Elements can carry an injected fault, and can be detached to
//! mimic stale handles after a page mutation.

use domlogic_core::{ElementHandle, Location, Oracle, OracleError, OracleResult, Size};
use scraper::{ElementRef, Html, Selector};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// Elements that never produce a layout box.
const NON_RENDERED: &[&str] = &[
    "base", "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// Fault raised by every query against an element that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    InvalidElementState,
    UnknownServer,
    Unexpected,
}

impl Fault {
    fn raise(self, what: String) -> OracleError {
        match self {
            Fault::InvalidElementState => OracleError::InvalidElementState(what),
            Fault::UnknownServer => OracleError::UnknownServer(what),
            Fault::Unexpected => OracleError::Unexpected(what),
        }
    }
}

struct Page {
    html: Html,
    url: String,
    /// Bumped by `navigate`; handles from older generations are stale.
    generation: u64,
}

pub struct MemoryOracle {
    page: RefCell<Page>,
    detached: RefCell<HashSet<usize>>,
    layout: RefCell<HashMap<usize, (Location, Size)>>,
    faults: RefCell<HashMap<usize, Fault>>,
    page_fault: Cell<Option<Fault>>,
    calls: Cell<usize>,
}

impl std::fmt::Debug for MemoryOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let page = self.page.borrow();
        f.debug_struct("MemoryOracle")
            .field("url", &page.url)
            .field("generation", &page.generation)
            .field("calls", &self.calls.get())
            .finish()
    }
}

/// Every element of the document in document order, `<html>` first.
fn elements(html: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    html.root_element().descendants().filter_map(ElementRef::wrap)
}

/// Maps an element of `html` back to its document-order index.
fn document_index(html: &Html) -> impl Fn(&ElementRef<'_>) -> Option<usize> {
    let order: HashMap<_, usize> = elements(html)
        .enumerate()
        .map(|(i, e)| (e.id(), i))
        .collect();
    move |e: &ElementRef<'_>| order.get(&e.id()).copied()
}

fn parse_selector(scope: &str) -> OracleResult<Selector> {
    Selector::parse(scope)
        .map_err(|e| OracleError::UnknownServer(format!("invalid selector '{}': {:?}", scope, e)))
}

/// Declared value of `property` in the inline `style` attribute.
fn style_value(el: &ElementRef<'_>, property: &str) -> Option<String> {
    el.value().attr("style")?.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim().to_ascii_lowercase())
    })
}

fn self_and_ancestors<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap))
}

fn rendered(el: ElementRef<'_>) -> bool {
    self_and_ancestors(el).all(|e| {
        let element = e.value();
        !NON_RENDERED.contains(&element.name())
            && element.attr("hidden").is_none()
            && !(element.name() == "input" && element.attr("type") == Some("hidden"))
            && style_value(&e, "display").as_deref() != Some("none")
    })
}

fn shown(el: ElementRef<'_>) -> bool {
    rendered(el)
        && self_and_ancestors(el).all(|e| {
            style_value(&e, "visibility").as_deref() != Some("hidden")
                && style_value(&e, "opacity")
                    .and_then(|o| o.parse::<f64>().ok())
                    .map_or(true, |o| o > 0.0)
        })
}

fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl MemoryOracle {
    /// Parses `source` as the document loaded at `url`.
    pub fn new(url: &str, source: &str) -> Self {
        Self {
            page: RefCell::new(Page {
                html: Html::parse_document(source),
                url: url.to_string(),
                generation: 0,
            }),
            detached: RefCell::new(HashSet::new()),
            layout: RefCell::new(HashMap::new()),
            faults: RefCell::new(HashMap::new()),
            page_fault: Cell::new(None),
            calls: Cell::new(0),
        }
    }

    /// Handles of every attached element, in document order.
    pub fn handles(&self) -> Vec<ElementHandle> {
        let page = self.page.borrow();
        let detached = self.detached.borrow();
        (0..elements(&page.html).count())
            .filter(|i| !detached.contains(i))
            .map(|i| handle(page.generation, i))
            .collect()
    }

    /// Handle of the first element whose `id` attribute equals `id`.
    pub fn by_id(&self, id: &str) -> Option<ElementHandle> {
        let page = self.page.borrow();
        let found = elements(&page.html)
            .position(|e| e.value().id() == Some(id))
            .map(|i| handle(page.generation, i));
        found
    }

    /// Gives an element a layout box.
    pub fn place(&self, element: &ElementHandle, location: Location, size: Size) {
        if let Some(index) = self.current_index(element) {
            self.layout.borrow_mut().insert(index, (location, size));
        }
    }

    /// Makes every query against `element` raise `fault`.
    pub fn fail_element(&self, element: &ElementHandle, fault: Fault) {
        if let Some(index) = self.current_index(element) {
            self.faults.borrow_mut().insert(index, fault);
        }
    }

    /// Removes the element and its subtree; their handles go stale.
    pub fn detach(&self, element: &ElementHandle) {
        let Some(index) = self.current_index(element) else {
            return;
        };
        let page = self.page.borrow();
        let index_of = document_index(&page.html);
        if let Some(el) = elements(&page.html).nth(index) {
            let below = el
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter_map(|e| index_of(&e));
            self.detached.borrow_mut().extend(below);
        };
    }

    /// Loads a new document: every existing handle goes stale.
    pub fn navigate(&self, url: &str, source: &str) {
        let mut page = self.page.borrow_mut();
        page.html = Html::parse_document(source);
        page.url = url.to_string();
        page.generation += 1;
        self.detached.borrow_mut().clear();
        self.layout.borrow_mut().clear();
        self.faults.borrow_mut().clear();
    }

    /// Makes page-level queries (title, URL) raise `fault`.
    pub fn fail_page(&self, fault: Option<Fault>) {
        self.page_fault.set(fault);
    }

    /// Number of oracle calls answered so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }

    fn current_index(&self, element: &ElementHandle) -> Option<usize> {
        let (generation, index) = parse_handle(element)?;
        (generation == self.page.borrow().generation).then_some(index)
    }

    /// Resolves `element` and hands it to `f`, counting one oracle call.
    fn inspect<T>(
        &self,
        element: &ElementHandle,
        f: impl FnOnce(usize, ElementRef<'_>) -> T,
    ) -> OracleResult<T> {
        self.tick();
        let (generation, index) = parse_handle(element).ok_or_else(|| {
            OracleError::InvalidElementState(format!("{} was not issued by this document", element))
        })?;
        let stale = || {
            OracleError::InvalidElementState(format!(
                "{} is no longer attached to the document",
                element
            ))
        };
        let page = self.page.borrow();
        if generation != page.generation || self.detached.borrow().contains(&index) {
            return Err(stale());
        }
        let el = elements(&page.html).nth(index).ok_or_else(stale)?;
        if let Some(fault) = self.faults.borrow().get(&index).copied() {
            return Err(fault.raise(format!("injected fault on {}", element)));
        }
        Ok(f(index, el))
    }

    /// Handles of the attached elements in `matched`, minus `skip`.
    fn attached<'a>(
        &self,
        generation: u64,
        matched: impl Iterator<Item = ElementRef<'a>>,
        index_of: impl Fn(&ElementRef<'_>) -> Option<usize>,
        skip: Option<usize>,
    ) -> Vec<ElementHandle> {
        let detached = self.detached.borrow();
        matched
            .filter_map(|e| index_of(&e))
            .filter(|i| Some(*i) != skip && !detached.contains(i))
            .map(|i| handle(generation, i))
            .collect()
    }

    fn page_fact(&self, what: &str, read: impl FnOnce(&Page) -> String) -> OracleResult<String> {
        self.tick();
        match self.page_fault.get() {
            Some(fault) => Err(fault.raise(format!("injected fault reading {}", what))),
            None => Ok(read(&self.page.borrow())),
        }
    }
}

fn handle(generation: u64, index: usize) -> ElementHandle {
    ElementHandle::new(format!("node-{}-{}", generation, index))
}

fn parse_handle(element: &ElementHandle) -> Option<(u64, usize)> {
    let (generation, index) = element.id().strip_prefix("node-")?.split_once('-')?;
    Some((generation.parse().ok()?, index.parse().ok()?))
}

impl Oracle for MemoryOracle {
    fn enumerate(&self, scope: &str) -> OracleResult<Vec<ElementHandle>> {
        self.tick();
        let selector = parse_selector(scope)?;
        let page = self.page.borrow();
        let index_of = document_index(&page.html);
        Ok(self.attached(page.generation, page.html.select(&selector), index_of, None))
    }

    fn enumerate_children(
        &self,
        parent: &ElementHandle,
        scope: &str,
    ) -> OracleResult<Vec<ElementHandle>> {
        let parent_index = self.inspect(parent, |index, _| index)?;
        let selector = parse_selector(scope)?;
        let page = self.page.borrow();
        let index_of = document_index(&page.html);
        let Some(el) = elements(&page.html).nth(parent_index) else {
            return Ok(Vec::new());
        };
        Ok(self.attached(page.generation, el.select(&selector), index_of, Some(parent_index)))
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> OracleResult<Option<String>> {
        let name = name.to_ascii_lowercase();
        self.inspect(element, |_, el| el.value().attr(&name).map(str::to_string))
    }

    fn tag_name(&self, element: &ElementHandle) -> OracleResult<String> {
        self.inspect(element, |_, el| el.value().name().to_ascii_lowercase())
    }

    fn text(&self, element: &ElementHandle) -> OracleResult<String> {
        self.inspect(element, |_, el| collapsed_text(el))
    }

    fn size(&self, element: &ElementHandle) -> OracleResult<Size> {
        let index = self.inspect(element, |index, _| index)?;
        Ok(self
            .layout
            .borrow()
            .get(&index)
            .map_or(Size::new(0, 0), |(_, size)| *size))
    }

    fn location(&self, element: &ElementHandle) -> OracleResult<Location> {
        let index = self.inspect(element, |index, _| index)?;
        Ok(self
            .layout
            .borrow()
            .get(&index)
            .map_or(Location::new(0, 0), |(location, _)| *location))
    }

    fn is_displayed(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.inspect(element, |_, el| rendered(el))
    }

    fn is_enabled(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.inspect(element, |_, el| el.value().attr("disabled").is_none())
    }

    fn exists(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.inspect(element, |_, _| true)
    }

    fn is_selected(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.inspect(element, |_, el| {
            let element = el.value();
            element.attr("selected").is_some() || element.attr("checked").is_some()
        })
    }

    fn is_visible(&self, element: &ElementHandle) -> OracleResult<bool> {
        self.inspect(element, |_, el| shown(el))
    }

    fn title(&self) -> OracleResult<String> {
        let selector = parse_selector("title")?;
        self.page_fact("title", |page| {
            page.html
                .select(&selector)
                .next()
                .map(collapsed_text)
                .unwrap_or_default()
        })
    }

    fn current_url(&self) -> OracleResult<String> {
        self.page_fact("current URL", |page| page.url.clone())
    }
}
