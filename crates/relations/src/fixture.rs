use crate::context::QueryContext;
use domlogic_browser::MemoryOracle;
use domlogic_core::{Location, Size};
use std::rc::Rc;

pub const SAMPLE_URL: &str = "http://localhost:8080/";

const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Ministache</title></head>
  <body>
    <h1>Ministache</h1>
    <table id="pages-table" class="listing">
      <tbody><tr><td>Home</td><td>About</td></tr></tbody>
    </table>
    <form>
      <input id="name_field" type="text">
      <input id="disabled_field" type="text" disabled>
      <input id="remember" type="checkbox" checked>
      <select>
        <option value="a">A</option>
        <option value="b" selected>B</option>
      </select>
    </form>
    <div id="hidden-note" style="display: none">secret</div>
    <div id="faded" style="opacity: 0"></div>
  </body>
</html>"#;

pub fn context(doc: &Rc<MemoryOracle>) -> QueryContext {
    QueryContext::new(doc.clone())
}

/// Parses `source` into a fresh document and its query context.
pub fn document(source: &str) -> (Rc<MemoryOracle>, QueryContext) {
    let doc = Rc::new(MemoryOracle::new(SAMPLE_URL, source));
    let ctx = context(&doc);
    (doc, ctx)
}

/// A small form page shared by the relation tests.
pub fn sample_document() -> (Rc<MemoryOracle>, QueryContext) {
    let (doc, ctx) = document(SAMPLE_PAGE);
    if let Some(table) = doc.by_id("pages-table") {
        doc.place(&table, Location::new(37, 295), Size::new(567, 105));
    }
    (doc, ctx)
}
