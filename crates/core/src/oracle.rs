//! The live document as seen by the relation layer.
//!
//! An [`Oracle`] answers questions about one browser session. Calls block
//! until the answer is known; relations issue them one at a time.

use crate::error::OracleError;
use crate::types::{ElementHandle, Location, Size};

pub type OracleResult<T> = std::result::Result<T, OracleError>;

pub trait Oracle {
    /// Elements matching `scope`, in document order.
    fn enumerate(&self, scope: &str) -> OracleResult<Vec<ElementHandle>>;

    /// Descendants of `parent` matching `scope`, in document order.
    fn enumerate_children(
        &self,
        parent: &ElementHandle,
        scope: &str,
    ) -> OracleResult<Vec<ElementHandle>>;

    fn attribute(&self, element: &ElementHandle, name: &str) -> OracleResult<Option<String>>;

    fn tag_name(&self, element: &ElementHandle) -> OracleResult<String>;

    fn text(&self, element: &ElementHandle) -> OracleResult<String>;

    fn size(&self, element: &ElementHandle) -> OracleResult<Size>;

    fn location(&self, element: &ElementHandle) -> OracleResult<Location>;

    fn is_displayed(&self, element: &ElementHandle) -> OracleResult<bool>;

    fn is_enabled(&self, element: &ElementHandle) -> OracleResult<bool>;

    fn exists(&self, element: &ElementHandle) -> OracleResult<bool>;

    /// Present means exists and displayed. Implementations should not
    /// override this unless they preserve that identity exactly.
    fn is_present(&self, element: &ElementHandle) -> OracleResult<bool> {
        Ok(self.exists(element)? && self.is_displayed(element)?)
    }

    fn is_selected(&self, element: &ElementHandle) -> OracleResult<bool>;

    fn is_visible(&self, element: &ElementHandle) -> OracleResult<bool>;

    fn title(&self) -> OracleResult<String>;

    fn current_url(&self) -> OracleResult<String>;
}
