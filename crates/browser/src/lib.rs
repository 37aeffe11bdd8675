//! Oracle implementations for the DOM relations.
//!
//! - `cdp` / `session`: Chrome DevTools Protocol over WebSocket, plus browser
//!   process launch and page-target discovery.
//! - `oracle`: `CdpOracle`, a blocking adapter over the async CDP client.
//! - `memory`: `MemoryOracle`, an in-memory document parsed from HTML.

pub mod cdp;
pub mod memory;
pub mod oracle;
pub mod session;

pub use cdp::{CdpClient, CdpError};
pub use memory::{Fault, MemoryOracle};
pub use oracle::CdpOracle;
pub use session::{BrowserEngine, BrowserSession};
