//! In-memory tab session model and the page-host capability it drives.

mod host;
mod session;

pub use host::FindOptions;
pub use host::PageHost;
pub use host::PageHostEvent;
pub use session::CloseOutcome;
pub use session::NavigateOutcome;
pub use session::Session;
pub use session::Tab;
pub use session::TabId;
pub use session::TabState;
