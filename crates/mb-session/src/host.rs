//! Contract between the session model and an embedded page renderer.

use crate::session::TabId;
use mb_core::Destination;
use mb_core::ShellResult;

/// Capability the core uses to drive an embedded rendering engine.
///
/// The core only issues commands and consumes [`PageHostEvent`]
/// notifications; it never inspects rendered content, executes scripts, or
/// manages network state. All of that is the host's exclusive territory.
pub trait PageHost {
    fn load(&mut self, destination: &Destination) -> ShellResult<()>;
    fn back(&mut self) -> ShellResult<()>;
    fn forward(&mut self) -> ShellResult<()>;
    fn reload(&mut self) -> ShellResult<()>;
    fn find_in_page(&mut self, text: &str, options: &FindOptions) -> ShellResult<()>;
}

/// Options for text search within the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    pub case_sensitive: bool,
    pub wrap_around: bool,
    pub backward: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            wrap_around: true,
            backward: false,
        }
    }
}

/// Inbound notification from the page host, fed to
/// [`Session::handle_event`](crate::Session::handle_event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageHostEvent {
    /// The engine finished loading the tab's pending destination.
    LoadFinished { tab: TabId },
    /// The engine gave up on the tab's pending destination.
    LoadFailed { tab: TabId, reason: String },
    /// The engine moved the tab somewhere else (redirect, history
    /// traversal, anchor click).
    DestinationChanged {
        tab: TabId,
        destination: Destination,
    },
    /// The page reported a (possibly updated) title.
    TitleChanged { tab: TabId, title: String },
}
