//! Open-tab state machine.

use crate::host::FindOptions;
use crate::host::PageHost;
use crate::host::PageHostEvent;
use mb_core::Destination;
use mb_core::ShellConfig;
use mb_core::ShellError;
use mb_core::ShellResult;
use mb_history::HistoryLog;

/// Title shown until the page host reports a real one.
const PLACEHOLDER_TITLE: &str = "New Tab";

/// Identifier for an open tab; never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TabId(u64);

impl core::fmt::Display for TabId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load state of an open tab. A closed tab is simply removed from the
/// session, so removal is the terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Loading,
    Loaded,
}

/// One open tab: its committed destination, any in-flight load, and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    id: TabId,
    committed: Option<Destination>,
    pending: Option<Destination>,
    title: String,
    state: TabState,
}

impl Tab {
    fn new(id: TabId, destination: Destination) -> Self {
        Self {
            id,
            committed: None,
            pending: Some(destination),
            title: PLACEHOLDER_TITLE.to_owned(),
            state: TabState::Loading,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn state(&self) -> TabState {
        self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The destination the tab currently shows or is heading to: the
    /// in-flight target while loading, the committed one otherwise.
    pub fn destination(&self) -> Option<&Destination> {
        self.pending.as_ref().or(self.committed.as_ref())
    }

    fn begin_load(&mut self, destination: Destination) {
        self.pending = Some(destination);
        self.state = TabState::Loading;
        self.title = PLACEHOLDER_TITLE.to_owned();
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// Empty or whitespace-only input; nothing happened, nothing was stored.
    Ignored,
    /// The host accepted the load and the destination was recorded.
    Committed(Destination),
}

/// Result of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The last remaining tab is never removed; it was sent back to the
    /// configured home destination instead.
    LastTabBlanked,
}

/// Ordered set of open tabs with exactly one active tab.
///
/// All transitions happen on the caller's control thread in response to user
/// actions or host events; the session itself holds no locks and performs no
/// I/O beyond history recording through the injected [`HistoryLog`].
#[derive(Debug)]
pub struct Session {
    config: ShellConfig,
    history: HistoryLog,
    tabs: Vec<Tab>,
    active: TabId,
    next_id: u64,
}

impl Session {
    /// Starts a session with a single tab loading the configured home
    /// destination. Opening a tab is not an address-bar navigation, so no
    /// history entry is recorded for it.
    pub fn start(
        config: ShellConfig,
        history: HistoryLog,
        host: &mut dyn PageHost,
    ) -> ShellResult<Self> {
        let mut session = Self {
            config,
            history,
            tabs: Vec::new(),
            active: TabId(0),
            next_id: 0,
        };
        session.open_default(host)?;
        Ok(session)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn active_tab_id(&self) -> TabId {
        self.active
    }

    pub fn active_tab(&self) -> &Tab {
        match self.tabs.iter().find(|tab| tab.id == self.active) {
            Some(tab) => tab,
            // The session always holds its active tab; `close` re-points
            // `active` before removal and the last tab is never removed.
            None => &self.tabs[0],
        }
    }

    /// Opens a new tab on the given destination and makes it active.
    pub fn open(&mut self, host: &mut dyn PageHost, destination: Destination) -> ShellResult<TabId> {
        let id = TabId(self.next_id);
        self.next_id += 1;

        let tab = Tab::new(id, destination.clone());
        self.tabs.push(tab);
        self.active = id;

        // A fresh tab has no prior destination to fall back to, so a host
        // refusal leaves it open in Loading with the target still pending.
        host.load(&destination)?;
        Ok(id)
    }

    /// Opens a new tab on the configured home destination.
    pub fn open_default(&mut self, host: &mut dyn PageHost) -> ShellResult<TabId> {
        let home = self.config.home.clone();
        self.open(host, home)
    }

    /// Makes the given tab active; no other state changes.
    pub fn activate(&mut self, tab_id: TabId) -> ShellResult<()> {
        if !self.tabs.iter().any(|tab| tab.id == tab_id) {
            return Err(unknown_tab(tab_id));
        }

        self.active = tab_id;
        Ok(())
    }

    /// Resolves raw address-bar input and navigates the tab to it.
    ///
    /// Empty input is ignored without constructing a destination or touching
    /// the store. On a host load failure the tab keeps its prior committed
    /// destination and state, nothing is recorded, and the failure surfaces
    /// as `session.load_failed`; the core never retries.
    pub fn navigate(
        &mut self,
        host: &mut dyn PageHost,
        tab_id: TabId,
        raw_input: &str,
    ) -> ShellResult<NavigateOutcome> {
        self.tab_index(tab_id)?;

        let Some(destination) = Destination::resolve(raw_input, &self.config.rewrite) else {
            return Ok(NavigateOutcome::Ignored);
        };

        host.load(&destination).map_err(|error| {
            ShellError::new(
                "session.load_failed",
                format!("host refused to load {destination}: {error}"),
            )
        })?;

        let index = self.tab_index(tab_id)?;
        self.tabs[index].begin_load(destination.clone());
        self.history.record(&destination)?;
        Ok(NavigateOutcome::Committed(destination))
    }

    /// Closes a tab. The last remaining tab is special-cased: it is kept and
    /// sent to the home destination rather than removed, so the session
    /// always has an active tab and closing never terminates the process.
    pub fn close(&mut self, host: &mut dyn PageHost, tab_id: TabId) -> ShellResult<CloseOutcome> {
        let index = self.tab_index(tab_id)?;

        if self.tabs.len() == 1 {
            let home = self.config.home.clone();
            host.load(&home)?;
            self.tabs[index].begin_load(home);
            return Ok(CloseOutcome::LastTabBlanked);
        }

        self.tabs.remove(index);
        if self.active == tab_id {
            let fallback = index.min(self.tabs.len() - 1);
            self.active = self.tabs[fallback].id;
        }

        Ok(CloseOutcome::Closed)
    }

    /// Navigates the active tab to the home destination (toolbar Home).
    /// Like opening a tab, this is not an address-bar commit, so it records
    /// no history entry.
    pub fn go_home(&mut self, host: &mut dyn PageHost) -> ShellResult<()> {
        let home = self.config.home.clone();
        host.load(&home)?;

        let index = self.tab_index(self.active)?;
        self.tabs[index].begin_load(home);
        Ok(())
    }

    /// History traversal, reload and in-page search are delegated verbatim
    /// to the host for the active tab; resulting moves come back as
    /// [`PageHostEvent`]s.
    pub fn back(&mut self, host: &mut dyn PageHost) -> ShellResult<()> {
        host.back()
    }

    pub fn forward(&mut self, host: &mut dyn PageHost) -> ShellResult<()> {
        host.forward()
    }

    pub fn reload(&mut self, host: &mut dyn PageHost) -> ShellResult<()> {
        host.reload()
    }

    pub fn find_in_page(
        &mut self,
        host: &mut dyn PageHost,
        text: &str,
        options: &FindOptions,
    ) -> ShellResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        host.find_in_page(text, options)
    }

    /// Applies an inbound host notification. Events for unknown tab ids are
    /// dropped silently: the tab may have been closed while the engine was
    /// still working.
    pub fn handle_event(&mut self, event: PageHostEvent) {
        match event {
            PageHostEvent::LoadFinished { tab } => {
                let Some(tab) = self.tab_mut(tab) else {
                    return;
                };
                if let Some(pending) = tab.pending.take() {
                    tab.committed = Some(pending);
                }
                tab.state = TabState::Loaded;
            }
            PageHostEvent::LoadFailed { tab, reason } => {
                let Some(tab) = self.tab_mut(tab) else {
                    return;
                };
                log::warn!("load failed on tab {}: {reason}", tab.id);
                tab.pending = None;
                tab.state = if tab.committed.is_some() {
                    TabState::Loaded
                } else {
                    TabState::Loading
                };
            }
            PageHostEvent::DestinationChanged { tab, destination } => {
                let Some(tab) = self.tab_mut(tab) else {
                    return;
                };
                match tab.state {
                    TabState::Loading => tab.pending = Some(destination),
                    TabState::Loaded => tab.committed = Some(destination),
                }
            }
            PageHostEvent::TitleChanged { tab, title } => {
                let Some(tab) = self.tab_mut(tab) else {
                    return;
                };
                let trimmed = title.trim();
                tab.title = if trimmed.is_empty() {
                    PLACEHOLDER_TITLE.to_owned()
                } else {
                    trimmed.to_owned()
                };
            }
        }
    }

    fn tab_index(&self, tab_id: TabId) -> ShellResult<usize> {
        self.tabs
            .iter()
            .position(|tab| tab.id == tab_id)
            .ok_or_else(|| unknown_tab(tab_id))
    }

    fn tab_mut(&mut self, tab_id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.id == tab_id)
    }
}

fn unknown_tab(tab_id: TabId) -> ShellError {
    ShellError::new("session.unknown_tab", format!("no open tab with id {tab_id}"))
}
