//! Headless Marlin shell: drives the tab session, bookmark and history core
//! from stdin commands against an echo page host.

use mb_core::Destination;
use mb_core::ShellConfig;
use mb_core::ShellError;
use mb_core::ShellResult;
use mb_history::HistoryLog;
use mb_session::FindOptions;
use mb_session::PageHostEvent;
use mb_session::Session;
use mb_session::TabState;
use mb_store::Bookmarks;
use mb_store::PersistentStore;
use std::io::BufRead;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

mod echo_host;

use echo_host::EchoHost;
use echo_host::synthesized_title;

const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

fn main() {
    let options = match launch_options_from_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("Marlin startup error: {error}");
            std::process::exit(2);
        }
    };

    if options.show_help {
        print_usage();
        return;
    }

    if let Err(error) = run(options) {
        eprintln!("Marlin error: {error}");
        std::process::exit(1);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct LaunchOptions {
    storage_root: Option<PathBuf>,
    home: Option<String>,
    show_help: bool,
}

fn launch_options_from_args(
    args: impl Iterator<Item = String>,
) -> Result<LaunchOptions, String> {
    let mut options = LaunchOptions::default();
    let mut args = args;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--storage-dir" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing path after --storage-dir".to_owned())?;
                options.storage_root = Some(PathBuf::from(value));
            }
            "--home" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing destination after --home".to_owned())?;
                options.home = Some(value);
            }
            "--help" | "-h" => options.show_help = true,
            other => return Err(format!("unsupported argument `{other}`")),
        }
    }

    Ok(options)
}

fn print_usage() {
    println!("marlin-shell [--storage-dir <path>] [--home <destination>]");
    println!();
    println!("Commands: open [input], go <input>, tabs, switch <n>, close [n],");
    println!("          back, forward, reload, home, find <text>,");
    println!("          bookmark <name>, unbookmark <name>, visit <name>,");
    println!("          bookmarks, history, help, quit");
}

struct Shell {
    session: Session,
    host: EchoHost,
    bookmarks: Bookmarks,
    history: HistoryLog,
}

fn run(options: LaunchOptions) -> ShellResult<()> {
    let mut config = ShellConfig::default();
    if let Some(root) = options.storage_root {
        config.storage_root = root;
    }
    if let Some(raw_home) = options.home {
        config.home = Destination::resolve(&raw_home, &config.rewrite).ok_or_else(|| {
            ShellError::new("shell.invalid_home", "home destination must be non-empty")
        })?;
    }

    let store = PersistentStore::new(config.storage_root.clone());
    let bookmarks = Bookmarks::open(store.clone());
    let history = HistoryLog::new(store);
    let mut host = EchoHost;
    let session = Session::start(config, history.clone(), &mut host)?;

    let mut shell = Shell {
        session,
        host,
        bookmarks,
        history,
    };
    shell.settle_active_load();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|error| {
            ShellError::new("shell.stdin_failed", format!("failed to read input: {error}"))
        })?;

        match parse_command(&line) {
            Command::Nothing => {}
            Command::Quit => break,
            Command::Help => print_usage(),
            command => {
                if let Err(error) = shell.execute(command) {
                    eprintln!("Marlin error: {error}");
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Nothing,
    Open(Option<String>),
    Go(String),
    Tabs,
    Switch(usize),
    Close(Option<usize>),
    Back,
    Forward,
    Reload,
    Home,
    Find(String),
    Bookmark(String),
    Unbookmark(String),
    Visit(String),
    BookmarkList,
    History,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Nothing;
    }

    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };

    match verb {
        "open" => Command::Open((!rest.is_empty()).then(|| rest.to_owned())),
        "go" => Command::Go(rest.to_owned()),
        "tabs" => Command::Tabs,
        "switch" => match rest.parse::<usize>() {
            Ok(index) if index >= 1 => Command::Switch(index),
            _ => Command::Unknown(trimmed.to_owned()),
        },
        "close" => {
            if rest.is_empty() {
                Command::Close(None)
            } else {
                match rest.parse::<usize>() {
                    Ok(index) if index >= 1 => Command::Close(Some(index)),
                    _ => Command::Unknown(trimmed.to_owned()),
                }
            }
        }
        "back" => Command::Back,
        "forward" => Command::Forward,
        "reload" => Command::Reload,
        "home" => Command::Home,
        "find" => Command::Find(rest.to_owned()),
        "bookmark" => Command::Bookmark(rest.to_owned()),
        "unbookmark" => Command::Unbookmark(rest.to_owned()),
        "visit" => Command::Visit(rest.to_owned()),
        "bookmarks" => Command::BookmarkList,
        "history" => Command::History,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_owned()),
    }
}

impl Shell {
    fn execute(&mut self, command: Command) -> ShellResult<()> {
        match command {
            Command::Open(input) => self.open(input),
            Command::Go(input) => self.navigate_active(&input),
            Command::Tabs => {
                self.print_tabs();
                Ok(())
            }
            Command::Switch(index) => self.switch(index),
            Command::Close(index) => self.close(index),
            Command::Back => self.session.back(&mut self.host),
            Command::Forward => self.session.forward(&mut self.host),
            Command::Reload => self.session.reload(&mut self.host),
            Command::Home => {
                self.session.go_home(&mut self.host)?;
                self.settle_active_load();
                Ok(())
            }
            Command::Find(text) => {
                self.session
                    .find_in_page(&mut self.host, &text, &FindOptions::default())
            }
            Command::Bookmark(name) => self.bookmark_active(&name),
            Command::Unbookmark(name) => self.unbookmark(&name),
            Command::Visit(name) => self.visit_bookmark(&name),
            Command::BookmarkList => {
                self.print_bookmarks();
                Ok(())
            }
            Command::History => self.print_history(),
            Command::Unknown(line) => {
                eprintln!("unrecognized command `{line}` (try `help`)");
                Ok(())
            }
            Command::Nothing | Command::Help | Command::Quit => Ok(()),
        }
    }

    fn open(&mut self, input: Option<String>) -> ShellResult<()> {
        match input {
            Some(raw) => {
                let resolved = Destination::resolve(&raw, &self.session.config().rewrite);
                let Some(destination) = resolved else {
                    return Ok(());
                };
                self.session.open(&mut self.host, destination.clone())?;
                self.history.record(&destination)?;
            }
            None => {
                self.session.open_default(&mut self.host)?;
            }
        }

        self.settle_active_load();
        self.print_tabs();
        Ok(())
    }

    fn navigate_active(&mut self, input: &str) -> ShellResult<()> {
        let tab = self.session.active_tab_id();
        self.session.navigate(&mut self.host, tab, input)?;
        self.settle_active_load();
        Ok(())
    }

    fn switch(&mut self, index: usize) -> ShellResult<()> {
        let id = self.tab_id_at(index)?;
        self.session.activate(id)?;
        self.print_tabs();
        Ok(())
    }

    fn close(&mut self, index: Option<usize>) -> ShellResult<()> {
        let id = match index {
            Some(index) => self.tab_id_at(index)?,
            None => self.session.active_tab_id(),
        };
        self.session.close(&mut self.host, id)?;
        self.settle_active_load();
        self.print_tabs();
        Ok(())
    }

    fn bookmark_active(&mut self, name: &str) -> ShellResult<()> {
        if name.is_empty() {
            return Err(ShellError::new(
                "shell.bookmark_name_missing",
                "bookmark needs a name: bookmark <name>",
            ));
        }

        let Some(destination) = self.session.active_tab().destination().cloned() else {
            return Err(ShellError::new(
                "shell.bookmark_empty_tab",
                "the active tab has no destination to bookmark",
            ));
        };

        self.bookmarks.add(name, destination)?;
        println!("bookmarked `{name}` ({} total)", self.bookmarks.len());
        Ok(())
    }

    fn unbookmark(&mut self, name: &str) -> ShellResult<()> {
        if self.bookmarks.remove(name)? {
            println!("removed bookmark `{name}`");
        } else {
            println!("no bookmark named `{name}`");
        }
        Ok(())
    }

    fn visit_bookmark(&mut self, name: &str) -> ShellResult<()> {
        let Some(destination) = self.bookmarks.get(name).cloned() else {
            return Err(ShellError::new(
                "shell.bookmark_unknown",
                format!("no bookmark named `{name}`"),
            ));
        };

        let input = destination.as_str().to_owned();
        self.navigate_active(&input)
    }

    fn print_tabs(&self) {
        let active = self.session.active_tab_id();
        for (position, tab) in self.session.tabs().iter().enumerate() {
            let marker = if tab.id() == active { '*' } else { ' ' };
            let state = match tab.state() {
                TabState::Loading => "loading",
                TabState::Loaded => "loaded",
            };
            let destination = tab
                .destination()
                .map_or("(empty)", Destination::as_str);
            println!(
                "{marker} {}. {} [{state}] {destination}",
                position + 1,
                tab.title()
            );
        }
    }

    fn print_bookmarks(&self) {
        if self.bookmarks.is_empty() {
            println!("no bookmarks yet");
            return;
        }

        for (name, destination) in self.bookmarks.entries() {
            println!("{name} -> {destination}");
        }
    }

    fn print_history(&self) -> ShellResult<()> {
        let rendered = self.history.render()?;
        if rendered.is_empty() {
            println!("no history yet");
            return Ok(());
        }

        for (day, outcome) in rendered {
            println!("{day}:");
            for entry in &outcome.entries {
                println!(
                    "  {} {}",
                    format_clock(entry.timestamp),
                    entry.destination
                );
            }
            if outcome.truncated {
                println!("  (log for {day} ends in a damaged record)");
            }
        }

        Ok(())
    }

    /// The echo host "finishes" every load instantly, so feed the session
    /// the notifications a real engine would deliver asynchronously.
    fn settle_active_load(&mut self) {
        let tab = self.session.active_tab_id();
        let title = self
            .session
            .active_tab()
            .destination()
            .map(synthesized_title);

        self.session.handle_event(PageHostEvent::LoadFinished { tab });
        if let Some(title) = title {
            self.session
                .handle_event(PageHostEvent::TitleChanged { tab, title });
        }
    }

    fn tab_id_at(&self, index: usize) -> ShellResult<mb_session::TabId> {
        self.session
            .tabs()
            .get(index - 1)
            .map(|tab| tab.id())
            .ok_or_else(|| {
                ShellError::new(
                    "shell.tab_index_out_of_range",
                    format!("no tab at position {index}"),
                )
            })
    }
}

fn format_clock(timestamp: i64) -> String {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|moment| moment.format(TIME_FORMAT).ok())
        .unwrap_or_else(|| timestamp.to_string())
}
