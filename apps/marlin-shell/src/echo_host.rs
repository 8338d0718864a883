//! Stand-in page host for the headless shell.
//!
//! Real deployments wire the session to an embedded rendering engine; the
//! shell binary only needs something that acknowledges commands so the
//! session, store and history paths can be exercised end to end.

use mb_core::Destination;
use mb_core::ShellResult;
use mb_session::FindOptions;
use mb_session::PageHost;

#[derive(Debug, Default)]
pub struct EchoHost;

impl PageHost for EchoHost {
    fn load(&mut self, destination: &Destination) -> ShellResult<()> {
        println!("[host] loading {destination}");
        Ok(())
    }

    fn back(&mut self) -> ShellResult<()> {
        println!("[host] back");
        Ok(())
    }

    fn forward(&mut self) -> ShellResult<()> {
        println!("[host] forward");
        Ok(())
    }

    fn reload(&mut self) -> ShellResult<()> {
        println!("[host] reload");
        Ok(())
    }

    fn find_in_page(&mut self, text: &str, options: &FindOptions) -> ShellResult<()> {
        let direction = if options.backward { "backward" } else { "forward" };
        println!("[host] find {direction} for `{text}`");
        Ok(())
    }
}

/// Title an echo "page" reports once loaded: the destination without its
/// scheme, cut at the first path segment.
pub fn synthesized_title(destination: &Destination) -> String {
    let value = destination.as_str();
    let without_scheme = value
        .split_once("://")
        .map_or(value, |(_, remainder)| remainder);
    let host = without_scheme
        .split_once('/')
        .map_or(without_scheme, |(host, _)| host);

    if host.is_empty() {
        "New Tab".to_owned()
    } else {
        host.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::synthesized_title;
    use mb_core::Destination;

    #[test]
    fn title_is_the_host_portion_of_the_destination() {
        let destination = Destination::from_stored("https://example.com/docs/index.html");
        assert_eq!(synthesized_title(&destination), "example.com");
    }

    #[test]
    fn destination_without_scheme_separator_is_used_whole() {
        let destination = Destination::from_stored("about:blank");
        assert_eq!(synthesized_title(&destination), "about:blank");
    }
}
