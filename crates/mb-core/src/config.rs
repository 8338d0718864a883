//! Shell configuration: home destination, search rewrite, storage root.

use crate::destination::Destination;
use std::path::PathBuf;
use url::form_urlencoded;

/// Search-engine rewrite applied to scheme-less, dot-less address input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRewrite {
    /// Search engine origin, without a trailing slash.
    pub base: String,
    /// Optional `hl` language hint appended to every query URL.
    pub locale: Option<String>,
}

impl Default for SearchRewrite {
    fn default() -> Self {
        Self {
            base: "https://www.google.com".to_owned(),
            locale: Some("en".to_owned()),
        }
    }
}

impl SearchRewrite {
    /// Builds the query URL for a raw search term, URL-encoding it.
    pub fn query_url(&self, query: &str) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("q", query);
        if let Some(locale) = &self.locale {
            serializer.append_pair("hl", locale);
        }

        format!(
            "{}/search?{}",
            self.base.trim_end_matches('/'),
            serializer.finish()
        )
    }
}

/// Top-level shell configuration shared by the session model and the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Destination loaded into new tabs and by the Home action.
    pub home: Destination,
    pub rewrite: SearchRewrite,
    /// Directory holding the bookmark snapshot and history log files.
    pub storage_root: PathBuf,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            home: Destination::from_stored("https://google.com"),
            rewrite: SearchRewrite::default(),
            storage_root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    if let Some(override_root) = std::env::var_os("MARLIN_STORAGE_DIR") {
        return PathBuf::from(override_root);
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".marlin")
}

#[cfg(test)]
mod tests {
    use super::SearchRewrite;

    #[test]
    fn query_url_appends_locale_after_query() {
        let rewrite = SearchRewrite::default();
        assert_eq!(
            rewrite.query_url("openai"),
            "https://www.google.com/search?q=openai&hl=en"
        );
    }

    #[test]
    fn query_url_without_locale_has_single_parameter() {
        let rewrite = SearchRewrite {
            base: "https://search.example".to_owned(),
            locale: None,
        };
        assert_eq!(
            rewrite.query_url("a b"),
            "https://search.example/search?q=a+b"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_tolerated() {
        let rewrite = SearchRewrite {
            base: "https://search.example/".to_owned(),
            locale: None,
        };
        assert_eq!(
            rewrite.query_url("x"),
            "https://search.example/search?q=x"
        );
    }
}
