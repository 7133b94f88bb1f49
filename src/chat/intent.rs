//! Keyword heuristics that decide whether a turn should hit the web, what to
//! search for, and whether the user is pointing back at earlier results.
//!
//! Matching is plain substring matching on the lower-cased message: "install"
//! anywhere in the text counts, word boundaries are not checked.

use std::sync::LazyLock;

use regex::Regex;

pub const SEARCH_KEYWORDS: [&str; 24] = [
    "search",
    "search for",
    "look up",
    "find",
    "find information",
    "google",
    "what is",
    "who is",
    "when did",
    "where is",
    "latest",
    "current",
    "news about",
    "how to",
    "how do i",
    "walkthrough",
    "guide",
    "tutorial",
    "steps",
    "instructions",
    "setup",
    "install",
    "configure",
    "configuration",
];

pub const CONTEXT_REFERENCE_KEYWORDS: [&str; 12] = [
    "show", "display", "results", "see", "list", "links", "sources", "those", "again",
    "previous", "before", "earlier",
];

static SITE_FOR_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"search(?:es)?\s+(?:for\s+)?([a-z0-9.-]+\.[a-z]{2,})\s+for\s+(.+)$")
        .expect("Invalid regex")
});

static SITE_ON_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"search(?:es)?(?:\s+on)?\s+([a-z0-9.-]+\.[a-z]{2,})(?:\s+(.*))?$")
        .expect("Invalid regex")
});

static LEADING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(search for|look up|find information about|what is|who is|when did|where is|find|search)\s+",
    )
    .expect("Invalid regex")
});

static SITE_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^site:(\S+)\s*(.*)$").expect("Invalid regex"));

pub fn detect_search_intent(message: &str) -> bool {
    let lower = message.to_lowercase();
    SEARCH_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Turn a chat message into a search-engine query.
///
/// Site searches ("search memory.net for 8gb ram", "search on memory.net")
/// become `site:` queries; otherwise a leading command phrase is stripped.
/// An empty result falls back to the original message.
pub fn extract_search_query(message: &str) -> String {
    let lower = message.trim().to_lowercase();

    if let Some(caps) = SITE_FOR_TERM.captures(&lower) {
        let term = caps[2].trim();
        return format!("site:{} {}", &caps[1], term).trim_end().to_string();
    }

    if let Some(caps) = SITE_ON_DOMAIN.captures(&lower) {
        let domain = &caps[1];
        let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        return if rest.is_empty() {
            format!("site:{}", domain)
        } else {
            format!("site:{} {}", domain, rest)
        };
    }

    let query = LEADING_PREFIX.replace(&lower, "").trim().to_string();
    if query.is_empty() {
        message.to_string()
    } else {
        query
    }
}

pub fn could_be_context_reference_question(message: &str) -> bool {
    let lower = message.to_lowercase();
    CONTEXT_REFERENCE_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// A `site:<domain> <term>` query split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteQuery {
    pub domain: String,
    pub term: String,
}

impl SiteQuery {
    pub fn parse(query: &str) -> Option<Self> {
        let caps = SITE_QUERY.captures(query.trim())?;
        Some(Self {
            domain: caps[1].to_string(),
            term: caps[2].trim().to_string(),
        })
    }
}

/// Strategy seam for turn classification so a smarter classifier can replace
/// the keyword rules without touching the orchestration.
pub trait IntentClassifier: Send + Sync {
    fn is_search_request(&self, message: &str) -> bool;

    fn search_query(&self, message: &str) -> String;

    fn is_context_reference(&self, message: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

impl IntentClassifier for KeywordIntentClassifier {
    fn is_search_request(&self, message: &str) -> bool {
        detect_search_intent(message)
    }

    fn search_query(&self, message: &str) -> String {
        extract_search_query(message)
    }

    fn is_context_reference(&self, message: &str) -> bool {
        could_be_context_reference_question(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn how_to_and_setup_cues_trigger_search() {
        for message in [
            "How do I INSTALL docker?",
            "configure nginx please",
            "HOW TO bake bread",
            "Any news about rust 2024?",
            "reinstalling my drivers",
        ] {
            assert!(detect_search_intent(message), "{message}");
        }
    }

    #[test]
    fn plain_chat_does_not_trigger_search() {
        assert!(!detect_search_intent("hello there"));
        assert!(!detect_search_intent("tell me a joke"));
        assert!(!detect_search_intent(""));
    }

    #[test]
    fn site_search_with_for_term() {
        assert_eq!(
            extract_search_query("Search memory.net for 8gb ram"),
            "site:memory.net 8gb ram"
        );
        assert_eq!(
            extract_search_query("Search memory.net for 8gb 2133mhz ddr4 laptop sized ram"),
            "site:memory.net 8gb 2133mhz ddr4 laptop sized ram"
        );
        assert_eq!(
            extract_search_query("please search for docs.rs for tokio timeouts"),
            "site:docs.rs tokio timeouts"
        );
    }

    #[test]
    fn site_search_on_domain() {
        assert_eq!(
            extract_search_query("Can you search on memory.net"),
            "site:memory.net"
        );
        assert_eq!(
            extract_search_query("searches github.com rust parsers"),
            "site:github.com rust parsers"
        );
    }

    #[test]
    fn generic_prefixes_are_stripped() {
        assert_eq!(
            extract_search_query("Search for TypeScript tutorials"),
            "typescript tutorials"
        );
        assert_eq!(
            extract_search_query("Find information about nodejs"),
            "nodejs"
        );
        assert_eq!(
            extract_search_query("What is the capital of France"),
            "the capital of france"
        );
        assert_eq!(extract_search_query("  latest rust release  "), "latest rust release");
    }

    #[test]
    fn words_without_dotted_domain_are_not_site_searches() {
        assert_eq!(
            extract_search_query("search for typescript for beginners"),
            "typescript for beginners"
        );
    }

    #[test]
    fn bare_command_word_is_kept() {
        assert_eq!(extract_search_query("Search"), "search");
        assert_eq!(extract_search_query(""), "");
        assert_eq!(extract_search_query("   "), "   ");
    }

    #[test]
    fn context_reference_detection() {
        assert!(could_be_context_reference_question("Show me those links again"));
        assert!(could_be_context_reference_question("what were the SOURCES?"));
        assert!(!could_be_context_reference_question("what's the weather"));
    }

    #[test]
    fn site_query_parsing() {
        assert_eq!(
            SiteQuery::parse("site:memory.net 8gb ram"),
            Some(SiteQuery {
                domain: "memory.net".to_string(),
                term: "8gb ram".to_string(),
            })
        );
        assert_eq!(
            SiteQuery::parse("site:memory.net"),
            Some(SiteQuery {
                domain: "memory.net".to_string(),
                term: String::new(),
            })
        );
        assert_eq!(SiteQuery::parse("typescript tutorials"), None);
    }

    #[test]
    fn keyword_classifier_delegates_to_rules() {
        let classifier = KeywordIntentClassifier;
        assert!(classifier.is_search_request("look up rust"));
        assert_eq!(classifier.search_query("look up rust"), "rust");
        assert!(classifier.is_context_reference("list them"));
    }
}
