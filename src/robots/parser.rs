//! Robots.txt parser implementation
//!
//! The robotstxt crate's matcher decides first. Its handling of rules that open with a
//! wildcard (`*/borrow*`) is too lenient, so the parsed groups are also evaluated here with
//! longest-match semantics and a URL must pass both. Crawl-delay is read per group as well.

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    groups: Vec<Group>,
}

/// One `User-agent` block
#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<f64>,
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

impl Rule {
    /// Whether `target` (path plus query) falls under this rule
    ///
    /// `*` matches any run of characters and a trailing `$` anchors the end.
    fn matches(&self, target: &str) -> bool {
        let (pattern, anchored) = match self.pattern.strip_suffix('$') {
            Some(pattern) => (pattern, true),
            None => (self.pattern.as_str(), false),
        };

        let mut parts = pattern.split('*');
        let head = parts.next().unwrap_or("");
        let Some(mut rest) = target.strip_prefix(head) else {
            return false;
        };

        let tail: Vec<&str> = parts.collect();
        let Some((last, middle)) = tail.split_last() else {
            return !anchored || rest.is_empty();
        };

        // Leftmost placement of each segment leaves the most room for the next one
        for part in middle {
            match rest.find(part) {
                Some(at) => rest = &rest[at + part.len()..],
                None => return false,
            }
        }

        if anchored {
            rest.ends_with(last)
        } else {
            rest.contains(last)
        }
    }
}

/// Whether a `User-agent` token names this crawler
///
/// `*` is the wildcard group. Other tokens match case-insensitively as a substring of the
/// agent, with any `*` in the token ignored (`*bot` matches `SomeBot`).
fn agent_matches(token: &str, agent: &str) -> bool {
    let token = token.trim_matches('*').to_lowercase();
    !token.is_empty() && agent.to_lowercase().contains(&token)
}

fn parse_groups(content: &str) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut current = Group::default();
    let mut group_open = false;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_lowercase().as_str() {
            "user-agent" => {
                // Consecutive User-agent lines share one group
                if !group_open {
                    if !current.agents.is_empty() {
                        groups.push(std::mem::take(&mut current));
                    }
                    group_open = true;
                }
                current.agents.push(value.to_string());
            }
            field @ ("allow" | "disallow") => {
                group_open = false;
                if !current.agents.is_empty() && !value.is_empty() {
                    current.rules.push(Rule {
                        allow: field == "allow",
                        pattern: value.to_string(),
                    });
                }
            }
            "crawl-delay" => {
                group_open = false;
                match value.parse::<f64>() {
                    Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => {
                        current.crawl_delay = Some(seconds);
                    }
                    _ => {}
                }
            }
            _ => group_open = false,
        }
    }

    if !current.agents.is_empty() {
        groups.push(current);
    }
    groups
}

impl RobotsPolicy {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            groups: parse_groups(content),
        }
    }

    /// A policy that allows everything
    ///
    /// This is used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str())
            && self.rules_allow(url, user_agent)
    }

    /// Longest matching rule of the agent's groups wins, `Allow` on a tie
    ///
    /// Groups naming the agent exactly apply; the `*` groups apply only when none does.
    fn rules_allow(&self, url: &Url, user_agent: &str) -> bool {
        let named: Vec<&Group> = self
            .groups
            .iter()
            .filter(|group| {
                group
                    .agents
                    .iter()
                    .any(|token| token != "*" && token.eq_ignore_ascii_case(user_agent))
            })
            .collect();
        let applicable = if named.is_empty() {
            self.groups
                .iter()
                .filter(|group| group.agents.iter().any(|token| token == "*"))
                .collect()
        } else {
            named
        };

        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        applicable
            .iter()
            .flat_map(|group| group.rules.iter())
            .filter(|rule| rule.matches(&target))
            .max_by_key(|rule| (rule.pattern.len(), rule.allow))
            .map_or(true, |rule| rule.allow)
    }

    /// Crawl-delay for `user_agent`, preferring its own group over the wildcard group
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let mut specific: Option<f64> = None;
        let mut wildcard: Option<f64> = None;

        for group in &self.groups {
            let Some(seconds) = group.crawl_delay else {
                continue;
            };
            if group.agents.iter().any(|token| agent_matches(token, user_agent)) {
                specific = Some(seconds);
            } else if group.agents.iter().any(|token| token == "*") {
                wildcard = Some(seconds);
            }
        }

        specific.or(wildcard).map(Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENLIBRARY: &str = "\
User-agent: *
Disallow: /api
Disallow: /edit
Disallow: /account
Disallow: /search
Disallow: /books/add
Disallow: */borrow*

User-agent: Googlebot
Disallow: /*.rdf$
Crawl-delay: 10

User-agent: *bot
Crawl-delay: 10
";

    fn url(path: &str) -> Url {
        Url::parse("https://openlibrary.org").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_allow_all() {
        let robots = RobotsPolicy::allow_all();
        assert!(robots.is_allowed(&url("/search?q=x"), "Shelfmark"));
        assert_eq!(robots.crawl_delay("Shelfmark"), None);
    }

    #[test]
    fn test_catalog_paths() {
        let robots = RobotsPolicy::from_content(OPENLIBRARY);
        assert!(robots.is_allowed(&url("/subjects/fiction"), "Shelfmark"));
        assert!(robots.is_allowed(&url("/books/OL1M/The_Hobbit"), "Shelfmark"));
        assert!(!robots.is_allowed(&url("/search?q=subject%3Afiction"), "Shelfmark"));
        assert!(!robots.is_allowed(&url("/books/add"), "Shelfmark"));
        assert!(!robots.is_allowed(&url("/books/OL1M/borrow"), "Shelfmark"));
    }

    #[test]
    fn test_leading_wildcard_rules() {
        for rule in ["*/borrow*", "/*/borrow*", "/*borrow"] {
            let robots = RobotsPolicy::from_content(&format!("User-agent: *\nDisallow: {}", rule));
            assert!(
                !robots.is_allowed(&url("/books/OL1M/borrow"), "Shelfmark"),
                "{} should block borrow pages",
                rule
            );
            assert!(robots.is_allowed(&url("/books/OL1M/The_Hobbit"), "Shelfmark"));
        }
    }

    #[test]
    fn test_end_anchor() {
        let robots = RobotsPolicy::from_content("User-agent: *\nDisallow: /*.rdf$");
        assert!(!robots.is_allowed(&url("/books/OL1M.rdf"), "Shelfmark"));
        assert!(robots.is_allowed(&url("/books/OL1M.rdf?format=x"), "Shelfmark"));
        assert!(robots.is_allowed(&url("/books/OL1M.rdf/extra"), "Shelfmark"));
    }

    #[test]
    fn test_longest_rule_wins() {
        let content = "User-agent: *\nDisallow: /books/\nAllow: /books/OL1M\nDisallow: /books/OL1M/borrow";
        let robots = RobotsPolicy::from_content(content);
        assert!(robots.is_allowed(&url("/books/OL1M/The_Hobbit"), "Shelfmark"));
        assert!(!robots.is_allowed(&url("/books/add"), "Shelfmark"));
        assert!(!robots.is_allowed(&url("/books/OL1M/borrow"), "Shelfmark"));
    }

    #[test]
    fn test_named_group_replaces_wildcard_rules() {
        let content = "User-agent: *\nDisallow: /*borrow\n\nUser-agent: Shelfmark\nDisallow: /api";
        let robots = RobotsPolicy::from_content(content);
        assert!(!robots.is_allowed(&url("/api/books"), "Shelfmark"));
        assert!(robots.is_allowed(&url("/books/OL1M/borrow"), "Shelfmark"));
        assert!(!robots.is_allowed(&url("/books/OL1M/borrow"), "OtherCrawler"));
    }

    #[test]
    fn test_specific_user_agent() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = RobotsPolicy::from_content(content);
        assert!(robots.is_allowed(&url("/subjects/"), "Shelfmark"));
        assert!(!robots.is_allowed(&url("/subjects/"), "BadBot"));
    }

    #[test]
    fn test_invalid_robots_txt_allows() {
        let robots = RobotsPolicy::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed(&url("/any/path"), "Shelfmark"));
    }

    #[test]
    fn test_crawl_delay_pattern_group() {
        let robots = RobotsPolicy::from_content(OPENLIBRARY);
        assert_eq!(robots.crawl_delay("ShelfmarkBot"), Some(Duration::from_secs(10)));
        assert_eq!(robots.crawl_delay("Shelfmark"), None);
    }

    #[test]
    fn test_crawl_delay_specific_beats_wildcard() {
        let content = "User-agent: Shelfmark\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 12";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("shelfmark"), Some(Duration::from_secs(5)));
        assert_eq!(robots.crawl_delay("OtherCrawler"), Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_crawl_delay_shared_group_and_decimal() {
        let content = "User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 2.5";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("BotB"), Some(Duration::from_millis(2500)));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }
}
