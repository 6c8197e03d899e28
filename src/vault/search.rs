//! Account search over name, username and url.
//!
//! A query that looks like a regular expression and compiles is tried as
//! a case-insensitive regex first.  Every account is also checked with a
//! case-insensitive subsequence match ("gml" finds "gmail"), so a query
//! such as `a.b` still finds `aXb` and `a.b.c`.

use regex::{Regex, RegexBuilder};

use super::model::{Account, VaultModel};

const REGEX_METACHARS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// A compiled search query.
#[derive(Debug, Clone)]
pub struct Matcher {
    needle: String,
    regex: Option<Regex>,
}

impl Matcher {
    /// Surrounding whitespace is dropped, so a blank query matches all.
    pub fn new(query: &str) -> Self {
        let query = query.trim();
        let regex = if query.contains(REGEX_METACHARS) {
            RegexBuilder::new(query).case_insensitive(true).build().ok()
        } else {
            None
        };
        Self {
            needle: query.to_lowercase(),
            regex,
        }
    }

    pub fn is_regex(&self) -> bool {
        self.regex.is_some()
    }

    pub fn matches(&self, account: &Account) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let fields = [&account.name, &account.username, &account.url];

        if let Some(regex) = &self.regex {
            if fields.iter().any(|f| regex.is_match(f)) {
                return true;
            }
        }
        fields
            .iter()
            .any(|f| fuzzy_match(&self.needle, &f.to_lowercase()))
    }
}

/// `true` if the characters of `pattern` appear in `text` in order.
/// Both sides are expected to be lowercased already.
pub fn fuzzy_match(pattern: &str, text: &str) -> bool {
    let mut wanted = pattern.chars().peekable();
    for c in text.chars() {
        match wanted.peek() {
            Some(&w) if w == c => {
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    wanted.peek().is_none()
}

/// Accounts matching `query`, optionally restricted to one group, in
/// stored order.
pub fn search<'a>(model: &'a VaultModel, query: &str, group: Option<&str>) -> Vec<&'a Account> {
    let matcher = Matcher::new(query);
    model
        .accounts
        .iter()
        .filter(|a| group.map_or(true, |g| a.group() == Some(g)))
        .filter(|a| matcher.matches(a))
        .collect()
}
