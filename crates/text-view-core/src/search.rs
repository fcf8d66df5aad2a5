//! Search patterns, matches and replacement text.
//!
//! A pattern is either a regular expression (plain queries are escaped and compiled into one)
//! or a predicate over fonts, which matches maximal runs of characters whose style satisfies it.

use crate::error::SearchError;
use crate::font::Font;
use crate::index::TextRange;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

/// Predicate used by style searches.
pub type FontPredicate = Arc<dyn Fn(&Font) -> bool + Send + Sync>;

/// Options that control how a query is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            regex: false,
        }
    }
}

/// What to look for.
#[derive(Clone)]
pub enum SearchPattern {
    /// A compiled regular expression.
    Regex(Regex),
    /// Runs of characters whose font satisfies the predicate.
    Font(FontPredicate),
}

impl SearchPattern {
    /// Compile a query according to `options`.
    pub fn new(query: &str, options: SearchOptions) -> Result<Self, SearchError> {
        let pattern = if options.regex {
            query.to_string()
        } else {
            regex::escape(query)
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .multi_line(true)
            .build()?;
        Ok(Self::Regex(regex))
    }

    /// Case-sensitive literal query.
    pub fn literal(query: &str) -> Result<Self, SearchError> {
        Self::new(query, SearchOptions::default())
    }

    /// Case-sensitive regular expression.
    pub fn regex(pattern: &str) -> Result<Self, SearchError> {
        Self::new(
            pattern,
            SearchOptions {
                case_sensitive: true,
                regex: true,
            },
        )
    }

    /// Style search.
    pub fn font(predicate: impl Fn(&Font) -> bool + Send + Sync + 'static) -> Self {
        Self::Font(Arc::new(predicate))
    }
}

impl fmt::Debug for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Font(_) => f.write_str("Font(..)"),
        }
    }
}

/// A successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Matched span.
    pub range: TextRange,
    /// Matched text.
    pub text: String,
    /// Capture group texts, group 0 first; empty for style matches.
    pub groups: Vec<Option<String>>,
    /// Capture group names aligned with `groups`.
    pub group_names: Vec<Option<String>>,
}

impl SearchMatch {
    /// A match without capture groups.
    pub fn plain(range: TextRange, text: String) -> Self {
        Self {
            range,
            groups: vec![Some(text.clone())],
            group_names: vec![None],
            text,
        }
    }

    /// Build a match from regex captures.
    pub fn from_captures(range: TextRange, regex: &Regex, caps: &regex::Captures<'_>) -> Self {
        let groups = caps
            .iter()
            .map(|g| g.map(|m| m.as_str().to_string()))
            .collect();
        let group_names = regex
            .capture_names()
            .map(|n| n.map(str::to_string))
            .collect();
        let text = caps
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        Self {
            range,
            text,
            groups,
            group_names,
        }
    }

    fn group(&self, key: &str) -> Option<&str> {
        let index = match key.parse::<usize>() {
            Ok(i) => Some(i),
            Err(_) => self
                .group_names
                .iter()
                .position(|n| n.as_deref() == Some(key)),
        }?;
        self.groups.get(index)?.as_deref()
    }
}

/// Replacement text and how to apply it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Replacement {
    /// Replacement template.
    pub text: String,
    /// Expand `$1`, `${1}`, `${name}` and `$$` from the match's capture groups.
    pub interpolate: bool,
    /// Adapt the replacement's case to the matched text.
    pub preserve_case: bool,
}

impl Replacement {
    /// Literal replacement.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Text to insert in place of `m`.
    pub fn expand(&self, m: &SearchMatch) -> String {
        let text = if self.interpolate {
            interpolate(&self.text, m)
        } else {
            self.text.clone()
        };
        if self.preserve_case {
            match_case(&m.text, &text)
        } else {
            text
        }
    }
}

fn interpolate(template: &str, m: &SearchMatch) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        if let Some(after) = tail.strip_prefix('$') {
            out.push('$');
            rest = after;
        } else if let Some(braced) = tail.strip_prefix('{')
            && let Some(close) = braced.find('}')
        {
            out.push_str(m.group(&braced[..close]).unwrap_or(""));
            rest = &braced[close + 1..];
        } else {
            let len = reference_len(tail);
            if len == 0 {
                out.push('$');
            } else {
                out.push_str(m.group(&tail[..len]).unwrap_or(""));
            }
            rest = &tail[len..];
        }
    }
    out.push_str(rest);
    out
}

fn reference_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_digit() => s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len()),
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => s
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(s.len()),
        _ => 0,
    }
}

/// Adapt `replacement` to the letter case of `source`.
///
/// All-upper and all-lower sources force the same case; a capitalized source capitalizes the
/// replacement. Mixed case leaves the replacement untouched.
pub fn match_case(source: &str, replacement: &str) -> String {
    let letters: Vec<char> = source.chars().filter(|c| c.is_alphabetic()).collect();
    let Some(first) = letters.first() else {
        return replacement.to_string();
    };
    let rest_lower = letters[1..].iter().all(|c| !c.is_uppercase());
    if letters.iter().all(|c| c.is_uppercase()) && letters.len() > 1 {
        replacement.to_uppercase()
    } else if letters.iter().all(|c| c.is_lowercase()) {
        replacement.to_lowercase()
    } else if first.is_uppercase() && rest_lower {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexRange, TextRange};

    fn regex_match(pattern: &str, haystack: &str) -> SearchMatch {
        let re = Regex::new(pattern).unwrap();
        let caps = re.captures(haystack).unwrap();
        SearchMatch::from_captures(
            TextRange::new(IndexRange::new(1, 1), IndexRange::new(1, 1)),
            &re,
            &caps,
        )
    }

    #[test]
    fn literal_queries_are_escaped() {
        let SearchPattern::Regex(re) = SearchPattern::literal("a.b").unwrap() else {
            panic!("expected regex");
        };
        assert!(re.is_match("a.b"));
        assert!(!re.is_match("axb"));
    }

    #[test]
    fn invalid_regex_is_reported() {
        assert!(matches!(
            SearchPattern::regex("(unclosed"),
            Err(SearchError::InvalidPattern(_))
        ));
    }

    #[test]
    fn interpolates_numbered_and_named_groups() {
        let m = regex_match(r"(?P<word>\w+)-(\d+)", "abc-42");
        let r = Replacement {
            text: "$2:${word}$$ $9".into(),
            interpolate: true,
            preserve_case: false,
        };
        assert_eq!(r.expand(&m), "42:abc$ ");
    }

    #[test]
    fn literal_replacement_keeps_dollars() {
        let m = regex_match(r"x", "x");
        assert_eq!(Replacement::literal("$1").expand(&m), "$1");
    }

    #[test]
    fn case_preservation() {
        assert_eq!(match_case("HELLO", "world"), "WORLD");
        assert_eq!(match_case("hello", "World"), "world");
        assert_eq!(match_case("Hello", "wORLD"), "World");
        assert_eq!(match_case("hElLo", "wOrLd"), "wOrLd");
        assert_eq!(match_case("123", "Keep"), "Keep");
    }
}
