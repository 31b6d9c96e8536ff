use regex::Regex;

use crate::error::AppError;

#[derive(Debug)]
enum NameMatcher {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Pattern(Regex),
}

impl NameMatcher {
    fn parse(entry: &str) -> Result<Self, AppError> {
        if entry.len() >= 2 && entry.starts_with('/') && entry.ends_with('/') {
            return Ok(NameMatcher::Pattern(Regex::new(&entry[1..entry.len() - 1])?));
        }

        let leading = entry.starts_with('*');
        let trailing = entry.len() > 1 && entry.ends_with('*');
        let matcher = match (leading, trailing) {
            (true, true) => NameMatcher::Contains(entry[1..entry.len() - 1].to_string()),
            (true, false) => NameMatcher::Suffix(entry[1..].to_string()),
            (false, true) => NameMatcher::Prefix(entry[..entry.len() - 1].to_string()),
            (false, false) => NameMatcher::Exact(entry.to_string()),
        };
        Ok(matcher)
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Exact(s) => name == s,
            NameMatcher::Prefix(s) => name.starts_with(s.as_str()),
            NameMatcher::Suffix(s) => name.ends_with(s.as_str()),
            NameMatcher::Contains(s) => name.contains(s.as_str()),
            NameMatcher::Pattern(re) => re.is_match(name),
        }
    }
}

/// Selects packages by name for multi-package runs.
///
/// Entries are comma separated: `foo*`, `*foo` and `*foo*` are wildcards,
/// `/re/` is a regular expression, anything else must match exactly.
#[derive(Debug)]
pub struct PackageNameFilter {
    matchers: Vec<NameMatcher>,
}

impl PackageNameFilter {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let matchers = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(NameMatcher::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(name))
    }
}
