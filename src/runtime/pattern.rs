use regex::Regex;

/// Shell-style glob over resource names: `*` matches any run of
/// characters, `?` a single one. Matching is anchored at both ends; wrap in
/// `*...*` for substring matches.
#[derive(Debug, Clone)]
pub struct NamePattern {
    glob: String,
    regex: Regex,
}

impl NamePattern {
    pub fn new(glob: &str) -> Self {
        let mut source = String::with_capacity(glob.len() + 8);
        source.push('^');
        for ch in glob.chars() {
            match ch {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(&other.to_string())),
            }
        }
        source.push('$');

        Self {
            glob: glob.to_string(),
            regex: Regex::new(&source).expect("escaped glob is a valid regex"),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// True when the pattern names exactly one resource.
    pub fn is_exact(&self) -> bool {
        !self.glob.contains(|c: char| c == '*' || c == '?')
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.glob == other.glob
    }
}

/// A union of [`NamePattern`]s: a name matches when any pattern does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameFilter {
    patterns: Vec<NamePattern>,
}

impl NameFilter {
    pub fn from_patterns<'a>(globs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut filter = Self::default();
        for glob in globs {
            filter.push(NamePattern::new(glob));
        }
        filter
    }

    /// Add a pattern; duplicates are ignored.
    pub fn push(&mut self, pattern: NamePattern) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    pub fn patterns(&self) -> &[NamePattern] {
        &self.patterns
    }
}

impl std::fmt::Display for NameFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let globs: Vec<&str> = self.patterns.iter().map(|p| p.as_str()).collect();
        write!(f, "{}", globs.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_suffix() {
        let p = NamePattern::new("airweave-*");
        assert!(p.matches("airweave-backend"));
        assert!(p.matches("airweave-backend-alt"));
        assert!(!p.matches("my-airweave-backend"));
    }

    #[test]
    fn suffix_pattern_is_narrower() {
        let p = NamePattern::new("airweave-*-alt");
        assert!(p.matches("airweave-db-alt"));
        assert!(!p.matches("airweave-db"));
        assert!(!p.matches("airweave_db_alt"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = NamePattern::new("ghcr.io/org/app:1.0");
        assert!(p.matches("ghcr.io/org/app:1.0"));
        assert!(!p.matches("ghcrxio/org/app:1x0"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let p = NamePattern::new("db?");
        assert!(p.matches("db1"));
        assert!(!p.matches("db"));
        assert!(!p.matches("db12"));
    }

    #[test]
    fn exact_detection() {
        assert!(NamePattern::new("airweave_postgres_data").is_exact());
        assert!(!NamePattern::new("*airweave*").is_exact());
    }

    #[test]
    fn filter_is_union_and_dedups() {
        let mut filter = NameFilter::from_patterns(["a*", "b"]);
        filter.push(NamePattern::new("a*"));
        assert_eq!(filter.patterns().len(), 2);
        assert!(filter.matches("abc"));
        assert!(filter.matches("b"));
        assert!(!filter.matches("bc"));
        assert_eq!(filter.to_string(), "a* | b");
    }
}
