//! Decide which discovered log groups are subject to reconciliation.
//!
//! Exemption wins over pattern matching: an exempt name is dropped even when
//! it matches. Everything else is kept only if it matches a name pattern.

use std::collections::{BTreeSet, HashMap};

use crate::{
    config::{NamePatterns, RetentionConfig},
    discovery::GroupRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Name is on the omit list.
    Exempt,
    /// Name matches no pattern.
    Unmatched,
    /// Subject to reconciliation.
    Matched { has_retention: bool },
}

/// Matched log groups keyed by name, with whether each has a retention policy.
///
/// Inserting a name twice keeps the later observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationSet {
    entries: HashMap<String, bool>,
}

impl ReconciliationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, has_retention: bool) -> Option<bool> {
        self.entries.insert(name.into(), has_retention)
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names lacking a retention policy, sorted.
    pub fn pending(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, has_retention)| !**has_retention)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of entries that already have a retention policy.
    pub fn retained(&self) -> usize {
        self.entries.values().filter(|has| **has).count()
    }
}

/// Result of classifying a full discovery listing.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub set: ReconciliationSet,
    pub exempt: usize,
    pub unmatched: usize,
}

pub struct Classifier<'a> {
    exempt_names: &'a BTreeSet<String>,
    patterns: &'a NamePatterns,
}

impl<'a> Classifier<'a> {
    pub fn new(exempt_names: &'a BTreeSet<String>, patterns: &'a NamePatterns) -> Self {
        Self {
            exempt_names,
            patterns,
        }
    }

    pub fn from_config(config: &'a RetentionConfig) -> Self {
        Self::new(&config.exempt_names, &config.name_patterns)
    }

    pub fn classify(&self, record: &GroupRecord) -> Classification {
        if self.exempt_names.contains(&record.name) {
            Classification::Exempt
        } else if self.patterns.is_match(&record.name) {
            Classification::Matched {
                has_retention: record.has_retention,
            }
        } else {
            Classification::Unmatched
        }
    }

    /// Classify every record, collecting matched ones into a [`ReconciliationSet`].
    pub fn build_set(&self, records: &[GroupRecord]) -> Classified {
        let mut classified = Classified::default();

        for record in records {
            match self.classify(record) {
                Classification::Exempt => classified.exempt += 1,
                Classification::Unmatched => classified.unmatched += 1,
                Classification::Matched { has_retention } => {
                    classified.set.insert(record.name.clone(), has_retention);
                }
            }
        }

        classified
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn exempt(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn lambda_patterns() -> NamePatterns {
        NamePatterns::compile(["/aws/lambda/"]).unwrap()
    }

    #[rstest]
    #[case("/aws/lambda/keep-me", false, Classification::Exempt)]
    #[case("/aws/lambda/keep-me", true, Classification::Exempt)]
    #[case("/aws/lambda/a", false, Classification::Matched { has_retention: false })]
    #[case("/aws/lambda/b", true, Classification::Matched { has_retention: true })]
    #[case("/other/x", false, Classification::Unmatched)]
    #[case("prefix/aws/lambda/x", false, Classification::Matched { has_retention: false })]
    fn test_classify(
        #[case] name: &str,
        #[case] has_retention: bool,
        #[case] expected: Classification,
    ) {
        let exempt_names = exempt(&["/aws/lambda/keep-me"]);
        let patterns = lambda_patterns();
        let classifier = Classifier::new(&exempt_names, &patterns);

        assert_eq!(
            classifier.classify(&GroupRecord::new(name, has_retention)),
            expected
        );
    }

    #[test]
    fn test_exempt_even_without_pattern_match() {
        let exempt_names = exempt(&["/other/x"]);
        let patterns = lambda_patterns();
        let classifier = Classifier::new(&exempt_names, &patterns);
        assert_eq!(
            classifier.classify(&GroupRecord::new("/other/x", false)),
            Classification::Exempt
        );
    }

    #[test]
    fn test_exemption_is_exact_match() {
        let exempt_names = exempt(&["/aws/lambda/keep"]);
        let patterns = lambda_patterns();
        let classifier = Classifier::new(&exempt_names, &patterns);
        assert_eq!(
            classifier.classify(&GroupRecord::new("/aws/lambda/keep-me", false)),
            Classification::Matched {
                has_retention: false
            }
        );
    }

    #[test]
    fn test_later_pattern_can_match() {
        let exempt_names = BTreeSet::new();
        let patterns = NamePatterns::compile(["^/ecs/", "/aws/lambda/"]).unwrap();
        let classifier = Classifier::new(&exempt_names, &patterns);
        assert!(matches!(
            classifier.classify(&GroupRecord::new("/aws/lambda/fn", false)),
            Classification::Matched { .. }
        ));
    }

    #[test]
    fn test_empty_patterns_include_nothing() {
        let exempt_names = BTreeSet::new();
        let patterns = NamePatterns::default();
        let classifier = Classifier::new(&exempt_names, &patterns);

        let classified = classifier.build_set(&[
            GroupRecord::new("/aws/lambda/a", false),
            GroupRecord::new("", false),
        ]);
        assert!(classified.set.is_empty());
        assert_eq!(classified.unmatched, 2);
    }

    #[test]
    fn test_build_set_counts() {
        let exempt_names = exempt(&["/aws/lambda/keep-me"]);
        let patterns = lambda_patterns();
        let classifier = Classifier::new(&exempt_names, &patterns);

        let classified = classifier.build_set(&[
            GroupRecord::new("/aws/lambda/keep-me", false),
            GroupRecord::new("/aws/lambda/a", false),
            GroupRecord::new("/aws/lambda/b", true),
            GroupRecord::new("/other/x", false),
        ]);

        assert_eq!(classified.exempt, 1);
        assert_eq!(classified.unmatched, 1);
        assert_eq!(classified.set.len(), 2);
        assert_eq!(classified.set.retained(), 1);
        assert_eq!(classified.set.pending(), vec!["/aws/lambda/a".to_string()]);
    }

    #[test]
    fn test_last_observation_wins() {
        let mut set = ReconciliationSet::new();
        assert_eq!(set.insert("/aws/lambda/a", false), None);
        assert_eq!(set.insert("/aws/lambda/a", true), Some(false));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("/aws/lambda/a"), Some(true));
        assert!(set.pending().is_empty());
    }

    #[test]
    fn test_pending_is_sorted() {
        let mut set = ReconciliationSet::new();
        set.insert("c", false);
        set.insert("a", false);
        set.insert("b", true);
        assert_eq!(set.pending(), vec!["a".to_string(), "c".to_string()]);
    }
}
