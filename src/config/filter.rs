//! Project selection.

use std::collections::BTreeSet;

use crate::error::{ConfigError, Result};

/// Which projects a run considers.
///
/// Unselected projects keep their remote resources and snapshots untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProjectFilter {
    /// Every project.
    #[default]
    All,
    /// Only the listed project kennel ids.
    Only(BTreeSet<String>),
}

impl ProjectFilter {
    /// Parses a comma separated list; empty input selects everything.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        let ids: BTreeSet<String> = value
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if ids.is_empty() {
            Self::All
        } else {
            Self::Only(ids)
        }
    }

    /// Returns true if the project is selected.
    #[must_use]
    pub fn matches(&self, project_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(project_id),
        }
    }

    /// Returns true if a subset of projects is selected.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        matches!(self, Self::Only(_))
    }

    /// Checks the filter against the available project ids.
    ///
    /// # Errors
    ///
    /// Returns an error listing the available projects when the filter
    /// matches none of them.
    pub fn ensure_matches<'a>(&self, available: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let Self::Only(ids) = self else {
            return Ok(());
        };
        let mut available: Vec<String> = available.into_iter().map(String::from).collect();
        if available.iter().any(|id| ids.contains(id)) {
            return Ok(());
        }
        available.sort();
        available.dedup();
        Err(ConfigError::FilterMatchedNothing {
            filter: ids.iter().cloned().collect::<Vec<_>>().join(","),
            available,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ProjectFilter::parse(None), ProjectFilter::All);
        assert_eq!(ProjectFilter::parse(Some(" ")), ProjectFilter::All);
        let filter = ProjectFilter::parse(Some("a, b"));
        assert!(filter.matches("a"));
        assert!(filter.matches("b"));
        assert!(!filter.matches("c"));
        assert!(filter.is_filtered());
    }

    #[test]
    fn test_ensure_matches() {
        let filter = ProjectFilter::parse(Some("zzz"));
        let err = filter.ensure_matches(["b", "a"]).unwrap_err();
        assert!(err.to_string().contains("available projects: a, b"));

        tokio_test::assert_ok!(ProjectFilter::parse(Some("a")).ensure_matches(["a"]));
        tokio_test::assert_ok!(ProjectFilter::All.ensure_matches(Vec::<&str>::new()));
    }
}
