//! Hierarchical query keys.
//!
//! A [`QueryKey`] is an ordered list of string segments identifying a family
//! of cached query results, e.g. `["admin", "tickets"]`. Invalidation works on
//! prefixes: invalidating `["tickets"]` affects `["tickets"]`,
//! `["tickets", "42"]` and `["tickets", "list", "open"]`.

use smallvec::SmallVec;
use std::fmt;

/// Keys the default invalidation policy touches.
pub mod well_known {
    /// Admin ticket board.
    pub const ADMIN_TICKETS: &[&str] = &["admin", "tickets"];
    /// Customer ticket views.
    pub const TICKETS: &[&str] = &["tickets"];
    /// Technician assignment lists.
    pub const TECH_ASSIGNMENTS: &[&str] = &["tech", "assignments"];
    /// Admin dashboard cards.
    pub const ADMIN_DASHBOARD: &[&str] = &["admin", "dashboard"];
    /// Customer subscription page.
    pub const SUBSCRIPTION: &[&str] = &["subscription"];
    /// Payment history.
    pub const PAYMENTS: &[&str] = &["payments"];
}

/// Ordered sequence of key segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(SmallVec<[String; 2]>);

impl QueryKey {
    /// Build a key from its segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_core::key::QueryKey;
    ///
    /// let key = QueryKey::new(["admin", "tickets"]);
    /// assert_eq!(key.segments(), ["admin", "tickets"]);
    /// ```
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The key segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` for the empty key, which is a prefix of every key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `other` starts with this key, segment by segment.
    ///
    /// A key is a prefix of itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_core::key::QueryKey;
    ///
    /// let tickets = QueryKey::from(["tickets"]);
    /// assert!(tickets.is_prefix_of(&QueryKey::from(["tickets", "42"])));
    /// assert!(!tickets.is_prefix_of(&QueryKey::from(["admin", "tickets"])));
    /// ```
    #[must_use]
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Return a new key with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for QueryKey {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<&[&str]> for QueryKey {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{segment:?}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let admin = QueryKey::from(["admin"]);
        let admin_tickets = QueryKey::from(well_known::ADMIN_TICKETS);
        let admin_ticket = admin_tickets.child("17");

        assert!(admin.is_prefix_of(&admin_tickets));
        assert!(admin_tickets.is_prefix_of(&admin_ticket));
        assert!(admin_tickets.is_prefix_of(&admin_tickets));
        assert!(!admin_ticket.is_prefix_of(&admin_tickets));
        assert!(QueryKey::default().is_prefix_of(&admin));
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        // "ticket" is a string prefix of "tickets" but not a segment prefix
        let ticket = QueryKey::from(["ticket"]);
        assert!(!ticket.is_prefix_of(&QueryKey::from(well_known::TICKETS)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            QueryKey::from(["tech", "assignments"]).to_string(),
            r#"["tech","assignments"]"#
        );
        assert_eq!(QueryKey::default().to_string(), "[]");
    }
}
