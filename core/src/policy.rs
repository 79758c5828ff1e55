//! Which cached queries an event invalidates.
//!
//! The default policy:
//!
//! | Match                                                 | Keys                                       |
//! |-------------------------------------------------------|--------------------------------------------|
//! | `service == "tickets"` or type starts `tickets.`         | `["admin","tickets"]`, `["tickets"]`        |
//! | `service == "assignments"` or type starts `assignments.` | `["tech","assignments"]`, `["admin","tickets"]` |
//! | every event                                           | `["admin","dashboard"]`, `["subscription"]`, `["payments"]` |
//!
//! The last row refreshes derived views (dashboard counters, subscription
//! and payment pages) on any event, relevant or not. That is coarse but
//! cheap, and it is what the portal relies on today.

use crate::event::GatewayEvent;
use crate::key::{QueryKey, well_known};

/// A service/type match and the keys it invalidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    service: String,
    type_prefix: String,
    keys: Vec<QueryKey>,
}

impl Route {
    /// Whether the event belongs to this route.
    #[must_use]
    pub fn matches(&self, event: &GatewayEvent) -> bool {
        event.is_service(&self.service) || event.has_type_prefix(&self.type_prefix)
    }

    /// Keys invalidated when the route matches.
    #[must_use]
    pub fn keys(&self) -> &[QueryKey] {
        &self.keys
    }
}

/// Maps gateway events to cache invalidations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationPolicy {
    routes: Vec<Route>,
    always: Vec<QueryKey>,
}

impl InvalidationPolicy {
    /// Start an empty policy.
    #[must_use]
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Keys to invalidate for `event`.
    ///
    /// Keys of matching routes come first, in route order, followed by the
    /// unconditional keys. A key is listed once even if several routes name it.
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_core::event::GatewayEvent;
    /// use ashva_realtime_core::policy::InvalidationPolicy;
    ///
    /// let event = GatewayEvent { service: Some("billing".into()), ..Default::default() };
    /// let keys: Vec<String> = InvalidationPolicy::default()
    ///     .keys_for(&event)
    ///     .iter()
    ///     .map(ToString::to_string)
    ///     .collect();
    ///
    /// assert_eq!(keys, [r#"["admin","dashboard"]"#, r#"["subscription"]"#, r#"["payments"]"#]);
    /// ```
    #[must_use]
    pub fn keys_for(&self, event: &GatewayEvent) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = Vec::new();

        let routed = self
            .routes
            .iter()
            .filter(|route| route.matches(event))
            .flat_map(Route::keys);

        for key in routed.chain(&self.always) {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }

        keys
    }

    /// Configured routes.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Default for InvalidationPolicy {
    fn default() -> Self {
        Self::builder()
            .route(
                "tickets",
                "tickets.",
                [well_known::ADMIN_TICKETS, well_known::TICKETS],
            )
            .route(
                "assignments",
                "assignments.",
                [well_known::TECH_ASSIGNMENTS, well_known::ADMIN_TICKETS],
            )
            .always([
                well_known::ADMIN_DASHBOARD,
                well_known::SUBSCRIPTION,
                well_known::PAYMENTS,
            ])
            .build()
    }
}

/// Builder for [`InvalidationPolicy`].
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    routes: Vec<Route>,
    always: Vec<QueryKey>,
}

impl PolicyBuilder {
    /// Invalidate `keys` when the event's service equals `service` or its
    /// type starts with `type_prefix`.
    #[must_use]
    pub fn route<I, K>(mut self, service: impl Into<String>, type_prefix: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<QueryKey>,
    {
        self.routes.push(Route {
            service: service.into(),
            type_prefix: type_prefix.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Invalidate `keys` for every event.
    #[must_use]
    pub fn always<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<QueryKey>,
    {
        self.always.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Finish the policy.
    #[must_use]
    pub fn build(self) -> InvalidationPolicy {
        InvalidationPolicy {
            routes: self.routes,
            always: self.always,
        }
    }
}
