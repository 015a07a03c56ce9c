//! Routing Information Base kept by the bridge.
//!
//! `RibTable` records which faces registered which prefixes and with what
//! origin. The FIB itself lives in the forwarding process; every change to
//! the table reports what the caller must withdraw from it.
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;

use crate::{
    ndn::Name,
    tlv::{TlvWriter, types},
};

/// Origin of routes registered by local applications.
pub const ROUTE_ORIGIN_APP: u64 = 0;
/// Route flag propagating the route to longer prefixes.
pub const ROUTE_FLAG_CHILD_INHERIT: u64 = 1;

/// One registration of a prefix towards a face.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Face the prefix is reachable through.
    pub face_id: u64,
    /// Who registered the route.
    pub origin: u64,
    /// Routing cost.
    pub cost: u64,
    /// Route inheritance flags.
    pub flags: u64,
    /// When the route lapses; `None` never expires.
    pub expires_at: Option<Instant>,
}

impl Route {
    /// Time left before the route lapses, measured from `now`.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }

    fn is_expired(&self, now: Instant) -> bool { self.expires_at.is_some_and(|at| at <= now) }
}

/// A route taken out of the table and the FIB work it implies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawn {
    /// Prefix the route was registered for.
    pub name: Name,
    /// Face of the removed route.
    pub face_id: u64,
    /// Another origin still routes `name` through the same face, so the
    /// FIB next hop must stay.
    pub face_still_routed: bool,
    /// No routes remain for `name`.
    pub entry_empty: bool,
}

/// Concurrent RIB keyed by prefix.
#[derive(Debug, Default)]
pub struct RibTable(DashMap<Name, Vec<Route>>);

impl RibTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Add or replace the route of `route.face_id` and `route.origin` for
    /// `name`.
    pub fn insert(&self, name: Name, route: Route) {
        let mut routes = self.0.entry(name).or_default();
        match routes
            .iter()
            .position(|r| r.face_id == route.face_id && r.origin == route.origin)
        {
            Some(index) => routes[index] = route,
            None => routes.push(route),
        }
    }

    /// Remove the route matching `face_id` and `origin` for `name`.
    ///
    /// Returns `None` when no such route exists.
    pub fn remove(&self, name: &Name, face_id: u64, origin: u64) -> Option<Withdrawn> {
        let withdrawn = {
            let mut routes = self.0.get_mut(name)?;
            let position = routes
                .iter()
                .position(|r| r.face_id == face_id && r.origin == origin)?;
            routes.remove(position);
            Withdrawn {
                name: name.clone(),
                face_id,
                face_still_routed: routes.iter().any(|r| r.face_id == face_id),
                entry_empty: routes.is_empty(),
            }
        };
        if withdrawn.entry_empty {
            self.0.remove_if(name, |_, routes| routes.is_empty());
        }
        Some(withdrawn)
    }

    /// Remove every route through `face_id`.
    pub fn clean_up_face(&self, face_id: u64) -> Vec<Withdrawn> {
        self.withdraw_where(|route| route.face_id == face_id)
    }

    /// Remove every route whose expiration has passed at `now`.
    pub fn purge_expired(&self, now: Instant) -> Vec<Withdrawn> {
        self.withdraw_where(|route| route.is_expired(now))
    }

    fn withdraw_where(&self, doomed: impl Fn(&Route) -> bool) -> Vec<Withdrawn> {
        let mut withdrawn = Vec::new();
        // `retain` holds each shard's write lock while the closure runs.
        self.0.retain(|name, routes| {
            let before = withdrawn.len();
            let mut kept = Vec::with_capacity(routes.len());
            let mut removed_faces = Vec::new();
            for route in routes.drain(..) {
                if doomed(&route) {
                    removed_faces.push(route.face_id);
                } else {
                    kept.push(route);
                }
            }
            removed_faces.sort_unstable();
            removed_faces.dedup();
            for face_id in removed_faces {
                withdrawn.push(Withdrawn {
                    name: name.clone(),
                    face_id,
                    face_still_routed: kept.iter().any(|r| r.face_id == face_id),
                    entry_empty: kept.is_empty(),
                });
            }
            *routes = kept;
            if withdrawn.len() > before {
                tracing::debug!(name = %name, remaining = routes.len(), "withdrew routes");
            }
            !routes.is_empty()
        });
        withdrawn
    }

    /// Routes currently registered for `name`.
    #[must_use]
    pub fn routes(&self, name: &Name) -> Vec<Route> {
        self.0.get(name).map(|routes| routes.clone()).unwrap_or_default()
    }

    /// Number of prefixes with at least one route.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether the table holds no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Encode the table as concatenated `RibEntry` elements ordered by name.
    #[must_use]
    pub fn encode_dataset(&self, now: Instant) -> Bytes {
        let mut entries: Vec<(Name, Vec<Route>)> = self
            .0
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = TlvWriter::new();
        for (name, routes) in entries {
            out.put_nested(types::RIB_ENTRY, |entry| {
                entry.put_block(&name.to_block());
                for route in &routes {
                    entry.put_nested(types::ROUTE, |fields| {
                        fields
                            .put_nni(types::FACE_ID, route.face_id)
                            .put_nni(types::ORIGIN, route.origin)
                            .put_nni(types::COST, route.cost)
                            .put_nni(types::FLAGS, route.flags)
                            .put_opt_nni(
                                types::EXPIRATION_PERIOD,
                                route.remaining(now).map(millis),
                            );
                    });
                }
            });
        }
        out.into_bytes()
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
