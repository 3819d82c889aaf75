//! Entity-kind → store routing.
//!
//! Every store consults the table before touching a table of its own, so an entity can only
//! ever be read from or written to the store it is routed to. Exactly one pair of entity kinds
//! may cross between the two stores: transactional activity events become reporting rows.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Campaign,
    CampaignCycle,
    FieldRepresentative,
    Doctor,
    ShareRecord,
    ActivityEvent,
    ActivityEventReport,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Campaign,
        EntityKind::CampaignCycle,
        EntityKind::FieldRepresentative,
        EntityKind::Doctor,
        EntityKind::ShareRecord,
        EntityKind::ActivityEvent,
        EntityKind::ActivityEventReport,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Campaign => "campaign",
            EntityKind::CampaignCycle => "campaign_cycle",
            EntityKind::FieldRepresentative => "field_representative",
            EntityKind::Doctor => "doctor",
            EntityKind::ShareRecord => "share_record",
            EntityKind::ActivityEvent => "activity_event",
            EntityKind::ActivityEventReport => "activity_event_report",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTarget {
    Transactional,
    Reporting,
}

impl fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTarget::Transactional => f.write_str("transactional"),
            StoreTarget::Reporting => f.write_str("reporting"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("{entity} is routed to the {expected} store, not the {actual} store")]
    WrongStore {
        entity: EntityKind,
        expected: StoreTarget,
        actual: StoreTarget,
    },
    #[error("{entity} has no store route")]
    Unrouted { entity: EntityKind },
    #[error("{from} may not be migrated into {to}")]
    ForbiddenCrossing { from: EntityKind, to: EntityKind },
}

/// Explicit routing table consulted before every read and write.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: BTreeMap<EntityKind, StoreTarget>,
    crossing: (EntityKind, EntityKind),
}

impl RoutingTable {
    /// Campaign configuration, doctors, shares, and raw events live in the transactional store;
    /// the reporting store holds only event reports.
    pub fn standard() -> Self {
        let routes = EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let target = match kind {
                    EntityKind::ActivityEventReport => StoreTarget::Reporting,
                    _ => StoreTarget::Transactional,
                };
                (kind, target)
            })
            .collect();

        Self {
            routes,
            crossing: (EntityKind::ActivityEvent, EntityKind::ActivityEventReport),
        }
    }

    pub fn route(&self, entity: EntityKind) -> Result<StoreTarget, RoutingError> {
        self.routes
            .get(&entity)
            .copied()
            .ok_or(RoutingError::Unrouted { entity })
    }

    /// Fail unless `entity` is routed to `actual`.
    pub fn ensure(&self, entity: EntityKind, actual: StoreTarget) -> Result<(), RoutingError> {
        let expected = self.route(entity)?;
        if expected == actual {
            Ok(())
        } else {
            tracing::error!(%entity, %expected, %actual, "storage routing violation");
            Err(RoutingError::WrongStore {
                entity,
                expected,
                actual,
            })
        }
    }

    /// Fail unless moving `from` rows into `to` rows is the one permitted cross-store migration.
    pub fn ensure_crossing(&self, from: EntityKind, to: EntityKind) -> Result<(), RoutingError> {
        if self.crossing == (from, to)
            && self.route(from)? == StoreTarget::Transactional
            && self.route(to)? == StoreTarget::Reporting
        {
            Ok(())
        } else {
            Err(RoutingError::ForbiddenCrossing { from, to })
        }
    }

    pub fn entities_for(&self, target: StoreTarget) -> Vec<EntityKind> {
        self.routes
            .iter()
            .filter(|(_, routed)| **routed == target)
            .map(|(entity, _)| *entity)
            .collect()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporting_store_only_holds_event_reports() {
        let table = RoutingTable::standard();
        assert_eq!(
            table.entities_for(StoreTarget::Reporting),
            vec![EntityKind::ActivityEventReport]
        );
        assert_eq!(
            table.route(EntityKind::ActivityEvent),
            Ok(StoreTarget::Transactional)
        );
    }

    #[test]
    fn ensure_rejects_writes_to_the_wrong_store() {
        let table = RoutingTable::standard();
        for entity in EntityKind::ALL {
            if entity == EntityKind::ActivityEventReport {
                continue;
            }
            assert_eq!(
                table.ensure(entity, StoreTarget::Reporting),
                Err(RoutingError::WrongStore {
                    entity,
                    expected: StoreTarget::Transactional,
                    actual: StoreTarget::Reporting,
                })
            );
        }
        assert!(table
            .ensure(EntityKind::ActivityEventReport, StoreTarget::Transactional)
            .is_err());
    }

    #[test]
    fn only_activity_events_may_cross_stores() {
        let table = RoutingTable::standard();
        assert!(table
            .ensure_crossing(EntityKind::ActivityEvent, EntityKind::ActivityEventReport)
            .is_ok());
        assert!(table
            .ensure_crossing(EntityKind::ShareRecord, EntityKind::ActivityEventReport)
            .is_err());
        assert!(table
            .ensure_crossing(EntityKind::ActivityEventReport, EntityKind::ActivityEvent)
            .is_err());
    }
}
