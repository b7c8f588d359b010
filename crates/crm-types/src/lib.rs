//! Shared types for the CRM backend.
//!
//! Holds the closed vocabularies that more than one crate needs to agree
//! on: the kinds of record an audit event can be attached to, and the
//! built-in event-kind names raised by business operations.
//!
//! Event kinds are deliberately *open* at the storage layer (new names are
//! registered lazily), so [`ActivityKind`] only lists the names this code
//! base emits itself. Anything else is passed around as a plain string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The type of record an activity event refers to.
///
/// Stored in the `entity_type` column of `activity_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// A customer account.
    #[serde(rename = "Account")]
    Account,
}

impl EntityType {
    /// Returns the canonical string label stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "Account",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = ParseEntityTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Account" => Ok(Self::Account),
            _ => Err(ParseEntityTypeError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown entity type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity type: {0}")]
pub struct ParseEntityTypeError(pub String);

/// Event kinds raised by the account, contact, and demo workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    // ── Account key fields ───────────────────────────────────────────
    LeadSourceChanged,
    DealStageChanged,
    DecisionMakersChanged,

    // ── Contact lifecycle ────────────────────────────────────────────
    ContactAdded,
    ContactUpdated,
    ContactDeleted,

    // ── Demo lifecycle ───────────────────────────────────────────────
    DemoScheduled,
    DemoUpdated,
    DemoCompleted,
    DemoCancelled,
}

impl ActivityKind {
    /// Every built-in kind, in declaration order.
    pub const ALL: [ActivityKind; 10] = [
        Self::LeadSourceChanged,
        Self::DealStageChanged,
        Self::DecisionMakersChanged,
        Self::ContactAdded,
        Self::ContactUpdated,
        Self::ContactDeleted,
        Self::DemoScheduled,
        Self::DemoUpdated,
        Self::DemoCompleted,
        Self::DemoCancelled,
    ];

    /// Returns the registry name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeadSourceChanged => "LEAD_SOURCE_CHANGED",
            Self::DealStageChanged => "DEAL_STAGE_CHANGED",
            Self::DecisionMakersChanged => "DECISION_MAKERS_CHANGED",
            Self::ContactAdded => "CONTACT_ADDED",
            Self::ContactUpdated => "CONTACT_UPDATED",
            Self::ContactDeleted => "CONTACT_DELETED",
            Self::DemoScheduled => "DEMO_SCHEDULED",
            Self::DemoUpdated => "DEMO_UPDATED",
            Self::DemoCompleted => "DEMO_COMPLETED",
            Self::DemoCancelled => "DEMO_CANCELLED",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = ParseActivityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseActivityKindError(s.to_string()))
    }
}

/// Error returned when a string is not one of the built-in [`ActivityKind`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown activity kind: {0}")]
pub struct ParseActivityKindError(pub String);
