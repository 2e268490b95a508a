//! Errors reported by desk session operations.

use crate::model::handle::{BagId, BagRef, EntityKind, EntityRef, Epoch, Placement};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by desk session operations.
pub type DeskResult<T> = Result<T, DeskError>;

/// Errors from desk session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskError {
    /// Insert/invert operand is not directly on the desk.
    NotOnDesk {
        entity: EntityRef,
        placement: Placement,
    },
    /// Insert target bag is not directly on the desk.
    TargetNotOnDesk { bag: BagRef, placement: Placement },
    /// A bag cannot be inserted into itself.
    SelfInsert(BagRef),
    /// A bag cannot be inserted into a bag nested inside it.
    CycleInsert { inner: BagRef, target: BagRef },
    /// Remove operand is not directly inside a bag lying on the desk.
    NotInDeskBag {
        entity: EntityRef,
        placement: Placement,
    },
    /// Handle was issued by another desk or before the last teardown.
    StaleHandle {
        entity: EntityRef,
        current_epoch: Epoch,
    },
    /// The arena for this entity kind cannot grow further.
    CapacityExhausted(EntityKind),
    /// Audit found a recorded total that differs from the traversal count.
    AggregateMismatch {
        at: Placement,
        recorded: u64,
        expected: u64,
    },
    /// Audit found a bag whose cached contribution is out of step.
    ContributionMismatch {
        bag: BagId,
        contribution: u64,
        expected: u64,
    },
    /// Audit found a record whose back-reference disagrees with the list
    /// it is linked into, a bag reachable twice, or an entity the desk
    /// cannot reach.
    MembershipMismatch { kind: EntityKind, slot: u32 },
}

impl Display for DeskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOnDesk { entity, placement } => write!(
                f,
                "precondition violated: {entity} is not on the desk (found in {placement})"
            ),
            Self::TargetNotOnDesk { bag, placement } => write!(
                f,
                "precondition violated: target {bag} is not on the desk (found in {placement})"
            ),
            Self::SelfInsert(bag) => write!(f, "cannot insert {bag} into itself"),
            Self::CycleInsert { inner, target } => {
                write!(f, "cannot insert {inner} into {target}, which it contains")
            }
            Self::NotInDeskBag { entity, placement } => write!(
                f,
                "precondition violated: {entity} is not inside a bag on the desk (found in {placement})"
            ),
            Self::StaleHandle {
                entity,
                current_epoch,
            } => write!(
                f,
                "stale handle: {entity} from epoch {} used in epoch {current_epoch}",
                entity.epoch()
            ),
            Self::CapacityExhausted(kind) => write!(f, "no room for another {kind}"),
            Self::AggregateMismatch {
                at,
                recorded,
                expected,
            } => write!(
                f,
                "aggregate mismatch at {at}: recorded {recorded}, counted {expected}"
            ),
            Self::ContributionMismatch {
                bag,
                contribution,
                expected,
            } => write!(
                f,
                "contribution mismatch for bag {bag}: cached {contribution}, counted {expected}"
            ),
            Self::MembershipMismatch { kind, slot } => {
                write!(f, "membership mismatch for {kind} slot {slot}")
            }
        }
    }
}

impl Error for DeskError {}

impl DeskError {
    /// Whether this error rejects a caller precondition (no state changed).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotOnDesk { .. }
                | Self::TargetNotOnDesk { .. }
                | Self::SelfInsert(_)
                | Self::CycleInsert { .. }
                | Self::NotInDeskBag { .. }
        )
    }
}
