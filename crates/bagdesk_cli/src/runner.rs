//! Executes parsed script commands against one `Desk`.
//!
//! # Responsibility
//! - Map script tokens to live handles.
//! - Render each command result as one output block.
//!
//! # Invariants
//! - `i<N>` is the N-th item created since the last teardown; `b<N>` is the
//!   bag whose id is N. Both tables reset on teardown.

use crate::script::{Command, Target};
use bagdesk_core::{BagRef, Desk, DeskConfig, DeskError, EntityRef, ItemRef};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from running one command.
#[derive(Debug)]
pub enum RunError {
    /// Token does not name an entity created in this session.
    UnknownHandle(Target),
    /// Desk rejected the operation.
    Desk(DeskError),
    /// Snapshot could not be encoded.
    Encode(serde_json::Error),
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownHandle(target) => write!(f, "unknown handle `{target}`"),
            Self::Desk(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "snapshot encode failed: {err}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownHandle(_) => None,
            Self::Desk(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DeskError> for RunError {
    fn from(value: DeskError) -> Self {
        Self::Desk(value)
    }
}

/// Script interpreter state.
pub struct Runner {
    desk: Desk,
    items: Vec<ItemRef>,
    bags: Vec<BagRef>,
}

impl Runner {
    pub fn new(config: DeskConfig) -> Self {
        Self {
            desk: Desk::with_config(config),
            items: Vec::new(),
            bags: Vec::new(),
        }
    }

    /// Runs one command and returns its printable output.
    pub fn execute(&mut self, command: Command) -> Result<String, RunError> {
        match command {
            Command::Item => {
                let item = self.desk.create_item()?;
                self.items.push(item);
                Ok(format!("i{}", item.ordinal()))
            }
            Command::Bag => {
                let bag = self.desk.create_bag()?;
                self.bags.push(bag);
                Ok(format!("b{}", bag.id()))
            }
            Command::Insert { entity, bag } => {
                let entity = self.entity(entity)?;
                let bag = self.bag(bag)?;
                self.desk.insert(entity, bag)?;
                Ok("ok".to_string())
            }
            Command::Remove(entity) => {
                let entity = self.entity(entity)?;
                self.desk.remove(entity)?;
                Ok("ok".to_string())
            }
            Command::Locate(entity) => {
                let entity = self.entity(entity)?;
                Ok(self.desk.locate(entity)?.to_raw().to_string())
            }
            Command::Count(bag) => {
                let bag = self.bag(bag)?;
                Ok(self.desk.count(bag)?.to_string())
            }
            Command::Invert(bag) => {
                let bag = self.bag(bag)?;
                self.desk.invert(bag)?;
                Ok("ok".to_string())
            }
            Command::Total => Ok(self.desk.desk_total().to_string()),
            Command::Dump => {
                let snapshot = self.desk.snapshot()?;
                serde_json::to_string_pretty(&snapshot).map_err(RunError::Encode)
            }
            Command::Audit => {
                let report = self.desk.audit()?;
                Ok(format!(
                    "audit ok locations={} bags={} items={}",
                    report.locations_visited, report.bags_visited, report.items_counted
                ))
            }
            Command::Teardown => {
                self.desk.teardown();
                self.items.clear();
                self.bags.clear();
                Ok("ok".to_string())
            }
        }
    }

    fn entity(&self, target: Target) -> Result<EntityRef, RunError> {
        match target {
            Target::Item(index) => self
                .items
                .get(index as usize)
                .copied()
                .map(EntityRef::from)
                .ok_or(RunError::UnknownHandle(target)),
            Target::Bag(index) => self.bag(index).map(EntityRef::from),
        }
    }

    fn bag(&self, index: u32) -> Result<BagRef, RunError> {
        self.bags
            .get(index as usize)
            .copied()
            .ok_or(RunError::UnknownHandle(Target::Bag(index)))
    }
}
