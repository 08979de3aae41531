//! Idempotent tag management and internal notes.
//!
//! Every mutation here is read-then-conditionally-write. Nothing locks the
//! order upstream, so two concurrent callers can both see a tag as absent and
//! both add it; at-most-one-tag holds only when calls are serialized.

use crate::client::ShipStation;
use crate::error::{Result, WarehouseError};
use crate::models::{Order, OrderStatus, Tag};
use crate::transport::Transport;
use serde::Serialize;

pub const RUSH_TAG: &str = "RUSH";
pub const NOTE_TAG: &str = "Special NOTE!";

/// Result of ensuring a tag is on an order
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TagOutcome {
    /// One write was issued
    Added { order: Order, tag: Tag },
    /// The tag was already there; nothing was written
    AlreadyPresent { order: Order, tag: Tag },
}

impl TagOutcome {
    pub fn order(&self) -> &Order {
        match self {
            TagOutcome::Added { order, .. } | TagOutcome::AlreadyPresent { order, .. } => order,
        }
    }

    pub fn tag(&self) -> &Tag {
        match self {
            TagOutcome::Added { tag, .. } | TagOutcome::AlreadyPresent { tag, .. } => tag,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, TagOutcome::Added { .. })
    }

    pub fn into_order(self) -> Order {
        match self {
            TagOutcome::Added { order, .. } | TagOutcome::AlreadyPresent { order, .. } => order,
        }
    }
}

/// Result of appending an internal note
#[derive(Debug, Clone, Serialize)]
pub struct NoteOutcome {
    pub order: Order,
    /// `None` when the account has no note tag defined
    pub note_tag: Option<TagOutcome>,
}

/// Rush only makes sense before the order ships
pub fn check_rushable(order: &Order) -> Result<()> {
    if order.status == OrderStatus::AwaitingShipment {
        Ok(())
    } else {
        Err(WarehouseError::NotAwaitingShipment {
            number: order.order_number.clone(),
            status: order.status.to_string(),
            action: "rush",
        })
    }
}

impl<T: Transport> ShipStation<T> {
    /// Find a tag by exact, case-sensitive name
    pub fn resolve_tag(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WarehouseError::InvalidInput("tag name is empty".to_string()));
        }
        self.list_tags()?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| WarehouseError::TagNotFound(name.to_string()))
    }

    /// Attach `tag` to an order the caller has just read. No write when the
    /// tag is already present.
    ///
    /// If the write fails the error is returned and `order` is stale; re-read
    /// it to learn the real state.
    pub fn apply_tag(&self, order: Order, tag: Tag) -> Result<TagOutcome> {
        if order.has_tag(tag.tag_id) {
            tracing::info!(
                order_number = %order.order_number,
                tag = %tag.name,
                "tag already present, skipping write"
            );
            return Ok(TagOutcome::AlreadyPresent { order, tag });
        }
        self.add_tag(order.order_id, tag.tag_id)?;
        Ok(TagOutcome::Added {
            order: order.with_tag(tag.tag_id),
            tag,
        })
    }

    /// Make sure the order numbered `order_number` carries `tag_name` exactly
    /// once. Repeating the call has no further effect.
    pub fn ensure_tag(&self, order_number: &str, tag_name: &str) -> Result<TagOutcome> {
        let _span =
            tracing::info_span!("ensure_tag", order_number = %order_number, tag = %tag_name).entered();
        let tag = self.resolve_tag(tag_name)?;
        let order = self.get_order(order_number)?;
        self.apply_tag(order, tag)
    }

    /// Add the RUSH tag to an order awaiting shipment
    pub fn mark_rush(&self, order: Order) -> Result<TagOutcome> {
        check_rushable(&order)?;
        let tag = self.resolve_tag(RUSH_TAG)?;
        self.apply_tag(order, tag)
    }

    /// `mark_rush` by order number
    pub fn mark_rush_by_number(&self, order_number: &str) -> Result<TagOutcome> {
        let order = self.get_order(order_number)?;
        self.mark_rush(order)
    }

    /// Tag the order with the note tag (skipped if the account lacks one)
    /// and append `note` to its internal notes
    pub fn add_note(&self, order: Order, note: &str) -> Result<NoteOutcome> {
        let note = note.trim();
        if note.is_empty() {
            return Err(WarehouseError::InvalidInput("note is empty".to_string()));
        }

        let (order, note_tag) = match self.resolve_tag(NOTE_TAG) {
            Ok(tag) => {
                let outcome = self.apply_tag(order, tag)?;
                (outcome.order().clone(), Some(outcome))
            }
            Err(WarehouseError::TagNotFound(_)) => {
                tracing::warn!(tag = NOTE_TAG, "note tag not defined in account, skipping");
                (order, None)
            }
            Err(e) => return Err(e),
        };

        let updated = self.update_order(&order.with_note(note))?;
        Ok(NoteOutcome {
            order: updated,
            note_tag,
        })
    }

    /// `add_note` by order number
    pub fn add_note_by_number(&self, order_number: &str, note: &str) -> Result<NoteOutcome> {
        let order = self.get_order(order_number)?;
        self.add_note(order, note)
    }
}
