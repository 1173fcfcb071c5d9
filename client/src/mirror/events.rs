//! Push-channel messages from the marketplace service.
//!
//! Messages arrive as `{"type": ..., "data": ..., "room": ...}`. Kinds this
//! client does not know are kept as [`MirrorEvent::Unknown`] rather than
//! rejected, so the service can add kinds without breaking older clients.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MirrorError;
use crate::mirror::models::{Comment, LoanOffer};

/// Raw message as received
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MirrorEvent {
    OfferCreated(LoanOffer),
    OfferUpdated(LoanOffer),
    CommentCreated(Comment),
    Unknown { kind: String, data: Value },
}

impl MirrorEvent {
    pub fn parse(message: &str) -> Result<(Option<String>, MirrorEvent), MirrorError> {
        let envelope: Envelope = serde_json::from_str(message)?;
        let room = envelope.room.clone();
        Ok((room, MirrorEvent::from_envelope(envelope)?))
    }

    pub fn from_envelope(envelope: Envelope) -> Result<MirrorEvent, MirrorError> {
        Ok(match envelope.kind.as_str() {
            "offer_created" => MirrorEvent::OfferCreated(serde_json::from_value(envelope.data)?),
            "offer_updated" => MirrorEvent::OfferUpdated(serde_json::from_value(envelope.data)?),
            "comment_created" => {
                MirrorEvent::CommentCreated(serde_json::from_value(envelope.data)?)
            }
            _ => MirrorEvent::Unknown {
                kind: envelope.kind,
                data: envelope.data,
            },
        })
    }

    pub fn kind(&self) -> &str {
        match self {
            MirrorEvent::OfferCreated(_) => "offer_created",
            MirrorEvent::OfferUpdated(_) => "offer_updated",
            MirrorEvent::CommentCreated(_) => "comment_created",
            MirrorEvent::Unknown { kind, .. } => kind,
        }
    }

    /// Identity used for de-duplication, when the record carries one
    fn identity(&self) -> Option<String> {
        match self {
            MirrorEvent::OfferCreated(offer) => offer.id.clone().or_else(|| offer.offer_address.clone()),
            MirrorEvent::CommentCreated(comment) => comment.id.clone(),
            // Updates carry new content under an existing id
            MirrorEvent::OfferUpdated(_) | MirrorEvent::Unknown { .. } => None,
        }
    }
}

/// Drops events already seen in the same room, e.g. after a reconnect
/// replays history.
#[derive(Debug, Default)]
pub struct EventDeduper {
    seen: HashMap<String, HashSet<(String, String)>>,
}

impl EventDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a (kind, id) pair shows up in `room`. Events
    /// without an identity always pass.
    pub fn first_sighting(&mut self, room: &str, event: &MirrorEvent) -> bool {
        let Some(id) = event.identity() else {
            return true;
        };
        self.seen
            .entry(room.to_string())
            .or_default()
            .insert((event.kind().to_string(), id))
    }

    pub fn forget_room(&mut self, room: &str) {
        self.seen.remove(room);
    }
}
