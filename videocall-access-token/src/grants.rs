/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Capability grants carried inside an access token.
//!
//! A token holds at most one grant per [`GrantKind`]. On the wire the set is a
//! JSON object keyed by the kind name:
//!
//! ```json
//! { "video": { "roomJoin": true, "room": "standup-2024" } }
//! ```

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Permissions for a video room.
///
/// Field values are not validated here; an empty `room` is legal and it is up
/// to the Media Server to decide what a grant means for a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoGrant {
    /// May create rooms.
    #[serde(skip_serializing_if = "is_false")]
    pub room_create: bool,
    /// May list rooms.
    #[serde(skip_serializing_if = "is_false")]
    pub room_list: bool,
    /// May start recordings.
    #[serde(skip_serializing_if = "is_false")]
    pub room_record: bool,
    /// May administer `room` (kick, mute, update participants).
    #[serde(skip_serializing_if = "is_false")]
    pub room_admin: bool,
    /// Must be `true` for the Media Server to accept the connection.
    #[serde(skip_serializing_if = "is_false")]
    pub room_join: bool,
    /// The room the grant applies to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub room: String,
    #[serde(skip_serializing_if = "is_false")]
    pub can_publish: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub can_subscribe: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub can_publish_data: bool,
    /// Participant is not visible to others in the room.
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Participant is a recorder bot.
    #[serde(skip_serializing_if = "is_false")]
    pub recorder: bool,
}

impl VideoGrant {
    pub fn new(room_join: bool, room: impl Into<String>) -> Self {
        Self {
            room_join,
            room: room.into(),
            ..Self::default()
        }
    }

    pub fn with_room_create(mut self, allowed: bool) -> Self {
        self.room_create = allowed;
        self
    }

    pub fn with_room_list(mut self, allowed: bool) -> Self {
        self.room_list = allowed;
        self
    }

    pub fn with_room_record(mut self, allowed: bool) -> Self {
        self.room_record = allowed;
        self
    }

    pub fn with_room_admin(mut self, allowed: bool) -> Self {
        self.room_admin = allowed;
        self
    }

    pub fn with_can_publish(mut self, allowed: bool) -> Self {
        self.can_publish = allowed;
        self
    }

    pub fn with_can_subscribe(mut self, allowed: bool) -> Self {
        self.can_subscribe = allowed;
        self
    }

    pub fn with_can_publish_data(mut self, allowed: bool) -> Self {
        self.can_publish_data = allowed;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_recorder(mut self, recorder: bool) -> Self {
        self.recorder = recorder;
        self
    }
}

/// The kinds of grant a token can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum GrantKind {
    Video,
}

impl GrantKind {
    /// Claim key used for this kind on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantKind::Video => "video",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "video" => Some(GrantKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single capability grant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Grant {
    Video(VideoGrant),
}

impl Grant {
    pub fn kind(&self) -> GrantKind {
        match self {
            Grant::Video(_) => GrantKind::Video,
        }
    }
}

impl From<VideoGrant> for Grant {
    fn from(grant: VideoGrant) -> Self {
        Grant::Video(grant)
    }
}

/// Grants keyed by kind. Inserting a grant of a kind already present replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantSet {
    grants: BTreeMap<GrantKind, Grant>,
}

impl GrantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a grant, returning the previous grant of the same kind.
    pub fn insert(&mut self, grant: Grant) -> Option<Grant> {
        self.grants.insert(grant.kind(), grant)
    }

    pub fn get(&self, kind: GrantKind) -> Option<&Grant> {
        self.grants.get(&kind)
    }

    pub fn video(&self) -> Option<&VideoGrant> {
        match self.get(GrantKind::Video) {
            Some(Grant::Video(grant)) => Some(grant),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.grants.values()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl FromIterator<Grant> for GrantSet {
    fn from_iter<T: IntoIterator<Item = Grant>>(iter: T) -> Self {
        let mut set = GrantSet::new();
        for grant in iter {
            set.insert(grant);
        }
        set
    }
}

impl Serialize for GrantSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.grants.len()))?;
        for (kind, grant) in &self.grants {
            match grant {
                Grant::Video(video) => map.serialize_entry(kind.as_str(), video)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GrantSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GrantSetVisitor;

        impl<'de> Visitor<'de> for GrantSetVisitor {
            type Value = GrantSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of grant kind to grant")
            }

            fn visit_map<A>(self, mut access: A) -> Result<GrantSet, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut set = GrantSet::new();
                while let Some(key) = access.next_key::<String>()? {
                    match GrantKind::from_name(&key) {
                        Some(GrantKind::Video) => {
                            set.insert(Grant::Video(access.next_value::<VideoGrant>()?));
                        }
                        // Unknown kinds and, in the legacy layout, the standard claims.
                        None => {
                            access.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(GrantSetVisitor)
    }
}
