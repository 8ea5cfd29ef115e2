#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maverick spawn scheduling engine.
//!
//! This crate defines the vocabulary that connects the level loader, the
//! authoritative world, and the spawning system. Triggers construct [`Spawn`]
//! values pairing an entity handle with a [`Properties`] bag, the world
//! registers those entities and reports their liveness through
//! [`Lifecycle`], and bus [`Event`] values carry keyed notifications that
//! event-driven triggers react to. Spatial conditions are expressed with
//! [`Shape`] overlap tests against the bounds reported by a [`Camera`].

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

mod shape;

pub use shape::{Circle, Polygon, Rect, Shape};

/// Liveness contract implemented by every entity handle a trigger can spawn.
pub trait Lifecycle {
    /// Reports whether the entity has died and may be replaced by a respawn.
    fn is_dead(&self) -> bool;
}

/// Supplies the region of the world currently visible to the player.
pub trait Camera {
    /// Current bounds of the camera, possibly rotated.
    fn bounds(&self) -> Shape;
}

/// Entity constructed by a trigger, waiting to be registered with the world.
#[derive(Clone, Debug)]
pub struct Spawn<E> {
    entity: E,
    properties: Properties,
}

impl<E> Spawn<E> {
    /// Pairs an unregistered entity with the properties it is initialised from.
    #[must_use]
    pub fn new(entity: E, properties: Properties) -> Self {
        Self { entity, properties }
    }

    /// Entity handle carried by the spawn.
    #[must_use]
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Initialisation properties carried by the spawn.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Splits the spawn into its entity handle and property bag.
    #[must_use]
    pub fn into_parts(self) -> (E, Properties) {
        (self.entity, self.properties)
    }
}

/// Single value stored in a [`Properties`] bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Free-form text.
    Text(String),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
        }
    }
}

/// Ordered, string-keyed property bag used to initialise spawned entities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bag with the provided entry added, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Stores a value under the provided key, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let _ = self.0.insert(key.into(), value.into());
    }

    /// Copies every entry of `other` into this bag, overwriting shared keys.
    pub fn extend(&mut self, other: &Properties) {
        self.0
            .extend(other.0.iter().map(|(key, value)| (key.clone(), value.clone())));
    }

    /// Looks up the raw value stored under the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Looks up a boolean value.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Looks up an integer value.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            PropertyValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Looks up a numeric value, widening integers to floating point.
    #[must_use]
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            PropertyValue::Float(value) => Some(*value),
            PropertyValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Looks up a text value.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            PropertyValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Reports whether the bag contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of entries in the bag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reports whether the bag holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, "}}")
    }
}

/// Key identifying the kind of a bus [`Event`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    /// Creates a key from its textual name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Textual name of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notification published on the event bus.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    key: EventKey,
    properties: Properties,
}

impl Event {
    /// Creates an event with an empty payload.
    #[must_use]
    pub fn new(key: impl Into<EventKey>) -> Self {
        Self {
            key: key.into(),
            properties: Properties::new(),
        }
    }

    /// Creates an event carrying the provided payload.
    #[must_use]
    pub fn with_properties(key: impl Into<EventKey>, properties: Properties) -> Self {
        Self {
            key: key.into(),
            properties,
        }
    }

    /// Returns the event with one more payload entry.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// Key the event is published under.
    #[must_use]
    pub fn key(&self) -> &EventKey {
        &self.key
    }

    /// Payload carried by the event.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_widen_integers_when_read_as_floats() {
        let properties = Properties::new().with("ttl", 3).with("speed", 1.5);
        assert_eq!(properties.get_float("ttl"), Some(3.0));
        assert_eq!(properties.get_float("speed"), Some(1.5));
        assert_eq!(properties.get_int("speed"), None);
        assert_eq!(properties.get_text("ttl"), None);
    }

    #[test]
    fn properties_deserialize_from_toml_tables() {
        let properties: Properties = toml::from_str(
            r#"
                facing = "left"
                ttl = 2.5
                hits = 3
                boss = false
            "#,
        )
        .expect("property table parses");

        assert_eq!(properties.get_text("facing"), Some("left"));
        assert_eq!(properties.get_float("ttl"), Some(2.5));
        assert_eq!(properties.get_int("hits"), Some(3));
        assert_eq!(properties.get_bool("boss"), Some(false));
    }

    #[test]
    fn extend_overwrites_shared_keys() {
        let mut base = Properties::new().with("room", "intro").with("hits", 1);
        base.extend(&Properties::new().with("hits", 4));
        assert_eq!(base.get_int("hits"), Some(4));
        assert_eq!(base.get_text("room"), Some("intro"));
        assert_eq!(base.to_string(), "{hits=4, room=\"intro\"}");
    }

    #[test]
    fn event_payload_is_accessible() {
        let event = Event::new("DOOR_OPENED").with_property("door", "A");
        assert_eq!(event.key().as_str(), "DOOR_OPENED");
        assert_eq!(event.properties().get_text("door"), Some("A"));
    }
}
