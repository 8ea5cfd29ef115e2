#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level loading: turns TOML room definitions into spawn triggers.
//!
//! A level is a list of rooms. Each room has world-space bounds and the
//! triggers that become active while the camera is inside it. Definitions are
//! validated once when the level is parsed, so building the triggers of a
//! room never fails for a room the level defines.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashSet},
    rc::Rc,
    time::Duration,
};

use glam::Vec2;
use log::debug;
use maverick_spawns_core::{Camera, Event, Properties, Spawn};
use maverick_spawns_system_spawning::{factory, Cadence, CullPolicy, Trigger, TriggerOptions};
use maverick_spawns_world::EntityHandle;
use thiserror::Error;

use crate::definition::{LevelDefinition, RoomDefinition, TriggerDefinition, TriggerKind};

mod definition;

/// Property added to every spawn naming the room whose trigger produced it.
pub const SPAWN_ROOM_PROPERTY: &str = "spawn_room";

/// Triggers built for one room, ready for the scheduler.
pub type RoomTriggers = Vec<Box<dyn Trigger<EntityHandle>>>;

/// Errors raised while loading a level definition.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level file is not valid TOML or does not match the level layout.
    #[error("could not parse level definition: {0}")]
    Parse(#[from] toml::de::Error),
    /// The level does not define a single room.
    #[error("level defines no rooms")]
    NoRooms,
    /// Two rooms share a name.
    #[error("room `{0}` is defined twice")]
    DuplicateRoom(String),
    /// A room has zero or negative extent.
    #[error("room `{0}` has degenerate bounds")]
    DegenerateRoom(String),
    /// Two triggers of the same room share a label.
    #[error("room `{room}` defines trigger `{label}` twice")]
    DuplicateTrigger {
        /// Room defining the triggers.
        room: String,
        /// Shared label.
        label: String,
    },
    /// A camera-entry trigger lacks a region.
    #[error("trigger `{label}` in room `{room}` needs a region")]
    MissingRegion {
        /// Room defining the trigger.
        room: String,
        /// Label of the trigger.
        label: String,
    },
    /// A region has zero or negative extent.
    #[error("trigger `{label}` in room `{room}` has a degenerate region")]
    DegenerateRegion {
        /// Room defining the trigger.
        room: String,
        /// Label of the trigger.
        label: String,
    },
    /// An event trigger subscribes to no event keys.
    #[error("trigger `{label}` in room `{room}` subscribes to no events")]
    NoSubscriptions {
        /// Room defining the trigger.
        room: String,
        /// Label of the trigger.
        label: String,
    },
    /// The requested room is not part of the level.
    #[error("room `{0}` is not defined by the level")]
    UnknownRoom(String),
}

/// Validated level definition.
#[derive(Debug)]
pub struct Level {
    rooms: Vec<RoomDefinition>,
}

impl Level {
    /// Parses and validates a level from its TOML representation.
    pub fn from_toml(contents: &str) -> Result<Self, LevelError> {
        let definition: LevelDefinition = toml::from_str(contents)?;
        if definition.rooms.is_empty() {
            return Err(LevelError::NoRooms);
        }

        let mut room_names = HashSet::new();
        for room in &definition.rooms {
            if !room_names.insert(room.name.as_str()) {
                return Err(LevelError::DuplicateRoom(room.name.clone()));
            }
            if room.has_degenerate_bounds() {
                return Err(LevelError::DegenerateRoom(room.name.clone()));
            }
            validate_triggers(room)?;
        }

        Ok(Self {
            rooms: definition.rooms,
        })
    }

    /// Names of the rooms in definition order.
    pub fn room_names(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(|room| room.name.as_str())
    }

    /// First room, in definition order, whose bounds contain the point.
    #[must_use]
    pub fn room_at(&self, point: Vec2) -> Option<&str> {
        self.rooms
            .iter()
            .find(|room| room.bounds.to_rect().contains(point))
            .map(|room| room.name.as_str())
    }

    /// Number of triggers the room defines.
    pub fn trigger_count(&self, room: &str) -> Result<usize, LevelError> {
        Ok(self.room(room)?.triggers.len())
    }

    /// Builds fresh triggers for the room, watching the provided camera.
    pub fn build_room_triggers<C>(
        &self,
        room: &str,
        camera: &Rc<RefCell<C>>,
    ) -> Result<RoomTriggers, LevelError>
    where
        C: Camera + 'static,
    {
        let room = self.room(room)?;
        debug!(
            "building {} triggers for room `{}`",
            room.triggers.len(),
            room.name
        );
        room.triggers
            .iter()
            .map(|definition| build_trigger(&room.name, definition, camera))
            .collect()
    }

    fn room(&self, name: &str) -> Result<&RoomDefinition, LevelError> {
        self.rooms
            .iter()
            .find(|room| room.name == name)
            .ok_or_else(|| LevelError::UnknownRoom(name.to_owned()))
    }
}

fn validate_triggers(room: &RoomDefinition) -> Result<(), LevelError> {
    let mut labels = HashSet::new();
    for trigger in &room.triggers {
        let located = |label: &str| (room.name.clone(), label.to_owned());
        if !labels.insert(trigger.label.as_str()) {
            let (room, label) = located(&trigger.label);
            return Err(LevelError::DuplicateTrigger { room, label });
        }

        match trigger.kind {
            TriggerKind::CameraEntry => {
                let Some(region) = trigger.region else {
                    let (room, label) = located(&trigger.label);
                    return Err(LevelError::MissingRegion { room, label });
                };
                if region.is_degenerate() {
                    let (room, label) = located(&trigger.label);
                    return Err(LevelError::DegenerateRegion { room, label });
                }
            }
            TriggerKind::Event => {
                if trigger.keys.is_empty() {
                    let (room, label) = located(&trigger.label);
                    return Err(LevelError::NoSubscriptions { room, label });
                }
            }
        }
    }
    Ok(())
}

fn build_trigger<C>(
    room: &str,
    definition: &TriggerDefinition,
    camera: &Rc<RefCell<C>>,
) -> Result<Box<dyn Trigger<EntityHandle>>, LevelError>
where
    C: Camera + 'static,
{
    let spawn = spawn_fn(room, definition);
    let options = trigger_options(definition);

    let trigger: Box<dyn Trigger<EntityHandle>> = match definition.kind {
        TriggerKind::CameraEntry => {
            let region = definition.region.ok_or_else(|| LevelError::MissingRegion {
                room: room.to_owned(),
                label: definition.label.clone(),
            })?;
            Box::new(factory::camera_entry(
                Rc::clone(camera),
                region.to_shape(),
                spawn,
                options,
            ))
        }
        TriggerKind::Event => {
            let when = definition.when.clone();
            let keys: BTreeSet<_> = definition.keys.iter().cloned().collect();
            Box::new(factory::event_driven(
                keys,
                move |event: &Event| payload_matches(&when, event),
                spawn,
                options,
            ))
        }
    };
    Ok(trigger)
}

fn spawn_fn(room: &str, definition: &TriggerDefinition) -> impl FnMut() -> Spawn<EntityHandle> {
    let kind = definition.entity.clone();
    let properties = definition
        .properties
        .clone()
        .with(SPAWN_ROOM_PROPERTY, room);
    move || Spawn::new(EntityHandle::new(kind.as_str()), properties.clone())
}

fn trigger_options(definition: &TriggerDefinition) -> TriggerOptions {
    let cadence = match definition.interval_ms {
        0 => Cadence::EveryTick,
        millis => Cadence::Interval(Duration::from_millis(millis)),
    };
    let cull = definition
        .lifetime_ms
        .map_or(CullPolicy::Never, |millis| {
            CullPolicy::After(Duration::from_millis(millis))
        });

    TriggerOptions::new(definition.label.as_str())
        .with_respawnable(definition.respawnable)
        .with_continue_checking_after_overlap(definition.continue_checking_after_overlap)
        .with_cadence(cadence)
        .with_cull(cull)
}

fn payload_matches(when: &Properties, event: &Event) -> bool {
    when.iter()
        .all(|(key, value)| event.properties().get(key) == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_filter_requires_every_entry() {
        let when = Properties::new().with("door", "A").with("open", true);
        let matching = Event::new("DOOR_OPENED")
            .with_property("door", "A")
            .with_property("open", true)
            .with_property("extra", 1);
        let partial = Event::new("DOOR_OPENED").with_property("door", "A");

        assert!(payload_matches(&when, &matching));
        assert!(!payload_matches(&when, &partial));
        assert!(payload_matches(&Properties::new(), &partial));
    }

    #[test]
    fn interval_and_lifetime_map_to_policies() {
        let definition: TriggerDefinition = toml::from_str(
            r#"
                label = "slow"
                entity = "met"
                kind = "camera_entry"
                region = { x = 0, y = 0, width = 4, height = 4 }
                interval_ms = 250
                lifetime_ms = 1000
            "#,
        )
        .expect("trigger parses");

        let options = trigger_options(&definition);
        assert_eq!(options.label(), "slow");
        let rendered = format!("{options:?}");
        assert!(rendered.contains("Interval(250ms)"), "{rendered}");
        assert!(rendered.contains("After(1s)"), "{rendered}");
    }
}
