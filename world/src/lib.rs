#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Maverick spawn scheduler.
//!
//! The world owns the live entities and the game camera. Adapters mutate it
//! through [`apply`], register entities produced by triggers through
//! [`World::spawn`], and read it back through the [`query`] module. Entity
//! handles are shared with the triggers that produced them so a trigger can
//! see when its entity dies.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use glam::Vec2;
use log::debug;
use maverick_spawns_core::{Camera, Event, Lifecycle, Polygon, Properties, Rect, Shape, Spawn};

/// Key of the event published whenever a registered entity dies.
pub const ENTITY_DIED: &str = "ENTITY_DIED";
/// Spawn property giving an entity's lifetime in seconds.
pub const TTL_PROPERTY: &str = "ttl";

const DEFAULT_CAMERA_SIZE: Vec2 = Vec2::new(16.0, 14.0);

/// Unique identifier assigned to an entity when it is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct EntityRecord {
    kind: String,
    id: Cell<Option<EntityId>>,
    dead: Cell<bool>,
}

/// Shared handle to an entity, cheap to clone.
///
/// Handles are created unregistered by spawn functions and receive an
/// identifier once the world registers them.
#[derive(Clone, Debug)]
pub struct EntityHandle(Rc<EntityRecord>);

impl EntityHandle {
    /// Creates an unregistered, living entity of the provided kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self(Rc::new(EntityRecord {
            kind: kind.into(),
            id: Cell::new(None),
            dead: Cell::new(false),
        }))
    }

    /// Kind of entity, as named by the level.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    /// Identifier assigned at registration.
    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        self.0.id.get()
    }

    /// Marks the entity dead; the world removes it on its next reap.
    pub fn kill(&self) {
        self.0.dead.set(true);
    }

    /// Reports whether both handles point at the same entity.
    #[must_use]
    pub fn same_entity(&self, other: &EntityHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Lifecycle for EntityHandle {
    fn is_dead(&self) -> bool {
        self.0.dead.get()
    }
}

/// Camera following the player through the level.
#[derive(Clone, Debug, PartialEq)]
pub struct GameCamera {
    center: Vec2,
    size: Vec2,
    rotation: f32,
}

impl GameCamera {
    /// Creates an unrotated camera.
    #[must_use]
    pub const fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            size,
            rotation: 0.0,
        }
    }

    /// Centre of the view.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Width and height of the view.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Rotation of the view in radians.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }
}

impl Default for GameCamera {
    fn default() -> Self {
        Self::new(DEFAULT_CAMERA_SIZE * 0.5, DEFAULT_CAMERA_SIZE)
    }
}

impl Camera for GameCamera {
    fn bounds(&self) -> Shape {
        if self.rotation == 0.0 {
            Shape::Rect(Rect::from_center(self.center, self.size))
        } else {
            Shape::Polygon(Polygon::rotated_rect(
                self.center,
                self.size,
                self.rotation,
            ))
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock, ageing and reaping entities.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves the camera so that it is centred on the provided point.
    MoveCamera {
        /// New centre of the view.
        center: Vec2,
    },
    /// Rotates the camera to an absolute angle.
    RotateCamera {
        /// New rotation in radians.
        radians: f32,
    },
    /// Kills every live entity of the provided kind.
    Kill {
        /// Kind of entity to kill.
        kind: String,
    },
    /// Publishes an event on the bus.
    Publish {
        /// Event to publish.
        event: Event,
    },
}

#[derive(Debug)]
struct LiveEntity {
    handle: EntityHandle,
    properties: Properties,
    age: Duration,
    ttl: Option<Duration>,
}

/// Represents the authoritative world state.
#[derive(Debug)]
pub struct World {
    camera: Rc<RefCell<GameCamera>>,
    entities: Vec<LiveEntity>,
    next_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates an empty world viewed through the provided camera.
    #[must_use]
    pub fn new(camera: GameCamera) -> Self {
        Self {
            camera: Rc::new(RefCell::new(camera)),
            entities: Vec::new(),
            next_id: 0,
            tick_index: 0,
        }
    }

    /// Registers the entity carried by a spawn and returns its identifier.
    ///
    /// A `ttl` property, in seconds, makes the entity die on its own once that
    /// much simulated time has passed. Registering an entity twice returns the
    /// identifier it already has.
    pub fn spawn(&mut self, spawn: Spawn<EntityHandle>) -> EntityId {
        let (handle, properties) = spawn.into_parts();
        if let Some(id) = handle.id() {
            return id;
        }

        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        handle.0.id.set(Some(id));

        let ttl = properties
            .get_float(TTL_PROPERTY)
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .map(Duration::from_secs_f64);
        debug!("registered {} as {id:?} with {properties}", handle.kind());
        self.entities.push(LiveEntity {
            handle,
            properties,
            age: Duration::ZERO,
            ttl,
        });
        id
    }

    fn reap(&mut self, out_events: &mut Vec<Event>) {
        self.entities.retain(|entity| {
            if !entity.handle.is_dead() {
                return true;
            }
            let id = entity.handle.id().map_or(-1, |id| i64::from(id.get()));
            debug!("{} #{id} died", entity.handle.kind());
            out_events.push(
                Event::new(ENTITY_DIED)
                    .with_property("kind", entity.handle.kind())
                    .with_property("id", id),
            );
            false
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(GameCamera::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            for entity in &mut world.entities {
                entity.age = entity.age.saturating_add(dt);
                if entity.ttl.is_some_and(|ttl| entity.age >= ttl) {
                    entity.handle.kill();
                }
            }
            world.reap(out_events);
        }
        Command::MoveCamera { center } => {
            world.camera.borrow_mut().center = center;
        }
        Command::RotateCamera { radians } => {
            world.camera.borrow_mut().rotation = radians;
        }
        Command::Kill { kind } => {
            for entity in &world.entities {
                if entity.handle.kind() == kind {
                    entity.handle.kill();
                }
            }
            world.reap(out_events);
        }
        Command::Publish { event } => out_events.push(event),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use maverick_spawns_core::{Camera, Properties, Shape};

    use super::{EntityId, GameCamera, World};

    /// Shared camera handle, for triggers that follow the view.
    #[must_use]
    pub fn camera(world: &World) -> Rc<RefCell<GameCamera>> {
        Rc::clone(&world.camera)
    }

    /// Current bounds of the camera.
    #[must_use]
    pub fn camera_bounds(world: &World) -> Shape {
        world.camera.borrow().bounds()
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of registered entities still alive.
    #[must_use]
    pub fn entity_count(world: &World) -> usize {
        world.entities.len()
    }

    /// Captures the registered entities in registration order.
    #[must_use]
    pub fn entities(world: &World) -> Vec<EntitySnapshot> {
        world
            .entities
            .iter()
            .filter_map(|entity| {
                Some(EntitySnapshot {
                    id: entity.handle.id()?,
                    kind: entity.handle.kind().to_owned(),
                    properties: entity.properties.clone(),
                    age: entity.age,
                })
            })
            .collect()
    }

    /// Read-only description of a registered entity.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EntitySnapshot {
        /// Identifier assigned at registration.
        pub id: EntityId,
        /// Kind of entity.
        pub kind: String,
        /// Properties the entity was spawned with.
        pub properties: Properties,
        /// Simulated time since registration.
        pub age: Duration,
    }
}
