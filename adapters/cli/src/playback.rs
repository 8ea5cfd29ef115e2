use std::{cell::RefCell, collections::HashMap, fmt, mem, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use log::{debug, trace};
use maverick_spawns_core::{Event, Properties};
use maverick_spawns_level::{Level, RoomTriggers};
use maverick_spawns_system_spawning::SpawnScheduler;
use maverick_spawns_world::{
    apply, query, Command, EntityHandle, EntityId, GameCamera, World, ENTITY_DIED,
};

use crate::script::Script;

/// Something observable that happened during a frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FrameEvent {
    /// The camera centre moved into another room, or out of every room.
    RoomChanged(Option<String>),
    /// A trigger produced an entity that is now registered with the world.
    Spawned {
        id: EntityId,
        kind: String,
        properties: Properties,
    },
    /// A registered entity died.
    Died { kind: String, id: i64 },
}

impl fmt::Display for FrameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomChanged(Some(room)) => write!(f, "entered room `{room}`"),
            Self::RoomChanged(None) => write!(f, "left every room"),
            Self::Spawned {
                id,
                kind,
                properties,
            } => write!(f, "spawned {kind} #{} {properties}", id.get()),
            Self::Died { kind, id } => write!(f, "{kind} #{id} died"),
        }
    }
}

/// Drives a level through the world, one frame at a time.
pub(crate) struct Playback {
    level: Level,
    script: Script,
    world: World,
    camera: Rc<RefCell<GameCamera>>,
    scheduler: SpawnScheduler<EntityHandle>,
    room: Option<String>,
    /// Triggers of rooms the camera left, kept with their spawn gates.
    parked: HashMap<String, RoomTriggers>,
    pending: Vec<Event>,
}

impl Playback {
    pub(crate) fn new(level: Level, script: Script, camera: GameCamera) -> Self {
        let world = World::new(camera);
        let camera = query::camera(&world);
        Self {
            level,
            script,
            world,
            camera,
            scheduler: SpawnScheduler::new(),
            room: None,
            parked: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Advances one frame and reports what happened during it.
    ///
    /// Events published while ticking the world reach the triggers on the
    /// following frame, after that frame's scripted commands. Events are
    /// delivered to the room the camera is in once those commands ran.
    pub(crate) fn step(&mut self, frame: u32, dt: Duration) -> Result<Vec<FrameEvent>> {
        let mut report = Vec::new();

        let mut events = mem::take(&mut self.pending);
        let delivered_before_script = events.len();
        for command in self.script.commands_at(frame) {
            trace!("frame {frame}: applying {command:?}");
            apply(&mut self.world, command.clone(), &mut events);
        }
        record_deaths(&events[delivered_before_script..], &mut report);

        self.follow_camera(&mut report)?;
        for event in &events {
            self.scheduler.notify(event);
        }

        self.scheduler.update(dt);
        for spawn in self.scheduler.drain_spawns() {
            let kind = spawn.entity().kind().to_owned();
            let properties = spawn.properties().clone();
            let id = self.world.spawn(spawn);
            report.push(FrameEvent::Spawned {
                id,
                kind,
                properties,
            });
        }

        apply(&mut self.world, Command::Tick { dt }, &mut self.pending);
        record_deaths(&self.pending, &mut report);
        Ok(report)
    }

    /// Number of entities currently alive in the world.
    pub(crate) fn live_entities(&self) -> usize {
        query::entity_count(&self.world)
    }

    fn follow_camera(&mut self, report: &mut Vec<FrameEvent>) -> Result<()> {
        let center = self.camera.borrow().center();
        let room = self.level.room_at(center).map(str::to_owned);
        if room == self.room {
            return Ok(());
        }

        let incoming = match &room {
            Some(name) => match self.parked.remove(name) {
                Some(parked) => parked,
                None => self
                    .level
                    .build_room_triggers(name, &self.camera)
                    .with_context(|| format!("failed to build triggers for room `{name}`"))?,
            },
            None => Vec::new(),
        };
        debug!("camera moved from {:?} to {:?}", self.room, room);
        let outgoing = self.scheduler.swap_triggers(incoming);
        if let Some(previous) = self.room.take() {
            let _ = self.parked.insert(previous, outgoing);
        }
        self.room = room.clone();
        report.push(FrameEvent::RoomChanged(room));
        Ok(())
    }
}

fn record_deaths(events: &[Event], report: &mut Vec<FrameEvent>) {
    for event in events {
        if event.key().as_str() != ENTITY_DIED {
            continue;
        }
        let properties = event.properties();
        report.push(FrameEvent::Died {
            kind: properties.get_text("kind").unwrap_or_default().to_owned(),
            id: properties.get_int("id").unwrap_or(-1),
        });
    }
}
