use std::time::Duration;

use glam::Vec2;
use maverick_spawns_core::Event;
use maverick_spawns_level::{Level, LevelError, SPAWN_ROOM_PROPERTY};
use maverick_spawns_system_spawning::SpawnScheduler;
use maverick_spawns_world::{apply, query, Command, EntityHandle, GameCamera, World};

const TICK: Duration = Duration::from_millis(16);

const LEVEL: &str = r#"
[[room]]
name = "corridor"
bounds = { x = 0, y = 0, width = 64, height = 16 }

[[room.trigger]]
label = "met-1"
entity = "met"
kind = "camera_entry"
region = { x = 40, y = 2, width = 4, height = 4 }
properties = { hp = 3 }

[[room.trigger]]
label = "joe"
entity = "sniper_joe"
kind = "event"
keys = ["DOOR_OPENED"]
when = { door = "A" }
respawnable = false

[[room]]
name = "shaft"
bounds = { x = 64, y = 0, width = 16, height = 64 }

[[room.trigger]]
label = "telly"
entity = "telly"
kind = "camera_entry"
region = { x = 72, y = 40, radius = 3 }
interval_ms = 100
"#;

fn level() -> Level {
    Level::from_toml(LEVEL).expect("level parses")
}

#[test]
fn rooms_are_listed_in_definition_order() {
    let level = level();
    assert_eq!(level.room_names().collect::<Vec<_>>(), ["corridor", "shaft"]);
    assert_eq!(level.trigger_count("corridor").expect("room exists"), 2);
    assert_eq!(level.trigger_count("shaft").expect("room exists"), 1);
}

#[test]
fn room_lookup_uses_room_bounds() {
    let level = level();
    assert_eq!(level.room_at(Vec2::new(8.0, 8.0)), Some("corridor"));
    assert_eq!(level.room_at(Vec2::new(70.0, 50.0)), Some("shaft"));
    assert_eq!(level.room_at(Vec2::new(-5.0, 8.0)), None);
}

#[test]
fn camera_entry_trigger_spawns_configured_entity() {
    let level = level();
    let mut world = World::new(GameCamera::new(Vec2::new(8.0, 8.0), Vec2::new(16.0, 14.0)));
    let camera = query::camera(&world);
    let mut scheduler: SpawnScheduler<EntityHandle> = SpawnScheduler::new();
    scheduler.set_triggers(
        level
            .build_room_triggers("corridor", &camera)
            .expect("room exists"),
    );

    scheduler.update(TICK);
    assert!(scheduler.spawns().is_empty());

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::MoveCamera {
            center: Vec2::new(36.0, 8.0),
        },
        &mut events,
    );
    scheduler.update(TICK);

    let spawns: Vec<_> = scheduler.drain_spawns().collect();
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].entity().kind(), "met");
    assert_eq!(spawns[0].properties().get_int("hp"), Some(3));
    assert_eq!(
        spawns[0].properties().get_text(SPAWN_ROOM_PROPERTY),
        Some("corridor")
    );
}

#[test]
fn event_trigger_filters_on_payload() {
    let level = level();
    let world = World::default();
    let mut scheduler = SpawnScheduler::new();
    scheduler.set_triggers(
        level
            .build_room_triggers("corridor", &query::camera(&world))
            .expect("room exists"),
    );

    scheduler.notify(&Event::new("DOOR_OPENED").with_property("door", "B"));
    scheduler.update(TICK);
    assert!(scheduler.spawns().is_empty());

    scheduler.notify(&Event::new("DOOR_OPENED").with_property("door", "A"));
    scheduler.update(TICK);
    let spawns: Vec<_> = scheduler.drain_spawns().collect();
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].entity().kind(), "sniper_joe");
    assert_eq!(scheduler.labels().collect::<Vec<_>>(), ["met-1"]);
}

#[test]
fn unknown_room_is_reported() {
    let level = level();
    let world = World::default();
    let error = level
        .build_room_triggers("boss", &query::camera(&world))
        .err()
        .expect("room is unknown");
    assert!(matches!(error, LevelError::UnknownRoom(name) if name == "boss"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let error = Level::from_toml("[[room]]\nname = ").expect_err("invalid toml");
    assert!(matches!(error, LevelError::Parse(_)));
}

#[test]
fn empty_level_is_rejected() {
    let error = Level::from_toml("").expect_err("no rooms");
    assert!(matches!(error, LevelError::NoRooms));
}

#[test]
fn duplicate_rooms_are_rejected() {
    let contents = r#"
        [[room]]
        name = "a"
        bounds = { x = 0, y = 0, width = 1, height = 1 }

        [[room]]
        name = "a"
        bounds = { x = 1, y = 0, width = 1, height = 1 }
    "#;
    let error = Level::from_toml(contents).expect_err("duplicate room");
    assert!(matches!(error, LevelError::DuplicateRoom(name) if name == "a"));
}

#[test]
fn degenerate_room_bounds_are_rejected() {
    let contents = r#"
        [[room]]
        name = "flat"
        bounds = { x = 0, y = 0, width = 10, height = 0 }
    "#;
    let error = Level::from_toml(contents).expect_err("flat room");
    assert!(matches!(error, LevelError::DegenerateRoom(name) if name == "flat"));
}

#[test]
fn trigger_definitions_are_validated() {
    let cases = [
        (
            r#"
            [[room.trigger]]
            label = "t"
            entity = "met"
            kind = "camera_entry"
            "#,
            "missing region",
        ),
        (
            r#"
            [[room.trigger]]
            label = "t"
            entity = "met"
            kind = "camera_entry"
            region = { x = 0, y = 0, radius = 0 }
            "#,
            "degenerate region",
        ),
        (
            r#"
            [[room.trigger]]
            label = "t"
            entity = "met"
            kind = "event"
            "#,
            "no subscriptions",
        ),
        (
            r#"
            [[room.trigger]]
            label = "t"
            entity = "met"
            kind = "event"
            keys = ["A"]

            [[room.trigger]]
            label = "t"
            entity = "met"
            kind = "event"
            keys = ["B"]
            "#,
            "duplicate trigger",
        ),
    ];

    for (triggers, case) in cases {
        let contents = format!(
            "[[room]]\nname = \"r\"\nbounds = {{ x = 0, y = 0, width = 8, height = 8 }}\n{triggers}"
        );
        let error = Level::from_toml(&contents).expect_err(case);
        let matched = match case {
            "missing region" => matches!(error, LevelError::MissingRegion { .. }),
            "degenerate region" => matches!(error, LevelError::DegenerateRegion { .. }),
            "no subscriptions" => matches!(error, LevelError::NoSubscriptions { .. }),
            _ => matches!(error, LevelError::DuplicateTrigger { .. }),
        };
        assert!(matched, "{case}: unexpected {error}");
    }
}

#[test]
fn rotated_region_is_accepted() {
    let contents = r#"
        [[room]]
        name = "tilted"
        bounds = { x = 0, y = 0, width = 32, height = 32 }

        [[room.trigger]]
        label = "tilted-met"
        entity = "met"
        kind = "camera_entry"
        region = { x = 4, y = 4, width = 6, height = 2, rotation = 0.5 }
    "#;
    let level = Level::from_toml(contents).expect("level parses");
    let world = World::default();
    let mut scheduler = SpawnScheduler::new();
    scheduler.set_triggers(
        level
            .build_room_triggers("tilted", &query::camera(&world))
            .expect("room exists"),
    );

    scheduler.update(TICK);
    assert_eq!(scheduler.drain_spawns().count(), 1);
}
