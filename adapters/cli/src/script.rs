use glam::Vec2;
use log::warn;
use maverick_spawns_core::{Event, EventKey, Properties};
use maverick_spawns_world::Command;
use serde::Deserialize;

/// Commands replayed against the world at fixed frames.
#[derive(Debug, Default)]
pub(crate) struct Script {
    commands: Vec<ScriptedCommand>,
}

#[derive(Debug)]
struct ScriptedCommand {
    frame: u32,
    command: Command,
}

#[derive(Debug, Default, Deserialize)]
struct ScriptFile {
    #[serde(default, rename = "script")]
    entries: Vec<ScriptEntry>,
}

#[derive(Debug, Deserialize)]
struct ScriptEntry {
    frame: u32,
    #[serde(default)]
    move_camera: Option<[f32; 2]>,
    #[serde(default)]
    rotate_camera: Option<f32>,
    #[serde(default)]
    publish: Option<PublishEntry>,
    #[serde(default)]
    kill: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishEntry {
    key: EventKey,
    #[serde(default)]
    properties: Properties,
}

impl Script {
    /// Reads the `[[script]]` tables of a level file, ignoring everything else.
    pub(crate) fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        let file: ScriptFile = toml::from_str(contents)?;
        let mut commands = Vec::new();
        for entry in file.entries {
            let frame = entry.frame;
            let before = commands.len();
            if let Some([x, y]) = entry.move_camera {
                commands.push(ScriptedCommand {
                    frame,
                    command: Command::MoveCamera {
                        center: Vec2::new(x, y),
                    },
                });
            }
            if let Some(radians) = entry.rotate_camera {
                commands.push(ScriptedCommand {
                    frame,
                    command: Command::RotateCamera { radians },
                });
            }
            if let Some(publish) = entry.publish {
                commands.push(ScriptedCommand {
                    frame,
                    command: Command::Publish {
                        event: Event::with_properties(publish.key, publish.properties),
                    },
                });
            }
            if let Some(kind) = entry.kill {
                commands.push(ScriptedCommand {
                    frame,
                    command: Command::Kill { kind },
                });
            }
            if commands.len() == before {
                warn!("script entry for frame {frame} has no action; ignored");
            }
        }
        commands.sort_by_key(|scripted| scripted.frame);
        Ok(Self { commands })
    }

    /// Commands scheduled for the frame, in file order.
    pub(crate) fn commands_at(&self, frame: u32) -> impl Iterator<Item = &Command> {
        self.commands
            .iter()
            .filter(move |scripted| scripted.frame == frame)
            .map(|scripted| &scripted.command)
    }

    pub(crate) fn len(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_become_commands_in_frame_order() {
        let script = Script::from_toml(
            r#"
            [[room]]
            name = "ignored"

            [[script]]
            frame = 12
            kill = "met"

            [[script]]
            frame = 3
            move_camera = [24, 7.5]
            rotate_camera = 0.25

            [[script]]
            frame = 12
            publish = { key = "DOOR_OPENED", properties = { door = "A" } }
            "#,
        )
        .expect("script parses");

        assert_eq!(script.len(), 4);
        let at_three: Vec<_> = script.commands_at(3).cloned().collect();
        assert_eq!(
            at_three,
            [
                Command::MoveCamera {
                    center: Vec2::new(24.0, 7.5)
                },
                Command::RotateCamera { radians: 0.25 },
            ]
        );

        let at_twelve: Vec<_> = script.commands_at(12).collect();
        assert_eq!(
            at_twelve[0],
            &Command::Kill {
                kind: "met".to_owned()
            }
        );
        let Command::Publish { event } = at_twelve[1] else {
            panic!("expected a publish command, got {:?}", at_twelve[1]);
        };
        assert_eq!(event.key().as_str(), "DOOR_OPENED");
        assert_eq!(event.properties().get_text("door"), Some("A"));
        assert_eq!(script.commands_at(4).count(), 0);
    }

    #[test]
    fn entries_without_actions_are_skipped() {
        let script = Script::from_toml("[[script]]\nframe = 1\n").expect("script parses");
        assert_eq!(script.len(), 0);
    }

    #[test]
    fn files_without_script_are_empty() {
        let script = Script::from_toml("").expect("script parses");
        assert_eq!(script.len(), 0);
    }
}
