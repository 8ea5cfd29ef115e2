use glam::Vec2;
use maverick_spawns_core::{Circle, EventKey, Polygon, Properties, Rect, Shape};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LevelDefinition {
    #[serde(default, rename = "room")]
    pub(crate) rooms: Vec<RoomDefinition>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RoomDefinition {
    pub(crate) name: String,
    pub(crate) bounds: RectDefinition,
    #[serde(default, rename = "trigger")]
    pub(crate) triggers: Vec<TriggerDefinition>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TriggerKind {
    CameraEntry,
    Event,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct TriggerDefinition {
    pub(crate) label: String,
    pub(crate) entity: String,
    pub(crate) kind: TriggerKind,
    #[serde(default)]
    pub(crate) region: Option<RegionDefinition>,
    #[serde(default)]
    pub(crate) keys: Vec<EventKey>,
    /// Payload entries an event must carry, with equal values, to fire the trigger.
    #[serde(default)]
    pub(crate) when: Properties,
    #[serde(default = "respawnable_by_default")]
    pub(crate) respawnable: bool,
    #[serde(default)]
    pub(crate) continue_checking_after_overlap: bool,
    #[serde(default)]
    pub(crate) interval_ms: u64,
    #[serde(default)]
    pub(crate) lifetime_ms: Option<u64>,
    #[serde(default)]
    pub(crate) properties: Properties,
}

fn respawnable_by_default() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct RectDefinition {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl RectDefinition {
    pub(crate) fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Region shapes accepted in level files.
///
/// Rectangles are anchored at their minimum corner and rotate about their centre.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RegionDefinition {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default)]
        rotation: f32,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
    },
}

impl RegionDefinition {
    pub(crate) fn is_degenerate(&self) -> bool {
        match *self {
            Self::Rect {
                width,
                height,
                rotation,
                ..
            } => !(width > 0.0 && height > 0.0 && rotation.is_finite()),
            Self::Circle { radius, .. } => !(radius > 0.0),
        }
    }

    pub(crate) fn to_shape(self) -> Shape {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
                rotation,
            } => {
                let rect = Rect::new(x, y, width, height);
                if rotation == 0.0 {
                    Shape::Rect(rect)
                } else {
                    Shape::Polygon(Polygon::rotated_rect(rect.center(), rect.size(), rotation))
                }
            }
            Self::Circle { x, y, radius } => Shape::Circle(Circle::new(Vec2::new(x, y), radius)),
        }
    }
}

impl RoomDefinition {
    pub(crate) fn has_degenerate_bounds(&self) -> bool {
        self.bounds.is_degenerate()
    }
}
