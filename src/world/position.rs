use serde::{Deserialize, Serialize};

/// World coordinates plus facing, in yards and radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub orientation: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32, orientation: f32) -> Self {
        Self {
            x,
            y,
            z,
            orientation,
        }
    }

    pub fn distance_to(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Point `distance` yards along the current facing, keeping height and facing.
    pub fn offset_forward(self, distance: f32) -> Self {
        Self {
            x: self.x + distance * self.orientation.cos(),
            y: self.y + distance * self.orientation.sin(),
            ..self
        }
    }

    /// Facing that looks from `self` towards `target`.
    pub fn angle_to(self, target: Position) -> f32 {
        let angle = (target.y - self.y).atan2(target.x - self.x);
        normalize_orientation(angle)
    }

    /// Move up to `step` yards towards `target`; lands exactly on it when close enough.
    pub fn step_towards(self, target: Position, step: f32) -> Self {
        let distance = self.distance_to(target);
        if distance <= step || distance <= f32::EPSILON {
            return Self {
                orientation: self.angle_to(target),
                ..target
            };
        }
        let ratio = step / distance;
        Self {
            x: self.x + (target.x - self.x) * ratio,
            y: self.y + (target.y - self.y) * ratio,
            z: self.z + (target.z - self.z) * ratio,
            orientation: self.angle_to(target),
        }
    }
}

pub fn normalize_orientation(angle: f32) -> f32 {
    let full = std::f32::consts::TAU;
    let wrapped = angle % full;
    if wrapped < 0.0 {
        wrapped + full
    } else {
        wrapped
    }
}
