use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Upright collision capsule approximated as a cylinder, anchored at the feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderShape {
    pub radius: f32,
    pub height: f32,
}

impl Default for CylinderShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }
}

impl CylinderShape {
    pub fn bounds(&self, feet: Vec3, scale: Vec3) -> Bounds {
        let radius = self.radius * scale.x.abs().max(scale.z.abs());
        let half_height = self.height * scale.y.abs() * 0.5;

        Bounds {
            center: feet + Vec3::Y * half_height,
            extents: Vec3::new(radius, half_height, radius),
        }
    }
}
