use glam::Vec3;

use super::Navigator;

/// Steers straight at its destination with no obstacle avoidance.
#[derive(Debug, Clone)]
pub struct StraightLineAgent {
    position: Vec3,
    destination: Option<Vec3>,
    velocity: Vec3,
    speed: f32,
    stopping_distance: f32,
}

impl Default for StraightLineAgent {
    fn default() -> Self {
        Self::new(5.0, 0.1)
    }
}

impl StraightLineAgent {
    pub fn new(speed: f32, stopping_distance: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            destination: None,
            velocity: Vec3::ZERO,
            speed,
            stopping_distance,
        }
    }
}

impl Navigator for StraightLineAgent {
    fn has_active_path(&self) -> bool {
        self.destination.is_some()
    }

    fn path_end_distance(&self) -> Option<f32> {
        self.destination.map(|d| self.position.distance(d))
    }

    fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
    }

    fn stop(&mut self) {
        self.destination = None;
        self.velocity = Vec3::ZERO;
    }

    fn is_stopped(&self) -> bool {
        self.destination.is_none()
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        if self.velocity.length_squared() > 0.0 {
            self.velocity = self.velocity.normalize() * speed;
        }
    }

    fn advance(&mut self, position: Vec3, delta_time: f32) -> Vec3 {
        self.position = position;

        let Some(destination) = self.destination else {
            self.velocity = Vec3::ZERO;
            return position;
        };

        let to_target = destination - position;
        let distance = to_target.length();
        if distance <= self.stopping_distance {
            self.stop();
            return position;
        }

        let step = (self.speed * delta_time).min(distance);
        self.velocity = to_target / distance * self.speed;
        self.position = position + to_target / distance * step;
        self.position
    }

    fn warp(&mut self, position: Vec3) {
        self.position = position;
    }
}
