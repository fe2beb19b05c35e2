use glam::Vec3;

/// Yaw in degrees, `[0, 360)`, measured from +Z towards +X.
pub fn yaw_from_direction(direction: Vec3) -> Option<f32> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(normalize_yaw(flat.x.atan2(flat.z).to_degrees()))
}

pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    let (sin, cos) = yaw.to_radians().sin_cos();
    Vec3::new(sin, 0.0, cos)
}

pub fn normalize_yaw(yaw: f32) -> f32 {
    let wrapped = yaw.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Shortest signed difference from `current` to `target`, in `(-180, 180]`.
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    from + delta_angle(from, to) * t.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationSmoother {
    yaw: f32,
    target_yaw: f32,
    turn_speed: f32,
    deadband: f32,
    applied: bool,
}

impl RotationSmoother {
    pub fn new(yaw: f32, turn_speed: f32, deadband: f32) -> Self {
        let yaw = normalize_yaw(yaw);
        Self {
            yaw,
            target_yaw: yaw,
            turn_speed,
            deadband,
            applied: true,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn target_yaw(&self) -> f32 {
        self.target_yaw
    }

    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    pub fn turn_speed(&self) -> f32 {
        self.turn_speed
    }

    pub fn set_turn_speed(&mut self, turn_speed: f32) {
        self.turn_speed = turn_speed;
    }

    /// True once an update has run since the last externally requested look target.
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// External look request; holds off integrator-driven retargeting until the
    /// next update has run.
    pub fn look_at(&mut self, yaw: f32) {
        self.target_yaw = normalize_yaw(yaw);
        self.applied = false;
    }

    pub(crate) fn retarget(&mut self, yaw: f32) {
        self.target_yaw = normalize_yaw(yaw);
    }

    pub fn update(&mut self, delta_time: f32) {
        if self.turn_speed <= 0.0 {
            self.yaw = self.target_yaw;
        } else if delta_angle(self.yaw, self.target_yaw).abs() > self.deadband {
            self.yaw = normalize_yaw(lerp_angle(self.yaw, self.target_yaw, self.turn_speed * delta_time));
        }
        self.applied = true;
    }

    pub fn turn_immediately(&mut self, yaw: f32) {
        let yaw = normalize_yaw(yaw);
        self.yaw = yaw;
        self.target_yaw = yaw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_is_measured_from_z_towards_x() {
        assert_eq!(yaw_from_direction(Vec3::Z), Some(0.0));
        assert!((yaw_from_direction(Vec3::X).unwrap() - 90.0).abs() < 1e-4);
        assert!((yaw_from_direction(-Vec3::X).unwrap() - 270.0).abs() < 1e-4);
        assert_eq!(yaw_from_direction(Vec3::Y), None);
    }

    #[test]
    fn forward_roundtrips_through_yaw() {
        let forward = forward_from_yaw(90.0);
        assert!((forward - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn delta_angle_takes_short_way_round() {
        assert!((delta_angle(350.0, 10.0) - 20.0).abs() < 1e-4);
        assert!((delta_angle(10.0, 350.0) + 20.0).abs() < 1e-4);
    }

    #[test]
    fn zero_turn_speed_snaps() {
        let mut rotation = RotationSmoother::new(0.0, 0.0, 1.0);
        rotation.look_at(135.0);
        assert!(!rotation.is_applied());

        rotation.update(0.016);
        assert_eq!(rotation.yaw(), 135.0);
        assert!(rotation.is_applied());
    }

    #[test]
    fn smoothing_wraps_across_zero() {
        let mut rotation = RotationSmoother::new(350.0, 5.0, 1.0);
        rotation.retarget(10.0);

        rotation.update(0.1);
        // halfway along the 20 degree short arc
        assert!((rotation.yaw() - 0.0).abs() < 1e-3 || (rotation.yaw() - 360.0).abs() < 1e-3);
    }

    #[test]
    fn deadband_holds_small_differences() {
        let mut rotation = RotationSmoother::new(90.0, 5.0, 1.0);
        rotation.retarget(90.5);
        rotation.update(0.1);
        assert_eq!(rotation.yaw(), 90.0);
    }

    #[test]
    fn turn_immediately_sets_both() {
        let mut rotation = RotationSmoother::new(0.0, 5.0, 1.0);
        rotation.retarget(45.0);
        rotation.turn_immediately(200.0);
        assert_eq!(rotation.yaw(), 200.0);
        assert_eq!(rotation.target_yaw(), 200.0);
    }
}
