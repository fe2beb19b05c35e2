mod agent;

use glam::Vec3;

pub use agent::StraightLineAgent;

/// Path-following collaborator. Collision, terrain and path planning all live
/// behind this seam.
pub trait Navigator {
    fn has_active_path(&self) -> bool;

    /// Straight-line distance from the agent to the end of its current path.
    fn path_end_distance(&self) -> Option<f32>;

    fn destination(&self) -> Option<Vec3>;

    fn set_destination(&mut self, destination: Vec3);

    fn stop(&mut self);

    fn is_stopped(&self) -> bool;

    fn velocity(&self) -> Vec3;

    fn speed(&self) -> f32;

    fn set_speed(&mut self, speed: f32);

    /// Moves the agent for one tick and returns its new position.
    fn advance(&mut self, position: Vec3, delta_time: f32) -> Vec3;

    /// Re-seats the agent after its body was moved externally.
    fn warp(&mut self, position: Vec3);
}
