mod buffer;
mod entity;
mod world;

pub use buffer::{TickState, TickStateBuffer};
pub use entity::{EntityId, MovementEntity};
pub use world::MovementWorld;
