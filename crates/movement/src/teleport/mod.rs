mod coordinator;
mod preparer;
mod wait;

pub use coordinator::{TeleportCoordinator, Warp};
pub use preparer::{Preparation, TeleportPreparer, TickDelayPreparer};
pub use wait::{ConfirmWait, WaitError, WaitStatus};
