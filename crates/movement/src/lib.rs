pub mod bounds;
pub mod config;
pub mod force;
pub mod integrator;
pub mod nav;
pub mod net;
pub mod role;
pub mod rotation;
pub mod simulation;
pub mod snapshot;
pub mod state;
pub mod teleport;

pub use bounds::{Bounds, CylinderShape};
pub use config::{ForceConfig, MovementCapabilities, MovementConfig, SpeedTable};
pub use force::{
    ForceApplier, ForceComposer, ForceMode, ForceSource, ForceSourceType, ForceUpdate,
    ForceUpdateContext, ForceUpdateListener,
};
pub use integrator::{IntegratorContext, MovementInput, MovementIntegrator, SpeedProvider};
pub use nav::{Navigator, StraightLineAgent};
pub use net::{
    Channel, CodecError, Delivery, Inbound, Inbox, InboxSender, MotionSnapshot, TeleportAck,
    TeleportRequest, WireMessage, inbox,
};
pub use role::Role;
pub use rotation::RotationSmoother;
pub use simulation::{FixedTimestep, SimulationLoop};
pub use snapshot::{EntityId, MovementEntity, MovementWorld, TickState, TickStateBuffer};
pub use state::{ExtraMovementState, MotionState, TeleportState};
pub use teleport::{
    ConfirmWait, Preparation, TeleportCoordinator, TeleportPreparer, TickDelayPreparer, WaitError,
    WaitStatus, Warp,
};
