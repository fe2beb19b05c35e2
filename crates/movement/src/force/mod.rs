mod applier;
mod composer;

pub use applier::{ForceApplier, ForceMode, ForceSource, ForceSourceType};
pub use composer::{ForceComposer, ForceUpdate, ForceUpdateContext, ForceUpdateListener};
