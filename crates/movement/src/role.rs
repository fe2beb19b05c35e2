use serde::{Deserialize, Serialize};

/// Which side of the connection this instance of an entity lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Server copy. `remote_owner` is set when a client simulates the entity.
    Server { remote_owner: bool },
    /// The client that simulates its own entity.
    OwnerClient,
    /// Any other client's copy; interpolation only.
    Proxy,
}

impl Role {
    pub fn is_authority(self) -> bool {
        matches!(self, Self::Server { .. })
    }

    pub fn can_simulate(self) -> bool {
        matches!(self, Self::OwnerClient | Self::Server { remote_owner: false })
    }

    pub fn has_remote_owner(self) -> bool {
        matches!(self, Self::Server { remote_owner: true })
    }

    pub fn is_owner_client(self) -> bool {
        matches!(self, Self::OwnerClient)
    }
}
