//! Shared identifier newtypes, used across every subsystem crate so that an
//! `OrganizationId` can never be accidentally swapped for a `SyncId` at a
//! function boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(OrganizationId);
uuid_id!(UserId);
uuid_id!(CollectionId);
uuid_id!(SourceConnectionId);
uuid_id!(ConnectionId);
uuid_id!(SyncId);
uuid_id!(SyncJobId);
uuid_id!(SourceConnectionInitSessionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_but_share_display() {
        let org = OrganizationId::new();
        let sync = SyncId::new();
        assert_ne!(org.to_string(), "");
        assert_ne!(sync.to_string(), "");
    }
}
