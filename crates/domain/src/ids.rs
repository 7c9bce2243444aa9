use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

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
    };
}

// Socket connections on the protocol server
define_id!(ConnectionId);

// Bridge request/reply pairing
define_id!(CorrelationId);

/// Fresh component id of the form `<prefix>-<uuid>`.
pub fn generate_component_id(prefix: &str) -> String {
    format!("{}-{}", prefix.to_ascii_lowercase(), Uuid::new_v4())
}
