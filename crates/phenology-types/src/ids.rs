//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every independently simulated plant and every replicate run carries a
//! strongly-typed ID so log lines and summaries from parallel workers can be
//! told apart. All IDs use UUID v7 (time-ordered).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for one simulated plant (one sequencer instance).
    PlantId
}

define_id! {
    /// Unique identifier for one replicate run of a configured crop.
    RunId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = PlantId::new();
        let b = PlantId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_round_trips_through_uuid() {
        let id = RunId::new();
        let raw: Uuid = id.into();
        assert_eq!(RunId::from(raw), id);
        assert_eq!(id.to_string(), raw.to_string());
    }
}
