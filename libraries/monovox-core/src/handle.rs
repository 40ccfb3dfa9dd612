//! Typed handles for backend resources
//!
//! Backends hand out small integer names for the objects they own. Each
//! resource kind gets its own newtype so a buffer name can never be passed
//! where a source is expected. Absence is always `Option::None`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a backend-assigned name
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Backend-assigned name
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Handle to an opened output device
    DeviceHandle,
    "device"
);
define_handle!(
    /// Handle to a rendering context bound to a device
    ContextHandle,
    "context"
);
define_handle!(
    /// Handle to a playback voice
    SourceHandle,
    "source"
);
define_handle!(
    /// Handle to a sample data store
    BufferHandle,
    "buffer"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_resource_kind() {
        assert_eq!(DeviceHandle::new(3).to_string(), "device#3");
        assert_eq!(ContextHandle::new(1).to_string(), "context#1");
        assert_eq!(SourceHandle::new(7).to_string(), "source#7");
        assert_eq!(BufferHandle::new(9).to_string(), "buffer#9");
    }

    #[test]
    fn raw_round_trips() {
        assert_eq!(SourceHandle::new(42).raw(), 42);
    }
}
