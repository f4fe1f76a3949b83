//! USB host access.

use std::fmt::Debug;

pub use usb::*;

use crate::fw::FirmwareVersion;

mod usb;

/// Local host errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("usb error: {source}")]
    Usb {
        #[from]
        source: rusb::Error,
    },
}

impl Error {
    /// Returns whether the error is a result of a timeout.
    #[inline]
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            &Self::Usb {
                source: rusb::Error::Timeout
            }
        )
    }

    /// Returns the libusb return code of the failed call as a positive
    /// number, suitable for printing in hex.
    #[must_use]
    pub const fn code(&self) -> u32 {
        use rusb::Error::*;
        let &Self::Usb { source } = self;
        match source {
            Io => 1,
            InvalidParam => 2,
            Access => 3,
            NoDevice => 4,
            NotFound => 5,
            Busy => 6,
            Timeout => 7,
            Overflow => 8,
            Pipe => 9,
            Interrupted => 10,
            NoMem => 11,
            NotSupported => 12,
            _ => 99,
        }
    }
}

/// Common host result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Attached controller that can be inspected for compatibility.
pub trait Controller: Debug {
    /// Returns the USB vendor ID.
    fn vendor_id(&self) -> u16;

    /// Returns the USB product ID.
    fn product_id(&self) -> u16;

    /// Acquires the controller interface, reads the firmware announcement, and
    /// releases the interface. A controller without a firmware endpoint
    /// reports an all-zero version.
    fn read_firmware(&self) -> Result<FirmwareVersion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code() {
        let e = Error::from(rusb::Error::Timeout);
        assert!(e.is_timeout());
        assert_eq!(e.code(), 7);
        assert_eq!(format!("{:#x}", e.code()), "0x7");

        let e = Error::from(rusb::Error::Access);
        assert!(!e.is_timeout());
        assert_eq!(e.code(), 3);
        assert_eq!(Error::from(rusb::Error::Other).code(), 0x63);
    }
}
