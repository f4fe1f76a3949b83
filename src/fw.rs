//! Controller firmware version.

use std::fmt::{Debug, Display, Formatter};

use structbuf::Unpacker;

/// Interrupt IN endpoint that returns the firmware announcement.
pub const FIRMWARE_ENDPOINT: u8 = 0x82;
/// Number of bytes requested from [`FIRMWARE_ENDPOINT`].
pub const FIRMWARE_XFER_LEN: usize = 0x20;
/// Offset of the version quadruple within the response.
pub const FIRMWARE_OFFSET: usize = 0x10;

/// First major version that uses the Bluetooth LE stack.
const FIRST_LE_MAJOR: u16 = 5;

/// Firmware version quadruple reported by the controller.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Serialize)]
pub struct FirmwareVersion {
    pub major: u16,
    pub minor: u16,
    pub micro: u16,
    pub rev: u16,
}

impl FirmwareVersion {
    /// Encoded size of the quadruple.
    pub const BYTES: usize = 4 * size_of::<u16>();

    /// Creates a new version.
    #[inline]
    #[must_use]
    pub const fn new(major: u16, minor: u16, micro: u16, rev: u16) -> Self {
        Self {
            major,
            minor,
            micro,
            rev,
        }
    }

    /// Decodes the version from a firmware announcement buffer. Returns
    /// [`None`] if the buffer does not reach past the version fields.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let b = buf.get(FIRMWARE_OFFSET..FIRMWARE_OFFSET + Self::BYTES)?;
        let mut p = Unpacker::new(b);
        Some(Self {
            major: p.u16(),
            minor: p.u16(),
            micro: p.u16(),
            rev: p.u16(),
        })
    }

    /// Returns whether the controller reported a real version. An all-zero
    /// response means that nothing was received.
    #[inline]
    #[must_use]
    pub const fn is_known(&self) -> bool {
        self.major > 0
    }

    /// Returns the Bluetooth stack implemented by this firmware.
    #[must_use]
    pub const fn stack(&self) -> BtStack {
        if !self.is_known() {
            BtStack::Unknown
        } else if self.major < FIRST_LE_MAJOR {
            BtStack::Classic
        } else {
            BtStack::Le
        }
    }
}

impl Debug for FirmwareVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FirmwareVersion")
            .field(&format_args!("{self}"))
            .finish()
    }
}

impl Display for FirmwareVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.micro, self.rev)
    }
}

/// Bluetooth stack used by the controller firmware.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum BtStack {
    /// Bluetooth Classic (BR/EDR), firmware major version below 5.
    Classic,
    /// Bluetooth Low Energy.
    Le,
    /// The firmware version could not be determined.
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announce(v: [u16; 4]) -> [u8; FIRMWARE_XFER_LEN] {
        let mut b = [0; FIRMWARE_XFER_LEN];
        b[0] = 0x02; // Preceding header bytes are ignored
        b[1] = 0x20;
        for (i, x) in v.into_iter().enumerate() {
            let off = FIRMWARE_OFFSET + 2 * i;
            b[off..off + 2].copy_from_slice(&x.to_le_bytes());
        }
        b
    }

    #[test]
    fn decode() {
        let v = FirmwareVersion::decode(&announce([5, 17, 3202, 0])).unwrap();
        assert_eq!(v, FirmwareVersion::new(5, 17, 3202, 0));
        assert_eq!(v.to_string(), "5.17.3202.0");
        assert_eq!(v.stack(), BtStack::Le);

        let v = FirmwareVersion::decode(&announce([4, 8, 1923, 1])).unwrap();
        assert_eq!(v.to_string(), "4.8.1923.1");
        assert_eq!(v.stack(), BtStack::Classic);
    }

    #[test]
    fn decode_little_endian() {
        let mut b = [0; FIRMWARE_XFER_LEN];
        b[FIRMWARE_OFFSET..FIRMWARE_OFFSET + 8].copy_from_slice(&[3, 0, 1, 1, 0x82, 0x0C, 0, 0]);
        let v = FirmwareVersion::decode(&b).unwrap();
        assert_eq!(v, FirmwareVersion::new(3, 0x0101, 0x0C82, 0));
    }

    #[test]
    fn decode_short() {
        let b = announce([5, 1, 2, 3]);
        assert!(FirmwareVersion::decode(&b[..FIRMWARE_OFFSET + 7]).is_none());
        assert!(FirmwareVersion::decode(&[]).is_none());
        let v = FirmwareVersion::decode(&b[..FIRMWARE_OFFSET + 8]).unwrap();
        assert_eq!(v, FirmwareVersion::new(5, 1, 2, 3));
    }

    #[test]
    fn stack() {
        assert_eq!(FirmwareVersion::default().stack(), BtStack::Unknown);
        assert_eq!(FirmwareVersion::new(0, 9, 9, 9).stack(), BtStack::Unknown);
        assert_eq!(FirmwareVersion::new(1, 0, 0, 0).stack(), BtStack::Classic);
        assert_eq!(FirmwareVersion::new(4, 0xFFFF, 0, 0).stack(), BtStack::Classic);
        assert_eq!(FirmwareVersion::new(5, 0, 0, 0).stack(), BtStack::Le);
    }
}
