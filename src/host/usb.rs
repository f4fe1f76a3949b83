use std::fmt::{Display, Formatter};
use std::time::Duration;

use rusb::UsbContext;
use tracing::{debug, trace, warn};

use crate::fw::{FirmwareVersion, FIRMWARE_ENDPOINT, FIRMWARE_XFER_LEN};

use super::*;

type Device = rusb::Device<rusb::Context>;
type DeviceHandle = rusb::DeviceHandle<rusb::Context>;

/// Default firmware read timeout.
pub const TIMEOUT: Duration = Duration::from_millis(1000);

/// Maximum number of input endpoints considered per interface.
const MAX_INPUT_ENDPOINTS: usize = 15;

/// Provides access to USB devices.
#[derive(Debug)]
pub struct Usb {
    ctx: rusb::Context,
    timeout: Duration,
}

impl Usb {
    /// Returns a new `Usb` instance.
    pub fn new() -> Result<Self> {
        Ok(Self {
            ctx: Self::new_ctx()?,
            timeout: TIMEOUT,
        })
    }

    #[cfg(windows)]
    fn new_ctx() -> rusb::Result<rusb::Context> {
        // UsbDk isn't required, but it's more feature-rich and simpler to use
        // than WinUSB or other alternatives
        rusb::Context::with_options(&[rusb::UsbOption::use_usbdk()])
    }

    #[cfg(not(windows))]
    fn new_ctx() -> rusb::Result<rusb::Context> {
        rusb::Context::new()
    }

    /// Sets the timeout for firmware reads from interfaces returned by
    /// subsequent queries.
    #[inline]
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the first interface of every attached device that matches the
    /// filter, ordered by bus number and address.
    pub fn query(&self, f: &Filter) -> Result<Vec<UsbInterface>> {
        let mut v: Vec<UsbInterface> = (self.ctx.devices()?.iter())
            .filter_map(|dev| UsbInterface::for_device(dev, f, self.timeout))
            .collect();
        v.sort_unstable_by_key(UsbInterface::key);
        Ok(v)
    }
}

/// Device descriptor identifiers used for matching.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Device release number in binary-coded decimal.
    pub bcd_device: u16,
}

impl DeviceId {
    fn from_descriptor(d: &rusb::DeviceDescriptor) -> Self {
        Self {
            vendor_id: d.vendor_id(),
            product_id: d.product_id(),
            bcd_device: bcd(d.device_version()),
        }
    }
}

/// Re-encodes a decoded release number as BCD. `major` holds two decimal
/// digits.
fn bcd(v: rusb::Version) -> u16 {
    let major = u16::from(v.major());
    (major / 10 % 10) << 12
        | (major % 10) << 8
        | u16::from(v.minor() & 0xF) << 4
        | u16::from(v.sub_minor() & 0xF)
}

/// Interface filter. Unset fields match any device.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Filter {
    pub vendor_id: Option<u16>,
    pub bcd_device_min: Option<u16>,
}

impl Filter {
    /// Returns a filter that matches all Microsoft devices.
    #[inline]
    #[must_use]
    pub const fn microsoft() -> Self {
        Self {
            vendor_id: Some(xbcompat_const::VENDOR_ID),
            bcd_device_min: Some(0),
        }
    }

    /// Returns whether the device matches the filter.
    #[must_use]
    pub fn matches(&self, id: &DeviceId) -> bool {
        self.vendor_id.map_or(true, |v| v == id.vendor_id)
            && self.bcd_device_min.map_or(true, |v| v <= id.bcd_device)
    }
}

/// First interface of an attached USB device.
#[derive(Debug)]
pub struct UsbInterface {
    dev: Device,
    id: DeviceId,
    /// Interface number and firmware endpoint, or the error that prevented
    /// reading the active configuration.
    ifc: rusb::Result<(u8, Option<Endpoint>)>,
    timeout: Duration,
}

impl UsbInterface {
    /// Returns `Some(UsbInterface)` if `dev` matches the filter. Devices whose
    /// configuration cannot be read are kept, and the error is returned by
    /// [`Controller::read_firmware`].
    fn for_device(dev: Device, f: &Filter, timeout: Duration) -> Option<Self> {
        let id = dev
            .device_descriptor()
            .map_err(|e| warn!("Failed to get device descriptor for {dev:?} ({e})"))
            .ok()
            .map(|d| DeviceId::from_descriptor(&d))?;
        if !f.matches(&id) {
            return None;
        }
        debug!("Matching device at {dev:?}");
        trace!("|__ {id:04X?}");
        let ifc = Endpoint::discover(&dev);
        Some(Self {
            dev,
            id,
            ifc,
            timeout,
        })
    }

    /// Returns the device identifiers.
    #[inline(always)]
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the bus number and address, which uniquely identify the device
    /// while it remains attached.
    #[inline]
    #[must_use]
    pub fn key(&self) -> (u8, u8) {
        (self.dev.bus_number(), self.dev.address())
    }

    fn open(&self, iface: u8) -> Result<DeviceHandle> {
        debug!("Opening {:?}", self.dev);
        let h = self.dev.open()?;
        match h.set_auto_detach_kernel_driver(true) {
            // Not supported on Windows and macOS
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(e) => return Err(e.into()),
        }
        debug!("Claiming interface {iface}");
        h.claim_interface(iface)?;
        Ok(h)
    }

    fn read_announce(&self, h: &DeviceHandle, ep: Endpoint) -> Result<FirmwareVersion> {
        let mut b = [0_u8; FIRMWARE_XFER_LEN];
        let n = h.read_interrupt(ep.addr, &mut b, self.timeout)?;
        trace!("Firmware announcement: {:02X?}", &b[..n]);
        if n < FIRMWARE_XFER_LEN {
            debug!("Short firmware read ({n} of {FIRMWARE_XFER_LEN} bytes)");
        }
        Ok(FirmwareVersion::decode(&b).unwrap_or_default())
    }
}

impl Controller for UsbInterface {
    #[inline(always)]
    fn vendor_id(&self) -> u16 {
        self.id.vendor_id
    }

    #[inline(always)]
    fn product_id(&self) -> u16 {
        self.id.product_id
    }

    fn read_firmware(&self) -> Result<FirmwareVersion> {
        let (iface, ep) = self.ifc?;
        let h = self.open(iface)?;
        let r = match ep {
            Some(ep) => self.read_announce(&h, ep),
            None => {
                debug!("No firmware endpoint on {:?}", self.dev);
                Ok(FirmwareVersion::default())
            }
        };
        debug!("Releasing interface {iface}");
        if let Err(e) = h.release_interface(iface) {
            warn!("Failed to release interface {iface} ({e})");
        }
        r
    }
}

impl Display for UsbInterface {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (bus, addr) = self.key();
        write!(
            f,
            "Bus {bus:03} Device {addr:03}: ID {:04x}:{:04x}",
            self.id.vendor_id, self.id.product_id
        )
    }
}

/// Interrupt IN endpoint that carries the firmware announcement.
#[derive(Clone, Copy, Debug)]
struct Endpoint {
    addr: u8,
    max_packet_size: u16,
}

impl Endpoint {
    /// Returns the first interface number of the active configuration and the
    /// firmware endpoint, if the interface has one. Returns
    /// [`rusb::Error::NotFound`] if the device has no interfaces.
    fn discover(dev: &Device) -> rusb::Result<(u8, Option<Self>)> {
        let cfg = dev
            .active_config_descriptor()
            .map_err(|e| {
                warn!("Failed to get config descriptor for {dev:?} ({e})");
                e
            })?;
        trace!("|__ Active {cfg:?}");
        let Some(ifd) = (cfg.interfaces().next())
            .and_then(|ifc| ifc.descriptors().find(|id| id.setting_number() == 0))
        else {
            warn!("No interfaces on {dev:?}");
            return Err(rusb::Error::NotFound);
        };
        trace!("    |__ {ifd:?}");
        let ep = (ifd.endpoint_descriptors())
            .filter(|epd| epd.direction() == rusb::Direction::In)
            .take(MAX_INPUT_ENDPOINTS)
            .inspect(|epd| trace!("        |__ {epd:?}"))
            .find(|epd| epd.address() == FIRMWARE_ENDPOINT)
            .map(|epd| Self {
                addr: epd.address(),
                max_packet_size: epd.max_packet_size(),
            });
        if let Some(ep) = ep {
            debug!(
                "Firmware endpoint {:#04X} (max packet size {})",
                ep.addr, ep.max_packet_size
            );
        }
        Ok((ifd.interface_number(), ep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter() {
        let id = |vendor_id, bcd_device| DeviceId {
            vendor_id,
            product_id: 0x0B12,
            bcd_device,
        };
        let f = Filter::microsoft();
        assert!(f.matches(&id(0x045E, 0)));
        assert!(f.matches(&id(0x045E, 0x0508)));
        assert!(!f.matches(&id(0x054C, 0x0100)));

        let f = Filter {
            vendor_id: None,
            bcd_device_min: Some(0x0200),
        };
        assert!(f.matches(&id(0x054C, 0x0200)));
        assert!(!f.matches(&id(0x045E, 0x01FF)));

        assert!(Filter::default().matches(&id(0, 0)));
    }

    #[test]
    fn bcd_device() {
        for raw in [0x0000, 0x0100, 0x0508, 0x1000, 0x1234, 0x2001, 0x9999] {
            assert_eq!(bcd(rusb::Version::from_bcd(raw)), raw, "{raw:#06X}");
        }
        // Release 0x1000 must not sort below 0x0A00 when filtering
        let f = Filter {
            vendor_id: None,
            bcd_device_min: Some(0x0A00),
        };
        let id = DeviceId {
            bcd_device: bcd(rusb::Version::from_bcd(0x1000)),
            ..DeviceId::default()
        };
        assert!(f.matches(&id));
    }
}
