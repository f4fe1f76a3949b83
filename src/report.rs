//! Controller compatibility report.

use std::fmt::{Display, Formatter};

use colored::{ColoredString, Colorize};
use tracing::{debug, warn};

use xbcompat_const::{lookup, ControllerInfo, VENDOR_ID};

use crate::fw::{BtStack, FirmwareVersion};
use crate::host::{self, Controller};

/// Compatibility report for one attached controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Report {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Known variant or [`None`] if the product ID is not in the table.
    pub variant: Option<&'static ControllerInfo>,
    /// Firmware read result. Only Bluetooth-capable variants are queried.
    pub firmware: Option<host::Result<FirmwareVersion>>,
}

impl Report {
    /// Looks up the controller variant and, if it supports Bluetooth, reads
    /// its firmware version. Only Microsoft product IDs are looked up.
    pub fn inspect(c: &impl Controller) -> Self {
        let (vendor_id, product_id) = (c.vendor_id(), c.product_id());
        let variant = if vendor_id == VENDOR_ID {
            lookup(product_id)
        } else {
            debug!("Not a Microsoft device ({vendor_id:#06X})");
            None
        };
        let firmware = match variant {
            Some(v) if v.supports_bluetooth => {
                let r = c.read_firmware();
                match r {
                    Ok(ref fw) => debug!("Firmware of {c:?}: {fw}"),
                    Err(ref e) => warn!("Failed to read firmware of {c:?} ({e})"),
                }
                Some(r)
            }
            Some(_) => None,
            None => {
                debug!("Unknown product {product_id:#06X}");
                None
            }
        };
        Self {
            vendor_id,
            product_id,
            variant,
            firmware,
        }
    }

    /// Returns the Bluetooth stack of the controller firmware or [`None`] if
    /// the firmware was not queried.
    #[must_use]
    pub fn stack(&self) -> Option<BtStack> {
        self.firmware.map(|r| r.map_or(BtStack::Unknown, |v| v.stack()))
    }

    /// Returns whether the firmware can be downgraded to Classic Bluetooth or
    /// [`None`] if the firmware was not queried.
    #[must_use]
    pub fn supports_downgrade(&self) -> Option<bool> {
        (self.firmware.is_some())
            .then_some(self.variant?)
            .map(ControllerInfo::supports_downgrade)
    }
}

/// Label column width.
const LABEL: usize = 24;

fn yes_no(v: bool) -> ColoredString {
    if v {
        "Yes".green()
    } else {
        "No".red()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn line(f: &mut Formatter<'_>, label: &str, v: impl Display) -> std::fmt::Result {
            writeln!(f, " {:<LABEL$}{v}", format!("{label}:"))
        }
        let hdr = if self.vendor_id == VENDOR_ID {
            "[!] Microsoft device connected."
        } else {
            "[!] USB device connected."
        };
        writeln!(f, "{}", hdr.yellow())?;
        line(f, "Vendor ID", format_args!("{:#06x}", self.vendor_id))?;
        line(f, "Product ID", format_args!("{:#06x}", self.product_id))?;
        let Some(info) = self.variant else {
            return line(f, "Variant", "Unknown");
        };
        line(f, "Variant", info)?;
        line(f, "Bluetooth support", yes_no(info.supports_bluetooth))?;
        let Some(fw) = self.firmware else {
            return Ok(());
        };
        match fw {
            Ok(v) => line(f, "Firmware version", v)?,
            Err(e) => line(
                f,
                "Firmware version",
                format!("Error retrieving firmware version (rc={:#x})", e.code()).red(),
            )?,
        }
        let le = match self.stack() {
            Some(BtStack::Classic) => "No".green(),
            Some(BtStack::Le) => "Yes".yellow(),
            _ => "Unknown".yellow(),
        };
        line(f, "Bluetooth LE firmware", le)?;
        line(f, "Firmware downgradeable", yes_no(info.supports_downgrade()))
    }
}

impl serde::Serialize for Report {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Json<'a> {
            vendor_id: u16,
            product_id: u16,
            variant: Option<&'a ControllerInfo>,
            #[serde(skip_serializing_if = "Option::is_none")]
            firmware: Option<FirmwareVersion>,
            #[serde(skip_serializing_if = "Option::is_none")]
            firmware_error: Option<u32>,
            #[serde(skip_serializing_if = "Option::is_none")]
            bluetooth_le: Option<BtStack>,
            #[serde(skip_serializing_if = "Option::is_none")]
            supports_downgrade: Option<bool>,
        }
        Json {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            variant: self.variant,
            firmware: self.firmware.and_then(Result::ok),
            firmware_error: self.firmware.and_then(|r| r.err()).map(|e| e.code()),
            bluetooth_le: self.stack(),
            supports_downgrade: self.supports_downgrade(),
        }
        .serialize(s)
    }
}
