//! Database of known Xbox controller variants.

#![warn(missing_debug_implementations)]
#![warn(non_ascii_idents)]
#![warn(single_use_lifetimes)]
#![warn(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_lifetimes)]
#![warn(unused_qualifications)]
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::exhaustive_enums)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::print_stdout)]
#![warn(clippy::str_to_string)]
#![warn(clippy::todo)]
#![warn(clippy::unseparated_literal_suffix)]

use std::fmt::{Debug, Display, Formatter};

/// USB vendor ID assigned to Microsoft Corp.
pub const VENDOR_ID: u16 = 0x045E;

/// Static description of a controller variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[non_exhaustive]
pub struct ControllerInfo {
    /// Whether the controller hardware has a Bluetooth radio.
    pub supports_bluetooth: bool,
    /// Model number printed on the back of the controller.
    pub model: u16,
    /// Display name.
    pub name: &'static str,
}

impl ControllerInfo {
    /// First model that shipped with Bluetooth.
    pub const FIRST_BT_MODEL: u16 = 1708;
    /// First model whose firmware cannot be rolled back to the Classic
    /// Bluetooth stack.
    pub const FIRST_LOCKED_MODEL: u16 = 1914;

    /// Returns whether the controller firmware can be downgraded from LE to
    /// Classic Bluetooth.
    #[inline]
    #[must_use]
    pub const fn supports_downgrade(&self) -> bool {
        Self::FIRST_BT_MODEL <= self.model && self.model < Self::FIRST_LOCKED_MODEL
    }
}

impl Display for ControllerInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (Model {})", self.name, self.model)
    }
}

/// Generates the [`Variant`] enum and its info table from a list of
/// `Name = product_id => (bluetooth, model, "name")` entries.
macro_rules! variants {
    {$($(#[$doc:meta])* $v:ident = $pid:literal => ($bt:literal, $model:literal, $name:literal),)+} => {
        /// Known Xbox controller variant, keyed by USB product ID.
        #[derive(
            Clone,
            Copy,
            Debug,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            enum_iterator::Sequence,
            num_enum::IntoPrimitive,
            num_enum::TryFromPrimitive,
            serde::Serialize,
        )]
        #[non_exhaustive]
        #[repr(u16)]
        pub enum Variant {
            $($(#[$doc])* $v = $pid,)+
        }

        impl Variant {
            /// Returns the static description of the variant.
            #[must_use]
            pub const fn info(self) -> &'static ControllerInfo {
                match self {
                    $(Self::$v => &ControllerInfo {
                        supports_bluetooth: $bt,
                        model: $model,
                        name: $name,
                    },)+
                }
            }
        }
    };
}

variants! {
    /// Original Xbox One controller (2013).
    XboxOne = 0x02D1 => (false, 1537, "Xbox One Controller"),
    /// Xbox One controller with 3.5 mm jack (2015).
    XboxOneV2 = 0x02DD => (false, 1697, "Xbox One Controller"),
    XboxOneElite = 0x02E3 => (false, 1698, "Xbox One Elite Controller"),
    /// Xbox One S controller, first revision with Bluetooth.
    XboxOneS = 0x02EA => (true, 1708, "Xbox One X|S Controller"),
    XboxOneEliteSeries2 = 0x0B00 => (true, 1797, "Xbox One Elite Series 2 Controller"),
    XboxSeries = 0x0B12 => (true, 1914, "Xbox Series X|S Controller"),
}

impl Variant {
    /// Returns the variant for a Microsoft USB product ID or [`None`] if the
    /// product is not a known controller.
    #[inline]
    #[must_use]
    pub fn from_product_id(pid: u16) -> Option<Self> {
        Self::try_from(pid).ok()
    }

    /// Returns the USB product ID.
    #[inline(always)]
    #[must_use]
    pub fn product_id(self) -> u16 {
        u16::from(self)
    }

    /// Returns an iterator over all known variants in product ID order.
    #[inline]
    pub fn all() -> impl Iterator<Item = Self> {
        enum_iterator::all::<Self>()
    }
}

impl Display for Variant {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self.info(), f)
    }
}

/// Returns the controller description for a Microsoft USB product ID.
#[inline]
#[must_use]
pub fn lookup(pid: u16) -> Option<&'static ControllerInfo> {
    Variant::from_product_id(pid).map(Variant::info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known() {
        let v = lookup(0x0B12).unwrap();
        assert_eq!(v.name, "Xbox Series X|S Controller");
        assert_eq!(v.model, 1914);
        assert!(v.supports_bluetooth);
        assert!(!v.supports_downgrade());

        let v = lookup(0x02D1).unwrap();
        assert_eq!(v.model, 1537);
        assert!(!v.supports_bluetooth);
        assert_eq!(v.to_string(), "Xbox One Controller (Model 1537)");
    }

    #[test]
    fn lookup_unknown() {
        assert_eq!(lookup(0x0000), None);
        assert_eq!(lookup(0x028E), None); // Xbox 360 controller
        assert_eq!(lookup(u16::MAX), None);
    }

    #[test]
    fn downgrade_window() {
        let info = |model| ControllerInfo {
            supports_bluetooth: true,
            model,
            name: "",
        };
        assert!(!info(1707).supports_downgrade());
        assert!(info(1708).supports_downgrade());
        assert!(info(1913).supports_downgrade());
        assert!(!info(1914).supports_downgrade());
    }

    #[test]
    fn table() {
        let all: Vec<Variant> = Variant::all().collect();
        assert_eq!(all.len(), 6);
        for (i, &v) in all.iter().enumerate() {
            assert_eq!(Variant::from_product_id(v.product_id()), Some(v));
            if i > 0 {
                assert!(all[i - 1].product_id() < v.product_id());
            }
            // Only Bluetooth-capable models may be downgraded
            assert!(!v.info().supports_downgrade() || v.info().supports_bluetooth);
        }
        let bt: Vec<u16> = all
            .iter()
            .filter(|v| v.info().supports_bluetooth)
            .map(|v| v.info().model)
            .collect();
        assert_eq!(bt, [1708, 1797, 1914]);
    }
}
