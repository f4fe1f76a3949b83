//! Xbox controller Bluetooth compatibility checker.
//!
//! Inspects Microsoft USB devices via [libusb], identifies known Xbox
//! controller variants, reads the firmware version of Bluetooth-capable
//! models, and reports whether the firmware uses the Classic or LE Bluetooth
//! stack and whether it can be downgraded.
//!
//! [libusb]: https://github.com/libusb/libusb

#![warn(missing_debug_implementations)]
#![warn(non_ascii_idents)]
#![warn(single_use_lifetimes)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_lifetimes)]
#![warn(unused_qualifications)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::print_stdout)]
#![warn(clippy::str_to_string)]
#![warn(clippy::todo)]
#![warn(clippy::unseparated_literal_suffix)]

pub use xbcompat_const::{ControllerInfo, Variant, VENDOR_ID};

pub mod fw;
pub mod host;
pub mod report;
pub mod watch;
