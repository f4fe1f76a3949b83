#![allow(clippy::print_stdout)]

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

use xbcompat::host::{Filter, Usb};
use xbcompat::report::Report;
use xbcompat::watch::Watcher;

/// Checks whether an Xbox controller connected via USB supports Bluetooth and
/// which Bluetooth stack its firmware uses.
#[derive(Clone, Copy, Debug, clap::Parser)]
#[command(version, about)]
struct Args {
    /// Vendor ID of the devices to inspect.
    #[arg(long, value_parser=hex16, default_value = "045e")]
    vid: u16,

    /// Minimum device release number (bcdDevice) of the devices to inspect.
    #[arg(long, value_parser=hex16, default_value = "0")]
    bcd_min: u16,

    /// Bus rescan period in milliseconds.
    #[arg(short, long, default_value_t = 250)]
    interval: u64,

    /// Firmware read timeout in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    timeout: u64,

    /// Inspect the currently attached devices and exit.
    #[arg(long)]
    once: bool,

    /// Print one JSON object per device instead of the text report.
    #[arg(long)]
    json: bool,
}

impl Args {
    const fn filter(&self) -> Filter {
        Filter {
            vendor_id: Some(self.vid),
            bcd_device_min: Some(self.bcd_min),
        }
    }
}

fn hex16(s: &str) -> Result<u16, std::num::ParseIntError> {
    let s = s.trim();
    let s = (s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))).unwrap_or(s);
    u16::from_str_radix(s, 16)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr to keep the report on stdout intact
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    debug!("{args:?}");
    let usb = Usb::new()?.with_timeout(Duration::from_millis(args.timeout));
    let mut w = Watcher::new();
    if !args.json {
        banner(args.once);
    }

    // Devices that are already attached are reported by the first scan
    scan(&usb, &args, &mut w)?;
    if args.once {
        if w.is_empty() {
            warn!("No matching devices attached");
        }
        return Ok(());
    }

    let mut tick = tokio::time::interval(Duration::from_millis(args.interval.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick.tick().await;
    let mut exit = std::pin::pin!(tokio::signal::ctrl_c());
    loop {
        tokio::select! {
            r = &mut exit => {
                r?;
                break;
            }
            _ = tick.tick() => {
                if let Err(e) = scan(&usb, &args, &mut w) {
                    warn!("Bus scan failed ({e})");
                }
            }
        }
    }
    info!("Exiting");
    Ok(())
}

fn banner(once: bool) {
    println!("Xbox Controller Bluetooth Compatibility Tool\n");
    println!("Connect an Xbox controller via USB to determine Bluetooth compatibility.");
    println!("Make sure no other driver or tool holds the controller, as it may interfere with USB.\n");
    if !once {
        println!("Press Ctrl-C to exit.\n");
    }
}

/// Rescans the bus and prints a report for every newly attached device.
fn scan(usb: &Usb, args: &Args, w: &mut Watcher) -> Result<()> {
    for ifc in w.arrivals(usb.query(&args.filter())?, |ifc| ifc.key()) {
        debug!("Inspecting {ifc}");
        let r = Report::inspect(&ifc);
        if args.json {
            println!("{}", serde_json::to_string(&r)?);
        } else {
            println!("{r}");
        }
    }
    trace!("{} matching device(s) attached", w.len());
    Ok(())
}
