//! # Platform Integration
//!
//! Wires the hardware-agnostic power subsystem to the actual machine: the
//! boot identity mapping stands in for physical memory access, ring-0 port
//! instructions back the register protocol, and QEMU's debug console
//! carries the logs.
//!
//! ```text
//! discover_power()                          power_off(config)
//!     │                                         │
//!     ├─ IdentityMap ──▶ kernel-acpi            ├─ IoPorts ──▶ kernel-power
//!     │   (firmware table walk)                 │   (PM1 register writes)
//!     └─ PowerConfig                            └─ never returns on success
//! ```
//!
//! Discovery failures degrade to the unconfigured sentinel instead of
//! failing the boot; a later [`power_off`] against that sentinel refuses
//! to touch any port.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod ports;

use kernel_acpi::PhysMapRo;
use kernel_power::{Delay, PowerConfig, PowerControl, PowerError};
use kernel_qemu::QemuLogger;
use log::LevelFilter;
use ports::IoPorts;

/// Physical memory through the boot identity mapping: low physical
/// addresses are mapped one-to-one, so the address is the pointer.
pub struct IdentityMap;

impl PhysMapRo for IdentityMap {
    #[allow(clippy::cast_possible_truncation)]
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8] {
        unsafe { core::slice::from_raw_parts(paddr as usize as *const u8, len) }
    }
}

/// One poll-loop pause, calibrated to a few microseconds under QEMU.
pub struct SpinDelay;

impl Delay for SpinDelay {
    fn pause(&self) {
        for _ in 0..10_000 {
            core::hint::spin_loop();
        }
    }
}

/// Install the QEMU debug-console logger. Call once, before anything logs;
/// a second call is ignored.
pub fn init_logging() {
    let _ = QemuLogger::new(LevelFilter::Trace).init();
}

/// Walk the firmware tables and capture everything the soft-off path needs.
///
/// Returns the unconfigured sentinel when any stage of discovery fails;
/// the machine keeps running without power management in that case.
#[must_use]
pub fn discover_power() -> PowerConfig {
    // The firmware areas sit in low physical memory, which the boot
    // identity mapping covers.
    match unsafe { PowerConfig::discover(&IdentityMap) } {
        Ok(config) => {
            log::info!("power management discovered via firmware tables");
            config
        }
        Err(e) => {
            log::warn!("power management unavailable: {e}");
            PowerConfig::unconfigured()
        }
    }
}

/// Request the soft-off state. On working hardware this does not return.
///
/// # Errors
/// [`PowerError::Unsupported`] against the unconfigured sentinel;
/// [`PowerError::ShutdownReturned`] when the hardware ignored the request.
pub fn power_off(config: PowerConfig) -> Result<(), PowerError> {
    PowerControl::new(config, &IoPorts, &SpinDelay).power_off()
}
