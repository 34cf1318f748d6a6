//! # ACPI Soft-Off Power Management
//!
//! This crate turns the tables discovered by `kernel-acpi` into an actual
//! power-off capability: it assembles a [`PowerConfig`] from the FADT and
//! the DSDT's `\_S5` package, and drives the PM1 control registers through
//! [`PowerControl`] to arm the facility and request the soft-off state.
//!
//! ## Data flow
//!
//! ```text
//! physical memory scan → validated tables → PowerConfig (written once)
//!                                               ↓ read-only
//!                              PowerControl::enable / power_off
//! ```
//!
//! [`PowerConfig`] is plain `Copy` data produced in a single assignment:
//! either discovery succeeds and every field is populated, or the caller
//! gets an error and no config at all. There is no global state; the caller
//! threads the config into the controller explicitly.
//!
//! ## Hardware seams
//!
//! The controller talks to hardware through two small traits, so the whole
//! protocol runs against mock backends in tests:
//!
//! * [`PortIo`] — 8/16-bit port-mapped I/O primitives.
//! * [`Delay`] — one fixed short pause, used by the bounded poll loop while
//!   waiting for the firmware to acknowledge enablement.
//!
//! ## Degradation
//!
//! Every failure is non-fatal. A platform without ACPI, a malformed table
//! or an unresponsive control register all degrade to "power management
//! unavailable"; the machine keeps running and shutdown stays a manual
//! affair. The one exception is [`PowerControl::power_off`] itself: when it
//! *returns*, that is the failure — on working hardware the final register
//! write ends execution.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod config;
mod control;
mod pm1;

pub use config::PowerConfig;
pub use control::{POLL_BUDGET, PowerControl};
pub use pm1::Pm1Control;

/// Port-mapped I/O primitives, provided by the platform integration layer.
pub trait PortIo {
    /// # Safety
    /// `port` must be safe to read at the current privilege level.
    unsafe fn read_u8(&self, port: u16) -> u8;

    /// # Safety
    /// `port` must be safe to write at the current privilege level, and the
    /// value must be valid for the device behind it.
    unsafe fn write_u8(&self, port: u16, value: u8);

    /// # Safety
    /// See [`PortIo::read_u8`].
    unsafe fn read_u16(&self, port: u16) -> u16;

    /// # Safety
    /// See [`PortIo::write_u8`].
    unsafe fn write_u16(&self, port: u16, value: u16);
}

/// One fixed short pause between poll iterations.
pub trait Delay {
    fn pause(&self);
}

/// Controller failures.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum PowerError {
    /// The platform offers no way to enable power management, or the config
    /// is the unconfigured sentinel.
    #[error("power management is not supported on this platform")]
    Unsupported,
    /// The control register never reported the enabled state within the
    /// polling budget.
    #[error("control register never reported the enabled state")]
    Timeout,
    /// Execution continued past the soft-off write; on correct hardware
    /// control never returns from it.
    #[error("soft-off request did not power down the machine")]
    ShutdownReturned,
}
