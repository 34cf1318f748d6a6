//! # x86 I/O Port Access
//!
//! Thin wrappers around the `in`/`out` instructions for devices living in
//! the legacy 16-bit I/O port space. The PM1 control blocks and the SMI
//! command register published by the firmware are all port-mapped, so this
//! is the only hardware access path the power subsystem needs.

use kernel_power::PortIo;

/// Write one byte to an I/O port. Uses `out dx, al`.
///
/// # Safety
/// - Execute at CPL0 or with I/O permission for `port`; the CPU raises
///   `#GP` otherwise.
/// - `port` must belong to the intended device and be in a valid state for
///   this write; a wrong port or value can wedge the device.
/// - Coordinate with interrupt handlers and other CPUs touching the same
///   device so register-level protocols are not torn.
#[inline]
pub unsafe fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!("out dx, al", in("dx") port, in("al") val, options(nomem, nostack, preserves_flags));
    }
}

/// Read one byte from an I/O port. Uses `in al, dx`.
///
/// # Safety
/// Same requirements as [`outb`]; reads from the wrong port yield garbage
/// or stall the device's protocol.
#[inline]
pub unsafe fn inb(port: u16) -> u8 {
    let mut v: u8;
    unsafe {
        core::arch::asm!("in al, dx", in("dx") port, out("al") v, options(nomem, nostack, preserves_flags));
    }
    v
}

/// Write one word to an I/O port. Uses `out dx, ax`.
///
/// # Safety
/// Same requirements as [`outb`].
#[inline]
pub unsafe fn outw(port: u16, val: u16) {
    unsafe {
        core::arch::asm!("out dx, ax", in("dx") port, in("ax") val, options(nomem, nostack, preserves_flags));
    }
}

/// Read one word from an I/O port. Uses `in ax, dx`.
///
/// # Safety
/// Same requirements as [`inb`].
#[inline]
pub unsafe fn inw(port: u16) -> u16 {
    let mut v: u16;
    unsafe {
        core::arch::asm!("in ax, dx", in("dx") port, out("ax") v, options(nomem, nostack, preserves_flags));
    }
    v
}

/// The machine's I/O port space, as seen from ring 0.
pub struct IoPorts;

impl PortIo for IoPorts {
    unsafe fn read_u8(&self, port: u16) -> u8 {
        unsafe { inb(port) }
    }

    unsafe fn write_u8(&self, port: u16, value: u8) {
        unsafe { outb(port, value) }
    }

    unsafe fn read_u16(&self, port: u16) -> u16 {
        unsafe { inw(port) }
    }

    unsafe fn write_u16(&self, port: u16, value: u16) {
        unsafe { outw(port, value) }
    }
}
