//! # QEMU Debug Output
//!
//! Host-visible diagnostics for a kernel running under QEMU, built on the
//! emulator's debug console: every byte written to I/O port `0x402` shows
//! up on whatever `-debugcon` points at.
//!
//! ```text
//! log::info! / qemu_trace!
//!         ↓
//! QemuSink (core::fmt::Write)
//!         ↓
//! out 0x402, al
//!         ↓
//! qemu-system-x86_64 -debugcon stdio
//! ```
//!
//! Two surfaces are exported:
//!
//! * [`QemuLogger`], a `log::Log` backend with a level filter, so the rest
//!   of the kernel logs through the standard facade.
//! * [`qemu_trace!`], raw formatted output that bypasses the facade for
//!   very early boot or for panic paths.
//!
//! Neither allocates; formatting goes byte-by-byte straight to the port.
//! With the `enabled` feature turned off everything compiles to no-ops and
//! the port is never touched, which also makes the crate inert on real
//! hardware builds.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::QemuLogger;

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// The port number for QEMU's debug console.
    const QEMU_DEBUG_PORT: u16 = 0x402;

    /// Write a single byte to QEMU's debug console.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        unsafe { outb(QEMU_DEBUG_PORT, c) }
    }

    #[allow(clippy::inline_always)]
    #[inline(always)]
    unsafe fn outb(port: u16, val: u8) {
        unsafe {
            core::arch::asm!(
            "out dx, al",
            in("dx") port,
            in("al") val,
            options(nomem, preserves_flags)
            );
        }
    }

    /// Unbuffered sink over the debug console.
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                dbg_putc(b);
            }
            Ok(())
        }

        #[inline]
        fn write_char(&mut self, c: char) -> fmt::Result {
            // UTF-8 encode without allocation.
            let mut buf = [0u8; 4];
            let s = c.encode_utf8(&mut buf);
            self.write_str(s)
        }
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(args: fmt::Arguments) {
        // Ignore errors; this is best-effort debug output.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    pub fn qemu_write(_: fmt::Arguments) {
        // no-op when feature disabled
    }
}

/// Formatted output straight to the debug console, `format!`-style.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        // No allocation: `format_args!` builds a lightweight `Arguments`.
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
