//! # ACPI (Advanced Configuration and Power Interface) Table Discovery
//!
//! This crate parses the small set of ACPI structures a kernel needs to
//! discover the platform's soft-off (S5) mechanism. ACPI is the standardized
//! interface between the operating system and the platform firmware; the
//! tables parsed here describe where the power-management control registers
//! live and which sleep-type codes request the soft-off state.
//!
//! ## Table chain
//!
//! ```text
//! BIOS/firmware memory (EBDA, 0xE0000..0x100000)
//!     ↓ signature scan
//! RSDP/XSDP (Root System Description Pointer)
//!     ↓
//! RSDT/XSDT (Root/Extended System Description Table)
//!     ↓
//! FADT ("FACP", fixed power-management description)
//!     ↓
//! DSDT (AML bytecode, scanned for the \_S5 package)
//! ```
//!
//! ## Key components
//!
//! * [`PhysMapRo`] — abstract trait for read-only access to physical memory
//!   regions. The parser never owns or writes firmware memory; every table is
//!   a borrowed byte-slice view produced by this seam. Tests substitute a
//!   synthetic in-memory firmware image.
//! * [`rsdp`] — signature scan over the platform's reserved windows, plus
//!   RSDP/XSDP validation (checksum, and the independent extended checksum
//!   for revision-2 descriptors).
//! * [`sdt`] — the common system description table header, header/checksum
//!   validation, and the walk over the root table's pointer entries.
//! * [`fadt`] — the fixed power-management table layout and extraction of
//!   the SMI command port, enable/disable commands, and PM1 control blocks.
//! * [`aml`] — a bounded linear scan of the DSDT bytecode for the `\_S5`
//!   package and decoding of its two sleep-type operands. This is explicitly
//!   a byte-pattern scan, not an AML interpreter.
//!
//! ## Trust model
//!
//! Every length field and pointer in these tables originates from firmware
//! memory and is treated as untrusted: lengths are bounds-checked before
//! they become loop counts or mapping sizes, pointers are validated by
//! signature and checksum before the pointed-to data is used, and any
//! deviation degrades to an [`AcpiError`] instead of a crash. A platform
//! without ACPI is a normal, non-fatal outcome.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod aml;
pub mod fadt;
pub mod rsdp;
pub mod sdt;

/// Map a physical region and return a *read-only* byte slice for its contents.
/// You provide the implementation (identity map, kmap, etc.).
pub trait PhysMapRo {
    /// # Safety
    /// The implementor must ensure the returned slice is valid for `len` bytes.
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8];
}

/// Discovery and extraction failures.
///
/// All of these are recoverable: the caller degrades to "power management
/// unavailable" rather than treating any of them as fatal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AcpiError {
    /// The descriptor, table or named object does not exist on this platform.
    #[error("table or object not found")]
    NotFound,
    /// A signature matched but the record's byte-sum invariant does not hold.
    #[error("checksum invalid")]
    ChecksumInvalid,
    /// A structural assumption about the table contents failed.
    #[error("malformed table payload")]
    MalformedPayload,
    /// A required pointer or command field is null.
    #[error("required field is absent")]
    Unsupported,
}

fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |a, &b| a.wrapping_add(b))
}
