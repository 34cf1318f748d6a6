//! # RSDP/XSDP (Root/Extended System Description Pointer)
//!
//! The root descriptor is the entry point into the ACPI table chain. On
//! legacy-BIOS platforms it is not handed to the OS; it has to be found by
//! scanning two reserved physical windows for the `"RSD PTR "` signature:
//! the first KiB of the EBDA (whose real-mode segment is published at
//! physical `0x40E`) and the BIOS area `0xE0000..0x100000`. The descriptor
//! is always placed on a 16-byte boundary, so the scan steps in 16-byte
//! increments.
//!
//! A signature match alone proves nothing; every candidate must satisfy the
//! byte-sum checksum over the 20-byte ACPI 1.0 record, and a revision-2
//! descriptor must additionally satisfy the extended checksum over its own
//! declared length. An exhausted scan is a normal outcome: the platform
//! simply has no ACPI facility.

use crate::{AcpiError, PhysMapRo, sum};

/// The 8-byte signature marking a root descriptor candidate.
pub const RSDP_SIGNATURE: &[u8; 8] = b"RSD PTR ";

/// The BIOS read-only area scanned for the signature.
pub const BIOS_AREA: core::ops::Range<u64> = 0x000E_0000..0x0010_0000;

/// Physical address of the real-mode EBDA segment pointer.
const EBDA_SEGMENT_PTR: u64 = 0x40E;

/// Only the first KiB of the EBDA may hold the descriptor.
const EBDA_WINDOW: u64 = 1024;

/// Descriptors are placed on 16-byte boundaries.
const RSDP_ALIGN: u64 = 16;

/// Upper bound for the XSDP's untrusted `length` field.
const XSDP_MAX_LEN: usize = 256;

/// The validated root of the table chain.
#[derive(Debug)]
pub struct AcpiRoots {
    pub rsdp_addr: u64,
    pub rsdt_addr: Option<u64>,
    pub xsdt_addr: Option<u64>,
}

/// ACPI 1.0 Root System Description Pointer (RSDP)
#[derive(Clone)]
#[repr(C, packed)]
struct Rsdp {
    signature: [u8; 8], // "RSD PTR "
    checksum: u8,       // sum of first 20 bytes == 0
    oem_id: [u8; 6],
    revision: u8, // 0 for ACPI 1.0
    rsdt_addr: u32,
}

/// ACPI 2.0 Extended System Description Pointer (XSDP)
#[derive(Clone)]
#[repr(C, packed)]
struct Xsdp {
    signature: [u8; 8], // "RSD PTR "
    checksum: u8,       // sum of first 20 bytes == 0
    oem_id: [u8; 6],
    revision: u8, // 2 for ACPI 2.0
    _deprecated: u32,
    length: u32,
    xsdt_addr: u64,
    ext_checksum: u8, // checksum of the entire table
    reserved: [u8; 3],
}

impl AcpiRoots {
    /// Validate the RSDP/XSDP at the given physical address.
    ///
    /// Revision-2 descriptors carry an extended record whose checksum must
    /// hold independently; a base-valid but extension-corrupt descriptor is
    /// rejected. The extension's `length` field is untrusted and is bounded
    /// before it becomes a mapping size.
    ///
    /// # Errors
    /// [`AcpiError::Unsupported`] for a null address, [`AcpiError::NotFound`]
    /// when the signature does not match, [`AcpiError::ChecksumInvalid`] or
    /// [`AcpiError::MalformedPayload`] for corrupt records.
    ///
    /// # Safety
    /// `rsdp_addr` must be readable through `map` for the descriptor's size.
    #[allow(clippy::similar_names)]
    pub unsafe fn parse(map: &impl PhysMapRo, rsdp_addr: u64) -> Result<Self, AcpiError> {
        if rsdp_addr == 0 {
            return Err(AcpiError::Unsupported);
        }

        unsafe {
            let v1 = map.map_ro(rsdp_addr, size_of::<Rsdp>());
            if &v1[0..8] != RSDP_SIGNATURE {
                return Err(AcpiError::NotFound);
            }
            if sum(v1) != 0 {
                return Err(AcpiError::ChecksumInvalid);
            }

            let v1p = &*v1.as_ptr().cast::<Rsdp>();
            let revision = v1p.revision;
            let rsdt_addr = (v1p.rsdt_addr != 0).then_some(u64::from(v1p.rsdt_addr));

            if revision >= 2 {
                // Need the full v2 record to read length + xsdt
                let v2 = map.map_ro(rsdp_addr, size_of::<Xsdp>());
                let v2p = &*v2.as_ptr().cast::<Xsdp>();
                let len = v2p.length as usize;
                if !(size_of::<Xsdp>()..=XSDP_MAX_LEN).contains(&len) {
                    return Err(AcpiError::MalformedPayload);
                }
                let full = map.map_ro(rsdp_addr, len);
                if sum(full) != 0 {
                    return Err(AcpiError::ChecksumInvalid);
                }
                log::debug!("root descriptor revision {revision} at {rsdp_addr:#x}");
                return Ok(Self {
                    rsdp_addr,
                    rsdt_addr,
                    xsdt_addr: (v2p.xsdt_addr != 0).then_some(v2p.xsdt_addr),
                });
            }

            log::debug!("root descriptor revision {revision} at {rsdp_addr:#x}");
            Ok(Self {
                rsdp_addr,
                rsdt_addr,
                xsdt_addr: None,
            })
        }
    }
}

/// Locate and validate the root descriptor.
///
/// Scans the EBDA window first, then the BIOS area. The first structurally
/// valid candidate wins; coincidental signature matches that fail validation
/// are skipped and the scan continues.
///
/// # Errors
/// [`AcpiError::NotFound`] when both windows are exhausted. This is the
/// normal outcome on a platform without ACPI and is not fatal.
///
/// # Safety
/// The scan windows and the EBDA segment pointer at `0x40E` must be readable
/// through `map`.
pub unsafe fn find_root_descriptor(map: &impl PhysMapRo) -> Result<AcpiRoots, AcpiError> {
    unsafe {
        let seg = map.map_ro(EBDA_SEGMENT_PTR, 2);
        let ebda = u64::from(u16::from_le_bytes([seg[0], seg[1]])) << 4;
        if ebda != 0 && ebda < 0xA_0000 {
            if let Some(roots) = scan_window(map, ebda, ebda + EBDA_WINDOW) {
                return Ok(roots);
            }
        }

        scan_window(map, BIOS_AREA.start, BIOS_AREA.end).ok_or(AcpiError::NotFound)
    }
}

unsafe fn scan_window(map: &impl PhysMapRo, start: u64, end: u64) -> Option<AcpiRoots> {
    let mut addr = start & !(RSDP_ALIGN - 1);
    while addr < end {
        unsafe {
            if map.map_ro(addr, RSDP_SIGNATURE.len()) == RSDP_SIGNATURE
                && let Ok(roots) = AcpiRoots::parse(map, addr)
            {
                return Some(roots);
            }
        }
        addr += RSDP_ALIGN;
    }
    None
}
