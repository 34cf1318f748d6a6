//! # System Description Tables
//!
//! Every ACPI sub-table starts with the same 36-byte header: a 4-byte
//! signature and a 32-bit total length (header included), followed by OEM
//! identification. The table's byte-sum over exactly `length` bytes must be
//! zero. The root table (RSDT, or XSDT on revision-2 platforms) is an
//! indirection table: its payload is a packed array of physical pointers to
//! further sub-table headers.
//!
//! `length` and every pointer entry originate from firmware memory and are
//! untrusted. Lengths are bounded before use, pointer targets are validated
//! by signature and checksum before their contents matter, and a malformed
//! root degrades to "not found" rather than a crash.

use crate::rsdp::AcpiRoots;
use crate::{AcpiError, PhysMapRo, sum};

/// Common header prefix of every system description table.
#[derive(Clone, Copy)]
#[repr(C, packed)]
pub struct SdtHeader {
    pub signature: [u8; 4],
    pub length: u32, // total bytes, header included
    pub revision: u8,
    pub checksum: u8, // sum over `length` bytes == 0
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: u32,
    pub creator_revision: u32,
}

/// Size of [`SdtHeader`]; the payload starts at this offset.
pub const SDT_HEADER_LEN: usize = size_of::<SdtHeader>();

/// Cap for the untrusted `length` field before it becomes a loop bound.
const MAX_TABLE_LEN: usize = 4 * 1024 * 1024;

/// Validate the header at `paddr` against `signature` and checksum the whole
/// table. Returns the table's total length on success.
///
/// # Errors
/// [`AcpiError::Unsupported`] for a null pointer, [`AcpiError::NotFound`] on
/// a signature mismatch, [`AcpiError::MalformedPayload`] when the declared
/// length is out of bounds, [`AcpiError::ChecksumInvalid`] when the byte-sum
/// invariant fails.
///
/// # Safety
/// `paddr` must be readable through `map` for the table's declared length.
pub unsafe fn validate_table(
    map: &impl PhysMapRo,
    paddr: u64,
    signature: &[u8; 4],
) -> Result<usize, AcpiError> {
    if paddr == 0 {
        return Err(AcpiError::Unsupported);
    }

    unsafe {
        let head = map.map_ro(paddr, SDT_HEADER_LEN);
        if &head[0..4] != signature {
            return Err(AcpiError::NotFound);
        }
        let len = u32::from_le_bytes([head[4], head[5], head[6], head[7]]) as usize;
        if !(SDT_HEADER_LEN..=MAX_TABLE_LEN).contains(&len) {
            return Err(AcpiError::MalformedPayload);
        }
        if sum(map.map_ro(paddr, len)) == 0 {
            Ok(len)
        } else {
            Err(AcpiError::ChecksumInvalid)
        }
    }
}

/// Walk the root indirection table for the sub-table with `signature`.
///
/// Prefers the XSDT (8-byte entries) when the root descriptor advertises
/// one, falling back to the RSDT (4-byte entries). For each entry the
/// pointed-to signature is matched first, so irrelevant tables are not
/// checksummed; the first entry that matches *and* validates wins.
///
/// # Errors
/// [`AcpiError::NotFound`] when no entry matches, and also when the root
/// table itself is malformed (bad entry count, bad checksum): firmware that
/// lies about its indirection table is treated the same as firmware without
/// the requested sub-table.
///
/// # Safety
/// The root table and every pointed-to table must be readable through `map`.
pub unsafe fn find_table(
    map: &impl PhysMapRo,
    roots: &AcpiRoots,
    signature: &[u8; 4],
) -> Result<u64, AcpiError> {
    unsafe {
        if let Some(xsdt) = roots.xsdt_addr
            && let Ok(addr) = walk(map, xsdt, b"XSDT", 8, signature)
        {
            return Ok(addr);
        }
        if let Some(rsdt) = roots.rsdt_addr {
            return walk(map, rsdt, b"RSDT", 4, signature);
        }
        Err(AcpiError::NotFound)
    }
}

unsafe fn walk(
    map: &impl PhysMapRo,
    root: u64,
    root_signature: &[u8; 4],
    entry_size: usize,
    signature: &[u8; 4],
) -> Result<u64, AcpiError> {
    unsafe {
        let len = validate_table(map, root, root_signature).map_err(|_| AcpiError::NotFound)?;
        let payload = len - SDT_HEADER_LEN;
        if payload % entry_size != 0 {
            return Err(AcpiError::NotFound);
        }

        let entries = map.map_ro(root + SDT_HEADER_LEN as u64, payload);
        for entry in entries.chunks_exact(entry_size) {
            let addr = if entry_size == 8 {
                u64::from_le_bytes([
                    entry[0], entry[1], entry[2], entry[3], entry[4], entry[5], entry[6], entry[7],
                ])
            } else {
                u64::from(u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]))
            };
            if addr == 0 {
                continue;
            }
            // Cheap signature peek before the full checksum pass.
            if map.map_ro(addr, 4) != signature {
                continue;
            }
            if validate_table(map, addr, signature).is_ok() {
                return Ok(addr);
            }
        }
        Err(AcpiError::NotFound)
    }
}
