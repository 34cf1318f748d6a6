//! # FADT ("FACP", Fixed ACPI Description Table)
//!
//! The FADT is the power-management sub-table: a fixed-layout record holding
//! the DSDT pointer, the SMI command port with its enable/disable command
//! bytes, and the PM1 control register blocks driven during soft-off. Only
//! the prefix up to `pm1_cnt_len` matters here; later revisions append more
//! fields, which this parser neither needs nor touches.

use crate::sdt::{self, SdtHeader};
use crate::{AcpiError, PhysMapRo};

/// Signature of the fixed power-management description table.
pub const FADT_SIGNATURE: &[u8; 4] = b"FACP";

/// FADT prefix; field offsets are mandated by the platform layout.
#[derive(Clone)]
#[repr(C, packed)]
struct Fadt {
    header: SdtHeader,
    firmware_ctrl: u32,
    dsdt: u32, // physical pointer to the DSDT
    _reserved: u8,
    preferred_pm_profile: u8,
    sci_int: u16,
    smi_cmd: u32, // I/O port for SMI commands
    acpi_enable: u8,
    acpi_disable: u8,
    s4bios_req: u8,
    pstate_cnt: u8,
    pm1a_evt_blk: u32,
    pm1b_evt_blk: u32,
    pm1a_cnt_blk: u32, // primary control register block
    pm1b_cnt_blk: u32, // secondary control register block, optional
    pm2_cnt_blk: u32,
    pm_tmr_blk: u32,
    gpe0_blk: u32,
    gpe1_blk: u32,
    pm1_evt_len: u8,
    pm1_cnt_len: u8,
}

/// The FADT fields this subsystem consumes, copied out of firmware memory.
#[derive(Debug, Clone, Copy)]
pub struct FadtInfo {
    /// Physical pointer to the DSDT (unvalidated until dereferenced).
    pub dsdt_addr: u64,
    /// I/O port for SMI commands; zero when the platform has none.
    pub smi_cmd: u32,
    /// Command byte that requests power-management enablement.
    pub acpi_enable: u8,
    /// Command byte that requests disablement.
    pub acpi_disable: u8,
    /// Primary PM1 control register block.
    pub pm1a_cnt_blk: u32,
    /// Secondary PM1 control register block; zero when absent.
    pub pm1b_cnt_blk: u32,
    /// Width of the PM1 control registers in bytes.
    pub pm1_cnt_len: u8,
}

/// Validate the FADT at `paddr` and copy out the power-management fields.
///
/// # Errors
/// Propagates header validation failures; [`AcpiError::MalformedPayload`]
/// when the declared length cannot cover the fixed prefix.
///
/// # Safety
/// `paddr` must be readable through `map` for the table's declared length.
pub unsafe fn parse(map: &impl PhysMapRo, paddr: u64) -> Result<FadtInfo, AcpiError> {
    unsafe {
        let len = sdt::validate_table(map, paddr, FADT_SIGNATURE)?;
        if len < size_of::<Fadt>() {
            return Err(AcpiError::MalformedPayload);
        }

        let raw = map.map_ro(paddr, size_of::<Fadt>());
        let fadt = &*raw.as_ptr().cast::<Fadt>();
        Ok(FadtInfo {
            dsdt_addr: u64::from(fadt.dsdt),
            smi_cmd: fadt.smi_cmd,
            acpi_enable: fadt.acpi_enable,
            acpi_disable: fadt.acpi_disable,
            pm1a_cnt_blk: fadt.pm1a_cnt_blk,
            pm1b_cnt_blk: fadt.pm1b_cnt_blk,
            pm1_cnt_len: fadt.pm1_cnt_len,
        })
    }
}
