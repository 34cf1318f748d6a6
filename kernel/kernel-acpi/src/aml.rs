//! # DSDT `\_S5` Extraction
//!
//! The DSDT payload is AML bytecode. Interpreting AML is out of scope; all
//! the soft-off path needs is the `\_S5` package, whose encoding is stable
//! enough to find with a bounded linear byte scan:
//!
//! ```text
//!          | (optional) |      |      |      |
//! NameOp   | '\'        | '_'  | 'S'  | '5'  | '_'
//! 0x08     | 0x5C       | 0x5F | 0x53 | 0x35 | 0x5F
//!
//! PackageOp | PkgLength | NumElements | [0x0A] SLP_TYPa | [0x0A] SLP_TYPb | ...
//! 0x12      | ..        | 0x04        | byte            | byte            |
//! ```
//!
//! The PkgLength lead byte keeps its payload in the low 6 bits; bits 6..8
//! hold the count of additional length bytes that follow. The two operands
//! may each carry a one-byte small-integer prefix (`0x0A`) that is skipped
//! when present. A `"_S5_"` hit without the surrounding operator bytes is a
//! coincidence inside unrelated bytecode and is rejected rather than
//! decoded.

use crate::{AcpiError, PhysMapRo, sdt};

/// AML `NameOp`, introducing a named object.
pub const NAME_OP: u8 = 0x08;

/// AML `PackageOp`, introducing the 4-element sleep-type package.
pub const PACKAGE_OP: u8 = 0x12;

/// AML small-integer prefix optionally preceding each operand.
pub const BYTE_PREFIX: u8 = 0x0A;

/// Root-scope prefix allowed between `NameOp` and the object name.
pub const ROOT_PREFIX: u8 = b'\\';

/// Bit position of `SLP_TYP` within the PM1 control register; operands are
/// stored pre-shifted so the controller can write them directly.
pub const SLP_TYP_SHIFT: u16 = 10;

/// Signature of the machine-code description table.
pub const DSDT_SIGNATURE: &[u8; 4] = b"DSDT";

const S5_NAME: &[u8; 4] = b"_S5_";

/// The two hardware sleep-type codes for the soft-off state, pre-shifted
/// into `SLP_TYP` position.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SleepTypes {
    pub slp_typ_a: u16,
    pub slp_typ_b: u16,
}

/// Validate the DSDT and extract the `\_S5` sleep-type operands.
///
/// # Errors
/// Header validation failures propagate; [`AcpiError::NotFound`] when the
/// payload contains no `"_S5_"` name, [`AcpiError::MalformedPayload`] when
/// the name is present but the surrounding structure is not the expected
/// package.
///
/// # Safety
/// `dsdt_addr` must be readable through `map` for the table's declared
/// length.
pub unsafe fn find_sleep_types(
    map: &impl PhysMapRo,
    dsdt_addr: u64,
) -> Result<SleepTypes, AcpiError> {
    unsafe {
        let len = sdt::validate_table(map, dsdt_addr, DSDT_SIGNATURE)?;
        let body = map.map_ro(
            dsdt_addr + sdt::SDT_HEADER_LEN as u64,
            len - sdt::SDT_HEADER_LEN,
        );
        let pos = body
            .windows(S5_NAME.len())
            .position(|window| window == S5_NAME)
            .ok_or(AcpiError::NotFound)?;
        decode_package(body, pos)
    }
}

/// Decode the package that follows a `"_S5_"` match at `pos`.
fn decode_package(body: &[u8], pos: usize) -> Result<SleepTypes, AcpiError> {
    let named = pos >= 1 && body[pos - 1] == NAME_OP;
    let rooted = pos >= 2 && body[pos - 2] == NAME_OP && body[pos - 1] == ROOT_PREFIX;
    if !(named || rooted) {
        return Err(AcpiError::MalformedPayload);
    }
    if body.get(pos + 4) != Some(&PACKAGE_OP) {
        return Err(AcpiError::MalformedPayload);
    }

    let mut i = pos + 5;
    let lead = *body.get(i).ok_or(AcpiError::MalformedPayload)?;
    // Low 6 bits are payload; bits 6..8 count extra length bytes. Skip the
    // lead byte, the extra bytes and the NumElements byte.
    i += usize::from(lead >> 6) + 2;

    let a = operand(body, &mut i)?;
    let b = operand(body, &mut i)?;
    Ok(SleepTypes {
        slp_typ_a: u16::from(a) << SLP_TYP_SHIFT,
        slp_typ_b: u16::from(b) << SLP_TYP_SHIFT,
    })
}

/// Read one operand at `*i`, skipping an optional small-integer prefix.
fn operand(body: &[u8], i: &mut usize) -> Result<u8, AcpiError> {
    let mut value = *body.get(*i).ok_or(AcpiError::MalformedPayload)?;
    if value == BYTE_PREFIX {
        *i += 1;
        value = *body.get(*i).ok_or(AcpiError::MalformedPayload)?;
    }
    *i += 1;
    Ok(value)
}
