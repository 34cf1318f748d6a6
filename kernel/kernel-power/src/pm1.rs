//! # PM1 Control Register
//!
//! Both PM1 control blocks share one 16-bit layout. The subsystem uses two
//! of its fields: `SCI_EN` (bit 0) reports that the firmware has handed
//! power-management events to the OS, and `SLP_TYP`/`SLP_EN` (bits 10..14)
//! request a sleep state when written together.

use bitfield_struct::bitfield;

/// The PM1 control register.
///
/// | Bits  | Name      | Meaning                                        |
/// |-------|-----------|------------------------------------------------|
/// | 0     | `SCI_EN`  | Power-management events routed to the OS (SCI) |
/// | 1     | `BM_RLD`  | Bus-master requests wake from C3               |
/// | 2     | `GBL_RLS` | Raise a global-release event to the firmware   |
/// | 3–9   | —         | Reserved                                       |
/// | 10–12 | `SLP_TYP` | Sleep type to enter                            |
/// | 13    | `SLP_EN`  | Enter the sleep state on write                 |
/// | 14–15 | —         | Reserved                                       |
#[bitfield(u16)]
pub struct Pm1Control {
    /// `SCI_EN` (bit 0): the facility is armed; set by hardware in response
    /// to the enable command, never written directly.
    pub sci_en: bool,

    /// `BM_RLD` (bit 1).
    pub bm_rld: bool,

    /// `GBL_RLS` (bit 2).
    pub gbl_rls: bool,

    #[bits(7)]
    __: u8,

    /// `SLP_TYP` (bits 10..13): hardware-defined sleep-type code, taken
    /// from the `\_S5` package for soft-off.
    #[bits(3)]
    pub slp_typ: u8,

    /// `SLP_EN` (bit 13): write-only trigger; setting it together with
    /// `SLP_TYP` enters the sleep state.
    pub slp_en: bool,

    #[bits(2)]
    __: u8,
}
