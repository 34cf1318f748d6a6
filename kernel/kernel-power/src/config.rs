//! # Power State Discovery
//!
//! [`PowerConfig`] is the subsystem's only state: the register addresses,
//! command bytes and sleep-type codes extracted from firmware tables at
//! boot. It is produced fully populated or not at all, and is immutable
//! afterwards.

use crate::pm1::Pm1Control;
use kernel_acpi::{AcpiError, PhysMapRo, aml, fadt, rsdp, sdt};

/// Everything the controller needs to drive the soft-off protocol.
///
/// Written once by [`PowerConfig::discover`]; read-only afterwards. The
/// `sci_en` field doubles as the configured/unconfigured sentinel: it is
/// zero only in [`PowerConfig::unconfigured`], and the controller fails
/// closed on it.
#[derive(Debug, Clone, Copy)]
pub struct PowerConfig {
    /// I/O port for SMI commands; zero when the platform has none.
    pub smi_cmd_port: u16,
    /// Command byte written to the SMI port to request enablement.
    pub acpi_enable: u8,
    /// Command byte written to the SMI port to request disablement.
    pub acpi_disable: u8,
    /// Primary PM1 control register.
    pub pm1a_cnt: u16,
    /// Secondary PM1 control register, absent on most platforms.
    pub pm1b_cnt: Option<u16>,
    /// Width of the PM1 control registers in bytes.
    pub pm1_cnt_len: u8,
    /// Soft-off sleep type for the primary register, pre-shifted into
    /// `SLP_TYP` position.
    pub slp_typ_a: u16,
    /// Soft-off sleep type for the secondary register, pre-shifted.
    pub slp_typ_b: u16,
    /// The `SLP_EN` trigger bit (1 << 13).
    pub slp_en: u16,
    /// The `SCI_EN` status bit (1 << 0); zero means unconfigured.
    pub sci_en: u16,
}

impl PowerConfig {
    /// The not-configured sentinel: shutdown fails closed against it.
    #[must_use]
    pub const fn unconfigured() -> Self {
        Self {
            smi_cmd_port: 0,
            acpi_enable: 0,
            acpi_disable: 0,
            pm1a_cnt: 0,
            pm1b_cnt: None,
            pm1_cnt_len: 0,
            slp_typ_a: 0,
            slp_typ_b: 0,
            slp_en: 0,
            sci_en: 0,
        }
    }

    /// Run the full discovery chain and assemble the config.
    ///
    /// Root descriptor scan, FADT lookup, FADT field extraction and `\_S5`
    /// decoding each fail independently; any failure leaves no config
    /// behind and is reported through the diagnostic sink only.
    ///
    /// # Errors
    /// The first [`AcpiError`] encountered along the chain.
    ///
    /// # Safety
    /// The firmware windows and every table they point to must be readable
    /// through `map`.
    pub unsafe fn discover(map: &impl PhysMapRo) -> Result<Self, AcpiError> {
        unsafe {
            let roots = rsdp::find_root_descriptor(map)
                .inspect_err(|e| log::warn!("no ACPI root descriptor: {e}"))?;
            let fadt_addr = sdt::find_table(map, &roots, fadt::FADT_SIGNATURE)
                .inspect_err(|e| log::warn!("no valid FACP present: {e}"))?;
            let info = fadt::parse(map, fadt_addr)
                .inspect_err(|e| log::warn!("FACP rejected: {e}"))?;
            let sleep = aml::find_sleep_types(map, info.dsdt_addr)
                .inspect_err(|e| log::warn!("\\_S5 extraction failed: {e}"))?;

            Self::assemble(&info, sleep).inspect_err(|e| log::warn!("FACP rejected: {e}"))
        }
    }

    /// Fold the extracted FADT fields and sleep types into a config.
    ///
    /// # Errors
    /// [`AcpiError::MalformedPayload`] when a register address does not fit
    /// the 16-bit port space, [`AcpiError::Unsupported`] when the primary
    /// control register is null.
    pub fn assemble(info: &fadt::FadtInfo, sleep: aml::SleepTypes) -> Result<Self, AcpiError> {
        let port = |raw: u32| u16::try_from(raw).map_err(|_| AcpiError::MalformedPayload);

        let pm1a_cnt = port(info.pm1a_cnt_blk)?;
        if pm1a_cnt == 0 {
            return Err(AcpiError::Unsupported);
        }

        Ok(Self {
            smi_cmd_port: port(info.smi_cmd)?,
            acpi_enable: info.acpi_enable,
            acpi_disable: info.acpi_disable,
            pm1a_cnt,
            pm1b_cnt: match port(info.pm1b_cnt_blk)? {
                0 => None,
                p => Some(p),
            },
            pm1_cnt_len: info.pm1_cnt_len,
            slp_typ_a: sleep.slp_typ_a,
            slp_typ_b: sleep.slp_typ_b,
            slp_en: Pm1Control::new().with_slp_en(true).into_bits(),
            sci_en: Pm1Control::new().with_sci_en(true).into_bits(),
        })
    }

    /// Whether discovery populated this config.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.sci_en != 0
    }
}
