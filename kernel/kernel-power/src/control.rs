//! # Power Controller
//!
//! Register-level protocol for arming power management and requesting the
//! soft-off state. Pure port I/O plus one bounded busy-wait; everything
//! stateful was captured in [`PowerConfig`] at boot.

use crate::pm1::Pm1Control;
use crate::{Delay, PortIo, PowerConfig, PowerError};

/// Total poll iterations granted per control register chain. The budget is
/// shared: polling the secondary register continues where the primary left
/// off rather than restarting.
pub const POLL_BUDGET: u32 = 300;

/// Drives the PM1 control registers described by a [`PowerConfig`].
pub struct PowerControl<'a, P: PortIo, D: Delay> {
    config: PowerConfig,
    ports: &'a P,
    delay: &'a D,
}

impl<'a, P: PortIo, D: Delay> PowerControl<'a, P, D> {
    #[must_use]
    pub const fn new(config: PowerConfig, ports: &'a P, delay: &'a D) -> Self {
        Self {
            config,
            ports,
            delay,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PowerConfig {
        &self.config
    }

    /// Arm the power-management facility.
    ///
    /// Idempotent: when the primary register already reports `SCI_EN`, no
    /// SMI command is reissued. Otherwise the enable command byte goes to
    /// the SMI port and each present control register is polled for the bit
    /// within the shared [`POLL_BUDGET`].
    ///
    /// # Errors
    /// [`PowerError::Unsupported`] when the platform published no SMI port
    /// or no enable command; [`PowerError::Timeout`] when the budget runs
    /// out before every present register reports the bit.
    pub fn enable(&self) -> Result<(), PowerError> {
        let ctl = unsafe { self.ports.read_u16(self.config.pm1a_cnt) };
        if Pm1Control::from_bits(ctl).sci_en() {
            return Ok(());
        }

        if self.config.smi_cmd_port == 0 || self.config.acpi_enable == 0 {
            log::warn!("no known way to enable power management");
            return Err(PowerError::Unsupported);
        }
        unsafe {
            self.ports
                .write_u8(self.config.smi_cmd_port, self.config.acpi_enable);
        }

        let mut budget = POLL_BUDGET;
        if !self.poll_armed(self.config.pm1a_cnt, &mut budget) {
            log::warn!("power management did not come up");
            return Err(PowerError::Timeout);
        }
        if let Some(pm1b) = self.config.pm1b_cnt
            && !self.poll_armed(pm1b, &mut budget)
        {
            log::warn!("secondary control register did not come up");
            return Err(PowerError::Timeout);
        }

        log::info!("power management enabled");
        Ok(())
    }

    /// Request the soft-off state.
    ///
    /// On working hardware the final register write powers the machine
    /// down and this function never returns. It therefore only ever
    /// returns an error.
    ///
    /// # Errors
    /// [`PowerError::Unsupported`] against an unconfigured sentinel, with
    /// no port access at all (fail closed). [`PowerError::ShutdownReturned`]
    /// when execution continues past the soft-off writes.
    pub fn power_off(&self) -> Result<(), PowerError> {
        if !self.config.is_configured() {
            return Err(PowerError::Unsupported);
        }

        // Arm the mechanism; an arming failure is logged but the shutdown
        // write is still attempted, matching the register protocol's
        // fire-and-forget nature.
        if let Err(e) = self.enable() {
            log::warn!("arming before soft-off failed: {e}");
        }

        unsafe {
            self.ports.write_u16(
                self.config.pm1a_cnt,
                self.config.slp_typ_a | self.config.slp_en,
            );
            if let Some(pm1b) = self.config.pm1b_cnt {
                self.ports
                    .write_u16(pm1b, self.config.slp_typ_b | self.config.slp_en);
            }
        }

        log::error!("soft-off request fell through; machine still running");
        Err(PowerError::ShutdownReturned)
    }

    /// Poll one control register for `SCI_EN`, consuming from the shared
    /// budget. One fixed pause per unsuccessful read.
    fn poll_armed(&self, port: u16, budget: &mut u32) -> bool {
        while *budget > 0 {
            let ctl = unsafe { self.ports.read_u16(port) };
            if Pm1Control::from_bits(ctl).sci_en() {
                return true;
            }
            self.delay.pause();
            *budget -= 1;
        }
        false
    }
}
