//! Controller protocol and end-to-end soft-off behavior against mock
//! hardware: a recording port backend plus a synthetic firmware image.

use std::cell::{Cell, RefCell};

use kernel_acpi::PhysMapRo;
use kernel_power::{Delay, POLL_BUDGET, PortIo, PowerConfig, PowerControl, PowerError};

const SCI_EN: u16 = 1 << 0;
const SLP_EN: u16 = 1 << 13;

/// Recording port backend with programmable register behavior.
#[derive(Default)]
struct MockPorts {
    pm1a_port: u16,
    pm1b_port: Option<u16>,
    pm1a: Cell<u16>,
    pm1b: Cell<u16>,
    /// `Some(n)`: the register raises `SCI_EN` on the (n+1)-th read.
    pm1a_latency: Cell<Option<u32>>,
    pm1b_latency: Cell<Option<u32>>,
    byte_writes: RefCell<Vec<(u16, u8)>>,
    word_writes: RefCell<Vec<(u16, u16)>>,
}

impl MockPorts {
    fn tick(latency: &Cell<Option<u32>>, register: &Cell<u16>) {
        match latency.get() {
            Some(0) => {
                register.set(register.get() | SCI_EN);
                latency.set(None);
            }
            Some(n) => latency.set(Some(n - 1)),
            None => {}
        }
    }
}

impl PortIo for MockPorts {
    unsafe fn read_u8(&self, _port: u16) -> u8 {
        0
    }

    unsafe fn write_u8(&self, port: u16, value: u8) {
        self.byte_writes.borrow_mut().push((port, value));
    }

    unsafe fn read_u16(&self, port: u16) -> u16 {
        if port == self.pm1a_port {
            Self::tick(&self.pm1a_latency, &self.pm1a);
            self.pm1a.get()
        } else if Some(port) == self.pm1b_port {
            Self::tick(&self.pm1b_latency, &self.pm1b);
            self.pm1b.get()
        } else {
            0
        }
    }

    unsafe fn write_u16(&self, port: u16, value: u16) {
        self.word_writes.borrow_mut().push((port, value));
    }
}

#[derive(Default)]
struct CountingDelay {
    pauses: Cell<u32>,
}

impl Delay for CountingDelay {
    fn pause(&self) {
        self.pauses.set(self.pauses.get() + 1);
    }
}

fn config() -> PowerConfig {
    PowerConfig {
        smi_cmd_port: 0xB2,
        acpi_enable: 0xA0,
        acpi_disable: 0xA1,
        pm1a_cnt: 0x604,
        pm1b_cnt: None,
        pm1_cnt_len: 2,
        slp_typ_a: 5 << 10,
        slp_typ_b: 7 << 10,
        slp_en: SLP_EN,
        sci_en: SCI_EN,
    }
}

fn ports_for(config: &PowerConfig) -> MockPorts {
    MockPorts {
        pm1a_port: config.pm1a_cnt,
        pm1b_port: config.pm1b_cnt,
        ..MockPorts::default()
    }
}

#[test]
fn enable_is_idempotent_and_reissues_no_command() {
    let cfg = config();
    let ports = ports_for(&cfg);
    ports.pm1a.set(SCI_EN);
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.enable(), Ok(()));
    assert_eq!(control.enable(), Ok(()));
    assert!(ports.byte_writes.borrow().is_empty(), "SMI command reissued");
    assert_eq!(delay.pauses.get(), 0);
}

#[test]
fn enable_without_smi_port_is_unsupported() {
    let cfg = PowerConfig {
        smi_cmd_port: 0,
        ..config()
    };
    let ports = ports_for(&cfg);
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.enable(), Err(PowerError::Unsupported));
    assert!(ports.byte_writes.borrow().is_empty());
    assert!(ports.word_writes.borrow().is_empty());
}

#[test]
fn enable_sends_the_command_and_polls_until_armed() {
    let cfg = config();
    let ports = ports_for(&cfg);
    ports.pm1a_latency.set(Some(5));
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.enable(), Ok(()));
    assert_eq!(*ports.byte_writes.borrow(), vec![(0xB2, 0xA0)]);
    assert!(delay.pauses.get() < POLL_BUDGET);
}

#[test]
fn enable_times_out_after_the_full_budget() {
    let cfg = config();
    let ports = ports_for(&cfg);
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.enable(), Err(PowerError::Timeout));
    assert_eq!(delay.pauses.get(), POLL_BUDGET);
}

#[test]
fn secondary_register_shares_the_budget() {
    let cfg = PowerConfig {
        pm1b_cnt: Some(0x605),
        ..config()
    };
    let ports = ports_for(&cfg);
    // Primary arms quickly; the secondary never does. The total pauses must
    // stay within one shared budget, not one budget per register.
    ports.pm1a_latency.set(Some(10));
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.enable(), Err(PowerError::Timeout));
    assert_eq!(delay.pauses.get(), POLL_BUDGET);
}

#[test]
fn power_off_fails_closed_when_unconfigured() {
    let cfg = PowerConfig::unconfigured();
    let ports = ports_for(&cfg);
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.power_off(), Err(PowerError::Unsupported));
    assert!(ports.byte_writes.borrow().is_empty());
    assert!(ports.word_writes.borrow().is_empty());
}

#[test]
fn power_off_writes_sleep_command_to_every_register() {
    let cfg = PowerConfig {
        pm1b_cnt: Some(0x605),
        ..config()
    };
    let ports = ports_for(&cfg);
    ports.pm1a.set(SCI_EN);
    ports.pm1b.set(SCI_EN);
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    // Returning at all is the failure signal for this operation.
    assert_eq!(control.power_off(), Err(PowerError::ShutdownReturned));
    assert_eq!(
        *ports.word_writes.borrow(),
        vec![(0x604, 5 << 10 | SLP_EN), (0x605, 7 << 10 | SLP_EN)]
    );
}

#[test]
fn power_off_still_fires_when_arming_times_out() {
    let cfg = config();
    let ports = ports_for(&cfg);
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.power_off(), Err(PowerError::ShutdownReturned));
    assert_eq!(*ports.word_writes.borrow(), vec![(0x604, 5 << 10 | SLP_EN)]);
}

// ---------------------------------------------------------------------------
// End-to-end: synthetic firmware image through discovery into the controller.
// ---------------------------------------------------------------------------

struct TestMem {
    buf: Vec<u8>,
}

impl PhysMapRo for TestMem {
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8] {
        let start = usize::try_from(paddr).unwrap();
        assert!(start + len <= self.buf.len());
        unsafe { std::slice::from_raw_parts(self.buf.as_ptr().add(start), len) }
    }
}

fn fix_checksum(table: &mut [u8], at: usize) {
    table[at] = 0;
    let total = table.iter().fold(0u8, |a, &b| a.wrapping_add(b));
    table[at] = 0u8.wrapping_sub(total);
}

fn table(signature: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut t = vec![0u8; 36 + payload.len()];
    t[..4].copy_from_slice(signature);
    let len = u32::try_from(t.len()).unwrap();
    t[4..8].copy_from_slice(&len.to_le_bytes());
    t[10..16].copy_from_slice(b"BOCHS ");
    t[36..].copy_from_slice(payload);
    fix_checksum(&mut t, 9);
    t
}

/// Build a full firmware image: RSDP → RSDT → FADT → DSDT with `\_S5`.
fn firmware_image() -> TestMem {
    let mut buf = vec![0u8; 0x10_0000];
    let write = |buf: &mut Vec<u8>, addr: usize, bytes: &[u8]| {
        buf[addr..addr + bytes.len()].copy_from_slice(bytes);
    };

    let mut aml = vec![0x10, 0x42, 0x05, 0x08]; // filler + NameOp
    aml.extend_from_slice(b"_S5_");
    aml.extend_from_slice(&[0x12, 0x0A, 0x04, 0x0A, 5, 0x0A, 7, 0x0A, 0, 0x0A, 0]);
    write(&mut buf, 0x5_0000, &table(b"DSDT", &aml));

    let mut fadt = vec![0u8; 54];
    fadt[4..8].copy_from_slice(&0x5_0000u32.to_le_bytes()); // DSDT pointer
    fadt[12..16].copy_from_slice(&0xB2u32.to_le_bytes()); // SMI command port
    fadt[16] = 0xA0; // enable command
    fadt[17] = 0xA1; // disable command
    fadt[28..32].copy_from_slice(&0x604u32.to_le_bytes()); // PM1a control
    fadt[53] = 2; // PM1 control width
    write(&mut buf, 0x4_0000, &table(b"FACP", &fadt));

    write(&mut buf, 0x3_0000, &table(b"RSDT", &0x4_0000u32.to_le_bytes()));

    let mut rsdp = [0u8; 20];
    rsdp[..8].copy_from_slice(b"RSD PTR ");
    rsdp[9..15].copy_from_slice(b"BOCHS ");
    rsdp[16..20].copy_from_slice(&0x3_0000u32.to_le_bytes());
    fix_checksum(&mut rsdp, 8);
    write(&mut buf, 0xE_0040, &rsdp);

    TestMem { buf }
}

#[test]
fn discovery_populates_the_config_from_firmware_tables() {
    let mem = firmware_image();
    let cfg = unsafe { PowerConfig::discover(&mem) }.unwrap();

    assert_eq!(cfg.smi_cmd_port, 0xB2);
    assert_eq!(cfg.acpi_enable, 0xA0);
    assert_eq!(cfg.pm1a_cnt, 0x604);
    assert_eq!(cfg.pm1b_cnt, None);
    assert_eq!(cfg.slp_typ_a, 5 << 10);
    assert_eq!(cfg.slp_typ_b, 7 << 10);
    assert!(cfg.is_configured());
}

#[test]
fn discovered_config_drives_the_soft_off_writes() {
    let mem = firmware_image();
    let cfg = unsafe { PowerConfig::discover(&mem) }.unwrap();

    let ports = ports_for(&cfg);
    ports.pm1a.set(SCI_EN);
    let delay = CountingDelay::default();
    let control = PowerControl::new(cfg, &ports, &delay);

    assert_eq!(control.power_off(), Err(PowerError::ShutdownReturned));
    assert_eq!(*ports.word_writes.borrow(), vec![(0x604, 5 << 10 | SLP_EN)]);
}

#[test]
fn garbage_firmware_leaves_no_config() {
    let mem = TestMem {
        buf: vec![0u8; 0x10_0000],
    };
    assert!(unsafe { PowerConfig::discover(&mem) }.is_err());
}
