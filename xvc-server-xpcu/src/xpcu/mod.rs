//! Driver for the Xilinx Platform Cable USB (DLC9) probe.
//!
//! The cable is an FX2 microcontroller plus a CPLD; the FX2 exposes a
//! vendor command set over USB and the CPLD toggles the JTAG pins. The
//! driver opens the device ([`transport`]), runs the fixed init sequence
//! that puts the CPLD into GPIO mode, and then services shifts through the
//! A6 engine ([`shift`]).
//!
//! The fast GPIF path of the cable is not supported, and neither is
//! uploading firmware to cables that enumerate in bootloader mode.

mod commands;
mod shift;
mod transport;

use crate::error::CableError;
use xvc_server::JtagCable;

use shift::A6Port;
use transport::UsbTransport;

/// Which pin set the CPLD drives.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum GpioMode {
    /// The JTAG pins of the probe connector (the normal case).
    External,
    /// The FX2-internal GPIO pins.
    Internal,
}

/// An initialized Platform Cable USB, ready to shift.
pub struct XpcuCable {
    usb: UsbTransport,
}

impl XpcuCable {
    /// Opens the first matching probe and runs the init sequence.
    pub fn open(vendor: u16, product: u16, mode: GpioMode) -> Result<XpcuCable, CableError> {
        let usb = UsbTransport::open(vendor, product)?;
        let mut cable = XpcuCable { usb };
        cable.common_init()?;
        match mode {
            GpioMode::External => cable.external_init()?,
            GpioMode::Internal => cable.internal_init()?,
        }
        Ok(cable)
    }

    fn common_init(&mut self) -> Result<(), CableError> {
        self.usb.request_28(0x11)?;
        self.usb.write_gpio(8)?;
        let firmware = self.usb.read_firmware_version()?;
        log::info!("Firmware version = 0x{:04X} ({})", firmware, firmware);
        let cpld = self.usb.read_cpld_version()?;
        log::info!("Cable CPLD version = 0x{:04X} ({})", cpld, cpld);
        Ok(())
    }

    /// Routes the CPLD to the probe connector. The two-slot all-zero burst
    /// settles the CPLD between enabling the drivers and the mode change.
    fn external_init(&mut self) -> Result<(), CableError> {
        self.usb.output_enable(false)?;
        self.usb.request_28(0x11)?;
        self.usb.output_enable(true)?;
        self.usb.a6_burst(2, &[0, 0], None)?;
        self.usb.request_28(0x12)?;
        Ok(())
    }

    fn internal_init(&mut self) -> Result<(), CableError> {
        self.usb.select_gpio(0)
    }
}

impl JtagCable for XpcuCable {
    type Error = CableError;

    /// The cable shifts at a fixed effective rate; the requested period is
    /// echoed back unchanged.
    fn set_tck(&mut self, period_ns: u32) -> u32 {
        log::debug!("SetTck requested period_ns={}, cable rate is fixed", period_ns);
        period_ns
    }

    fn scan(
        &mut self,
        tms: &[u8],
        tdi: &[u8],
        tdo: &mut [u8],
        num_bits: u32,
    ) -> Result<(), CableError> {
        shift::scan(&mut self.usb, tms, tdi, tdo, num_bits)
    }
}
