//! The cable's vendor command set, one control transfer each.

use crate::error::CableError;
use crate::xpcu::transport::UsbTransport;

impl UsbTransport {
    /// Enables or disables the CPLD output drivers.
    pub(crate) fn output_enable(&self, enable: bool) -> Result<(), CableError> {
        let value = if enable { 0x0018 } else { 0x0010 };
        self.vendor_write("output enable", value, 0)
    }

    /// Command 0x28. Values seen during chain autodetection: 0x11, 0x12.
    pub(crate) fn request_28(&self, value: u8) -> Result<(), CableError> {
        self.vendor_write("request 0x28", 0x0028, value as u16)
    }

    /// Writes the FX2 port E GPIO bits.
    pub(crate) fn write_gpio(&self, bits: u8) -> Result<(), CableError> {
        self.vendor_write("GPIO write", 0x0030, bits as u16)
    }

    /// Reads the firmware version constant embedded in the FX2 firmware.
    pub(crate) fn read_firmware_version(&self) -> Result<u16, CableError> {
        self.vendor_read_u16("firmware version read", 0x0050, 0x0000)
    }

    /// Reads the CPLD version via the GPIF. Version 0 means the cable logic
    /// isn't answering and the cable has to be power-cycled.
    pub(crate) fn read_cpld_version(&self) -> Result<u16, CableError> {
        let version = self.vendor_read_u16("CPLD version read", 0x0050, 0x0001)?;
        if version == 0 {
            return Err(CableError::NotReady);
        }
        Ok(version)
    }

    /// Selects which pin set the CPLD drives: 0 for the FX2-internal GPIO
    /// pins, non-zero for the probe connector.
    pub(crate) fn select_gpio(&self, mode: u8) -> Result<(), CableError> {
        self.vendor_write("GPIO select", 0x0052, mode as u16)
    }
}
