//! USB transport for the Platform Cable USB.
//!
//! All vendor commands share `bRequest 0xB0`; the command code rides in
//! `wValue` and its argument in `wIndex`. Shift payloads move over bulk
//! endpoints 0x02 (out) and 0x86 (in).

use std::time::Duration;

use rusb::{DeviceHandle, Direction, GlobalContext, Recipient, RequestType};

use crate::error::CableError;
use crate::xpcu::shift::A6Port;

const USB_TIMEOUT: Duration = Duration::from_secs(1);
const VENDOR_REQUEST: u8 = 0xB0;
const BULK_OUT_EP: u8 = 0x02;
const BULK_IN_EP: u8 = 0x86;

/// An opened, claimed Platform Cable USB device.
pub(crate) struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
}

impl UsbTransport {
    /// Opens the first device matching `vendor`/`product`, resets it,
    /// re-asserts its current configuration and claims interface 0.
    pub(crate) fn open(vendor: u16, product: u16) -> Result<UsbTransport, CableError> {
        log::debug!("Looking for USB probe {:04x}:{:04x}", vendor, product);
        let devices = rusb::devices().map_err(|source| CableError::Usb {
            op: "device enumeration",
            source,
        })?;
        for device in devices.iter() {
            let descriptor = device.device_descriptor().map_err(|source| CableError::Usb {
                op: "descriptor read",
                source,
            })?;
            log::trace!(
                "USB device {:04x}:{:04x}",
                descriptor.vendor_id(),
                descriptor.product_id()
            );
            if descriptor.vendor_id() != vendor || descriptor.product_id() != product {
                continue;
            }

            // The handle closes on drop, so a failure part-way through
            // leaves nothing claimed.
            let mut handle = device.open().map_err(|source| CableError::Usb {
                op: "device open",
                source,
            })?;
            handle.reset().map_err(|source| CableError::Usb {
                op: "device reset",
                source,
            })?;
            let configuration =
                handle
                    .active_configuration()
                    .map_err(|source| CableError::Usb {
                        op: "configuration read",
                        source,
                    })?;
            handle
                .set_active_configuration(configuration)
                .map_err(|source| CableError::Usb {
                    op: "set configuration",
                    source,
                })?;
            handle.claim_interface(0).map_err(|source| CableError::Usb {
                op: "claim interface 0",
                source,
            })?;

            log::debug!("Opened USB probe {:04x}:{:04x}", vendor, product);
            return Ok(UsbTransport { handle });
        }
        Err(CableError::NoDevice { vendor, product })
    }

    pub(crate) fn vendor_write(
        &self,
        op: &'static str,
        value: u16,
        index: u16,
    ) -> Result<(), CableError> {
        log::trace!(
            "USB control write: {} (wValue=0x{:04x}, wIndex=0x{:04x})",
            op,
            value,
            index
        );
        let request_type =
            rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        self.handle
            .write_control(request_type, VENDOR_REQUEST, value, index, &[], USB_TIMEOUT)
            .map_err(|source| CableError::Usb { op, source })?;
        Ok(())
    }

    pub(crate) fn vendor_read_u16(
        &self,
        op: &'static str,
        value: u16,
        index: u16,
    ) -> Result<u16, CableError> {
        let request_type =
            rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device);
        let mut buf = [0u8; 2];
        let got = self
            .handle
            .read_control(request_type, VENDOR_REQUEST, value, index, &mut buf, USB_TIMEOUT)
            .map_err(|source| CableError::Usb { op, source })?;
        if got != buf.len() {
            return Err(CableError::ShortTransfer {
                op,
                expected: buf.len(),
                got,
            });
        }
        let word = u16::from_le_bytes(buf);
        log::trace!(
            "USB control read: {} (wValue=0x{:04x}, wIndex=0x{:04x}) -> 0x{:04x}",
            op,
            value,
            index,
            word
        );
        Ok(word)
    }
}

impl A6Port for UsbTransport {
    /// One A6 burst: announce `slots` bit-slots, write the packed words to
    /// the out endpoint and, if `read_back` is given, collect the TDO words
    /// from the in endpoint.
    fn a6_burst(
        &mut self,
        slots: u16,
        words: &[u8],
        read_back: Option<&mut [u8]>,
    ) -> Result<(), CableError> {
        log::trace!("A6 burst: {} slots, out {:02x?}", slots, words);
        self.vendor_write("A6 shift", 0x00A6, slots)?;
        let written = self
            .handle
            .write_bulk(BULK_OUT_EP, words, USB_TIMEOUT)
            .map_err(|source| CableError::Usb {
                op: "A6 bulk write",
                source,
            })?;
        if written != words.len() {
            return Err(CableError::ShortTransfer {
                op: "A6 bulk write",
                expected: words.len(),
                got: written,
            });
        }
        if let Some(buf) = read_back {
            let got = self
                .handle
                .read_bulk(BULK_IN_EP, buf, USB_TIMEOUT)
                .map_err(|source| CableError::Usb {
                    op: "A6 bulk read",
                    source,
                })?;
            if got != buf.len() {
                return Err(CableError::ShortTransfer {
                    op: "A6 bulk read",
                    expected: buf.len(),
                    got,
                });
            }
            log::trace!("A6 burst: in {:02x?}", buf);
        }
        Ok(())
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(0);
    }
}
