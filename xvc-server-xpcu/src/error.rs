use std::{error::Error, fmt::Display};

/// Errors raised by the Platform Cable USB driver.
#[derive(Debug)]
pub enum CableError {
    /// A USB control or bulk transfer failed or timed out.
    Usb {
        op: &'static str,
        source: rusb::Error,
    },
    /// A bulk transfer moved fewer bytes than requested.
    ShortTransfer {
        op: &'static str,
        expected: usize,
        got: usize,
    },
    /// No device with the requested vendor/product id is attached.
    NoDevice { vendor: u16, product: u16 },
    /// The CPLD reported version 0 and won't shift until power-cycled.
    NotReady,
    /// The shift engine staged a slot count the cable cannot accept.
    ShiftInternal { slots: usize },
}

impl Display for CableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CableError::Usb { op, source } => write!(f, "USB {} failed: {}", op, source),
            CableError::ShortTransfer { op, expected, got } => {
                write!(f, "USB {} transferred {} of {} bytes", op, got, expected)
            }
            CableError::NoDevice { vendor, product } => {
                write!(f, "no USB probe found for {:04x}:{:04x}", vendor, product)
            }
            CableError::NotReady => {
                write!(
                    f,
                    "cable CPLD version '0' can't be correct, please try resetting the cable"
                )
            }
            CableError::ShiftInternal { slots } => {
                write!(f, "staged {} bit-slots for one burst, which the cable cannot take", slots)
            }
        }
    }
}

impl Error for CableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CableError::Usb { source, .. } => Some(source),
            _ => None,
        }
    }
}
