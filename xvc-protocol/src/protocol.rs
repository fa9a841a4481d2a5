use std::fmt::Display;

/// The version of the protocol.
/// A version always consists of a major and a minor part.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Version {
    major: usize,
    minor: usize,
}

impl Version {
    /// Version 1.0 of the protocol
    pub const V1_0: Version = Version { major: 1, minor: 0 };

    /// The major part of the version
    pub fn major(&self) -> usize {
        self.major
    }

    /// The minor part of the version
    pub fn minor(&self) -> usize {
        self.minor
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::V1_0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A command sent from the client to the server.
/// The client sends one command at a time and waits for the server's reply
/// before sending the next; the server must process commands strictly in
/// order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    /// Requests the server's protocol version and maximum vector length.
    GetInfo,
    /// Requests a TCK period. The server replies with the period it actually
    /// set, which may differ if the hardware cannot honor the request.
    SetTck { period_ns: u32 },
    /// Shifts JTAG vectors into the device and reads TDO back.
    Shift {
        /// the number of TCK toggles, i.e. the bit length of each vector
        num_bits: u32,
        /// TMS bits, `⌈num_bits / 8⌉` bytes, LSB-first per byte
        tms: Box<[u8]>,
        /// TDI bits, same layout as `tms`
        tdi: Box<[u8]>,
    },
}

/// The capability line a server sends in reply to [`Message::GetInfo`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerInfo {
    version: Version,
    max_vector_len: u32,
}

impl ServerInfo {
    /// Creates a new info object from a version and the maximum receivable
    /// vector length in bytes.
    pub fn new(version: Version, max_vector_len: u32) -> ServerInfo {
        ServerInfo {
            version,
            max_vector_len,
        }
    }

    /// The version of the protocol
    pub fn version(&self) -> Version {
        self.version
    }

    /// The widest TMS/TDI vector the server accepts, in bytes
    pub fn max_vector_len(&self) -> u32 {
        self.max_vector_len
    }
}
