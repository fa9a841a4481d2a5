//! # XVC Protocol Library
//!
//! This crate implements the framing layer of the
//! [Xilinx Virtual Cable (XVC)](https://github.com/Xilinx/XilinxVirtualCable) 1.0
//! protocol, a minimal binary protocol that tunnels JTAG shift operations over a
//! reliable byte stream.
//!
//! ## Overview
//!
//! XVC is spoken by Xilinx design tools to reach a JTAG scan chain over the
//! network. A server advertises its capabilities and then services an arbitrary
//! sequence of commands, each of which expects a prompt reply:
//!
//! - `GetInfo`: query protocol version and the maximum vector length
//! - `SetTck`: request a TCK clock period in nanoseconds
//! - `Shift`: clock paired TMS/TDI bit vectors into the chain and read TDO back
//!
//! ## Wire format
//!
//! Each command starts with an ASCII keyword terminated by `:`; `settck:` and
//! `shift:` carry a little-endian `u32` immediately after the delimiter, and
//! `shift:` is followed by the TMS vector and then the TDI vector, each
//! `⌈num_bits / 8⌉` bytes with bit `i` at position `i mod 8` of byte `⌊i / 8⌋`:
//!
//! - **GetInfo**: `getinfo:`
//! - **SetTck**: `settck:<period in ns: u32>`
//! - **Shift**: `shift:<num_bits: u32><TMS vector><TDI vector>`
//! - **ServerInfo** reply: `xvcServer_v{version}:<max vector length>\n`
//!
//! ## Reading commands from a stream
//!
//! ```
//! use xvc_protocol::Message;
//! use std::io::Cursor;
//!
//! let frame = b"shift:\x05\x00\x00\x00\x1F\x00".to_vec();
//! let mut reader = Cursor::new(frame);
//! match Message::from_reader(&mut reader, 2048).expect("frame should parse") {
//!     Message::Shift { num_bits, tms, tdi } => {
//!         assert_eq!(num_bits, 5);
//!         assert_eq!(&*tms, &[0x1F]);
//!         assert_eq!(&*tdi, &[0x00]);
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ## Writing the server greeting
//!
//! ```
//! use xvc_protocol::{ServerInfo, Version};
//!
//! let mut reply = Vec::new();
//! ServerInfo::new(Version::V1_0, 2048)
//!     .write_to(&mut reply)
//!     .expect("writing to a vector shouldn't fail");
//! assert_eq!(reply, b"xvcServer_v1.0:2048\n");
//! ```
//!
//! ## Error handling
//!
//! Parsing failures are reported through [`error::ProtocolError`]. The XVC 1.0
//! protocol has no in-band error reporting; a server that encounters a framing
//! error can only close the connection.

pub mod protocol;
pub use protocol::*;
pub mod codec;
pub mod error;
