//! # XVC Server Library
//!
//! This crate provides the connection-handling half of a Xilinx Virtual Cable
//! (XVC) server: it speaks the protocol over TCP and forwards JTAG work to a
//! cable backend.
//!
//! ## Architecture
//!
//! The crate is built around three components:
//!
//! - **[`JtagCable`] trait**: the interface a cable driver implements to
//!   perform the actual shifting (and, where supported, TCK configuration)
//! - **[`tap::TapState`]**: the IEEE 1149.1 TAP controller states with a pure
//!   transition function, used to follow the chain state implied by each TMS
//!   vector
//! - **[`server::Server`]**: accepts TCP connections, parses frames, tracks
//!   the per-connection TAP state, and replies
//!
//! ## Session handoff
//!
//! Several clients may hold connections at once, but the JTAG chain is a
//! single shared resource. The server therefore only yields the chain between
//! clients when the active client is quiescent: it must have traversed
//! `TEST-LOGIC-RESET` (so its IR holds the default IDCODE instruction) and
//! then parked in `RUN-TEST/IDLE`. Passing through `CAPTURE-DR` or
//! `CAPTURE-IR` re-arms the requirement, since the client is then touching
//! register contents the next client cannot know about.
//!
//! ## Basic usage
//!
//! ```ignore
//! use xvc_server::server::{Config, Server};
//!
//! let cable = MyCable::open()?;
//! let mut server = Server::new(cable, Config::default());
//! server.serve("0.0.0.0:2542")?;
//! ```
//!
//! ## Error handling
//!
//! The XVC 1.0 protocol has no in-band error reporting. A cable failure
//! during a shift is fatal to the session: the connection is closed and the
//! client has to reconnect. Socket and framing errors likewise close only the
//! offending connection; the accept loop keeps running.
//!
//! ## Logging
//!
//! This crate uses the `log` facade. At `debug` level it reports received
//! commands and session handoffs; at `trace` level it dumps TMS/TDI/TDO
//! vectors and individual TAP state transitions.

pub mod server;
pub mod tap;

/// Trait a cable driver implements to provide JTAG functionality.
///
/// The server holds exactly one cable and serializes all shift traffic
/// through it, so implementations never see concurrent calls.
pub trait JtagCable {
    /// Error type for failed shifts. A shift either completes for all bits
    /// or fails as a whole; no partial progress is reported.
    type Error: std::error::Error;

    /// Set the TCK period.
    ///
    /// Returns the period actually in effect, in nanoseconds. Hardware with a
    /// fixed clock simply echoes the request.
    fn set_tck(&mut self, period_ns: u32) -> u32;

    /// Shift `num_bits` bits through the JTAG port.
    ///
    /// `tms` and `tdi` are read LSB-first within each byte, bit `i` at
    /// position `i mod 8` of byte `i / 8`; `tdo` receives `num_bits` bits in
    /// the same layout. All three buffers are `⌈num_bits / 8⌉` bytes.
    fn scan(
        &mut self,
        tms: &[u8],
        tdi: &[u8],
        tdo: &mut [u8],
        num_bits: u32,
    ) -> Result<(), Self::Error>;
}
