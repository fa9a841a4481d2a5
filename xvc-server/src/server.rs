use std::{
    io::{self, ErrorKind, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    os::fd::AsFd,
    time::Duration,
};

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

use crate::JtagCable;
use crate::tap::TapState;
use xvc_protocol::error::ProtocolError;
use xvc_protocol::{Message, ServerInfo, Version};

#[derive(Debug, Clone)]
pub struct Config {
    /// Widest TMS/TDI vector accepted from a client, in bytes. Also
    /// advertised in the `getinfo:` reply.
    pub max_vector_size: u32,
    pub read_write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_vector_size: 2048,
            read_write_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
pub struct Server<T: JtagCable> {
    cable: T,
    config: Config,
}

/// Builder to create a [Server] instance and modify configuration options
///
/// # Example
///
/// ```ignore
/// use xvc_server::server::Builder;
/// use std::time::Duration;
///
/// let server = Builder::new()
///     .max_vector_size(1024)
///     .rw_timeout(Duration::from_secs(20))
///     .build(my_cable);
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the highest vector size that this server is expected to receive.
    pub fn max_vector_size(mut self, size: u32) -> Self {
        self.config.max_vector_size = size;
        self
    }

    /// Set the TCP read and write timeout
    pub fn rw_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_write_timeout = timeout;
        self
    }

    /// Build and return the server
    pub fn build<T: JtagCable>(self, cable: T) -> Server<T> {
        Server::new(cable, self.config)
    }
}

/// What to do with a connection once its frame loop returns.
#[derive(Debug, Eq, PartialEq)]
enum SessionStatus {
    /// The client is quiescent; keep the connection and serve others.
    Yield,
    /// Disconnect, error, or protocol violation; drop the connection.
    Close,
}

/// Per-connection state that outlives individual frames.
struct SessionState {
    peer: SocketAddr,
    tap: TapState,
}

struct Session {
    stream: TcpStream,
    state: SessionState,
}

impl Session {
    fn new(stream: TcpStream, peer: SocketAddr, timeout: Duration) -> io::Result<Session> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Session {
            stream,
            state: SessionState {
                peer,
                tap: TapState::TestLogicReset,
            },
        })
    }
}

impl<T: JtagCable> Server<T> {
    pub fn new(cable: T, config: Config) -> Server<T> {
        Server { cable, config }
    }

    /// Bind `addr` and serve clients until a listener-level error occurs.
    pub fn serve(&mut self, addr: impl ToSocketAddrs) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve_listener(listener)
    }

    /// Serve clients on an already-bound listener.
    ///
    /// The listener and all client sockets are multiplexed through `poll(2)`.
    /// Only one client is actively shifting at any time; the others queue
    /// until the active one parks the chain (see the crate documentation).
    pub fn serve_listener(&mut self, listener: TcpListener) -> io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            log::info!("Waiting for connections on {}", addr);
        }
        let mut sessions: Vec<Session> = Vec::new();

        loop {
            let revents = {
                let mut fds = Vec::with_capacity(sessions.len() + 1);
                fds.push(PollFd::new(listener.as_fd(), PollFlags::POLLIN));
                for session in &sessions {
                    fds.push(PollFd::new(session.stream.as_fd(), PollFlags::POLLIN));
                }
                poll(&mut fds, PollTimeout::NONE)
                    .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
                fds.iter()
                    .map(|fd| fd.revents().unwrap_or_else(PollFlags::empty))
                    .collect::<Vec<_>>()
            };

            // Serve existing sessions before accepting, so indices still
            // line up with the poll results.
            let mut closed = Vec::new();
            for (idx, flags) in revents.iter().skip(1).enumerate() {
                if flags
                    .intersects(PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL)
                {
                    log::info!("Connection from {} aborted", sessions[idx].state.peer);
                    closed.push(idx);
                } else if flags.contains(PollFlags::POLLIN) {
                    let Session { stream, state } = &mut sessions[idx];
                    match self.handle_session(stream, state) {
                        SessionStatus::Yield => {}
                        SessionStatus::Close => {
                            log::info!("Connection from {} closed", state.peer);
                            closed.push(idx);
                        }
                    }
                }
            }
            for idx in closed.into_iter().rev() {
                sessions.remove(idx);
            }

            if revents[0].contains(PollFlags::POLLIN) {
                match listener.accept() {
                    Ok((stream, peer)) => {
                        log::info!("New client connection from {}", peer);
                        match Session::new(stream, peer, self.config.read_write_timeout) {
                            Ok(session) => sessions.push(session),
                            Err(e) => log::error!("Failed to configure client socket: {}", e),
                        }
                    }
                    Err(e) => log::error!("Connection error: {}", e),
                }
            }
        }
    }

    /// Runs the frame loop for one connection until the client either
    /// quiesces (yield) or must be disconnected.
    fn handle_session<S: Read + Write>(
        &mut self,
        stream: &mut S,
        session: &mut SessionState,
    ) -> SessionStatus {
        let mut seen_tlr = false;

        loop {
            let message =
                match Message::from_reader(stream, self.config.max_vector_size as usize) {
                    Ok(message) => message,
                    Err(ProtocolError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                        log::debug!("Client {} disconnected", session.peer);
                        return SessionStatus::Close;
                    }
                    Err(ProtocolError::Io(e))
                        if e.kind() == ErrorKind::WouldBlock
                            || e.kind() == ErrorKind::TimedOut =>
                    {
                        log::error!("Client {} read timeout, closing connection", session.peer);
                        return SessionStatus::Close;
                    }
                    Err(e) => {
                        log::error!("Client {}: {}", session.peer, e);
                        return SessionStatus::Close;
                    }
                };

            let written = match message {
                Message::GetInfo => {
                    log::debug!("Received GetInfo");
                    ServerInfo::new(Version::V1_0, self.config.max_vector_size).write_to(stream)
                }
                Message::SetTck { period_ns } => {
                    log::debug!("Received SetTck: period_ns={}", period_ns);
                    let actual = self.cable.set_tck(period_ns);
                    stream.write_all(&actual.to_le_bytes())
                }
                Message::Shift { num_bits, tms, tdi } => {
                    match self.shift_frame(session, &mut seen_tlr, num_bits, &tms, &tdi) {
                        Ok(tdo) => stream.write_all(&tdo),
                        Err(e) => {
                            log::error!("Shift failed: {}", e);
                            return SessionStatus::Close;
                        }
                    }
                }
            };
            if let Err(e) = written {
                log::error!("Client {} write failed: {}", session.peer, e);
                return SessionStatus::Close;
            }

            if seen_tlr && session.tap == TapState::RunTestIdle {
                log::debug!(
                    "Client {} parked in Run-Test/Idle after reset, yielding the chain",
                    session.peer
                );
                return SessionStatus::Yield;
            }
        }
    }

    /// Processes one `shift:` frame: updates the quiescence flag, applies
    /// the bogus-movement filter, walks the TAP tracker, and runs the cable.
    fn shift_frame(
        &mut self,
        session: &mut SessionState,
        seen_tlr: &mut bool,
        num_bits: u32,
        tms: &[u8],
        tdi: &[u8],
    ) -> Result<Vec<u8>, T::Error> {
        let num_bytes = num_bits.div_ceil(8) as usize;
        let istate = session.tap;
        log::debug!("Received Shift: num_bits={}, state={}", num_bits, istate);
        log::trace!("Shift TMS data: {:02x?}", tms);
        log::trace!("Shift TDI data: {:02x?}", tdi);

        // A client may only hand the chain over once it has passed through
        // TEST-LOGIC-RESET (IR = IDCODE) and come to rest. Touching
        // CAPTURE-DR/IR afterwards re-arms the requirement.
        *seen_tlr = (*seen_tlr || istate == TapState::TestLogicReset)
            && istate != TapState::CaptureDr
            && istate != TapState::CaptureIr;

        let mut tdo = vec![0u8; num_bytes];

        // Certain Xilinx tools run a spurious capture cycle right after
        // reading IR/DR, which would clobber the register with the value
        // just read out. Drop those frames without touching the cable.
        if is_bogus_movement(istate, num_bits, tms[0]) {
            log::debug!("Ignoring bogus JTAG state movement in state {}", istate);
            return Ok(tdo);
        }

        for i in 0..num_bits as usize {
            let tms_bit = (tms[i >> 3] >> (i & 7)) & 1 != 0;
            let previous = session.tap;
            session.tap = previous.step(tms_bit);
            if session.tap != previous {
                log::trace!("JTAG state {}", session.tap);
            }
        }

        self.cable.scan(tms, tdi, &mut tdo, num_bits)?;
        log::trace!("Shift result TDO data: {:02x?}", tdo);
        Ok(tdo)
    }
}

fn is_bogus_movement(state: TapState, num_bits: u32, first_tms: u8) -> bool {
    (state == TapState::Exit1Ir && num_bits == 5 && first_tms == 0x17)
        || (state == TapState::Exit1Dr && num_bits == 4 && first_tms == 0x0B)
}
