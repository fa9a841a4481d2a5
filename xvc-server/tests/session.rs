//! End-to-end exercise of the server over a real TCP socket.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use xvc_server::JtagCable;
use xvc_server::server::{Config, Server};

/// Loops TDI straight back as TDO, as if probing a wire between the pins.
struct EchoCable;

impl JtagCable for EchoCable {
    type Error = io::Error;

    fn set_tck(&mut self, period_ns: u32) -> u32 {
        period_ns
    }

    fn scan(
        &mut self,
        _tms: &[u8],
        tdi: &[u8],
        tdo: &mut [u8],
        _num_bits: u32,
    ) -> Result<(), io::Error> {
        tdo.copy_from_slice(tdi);
        Ok(())
    }
}

fn spawn_server() -> TcpStream {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut server = Server::new(EchoCable, Config::default());
        let _ = server.serve_listener(listener);
    });
    TcpStream::connect(addr).unwrap()
}

#[test]
fn full_session_over_tcp() {
    let mut stream = spawn_server();

    stream.write_all(b"getinfo:").unwrap();
    let mut info = [0u8; 20];
    stream.read_exact(&mut info).unwrap();
    assert_eq!(&info, b"xvcServer_v1.0:2048\n");

    stream.write_all(b"settck:\xE8\x03\x00\x00").unwrap();
    let mut period = [0u8; 4];
    stream.read_exact(&mut period).unwrap();
    assert_eq!(period, [0xE8, 0x03, 0x00, 0x00]);

    // Reset the chain and come to rest in Run-Test/Idle; the server yields
    // the chain but keeps the connection open.
    stream
        .write_all(b"shift:\x08\x00\x00\x00\x1F\xA5")
        .unwrap();
    let mut tdo = [0u8; 1];
    stream.read_exact(&mut tdo).unwrap();
    assert_eq!(tdo, [0xA5], "echo cable must loop TDI back");

    // The connection is still usable after the yield.
    stream.write_all(b"getinfo:").unwrap();
    stream.read_exact(&mut info).unwrap();
    assert_eq!(&info, b"xvcServer_v1.0:2048\n");
}

#[test]
fn two_clients_are_served_in_turn() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut server = Server::new(EchoCable, Config::default());
        let _ = server.serve_listener(listener);
    });

    let mut first = TcpStream::connect(addr).unwrap();
    let mut second = TcpStream::connect(addr).unwrap();

    // First client resets and parks the chain, yielding it.
    first
        .write_all(b"shift:\x08\x00\x00\x00\x1F\x00")
        .unwrap();
    let mut tdo = [0u8; 1];
    first.read_exact(&mut tdo).unwrap();

    // Second client is then served on the same chain.
    second.write_all(b"getinfo:").unwrap();
    let mut info = [0u8; 20];
    second.read_exact(&mut info).unwrap();
    assert_eq!(&info, b"xvcServer_v1.0:2048\n");
}
