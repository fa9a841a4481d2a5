//! # XVC server for the Xilinx Platform Cable USB
//!
//! Bridges the Xilinx Virtual Cable (XVC) TCP protocol onto a Platform
//! Cable USB (DLC9/XPCU) probe: XVC clients such as bitstream loaders and
//! debuggers connect over TCP and their JTAG shifts are translated into the
//! cable's USB vendor requests.

mod error;
mod xpcu;

use std::error::Error;
use std::net::{IpAddr, SocketAddr};

use clap::{ArgAction, Parser};
use env_logger::Env;
use log::LevelFilter;
use xvc_server::server::{Config, Server};

use crate::xpcu::{GpioMode, XpcuCable};

#[derive(Parser)]
#[command(about = "Xilinx Virtual Cable (XVC) server for the Platform Cable USB (DLC9)", long_about = None)]
struct Args {
    /// More verbose output (repeat for more)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Trace XVC protocol traffic (repeat for more)
    #[arg(short = 't', action = ArgAction::Count)]
    trace_protocol: u8,

    /// Trace USB transfers
    #[arg(short = 'T')]
    trace_usb: bool,

    /// USB vendor id (0x… hex, leading-0 octal or decimal)
    #[arg(short = 'V', value_parser = parse_usb_id, default_value = "0x03fd")]
    vendor: u16,

    /// USB product id
    #[arg(short = 'P', value_parser = parse_usb_id, default_value = "0x0008")]
    product: u16,

    /// TCP port to listen on
    #[arg(short = 'p', default_value = "2542")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    ip: IpAddr,

    /// Which pin set the cable drives
    #[arg(long, value_enum, default_value = "external")]
    gpio_mode: GpioMode,
}

/// Parses a C-style numeric literal: `0x…` hex, leading-`0` octal, else
/// decimal.
fn parse_usb_id(s: &str) -> Result<u16, String> {
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    u16::from_str_radix(digits, radix).map_err(|e| format!("invalid USB id {:?}: {}", s, e))
}

fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    match args.verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    if args.trace_protocol > 0 {
        builder.filter_module("xvc_server", LevelFilter::Trace);
        builder.filter_module("xvc_protocol", LevelFilter::Trace);
    }
    if args.trace_usb {
        builder.filter_module("xvc_xpcu", LevelFilter::Trace);
    }
    builder.init();
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    log::info!("Starting XVC server for the Platform Cable USB");
    let cable = XpcuCable::open(args.vendor, args.product, args.gpio_mode)?;

    let addr = SocketAddr::new(args.ip, args.port);
    let mut server = Server::new(cable, Config::default());
    server.serve(addr)?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
