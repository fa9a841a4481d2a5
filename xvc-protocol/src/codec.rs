/// Read and write implementations for the protocol frames
use std::io::{self, Read, Write};

use crate::{
    error::ProtocolError,
    protocol::{Message, ServerInfo},
};

impl ServerInfo {
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writeln!(
            writer,
            "xvcServer_v{}:{}",
            self.version(),
            self.max_vector_len()
        )
    }
}

impl Message {
    const CMD_GET_INFO: &[u8] = b"getinfo:";
    const CMD_SET_TCK: &[u8] = b"settck:";
    const CMD_SHIFT: &[u8] = b"shift:";

    /// Reads one command frame. `max_shift_bytes` bounds the per-vector byte
    /// length a `shift:` frame may declare.
    pub fn from_reader(
        reader: &mut impl Read,
        max_shift_bytes: usize,
    ) -> Result<Message, ProtocolError> {
        // Two bytes are enough to tell the commands apart.
        let mut prefix = [0u8; 2];
        reader.read_exact(&mut prefix)?;
        match &prefix {
            b"ge" => {
                Self::expect_tail(reader, &Self::CMD_GET_INFO[2..])?;
                Ok(Message::GetInfo)
            }
            b"se" => {
                Self::expect_tail(reader, &Self::CMD_SET_TCK[2..])?;
                Ok(Message::SetTck {
                    period_ns: Self::read_u32(reader)?,
                })
            }
            b"sh" => {
                Self::expect_tail(reader, &Self::CMD_SHIFT[2..])?;
                let num_bits = Self::read_u32(reader)?;
                if num_bits == 0 {
                    return Err(ProtocolError::EmptyShift);
                }
                let num_bytes = num_bits.div_ceil(8) as usize;
                if num_bytes > max_shift_bytes {
                    return Err(ProtocolError::OversizeShift {
                        max: max_shift_bytes,
                        got: num_bytes,
                    });
                }
                let mut tms = vec![0u8; num_bytes].into_boxed_slice();
                reader.read_exact(&mut tms)?;
                let mut tdi = vec![0u8; num_bytes].into_boxed_slice();
                reader.read_exact(&mut tdi)?;
                Ok(Message::Shift { num_bits, tms, tdi })
            }
            _ => Err(ProtocolError::InvalidCommandPrefix(
                String::from_utf8_lossy(&prefix).to_string(),
            )),
        }
    }

    /// Consumes the remainder of a command keyword including the `:`
    /// delimiter and fails if it does not match.
    fn expect_tail(reader: &mut impl Read, expected: &[u8]) -> Result<(), ProtocolError> {
        let mut tail = [0u8; 16];
        let tail = &mut tail[..expected.len()];
        reader.read_exact(tail)?;
        if tail != expected {
            return Err(ProtocolError::InvalidCommand(
                String::from_utf8_lossy(tail).to_string(),
            ));
        }
        Ok(())
    }

    fn read_u32(reader: &mut impl Read) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Message::GetInfo => writer.write_all(Self::CMD_GET_INFO),
            Message::SetTck { period_ns } => {
                writer.write_all(Self::CMD_SET_TCK)?;
                writer.write_all(&period_ns.to_le_bytes())
            }
            Message::Shift { num_bits, tms, tdi } => {
                writer.write_all(Self::CMD_SHIFT)?;
                writer.write_all(&num_bits.to_le_bytes())?;
                writer.write_all(tms)?;
                writer.write_all(tdi)
            }
        }
    }
}
