//! A6 shift engine.
//!
//! Vendor command 0xA6 starts a universal shift operation of up to
//! `4 * A6_CHUNK_WORDS - 1` bit-slots, described by a bulk write of
//! `⌈slots / 4⌉` little-endian 16-bit words. Within a word, in-word slot
//! index `i` (0 = earliest) uses:
//!
//! - bit `i`: TDI value to shift out
//! - bit `4 + i`: TMS value to shift out
//! - bit `8 + i`: whether to toggle TCK for this slot
//! - bit `12 + i`: whether to read TDO for this slot
//!
//! A real slot sets both the TCK and the read flag; a dummy slot clears all
//! four and shifts nothing. If any read flag was set, a bulk read returns
//! one word per 16 captured bits. TDO is shifted in from the MSB: a full
//! word carries its earliest sample at bit 0, but in a tail word with `R`
//! samples the earliest sits at bit `16 - R` and a lone sample arrives as
//! the MSB.
//!
//! The CPLD mis-handles slot counts that are a multiple of four, so the
//! engine flushes at `4 * A6_CHUNK_WORDS - 1` accumulated slots and pads a
//! multiple-of-four residue with one trailing dummy slot.

use crate::error::CableError;

/// Burst size in 16-bit words. More than 4 leads to bit errors on real
/// cables; 13 to serious problems.
const A6_CHUNK_WORDS: usize = 4;

/// Hardware face of the engine; one call per A6 burst.
pub(crate) trait A6Port {
    fn a6_burst(
        &mut self,
        slots: u16,
        words: &[u8],
        read_back: Option<&mut [u8]>,
    ) -> Result<(), CableError>;
}

/// Staging state for one scan call.
struct A6Transfer<'a> {
    /// Bit-slots staged for the next burst, real and dummy.
    in_bits: usize,
    /// Staged slots whose TDO must be captured.
    out_bits: usize,
    /// TDO bits already delivered to `out` across previous bursts.
    out_done: usize,
    out: &'a mut [u8],
    buf: [u8; 2 * A6_CHUNK_WORDS],
}

impl<'a> A6Transfer<'a> {
    fn new(out: &'a mut [u8]) -> A6Transfer<'a> {
        A6Transfer {
            in_bits: 0,
            out_bits: 0,
            out_done: 0,
            out,
            buf: [0; 2 * A6_CHUNK_WORDS],
        }
    }

    /// Stages one bit-slot. Dummy slots advance the slot count without
    /// shifting or sampling.
    fn add_slot(&mut self, tdi: u8, tms: u8, real: bool) {
        let bit_idx = self.in_bits & 3;
        let buf_idx = (self.in_bits - bit_idx) >> 1;

        if bit_idx == 0 {
            // clear for the next word
            self.buf[buf_idx] = 0;
            self.buf[buf_idx + 1] = 0;
        }

        self.in_bits += 1;

        if real {
            self.buf[buf_idx] |= ((tms << 4) | tdi) << bit_idx;
            self.buf[buf_idx + 1] |= 0x11 << bit_idx;
            self.out_bits += 1;
        }
    }

    /// Emits the staged slots as one burst and unpacks the TDO words into
    /// `out`. The staging counters are reset regardless of the outcome.
    fn flush<P: A6Port>(&mut self, port: &mut P) -> Result<(), CableError> {
        let slots = self.in_bits;
        let captured = self.out_bits;
        self.in_bits = 0;
        self.out_bits = 0;

        if slots == 0 || slots >= 4 * A6_CHUNK_WORDS {
            return Err(CableError::ShiftInternal { slots });
        }

        let write_len = 2 * slots.div_ceil(4);
        let read_len = 2 * captured.div_ceil(16);
        let mut rx = [0u8; 2 * A6_CHUNK_WORDS];

        port.a6_burst(
            slots as u16,
            &self.buf[..write_len],
            if read_len > 0 {
                Some(&mut rx[..read_len])
            } else {
                None
            },
        )?;

        self.unpack(&rx, captured);
        Ok(())
    }

    /// Walks the returned words and appends `captured` TDO bits to `out`,
    /// LSB-first per byte.
    fn unpack(&mut self, rx: &[u8], captured: usize) {
        let mut remaining = captured;
        let mut idx = 0;
        while remaining > 0 {
            let word = u16::from_le_bytes([rx[idx], rx[idx + 1]]) as u32;

            // In the last (incomplete) word the data isn't shifted all the
            // way down to the LSB.
            let mut mask: u32 = if remaining >= 16 {
                1
            } else {
                1 << (16 - remaining)
            };

            while mask <= 1 << 15 && remaining > 0 {
                let tdo = (word & mask != 0) as u8;
                if self.out_done & 7 == 0 {
                    self.out[self.out_done >> 3] = tdo;
                } else {
                    self.out[self.out_done >> 3] |= tdo << (self.out_done & 7);
                }
                self.out_done += 1;
                mask <<= 1;
                remaining -= 1;
            }

            idx += 2;
        }
    }
}

/// Shifts `num_bits` bits through the JTAG port, reading `tms` and `tdi`
/// LSB-first per byte and writing TDO to `tdo` in the same layout.
pub(crate) fn scan<P: A6Port>(
    port: &mut P,
    tms: &[u8],
    tdi: &[u8],
    tdo: &mut [u8],
    num_bits: u32,
) -> Result<(), CableError> {
    let mut xfer = A6Transfer::new(tdo);

    for i in 0..num_bits as usize {
        let di = (tdi[i >> 3] >> (i & 7)) & 1;
        let tm = (tms[i >> 3] >> (i & 7)) & 1;
        xfer.add_slot(di, tm, true);
        if xfer.in_bits == 4 * A6_CHUNK_WORDS - 1 {
            xfer.flush(port)?;
        }
    }

    if xfer.in_bits > 0 {
        // the CPLD doesn't like multiples of 4; add one dummy bit
        if xfer.in_bits & 3 == 0 {
            xfer.add_slot(0, 0, false);
        }
        xfer.flush(port)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    /// Decodes bursts the way the CPLD would and echoes TDI back as TDO,
    /// recording every burst for inspection.
    struct SimulatedCable {
        bursts: Vec<(u16, Vec<u8>)>,
    }

    impl SimulatedCable {
        fn new() -> SimulatedCable {
            SimulatedCable { bursts: Vec::new() }
        }
    }

    impl A6Port for SimulatedCable {
        fn a6_burst(
            &mut self,
            slots: u16,
            words: &[u8],
            read_back: Option<&mut [u8]>,
        ) -> Result<(), CableError> {
            assert!(slots > 0, "empty burst");
            assert_eq!(
                words.len(),
                2 * (slots as usize).div_ceil(4),
                "payload length must match the slot count"
            );
            self.bursts.push((slots, words.to_vec()));

            let mut samples = Vec::new();
            for i in 0..slots as usize {
                let word = u16::from_le_bytes([words[2 * (i / 4)], words[2 * (i / 4) + 1]]);
                let bit_idx = i % 4;
                let clocked = word & (1 << (8 + bit_idx)) != 0;
                let sampled = word & (1 << (12 + bit_idx)) != 0;
                if sampled {
                    assert!(clocked, "a sampled slot must also toggle TCK");
                    samples.push((word >> bit_idx) & 1 != 0);
                }
            }

            match read_back {
                Some(buf) => {
                    assert_eq!(buf.len(), 2 * samples.len().div_ceil(16));
                    for (word_idx, chunk) in samples.chunks(16).enumerate() {
                        let count = chunk.len();
                        let mut word = 0u16;
                        for (j, bit) in chunk.iter().enumerate() {
                            if *bit {
                                word |= 1 << (16 - count + j);
                            }
                        }
                        buf[2 * word_idx..2 * word_idx + 2]
                            .copy_from_slice(&word.to_le_bytes());
                    }
                }
                None => assert!(samples.is_empty(), "samples produced but no read requested"),
            }
            Ok(())
        }
    }

    fn run_scan(cable: &mut SimulatedCable, tms: &[u8], tdi: &[u8], num_bits: u32) -> Vec<u8> {
        let mut tdo = vec![0u8; (num_bits as usize).div_ceil(8)];
        scan(cable, tms, tdi, &mut tdo, num_bits).unwrap();
        tdo
    }

    #[test]
    fn single_bit_packs_one_full_word() {
        let mut cable = SimulatedCable::new();
        let tdo = run_scan(&mut cable, &[0x01], &[0x00], 1);

        // TDI=0, TMS=1, clock and read flags set
        assert_eq!(cable.bursts, vec![(1, vec![0x10, 0x11])]);
        assert_eq!(tdo, vec![0x00]);
    }

    #[test]
    fn single_high_bit_echoes_from_word_msb() {
        let mut cable = SimulatedCable::new();
        let tdo = run_scan(&mut cable, &[0x00], &[0x01], 1);

        assert_eq!(cable.bursts, vec![(1, vec![0x11, 0x11])]);
        assert_eq!(tdo, vec![0x01]);
    }

    #[test]
    fn four_bits_pad_to_five_slots() {
        let mut cable = SimulatedCable::new();
        let tdo = run_scan(&mut cable, &[0x00], &[0x0F], 4);

        // 4 real slots plus one dummy with all flags clear
        assert_eq!(cable.bursts, vec![(5, vec![0x0F, 0xFF, 0x00, 0x00])]);
        assert_eq!(tdo, vec![0x0F]);
    }

    #[test]
    fn burst_boundaries() {
        for (num_bits, expected) in [
            (15u32, vec![15u16]),
            (16, vec![15, 1]),
            (19, vec![15, 5]), // 4-slot residue padded with a dummy
            (30, vec![15, 15]),
            (45, vec![15, 15, 15]),
        ] {
            let bytes = (num_bits as usize).div_ceil(8);
            let mut cable = SimulatedCable::new();
            run_scan(&mut cable, &vec![0u8; bytes], &vec![0u8; bytes], num_bits);

            let slots: Vec<u16> = cable.bursts.iter().map(|(n, _)| *n).collect();
            assert_eq!(slots, expected, "for {} bits", num_bits);
            for n in slots {
                assert!(n % 4 != 0, "{}-slot burst would trip the CPLD", n);
            }
        }
    }

    #[test]
    fn echoes_tdi_across_burst_and_word_boundaries() {
        for num_bits in [1u32, 2, 3, 4, 7, 8, 12, 15, 16, 17, 23, 31, 32, 33, 40] {
            let bytes = (num_bits as usize).div_ceil(8);
            let tdi: Vec<u8> = (0..bytes).map(|i| (i as u8).wrapping_mul(37).wrapping_add(0x5B)).collect();
            let tms = vec![0u8; bytes];

            let mut cable = SimulatedCable::new();
            let tdo = run_scan(&mut cable, &tms, &tdi, num_bits);

            let mut expected = tdi.clone();
            if num_bits % 8 != 0 {
                // bits past the end must come back zero
                expected[bytes - 1] &= (1 << (num_bits % 8)) - 1;
            }
            assert_eq!(tdo, expected, "for {} bits", num_bits);
        }
    }

    #[test]
    fn tms_rides_in_the_high_nibble() {
        let mut cable = SimulatedCable::new();
        run_scan(&mut cable, &[0x05], &[0x03], 3);

        // slots: (tdi,tms) = (1,1), (1,0), (0,1)
        let (slots, words) = &cable.bursts[0];
        assert_eq!(*slots, 3);
        assert_eq!(words[0], (0x05 << 4) | 0x03);
        assert_eq!(words[1], 0x11 | (0x11 << 1) | (0x11 << 2));
    }

    #[test]
    fn flush_without_slots_is_an_internal_error() {
        let mut cable = SimulatedCable::new();
        let mut out = [0u8; 1];
        let mut xfer = A6Transfer::new(&mut out);
        match xfer.flush(&mut cable) {
            Err(CableError::ShiftInternal { slots: 0 }) => {}
            other => panic!("expected ShiftInternal, got {:?}", other),
        }
        assert!(cable.bursts.is_empty());
    }
}
