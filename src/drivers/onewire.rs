//! Dallas 1-Wire bus: CRC and (on the device) bit-banged bus primitives.
//!
//! Standard-speed timing on the open-drain pin set up by `hw_init`.
//! ROM search follows Maxim application note 187.

/// 64-bit ROM code: family, 48-bit serial, CRC.
pub type RomCode = [u8; 8];

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected 0x8C).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// True when the last byte is the CRC of the preceding ones.
pub fn crc_ok(data: &[u8]) -> bool {
    match data.split_last() {
        Some((&crc, body)) => crc8(body) == crc,
        None => false,
    }
}

#[cfg(target_os = "espidf")]
pub use bus::*;

#[cfg(target_os = "espidf")]
mod bus {
    use super::{RomCode, crc_ok};
    use crate::drivers::hw_init::{delay_us, gpio_read, gpio_write};
    use crate::pins::ONEWIRE_GPIO;

    pub const CMD_SEARCH_ROM: u8 = 0xF0;
    pub const CMD_MATCH_ROM: u8 = 0x55;
    pub const CMD_SKIP_ROM: u8 = 0xCC;

    /// Reset pulse; true if at least one device answered with presence.
    pub fn reset() -> bool {
        gpio_write(ONEWIRE_GPIO, false);
        delay_us(480);
        gpio_write(ONEWIRE_GPIO, true);
        delay_us(70);
        let presence = !gpio_read(ONEWIRE_GPIO);
        delay_us(410);
        presence
    }

    fn write_bit(bit: bool) {
        gpio_write(ONEWIRE_GPIO, false);
        if bit {
            delay_us(6);
            gpio_write(ONEWIRE_GPIO, true);
            delay_us(64);
        } else {
            delay_us(60);
            gpio_write(ONEWIRE_GPIO, true);
            delay_us(10);
        }
    }

    fn read_bit() -> bool {
        gpio_write(ONEWIRE_GPIO, false);
        delay_us(6);
        gpio_write(ONEWIRE_GPIO, true);
        delay_us(9);
        let bit = gpio_read(ONEWIRE_GPIO);
        delay_us(55);
        bit
    }

    pub fn write_byte(byte: u8) {
        for i in 0..8 {
            write_bit(byte >> i & 1 != 0);
        }
    }

    pub fn read_byte() -> u8 {
        (0..8).fold(0u8, |acc, i| acc | (u8::from(read_bit()) << i))
    }

    /// Address one device for the next command.
    pub fn select(rom: &RomCode) {
        write_byte(CMD_MATCH_ROM);
        for &b in rom {
            write_byte(b);
        }
    }

    /// Enumerate up to `N` devices with a valid ROM CRC.
    pub fn search<const N: usize>() -> heapless::Vec<RomCode, N> {
        let mut found = heapless::Vec::new();
        let mut rom: RomCode = [0; 8];
        let mut last_discrepancy = 0u8;
        let mut last_device = false;

        while !last_device && !found.is_full() {
            if !reset() {
                break;
            }
            write_byte(CMD_SEARCH_ROM);

            let mut last_zero = 0u8;
            for bit_number in 1..=64u8 {
                let id_bit = read_bit();
                let cmp_bit = read_bit();
                if id_bit && cmp_bit {
                    // No device answered this bit.
                    return found;
                }
                let byte = usize::from((bit_number - 1) / 8);
                let mask = 1u8 << ((bit_number - 1) % 8);
                let direction = if id_bit != cmp_bit {
                    id_bit
                } else if bit_number < last_discrepancy {
                    rom[byte] & mask != 0
                } else {
                    bit_number == last_discrepancy
                };
                if id_bit == cmp_bit && !direction {
                    last_zero = bit_number;
                }
                if direction {
                    rom[byte] |= mask;
                } else {
                    rom[byte] &= !mask;
                }
                write_bit(direction);
            }

            last_discrepancy = last_zero;
            last_device = last_discrepancy == 0;
            if crc_ok(&rom) {
                let _ = found.push(rom);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc8_known_rom() {
        // ROM code from the DS18B20 datasheet CRC example (family 0x28).
        let rom = [0x28, 0xFF, 0x4B, 0x6C, 0x91, 0x16, 0x04, 0x00];
        let crc = crc8(&rom[..7]);
        let mut full = rom;
        full[7] = crc;
        assert!(crc_ok(&full));
        full[3] ^= 0x01;
        assert!(!crc_ok(&full));
    }

    #[test]
    fn crc8_of_empty_is_zero() {
        assert_eq!(crc8(&[]), 0);
        assert!(!crc_ok(&[]));
    }

    #[test]
    fn crc8_reference_vector() {
        // Maxim AN27 worked example: 02 1C B8 01 00 00 00 → A2
        assert_eq!(crc8(&[0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00]), 0xA2);
    }
}
