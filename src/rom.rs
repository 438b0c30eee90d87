//! Cartridge (ROM) related functions and structures.

use core::fmt;
use std::{
    cmp::max,
    fmt::{Display, Formatter},
};

use crate::{
    error::Error,
    mmu::BusComponent,
    state::{read_bool, read_bytes, read_u8, write_bool, write_bytes, write_u8, StateComponent, StateFormat},
    util::read_file,
    warnln,
};

pub const ROM_BANK_SIZE: usize = 16384;
pub const RAM_BANK_SIZE: usize = 8192;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MbcType {
    NoMbc = 0x00,
    Mbc1 = 0x01,
    Mbc2 = 0x02,
    Mbc3 = 0x03,
    Mbc5 = 0x04,
    Unknown = 0x05,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomType {
    RomOnly = 0x00,
    Mbc1 = 0x01,
    Mbc1Ram = 0x02,
    Mbc1RamBattery = 0x03,
    Mbc2 = 0x05,
    Mbc2Battery = 0x06,
    RomRam = 0x08,
    RomRamBattery = 0x09,
    Mbc3TimerBattery = 0x0f,
    Mbc3TimerRamBattery = 0x10,
    Mbc3 = 0x11,
    Mbc3Ram = 0x12,
    Mbc3RamBattery = 0x13,
    Mbc5 = 0x19,
    Mbc5Ram = 0x1a,
    Mbc5RamBattery = 0x1b,
    Mbc5Rumble = 0x1c,
    Mbc5RumbleRam = 0x1d,
    Mbc5RumbleRamBattery = 0x1e,
    Unknown = 0xef,
}

impl RomType {
    pub fn description(&self) -> &'static str {
        match self {
            RomType::RomOnly => "ROM Only",
            RomType::Mbc1 => "MBC1",
            RomType::Mbc1Ram => "MBC1 + RAM",
            RomType::Mbc1RamBattery => "MBC1 + RAM + Battery",
            RomType::Mbc2 => "MBC2",
            RomType::Mbc2Battery => "MBC2 + RAM",
            RomType::RomRam => "ROM + RAM",
            RomType::RomRamBattery => "ROM + RAM + BATTERY",
            RomType::Mbc3TimerBattery => "MBC3 + TIMER + BATTERY",
            RomType::Mbc3TimerRamBattery => "MBC3 + TIMER + RAM + BATTERY",
            RomType::Mbc3 => "MBC3",
            RomType::Mbc3Ram => "MBC3 + RAM",
            RomType::Mbc3RamBattery => "MBC3 + RAM + BATTERY",
            RomType::Mbc5 => "MBC5",
            RomType::Mbc5Ram => "MBC5 + RAM",
            RomType::Mbc5RamBattery => "MBC5 + RAM + BATTERY",
            RomType::Mbc5Rumble => "MBC5 + RUMBLE",
            RomType::Mbc5RumbleRam => "MBC5 + RUMBLE + RAM",
            RomType::Mbc5RumbleRamBattery => "MBC5 + RUMBLE + RAM + BATTERY",
            RomType::Unknown => "Unknown",
        }
    }

    pub fn mbc_type(&self) -> MbcType {
        match self {
            RomType::RomOnly => MbcType::NoMbc,
            RomType::Mbc1 | RomType::Mbc1Ram | RomType::Mbc1RamBattery => MbcType::Mbc1,
            RomType::Mbc2 | RomType::Mbc2Battery => MbcType::Mbc2,
            RomType::Mbc3
            | RomType::Mbc3Ram
            | RomType::Mbc3RamBattery
            | RomType::Mbc3TimerBattery
            | RomType::Mbc3TimerRamBattery => MbcType::Mbc3,
            RomType::Mbc5
            | RomType::Mbc5Ram
            | RomType::Mbc5RamBattery
            | RomType::Mbc5Rumble
            | RomType::Mbc5RumbleRam
            | RomType::Mbc5RumbleRamBattery => MbcType::Mbc5,
            _ => MbcType::Unknown,
        }
    }
}

impl Display for RomType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomSize {
    Size32K,
    Size64K,
    Size128K,
    Size256K,
    Size512K,
    Size1M,
    Size2M,
    Size4M,
    Size8M,
    SizeUnknown,
}

impl RomSize {
    pub fn description(&self) -> &'static str {
        match self {
            RomSize::Size32K => "32 KB",
            RomSize::Size64K => "64 KB",
            RomSize::Size128K => "128 KB",
            RomSize::Size256K => "256 KB",
            RomSize::Size512K => "512 KB",
            RomSize::Size1M => "1 MB",
            RomSize::Size2M => "2 MB",
            RomSize::Size4M => "4 MB",
            RomSize::Size8M => "8 MB",
            RomSize::SizeUnknown => "Unknown",
        }
    }

    pub fn rom_banks(&self) -> u16 {
        match self {
            RomSize::Size32K => 2,
            RomSize::Size64K => 4,
            RomSize::Size128K => 8,
            RomSize::Size256K => 16,
            RomSize::Size512K => 32,
            RomSize::Size1M => 64,
            RomSize::Size2M => 128,
            RomSize::Size4M => 256,
            RomSize::Size8M => 512,
            RomSize::SizeUnknown => 0,
        }
    }
}

impl Display for RomSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RamSize {
    NoRam,
    Unused,
    Size8K,
    Size32K,
    Size128K,
    Size64K,
    SizeUnknown,
}

impl RamSize {
    pub fn description(&self) -> &'static str {
        match self {
            RamSize::NoRam => "No RAM",
            RamSize::Unused => "Unused",
            RamSize::Size8K => "8 KB",
            RamSize::Size32K => "32 KB",
            RamSize::Size128K => "128 KB",
            RamSize::Size64K => "64 KB",
            RamSize::SizeUnknown => "Unknown",
        }
    }

    pub fn ram_banks(&self) -> u16 {
        match self {
            RamSize::NoRam => 0,
            RamSize::Unused => 0,
            RamSize::Size8K => 1,
            RamSize::Size32K => 4,
            RamSize::Size64K => 8,
            RamSize::Size128K => 16,
            RamSize::SizeUnknown => 0,
        }
    }
}

impl Display for RamSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Indices into [`Cartridge::rtc_regs`] / [`Cartridge::rtc_latched`].
mod rtc {
    pub const SECONDS: usize = 0;
    pub const MINUTES: usize = 1;
    pub const HOURS: usize = 2;
    pub const DAYS_LOW: usize = 3;
    pub const DAYS_HIGH: usize = 4;
}

/// Structure that defines the ROM and RAM contents of a Game Boy
/// cartridge, correctly addressing the specifics of the MBC1/2/3/5
/// memory bank controllers.
#[derive(Clone)]
pub struct Cartridge {
    rom_data: Vec<u8>,
    ram_data: Vec<u8>,

    mbc: &'static Mbc,

    rom_bank_count: u16,
    ram_bank_count: u16,

    rom_offset: usize,
    ram_offset: usize,

    ram_enabled: bool,

    title_offset: usize,

    /// MBC1: low 5 bits of the ROM bank register (0x2000-0x3FFF).
    mbc1_bank_lo: u8,
    /// MBC1: secondary 2 bit register (0x4000-0x5FFF), either RAM bank
    /// or the upper ROM bank bits depending on `mbc1_mode`.
    mbc1_bank2: u8,
    /// MBC1: 0 = ROM banking mode, 1 = RAM banking mode.
    mbc1_mode: u8,

    /// MBC3: raw value written to 0x4000-0x5FFF, tells a RAM bank
    /// select (0x00-0x03) apart from an RTC register select (0x08-0x0C).
    bank_select: u8,

    /// MBC3 RTC registers: seconds, minutes, hours, days-low, days-high
    /// (bit 0 = day carry MSB, bit 6 = halt, bit 7 = day counter carry).
    /// The clock is stubbed and never advances on its own; only the
    /// register/latch read-write semantics are implemented.
    rtc_regs: [u8; 5],
    rtc_latched: [u8; 5],
    rtc_latch_prev: u8,
}

impl Cartridge {
    pub fn new() -> Self {
        Self {
            rom_data: vec![],
            ram_data: vec![],
            mbc: &NO_MBC,
            rom_bank_count: 0,
            ram_bank_count: 0,
            rom_offset: 0x4000,
            ram_offset: 0x0000,
            ram_enabled: false,
            title_offset: 0x0143,
            mbc1_bank_lo: 1,
            mbc1_bank2: 0,
            mbc1_mode: 0,
            bank_select: 0,
            rtc_regs: [0; 5],
            rtc_latched: [0; 5],
            rtc_latch_prev: 0,
        }
    }

    pub fn from_data(data: &[u8]) -> Result<Self, Error> {
        let mut cartridge = Cartridge::new();
        cartridge.set_data(data)?;
        Ok(cartridge)
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let data = read_file(path).map_err(|_| Error::InvalidCartridge)?;
        Self::from_data(&data)
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7fff => (self.mbc.read_rom)(self, addr),
            0xa000..=0xbfff => (self.mbc.read_ram)(self, addr),
            _ => {
                warnln!("Reading from unknown Cartridge control 0x{:04x}", addr);
                0x00
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x7fff => (self.mbc.write_rom)(self, addr, value),
            0xa000..=0xbfff => (self.mbc.write_ram)(self, addr, value),
            _ => warnln!("Writing to unknown Cartridge address 0x{:04x}", addr),
        }
    }

    pub fn reset(&mut self) {
        *self = Cartridge::new();
    }

    pub fn data(&self) -> &Vec<u8> {
        &self.rom_data
    }

    pub fn rom_bank(&self) -> u16 {
        (self.rom_offset / ROM_BANK_SIZE) as u16
    }

    pub fn set_rom_bank(&mut self, rom_bank: u16) {
        self.rom_offset = rom_bank as usize * ROM_BANK_SIZE;
    }

    pub fn ram_bank(&self) -> u8 {
        (self.ram_offset / RAM_BANK_SIZE) as u8
    }

    pub fn set_ram_bank(&mut self, ram_bank: u8) {
        self.ram_offset = ram_bank as usize * RAM_BANK_SIZE;
    }

    fn set_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.ensure_data(data)?;
        self.rom_data = data.to_vec();
        self.rom_offset = 0x4000;
        self.ram_offset = 0x0000;
        self.set_mbc()?;
        self.set_computed();
        self.set_title_offset();
        self.allocate_ram();
        self.set_rom_bank(1);
        self.set_ram_bank(0);
        if !self.valid_checksum() {
            return Err(Error::InvalidCartridge);
        }
        Ok(())
    }

    fn set_mbc(&mut self) -> Result<(), Error> {
        self.mbc = self.mbc()?;
        Ok(())
    }

    fn set_computed(&mut self) {
        self.rom_bank_count = self.rom_size().rom_banks();
        self.ram_bank_count = self.ram_size().ram_banks();
    }

    pub fn set_title_offset(&mut self) {
        if self.rom_data.len() < 0x0143 {
            return;
        }
        let mut offset: usize = 0;
        for byte in &self.rom_data[0x0134..=0x0143] {
            if *byte == 0u8 {
                break;
            }
            offset += 1;
        }
        self.title_offset = 0x0134 + offset;
    }

    fn allocate_ram(&mut self) {
        let ram_banks = max(self.ram_size().ram_banks(), 1);
        self.ram_data = vec![0u8; ram_banks as usize * RAM_BANK_SIZE];
    }

    fn ensure_data(&self, data: &[u8]) -> Result<(), Error> {
        if data.len() < 0x7fff {
            return Err(Error::InvalidCartridge);
        }
        if data.len() % (16 * 1024) != 0 {
            return Err(Error::InvalidCartridge);
        }
        Ok(())
    }

    pub fn mbc(&self) -> Result<&'static Mbc, Error> {
        Ok(match self.rom_type() {
            RomType::RomOnly | RomType::RomRam | RomType::RomRamBattery => &NO_MBC,
            RomType::Mbc1 | RomType::Mbc1Ram | RomType::Mbc1RamBattery => &MBC1,
            RomType::Mbc2 | RomType::Mbc2Battery => &MBC2,
            RomType::Mbc3TimerBattery
            | RomType::Mbc3TimerRamBattery
            | RomType::Mbc3
            | RomType::Mbc3Ram
            | RomType::Mbc3RamBattery => &MBC3,
            RomType::Mbc5
            | RomType::Mbc5Ram
            | RomType::Mbc5RamBattery
            | RomType::Mbc5Rumble
            | RomType::Mbc5RumbleRam
            | RomType::Mbc5RumbleRamBattery => &MBC5,
            _ => return Err(Error::UnsupportedFeature),
        })
    }

    pub fn has_rumble(&self) -> bool {
        matches!(
            self.rom_type(),
            RomType::Mbc5Rumble | RomType::Mbc5RumbleRam | RomType::Mbc5RumbleRamBattery
        )
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn title(&self) -> String {
        String::from(
            std::str::from_utf8(&self.rom_data[0x0134..self.title_offset])
                .unwrap_or("")
                .trim(),
        )
    }

    pub fn rom_type(&self) -> RomType {
        if self.rom_data.len() <= 0x0147 {
            return RomType::Unknown;
        }
        match self.rom_data[0x0147] {
            0x00 => RomType::RomOnly,
            0x01 => RomType::Mbc1,
            0x02 => RomType::Mbc1Ram,
            0x03 => RomType::Mbc1RamBattery,
            0x05 => RomType::Mbc2,
            0x06 => RomType::Mbc2Battery,
            0x08 => RomType::RomRam,
            0x09 => RomType::RomRamBattery,
            0x0f => RomType::Mbc3TimerBattery,
            0x10 => RomType::Mbc3TimerRamBattery,
            0x11 => RomType::Mbc3,
            0x12 => RomType::Mbc3Ram,
            0x13 => RomType::Mbc3RamBattery,
            0x19 => RomType::Mbc5,
            0x1a => RomType::Mbc5Ram,
            0x1b => RomType::Mbc5RamBattery,
            0x1c => RomType::Mbc5Rumble,
            0x1d => RomType::Mbc5RumbleRam,
            0x1e => RomType::Mbc5RumbleRamBattery,
            _ => RomType::Unknown,
        }
    }

    pub fn rom_size(&self) -> RomSize {
        if self.rom_data.len() <= 0x0148 {
            return RomSize::SizeUnknown;
        }
        match self.rom_data[0x0148] {
            0x00 => RomSize::Size32K,
            0x01 => RomSize::Size64K,
            0x02 => RomSize::Size128K,
            0x03 => RomSize::Size256K,
            0x04 => RomSize::Size512K,
            0x05 => RomSize::Size1M,
            0x06 => RomSize::Size2M,
            0x07 => RomSize::Size4M,
            0x08 => RomSize::Size8M,
            _ => RomSize::SizeUnknown,
        }
    }

    pub fn ram_size(&self) -> RamSize {
        if self.rom_data.len() <= 0x0149 {
            return RamSize::SizeUnknown;
        }
        match self.rom_data[0x0149] {
            0x00 => RamSize::NoRam,
            0x01 => RamSize::Unused,
            0x02 => RamSize::Size8K,
            0x03 => RamSize::Size32K,
            0x04 => RamSize::Size128K,
            0x05 => RamSize::Size64K,
            _ => RamSize::SizeUnknown,
        }
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self.rom_type(),
            RomType::Mbc1RamBattery
                | RomType::Mbc2Battery
                | RomType::RomRamBattery
                | RomType::Mbc3TimerBattery
                | RomType::Mbc3TimerRamBattery
                | RomType::Mbc3RamBattery
                | RomType::Mbc5RamBattery
                | RomType::Mbc5RumbleRamBattery
        )
    }

    pub fn rom_data_eager(&self) -> Vec<u8> {
        self.rom_data.clone()
    }

    pub fn ram_data_eager(&self) -> Vec<u8> {
        self.ram_data.clone()
    }

    pub fn set_ram_data(&mut self, data: &[u8]) {
        self.ram_data = data.to_vec();
    }

    pub fn checksum(&self) -> u8 {
        let mut sum: u8 = 0;
        for i in 0x0134..=0x014c {
            sum = sum.wrapping_sub(self.rom_data[i]).wrapping_sub(1);
        }
        sum
    }

    pub fn valid_checksum(&self) -> bool {
        self.rom_data[0x014d] == self.checksum()
    }

    pub fn description(&self, column_length: usize) -> String {
        let title_l = format!("{:width$}", "Title", width = column_length);
        let type_l = format!("{:width$}", "Type", width = column_length);
        let rom_size_l = format!("{:width$}", "ROM Size", width = column_length);
        let ram_size_l = format!("{:width$}", "RAM Size", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}\n{}  {}",
            title_l,
            self.title(),
            type_l,
            self.rom_type(),
            rom_size_l,
            self.rom_size(),
            ram_size_l,
            self.ram_size(),
        )
    }
}

impl Cartridge {
    pub fn rom_data(&self) -> &Vec<u8> {
        &self.rom_data
    }

    pub fn rom_data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.rom_data
    }

    pub fn ram_data(&self) -> &Vec<u8> {
        &self.ram_data
    }

    pub fn ram_data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.ram_data
    }
}

impl BusComponent for Cartridge {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}

impl StateComponent for Cartridge {
    fn state(&self, _format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();
        write_u8(&mut buffer, self.rom_bank() as u8);
        write_u8(&mut buffer, (self.rom_bank() >> 8) as u8);
        write_u8(&mut buffer, self.ram_bank());
        write_bool(&mut buffer, self.ram_enabled);
        write_u8(&mut buffer, self.mbc1_bank_lo);
        write_u8(&mut buffer, self.mbc1_bank2);
        write_u8(&mut buffer, self.mbc1_mode);
        write_u8(&mut buffer, self.bank_select);
        write_bytes(&mut buffer, &self.rtc_regs);
        write_bytes(&mut buffer, &self.rtc_latched);
        write_u8(&mut buffer, self.rtc_latch_prev);
        write_bytes(&mut buffer, &self.ram_data);
        Ok(buffer)
    }

    fn set_state(&mut self, data: &[u8], _format: Option<StateFormat>) -> Result<(), Error> {
        let mut cursor = std::io::Cursor::new(data);
        let rom_bank_lo = read_u8(&mut cursor)?;
        let rom_bank_hi = read_u8(&mut cursor)?;
        self.set_rom_bank(u16::from_le_bytes([rom_bank_lo, rom_bank_hi]));
        self.set_ram_bank(read_u8(&mut cursor)?);
        self.ram_enabled = read_bool(&mut cursor)?;
        self.mbc1_bank_lo = read_u8(&mut cursor)?;
        self.mbc1_bank2 = read_u8(&mut cursor)?;
        self.mbc1_mode = read_u8(&mut cursor)?;
        self.bank_select = read_u8(&mut cursor)?;
        self.rtc_regs = read_bytes(&mut cursor, 5)?.try_into().unwrap();
        self.rtc_latched = read_bytes(&mut cursor, 5)?.try_into().unwrap();
        self.rtc_latch_prev = read_u8(&mut cursor)?;
        let ram_len = self.ram_data.len();
        self.ram_data = read_bytes(&mut cursor, ram_len)?;
        Ok(())
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}

pub struct Mbc {
    pub name: &'static str,
    pub read_rom: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_rom: fn(rom: &mut Cartridge, addr: u16, value: u8),
    pub read_ram: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_ram: fn(rom: &mut Cartridge, addr: u16, value: u8),
}

pub static NO_MBC: Mbc = Mbc {
    name: "No MBC",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 { rom.rom_data[addr as usize] },
    write_rom: |_rom: &mut Cartridge, _addr: u16, _value: u8| {},
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        *rom.ram_data.get((addr - 0xa000) as usize).unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if let Some(slot) = rom.ram_data.get_mut((addr - 0xa000) as usize) {
            *slot = value;
        }
    },
};

pub static MBC1: Mbc = Mbc {
    name: "MBC1",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            0x0000..=0x3fff => {
                // in RAM banking mode with more than 512 KiB of ROM the
                // zero bank is also affected by the secondary register
                let bank = if rom.mbc1_mode == 1 && rom.rom_bank_count > 32 {
                    (rom.mbc1_bank2 as usize) << 5
                } else {
                    0
                };
                *rom.rom_data
                    .get(bank * ROM_BANK_SIZE + addr as usize)
                    .unwrap_or(&0xff)
            }
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            0x0000..=0x1fff => rom.ram_enabled = (value & 0x0f) == 0x0a,
            0x2000..=0x3fff => {
                let mut bank_lo = value & 0x1f;
                if bank_lo == 0 {
                    bank_lo = 1;
                }
                rom.mbc1_bank_lo = bank_lo;
                mbc1_recompute_rom_bank(rom);
            }
            0x4000..=0x5fff => {
                rom.mbc1_bank2 = value & 0x03;
                if rom.mbc1_mode == 1 {
                    if (rom.mbc1_bank2 as u16) < rom.ram_bank_count {
                        rom.set_ram_bank(rom.mbc1_bank2);
                    }
                } else {
                    mbc1_recompute_rom_bank(rom);
                }
            }
            0x6000..=0x7fff => {
                rom.mbc1_mode = value & 0x01;
                if rom.mbc1_mode == 1 {
                    if (rom.mbc1_bank2 as u16) < rom.ram_bank_count {
                        rom.set_ram_bank(rom.mbc1_bank2);
                    }
                } else {
                    rom.set_ram_bank(0);
                    mbc1_recompute_rom_bank(rom);
                }
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        let offset = if rom.mbc1_mode == 1 { rom.ram_offset } else { 0 };
        *rom.ram_data
            .get(offset + (addr - 0xa000) as usize)
            .unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            warnln!("Attempt to write to ERAM while write protect is active");
            return;
        }
        let offset = if rom.mbc1_mode == 1 { rom.ram_offset } else { 0 };
        if let Some(slot) = rom.ram_data.get_mut(offset + (addr - 0xa000) as usize) {
            *slot = value;
        }
    },
};

fn mbc1_recompute_rom_bank(rom: &mut Cartridge) {
    let high = if rom.rom_bank_count > 32 {
        (rom.mbc1_bank2 as u16) << 5
    } else {
        0
    };
    let bank = (rom.mbc1_bank_lo as u16 | high) & (rom.rom_bank_count * 2 - 1);
    rom.set_rom_bank(bank);
}

pub static MBC2: Mbc = Mbc {
    name: "MBC2",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            0x0000..=0x3fff => rom.rom_data[addr as usize],
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        if addr > 0x3fff {
            warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr);
            return;
        }
        // bit 8 of the address selects RAM-enable vs ROM-bank register
        if addr & 0x0100 == 0x0000 {
            rom.ram_enabled = (value & 0x0f) == 0x0a;
        } else {
            let mut bank = value & 0x0f;
            if bank == 0 {
                bank = 1;
            }
            rom.set_rom_bank(bank as u16 & (rom.rom_bank_count * 2 - 1).max(1));
        }
    },
    // MBC2 has 512x4 bit RAM, upper nibble of every read is forced to 1
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        let index = (addr - 0xa000) as usize & 0x1ff;
        0xf0 | (rom.ram_data.get(index).copied().unwrap_or(0x0f) & 0x0f)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            warnln!("Attempt to write to ERAM while write protect is active");
            return;
        }
        let index = (addr - 0xa000) as usize & 0x1ff;
        if let Some(slot) = rom.ram_data.get_mut(index) {
            *slot = value & 0x0f;
        }
    },
};

pub static MBC3: Mbc = Mbc {
    name: "MBC3",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            0x0000..=0x3fff => rom.rom_data[addr as usize],
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            0x0000..=0x1fff => rom.ram_enabled = (value & 0x0f) == 0x0a,
            0x2000..=0x3fff => {
                let mut bank = value as u16 & 0x7f;
                if bank == 0 {
                    bank = 1;
                }
                bank &= rom.rom_bank_count * 2 - 1;
                rom.set_rom_bank(bank);
            }
            0x4000..=0x5fff => {
                rom.bank_select = value;
                if value <= 0x03 && (value as u16) < rom.ram_bank_count {
                    rom.set_ram_bank(value);
                }
            }
            0x6000..=0x7fff => {
                if rom.rtc_latch_prev == 0x00 && value == 0x01 {
                    rom.rtc_latched = rom.rtc_regs;
                }
                rom.rtc_latch_prev = value;
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        match rom.bank_select {
            0x00..=0x03 => *rom
                .ram_data
                .get(rom.ram_offset + (addr - 0xa000) as usize)
                .unwrap_or(&0xff),
            0x08 => rom.rtc_latched[rtc::SECONDS],
            0x09 => rom.rtc_latched[rtc::MINUTES],
            0x0a => rom.rtc_latched[rtc::HOURS],
            0x0b => rom.rtc_latched[rtc::DAYS_LOW],
            0x0c => rom.rtc_latched[rtc::DAYS_HIGH],
            _ => 0xff,
        }
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            warnln!("Attempt to write to ERAM while write protect is active");
            return;
        }
        match rom.bank_select {
            0x00..=0x03 => {
                if let Some(slot) =
                    rom.ram_data.get_mut(rom.ram_offset + (addr - 0xa000) as usize)
                {
                    *slot = value;
                }
            }
            0x08 => rom.rtc_regs[rtc::SECONDS] = value,
            0x09 => rom.rtc_regs[rtc::MINUTES] = value,
            0x0a => rom.rtc_regs[rtc::HOURS] = value,
            0x0b => rom.rtc_regs[rtc::DAYS_LOW] = value,
            0x0c => rom.rtc_regs[rtc::DAYS_HIGH] = value,
            _ => {}
        }
    },
};

pub static MBC5: Mbc = Mbc {
    name: "MBC5",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            0x0000..=0x3fff => rom.rom_data[addr as usize],
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            0x0000..=0x1fff => rom.ram_enabled = (value & 0x0f) == 0x0a,
            0x2000..=0x2fff => {
                let bank = (rom.rom_bank() & 0x0100) | value as u16;
                rom.set_rom_bank(bank);
            }
            0x3000..=0x3fff => {
                let bank = (rom.rom_bank() & 0x00ff) | (((value & 0x01) as u16) << 8);
                rom.set_rom_bank(bank);
            }
            0x4000..=0x5fff => {
                let mask = if rom.has_rumble() { 0x07 } else { 0x0f };
                let ram_bank = value & mask;
                if (ram_bank as u16) < rom.ram_bank_count {
                    rom.set_ram_bank(ram_bank);
                }
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        *rom.ram_data
            .get(rom.ram_offset + (addr - 0xa000) as usize)
            .unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            warnln!("Attempt to write to ERAM while write protect is active");
            return;
        }
        if let Some(slot) = rom.ram_data.get_mut(rom.ram_offset + (addr - 0xa000) as usize) {
            *slot = value;
        }
    },
};

#[cfg(test)]
mod tests {
    use super::Cartridge;

    fn make_rom(banks: usize, rom_size_code: u8) -> Vec<u8> {
        let mut data = vec![0u8; banks * super::ROM_BANK_SIZE];
        data[0x0147] = 0x01; // MBC1
        data[0x0148] = rom_size_code;
        data[0x0149] = 0x00;
        let mut sum: u8 = 0;
        for i in 0x0134..=0x014c {
            sum = sum.wrapping_sub(data[i]).wrapping_sub(1);
        }
        data[0x014d] = sum;
        data
    }

    #[test]
    fn test_mbc1_bank_switch_and_zero_remap() {
        let data = make_rom(8, 0x02); // 128 KiB, 8 banks
        let mut rom = Cartridge::from_data(&data).unwrap();
        rom.rom_data_mut()[0x14000] = 0xab;
        rom.write(0x2000, 0x05);
        assert_eq!(rom.read(0x4000), 0xab);

        rom.rom_data_mut()[0x4000] = 0xcd;
        rom.write(0x2000, 0x00);
        assert_eq!(rom.read(0x4000), 0xcd);
    }

    #[test]
    fn test_header_checksum_zero_bytes() {
        let mut data = vec![0u8; 2 * super::ROM_BANK_SIZE];
        data[0x0147] = 0x00;
        data[0x0148] = 0x00;
        data[0x0149] = 0x00;
        data[0x014d] = 0xe7; // header checksum of an all-zero 0x134..=0x14c range
        let rom = Cartridge::from_data(&data).unwrap();
        assert_eq!(rom.checksum(), 0xe7);
    }

    #[test]
    fn test_mbc2_ram_upper_nibble_forced() {
        let mut data = vec![0u8; 2 * super::ROM_BANK_SIZE];
        data[0x0147] = 0x06; // MBC2 + battery
        data[0x0148] = 0x00;
        data[0x0149] = 0x00;
        let mut sum: u8 = 0;
        for i in 0x0134..=0x014c {
            sum = sum.wrapping_sub(data[i]).wrapping_sub(1);
        }
        data[0x014d] = sum;
        let mut rom = Cartridge::from_data(&data).unwrap();
        rom.write(0x0000, 0x0a); // enable RAM
        rom.write(0xa000, 0x07);
        assert_eq!(rom.read(0xa000), 0xf7);
    }

    #[test]
    fn test_mbc3_rtc_latch_snapshot() {
        let mut data = vec![0u8; 2 * super::ROM_BANK_SIZE];
        data[0x0147] = 0x0f; // MBC3 + timer + battery
        data[0x0148] = 0x00;
        data[0x0149] = 0x00;
        let mut sum: u8 = 0;
        for i in 0x0134..=0x014c {
            sum = sum.wrapping_sub(data[i]).wrapping_sub(1);
        }
        data[0x014d] = sum;
        let mut rom = Cartridge::from_data(&data).unwrap();
        rom.write(0x0000, 0x0a); // enable RAM/RTC
        rom.write(0x4000, 0x08); // select seconds register
        rom.write(0xa000, 42);
        // before latching, the read-back port still shows the old snapshot (0)
        assert_eq!(rom.read(0xa000), 0);
        rom.write(0x6000, 0x00);
        rom.write(0x6000, 0x01);
        assert_eq!(rom.read(0xa000), 42);
    }
}
