//! MMU (Memory Management Unit) functions and structures.

use std::sync::Mutex;

use crate::{
    apu::Apu,
    consts::DMA_ADDR,
    dma::Dma,
    error::Error,
    gb::{Components, GameBoyConfig},
    pad::Pad,
    rom::Cartridge,
    serial::Serial,
    state::{read_bool, read_bytes, read_u8, write_bool, write_bytes, write_u8, StateComponent, StateFormat},
    timer::Timer,
    util::SharedThread,
    warnln,
};

pub const BOOT_SIZE_DMG: usize = 256;
pub const RAM_SIZE_DMG: usize = 8192;

/// Contract implemented by every piece of hardware that is memory
/// mapped onto the main address bus.
pub trait BusComponent {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
    fn read_many(&self, addr: u16, count: usize) -> Vec<u8> {
        (0..count)
            .map(|offset| self.read(addr + offset as u16))
            .collect()
    }
    fn write_many(&mut self, addr: u16, values: &[u8]) {
        for (offset, &value) in values.iter().enumerate() {
            self.write(addr + offset as u16, value);
        }
    }
}

pub struct Mmu {
    /// Register that controls the interrupts that are considered
    /// to be enabled and should be triggered.
    pub ie: u8,

    /// Reference to the PPU (Pixel Processing Unit) that is going
    /// to be used both for VRAM reading/writing and to forward
    /// some of the access operations.
    ppu: crate::ppu::Ppu,

    /// Reference to the APU (Audio Processing Unit) that is going
    /// to be used both for register reading/writing and to forward
    /// some of the access operations.
    apu: Apu,

    /// Reference to the DMA (Direct Memory Access) controller, used
    /// to perform the atomic OAM transfer triggered by a write to
    /// [`crate::consts::DMA_ADDR`].
    dma: Dma,

    /// Reference to the Gamepad structure that is going to control
    /// the I/O access to this device.
    pad: Pad,

    /// The timer controller to be used as part of the I/O access
    /// that is memory mapped.
    timer: Timer,

    /// The serial data transfer controller to be used to control the
    /// link cable connection, this component is memory mapped.
    serial: Serial,

    /// The cartridge ROM that is currently loaded into the system,
    /// going to be used to access ROM and external RAM banks.
    rom: Cartridge,

    /// Flag that control the access to the boot section in the
    /// 0x0000-0x00FE memory area, this flag should be unset after
    /// the boot sequence has been finished.
    boot_active: bool,

    /// Buffer to be used to store the boot ROM, 256 bytes for DMG.
    boot: Vec<u8>,

    /// Buffer that is used to store the work RAM of the system,
    /// a fixed 8KB on DMG. Mapped in range 0xC000-0xDFFF, with the
    /// 0xE000-0xFDFF range aliasing back into it.
    ram: Vec<u8>,

    /// The pointer to the parent configuration of the running
    /// Game Boy emulator, that can be used to control the behaviour
    /// of the emulation.
    gbc: SharedThread<GameBoyConfig>,
}

impl Mmu {
    pub fn new(components: Components, gbc: SharedThread<GameBoyConfig>) -> Self {
        Self {
            ppu: components.ppu,
            apu: components.apu,
            dma: components.dma,
            pad: components.pad,
            timer: components.timer,
            serial: components.serial,
            rom: Cartridge::new(),
            boot_active: true,
            boot: vec![0x00; BOOT_SIZE_DMG],
            ram: vec![0x00; RAM_SIZE_DMG],
            ie: 0x0,
            gbc,
        }
    }

    pub fn reset(&mut self) {
        self.rom = Cartridge::new();
        self.boot_active = true;
        self.boot = vec![0x00; BOOT_SIZE_DMG];
        self.ram = vec![0x00; RAM_SIZE_DMG];
        self.ie = 0x0;
    }

    pub fn ppu(&mut self) -> &mut crate::ppu::Ppu {
        &mut self.ppu
    }

    pub fn ppu_i(&self) -> &crate::ppu::Ppu {
        &self.ppu
    }

    pub fn apu(&mut self) -> &mut Apu {
        &mut self.apu
    }

    pub fn apu_i(&self) -> &Apu {
        &self.apu
    }

    pub fn dma(&mut self) -> &mut Dma {
        &mut self.dma
    }

    pub fn dma_i(&self) -> &Dma {
        &self.dma
    }

    pub fn pad(&mut self) -> &mut Pad {
        &mut self.pad
    }

    pub fn pad_i(&self) -> &Pad {
        &self.pad
    }

    pub fn timer(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn timer_i(&self) -> &Timer {
        &self.timer
    }

    pub fn serial(&mut self) -> &mut Serial {
        &mut self.serial
    }

    pub fn serial_i(&self) -> &Serial {
        &self.serial
    }

    pub fn boot_active(&self) -> bool {
        self.boot_active
    }

    pub fn set_boot_active(&mut self, value: bool) {
        self.boot_active = value;
    }

    /// Runs the OAM DMA transfer if one was requested by a previous
    /// write to the DMA register. The transfer is atomic: the full
    /// 160 byte block is copied the moment it is triggered.
    pub fn clock_dma(&mut self) {
        if !self.dma.pending() {
            return;
        }
        let source = self.dma.source();
        let data = self.read_many(source, 160);
        self.write_many(0xfe00, &data);
        self.dma.clear_pending();
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0x0000-0x00FF - BOOT (256 B)
            0x0000..=0x00ff if self.boot_active => self.boot[addr as usize],

            // 0x0000-0x7FFF - ROM0 (16 KB) + ROM1 (Banked) (16 KB)
            0x0000..=0x7fff => self.rom.read(addr),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.read(addr),

            // 0xA000-0xBFFF - External RAM (8 KB)
            0xa000..=0xbfff => self.rom.read(addr),

            // 0xC000-0xDFFF - Work RAM (8 KB)
            0xc000..=0xdfff => self.ram[(addr & 0x1fff) as usize],

            // 0xE000-0xFDFF - Work RAM Shadow (echo)
            0xe000..=0xfdff => self.ram[(addr & 0x1fff) as usize],

            // 0xFE00-0xFE9F - Object attribute memory (OAM)
            0xfe00..=0xfe9f => self.ppu.read(addr),

            // 0xFEA0-0xFEFF - Not Usable
            0xfea0..=0xfeff => 0xff,

            // 0xFF00 - Joypad input
            0xff00 => self.pad.read(addr),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.read(addr),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.read(addr),

            // 0xFF0F — IF: Interrupt flag
            0xff0f =>
            {
                #[allow(clippy::bool_to_int_with_if)]
                (if self.ppu.int_vblank() { 0x01 } else { 0x00 }
                    | if self.ppu.int_stat() { 0x02 } else { 0x00 }
                    | if self.timer.int_tima() { 0x04 } else { 0x00 }
                    | if self.serial.int_serial() { 0x08 } else { 0x00 }
                    | if self.pad.int_pad() { 0x10 } else { 0x00 }
                    | 0xe0)
            }

            // 0xFF10-0xFF26 — Audio
            // 0xFF30-0xFF3F — Wave pattern
            0xff10..=0xff26 | 0xff30..=0xff3f => self.apu.read(addr),

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.read(addr),

            // 0xFF46 — DMA: OAM DMA source address & start
            DMA_ADDR => self.dma.read(addr),

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.ppu.read(addr),

            // 0xFFFF — IE: Interrupt enable
            0xffff => self.ie,

            addr => {
                warnln!("Reading from unknown location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0x0000-0x7FFF - ROM0 + ROM1 (Banked), also routes MBC
            // register writes regardless of the boot flag
            0x0000..=0x7fff => self.rom.write(addr, value),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.write(addr, value),

            // 0xA000-0xBFFF - External RAM (8 KB)
            0xa000..=0xbfff => self.rom.write(addr, value),

            // 0xC000-0xDFFF - Work RAM (8 KB)
            0xc000..=0xdfff => self.ram[(addr & 0x1fff) as usize] = value,

            // 0xE000-0xFDFF - Work RAM Shadow (echo)
            0xe000..=0xfdff => self.ram[(addr & 0x1fff) as usize] = value,

            // 0xFE00-0xFE9F - Object attribute memory (OAM)
            0xfe00..=0xfe9f => self.ppu.write(addr, value),

            // 0xFEA0-0xFEFF - Not Usable
            0xfea0..=0xfeff => {}

            // 0xFF00 - Joypad input
            0xff00 => self.pad.write(addr, value),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.write(addr, value),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.write(addr, value),

            // 0xFF0F — IF: Interrupt flag
            0xff0f => {
                self.ppu.set_int_vblank(value & 0x01 == 0x01);
                self.ppu.set_int_stat(value & 0x02 == 0x02);
                self.timer.set_int_tima(value & 0x04 == 0x04);
                self.serial.set_int_serial(value & 0x08 == 0x08);
                self.pad.set_int_pad(value & 0x10 == 0x10);
            }

            // 0xFF10-0xFF26 — Audio
            // 0xFF30-0xFF3F — Wave pattern
            0xff10..=0xff26 | 0xff30..=0xff3f => self.apu.write(addr, value),

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.write(addr, value),

            // 0xFF46 — DMA: OAM DMA source address & start
            DMA_ADDR => {
                self.dma.write(addr, value);
                self.clock_dma();
            }

            // 0xFF50 - Boot active flag, any write disables the boot ROM
            0xff50 => self.boot_active = false,

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.ppu.write(addr, value),

            // 0xFFFF — IE: Interrupt enable
            0xffff => self.ie = value,

            addr => warnln!("Writing to unknown location 0x{:04x}", addr),
        }
    }

    /// Reads a byte from a certain memory address, without the typical
    /// Game Boy verifications, allowing deep read of values.
    pub fn read_raw(&mut self, addr: u16) -> u8 {
        match addr {
            0xff10..=0xff3f => self.apu.read_raw(addr),
            _ => self.read(addr),
        }
    }

    /// Writes a byte to a certain memory address without the typical
    /// Game Boy verification process. This allows for faster memory
    /// access in registers and other memory areas that are typically
    /// inaccessible.
    pub fn write_raw(&mut self, addr: u16, value: u8) {
        match addr {
            0xff10..=0xff3f => self.apu.write_raw(addr, value),
            _ => self.write(addr, value),
        }
    }

    pub fn read_many(&mut self, addr: u16, count: u16) -> Vec<u8> {
        let mut data: Vec<u8> = vec![];
        for index in 0..count {
            data.push(self.read(addr.wrapping_add(index)));
        }
        data
    }

    pub fn write_many(&mut self, addr: u16, data: &[u8]) {
        for (index, byte) in data.iter().enumerate() {
            self.write(addr.wrapping_add(index as u16), *byte)
        }
    }

    pub fn write_boot(&mut self, buffer: &[u8]) {
        self.boot[..buffer.len()].clone_from_slice(buffer);
    }

    pub fn write_ram(&mut self, addr: u16, buffer: &[u8]) {
        self.ram[addr as usize..addr as usize + buffer.len()].clone_from_slice(buffer);
    }

    pub fn ram(&mut self) -> &mut Vec<u8> {
        &mut self.ram
    }

    pub fn ram_i(&self) -> &Vec<u8> {
        &self.ram
    }

    pub fn set_ram(&mut self, value: Vec<u8>) {
        self.ram = value;
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        &mut self.rom
    }

    pub fn rom_i(&self) -> &Cartridge {
        &self.rom
    }

    pub fn set_rom(&mut self, rom: Cartridge) {
        self.rom = rom;
    }

    pub fn set_gbc(&mut self, value: SharedThread<GameBoyConfig>) {
        self.gbc = value;
    }
}

impl StateComponent for Mmu {
    fn state(&self, _format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();
        write_u8(&mut buffer, self.ie);
        write_bool(&mut buffer, self.boot_active);
        write_bytes(&mut buffer, &self.ram);
        Ok(buffer)
    }

    fn set_state(&mut self, data: &[u8], _format: Option<StateFormat>) -> Result<(), Error> {
        let mut cursor = std::io::Cursor::new(data);
        self.ie = read_u8(&mut cursor)?;
        self.boot_active = read_bool(&mut cursor)?;
        let ram_len = self.ram.len();
        self.ram = read_bytes(&mut cursor, ram_len)?;
        Ok(())
    }
}

impl Default for Mmu {
    fn default() -> Self {
        let gbc = SharedThread::new(Mutex::new(GameBoyConfig::default()));
        let components = Components {
            ppu: crate::ppu::Ppu::new(gbc.clone()),
            apu: Apu::default(),
            dma: Dma::default(),
            pad: Pad::default(),
            timer: Timer::default(),
            serial: Serial::default(),
        };
        Mmu::new(components, gbc)
    }
}

#[cfg(test)]
mod tests {
    use super::Mmu;
    use crate::consts::DMA_ADDR;

    #[test]
    fn test_echo_ram_aliases_work_ram() {
        let mut mmu = Mmu::default();
        mmu.write(0xc012, 0x42);
        assert_eq!(mmu.read(0xe012), 0x42);
        mmu.write(0xfd34, 0x24);
        assert_eq!(mmu.read(0xdd34), 0x24);
    }

    #[test]
    fn test_oam_dma_copies_atomically() {
        let mut mmu = Mmu::default();
        for i in 0..160u16 {
            mmu.write(0xc000 + i, i as u8);
        }
        mmu.write(DMA_ADDR, 0xc0);
        for i in 0..160u16 {
            assert_eq!(mmu.read(0xfe00 + i), i as u8);
        }
    }

    #[test]
    fn test_boot_rom_disabled_by_ff50() {
        let mut mmu = Mmu::default();
        assert!(mmu.boot_active());
        mmu.write(0xff50, 0x01);
        assert!(!mmu.boot_active());
    }
}
