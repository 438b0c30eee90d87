//! Game Boy emulation entrypoint and associated functions and structures.
//!
//! Most of the meaningful publicly available functions and structures to build
//! a working emulator should be present here.
//!
//! # Examples
//!
//! Creates a simple [`GameBoy`] instance and boots straight to cartridge
//! execution (post boot register state, skipping the boot ROM).
//!
//! ```rust
//! use rboy_dmg::gb::GameBoy;
//! let mut game_boy = GameBoy::new();
//! game_boy.load_rom_empty().unwrap();
//! game_boy.boot();
//! let cycles = game_boy.step_to(0x0101);
//! println!("Ran {} cycles", cycles);
//! ```

use std::{
    collections::VecDeque,
    fmt::{self, Display, Formatter},
    sync::{Arc, Mutex},
};

use crate::{
    apu::Apu,
    cpu::Cpu,
    dma::Dma,
    error::Error,
    info::Info,
    mmu::Mmu,
    pad::{Pad, PadKey},
    ppu::{Ppu, PpuMode, DISPLAY_HEIGHT, DISPLAY_WIDTH, FRAME_BUFFER_SIZE},
    rom::{Cartridge, RamSize},
    serial::{Serial, SerialDevice},
    state::{StateComponent, StateFormat},
    timer::Timer,
    util::{read_file, SharedThread},
};

/// Global emulator configuration shared (behind a mutex) with every
/// bus component, allowing each of them to adjust its own behaviour
/// (e.g. the APU's internal sample clock) to the current settings
/// without requiring a reference back to the top level [`GameBoy`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GameBoyConfig {
    /// If the PPU is enabled, it will be clocked.
    ppu_enabled: bool,

    /// If the APU is enabled, it will be clocked.
    apu_enabled: bool,

    /// if the DMA is enabled, it will be clocked.
    dma_enabled: bool,

    /// If the timer is enabled, it will be clocked.
    timer_enabled: bool,

    /// If the serial is enabled, it will be clocked.
    serial_enabled: bool,

    /// The current frequency at which the Game Boy
    /// emulator is being handled. This is a "hint" that
    /// may help components to adjust their internal
    /// logic to match the current frequency. For example
    /// the APU will adjust its internal clock to match
    /// this hint.
    clock_freq: u32,
}

impl GameBoyConfig {
    pub fn ppu_enabled(&self) -> bool {
        self.ppu_enabled
    }

    pub fn set_ppu_enabled(&mut self, value: bool) {
        self.ppu_enabled = value;
    }

    pub fn apu_enabled(&self) -> bool {
        self.apu_enabled
    }

    pub fn set_apu_enabled(&mut self, value: bool) {
        self.apu_enabled = value;
    }

    pub fn dma_enabled(&self) -> bool {
        self.dma_enabled
    }

    pub fn set_dma_enabled(&mut self, value: bool) {
        self.dma_enabled = value;
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn set_timer_enabled(&mut self, value: bool) {
        self.timer_enabled = value;
    }

    pub fn serial_enabled(&self) -> bool {
        self.serial_enabled
    }

    pub fn set_serial_enabled(&mut self, value: bool) {
        self.serial_enabled = value;
    }

    pub fn clock_freq(&self) -> u32 {
        self.clock_freq
    }

    pub fn set_clock_freq(&mut self, value: u32) {
        self.clock_freq = value;
    }
}

impl Default for GameBoyConfig {
    fn default() -> Self {
        Self {
            ppu_enabled: true,
            apu_enabled: true,
            dma_enabled: true,
            timer_enabled: true,
            serial_enabled: true,
            clock_freq: GameBoy::CPU_FREQ,
        }
    }
}

/// Aggregation structure allowing the bundling of
/// all the components of a GameBoy into a single
/// element for easy access.
pub struct Components {
    pub ppu: Ppu,
    pub apu: Apu,
    pub dma: Dma,
    pub pad: Pad,
    pub timer: Timer,
    pub serial: Serial,
}

pub trait AudioProvider {
    fn audio_output(&self) -> u8;
    fn audio_buffer(&self) -> &VecDeque<u8>;
    fn clear_audio_buffer(&mut self);
}

/// Result of clocking the emulator up to some cycle limit, carrying
/// the frame buffer captured at the last V-Blank if a frame completed
/// during the call.
pub struct ClockFrame {
    pub cycles: u64,
    pub frames: u16,
    frame_buffer: Option<Vec<u8>>,
}

impl ClockFrame {
    pub fn frame_buffer_eager(&mut self) -> Option<Vec<u8>> {
        self.frame_buffer.take()
    }
}

/// Top level structure that abstracts the usage of the
/// Game Boy system, serving as the main entry-point API.
pub struct GameBoy {
    /// If the PPU is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    ppu_enabled: bool,

    /// If the APU is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    apu_enabled: bool,

    /// If the DMA is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    dma_enabled: bool,

    /// If the timer is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    timer_enabled: bool,

    /// If the serial is enabled, it will be clocked.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    serial_enabled: bool,

    /// The current frequency at which the Game Boy
    /// emulator is being handled.
    ///
    /// This is a clone of the configuration value
    /// kept for performance reasons.
    clock_freq: u32,

    /// Reference to the Game Boy CPU component to be
    /// used as the main element of the system, when
    /// clocked, the amount of ticks from it will be
    /// used as reference or the rest of the components.
    cpu: Cpu,

    /// The reference counted and mutable reference to
    /// Game Boy configuration structure that can be
    /// used by the GB components to access global
    /// configuration values on the current emulator.
    ///
    /// If performance is required (many value access)
    /// the values should be cloned and stored locally.
    gbc: SharedThread<GameBoyConfig>,
}

impl GameBoy {
    pub fn new() -> Self {
        let gbc = Arc::new(Mutex::new(GameBoyConfig::default()));

        let components = Components {
            ppu: Ppu::new(gbc.clone()),
            apu: Apu::default(),
            dma: Dma::default(),
            pad: Pad::default(),
            timer: Timer::default(),
            serial: Serial::default(),
        };
        let mmu = Mmu::new(components, gbc.clone());
        let cpu = Cpu::new(mmu, gbc.clone());

        Self {
            ppu_enabled: true,
            apu_enabled: true,
            dma_enabled: true,
            timer_enabled: true,
            serial_enabled: true,
            clock_freq: GameBoy::CPU_FREQ,
            cpu,
            gbc,
        }
    }

    pub fn verify_rom(data: &[u8]) -> bool {
        Cartridge::from_data(data).is_ok()
    }

    pub fn reset(&mut self) {
        self.ppu().reset();
        self.apu().reset();
        self.timer().reset();
        self.serial().reset();
        self.mmu().reset();
        self.cpu.reset();
    }

    pub fn reload(&mut self) {
        let rom = self.rom().clone();
        self.reset();
        self.boot();
        self.load_cartridge(rom).unwrap();
    }

    /// Advance the clock of the system by one tick, this will
    /// usually imply executing one CPU instruction and advancing
    /// all the other components of the system by the required
    /// amount of cycles.
    ///
    /// The amount of cycles executed by the CPU is returned.
    pub fn clock(&mut self) -> u16 {
        let cycles = self.cpu_clock() as u16;
        self.clock_devices(cycles);
        cycles
    }

    /// Risky function that will clock the CPU multiple times
    /// allowing an undefined number of cycles to be executed
    /// in the other Game Boy components.
    ///
    /// This can cause unwanted behaviour in components like
    /// the PPU where only one mode switch operation is expected
    /// per each clock call.
    ///
    /// At the end of this execution major synchronization issues
    /// may arise, so use with caution.
    pub fn clock_many(&mut self, count: usize) -> u16 {
        let mut cycles = 0u16;
        for _ in 0..count {
            cycles += self.cpu_clock() as u16;
        }
        self.clock_devices(cycles);
        cycles
    }

    /// Function equivalent to `clock()` but that allows pre-emptive
    /// breaking of the clock cycle loop if the PC (Program Counter)
    /// reaches the provided address, making sure that in such a situation
    /// the devices are not clocked.
    pub fn clock_step(&mut self, addr: u16) -> u16 {
        let cycles = self.cpu_clock() as u16;
        if self.cpu_i().pc() == addr {
            return cycles;
        }
        self.clock_devices(cycles);
        cycles
    }

    /// Equivalent to `clock()` but allows the execution of multiple
    /// clock operations in a single call.
    pub fn clocks(&mut self, count: usize) -> u64 {
        let mut cycles = 0_u64;
        for _ in 0..count {
            cycles += self.clock() as u64;
        }
        cycles
    }

    /// Clocks the emulator until the limit of cycles that has been
    /// provided and returns the amount of cycles that have been
    /// clocked.
    pub fn clocks_cycles(&mut self, limit: usize) -> u64 {
        let mut cycles = 0_u64;
        while cycles < limit as u64 {
            cycles += self.clock() as u64;
        }
        cycles
    }

    /// Clocks the emulator until the limit of cycles that has been
    /// provided and returns the amount of cycles that have been
    /// clocked together with the frame buffer of the PPU.
    ///
    /// Allows a caller to clock the emulator and at the same time
    /// retrieve the frame buffer of the PPU at the proper timing
    /// (on V-Blank).
    pub fn clocks_frame_buffer(&mut self, limit: usize) -> ClockFrame {
        let mut cycles = 0_u64;
        let mut frames = 0_u16;
        let mut frame_buffer: Option<Vec<u8>> = None;
        while cycles < limit as u64 {
            cycles += self.clock() as u64;
            if self.ppu().frame_complete() {
                self.ppu().clear_frame_complete();
                frame_buffer = Some(self.frame_buffer().to_vec());
                frames += 1;
            }
        }
        ClockFrame {
            cycles,
            frames,
            frame_buffer,
        }
    }

    /// Clocks the emulator until a full frame (one V-Blank) has been
    /// produced, returning the amount of cycles this took.
    pub fn next_frame(&mut self) -> u32 {
        let mut cycles = 0u32;
        loop {
            cycles += self.clock() as u32;
            if self.ppu().frame_complete() {
                self.ppu().clear_frame_complete();
                break;
            }
        }
        cycles
    }

    pub fn step_to(&mut self, addr: u16) -> u32 {
        let mut cycles = 0u32;
        while self.cpu_i().pc() != addr {
            cycles += self.clock_step(addr) as u32;
        }
        cycles
    }

    #[inline(always)]
    fn clock_devices(&mut self, cycles: u16) {
        if self.ppu_enabled {
            self.ppu_clock(cycles);
        }
        if self.apu_enabled {
            self.apu_clock(cycles);
        }
        if self.dma_enabled {
            self.dma_clock();
        }
        if self.timer_enabled {
            self.timer_clock(cycles);
        }
        if self.serial_enabled {
            self.serial_clock(cycles);
        }
    }

    pub fn key_press(&mut self, key: PadKey) {
        self.pad().key_press(key);
    }

    pub fn key_lift(&mut self, key: PadKey) {
        self.pad().key_lift(key);
    }

    pub fn cpu_clock(&mut self) -> u8 {
        self.cpu.clock()
    }

    pub fn ppu_clock(&mut self, cycles: u16) {
        self.ppu().clock(cycles)
    }

    pub fn apu_clock(&mut self, cycles: u16) {
        self.apu().clock(cycles)
    }

    pub fn dma_clock(&mut self) {
        self.mmu().clock_dma();
    }

    pub fn timer_clock(&mut self, cycles: u16) {
        self.timer().clock(cycles)
    }

    pub fn serial_clock(&mut self, cycles: u16) {
        self.serial().clock(cycles)
    }

    pub fn ppu_ly(&mut self) -> u8 {
        self.ppu().ly()
    }

    pub fn ppu_mode(&mut self) -> PpuMode {
        self.ppu().mode()
    }

    /// Direct boot method that immediately jumps the machine
    /// to the post boot state, this will effectively skip the
    /// boot sequence and jump to the cartridge execution.
    pub fn boot(&mut self) {
        self.cpu.boot();
    }

    pub fn vram_eager(&mut self) -> Vec<u8> {
        self.ppu().vram().to_vec()
    }

    pub fn hram_eager(&mut self) -> Vec<u8> {
        self.ppu().hram().to_vec()
    }

    pub fn frame_buffer_eager(&mut self) -> Vec<u8> {
        self.frame_buffer().to_vec()
    }

    pub fn audio_buffer_eager(&mut self, clear: bool) -> Vec<u8> {
        let buffer = Vec::from(self.audio_buffer().clone());
        if clear {
            self.clear_audio_buffer();
        }
        buffer
    }

    pub fn audio_output(&self) -> u8 {
        self.apu_i().output()
    }

    pub fn audio_all_output(&self) -> Vec<u8> {
        vec![
            self.audio_output(),
            self.audio_ch1_output(),
            self.audio_ch2_output(),
            self.audio_ch3_output(),
            self.audio_ch4_output(),
        ]
    }

    pub fn audio_ch1_output(&self) -> u8 {
        self.apu_i().ch1_output()
    }

    pub fn audio_ch2_output(&self) -> u8 {
        self.apu_i().ch2_output()
    }

    pub fn audio_ch3_output(&self) -> u8 {
        self.apu_i().ch3_output()
    }

    pub fn audio_ch4_output(&self) -> u8 {
        self.apu_i().ch4_output()
    }

    pub fn audio_ch1_enabled(&self) -> bool {
        self.apu_i().ch1_out_enabled()
    }

    pub fn set_audio_ch1_enabled(&mut self, enabled: bool) {
        self.apu().set_ch1_out_enabled(enabled)
    }

    pub fn audio_ch2_enabled(&self) -> bool {
        self.apu_i().ch2_out_enabled()
    }

    pub fn set_audio_ch2_enabled(&mut self, enabled: bool) {
        self.apu().set_ch2_out_enabled(enabled)
    }

    pub fn audio_ch3_enabled(&self) -> bool {
        self.apu_i().ch3_out_enabled()
    }

    pub fn set_audio_ch3_enabled(&mut self, enabled: bool) {
        self.apu().set_ch3_out_enabled(enabled)
    }

    pub fn audio_ch4_enabled(&self) -> bool {
        self.apu_i().ch4_out_enabled()
    }

    pub fn set_audio_ch4_enabled(&mut self, enabled: bool) {
        self.apu().set_ch4_out_enabled(enabled)
    }

    pub fn audio_sampling_rate(&self) -> u16 {
        self.apu_i().sampling_rate()
    }

    pub fn audio_channels(&self) -> u8 {
        self.apu_i().channels()
    }

    pub fn cartridge_eager(&mut self) -> Cartridge {
        self.mmu().rom().clone()
    }

    pub fn ram_data_eager(&mut self) -> Vec<u8> {
        self.mmu().rom().ram_data_eager()
    }

    pub fn set_ram_data(&mut self, ram_data: Vec<u8>) {
        self.mmu().rom().set_ram_data(&ram_data)
    }

    pub fn ppu_enabled(&self) -> bool {
        self.ppu_enabled
    }

    pub fn set_ppu_enabled(&mut self, value: bool) {
        self.ppu_enabled = value;
        (*self.gbc).lock().unwrap().set_ppu_enabled(value);
    }

    pub fn apu_enabled(&self) -> bool {
        self.apu_enabled
    }

    pub fn set_apu_enabled(&mut self, value: bool) {
        self.apu_enabled = value;
        (*self.gbc).lock().unwrap().set_apu_enabled(value);
    }

    pub fn dma_enabled(&self) -> bool {
        self.dma_enabled
    }

    pub fn set_dma_enabled(&mut self, value: bool) {
        self.dma_enabled = value;
        (*self.gbc).lock().unwrap().set_dma_enabled(value);
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn set_timer_enabled(&mut self, value: bool) {
        self.timer_enabled = value;
        (*self.gbc).lock().unwrap().set_timer_enabled(value);
    }

    pub fn serial_enabled(&self) -> bool {
        self.serial_enabled
    }

    pub fn set_serial_enabled(&mut self, value: bool) {
        self.serial_enabled = value;
        (*self.gbc).lock().unwrap().set_serial_enabled(value);
    }

    pub fn set_all_enabled(&mut self, value: bool) {
        self.set_ppu_enabled(value);
        self.set_apu_enabled(value);
        self.set_dma_enabled(value);
        self.set_timer_enabled(value);
        self.set_serial_enabled(value);
    }

    pub fn clock_freq(&self) -> u32 {
        self.clock_freq
    }

    pub fn set_clock_freq(&mut self, value: u32) {
        self.clock_freq = value;
        (*self.gbc).lock().unwrap().set_clock_freq(value);
        self.apu().set_clock_freq(value);
    }

    pub fn clock_freq_s(&self) -> String {
        format!("{:.02} Mhz", self.clock_freq() as f32 / 1000.0 / 1000.0)
    }

    pub fn display_width(&self) -> usize {
        DISPLAY_WIDTH
    }

    pub fn display_height(&self) -> usize {
        DISPLAY_HEIGHT
    }

    pub fn ram_size(&self) -> RamSize {
        RamSize::Size8K
    }

    pub fn description(&self, column_length: usize) -> String {
        let version_l = format!("{:width$}", "Version", width = column_length);
        let system_l = format!("{:width$}", "System", width = column_length);
        let clock_l = format!("{:width$}", "Clock", width = column_length);
        let ram_size_l = format!("{:width$}", "RAM Size", width = column_length);
        let serial_l = format!("{:width$}", "Serial", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}\n{}  {}\n{}  {}",
            version_l,
            Info::version(),
            system_l,
            Info::system(),
            clock_l,
            self.clock_freq_s(),
            ram_size_l,
            self.ram_size(),
            serial_l,
            self.serial_i().device().description(),
        )
    }

    pub fn description_debug(&self) -> String {
        format!(
            "{}\nCPU:\n{}",
            self.description(12),
            self.cpu_i().description_default(),
        )
    }
}

/// Gameboy implementations that bundle the component accessors and
/// the other higher level operations not tied to the value struct above.
impl GameBoy {
    /// The logic frequency of the Game Boy
    /// CPU in hz.
    pub const CPU_FREQ: u32 = 4194304;

    /// The visual frequency (refresh rate)
    /// of the Game Boy, close to 60 hz.
    pub const VISUAL_FREQ: f32 = 59.7275;

    /// The cycles taken to run a complete frame
    /// loop in the Game Boy's PPU (in CPU cycles).
    pub const LCD_CYCLES: u32 = 70224;

    pub fn cpu(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn cpu_i(&self) -> &Cpu {
        &self.cpu
    }

    pub fn mmu(&mut self) -> &mut Mmu {
        self.cpu.mmu()
    }

    pub fn mmu_i(&self) -> &Mmu {
        self.cpu.mmu_i()
    }

    pub fn ppu(&mut self) -> &mut Ppu {
        self.cpu.ppu()
    }

    pub fn ppu_i(&self) -> &Ppu {
        self.cpu.ppu_i()
    }

    pub fn apu(&mut self) -> &mut Apu {
        self.cpu.apu()
    }

    pub fn apu_i(&self) -> &Apu {
        self.cpu.apu_i()
    }

    pub fn dma(&mut self) -> &mut Dma {
        self.cpu.dma()
    }

    pub fn dma_i(&self) -> &Dma {
        self.cpu.dma_i()
    }

    pub fn pad(&mut self) -> &mut Pad {
        self.cpu.pad()
    }

    pub fn pad_i(&self) -> &Pad {
        self.cpu.pad_i()
    }

    pub fn timer(&mut self) -> &mut Timer {
        self.cpu.timer()
    }

    pub fn timer_i(&self) -> &Timer {
        self.cpu.timer_i()
    }

    pub fn serial(&mut self) -> &mut Serial {
        self.cpu.serial()
    }

    pub fn serial_i(&self) -> &Serial {
        self.cpu.serial_i()
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        self.mmu().rom()
    }

    pub fn rom_i(&self) -> &Cartridge {
        self.mmu_i().rom_i()
    }

    pub fn frame_buffer(&mut self) -> &[u8; FRAME_BUFFER_SIZE] {
        self.ppu().frame_buffer()
    }

    pub fn audio_buffer(&mut self) -> &VecDeque<u8> {
        self.apu().audio_buffer()
    }

    pub fn cartridge(&mut self) -> &mut Cartridge {
        self.mmu().rom()
    }

    pub fn cartridge_i(&self) -> &Cartridge {
        self.mmu_i().rom_i()
    }

    pub fn load_cartridge(&mut self, rom: Cartridge) -> Result<&mut Cartridge, Error> {
        self.mmu().set_rom(rom);
        Ok(self.mmu().rom())
    }

    pub fn load_rom(
        &mut self,
        data: &[u8],
        ram_data: Option<&[u8]>,
    ) -> Result<&mut Cartridge, Error> {
        let mut rom = Cartridge::from_data(data)?;
        if let Some(ram_data) = ram_data {
            rom.set_ram_data(ram_data)
        }
        self.load_cartridge(rom)
    }

    pub fn load_rom_file(
        &mut self,
        path: &str,
        ram_path: Option<&str>,
    ) -> Result<&mut Cartridge, Error> {
        let data = read_file(path)?;
        match ram_path {
            Some(ram_path) => {
                let ram_data = read_file(ram_path)?;
                self.load_rom(&data, Some(&ram_data))
            }
            None => self.load_rom(&data, None),
        }
    }

    /// Builds and loads a blank 32 KB ROM-only cartridge with just enough of
    /// a header (type, size bytes and checksum) to pass validation, useful
    /// for tests and other situations where no real cartridge is at hand.
    pub fn load_rom_empty(&mut self) -> Result<&mut Cartridge, Error> {
        let mut data = vec![0u8; 32 * 1024];
        data[0x0147] = 0x00; // ROM only
        data[0x0148] = 0x00; // 32 KB, 2 banks
        data[0x0149] = 0x00; // no RAM
        let mut sum: u8 = 0;
        for byte in &data[0x0134..=0x014c] {
            sum = sum.wrapping_sub(*byte).wrapping_sub(1);
        }
        data[0x014d] = sum;
        self.load_rom(&data, None)
    }

    /// Captures the full emulator state as a single opaque buffer, by
    /// concatenating the length-prefixed [`StateComponent`] payload of
    /// every stateful component. The component order here must match
    /// the one [`GameBoy::load_state`] reads back in.
    pub fn save_state(&mut self, format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();
        write_component(&mut buffer, self.cpu(), format)?;
        write_component(&mut buffer, self.ppu(), format)?;
        write_component(&mut buffer, self.apu(), format)?;
        write_component(&mut buffer, self.mmu(), format)?;
        write_component(&mut buffer, self.cartridge(), format)?;
        write_component(&mut buffer, self.timer(), format)?;
        write_component(&mut buffer, self.pad(), format)?;
        write_component(&mut buffer, self.serial(), format)?;
        Ok(buffer)
    }

    /// Restores a buffer produced by [`GameBoy::save_state`], handing
    /// each component back exactly the slice it originally wrote.
    pub fn load_state(&mut self, data: &[u8], format: Option<StateFormat>) -> Result<(), Error> {
        let mut cursor = std::io::Cursor::new(data);
        read_component(&mut cursor, self.cpu(), format)?;
        read_component(&mut cursor, self.ppu(), format)?;
        read_component(&mut cursor, self.apu(), format)?;
        read_component(&mut cursor, self.mmu(), format)?;
        read_component(&mut cursor, self.cartridge(), format)?;
        read_component(&mut cursor, self.timer(), format)?;
        read_component(&mut cursor, self.pad(), format)?;
        read_component(&mut cursor, self.serial(), format)?;
        Ok(())
    }

    pub fn attach_serial(&mut self, device: Box<dyn SerialDevice>) {
        self.serial().set_device(device);
    }

    pub fn read_memory(&mut self, addr: u16) -> u8 {
        self.mmu().read(addr)
    }

    pub fn write_memory(&mut self, addr: u16, value: u8) {
        self.mmu().write(addr, value);
    }
}

impl AudioProvider for GameBoy {
    fn audio_output(&self) -> u8 {
        self.apu_i().output()
    }

    fn audio_buffer(&self) -> &VecDeque<u8> {
        self.apu_i().audio_buffer()
    }

    fn clear_audio_buffer(&mut self) {
        self.apu().clear_audio_buffer()
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GameBoy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}

fn write_component(
    buffer: &mut Vec<u8>,
    component: &dyn StateComponent,
    format: Option<StateFormat>,
) -> Result<(), Error> {
    let payload = component.state(format)?;
    crate::state::write_u32(buffer, payload.len() as u32);
    crate::state::write_bytes(buffer, &payload);
    Ok(())
}

fn read_component(
    cursor: &mut std::io::Cursor<&[u8]>,
    component: &mut dyn StateComponent,
    format: Option<StateFormat>,
) -> Result<(), Error> {
    let len = crate::state::read_u32(cursor)? as usize;
    let payload = crate::state::read_bytes(cursor, len)?;
    component.set_state(&payload, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_jumps_to_cartridge_entry_point() {
        let mut gb = GameBoy::new();
        gb.load_rom_empty().unwrap();
        gb.boot();
        assert_eq!(gb.cpu_i().pc(), 0x0100);
    }

    #[test]
    fn test_frame_cadence_matches_lcd_cycles() {
        let mut gb = GameBoy::new();
        gb.load_rom_empty().unwrap();
        gb.boot();
        let cycles = gb.next_frame();
        assert_eq!(cycles, GameBoy::LCD_CYCLES);
    }

    #[test]
    fn test_key_press_sets_pad_interrupt() {
        let mut gb = GameBoy::new();
        gb.load_rom_empty().unwrap();
        gb.boot();
        gb.pad().write(0xff00, 0x10); // select action buttons (bit4 high)
        gb.key_press(PadKey::Start);
        assert!(gb.pad_i().int_pad());
    }

    #[test]
    fn test_clocks_frame_buffer_reports_one_frame() {
        let mut gb = GameBoy::new();
        gb.load_rom_empty().unwrap();
        gb.boot();
        let frame = gb.clocks_frame_buffer(GameBoy::LCD_CYCLES as usize);
        assert_eq!(frame.frames, 1);
    }

    #[test]
    fn test_save_state_load_state_round_trip_is_a_no_op() {
        let mut gb = GameBoy::new();
        gb.load_rom_empty().unwrap();
        gb.boot();
        gb.write_memory(0xc000, 0x42);
        let pc_before = gb.cpu_i().pc();
        let snapshot = gb.save_state(None).unwrap();

        // drift the state away from the snapshot so restoring it is
        // actually exercised, not a no-op by coincidence
        gb.next_frame();
        gb.write_memory(0xc000, 0x99);
        assert_ne!(gb.cpu_i().pc(), pc_before);
        assert_ne!(gb.read_memory(0xc000), 0x42);

        gb.load_state(&snapshot, None).unwrap();
        assert_eq!(gb.cpu_i().pc(), pc_before);
        assert_eq!(gb.read_memory(0xc000), 0x42);
    }
}
