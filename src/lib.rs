//! An implementation of the CHIP 8 interpreter in Rust. The host drives it one
//! instruction at a time with [`Emulator::cycle`], feeds it key state, drives the 60 Hz
//! timers, and renders the framebuffer whenever a cycle reports it changed.

// # Interpreter
// * 4096 (0x1000) bytes of memory
// * hex font sprites live at 0x050 - 0x09F, programs are loaded at 0x200
// * 16 8-bit registers: V0 - VF
// * VF if used is the carry flag in addition operations, "no borrow" flag in subtraction, in draw
// operation the VF flag is set to denote pixel collision
// * the address register I is 16 bits wide
// * the stack is only used to store return addresses when subroutines are called, 16 deep

// # Timers
// * two timers running at 60 hertz
//  - delay timer is used for events, it can be set and read
//  - sound timer beeps when its value is nonzero

// # Input
// there is a 16 symbol hex keyboard with values 0 - F. There are 3 opcode that deal with handling input
//  - one skips an instruction if a specific key is pressed
//  - one skips an instruction if a specific key is NOT pressed
//  - waits for a key press and stores it in a register once it detects it

// # Graphics
// 64x32 pixels

use std::convert::TryFrom;
use std::fmt;
use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use slog::{debug, error, info, o, trace, warn, Logger};

pub mod config;
pub mod error;
pub mod graphics;
pub mod keyboard;
pub mod op;
pub mod timer;


pub use crate::config::{Config, Quirks, UnknownOpcodePolicy};
pub use crate::error::{Error, Result};
pub use crate::graphics::{Graphics, HEIGHT, WIDTH};
pub use crate::keyboard::{AsKeyboard, Key, Keyboard};
pub use crate::op::{DecodeError, Instruction, Op};

use crate::timer::Clock;

pub const MEMORY_SIZE: usize = 4096;
/// Every memory access is taken modulo the size of memory
const ADDRESS_MASK: usize = MEMORY_SIZE - 1;
pub const STARTING_MEMORY_BYTE: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - STARTING_MEMORY_BYTE;
pub const FONT_BASE: usize = 0x050;
pub const NUM_BYTES_IN_FONT_CHAR: u8 = 5;
pub const STACK_SIZE: usize = 16;
pub const NUM_REGISTERS: usize = 16;

#[rustfmt::skip]
const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The result of one fetch/decode/execute cycle
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Cycle {
    /// Address the instruction was fetched from
    pub pc: u16,
    /// The raw instruction word
    pub opcode: u16,
    /// `None` when an unknown opcode was skipped
    pub op: Option<Op>,
    pub display_changed: bool,
}

/// Counters for diagnosing a running program
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Serialize)]
pub struct Stats {
    pub cycles: u64,
    pub draws: u64,
    pub unknown_opcodes: u64,
    /// cycles spent parked on FX0A with no key down
    pub key_waits: u64,
}

pub struct Emulator {
    memory: [u8; MEMORY_SIZE],

    stack: [u16; STACK_SIZE], // return addresses of the subroutines we're in
    sp: usize,                // number of frames in use

    addr: u16, // the I register
    pc: u16,

    // 16 8-bit registers. VF is used as a flag by several of the opcodes (see @Op)
    v: [u8; NUM_REGISTERS],

    graphics: Graphics,
    keyboard: Keyboard,
    clock: Clock,

    config: Config,
    rng: StdRng,
    stats: Stats,
    logger: Logger,
}

impl Emulator {
    /// Create an emulator with the default `Config`. Passing `None` for the logger
    /// discards all log output
    pub fn new(logger: Option<Logger>) -> Self {
        Emulator::with_config(Config::default(), logger)
    }

    pub fn with_config(config: Config, logger: Option<Logger>) -> Self {
        let logger = logger.unwrap_or_else(|| Logger::root(slog::Discard, o!()));
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut memory = [0; MEMORY_SIZE];
        memory[FONT_BASE..FONT_BASE + FONT_SET.len()].copy_from_slice(&FONT_SET);

        debug!(logger, "created emulator"; "config" => ?config);

        Emulator {
            memory,
            stack: [0; STACK_SIZE],
            sp: 0,
            addr: 0,
            pc: STARTING_MEMORY_BYTE as u16,
            v: [0; NUM_REGISTERS],
            graphics: Graphics::new(),
            keyboard: Keyboard::new(),
            clock: Clock::new(Instant::now()),
            config,
            rng,
            stats: Stats::default(),
            logger,
        }
    }

    /// Create an emulator and load the ROM stored at `path`
    pub fn with_game_file<P: AsRef<Path>>(path: P, logger: Option<Logger>) -> Result<Self> {
        Emulator::with_game_file_and_config(path, Config::default(), logger)
    }

    pub fn with_game_file_and_config<P: AsRef<Path>>(
        path: P,
        config: Config,
        logger: Option<Logger>,
    ) -> Result<Self> {
        let rom = std::fs::read(path.as_ref())?;
        let mut emulator = Emulator::with_config(config, logger);
        emulator.load_rom(&rom)?;
        Ok(emulator)
    }

    /// Copy `rom` into memory starting at 0x200. Memory is left untouched if it doesn't fit
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_ROM_SIZE {
            error!(self.logger, "ROM too large"; "size" => rom.len(), "max" => MAX_ROM_SIZE);
            return Err(Error::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }

        let start = STARTING_MEMORY_BYTE;
        self.memory[start..start + rom.len()].copy_from_slice(rom);
        info!(self.logger, "loaded ROM"; "size" => rom.len());

        Ok(())
    }

    /// Read the instruction at the program counter, decode it, and execute it.
    ///
    /// On a fatal fault (stack overflow or underflow, or an unknown opcode under
    /// `UnknownOpcodePolicy::Halt`) the error is returned and the program counter is left
    /// on the faulting instruction.
    pub fn cycle(&mut self) -> Result<Cycle> {
        let pc = self.pc;
        let instruction =
            Instruction::from_bytes(self.read_byte(pc), self.read_byte(pc.wrapping_add(1)));
        let opcode = instruction.word;

        let op = match Op::try_from(instruction) {
            Ok(op) => op,
            Err(DecodeError(opcode)) => return self.unknown_opcode(opcode, pc),
        };

        trace!(self.logger, "execute";
            "pc" => format!("{:#06X}", pc), "opcode" => format!("{:#06X}", opcode), "op" => %op);

        if let Err(e) = self.execute(op) {
            error!(self.logger, "fault"; "error" => %e);
            return Err(e);
        }

        self.stats.cycles += 1;
        let display_changed = op.is_display_op();
        if display_changed {
            self.stats.draws += 1;
        }

        Ok(Cycle {
            pc,
            opcode,
            op: Some(op),
            display_changed,
        })
    }

    fn unknown_opcode(&mut self, opcode: u16, pc: u16) -> Result<Cycle> {
        match self.config.unknown_opcode {
            UnknownOpcodePolicy::Halt => {
                error!(self.logger, "unknown opcode";
                    "opcode" => format!("{:#06X}", opcode), "pc" => format!("{:#06X}", pc));
                Err(Error::UnknownOpcode { opcode, pc })
            }
            UnknownOpcodePolicy::Skip => {
                warn!(self.logger, "skipping unknown opcode";
                    "opcode" => format!("{:#06X}", opcode), "pc" => format!("{:#06X}", pc));
                self.pc = pc.wrapping_add(2);
                self.stats.cycles += 1;
                self.stats.unknown_opcodes += 1;
                Ok(Cycle {
                    pc,
                    opcode,
                    op: None,
                    display_changed: false,
                })
            }
        }
    }

    /// Execute a single decoded op against the current state and move the program
    /// counter to the next instruction. Operands must come from the decoder.
    pub(crate) fn execute(&mut self, op: Op) -> Result<()> {
        let mut next_pc = self.pc.wrapping_add(2);

        match op {
            Op::CallRca(_) => {}
            Op::DispClear => self.graphics.clear(),
            Op::Return => {
                if self.sp == 0 {
                    return Err(Error::StackUnderflow { pc: self.pc });
                }
                self.sp -= 1;
                next_pc = self.stack[self.sp];
            }
            Op::Goto(nnn) => next_pc = nnn,
            Op::GotoSubRtn(nnn) => {
                if self.sp == STACK_SIZE {
                    return Err(Error::StackOverflow { pc: self.pc });
                }
                self.stack[self.sp] = next_pc;
                self.sp += 1;
                next_pc = nnn;
            }
            Op::CondVxEq(x, kk) => {
                if self.v[x as usize] == kk {
                    next_pc = next_pc.wrapping_add(2);
                }
            }
            Op::CondVxNe(x, kk) => {
                if self.v[x as usize] != kk {
                    next_pc = next_pc.wrapping_add(2);
                }
            }
            Op::CondVxVyEq(x, y) => {
                if self.v[x as usize] == self.v[y as usize] {
                    next_pc = next_pc.wrapping_add(2);
                }
            }
            Op::ConstSetVx(x, kk) => self.v[x as usize] = kk,
            Op::ConstAddVx(x, kk) => {
                self.v[x as usize] = self.v[x as usize].wrapping_add(kk);
            }
            Op::AssignVyToVx(x, y) => self.v[x as usize] = self.v[y as usize],
            Op::BitOpOr(x, y) => {
                self.v[x as usize] |= self.v[y as usize];
                self.logic_quirk();
            }
            Op::BitOpAnd(x, y) => {
                self.v[x as usize] &= self.v[y as usize];
                self.logic_quirk();
            }
            Op::BitOpXor(x, y) => {
                self.v[x as usize] ^= self.v[y as usize];
                self.logic_quirk();
            }
            Op::MathVxAddVy(x, y) => {
                let (sum, carry) = self.v[x as usize].overflowing_add(self.v[y as usize]);
                self.set_with_flag(x, sum, carry);
            }
            Op::MathVxMinusVy(x, y) => {
                let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
                self.set_with_flag(x, vx.wrapping_sub(vy), vx >= vy);
            }
            Op::BitOpRtShift(x) => {
                let vx = self.v[x as usize];
                self.set_with_flag(x, vx >> 1, vx & 0x1 == 1);
            }
            Op::MathVyMinusVx(x, y) => {
                let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
                self.set_with_flag(x, vy.wrapping_sub(vx), vy >= vx);
            }
            Op::BitOpLftShift(x) => {
                let vx = self.v[x as usize];
                self.set_with_flag(x, vx << 1, vx & 0x80 != 0);
            }
            Op::CondVxVyNe(x, y) => {
                if self.v[x as usize] != self.v[y as usize] {
                    next_pc = next_pc.wrapping_add(2);
                }
            }
            Op::MemSetI(nnn) => self.addr = nnn,
            Op::GotoPlusV0(nnn) => next_pc = nnn.wrapping_add(u16::from(self.v[0])),
            Op::Rand(x, kk) => self.v[x as usize] = self.rng.gen::<u8>() & kk,
            Op::DispDraw(x, y, n) => {
                let mut sprite = [0u8; 15];
                for (row, byte) in sprite.iter_mut().enumerate().take(n as usize) {
                    *byte = self.read_byte(self.addr.wrapping_add(row as u16));
                }

                let collision = self.graphics.draw_sprite(
                    self.v[x as usize],
                    self.v[y as usize],
                    &sprite[..n as usize],
                );
                self.v[0xF] = collision as u8;
            }
            Op::KeyOpEqVx(x) => {
                if self.keyboard.get_key_state(self.v[x as usize] as usize) {
                    next_pc = next_pc.wrapping_add(2);
                }
            }
            Op::KeyOpNeVx(x) => {
                if !self.keyboard.get_key_state(self.v[x as usize] as usize) {
                    next_pc = next_pc.wrapping_add(2);
                }
            }
            Op::DelayGet(x) => self.v[x as usize] = self.clock.delay.get(),
            Op::KeyOpGet(x) => match self.keyboard.first_pressed() {
                Some(key) => self.v[x as usize] = key as u8,
                None => {
                    // park on this instruction until a key goes down
                    self.stats.key_waits += 1;
                    next_pc = self.pc;
                }
            },
            Op::DelaySet(x) => self.clock.delay.set(self.v[x as usize]),
            Op::SoundSet(x) => self.clock.sound.set(self.v[x as usize]),
            Op::MemIPlusEqVx(x) => {
                self.addr = self.addr.wrapping_add(u16::from(self.v[x as usize]));
            }
            Op::MemISetSprite(x) => {
                let digit = u16::from(self.v[x as usize] & 0xF);
                self.addr = FONT_BASE as u16 + digit * u16::from(NUM_BYTES_IN_FONT_CHAR);
            }
            Op::Bcd(x) => {
                let vx = self.v[x as usize];
                self.write_byte(self.addr, vx / 100);
                self.write_byte(self.addr.wrapping_add(1), (vx / 10) % 10);
                self.write_byte(self.addr.wrapping_add(2), vx % 10);
            }
            Op::RegDump(x) => {
                for idx in 0..=x {
                    self.write_byte(self.addr.wrapping_add(u16::from(idx)), self.v[idx as usize]);
                }
                self.addr = self.addr.wrapping_add(u16::from(x) + 1);
            }
            Op::RegLoad(x) => {
                for idx in 0..=x {
                    self.v[idx as usize] = self.read_byte(self.addr.wrapping_add(u16::from(idx)));
                }
                self.addr = self.addr.wrapping_add(u16::from(x) + 1);
            }
        }

        self.pc = next_pc;
        Ok(())
    }

    /// Write an arithmetic result to Vx, then the flag to VF. The flag wins when x is 0xF
    fn set_with_flag(&mut self, x: u8, value: u8, flag: bool) {
        self.v[x as usize] = value;
        self.v[0xF] = flag as u8;
    }

    fn logic_quirk(&mut self) {
        if self.config.quirks.logic_resets_vf {
            self.v[0xF] = 0;
        }
    }

    fn read_byte(&self, addr: u16) -> u8 {
        self.memory[addr as usize & ADDRESS_MASK]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.memory[addr as usize & ADDRESS_MASK] = value;
    }

    /// Apply every 60 Hz timer tick that elapsed since the last call. Returns the number
    /// of ticks applied
    pub fn update_timers(&mut self) -> u32 {
        self.clock.update(Instant::now())
    }

    /// Decrement the delay and sound timers by a single tick
    pub fn tick_timers(&mut self) {
        self.clock.tick();
    }

    /// Ask the host keyboard which keys are down and update the keypad to match
    pub fn handle_key_input<K: AsKeyboard + ?Sized>(&mut self, keyboard: &K) {
        self.keyboard.update_keyboard(&keyboard.keys_down());
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.keyboard.handle_key_down(key);
        } else {
            self.keyboard.handle_key_up(key);
        }
    }

    /// The framebuffer as one `u32` color per pixel, row-major
    pub fn get_pixels(&self) -> Vec<u32> {
        self.graphics.to_rgb()
    }

    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    /// Whether the framebuffer changed since the last call
    pub fn take_display_changed(&mut self) -> bool {
        self.graphics.take_changed()
    }

    pub fn is_beeping(&self) -> bool {
        self.clock.sound.get() != 0
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// The I register
    pub fn index(&self) -> u16 {
        self.addr
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn stack_depth(&self) -> usize {
        self.sp
    }

    pub fn delay_timer(&self) -> u8 {
        self.clock.delay.get()
    }

    pub fn sound_timer(&self) -> u8 {
        self.clock.sound.get()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl fmt::Debug for Emulator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut dbg = f.debug_struct("Emulator");
        for (i, value) in self.v.iter().enumerate() {
            dbg.field(&format!("V{:X}", i), &format_args!("{:02x}", value));
        }
        dbg.field("pc", &format_args!("{:04x}", self.pc))
            .field("i", &format_args!("{:04x}", self.addr))
            .field("dt", &format_args!("{:02x}", self.clock.delay.get()))
            .field("st", &format_args!("{:02x}", self.clock.sound.get()))
            .field("stack", &&self.stack[..self.sp])
            .finish()
    }
}
