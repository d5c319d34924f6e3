use std::convert::TryFrom;
use std::fmt;

use serde::Serialize;

/// The fields of a raw 16-bit instruction word. Every opcode family reads its operands
/// from here, so extraction happens in exactly one place.
///
/// ```text
///   op    x     y     n
/// [1111][2222][3333][4444]
///             [---kk----]
///       [------nnn------]
/// ```
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Instruction {
    pub word: u16,
    pub op: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
    pub kk: u8,
    pub nnn: u16,
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        let mask = 0xF;

        Instruction {
            word,
            op: ((word >> 12) & mask) as u8,
            x: ((word >> 8) & mask) as u8,
            y: ((word >> 4) & mask) as u8,
            n: (word & mask) as u8,
            kk: (word & 0xFF) as u8,
            nnn: word & 0x0FFF,
        }
    }
}

impl Instruction {
    /// Assemble the big-endian instruction word stored at `hi`, `lo`
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Instruction::from(u16::from(hi) << 8 | u16::from(lo))
    }
}

/// Returned when an instruction word matches no known opcode
#[derive(Debug, PartialEq, Eq, Copy, Clone, thiserror::Error)]
#[error("unknown opcode {0:#06X}")]
pub struct DecodeError(pub u16);

/// 35 CHIP 8 op codes. When decoded from an instruction word, register operands are
/// between 0x0 and 0xF, sprite heights at most 15, and addresses fit in 12 bits.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
pub enum Op {
    // 0NNN 	Call 		Calls RCA 1802 program at address NNN. Treated as a no-op.
    CallRca(u16),
    // 00E0 	Display 	disp_clear() 	Clears the screen.
    DispClear,
    // 00EE 	Flow 	return; 	Returns from a subroutine.
    Return,

    // 1NNN 	Flow 	goto NNN;
    Goto(u16),
    // 2NNN 	Flow 	*(0xNNN)()
    GotoSubRtn(u16),

    // 3XNN 	Cond 	if(Vx==NN)
    CondVxEq(u8, u8),
    // 4XNN 	Cond 	if(Vx!=NN)
    CondVxNe(u8, u8),
    // 5XY0 	Cond 	if(Vx==Vy)
    CondVxVyEq(u8, u8),

    // 6XNN 	Const 	Vx = NN
    ConstSetVx(u8, u8),
    // 7XNN 	Const 	Vx += NN, carry flag untouched
    ConstAddVx(u8, u8),

    // 8XY_
    AssignVyToVx(u8, u8),
    BitOpOr(u8, u8),
    BitOpAnd(u8, u8),
    BitOpXor(u8, u8),
    MathVxAddVy(u8, u8),
    MathVxMinusVy(u8, u8),
    BitOpRtShift(u8),
    MathVyMinusVx(u8, u8),
    BitOpLftShift(u8),

    // 9XY0 	Cond 	if(Vx!=Vy)
    CondVxVyNe(u8, u8),

    // ANNN 	MEM 	I = NNN
    MemSetI(u16),
    // BNNN 	Flow 	PC = V0 + NNN
    GotoPlusV0(u16),
    // CXNN 	Rand 	Vx = rand() & NN
    Rand(u8, u8),
    // DXYN 	Disp 	draw(Vx, Vy, N)
    DispDraw(u8, u8, u8),

    // EX9E, EXA1
    KeyOpEqVx(u8),
    KeyOpNeVx(u8),

    // FX__
    DelayGet(u8),
    KeyOpGet(u8),
    DelaySet(u8),
    SoundSet(u8),
    MemIPlusEqVx(u8),
    MemISetSprite(u8),
    Bcd(u8),
    RegDump(u8),
    RegLoad(u8),
}

impl TryFrom<Instruction> for Op {
    type Error = DecodeError;

    fn try_from(i: Instruction) -> Result<Self, Self::Error> {
        let (x, y, n, kk, nnn) = (i.x, i.y, i.n, i.kk, i.nnn);

        let op = match i.op {
            0x0 => match nnn {
                0x0E0 => Op::DispClear,
                0x0EE => Op::Return,
                _ => Op::CallRca(nnn),
            },
            0x1 => Op::Goto(nnn),
            0x2 => Op::GotoSubRtn(nnn),
            0x3 => Op::CondVxEq(x, kk),
            0x4 => Op::CondVxNe(x, kk),
            0x5 if n == 0 => Op::CondVxVyEq(x, y),
            0x6 => Op::ConstSetVx(x, kk),
            0x7 => Op::ConstAddVx(x, kk),
            0x8 => match n {
                0x0 => Op::AssignVyToVx(x, y),
                0x1 => Op::BitOpOr(x, y),
                0x2 => Op::BitOpAnd(x, y),
                0x3 => Op::BitOpXor(x, y),
                0x4 => Op::MathVxAddVy(x, y),
                0x5 => Op::MathVxMinusVy(x, y),
                0x6 => Op::BitOpRtShift(x),
                0x7 => Op::MathVyMinusVx(x, y),
                0xE => Op::BitOpLftShift(x),
                _ => return Err(DecodeError(i.word)),
            },
            0x9 if n == 0 => Op::CondVxVyNe(x, y),
            0xA => Op::MemSetI(nnn),
            0xB => Op::GotoPlusV0(nnn),
            0xC => Op::Rand(x, kk),
            0xD => Op::DispDraw(x, y, n),
            0xE => match kk {
                0x9E => Op::KeyOpEqVx(x),
                0xA1 => Op::KeyOpNeVx(x),
                _ => return Err(DecodeError(i.word)),
            },
            0xF => match kk {
                0x07 => Op::DelayGet(x),
                0x0A => Op::KeyOpGet(x),
                0x15 => Op::DelaySet(x),
                0x18 => Op::SoundSet(x),
                0x1E => Op::MemIPlusEqVx(x),
                0x29 => Op::MemISetSprite(x),
                0x33 => Op::Bcd(x),
                0x55 => Op::RegDump(x),
                0x65 => Op::RegLoad(x),
                _ => return Err(DecodeError(i.word)),
            },
            _ => return Err(DecodeError(i.word)),
        };

        Ok(op)
    }
}

impl TryFrom<u16> for Op {
    type Error = DecodeError;

    fn try_from(word: u16) -> Result<Self, Self::Error> {
        Op::try_from(Instruction::from(word))
    }
}

impl Op {
    /// Returns true if executing this op writes to the display
    pub fn is_display_op(&self) -> bool {
        match self {
            Op::DispClear | Op::DispDraw(..) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Op::CallRca(nnn) => write!(f, "SYS {:#05X}", nnn),
            Op::DispClear => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::Goto(nnn) => write!(f, "JP {:#05X}", nnn),
            Op::GotoSubRtn(nnn) => write!(f, "CALL {:#05X}", nnn),
            Op::CondVxEq(x, kk) => write!(f, "SE V{:X}, {:#04X}", x, kk),
            Op::CondVxNe(x, kk) => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            Op::CondVxVyEq(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            Op::ConstSetVx(x, kk) => write!(f, "LD V{:X}, {:#04X}", x, kk),
            Op::ConstAddVx(x, kk) => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            Op::AssignVyToVx(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Op::BitOpOr(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            Op::BitOpAnd(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Op::BitOpXor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            Op::MathVxAddVy(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Op::MathVxMinusVy(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Op::BitOpRtShift(x) => write!(f, "SHR V{:X}", x),
            Op::MathVyMinusVx(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Op::BitOpLftShift(x) => write!(f, "SHL V{:X}", x),
            Op::CondVxVyNe(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            Op::MemSetI(nnn) => write!(f, "LD I, {:#05X}", nnn),
            Op::GotoPlusV0(nnn) => write!(f, "JP V0, {:#05X}", nnn),
            Op::Rand(x, kk) => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Op::DispDraw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Op::KeyOpEqVx(x) => write!(f, "SKP V{:X}", x),
            Op::KeyOpNeVx(x) => write!(f, "SKNP V{:X}", x),
            Op::DelayGet(x) => write!(f, "LD V{:X}, DT", x),
            Op::KeyOpGet(x) => write!(f, "LD V{:X}, K", x),
            Op::DelaySet(x) => write!(f, "LD DT, V{:X}", x),
            Op::SoundSet(x) => write!(f, "LD ST, V{:X}", x),
            Op::MemIPlusEqVx(x) => write!(f, "ADD I, V{:X}", x),
            Op::MemISetSprite(x) => write!(f, "LD F, V{:X}", x),
            Op::Bcd(x) => write!(f, "LD B, V{:X}", x),
            Op::RegDump(x) => write!(f, "LD [I], V{:X}", x),
            Op::RegLoad(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(word: u16) -> Op {
        Op::try_from(word).unwrap()
    }

    #[test]
    fn extract_fields() {
        let i = Instruction::from(0xD12F);

        assert_eq!(i.op, 0xD);
        assert_eq!(i.x, 0x1);
        assert_eq!(i.y, 0x2);
        assert_eq!(i.n, 0xF);
        assert_eq!(i.kk, 0x2F);
        assert_eq!(i.nnn, 0x12F);
        assert_eq!(i, Instruction::from_bytes(0xD1, 0x2F));
    }

    #[test]
    fn convert_opcodes() {
        assert_eq!(decode(0x0FFF), Op::CallRca(0xFFF));
        assert_eq!(decode(0x00E0), Op::DispClear);
        assert_eq!(decode(0x00EE), Op::Return);
        assert_eq!(decode(0x1000), Op::Goto(0x000));
        assert_eq!(decode(0x2AAA), Op::GotoSubRtn(0xAAA));
        assert_eq!(decode(0x3FAA), Op::CondVxEq(0xF, 0xAA));
        assert_eq!(decode(0x4FAA), Op::CondVxNe(0xF, 0xAA));
        assert_eq!(decode(0x5FA0), Op::CondVxVyEq(0xF, 0xA));
        assert_eq!(decode(0x6FAB), Op::ConstSetVx(0xF, 0xAB));
        assert_eq!(decode(0x7FAB), Op::ConstAddVx(0xF, 0xAB));
        assert_eq!(decode(0x8FA0), Op::AssignVyToVx(0xF, 0xA));
        assert_eq!(decode(0x8FA1), Op::BitOpOr(0xF, 0xA));
        assert_eq!(decode(0x8FA2), Op::BitOpAnd(0xF, 0xA));
        assert_eq!(decode(0x8FA3), Op::BitOpXor(0xF, 0xA));
        assert_eq!(decode(0x8FA4), Op::MathVxAddVy(0xF, 0xA));
        assert_eq!(decode(0x8FA5), Op::MathVxMinusVy(0xF, 0xA));
        assert_eq!(decode(0x8FA6), Op::BitOpRtShift(0xF));
        assert_eq!(decode(0x8FA7), Op::MathVyMinusVx(0xF, 0xA));
        assert_eq!(decode(0x8FAE), Op::BitOpLftShift(0xF));
        assert_eq!(decode(0x9FA0), Op::CondVxVyNe(0xF, 0xA));
        assert_eq!(decode(0xAFAB), Op::MemSetI(0xFAB));
        assert_eq!(decode(0xBFAB), Op::GotoPlusV0(0xFAB));
        assert_eq!(decode(0xCFAB), Op::Rand(0xF, 0xAB));
        assert_eq!(decode(0xDFAB), Op::DispDraw(0xF, 0xA, 0xB));
        assert_eq!(decode(0xEF9E), Op::KeyOpEqVx(0xF));
        assert_eq!(decode(0xEFA1), Op::KeyOpNeVx(0xF));
        assert_eq!(decode(0xF907), Op::DelayGet(0x9));
        assert_eq!(decode(0xF90A), Op::KeyOpGet(0x9));
        assert_eq!(decode(0xF915), Op::DelaySet(0x9));
        assert_eq!(decode(0xF918), Op::SoundSet(0x9));
        assert_eq!(decode(0xF91E), Op::MemIPlusEqVx(0x9));
        assert_eq!(decode(0xF929), Op::MemISetSprite(0x9));
        assert_eq!(decode(0xF933), Op::Bcd(0x9));
        assert_eq!(decode(0xF955), Op::RegDump(0x9));
        assert_eq!(decode(0xF965), Op::RegLoad(0x9));
    }

    #[test]
    fn zero_family_only_matches_exact_words() {
        // 0x00E1 and 0x01E0 are machine code calls, not CLS
        assert_eq!(decode(0x00E1), Op::CallRca(0x0E1));
        assert_eq!(decode(0x01E0), Op::CallRca(0x1E0));
        assert_eq!(decode(0x0000), Op::CallRca(0x000));
    }

    #[test]
    fn unknown_opcodes() {
        for word in &[0x8DEF, 0x9DEF, 0x5121, 0xED9F, 0xFDEF, 0xF00B] {
            assert_eq!(Op::try_from(*word), Err(DecodeError(*word)));
        }
    }

    #[test]
    fn display_ops() {
        assert!(decode(0x00E0).is_display_op());
        assert!(decode(0xD123).is_display_op());
        assert!(!decode(0x00EE).is_display_op());
        assert!(!decode(0x6123).is_display_op());
    }

    #[test]
    fn mnemonics() {
        assert_eq!(decode(0xD125).to_string(), "DRW V1, V2, 5");
        assert_eq!(decode(0xF355).to_string(), "LD [I], V3");
        assert_eq!(decode(0x2ABC).to_string(), "CALL 0xABC");
    }
}
