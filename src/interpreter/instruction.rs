use std::fmt::{Display, Formatter};

fn x_register_index(opcode: u16) -> usize {
    ((opcode & 0x0F00) >> 8) as usize
}

fn y_register_index(opcode: u16) -> usize {
    ((opcode & 0x00F0) >> 4) as usize
}

fn address_nnn(opcode: u16) -> u16 {
    opcode & 0x0FFF
}

fn byte_kk(opcode: u16) -> u8 {
    (opcode & 0x00FF) as u8
}

fn nibble_n(opcode: u16) -> u8 {
    (opcode & 0x000F) as u8
}

/// Register-to-register ALU operations of the `8xyN` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Load,
    Or,
    And,
    Xor,
    Add,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
}

impl AluOp {
    fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(Self::Load),
            0x1 => Some(Self::Or),
            0x2 => Some(Self::And),
            0x3 => Some(Self::Xor),
            0x4 => Some(Self::Add),
            0x5 => Some(Self::Sub),
            0x6 => Some(Self::ShiftRight),
            0x7 => Some(Self::SubReverse),
            0xE => Some(Self::ShiftLeft),
            _ => None,
        }
    }

    fn nibble(self) -> u16 {
        match self {
            Self::Load => 0x0,
            Self::Or => 0x1,
            Self::And => 0x2,
            Self::Xor => 0x3,
            Self::Add => 0x4,
            Self::Sub => 0x5,
            Self::ShiftRight => 0x6,
            Self::SubReverse => 0x7,
            Self::ShiftLeft => 0xE,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Self::Load => "LD",
            Self::Or => "OR",
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::ShiftRight => "SHR",
            Self::SubReverse => "SUBN",
            Self::ShiftLeft => "SHL",
        }
    }
}

/// A decoded CHIP-8 instruction with its operands already extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,
    Return,
    Jump { nnn: u16 },
    Call { nnn: u16 },
    SkipIfEqualImmediate { x: usize, kk: u8 },
    SkipIfNotEqualImmediate { x: usize, kk: u8 },
    SkipIfEqualRegister { x: usize, y: usize },
    LoadImmediate { x: usize, kk: u8 },
    AddImmediate { x: usize, kk: u8 },
    Alu { op: AluOp, x: usize, y: usize },
    SkipIfNotEqualRegister { x: usize, y: usize },
    LoadIndex { nnn: u16 },
    JumpOffset { nnn: u16 },
    Random { x: usize, kk: u8 },
    Draw { x: usize, y: usize, n: u8 },
    SkipIfKeyPressed { x: usize },
    SkipIfKeyNotPressed { x: usize },
    LoadDelayTimer { x: usize },
    WaitForKey { x: usize },
    SetDelayTimer { x: usize },
    SetSoundTimer { x: usize },
    AddIndex { x: usize },
    LoadDigitSprite { x: usize },
    StoreBcd { x: usize },
    StoreRegisters { x: usize },
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Returns `None` for any word outside the instruction set.
    pub fn decode(opcode: u16) -> Option<Self> {
        let x = x_register_index(opcode);
        let y = y_register_index(opcode);
        let nnn = address_nnn(opcode);
        let kk = byte_kk(opcode);
        let n = nibble_n(opcode);

        let instruction = match opcode & 0xF000 {
            0x0000 => match opcode {
                0x00E0 => Self::ClearScreen,
                0x00EE => Self::Return,
                _ => return None,
            },
            0x1000 => Self::Jump { nnn },
            0x2000 => Self::Call { nnn },
            0x3000 => Self::SkipIfEqualImmediate { x, kk },
            0x4000 => Self::SkipIfNotEqualImmediate { x, kk },
            0x5000 if n == 0 => Self::SkipIfEqualRegister { x, y },
            0x6000 => Self::LoadImmediate { x, kk },
            0x7000 => Self::AddImmediate { x, kk },
            0x8000 => Self::Alu {
                op: AluOp::from_nibble(n)?,
                x,
                y,
            },
            0x9000 if n == 0 => Self::SkipIfNotEqualRegister { x, y },
            0xA000 => Self::LoadIndex { nnn },
            0xB000 => Self::JumpOffset { nnn },
            0xC000 => Self::Random { x, kk },
            0xD000 => Self::Draw { x, y, n },
            0xE000 => match kk {
                0x9E => Self::SkipIfKeyPressed { x },
                0xA1 => Self::SkipIfKeyNotPressed { x },
                _ => return None,
            },
            0xF000 => match kk {
                0x07 => Self::LoadDelayTimer { x },
                0x0A => Self::WaitForKey { x },
                0x15 => Self::SetDelayTimer { x },
                0x18 => Self::SetSoundTimer { x },
                0x1E => Self::AddIndex { x },
                0x29 => Self::LoadDigitSprite { x },
                0x33 => Self::StoreBcd { x },
                0x55 => Self::StoreRegisters { x },
                0x65 => Self::LoadRegisters { x },
                _ => return None,
            },
            _ => return None,
        };

        Some(instruction)
    }

    pub fn encode(self) -> u16 {
        let xy = |family: u16, x: usize, y: usize, n: u16| {
            family | ((x as u16 & 0xF) << 8) | ((y as u16 & 0xF) << 4) | n
        };
        let xkk = |family: u16, x: usize, kk: u8| family | ((x as u16 & 0xF) << 8) | u16::from(kk);

        match self {
            Self::ClearScreen => 0x00E0,
            Self::Return => 0x00EE,
            Self::Jump { nnn } => 0x1000 | nnn,
            Self::Call { nnn } => 0x2000 | nnn,
            Self::SkipIfEqualImmediate { x, kk } => xkk(0x3000, x, kk),
            Self::SkipIfNotEqualImmediate { x, kk } => xkk(0x4000, x, kk),
            Self::SkipIfEqualRegister { x, y } => xy(0x5000, x, y, 0),
            Self::LoadImmediate { x, kk } => xkk(0x6000, x, kk),
            Self::AddImmediate { x, kk } => xkk(0x7000, x, kk),
            Self::Alu { op, x, y } => xy(0x8000, x, y, op.nibble()),
            Self::SkipIfNotEqualRegister { x, y } => xy(0x9000, x, y, 0),
            Self::LoadIndex { nnn } => 0xA000 | nnn,
            Self::JumpOffset { nnn } => 0xB000 | nnn,
            Self::Random { x, kk } => xkk(0xC000, x, kk),
            Self::Draw { x, y, n } => xy(0xD000, x, y, u16::from(n & 0xF)),
            Self::SkipIfKeyPressed { x } => xkk(0xE000, x, 0x9E),
            Self::SkipIfKeyNotPressed { x } => xkk(0xE000, x, 0xA1),
            Self::LoadDelayTimer { x } => xkk(0xF000, x, 0x07),
            Self::WaitForKey { x } => xkk(0xF000, x, 0x0A),
            Self::SetDelayTimer { x } => xkk(0xF000, x, 0x15),
            Self::SetSoundTimer { x } => xkk(0xF000, x, 0x18),
            Self::AddIndex { x } => xkk(0xF000, x, 0x1E),
            Self::LoadDigitSprite { x } => xkk(0xF000, x, 0x29),
            Self::StoreBcd { x } => xkk(0xF000, x, 0x33),
            Self::StoreRegisters { x } => xkk(0xF000, x, 0x55),
            Self::LoadRegisters { x } => xkk(0xF000, x, 0x65),
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::ClearScreen => write!(f, "CLS"),
            Self::Return => write!(f, "RET"),
            Self::Jump { nnn } => write!(f, "JP 0x{nnn:03X}"),
            Self::Call { nnn } => write!(f, "CALL 0x{nnn:03X}"),
            Self::SkipIfEqualImmediate { x, kk } => write!(f, "SE V{x:X}, 0x{kk:02X}"),
            Self::SkipIfNotEqualImmediate { x, kk } => write!(f, "SNE V{x:X}, 0x{kk:02X}"),
            Self::SkipIfEqualRegister { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            Self::LoadImmediate { x, kk } => write!(f, "LD V{x:X}, 0x{kk:02X}"),
            Self::AddImmediate { x, kk } => write!(f, "ADD V{x:X}, 0x{kk:02X}"),
            Self::Alu {
                op: op @ (AluOp::ShiftRight | AluOp::ShiftLeft),
                x,
                ..
            } => write!(f, "{} V{x:X}", op.mnemonic()),
            Self::Alu { op, x, y } => write!(f, "{} V{x:X}, V{y:X}", op.mnemonic()),
            Self::SkipIfNotEqualRegister { x, y } => write!(f, "SNE V{x:X}, V{y:X}"),
            Self::LoadIndex { nnn } => write!(f, "LD I, 0x{nnn:03X}"),
            Self::JumpOffset { nnn } => write!(f, "JP V0, 0x{nnn:03X}"),
            Self::Random { x, kk } => write!(f, "RND V{x:X}, 0x{kk:02X}"),
            Self::Draw { x, y, n } => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Self::SkipIfKeyPressed { x } => write!(f, "SKP V{x:X}"),
            Self::SkipIfKeyNotPressed { x } => write!(f, "SKNP V{x:X}"),
            Self::LoadDelayTimer { x } => write!(f, "LD V{x:X}, DT"),
            Self::WaitForKey { x } => write!(f, "LD V{x:X}, K"),
            Self::SetDelayTimer { x } => write!(f, "LD DT, V{x:X}"),
            Self::SetSoundTimer { x } => write!(f, "LD ST, V{x:X}"),
            Self::AddIndex { x } => write!(f, "ADD I, V{x:X}"),
            Self::LoadDigitSprite { x } => write!(f, "LD F, V{x:X}"),
            Self::StoreBcd { x } => write!(f, "LD B, V{x:X}"),
            Self::StoreRegisters { x } => write!(f, "LD [I], V{x:X}"),
            Self::LoadRegisters { x } => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

/// What a pair of ROM bytes turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Code(Instruction),
    Word(u16),
    Byte(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisassembledLine {
    pub address: usize,
    pub kind: LineKind,
}

impl Display for DisassembledLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LineKind::Code(instruction) => write!(
                f,
                "{:03X}: {:04X}  {instruction}",
                self.address,
                instruction.encode()
            ),
            LineKind::Word(word) => write!(f, "{:03X}: {word:04X}  DW 0x{word:04X}", self.address),
            LineKind::Byte(byte) => write!(f, "{:03X}: {byte:02X}    DB 0x{byte:02X}", self.address),
        }
    }
}

/// Linear sweep over `rom` as if it were loaded at `origin`.
pub fn disassemble(rom: &[u8], origin: usize) -> Vec<DisassembledLine> {
    let mut lines = Vec::with_capacity(rom.len() / 2 + 1);
    let mut chunks = rom.chunks_exact(2);

    for (index, pair) in chunks.by_ref().enumerate() {
        let opcode = (u16::from(pair[0]) << 8) | u16::from(pair[1]);
        let kind = match Instruction::decode(opcode) {
            Some(instruction) => LineKind::Code(instruction),
            None => LineKind::Word(opcode),
        };
        lines.push(DisassembledLine {
            address: origin + index * 2,
            kind,
        });
    }

    if let [byte] = chunks.remainder() {
        lines.push(DisassembledLine {
            address: origin + rom.len() - 1,
            kind: LineKind::Byte(*byte),
        });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_operands() {
        assert_eq!(
            Instruction::decode(0xD125),
            Some(Instruction::Draw { x: 1, y: 2, n: 5 })
        );
        assert_eq!(
            Instruction::decode(0x8AB7),
            Some(Instruction::Alu {
                op: AluOp::SubReverse,
                x: 0xA,
                y: 0xB
            })
        );
        assert_eq!(
            Instruction::decode(0xB300),
            Some(Instruction::JumpOffset { nnn: 0x300 })
        );
    }

    #[test]
    fn rejects_undefined_words() {
        for opcode in [0x0000, 0x0123, 0x5121, 0x8008, 0x800F, 0x9AB1, 0xE1A2, 0xF0FF] {
            assert_eq!(Instruction::decode(opcode), None, "0x{opcode:04X}");
        }
    }

    #[test]
    fn encode_inverts_decode_for_defined_words() {
        for opcode in [0x00E0, 0x00EE, 0x2ABC, 0x5120, 0x812E, 0xC3FF, 0xE59E, 0xF865] {
            let instruction = Instruction::decode(opcode).unwrap();
            assert_eq!(instruction.encode(), opcode);
        }
    }

    #[test]
    fn renders_mnemonics() {
        let text: Vec<String> = [0x00E0, 0xA2F0, 0xF133, 0xF355, 0x8106, 0xF20A, 0xB210]
            .into_iter()
            .map(|opcode| Instruction::decode(opcode).unwrap().to_string())
            .collect();
        assert_eq!(
            text,
            [
                "CLS",
                "LD I, 0x2F0",
                "LD B, V1",
                "LD [I], V3",
                "SHR V1",
                "LD V2, K",
                "JP V0, 0x210"
            ]
        );
    }

    #[test]
    fn disassembly_marks_data_and_odd_tail() {
        let lines = disassemble(&[0x60, 0x0C, 0xFF, 0xFF, 0x12], 0x200);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].to_string(), "200: 600C  LD V0, 0x0C");
        assert_eq!(lines[1].kind, LineKind::Word(0xFFFF));
        assert_eq!(lines[2].address, 0x204);
        assert_eq!(lines[2].to_string(), "204: 12    DB 0x12");
    }
}
