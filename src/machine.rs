use std::io::{BufRead, Write};

use thiserror::Error;

pub const IMEM_SIZE: usize = 1024;
pub const DMEM_SIZE: usize = 1024;
pub const NUM_REGS: usize = 8;

const PC: usize = 7;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Missing colon on line: {line}")]
    MissingColon { line: usize },
    #[error("Bad instruction location on line: {line}")]
    BadLocation { line: usize },
    #[error("Instruction location {location} is out of range on line: {line}")]
    LocationOutOfRange { location: usize, line: usize },
    #[error("Missing opcode on line: {line}")]
    MissingOpcode { line: usize },
    #[error("Unknown opcode '{opcode}' on line: {line}")]
    UnknownOpcode { opcode: String, line: usize },
    #[error("Malformed operands on line: {line}")]
    BadOperands { line: usize },
    #[error("Invalid register {register} on line: {line}")]
    BadRegister { register: i64, line: usize },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid program counter value: {pc}")]
    InvalidProgramCounter { pc: i64 },
    #[error("Invalid memory address: {address}")]
    InvalidAddress { address: i64 },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Expected an integer on standard input, got '{input}'")]
    NonIntegerInput { input: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegOp {
    Halt,
    In,
    Out,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemOp {
    Ld,
    St,
    Lda,
    Ldc,
    Jlt,
    Jle,
    Jgt,
    Jge,
    Jeq,
    Jne,
}

impl MemOp {
    fn jump_taken(self, value: i64) -> Option<bool> {
        match self {
            MemOp::Jlt => Some(value < 0),
            MemOp::Jle => Some(value <= 0),
            MemOp::Jgt => Some(value > 0),
            MemOp::Jge => Some(value >= 0),
            MemOp::Jeq => Some(value == 0),
            MemOp::Jne => Some(value != 0),
            MemOp::Ld | MemOp::St | MemOp::Lda | MemOp::Ldc => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Instruction {
    Reg { op: RegOp, r: usize, s: usize, t: usize },
    Mem { op: MemOp, r: usize, d: i64, s: usize },
    Print(String),
}

#[derive(Debug)]
pub struct Machine {
    imem: Vec<Instruction>,
    dmem: Vec<i64>,
    regs: [i64; NUM_REGS],
}

impl Machine {
    /// Assembles a textual listing into a ready-to-run machine. Any malformed
    /// line rejects the whole program; nothing runs after a load failure.
    pub fn load(listing: &[String]) -> Result<Self, LoadError> {
        let halt = Instruction::Reg {
            op: RegOp::Halt,
            r: 0,
            s: 0,
            t: 0,
        };
        // Unwritten slots halt instead of looping through zeroed memory.
        let mut imem = vec![halt; IMEM_SIZE];

        for (index, raw) in listing.iter().enumerate() {
            let line = index + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let (loc_text, rest) = raw
                .split_once(':')
                .ok_or(LoadError::MissingColon { line })?;
            let location: usize = loc_text
                .trim()
                .parse()
                .map_err(|_| LoadError::BadLocation { line })?;
            if location >= IMEM_SIZE {
                return Err(LoadError::LocationOutOfRange { location, line });
            }
            imem[location] = parse_instruction(rest.trim_start(), line)?;
        }

        let mut dmem = vec![0; DMEM_SIZE];
        // The prologue reads the top-of-memory address out of cell 0.
        dmem[0] = (DMEM_SIZE - 1) as i64;

        Ok(Self {
            imem,
            dmem,
            regs: [0; NUM_REGS],
        })
    }

    /// Fetch/decode/execute until HALT. Output already written stays written
    /// when a fault stops the run.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), RuntimeError> {
        loop {
            let pc = self.regs[PC];
            if pc < 0 || pc as usize >= IMEM_SIZE {
                return Err(RuntimeError::InvalidProgramCounter { pc });
            }
            let instruction = self.imem[pc as usize].clone();
            self.regs[PC] = pc + 1;

            match instruction {
                Instruction::Print(text) => writeln!(output, "{text}")?,
                Instruction::Reg { op, r, s, t } => match op {
                    RegOp::Halt => return Ok(()),
                    RegOp::In => self.regs[r] = read_integer(&mut input)?,
                    RegOp::Out => writeln!(output, "{}", self.regs[r])?,
                    RegOp::Add => self.regs[r] = self.regs[s].wrapping_add(self.regs[t]),
                    RegOp::Sub => self.regs[r] = self.regs[s].wrapping_sub(self.regs[t]),
                    RegOp::Mul => self.regs[r] = self.regs[s].wrapping_mul(self.regs[t]),
                    RegOp::Div => {
                        if self.regs[t] == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        self.regs[r] = self.regs[s].wrapping_div(self.regs[t]);
                    }
                },
                Instruction::Mem { op, r, d, s } => {
                    let address = d.wrapping_add(self.regs[s]);
                    match op {
                        MemOp::Ld => self.regs[r] = self.dmem[data_index(address)?],
                        MemOp::St => self.dmem[data_index(address)?] = self.regs[r],
                        MemOp::Lda => self.regs[r] = address,
                        MemOp::Ldc => self.regs[r] = d,
                        _ => {
                            // jump_taken covers every remaining operator.
                            if op.jump_taken(self.regs[r]).unwrap_or(false) {
                                self.regs[PC] = address;
                            }
                        }
                    }
                }
            }
        }
    }
}

fn data_index(address: i64) -> Result<usize, RuntimeError> {
    if address < 0 || address as usize >= DMEM_SIZE {
        return Err(RuntimeError::InvalidAddress { address });
    }
    Ok(address as usize)
}

fn read_integer<R: BufRead>(input: &mut R) -> Result<i64, RuntimeError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let text = line.trim();
    text.parse()
        .map_err(|_| RuntimeError::NonIntegerInput {
            input: text.to_string(),
        })
}

fn parse_instruction(text: &str, line: usize) -> Result<Instruction, LoadError> {
    let mut parts = text.splitn(2, char::is_whitespace);
    let opcode = parts.next().unwrap_or("");
    let operands = parts.next().unwrap_or("");
    if opcode.is_empty() {
        return Err(LoadError::MissingOpcode { line });
    }

    if opcode == "PRINT" {
        return Ok(Instruction::Print(operands.trim_start().to_string()));
    }

    let reg_op = match opcode {
        "HALT" => Some(RegOp::Halt),
        "IN" => Some(RegOp::In),
        "OUT" => Some(RegOp::Out),
        "ADD" => Some(RegOp::Add),
        "SUB" => Some(RegOp::Sub),
        "MUL" => Some(RegOp::Mul),
        "DIV" => Some(RegOp::Div),
        _ => None,
    };
    if let Some(op) = reg_op {
        let [r, s, t] = parse_triple(operands, line)?;
        return Ok(Instruction::Reg {
            op,
            r: register(r, line)?,
            s: register(s, line)?,
            t: register(t, line)?,
        });
    }

    let mem_op = match opcode {
        "LD" => MemOp::Ld,
        "ST" => MemOp::St,
        "LDA" => MemOp::Lda,
        "LDC" => MemOp::Ldc,
        "JLT" => MemOp::Jlt,
        "JLE" => MemOp::Jle,
        "JGT" => MemOp::Jgt,
        "JGE" => MemOp::Jge,
        "JEQ" => MemOp::Jeq,
        "JNE" => MemOp::Jne,
        _ => {
            return Err(LoadError::UnknownOpcode {
                opcode: opcode.to_string(),
                line,
            });
        }
    };
    let (r, d, s) = parse_displacement(operands, line)?;
    Ok(Instruction::Mem {
        op: mem_op,
        r: register(r, line)?,
        d,
        s: register(s, line)?,
    })
}

// Operand shape `r, s, t`.
fn parse_triple(operands: &str, line: usize) -> Result<[i64; 3], LoadError> {
    let mut values = [0; 3];
    let mut fields = operands.split(',');
    for slot in &mut values {
        *slot = fields
            .next()
            .and_then(|field| field.trim().parse().ok())
            .ok_or(LoadError::BadOperands { line })?;
    }
    if fields.next().is_some() {
        return Err(LoadError::BadOperands { line });
    }
    Ok(values)
}

// Operand shape `r, d(s)`.
fn parse_displacement(operands: &str, line: usize) -> Result<(i64, i64, i64), LoadError> {
    let (r_text, rest) = operands
        .split_once(',')
        .ok_or(LoadError::BadOperands { line })?;
    let r = r_text
        .trim()
        .parse()
        .map_err(|_| LoadError::BadOperands { line })?;
    let rest = rest.trim();
    let inner = rest
        .strip_suffix(')')
        .ok_or(LoadError::BadOperands { line })?;
    let (d_text, s_text) = inner
        .split_once('(')
        .ok_or(LoadError::BadOperands { line })?;
    let d = d_text
        .trim()
        .parse()
        .map_err(|_| LoadError::BadOperands { line })?;
    let s = s_text
        .trim()
        .parse()
        .map_err(|_| LoadError::BadOperands { line })?;
    Ok((r, d, s))
}

fn register(value: i64, line: usize) -> Result<usize, LoadError> {
    if value < 0 || value as usize >= NUM_REGS {
        return Err(LoadError::BadRegister {
            register: value,
            line,
        });
    }
    Ok(value as usize)
}
