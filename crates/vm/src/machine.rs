//! VM state management: registers, operand stack, call stack.

use crate::config::VmConfig;
use crate::error::RuntimeError;
use rvm_common::{Instruction, Location, Operand, Program, Register, Value, REGISTER_COUNT};

/// The RVM virtual machine. One instance runs one program once.
pub struct VM<'a> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    pub(crate) config: &'a VmConfig,
    /// General-purpose registers; `None` until first written.
    pub(crate) registers: [Option<Value>; REGISTER_COUNT],
    /// Operand stack.
    pub(crate) stack: Vec<Value>,
    /// Return addresses pushed by `call`.
    pub(crate) call_stack: Vec<usize>,
    /// Index of the next instruction to fetch.
    pub(crate) pc: usize,
    /// Index of the instruction being executed, for error locations.
    pub(crate) current: usize,
    /// Instructions executed so far.
    pub(crate) steps: u64,
}

impl<'a> VM<'a> {
    /// Create a new VM for the given program.
    pub fn new(program: &'a Program, config: &'a VmConfig) -> Self {
        Self {
            program,
            config,
            registers: [None; REGISTER_COUNT],
            stack: Vec::new(),
            call_stack: Vec::new(),
            pc: program.entry(),
            current: program.entry(),
            steps: 0,
        }
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Location of the instruction at `index`.
    pub(crate) fn location_of(&self, index: usize) -> Location {
        let line = self
            .program
            .instructions
            .get(index)
            .map_or(0, |instr| instr.line);
        Location::Instruction { index, line }
    }

    /// Location of the instruction being executed.
    pub(crate) fn location(&self) -> Location {
        self.location_of(self.current)
    }

    /// Push a value onto the stack, checking for overflow.
    pub(crate) fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.config.max_stack_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_stack_depth,
                at: self.location(),
            });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow {
            at: self.location(),
        })
    }

    /// Value on top of the stack, without removing it.
    pub(crate) fn peek(&self) -> Result<Value, RuntimeError> {
        self.stack
            .last()
            .copied()
            .ok_or(RuntimeError::StackUnderflow {
                at: self.location(),
            })
    }

    pub(crate) fn read_register(&self, register: Register) -> Result<Value, RuntimeError> {
        self.registers[register.index()].ok_or(RuntimeError::UndefinedRegister {
            register,
            at: self.location(),
        })
    }

    pub(crate) fn write_register(&mut self, register: Register, value: Value) {
        self.registers[register.index()] = Some(value);
    }

    /// Fetch the instruction at the current pc.
    ///
    /// The returned reference borrows the program, not the VM, so the VM
    /// stays free to mutate while it is held.
    pub(crate) fn fetch(&self) -> Option<&'a Instruction> {
        self.program.instructions.get(self.pc)
    }

    fn malformed(&self, instr: &Instruction) -> RuntimeError {
        RuntimeError::MalformedInstruction {
            mnemonic: instr.opcode.mnemonic(),
            at: self.location(),
        }
    }

    /// Read a value operand: an immediate or a register.
    pub(crate) fn value_operand(
        &self,
        instr: &Instruction,
        idx: usize,
    ) -> Result<Value, RuntimeError> {
        match instr.operand(idx) {
            Some(Operand::Immediate(value)) => Ok(*value),
            Some(Operand::Register(register)) => self.read_register(*register),
            _ => Err(self.malformed(instr)),
        }
    }

    /// Read a register operand.
    pub(crate) fn register_operand(
        &self,
        instr: &Instruction,
        idx: usize,
    ) -> Result<Register, RuntimeError> {
        match instr.operand(idx) {
            Some(Operand::Register(register)) => Ok(*register),
            _ => Err(self.malformed(instr)),
        }
    }

    /// Resolve a jump target operand to an instruction index in `0..=len`.
    pub(crate) fn target_operand(&self, instr: &Instruction) -> Result<usize, RuntimeError> {
        let len = self.program.len();
        match instr.operand(0) {
            Some(Operand::Label(name)) => {
                self.program
                    .resolve(name)
                    .ok_or_else(|| RuntimeError::UnknownLabel {
                        label: name.clone(),
                        at: self.location(),
                    })
            }
            Some(Operand::Immediate(value)) => match value.as_index() {
                Some(target) if target <= len => Ok(target),
                _ => Err(RuntimeError::InvalidJumpTarget {
                    target: value.to_string(),
                    len,
                    at: self.location(),
                }),
            },
            _ => Err(self.malformed(instr)),
        }
    }

    /// Result of a halted program: top of stack, else `r0`, else zero.
    pub(crate) fn halt_value(&self) -> Value {
        self.stack
            .last()
            .copied()
            .or(self.registers[0])
            .unwrap_or(Value::ZERO)
    }
}
