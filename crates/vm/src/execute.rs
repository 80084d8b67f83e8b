//! Main execution loop and opcode dispatch for the RVM.

use log::{debug, trace};

use crate::arith::{self, Fault};
use crate::error::RuntimeError;
use crate::machine::VM;
use rvm_common::{BinaryOp, Instruction, Opcode, Value};

/// What the loop does after an instruction.
enum Flow {
    Continue,
    Halt,
}

impl<'a> VM<'a> {
    /// Execute the program until it halts or fails.
    pub fn execute(&mut self) -> Result<Value, RuntimeError> {
        debug!(
            "running {} instruction(s) from entry {}",
            self.program.len(),
            self.pc
        );

        loop {
            let Some(instr) = self.fetch() else {
                // Falling off the end (pc == len) is an implicit halt.
                break;
            };
            self.current = self.pc;

            if self.config.is_cancelled() {
                return Err(RuntimeError::Cancelled {
                    at: self.location(),
                });
            }
            if self.steps >= self.config.max_steps {
                return Err(RuntimeError::ExecutionLimitExceeded {
                    limit: self.config.max_steps,
                    at: self.location(),
                });
            }
            self.steps += 1;
            self.pc += 1;

            trace!("{:>5}  {}", self.current, instr);

            if let Flow::Halt = self.step(instr)? {
                break;
            }
        }

        let result = self.halt_value();
        debug!("halted after {} step(s) with {}", self.steps, result);
        Ok(result)
    }

    fn step(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        match instr.opcode {
            // Control
            Opcode::Nop => {}
            Opcode::Halt => return Ok(Flow::Halt),

            // Stack
            Opcode::Push => {
                let value = self.value_operand(instr, 0)?;
                self.push(value)?;
            }
            Opcode::Pop => {
                let register = self.register_operand(instr, 0)?;
                let value = self.pop()?;
                self.write_register(register, value);
            }
            Opcode::Dup => {
                let value = self.peek()?;
                self.push(value)?;
            }
            Opcode::Swap => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(b)?;
                self.push(a)?;
            }
            Opcode::Drop => {
                self.pop()?;
            }

            // Registers
            Opcode::Mov => {
                let register = self.register_operand(instr, 0)?;
                let value = self.value_operand(instr, 1)?;
                self.write_register(register, value);
            }
            Opcode::Inc => self.exec_step_register(instr, BinaryOp::Add)?,
            Opcode::Dec => self.exec_step_register(instr, BinaryOp::Sub)?,

            // Arithmetic
            Opcode::Add => self.exec_binary(BinaryOp::Add)?,
            Opcode::Sub => self.exec_binary(BinaryOp::Sub)?,
            Opcode::Mul => self.exec_binary(BinaryOp::Mul)?,
            Opcode::Div => self.exec_binary(BinaryOp::Div)?,
            Opcode::Mod => self.exec_binary(BinaryOp::Mod)?,
            Opcode::Neg => {
                let value = self.pop()?;
                self.push(value.negated())?;
            }

            // Comparison
            Opcode::Eq => self.exec_binary(BinaryOp::Eq)?,
            Opcode::Lt => self.exec_binary(BinaryOp::Lt)?,
            Opcode::Gt => self.exec_binary(BinaryOp::Gt)?,

            // Control flow
            Opcode::Jmp => {
                self.pc = self.target_operand(instr)?;
            }
            Opcode::Jz => self.exec_branch(instr, true)?,
            Opcode::Jnz => self.exec_branch(instr, false)?,
            Opcode::Call => {
                let target = self.target_operand(instr)?;
                if self.call_stack.len() >= self.config.max_call_depth {
                    return Err(RuntimeError::CallDepthExceeded {
                        limit: self.config.max_call_depth,
                        at: self.location(),
                    });
                }
                self.call_stack.push(self.pc);
                self.pc = target;
            }
            Opcode::Ret => match self.call_stack.pop() {
                Some(return_pc) => self.pc = return_pc,
                None => return Ok(Flow::Halt),
            },
        }
        Ok(Flow::Continue)
    }

    /// Pop b, pop a, push `a op b`.
    fn exec_binary(&mut self, op: BinaryOp) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = self.arith(op, a, b)?;
        self.push(result)
    }

    /// `inc` and `dec`: register ← register op 1.
    fn exec_step_register(&mut self, instr: &Instruction, op: BinaryOp) -> Result<(), RuntimeError> {
        let register = self.register_operand(instr, 0)?;
        let current = self.read_register(register)?;
        let result = self.arith(op, current, Value::ONE)?;
        self.write_register(register, result);
        Ok(())
    }

    /// `jz` / `jnz`: pop a value and jump when its zero-ness matches.
    fn exec_branch(&mut self, instr: &Instruction, jump_if_zero: bool) -> Result<(), RuntimeError> {
        let target = self.target_operand(instr)?;
        let value = self.pop()?;
        if value.is_zero() == jump_if_zero {
            self.pc = target;
        }
        Ok(())
    }

    fn arith(&self, op: BinaryOp, a: Value, b: Value) -> Result<Value, RuntimeError> {
        arith::binary(op, a, b).map_err(|fault| match fault {
            Fault::DivisionByZero => RuntimeError::DivisionByZero {
                at: self.location(),
            },
            Fault::Overflow => RuntimeError::NumericOverflow {
                op: op.symbol(),
                at: self.location(),
            },
        })
    }
}
