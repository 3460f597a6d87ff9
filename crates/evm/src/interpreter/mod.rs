// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! The stack-machine interpreter (§4.1 Interpreter).

mod gasometer;
mod informant;
mod memory;
pub mod shared_cache;
mod stack;

use bit_set::BitSet;
use ethereum_types::{Address, BigEndianHash, H256, U256};
use num_bigint::BigUint;
use std::{cmp, marker::PhantomData, sync::Arc};

use vm::{
    ActionParams, ActionValue, CallType, ContractCreateResult, CreateContractAddress, GasLeft,
    MessageCallResult, ParamsType, ReturnData, Schedule, TrapError, TrapKind,
};

use crate::cost::CostType;
use crate::instructions::{Instruction, InstructionInfo};

pub use self::shared_cache::SharedCache;
use self::{
    gasometer::Gasometer,
    informant::EvmInformant,
    memory::Memory,
    stack::{Stack, VecStack},
};

type ProgramCounter = usize;

/// Code reader tracking the program counter separately from the owned code
/// bytes, so jumps are just a `usize` assignment.
struct CodeReader {
    position: ProgramCounter,
    code: Arc<Vec<u8>>,
}

impl CodeReader {
    fn new(code: Arc<Vec<u8>>) -> Self {
        CodeReader { code, position: 0 }
    }

    /// Read up to `no_of_bytes` immediate bytes at the current position,
    /// left-padding with zero if they run past the end of the code (a PUSH
    /// at the tail of the contract sees implicit zero bytes).
    fn read(&mut self, no_of_bytes: usize) -> U256 {
        let pos = self.position;
        self.position += no_of_bytes;
        let max = cmp::min(pos + no_of_bytes, self.code.len());
        U256::from(&self.code[pos..max])
    }

    fn len(&self) -> usize {
        self.code.len()
    }
}

/// `ActionParams` without `code`, so the code can live in `CodeReader`
/// without an aliasing borrow.
struct InterpreterParams {
    code_address: Address,
    code_hash: Option<H256>,
    address: Address,
    sender: Address,
    origin: Address,
    gas_price: U256,
    value: ActionValue,
    data: Option<Vec<u8>>,
}

impl From<ActionParams> for InterpreterParams {
    fn from(params: ActionParams) -> Self {
        InterpreterParams {
            code_address: params.code_address,
            code_hash: params.code_hash,
            address: params.address,
            sender: params.sender,
            origin: params.origin,
            gas_price: params.gas_price,
            value: params.value,
            data: params.data,
        }
    }
}

enum InstructionResult<Gas> {
    Ok,
    UnusedGas(Gas),
    JumpToPosition(U256),
    StopExecutionNeedsReturn {
        gas: Gas,
        init_off: U256,
        init_size: U256,
        apply: bool,
    },
    StopExecution,
    Trap(TrapKind),
}

/// Stepping result returned to the driving loop.
enum InterpreterResult {
    Stopped,
    Done(vm::Result<GasLeft>),
    Continue,
    Trap(TrapKind),
}

/// A suspended or running EVM call frame. `Cost` is the gas counter's
/// integer width: `u64` for the common case, `U256` when a caller passes
/// more gas than fits in 64 bits.
pub struct Interpreter<Cost: CostType> {
    mem: Vec<u8>,
    cache: Arc<SharedCache>,
    params: InterpreterParams,
    reader: CodeReader,
    return_data: ReturnData,
    informant: EvmInformant,
    done: bool,
    valid_jump_destinations: Option<Arc<BitSet>>,
    gasometer: Option<Gasometer<Cost>>,
    stack: VecStack<U256>,
    resume_output_range: Option<(U256, U256)>,
    resume_result: Option<InstructionResult<Cost>>,
    _type: PhantomData<Cost>,
}

impl<Cost: 'static + CostType> vm::Exec for Interpreter<Cost> {
    fn exec(mut self: Box<Self>, ext: &mut dyn vm::Ext) -> vm::ExecTrapResult<GasLeft> {
        loop {
            match self.step(ext) {
                InterpreterResult::Continue => {}
                InterpreterResult::Done(value) => return Ok(value),
                InterpreterResult::Trap(TrapKind::Call(params)) => {
                    return Err(TrapError::Call(params, self));
                }
                InterpreterResult::Trap(TrapKind::Create(params, address)) => {
                    return Err(TrapError::Create(params, address, self));
                }
                InterpreterResult::Stopped => {
                    panic!("Attempted to execute an already stopped VM.")
                }
            }
        }
    }
}

impl<Cost: 'static + CostType> vm::ResumeCall for Interpreter<Cost> {
    fn resume_call(mut self: Box<Self>, result: MessageCallResult, _ext: &mut dyn vm::Ext) -> Box<dyn vm::Exec> {
        let (out_off, out_size) = self
            .resume_output_range
            .take()
            .expect("resume_output_range is always set by the opcode that trapped; qed");

        match result {
            MessageCallResult::Success(gas_left, data) => {
                let output = self.mem.writeable_slice(out_off, out_size);
                let len = cmp::min(output.len(), data.len());
                output[..len].copy_from_slice(&data[..len]);
                self.return_data = data;
                self.stack.push(U256::one());
                self.resume_result = Some(InstructionResult::UnusedGas(
                    Cost::from_u256(gas_left).expect("gas left cannot exceed what was provided"),
                ));
            }
            MessageCallResult::Reverted(gas_left, data) => {
                let output = self.mem.writeable_slice(out_off, out_size);
                let len = cmp::min(output.len(), data.len());
                output[..len].copy_from_slice(&data[..len]);
                self.return_data = data;
                self.stack.push(U256::zero());
                self.resume_result = Some(InstructionResult::UnusedGas(
                    Cost::from_u256(gas_left).expect("gas left cannot exceed what was provided"),
                ));
            }
            MessageCallResult::Failed => {
                self.stack.push(U256::zero());
                self.resume_result = Some(InstructionResult::Ok);
            }
        }
        self
    }
}

impl<Cost: 'static + CostType> vm::ResumeCreate for Interpreter<Cost> {
    fn resume_create(mut self: Box<Self>, result: ContractCreateResult, _ext: &mut dyn vm::Ext) -> Box<dyn vm::Exec> {
        match result {
            ContractCreateResult::Created(address, gas_left) => {
                self.stack.push(address_to_u256(address));
                self.resume_result = Some(InstructionResult::UnusedGas(
                    Cost::from_u256(gas_left).expect("gas left cannot exceed what was provided"),
                ));
            }
            ContractCreateResult::Reverted(gas_left, data) => {
                self.stack.push(U256::zero());
                self.return_data = data;
                self.resume_result = Some(InstructionResult::UnusedGas(
                    Cost::from_u256(gas_left).expect("gas left cannot exceed what was provided"),
                ));
            }
            ContractCreateResult::Failed => {
                self.stack.push(U256::zero());
                self.resume_result = Some(InstructionResult::Ok);
            }
        }
        self
    }
}

impl<Cost: CostType> Interpreter<Cost> {
    pub fn new(mut params: ActionParams, cache: Arc<SharedCache>, schedule: &Schedule, depth: usize) -> Self {
        let reader = CodeReader::new(params.code.take().expect("interpreter always called with code; qed"));
        let gas = params.gas;
        let params = InterpreterParams::from(params);
        Interpreter {
            cache,
            params,
            reader,
            informant: EvmInformant::new(depth),
            done: false,
            valid_jump_destinations: None,
            gasometer: Cost::from_u256(gas).ok().map(Gasometer::new),
            stack: VecStack::with_capacity(schedule.stack_limit, U256::zero()),
            mem: Vec::new(),
            return_data: ReturnData::empty(),
            resume_output_range: None,
            resume_result: None,
            _type: PhantomData,
        }
    }

    fn step(&mut self, ext: &mut dyn vm::Ext) -> InterpreterResult {
        if self.done {
            return InterpreterResult::Stopped;
        }
        let result = if self.gasometer.is_none() {
            InterpreterResult::Done(Err(vm::Error::OutOfGas))
        } else if self.reader.len() == 0 {
            InterpreterResult::Done(Ok(GasLeft::Known(
                self.gasometer.as_ref().unwrap().current_gas.as_u256(),
            )))
        } else {
            self.step_inner(ext)
        };
        if let InterpreterResult::Done(_) = result {
            self.done = true;
            self.informant.done();
        }
        result
    }

    fn step_inner(&mut self, ext: &mut dyn vm::Ext) -> InterpreterResult {
        let result = match self.resume_result.take() {
            Some(result) => result,
            None => {
                let opcode = self.reader.code[self.reader.position];
                let instruction = match Instruction::from_u8(opcode) {
                    Some(i) => i,
                    None => {
                        return InterpreterResult::Done(Err(vm::Error::BadInstruction {
                            instruction: opcode,
                        }))
                    }
                };
                self.reader.position += 1;

                let info = instruction.info();
                if let Err(e) = self.verify_instruction(ext, instruction, &info) {
                    return InterpreterResult::Done(Err(e));
                }

                let gasometer = self.gasometer.as_mut().expect("checked by step; qed");
                let requirements = match gasometer.requirements(
                    ext,
                    instruction,
                    &info,
                    &self.stack,
                    self.mem.size(),
                ) {
                    Ok(r) => r,
                    Err(e) => return InterpreterResult::Done(Err(e)),
                };
                if let Err(e) = gasometer.verify_gas(&requirements.gas_cost) {
                    return InterpreterResult::Done(Err(e));
                }
                self.mem.expand(requirements.memory_required_size);
                gasometer.current_mem_gas = requirements.memory_total_gas;
                gasometer.current_gas = gasometer.current_gas - requirements.gas_cost;

                self.informant.step(
                    self.reader.position - 1,
                    instruction,
                    gasometer.current_gas.as_u256(),
                );

                let current_gas = gasometer.current_gas;
                match self.exec_instruction(current_gas, ext, instruction, requirements.provide_gas) {
                    Err(e) => return InterpreterResult::Done(Err(e)),
                    Ok(r) => r,
                }
            }
        };

        if let InstructionResult::Trap(trap) = result {
            return InterpreterResult::Trap(trap);
        }

        if let InstructionResult::UnusedGas(gas) = result {
            let gasometer = self.gasometer.as_mut().expect("checked by step; qed");
            gasometer.current_gas = gasometer.current_gas + gas;
        }

        match result {
            InstructionResult::JumpToPosition(position) => {
                if self.valid_jump_destinations.is_none() {
                    self.valid_jump_destinations =
                        Some(self.cache.jump_destinations(&self.params.code_hash, &self.reader.code));
                }
                let dests = self.valid_jump_destinations.as_ref().unwrap();
                let pos = match self.verify_jump(position, dests) {
                    Ok(p) => p,
                    Err(e) => return InterpreterResult::Done(Err(e)),
                };
                self.reader.position = pos;
            }
            InstructionResult::StopExecutionNeedsReturn {
                gas,
                init_off,
                init_size,
                apply,
            } => {
                let mem = std::mem::take(&mut self.mem);
                return InterpreterResult::Done(Ok(GasLeft::NeedsReturn {
                    gas_left: gas.as_u256(),
                    data: mem.into_return_data(init_off, init_size),
                    apply_state: apply,
                }));
            }
            InstructionResult::StopExecution => {
                return InterpreterResult::Done(Ok(GasLeft::Known(
                    self.gasometer.as_ref().unwrap().current_gas.as_u256(),
                )));
            }
            _ => {}
        }

        if self.reader.position >= self.reader.len() {
            return InterpreterResult::Done(Ok(GasLeft::Known(
                self.gasometer.as_ref().unwrap().current_gas.as_u256(),
            )));
        }

        InterpreterResult::Continue
    }

    fn verify_instruction(&self, ext: &dyn vm::Ext, instruction: Instruction, info: &InstructionInfo) -> vm::Result<()> {
        use Instruction::*;
        let schedule = ext.schedule();
        if instruction == DELEGATECALL && !schedule.have_delegate_call {
            return Err(vm::Error::BadInstruction {
                instruction: instruction as u8,
            });
        }
        if !self.stack.has(info.args) {
            Err(vm::Error::StackUnderflow {
                instruction: info.name,
                wanted: info.args,
                on_stack: self.stack.size(),
            })
        } else if self.stack.size() - info.args + info.ret > schedule.stack_limit {
            Err(vm::Error::OutOfStack {
                instruction: info.name,
                wanted: info.ret - info.args,
                limit: schedule.stack_limit,
            })
        } else {
            Ok(())
        }
    }

    fn verify_jump(&self, jump: U256, valid_jump_destinations: &BitSet) -> vm::Result<usize> {
        if jump > U256::from(usize::max_value()) {
            return Err(vm::Error::BadJumpDestination { destination: 0 });
        }
        let jump = jump.low_u64() as usize;
        if valid_jump_destinations.contains(jump) {
            Ok(jump)
        } else {
            Err(vm::Error::BadJumpDestination { destination: jump })
        }
    }

    #[allow(clippy::cognitive_complexity)]
    fn exec_instruction(
        &mut self,
        gas: Cost,
        ext: &mut dyn vm::Ext,
        instruction: Instruction,
        provided: Option<Cost>,
    ) -> vm::Result<InstructionResult<Cost>> {
        use Instruction::*;
        match instruction {
            JUMP => {
                let jump = self.stack.pop_back();
                Ok(InstructionResult::JumpToPosition(jump))
            }
            JUMPI => {
                let jump = self.stack.pop_back();
                let condition = self.stack.pop_back();
                if !condition.is_zero() {
                    Ok(InstructionResult::JumpToPosition(jump))
                } else {
                    Ok(InstructionResult::Ok)
                }
            }
            JUMPDEST => Ok(InstructionResult::Ok),
            STOP => Ok(InstructionResult::StopExecution),
            RETURN => {
                let init_off = self.stack.pop_back();
                let init_size = self.stack.pop_back();
                Ok(InstructionResult::StopExecutionNeedsReturn {
                    gas,
                    init_off,
                    init_size,
                    apply: true,
                })
            }
            ADD => self.binop(|a, b| a.overflowing_add(b).0),
            MUL => self.binop(|a, b| a.overflowing_mul(b).0),
            SUB => self.binop(|a, b| a.overflowing_sub(b).0),
            DIV => self.binop(|a, b| if b.is_zero() { U256::zero() } else { a / b }),
            MOD => self.binop(|a, b| if b.is_zero() { U256::zero() } else { a % b }),
            SDIV => self.binop(signed_div),
            SMOD => self.binop(signed_mod),
            ADDMOD => self.triop(|a, b, c| {
                if c.is_zero() {
                    U256::zero()
                } else {
                    from_biguint((to_biguint(a) + to_biguint(b)) % to_biguint(c))
                }
            }),
            MULMOD => self.triop(|a, b, c| {
                if c.is_zero() {
                    U256::zero()
                } else {
                    from_biguint((to_biguint(a) * to_biguint(b)) % to_biguint(c))
                }
            }),
            EXP => {
                let base = self.stack.pop_back();
                let expon = self.stack.pop_back();
                let res = from_biguint(mod_pow_2_256(to_biguint(base), to_biguint(expon)));
                self.stack.push(res);
                Ok(InstructionResult::Ok)
            }
            SIGNEXTEND => {
                let i = self.stack.pop_back();
                let x = self.stack.pop_back();
                let result = if i >= U256::from(32) {
                    x
                } else {
                    let bit_index = (i.low_u64() * 8 + 7) as usize;
                    let bit = x.bit(bit_index);
                    let mask = (U256::one() << bit_index) - U256::one();
                    if bit {
                        x | !mask
                    } else {
                        x & mask
                    }
                };
                self.stack.push(result);
                Ok(InstructionResult::Ok)
            }
            LT => self.binop(|a, b| bool_to_u256(a < b)),
            GT => self.binop(|a, b| bool_to_u256(a > b)),
            SLT => self.binop(|a, b| bool_to_u256(signed_lt(a, b))),
            SGT => self.binop(|a, b| bool_to_u256(signed_lt(b, a))),
            EQ => self.binop(|a, b| bool_to_u256(a == b)),
            ISZERO => self.unop(|a| bool_to_u256(a.is_zero())),
            AND => self.binop(|a, b| a & b),
            OR => self.binop(|a, b| a | b),
            XOR => self.binop(|a, b| a ^ b),
            NOT => self.unop(|a| !a),
            BYTE => self.binop(|i, x| {
                if i >= U256::from(32) {
                    U256::zero()
                } else {
                    let i = i.low_u64() as usize;
                    U256::from(x.byte(31 - i))
                }
            }),
            SHA3 => {
                let offset = self.stack.pop_back();
                let size = self.stack.pop_back();
                let data = self.mem.read_slice(offset.low_u64() as usize, size.low_u64() as usize);
                let hash = ext.sha3(data);
                self.stack.push(hash.into_uint());
                Ok(InstructionResult::Ok)
            }
            ADDRESS => {
                self.stack.push(address_to_u256(self.params.address));
                Ok(InstructionResult::Ok)
            }
            ORIGIN => {
                self.stack.push(address_to_u256(self.params.origin));
                Ok(InstructionResult::Ok)
            }
            CALLER => {
                self.stack.push(address_to_u256(self.params.sender));
                Ok(InstructionResult::Ok)
            }
            CALLVALUE => {
                self.stack.push(self.params.value.value());
                Ok(InstructionResult::Ok)
            }
            CALLDATALOAD => {
                let offset = self.stack.pop_back().low_u64() as usize;
                let data = self.params.data.as_deref().unwrap_or(&[]);
                let mut word = [0u8; 32];
                for (i, slot) in word.iter_mut().enumerate() {
                    if let Some(byte) = data.get(offset + i) {
                        *slot = *byte;
                    }
                }
                self.stack.push(U256::from_big_endian(&word));
                Ok(InstructionResult::Ok)
            }
            CALLDATASIZE => {
                self.stack.push(U256::from(self.params.data.as_ref().map_or(0, |d| d.len())));
                Ok(InstructionResult::Ok)
            }
            CALLDATACOPY => {
                self.copy_into_memory(self.params.data.as_deref().unwrap_or(&[]).to_vec());
                Ok(InstructionResult::Ok)
            }
            CODESIZE => {
                self.stack.push(U256::from(self.reader.len()));
                Ok(InstructionResult::Ok)
            }
            CODECOPY => {
                let code = self.reader.code.clone();
                self.copy_into_memory((*code).clone());
                Ok(InstructionResult::Ok)
            }
            GASPRICE => {
                self.stack.push(self.params.gas_price);
                Ok(InstructionResult::Ok)
            }
            EXTCODESIZE => {
                let address = u256_to_address(&self.stack.pop_back());
                let size = ext.extcodesize(&address)?.unwrap_or(0);
                self.stack.push(U256::from(size));
                Ok(InstructionResult::Ok)
            }
            EXTCODECOPY => {
                let address = u256_to_address(&self.stack.pop_back());
                let code = ext.extcode(&address)?.map(|c| (*c).clone()).unwrap_or_default();
                self.copy_into_memory(code);
                Ok(InstructionResult::Ok)
            }
            BLOCKHASH => {
                let number = self.stack.pop_back();
                let hash = ext.blockhash(&number);
                self.stack.push(hash.into_uint());
                Ok(InstructionResult::Ok)
            }
            COINBASE => {
                self.stack.push(address_to_u256(ext.env_info().author));
                Ok(InstructionResult::Ok)
            }
            TIMESTAMP => {
                self.stack.push(U256::from(ext.env_info().timestamp));
                Ok(InstructionResult::Ok)
            }
            NUMBER => {
                self.stack.push(U256::from(ext.env_info().number));
                Ok(InstructionResult::Ok)
            }
            DIFFICULTY => {
                self.stack.push(ext.env_info().difficulty);
                Ok(InstructionResult::Ok)
            }
            GASLIMIT => {
                self.stack.push(ext.env_info().gas_limit);
                Ok(InstructionResult::Ok)
            }
            POP => {
                self.stack.pop_back();
                Ok(InstructionResult::Ok)
            }
            MLOAD => {
                let offset = self.stack.pop_back().low_u64() as usize;
                self.stack.push(self.mem.read(offset));
                Ok(InstructionResult::Ok)
            }
            MSTORE => {
                let offset = self.stack.pop_back().low_u64() as usize;
                let value = self.stack.pop_back();
                self.mem.write(offset, value);
                Ok(InstructionResult::Ok)
            }
            MSTORE8 => {
                let offset = self.stack.pop_back().low_u64() as usize;
                let value = self.stack.pop_back();
                self.mem.write_byte(offset, value.low_u64() as u8);
                Ok(InstructionResult::Ok)
            }
            SLOAD => {
                let key: H256 = BigEndianHash::from_uint(&self.stack.pop_back());
                let value = ext.storage_at(&key)?;
                self.stack.push(value.into_uint());
                Ok(InstructionResult::Ok)
            }
            SSTORE => {
                let key: H256 = BigEndianHash::from_uint(&self.stack.pop_back());
                let value = self.stack.pop_back();
                let current_val = ext.storage_at(&key)?.into_uint();
                let refund = ext.schedule().sstore_refund_gas;
                if !current_val.is_zero() && value.is_zero() {
                    ext.add_sstore_refund(refund);
                }
                ext.set_storage(key, BigEndianHash::from_uint(&value))?;
                Ok(InstructionResult::Ok)
            }
            PC => {
                self.stack.push(U256::from(self.reader.position - 1));
                Ok(InstructionResult::Ok)
            }
            MSIZE => {
                self.stack.push(U256::from(self.mem.size()));
                Ok(InstructionResult::Ok)
            }
            GAS => {
                self.stack.push(gas.as_u256());
                Ok(InstructionResult::Ok)
            }
            CREATE => {
                let value = self.stack.pop_back();
                let init_off = self.stack.pop_back();
                let init_size = self.stack.pop_back();
                let code = self
                    .mem
                    .read_slice(init_off.low_u64() as usize, init_size.low_u64() as usize)
                    .to_vec();
                let create_gas = provided.expect("CREATE always computes provide_gas; qed").as_u256();
                match ext.create(&create_gas, &value, &code, CreateContractAddress::FromSenderAndNonce, true) {
                    Ok(result) => {
                        self.resolve_create(result);
                        Ok(InstructionResult::Ok)
                    }
                    Err(TrapKind::Create(params, address)) => Ok(InstructionResult::Trap(TrapKind::Create(params, address))),
                    Err(TrapKind::Call(_)) => unreachable!("Ext::create only traps with TrapKind::Create"),
                }
            }
            CALL | CALLCODE | DELEGATECALL => {
                // The requested-gas stack argument was already consulted by
                // the gasometer (`requirements.provide_gas`); only its
                // position on the stack matters here.
                self.stack.pop_back();
                let code_address = u256_to_address(&self.stack.pop_back());
                let (value, in_off, in_size, out_off, out_size) = if instruction == DELEGATECALL {
                    (None, self.stack.pop_back(), self.stack.pop_back(), self.stack.pop_back(), self.stack.pop_back())
                } else {
                    let value = self.stack.pop_back();
                    (Some(value), self.stack.pop_back(), self.stack.pop_back(), self.stack.pop_back(), self.stack.pop_back())
                };
                let data = self
                    .mem
                    .read_slice(in_off.low_u64() as usize, in_size.low_u64() as usize)
                    .to_vec();
                let receive_address = if instruction == CALL {
                    code_address
                } else {
                    self.params.address
                };
                let call_type = match instruction {
                    CALL => CallType::Call,
                    CALLCODE => CallType::CallCode,
                    DELEGATECALL => CallType::DelegateCall,
                    _ => unreachable!(),
                };
                // DELEGATECALL preserves the enclosing frame's own caller and
                // value; CALL/CALLCODE present the currently executing
                // contract as the sender, same as `receive_address` above.
                let sender_address = if instruction == DELEGATECALL {
                    &self.params.sender
                } else {
                    &self.params.address
                };
                self.resume_output_range = Some((out_off, out_size));
                let forwarded = provided.expect("CALL family always computes provide_gas; qed").as_u256();
                match ext.call(
                    &forwarded,
                    sender_address,
                    &receive_address,
                    value,
                    &data,
                    &code_address,
                    call_type,
                    true,
                ) {
                    Ok(result) => {
                        self.resolve_call(result);
                        Ok(InstructionResult::Ok)
                    }
                    Err(TrapKind::Call(params)) => Ok(InstructionResult::Trap(TrapKind::Call(params))),
                    Err(TrapKind::Create(_, _)) => unreachable!("Ext::call only traps with TrapKind::Call"),
                }
            }
            SELFDESTRUCT => {
                let refund_address = u256_to_address(&self.stack.pop_back());
                ext.suicide(&refund_address)?;
                Ok(InstructionResult::StopExecution)
            }
            _ if instruction.is_push() => {
                let bytes = instruction.push_bytes();
                self.stack.push(self.reader.read(bytes));
                Ok(InstructionResult::Ok)
            }
            _ if instruction.is_dup() => {
                self.stack.dup(instruction.dup_or_swap_position() - 1);
                Ok(InstructionResult::Ok)
            }
            _ if instruction.is_swap() => {
                self.stack.swap_with_top(instruction.dup_or_swap_position());
                Ok(InstructionResult::Ok)
            }
            _ if instruction.is_log() => {
                let offset = self.stack.pop_back();
                let size = self.stack.pop_back();
                let topics: Vec<H256> = (0..instruction.log_topics())
                    .map(|_| BigEndianHash::from_uint(&self.stack.pop_back()))
                    .collect();
                let data = self
                    .mem
                    .read_slice(offset.low_u64() as usize, size.low_u64() as usize)
                    .to_vec();
                ext.log(topics, &data)?;
                Ok(InstructionResult::Ok)
            }
            _ => Err(vm::Error::BadInstruction {
                instruction: instruction as u8,
            }),
        }
    }

    /// Credit gas a child CALL/CREATE did not spend back into this frame's
    /// counter. Only meaningful on the synchronous-completion path taken by
    /// `resolve_create`/`resolve_call`; the suspended path adds it back via
    /// `InstructionResult::UnusedGas` instead, in `step_inner`.
    fn refund_gas(&mut self, gas_left: U256) {
        if let Some(gasometer) = self.gasometer.as_mut() {
            if let Ok(refund) = Cost::from_u256(gas_left) {
                gasometer.current_gas = gasometer.current_gas + refund;
            }
        }
    }

    fn resolve_create(&mut self, result: ContractCreateResult) {
        match result {
            ContractCreateResult::Created(address, gas_left) => {
                self.stack.push(address_to_u256(address));
                self.refund_gas(gas_left);
            }
            ContractCreateResult::Reverted(gas_left, data) => {
                self.stack.push(U256::zero());
                self.return_data = data;
                self.refund_gas(gas_left);
            }
            ContractCreateResult::Failed => {
                self.stack.push(U256::zero());
            }
        }
    }

    fn resolve_call(&mut self, result: MessageCallResult) {
        let (out_off, out_size) = self.resume_output_range.take().unwrap_or((U256::zero(), U256::zero()));
        match result {
            MessageCallResult::Success(gas_left, data) => {
                let output = self.mem.writeable_slice(out_off, out_size);
                let len = cmp::min(output.len(), data.len());
                output[..len].copy_from_slice(&data[..len]);
                self.return_data = data;
                self.stack.push(U256::one());
                self.refund_gas(gas_left);
            }
            MessageCallResult::Reverted(gas_left, data) => {
                let output = self.mem.writeable_slice(out_off, out_size);
                let len = cmp::min(output.len(), data.len());
                output[..len].copy_from_slice(&data[..len]);
                self.return_data = data;
                self.stack.push(U256::zero());
                self.refund_gas(gas_left);
            }
            MessageCallResult::Failed => {
                self.stack.push(U256::zero());
            }
        }
    }

    fn copy_into_memory(&mut self, source: Vec<u8>) {
        let dest_offset = self.stack.pop_back().low_u64() as usize;
        let source_offset = self.stack.pop_back().low_u64() as usize;
        let size = self.stack.pop_back().low_u64() as usize;
        let mut slice = vec![0u8; size];
        for (i, byte) in slice.iter_mut().enumerate() {
            if let Some(b) = source.get(source_offset + i) {
                *byte = *b;
            }
        }
        self.mem.write_slice(dest_offset, &slice);
    }

    fn binop(&mut self, f: impl Fn(U256, U256) -> U256) -> vm::Result<InstructionResult<Cost>> {
        let a = self.stack.pop_back();
        let b = self.stack.pop_back();
        self.stack.push(f(a, b));
        Ok(InstructionResult::Ok)
    }

    fn triop(&mut self, f: impl Fn(U256, U256, U256) -> U256) -> vm::Result<InstructionResult<Cost>> {
        let a = self.stack.pop_back();
        let b = self.stack.pop_back();
        let c = self.stack.pop_back();
        self.stack.push(f(a, b, c));
        Ok(InstructionResult::Ok)
    }

    fn unop(&mut self, f: impl Fn(U256) -> U256) -> vm::Result<InstructionResult<Cost>> {
        let a = self.stack.pop_back();
        self.stack.push(f(a));
        Ok(InstructionResult::Ok)
    }
}

fn bool_to_u256(b: bool) -> U256 {
    if b {
        U256::one()
    } else {
        U256::zero()
    }
}

fn is_negative(v: U256) -> bool {
    v.bit(255)
}

fn two_complement(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

fn signed_lt(a: U256, b: U256) -> bool {
    let an = is_negative(a);
    let bn = is_negative(b);
    if an != bn {
        an
    } else {
        a < b
    }
}

fn signed_div(a: U256, b: U256) -> U256 {
    let min = U256::one() << 255;
    if b.is_zero() {
        U256::zero()
    } else if a == min && b == U256::max_value() {
        min
    } else {
        let a_neg = is_negative(a);
        let b_neg = is_negative(b);
        let a_abs = if a_neg { two_complement(a) } else { a };
        let b_abs = if b_neg { two_complement(b) } else { b };
        let result = a_abs / b_abs;
        if a_neg != b_neg {
            two_complement(result)
        } else {
            result
        }
    }
}

fn signed_mod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        let a_neg = is_negative(a);
        let b_neg = is_negative(b);
        let a_abs = if a_neg { two_complement(a) } else { a };
        let b_abs = if b_neg { two_complement(b) } else { b };
        let result = a_abs % b_abs;
        if a_neg {
            two_complement(result)
        } else {
            result
        }
    }
}

fn to_biguint(x: U256) -> BigUint {
    let mut bytes = [0u8; 32];
    x.to_little_endian(&mut bytes);
    BigUint::from_bytes_le(&bytes)
}

fn from_biguint(x: BigUint) -> U256 {
    let bytes = x.to_bytes_le();
    U256::from_little_endian(&bytes)
}

fn mod_pow_2_256(base: BigUint, exp: BigUint) -> BigUint {
    let modulus = BigUint::from(1u8) << 256;
    base.modpow(&exp, &modulus)
}

fn u256_to_address(value: &U256) -> Address {
    let addr: H256 = BigEndianHash::from_uint(value);
    Address::from(addr)
}

fn address_to_u256(value: Address) -> U256 {
    H256::from(value).into_uint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hex::FromHex;
    use std::sync::Arc as StdArc;
    use vm::{Ext, Exec};

    struct NullExt {
        schedule: Schedule,
        env_info: vm::EnvInfo,
        storage: std::collections::HashMap<H256, H256>,
    }

    impl Ext for NullExt {
        fn storage_at(&self, key: &H256) -> vm::Result<H256> {
            Ok(*self.storage.get(key).unwrap_or(&H256::zero()))
        }
        fn set_storage(&mut self, key: H256, value: H256) -> vm::Result<()> {
            self.storage.insert(key, value);
            Ok(())
        }
        fn add_sstore_refund(&mut self, _refund: usize) {}
        fn exists(&self, _address: &Address) -> vm::Result<bool> {
            Ok(false)
        }
        fn exists_and_not_null(&self, _address: &Address) -> vm::Result<bool> {
            Ok(false)
        }
        fn balance(&self, _address: &Address) -> vm::Result<U256> {
            Ok(U256::zero())
        }
        fn sha3(&self, data: &[u8]) -> H256 {
            keccak_hash::keccak(data)
        }
        fn blockhash(&mut self, _number: &U256) -> H256 {
            H256::zero()
        }
        fn create(
            &mut self,
            _gas: &U256,
            _value: &U256,
            _code: &[u8],
            _address_scheme: CreateContractAddress,
            _trap: bool,
        ) -> Result<ContractCreateResult, TrapKind> {
            Ok(ContractCreateResult::Failed)
        }
        fn call(
            &mut self,
            _gas: &U256,
            _sender_address: &Address,
            _receive_address: &Address,
            _value: Option<U256>,
            _data: &[u8],
            _code_address: &Address,
            _call_type: CallType,
            _trap: bool,
        ) -> Result<MessageCallResult, TrapKind> {
            Ok(MessageCallResult::Failed)
        }
        fn extcodesize(&self, _address: &Address) -> vm::Result<Option<usize>> {
            Ok(Some(0))
        }
        fn extcode(&self, _address: &Address) -> vm::Result<Option<StdArc<Vec<u8>>>> {
            Ok(None)
        }
        fn log(&mut self, _topics: Vec<H256>, _data: &[u8]) -> vm::Result<()> {
            Ok(())
        }
        fn suicide(&mut self, _refund_address: &Address) -> vm::Result<()> {
            Ok(())
        }
        fn schedule(&self) -> &Schedule {
            &self.schedule
        }
        fn env_info(&self) -> &vm::EnvInfo {
            &self.env_info
        }
        fn depth(&self) -> usize {
            0
        }
        fn is_static(&self) -> bool {
            false
        }
    }

    fn run(code: Vec<u8>, gas: u64) -> vm::Result<GasLeft> {
        let mut params = ActionParams::new();
        params.gas = U256::from(gas);
        params.code = Some(StdArc::new(code));
        params.params_type = ParamsType::Separate;
        let schedule = Schedule::new_homestead();
        let cache = StdArc::new(SharedCache::default());
        let interpreter: Box<Interpreter<u64>> = Box::new(Interpreter::new(params, cache, &schedule, 0));
        let mut ext = NullExt {
            schedule,
            env_info: vm::EnvInfo::default(),
            storage: std::collections::HashMap::new(),
        };
        match interpreter.exec(&mut ext) {
            Ok(result) => result,
            Err(_) => panic!("test code must not trap"),
        }
    }

    #[test]
    fn add_and_return() {
        // PUSH1 2, PUSH1 3, ADD, PUSH1 0, MSTORE, PUSH1 0x20, PUSH1 0, RETURN
        let code: Vec<u8> = "6002600301600052602060006000f3".from_hex().unwrap();
        let result = run(code, 100_000).unwrap();
        match result {
            GasLeft::NeedsReturn { data, .. } => {
                let mut expected = [0u8; 32];
                U256::from(5).to_big_endian(&mut expected);
                assert_eq!(&data[..], &expected[..]);
            }
            _ => panic!("expected RETURN"),
        }
    }

    #[test]
    fn stop_halts_with_gas_remaining() {
        let code = vec![0x00];
        let result = run(code, 100_000).unwrap();
        match result {
            GasLeft::Known(gas) => assert_eq!(gas, U256::from(100_000)),
            _ => panic!("expected STOP"),
        }
    }

    #[test]
    fn sstore_then_sload_round_trips() {
        // PUSH1 42, PUSH1 0, SSTORE, PUSH1 0, SLOAD, PUSH1 0, MSTORE, PUSH1 0x20, PUSH1 0, RETURN
        let code: Vec<u8> = "602a600055600054600052602060006000f3".from_hex().unwrap();
        let result = run(code, 100_000).unwrap();
        match result {
            GasLeft::NeedsReturn { data, .. } => {
                let mut expected = [0u8; 32];
                U256::from(42).to_big_endian(&mut expected);
                assert_eq!(&data[..], &expected[..]);
            }
            _ => panic!("expected RETURN"),
        }
    }
}
