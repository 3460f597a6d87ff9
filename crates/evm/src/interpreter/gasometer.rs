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

//! Per-instruction gas accounting (§4.1 GasMeter).

use ethereum_types::{BigEndianHash, U256};
use vm::Schedule;

use super::stack::Stack;
use crate::cost::CostType;
use crate::instructions::{Instruction, InstructionInfo};

/// What an instruction costs to execute, computed before it runs.
pub struct InstructionRequirements<Gas> {
    pub gas_cost: Gas,
    /// Gas to forward into a CALL/CREATE, if this is one.
    pub provide_gas: Option<Gas>,
    pub memory_required_size: usize,
    pub memory_total_gas: Gas,
}

/// Tracks gas remaining and the memory-expansion cost charged so far, so
/// that `requirements` only ever charges the *delta* in memory cost.
pub struct Gasometer<Gas> {
    pub current_gas: Gas,
    pub current_mem_gas: Gas,
    current_mem_words: usize,
}

impl<Gas: CostType> Gasometer<Gas> {
    pub fn new(current_gas: Gas) -> Self {
        Gasometer {
            current_gas,
            current_mem_gas: zero(),
            current_mem_words: 0,
        }
    }

    /// `OutOfGas` unless `current_gas >= cost`.
    pub fn verify_gas(&self, cost: &Gas) -> vm::Result<()> {
        if &self.current_gas < cost {
            Err(vm::Error::OutOfGas)
        } else {
            Ok(())
        }
    }

    fn mem_gas_cost(&mut self, size_in_bytes: usize) -> (Gas, usize, Gas) {
        let (delta, new_words) =
            super::memory::expansion_gas_cost::<Gas>(self.current_mem_words, size_in_bytes);
        let new_total = self.current_mem_gas + delta;
        (delta, new_words, new_total)
    }

    /// Compute gas cost, memory growth, and (for CALL/CREATE) gas to forward,
    /// for one instruction about to execute.
    pub fn requirements(
        &mut self,
        ext: &dyn vm::Ext,
        instruction: Instruction,
        _info: &InstructionInfo,
        stack: &dyn Stack<U256>,
        current_mem_size: usize,
    ) -> vm::Result<InstructionRequirements<Gas>> {
        use Instruction::*;
        let schedule = ext.schedule();
        let g = |n: usize| from_usize::<Gas>(n);

        let default_gas = g(schedule.tier_step_gas[tier(instruction)]);
        let mut gas = default_gas;
        let mut mem_required = current_mem_size;
        let mut provide_gas = None;

        match instruction {
            SELFDESTRUCT => {
                gas = g(schedule.suicide_gas);
                let refund_address_is_new = !ext.exists(&address_from_word(*stack.peek(0)))?;
                if refund_address_is_new && schedule.suicide_to_new_account_cost > 0 {
                    gas = gas + g(schedule.suicide_to_new_account_cost);
                }
            }
            SSTORE => {
                let address = BigEndianHash::from_uint(stack.peek(0));
                let newval = *stack.peek(1);
                let current = ext.storage_at(&address)?.into_uint();
                gas = if current.is_zero() && !newval.is_zero() {
                    g(schedule.sstore_set_gas)
                } else {
                    g(schedule.sstore_reset_gas)
                };
            }
            SLOAD => gas = g(schedule.sload_gas),
            EXTCODESIZE => gas = g(schedule.extcodesize_gas),
            BALANCE => gas = g(schedule.balance_gas),
            SHA3 => {
                let words = to_words(stack.peek(1).low_u64() as usize);
                gas = g(schedule.sha3_gas) + g(schedule.sha3_word_gas * words);
                mem_required = mem_range(*stack.peek(0), *stack.peek(1));
            }
            CALLDATACOPY | CODECOPY => {
                let words = to_words(stack.peek(2).low_u64() as usize);
                gas = default_gas + g(schedule.copy_gas * words);
                mem_required = mem_range(*stack.peek(0), *stack.peek(2));
            }
            EXTCODECOPY => {
                let words = to_words(stack.peek(3).low_u64() as usize);
                gas = g(schedule.extcodecopy_base_gas) + g(schedule.copy_gas * words);
                mem_required = mem_range(*stack.peek(1), *stack.peek(3));
            }
            LOG0 | LOG1 | LOG2 | LOG3 | LOG4 => {
                let topics = instruction.log_topics();
                let data_len = stack.peek(1).low_u64() as usize;
                gas = g(schedule.log_gas)
                    + g(schedule.log_topic_gas * topics)
                    + g(schedule.log_data_gas) * g(data_len);
                mem_required = mem_range(*stack.peek(0), *stack.peek(1));
            }
            EXP => {
                let exponent = *stack.peek(1);
                let bytes = 32 - (exponent.leading_zeros() as usize) / 8;
                let bytes = if exponent.is_zero() { 0 } else { bytes };
                gas = g(schedule.exp_gas) + g(schedule.exp_byte_gas * bytes);
            }
            MLOAD | MSTORE => mem_required = stack.peek(0).low_u64() as usize + 32,
            MSTORE8 => mem_required = stack.peek(0).low_u64() as usize + 1,
            JUMPDEST => gas = g(schedule.jumpdest_gas),
            CREATE => {
                gas = g(schedule.create_gas);
                mem_required = mem_range(*stack.peek(1), *stack.peek(2));
            }
            CALL | CALLCODE | DELEGATECALL => {
                let value_idx = if instruction == DELEGATECALL { None } else { Some(2) };
                gas = g(schedule.call_gas);
                if let Some(idx) = value_idx {
                    if !stack.peek(idx).is_zero() {
                        gas = gas + g(schedule.call_value_transfer_gas);
                        let dest = address_from_word(*stack.peek(1));
                        if !ext.exists(&dest)? {
                            gas = gas + g(schedule.call_new_account_gas);
                        }
                    }
                }
                let (in_off, in_size, out_off, out_size) = if instruction == DELEGATECALL {
                    (*stack.peek(2), *stack.peek(3), *stack.peek(4), *stack.peek(5))
                } else {
                    (*stack.peek(3), *stack.peek(4), *stack.peek(5), *stack.peek(6))
                };
                mem_required = mem_range(in_off, in_size).max(mem_range(out_off, out_size));
            }
            _ => {}
        }

        let (mem_delta, new_words, mem_total) = self.mem_gas_cost(mem_required);
        self.current_mem_words = new_words;

        // CREATE/CALL forward part of what remains *after* this opcode's own
        // base and memory-expansion cost are deducted, so the 63/64 cap is
        // computed against the gas actually still available once those are paid.
        // `charge_gas` is what this frame is actually debited for providing
        // the child its budget; the value-transfer stipend is added only to
        // `provide_gas` (what the child receives), never to the parent's own
        // deduction, so it does not inflate the caller's own gas requirement.
        let mut charge_gas = None;
        match instruction {
            CREATE => {
                let available = self.current_gas - gas - mem_delta;
                let capped = sub_gas_cap(schedule, available);
                provide_gas = Some(capped);
                charge_gas = Some(capped);
            }
            CALL | CALLCODE | DELEGATECALL => {
                let transfers_value = instruction != DELEGATECALL && !stack.peek(2).is_zero();
                let available = self.current_gas - gas - mem_delta;
                let capped = sub_gas_cap(schedule, available);
                let requested = *stack.peek(0);
                let forwarded = Gas::from_u256(requested).unwrap_or(capped);
                let provided = if forwarded < capped { forwarded } else { capped };
                charge_gas = Some(provided);
                provide_gas = Some(if transfers_value {
                    provided + g(schedule.call_stipend)
                } else {
                    provided
                });
            }
            _ => {}
        }

        // The gas forwarded to a child CALL/CREATE leaves this frame's budget
        // for the duration of the child's execution; whatever it doesn't use
        // comes back as `InstructionResult::UnusedGas` on resume.
        let total_cost = match charge_gas {
            Some(c) => gas + mem_delta + c,
            None => gas + mem_delta,
        };

        Ok(InstructionRequirements {
            gas_cost: total_cost,
            provide_gas,
            memory_required_size: mem_required,
            memory_total_gas: mem_total,
        })
    }
}

/// Index into `schedule.tier_step_gas` for instructions priced by tier
/// alone (Yellow Paper Appendix H): Zero, Base, VeryLow, Low, Mid, High.
/// Instructions with their own dedicated schedule field (SLOAD, SSTORE,
/// BALANCE, SHA3, the CALL/CREATE family, ...) are priced in the match
/// above instead and never consult this table.
fn tier(instruction: Instruction) -> usize {
    use Instruction::*;
    match instruction {
        STOP | RETURN => 0,
        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE | COINBASE
        | TIMESTAMP | NUMBER | DIFFICULTY | GASLIMIT | POP | PC | MSIZE | GAS => 1,
        ADD | SUB | NOT | LT | GT | SLT | SGT | EQ | ISZERO | AND | OR | XOR | BYTE
        | CALLDATALOAD | MLOAD | MSTORE | MSTORE8 | CALLDATACOPY | CODECOPY => 2,
        MUL | DIV | SDIV | MOD | SMOD | SIGNEXTEND => 3,
        ADDMOD | MULMOD | JUMP => 4,
        JUMPI => 5,
        _ if instruction.is_push() || instruction.is_dup() || instruction.is_swap() => 2,
        _ => 1,
    }
}

fn zero<Gas: CostType>() -> Gas {
    Gas::from_u256(U256::zero()).unwrap_or_else(|_| unreachable!())
}

fn from_usize<Gas: CostType>(n: usize) -> Gas {
    Gas::from_u256(U256::from(n)).unwrap_or_else(|_| unreachable!())
}

fn to_words(size: usize) -> usize {
    if size == 0 {
        0
    } else {
        (size + 31) / 32
    }
}

fn mem_range(offset: U256, size: U256) -> usize {
    if size.is_zero() {
        0
    } else {
        (offset.low_u64() + size.low_u64()) as usize
    }
}

fn address_from_word(word: U256) -> ethereum_types::Address {
    let hash: ethereum_types::H256 = BigEndianHash::from_uint(&word);
    ethereum_types::Address::from(hash)
}

/// The "63/64 rule": `gas - gas/64` (§4.1, §9 Design Notes), applied
/// whenever `schedule.sub_gas_cap_divisor` is set.
fn sub_gas_cap<Gas: CostType>(schedule: &Schedule, gas: Gas) -> Gas {
    match schedule.sub_gas_cap_divisor {
        Some(divisor) => {
            let divisor = from_usize::<Gas>(divisor);
            gas - gas / divisor
        }
        None => gas,
    }
}
