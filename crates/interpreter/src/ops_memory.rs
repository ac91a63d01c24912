//! Stack/memory manipulation, storage, control flow, and logging opcodes.

use crate::errors::VMError;
use crate::frame::{Computation, ControlFlow};
use crate::opcode;
use crate::util::u256_to_b256;
use alloy_primitives::U256;
use ward_primitives::log::Log;

pub fn op_pop(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.pop()?;
    Ok(ControlFlow::Continue)
}

pub fn op_mload(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let offset = comp.stack.pop()?.to::<usize>();
    let expansion = comp.memory.extend(offset, 32);
    comp.gas.consume_gas(expansion)?;
    let mut word = [0u8; 32];
    word.copy_from_slice(comp.memory.read(offset, 32));
    comp.stack.push(U256::from_be_bytes(word))?;
    Ok(ControlFlow::Continue)
}

pub fn op_mstore(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let offset = comp.stack.pop()?.to::<usize>();
    let value = comp.stack.pop()?;
    let expansion = comp.memory.extend(offset, 32);
    comp.gas.consume_gas(expansion)?;
    comp.memory.write(offset, &value.to_be_bytes::<32>());
    Ok(ControlFlow::Continue)
}

pub fn op_mstore8(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let offset = comp.stack.pop()?.to::<usize>();
    let value = comp.stack.pop()?;
    let expansion = comp.memory.extend(offset, 1);
    comp.gas.consume_gas(expansion)?;
    comp.memory.write(offset, &[value.to_be_bytes::<32>()[31]]);
    Ok(ControlFlow::Continue)
}

pub fn op_sload(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let slot = u256_to_b256(comp.stack.pop()?);
    if comp.ctx.fork.is_at_least(ward_forks::Fork::Berlin) {
        let was_warm = comp.state.mark_storage_warm(comp.address, slot);
        let cost = if was_warm {
            comp.ctx.gas_schedule.warm_storage_read_cost
        } else {
            comp.ctx.gas_schedule.cold_sload_cost
        };
        comp.gas.consume_gas(cost)?;
    } else {
        comp.gas.consume_gas(comp.ctx.gas_schedule.sload_cost)?;
    }
    let value = comp.state.get_storage(comp.address, slot);
    comp.stack.push(value)?;
    Ok(ControlFlow::Continue)
}

/// Whether EIP-1283/EIP-2200 "net" gas metering (cost keyed off
/// `original`, not just `current`) is active: Constantinople had it,
/// Petersburg reverted it, Istanbul+ brought it back for good.
fn net_metering_active(fork: ward_forks::Fork) -> bool {
    use ward_forks::Fork;
    fork == Fork::Constantinople || fork.is_at_least(Fork::Istanbul)
}

/// `SSTORE`'s EIP-2200/EIP-2929 cost and refund accounting, falling back to
/// the flat pre-net-metering cost model on forks that never saw EIP-1283.
pub fn op_sstore(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    if comp.ctx.gas_schedule.sstore_sentry_gas > 0
        && comp.gas.gas_remaining() <= comp.ctx.gas_schedule.sstore_sentry_gas
    {
        return Err(VMError::OutOfGas);
    }

    let slot = u256_to_b256(comp.stack.pop()?);
    let new_value = comp.stack.pop()?;

    let mut cold_surcharge = 0;
    if comp.ctx.fork.is_at_least(ward_forks::Fork::Berlin) {
        let was_warm = comp.state.mark_storage_warm(comp.address, slot);
        if !was_warm {
            cold_surcharge = comp.ctx.gas_schedule.cold_sload_cost;
        }
    }

    let current = comp.state.get_storage(comp.address, slot);
    let schedule = comp.ctx.gas_schedule;

    if !net_metering_active(comp.ctx.fork) {
        let base_cost = if current.is_zero() && !new_value.is_zero() {
            schedule.sstore_set_cost
        } else {
            schedule.sstore_reset_cost
        };
        comp.gas.consume_gas(base_cost + cold_surcharge)?;
        if !current.is_zero() && new_value.is_zero() {
            comp.gas.refund_gas(schedule.sstore_clear_refund as i64);
        }
        comp.state.set_storage(comp.address, slot, new_value);
        return Ok(ControlFlow::Continue);
    }

    let original = comp.state.get_original_storage(comp.address, slot);
    // Before Berlin there's no warm/cold split yet; a "no-op" or "dirty
    // re-write" SSTORE still costs a plain SLOAD.
    let read_equiv_cost = if comp.ctx.fork.is_at_least(ward_forks::Fork::Berlin) {
        schedule.warm_storage_read_cost
    } else {
        schedule.sload_cost
    };

    let base_cost = if current == new_value {
        read_equiv_cost
    } else if original == current {
        if original.is_zero() {
            schedule.sstore_set_cost
        } else {
            schedule.sstore_reset_cost
        }
    } else {
        read_equiv_cost
    };
    comp.gas.consume_gas(base_cost + cold_surcharge)?;

    if current != new_value {
        if original == current {
            if !original.is_zero() && new_value.is_zero() {
                comp.gas.refund_gas(schedule.sstore_clear_refund as i64);
            }
        } else {
            if !original.is_zero() {
                if current.is_zero() {
                    comp.gas.refund_gas(-(schedule.sstore_clear_refund as i64));
                } else if new_value.is_zero() {
                    comp.gas.refund_gas(schedule.sstore_clear_refund as i64);
                }
            }
            if original == new_value {
                let refund = if original.is_zero() {
                    schedule.sstore_set_cost - read_equiv_cost
                } else {
                    schedule.sstore_reset_cost - read_equiv_cost
                };
                comp.gas.refund_gas(refund as i64);
            }
        }
    }

    comp.state.set_storage(comp.address, slot, new_value);
    Ok(ControlFlow::Continue)
}

pub fn op_jump(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let dest = comp.stack.pop()?.to::<usize>();
    Ok(ControlFlow::Jump(dest))
}

pub fn op_jumpi(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let dest = comp.stack.pop()?.to::<usize>();
    let cond = comp.stack.pop()?;
    if cond.is_zero() {
        Ok(ControlFlow::Continue)
    } else {
        Ok(ControlFlow::Jump(dest))
    }
}

pub fn op_pc(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.pc))?;
    Ok(ControlFlow::Continue)
}

pub fn op_msize(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.memory.len()))?;
    Ok(ControlFlow::Continue)
}

pub fn op_gas(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.gas.gas_remaining()))?;
    Ok(ControlFlow::Continue)
}

pub fn op_jumpdest(_comp: &mut Computation) -> Result<ControlFlow, VMError> {
    Ok(ControlFlow::Continue)
}

pub fn op_tload(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let slot = u256_to_b256(comp.stack.pop()?);
    let value = comp.state.get_transient_storage(comp.address, slot);
    comp.stack.push(value)?;
    Ok(ControlFlow::Continue)
}

pub fn op_tstore(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let slot = u256_to_b256(comp.stack.pop()?);
    let value = comp.stack.pop()?;
    comp.state.set_transient_storage(comp.address, slot, value);
    Ok(ControlFlow::Continue)
}

pub fn op_mcopy(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let dest_offset = comp.stack.pop()?.to::<usize>();
    let src_offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let expansion = comp.memory.extend(dest_offset.max(src_offset), size);
    comp.gas.consume_gas(expansion)?;
    let words = (size as u64 + 31) / 32;
    comp.gas.consume_gas(3 * words)?;
    let data = comp.memory.read(src_offset, size).to_vec();
    comp.memory.write(dest_offset, &data);
    Ok(ControlFlow::Continue)
}

pub fn op_push0(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::ZERO)?;
    Ok(ControlFlow::Continue)
}

pub fn op_push(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let op = comp.code.opcode_at(comp.pc).expect("dispatched on this opcode");
    let data_len = opcode::push_data_len(op);
    let mut bytes = [0u8; 32];
    for i in 0..data_len {
        bytes[32 - data_len + i] = comp.code.opcode_at(comp.pc + 1 + i).unwrap_or(0);
    }
    comp.stack.push(U256::from_be_bytes(bytes))?;
    comp.pc += data_len;
    Ok(ControlFlow::Continue)
}

pub fn op_dup(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let op = comp.code.opcode_at(comp.pc).expect("dispatched on this opcode");
    comp.stack.dup(opcode::dup_depth(op))?;
    Ok(ControlFlow::Continue)
}

pub fn op_swap(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let op = comp.code.opcode_at(comp.pc).expect("dispatched on this opcode");
    comp.stack.swap(opcode::swap_depth(op))?;
    Ok(ControlFlow::Continue)
}

pub fn op_log(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let op = comp.code.opcode_at(comp.pc).expect("dispatched on this opcode");
    let topic_count = opcode::log_topic_count(op);

    let offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        topics.push(u256_to_b256(comp.stack.pop()?));
    }

    let expansion = comp.memory.extend(offset, size);
    comp.gas.consume_gas(expansion)?;
    let schedule = &comp.ctx.gas_schedule;
    let cost = schedule.log_cost + schedule.log_topic_cost * topic_count as u64 + schedule.log_data_cost * size as u64;
    comp.gas.consume_gas(cost)?;

    let data = comp.memory.read(offset, size).to_vec();
    comp.logs.push(Log { address: comp.address, topics, data: data.into() });
    Ok(ControlFlow::Continue)
}
