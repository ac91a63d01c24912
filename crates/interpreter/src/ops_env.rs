//! Environment and block-context opcodes.

use crate::errors::VMError;
use crate::frame::{Computation, ControlFlow};
use alloy_primitives::{Address, B256, U256};

fn push_address(comp: &mut Computation, address: Address) -> Result<ControlFlow, VMError> {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    comp.stack.push(U256::from_be_bytes(word))?;
    Ok(ControlFlow::Continue)
}

fn pop_address(comp: &mut Computation) -> Result<Address, VMError> {
    let value = comp.stack.pop()?;
    Ok(Address::from_slice(&value.to_be_bytes::<32>()[12..]))
}

/// Charges the cold/warm access cost for touching `address`, returning the
/// additional gas charged beyond the opcode's static tier (0 if warm, or if
/// the fork predates EIP-2929 and already charged a flat cost statically).
fn charge_address_access(comp: &mut Computation, address: Address) -> Result<(), VMError> {
    if !comp.ctx.fork.is_at_least(ward_forks::Fork::Berlin) {
        return Ok(());
    }
    let was_warm = comp.state.mark_address_warm(address);
    let cost = if was_warm {
        comp.ctx.gas_schedule.warm_storage_read_cost
    } else {
        comp.ctx.gas_schedule.cold_account_access_cost
    };
    comp.gas.consume_gas(cost)
}

pub fn op_address(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    push_address(comp, comp.address)
}

pub fn op_balance(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let address = pop_address(comp)?;
    charge_address_access(comp, address)?;
    let balance = comp.state.get_balance(address);
    comp.stack.push(balance)?;
    Ok(ControlFlow::Continue)
}

pub fn op_origin(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    push_address(comp, comp.ctx.origin)
}

pub fn op_caller(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    push_address(comp, comp.caller)
}

pub fn op_callvalue(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(comp.value)?;
    Ok(ControlFlow::Continue)
}

pub fn op_calldataload(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let offset = comp.stack.pop()?.to::<usize>();
    let mut word = [0u8; 32];
    for i in 0..32 {
        if let Some(byte) = comp.input.get(offset.saturating_add(i)) {
            word[i] = *byte;
        }
    }
    comp.stack.push(U256::from_be_bytes(word))?;
    Ok(ControlFlow::Continue)
}

pub fn op_calldatasize(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.input.len()))?;
    Ok(ControlFlow::Continue)
}

fn copy_to_memory(comp: &mut Computation, source: &[u8], dest_offset: usize, src_offset: usize, size: usize) -> Result<(), VMError> {
    let expansion = comp.memory.extend(dest_offset, size);
    comp.gas.consume_gas(expansion)?;
    let words = (size as u64 + 31) / 32;
    comp.gas.consume_gas(3 * words)?;
    let mut buf = vec![0u8; size];
    for i in 0..size {
        if let Some(byte) = source.get(src_offset.saturating_add(i)) {
            buf[i] = *byte;
        }
    }
    comp.memory.write(dest_offset, &buf);
    Ok(())
}

pub fn op_calldatacopy(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let dest_offset = comp.stack.pop()?.to::<usize>();
    let src_offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let input = comp.input.clone();
    copy_to_memory(comp, &input, dest_offset, src_offset, size)?;
    Ok(ControlFlow::Continue)
}

pub fn op_codesize(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.code.len()))?;
    Ok(ControlFlow::Continue)
}

pub fn op_codecopy(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let dest_offset = comp.stack.pop()?.to::<usize>();
    let src_offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let code = comp.code.code().to_vec();
    copy_to_memory(comp, &code, dest_offset, src_offset, size)?;
    Ok(ControlFlow::Continue)
}

pub fn op_gasprice(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(comp.ctx.gas_price)?;
    Ok(ControlFlow::Continue)
}

pub fn op_extcodesize(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let address = pop_address(comp)?;
    charge_address_access(comp, address)?;
    comp.stack.push(U256::from(comp.state.get_code(address).len()))?;
    Ok(ControlFlow::Continue)
}

pub fn op_extcodecopy(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let address = pop_address(comp)?;
    charge_address_access(comp, address)?;
    let dest_offset = comp.stack.pop()?.to::<usize>();
    let src_offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let code = comp.state.get_code(address);
    copy_to_memory(comp, &code, dest_offset, src_offset, size)?;
    Ok(ControlFlow::Continue)
}

pub fn op_returndatasize(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.return_data.len()))?;
    Ok(ControlFlow::Continue)
}

pub fn op_returndatacopy(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let dest_offset = comp.stack.pop()?.to::<usize>();
    let src_offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    if src_offset.saturating_add(size) > comp.return_data.len() {
        return Err(VMError::OutOfBoundsRead);
    }
    let data = comp.return_data.clone();
    copy_to_memory(comp, &data, dest_offset, src_offset, size)?;
    Ok(ControlFlow::Continue)
}

pub fn op_extcodehash(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let address = pop_address(comp)?;
    charge_address_access(comp, address)?;
    let hash = if comp.state.account_exists(address) {
        comp.state.get_code_hash(address)
    } else {
        B256::ZERO
    };
    comp.stack.push(U256::from_be_bytes(hash.0))?;
    Ok(ControlFlow::Continue)
}

pub fn op_blockhash(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let number = comp.stack.pop()?.to::<u64>();
    let hash = comp.ctx.block_hash(number);
    comp.stack.push(U256::from_be_bytes(hash.0))?;
    Ok(ControlFlow::Continue)
}

pub fn op_coinbase(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    push_address(comp, comp.ctx.coinbase)
}

pub fn op_timestamp(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.ctx.timestamp))?;
    Ok(ControlFlow::Continue)
}

pub fn op_number(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.ctx.block_number))?;
    Ok(ControlFlow::Continue)
}

pub fn op_difficulty(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(comp.ctx.difficulty_or_prevrandao)?;
    Ok(ControlFlow::Continue)
}

pub fn op_gaslimit(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.ctx.block_gas_limit))?;
    Ok(ControlFlow::Continue)
}

pub fn op_chainid(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(U256::from(comp.ctx.chain_id))?;
    Ok(ControlFlow::Continue)
}

pub fn op_selfbalance(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let balance = comp.state.get_balance(comp.address);
    comp.stack.push(balance)?;
    Ok(ControlFlow::Continue)
}

pub fn op_basefee(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(comp.ctx.base_fee_per_gas)?;
    Ok(ControlFlow::Continue)
}

pub fn op_blobhash(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let index = comp.stack.pop()?.to::<usize>();
    let hash = comp.ctx.blob_hash(index);
    comp.stack.push(U256::from_be_bytes(hash.0))?;
    Ok(ControlFlow::Continue)
}

pub fn op_blobbasefee(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    comp.stack.push(comp.ctx.blob_base_fee)?;
    Ok(ControlFlow::Continue)
}
