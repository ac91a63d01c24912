//! `CREATE`/`CALL` family, halting opcodes, and `SELFDESTRUCT`.
//!
//! These are the opcodes that spawn or end a [`Computation`]; everything
//! else in `ops_*` only ever touches its own frame.

use crate::errors::VMError;
use crate::frame::{CallKind, Computation, ComputationResult, ControlFlow, MAX_CALL_DEPTH};
use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_rlp::Encodable;
use std::collections::HashSet;

/// Maximum deployed contract code size (EIP-170), shared with the top-level
/// contract-creation transaction path.
pub const MAX_CODE_SIZE: usize = 24_576;
const MAX_INITCODE_SIZE: usize = 2 * MAX_CODE_SIZE;
/// Leading byte EIP-3541 rejects on newly deployed code, from London on.
pub const RESERVED_CODE_PREFIX: u8 = 0xEF;

fn pop_address(comp: &mut Computation) -> Result<Address, VMError> {
    let value = comp.stack.pop()?;
    Ok(Address::from_slice(&value.to_be_bytes::<32>()[12..]))
}

fn read_memory_range(comp: &mut Computation, offset: usize, size: usize) -> Result<Bytes, VMError> {
    let expansion = comp.memory.extend(offset, size);
    comp.gas.consume_gas(expansion)?;
    Ok(comp.memory.read(offset, size).to_vec().into())
}

fn rlp_list2(a: &impl Encodable, b: &impl Encodable) -> Vec<u8> {
    let mut payload = Vec::new();
    a.encode(&mut payload);
    b.encode(&mut payload);
    let header = alloy_rlp::Header { list: true, payload_length: payload.len() };
    let mut out = Vec::with_capacity(header.length() + payload.len());
    header.encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

/// `CREATE`'s address: `keccak256(rlp([sender, nonce]))[12..]`. Also used by
/// the transaction executor for a top-level contract-creation transaction,
/// which derives its new address the same way, from the sender's
/// pre-transaction nonce.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    let rlp = rlp_list2(&sender, &nonce);
    let hash = keccak256(&rlp);
    Address::from_slice(&hash[12..])
}

/// `CREATE2`'s address: `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`.
fn create2_address(sender: Address, salt: U256, init_code: &[u8]) -> Address {
    let code_hash = keccak256(init_code);
    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(sender.as_slice());
    preimage.extend_from_slice(&salt.to_be_bytes::<32>());
    preimage.extend_from_slice(code_hash.as_slice());
    let hash = keccak256(&preimage);
    Address::from_slice(&hash[12..])
}

fn charge_initcode_cost(comp: &mut Computation, init_code: &[u8]) -> Result<(), VMError> {
    if comp.ctx.fork.is_at_least(ward_forks::Fork::Shanghai) {
        if init_code.len() > MAX_INITCODE_SIZE {
            return Err(VMError::OutOfGas);
        }
        let words = (init_code.len() as u64 + 31) / 32;
        comp.gas.consume_gas(2 * words)?;
    }
    Ok(())
}

/// Transfers `value` from `comp`'s account to `to`, assuming the caller has
/// already checked `comp.state.get_balance(comp.address) >= value`.
fn transfer_value(comp: &mut Computation, to: Address, value: U256) {
    if value.is_zero() {
        return;
    }
    let sender_balance = comp.state.get_balance(comp.address);
    comp.state.set_balance(comp.address, sender_balance - value);
    let recipient_balance = comp.state.get_balance(to);
    comp.state.set_balance(to, recipient_balance + value);
}

/// Runs contract-init code as a child frame and, on success, deploys whatever
/// it returns as the new account's code. Returns `(success, gas_left,
/// gas_refunded, revert_output)`.
fn run_init_code(
    comp: &mut Computation,
    new_address: Address,
    init_code: Vec<u8>,
    value: U256,
    gas_limit: u64,
) -> (bool, u64, i64, Bytes) {
    if comp.state.account_has_code_or_nonce(new_address) {
        return (false, 0, 0, Bytes::new());
    }
    comp.state.set_nonce(new_address, 1);
    transfer_value(comp, new_address, value);

    let child = Computation::new(
        new_address,
        comp.address,
        value,
        init_code,
        Bytes::new(),
        gas_limit,
        false,
        comp.depth + 1,
        comp.state,
        comp.ctx,
    );
    let result = child.run();

    match result.error {
        None => {
            let code = result.output;
            let code_rejected = (code.first() == Some(&RESERVED_CODE_PREFIX)
                && comp.ctx.fork.is_at_least(ward_forks::Fork::London))
                || code.len() > MAX_CODE_SIZE;
            if code_rejected {
                return (false, 0, 0, Bytes::new());
            }
            let deposit_cost = comp.ctx.gas_schedule.code_deposit_cost * code.len() as u64;
            if result.gas_left < deposit_cost {
                return (false, 0, 0, Bytes::new());
            }
            comp.state.set_code(new_address, code);
            comp.logs.extend(result.logs);
            comp.accounts_to_delete.extend(result.accounts_to_delete);
            (true, result.gas_left - deposit_cost, result.gas_refunded, Bytes::new())
        }
        Some(VMError::Revert) => (false, result.gas_left, 0, result.output),
        Some(_) => (false, 0, 0, Bytes::new()),
    }
}

fn create_common(comp: &mut Computation, new_address: Address, init_code: Vec<u8>, value: U256) -> Result<ControlFlow, VMError> {
    charge_initcode_cost(comp, &init_code)?;

    if comp.depth >= MAX_CALL_DEPTH || comp.state.get_balance(comp.address) < value {
        comp.stack.push(U256::ZERO)?;
        return Ok(ControlFlow::Continue);
    }

    let available = comp.gas.gas_remaining();
    let child_gas = available - available / 64;
    comp.gas.consume_gas(child_gas)?;

    let (success, gas_left, refund, _) = run_init_code(comp, new_address, init_code, value, child_gas);
    comp.gas.return_gas(gas_left);
    comp.gas.refund_gas(refund);

    let result = if success { U256::from_be_slice(new_address.as_slice()) } else { U256::ZERO };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_create(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    if comp.is_static {
        return Err(VMError::WriteProtection);
    }
    let value = comp.stack.pop()?;
    let offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let init_code = read_memory_range(comp, offset, size)?.to_vec();

    let nonce = comp.state.get_nonce(comp.address);
    comp.state.increment_nonce(comp.address).map_err(|_| VMError::ContractCreationCollision)?;
    let new_address = create_address(comp.address, nonce);
    create_common(comp, new_address, init_code, value)
}

pub fn op_create2(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    if comp.is_static {
        return Err(VMError::WriteProtection);
    }
    let value = comp.stack.pop()?;
    let offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let salt = comp.stack.pop()?;

    let init_code = read_memory_range(comp, offset, size)?.to_vec();
    let words = (size as u64 + 31) / 32;
    comp.gas.consume_gas(6 * words)?;

    comp.state.increment_nonce(comp.address).map_err(|_| VMError::ContractCreationCollision)?;
    let new_address = create2_address(comp.address, salt, &init_code);
    create_common(comp, new_address, init_code, value)
}

fn call_kind_value(comp: &mut Computation, kind: CallKind) -> Result<U256, VMError> {
    if matches!(kind, CallKind::DelegateCall | CallKind::StaticCall) {
        Ok(U256::ZERO)
    } else {
        comp.stack.pop()
    }
}

fn is_precompile_address(address: Address, fork: ward_forks::Fork) -> bool {
    ward_precompiles::is_precompile(address, fork)
}

fn run_precompile(ctx: &crate::context::ExecutionContext<'_>, address: Address, input: &[u8], gas_limit: u64) -> ComputationResult {
    let empty = || ComputationResult {
        error: Some(VMError::OutOfGas),
        gas_left: 0,
        gas_refunded: 0,
        output: Bytes::new(),
        logs: Vec::new(),
        accounts_to_delete: HashSet::new(),
    };
    match ward_precompiles::precompile_gas_cost(address, ctx.fork, input) {
        Some(cost) if cost <= gas_limit => {
            match ward_precompiles::execute(address, input, ctx.fork, ctx.kzg_settings) {
                Ok(output) => ComputationResult {
                    error: None,
                    gas_left: gas_limit - cost,
                    gas_refunded: 0,
                    output,
                    logs: Vec::new(),
                    accounts_to_delete: HashSet::new(),
                },
                Err(_) => ComputationResult {
                    error: Some(VMError::InvalidInstruction),
                    gas_left: 0,
                    gas_refunded: 0,
                    output: Bytes::new(),
                    logs: Vec::new(),
                    accounts_to_delete: HashSet::new(),
                },
            }
        }
        _ => empty(),
    }
}

fn call_common(comp: &mut Computation, kind: CallKind) -> Result<ControlFlow, VMError> {
    let gas_requested = comp.stack.pop()?;
    let code_address = pop_address(comp)?;
    let value = call_kind_value(comp, kind)?;
    let args_offset = comp.stack.pop()?.to::<usize>();
    let args_size = comp.stack.pop()?.to::<usize>();
    let ret_offset = comp.stack.pop()?.to::<usize>();
    let ret_size = comp.stack.pop()?.to::<usize>();

    let transfers_value = !value.is_zero() && matches!(kind, CallKind::Call | CallKind::CallCode);
    if comp.is_static && transfers_value && kind == CallKind::Call {
        return Err(VMError::WriteProtection);
    }

    let was_warm = comp.state.mark_address_warm(code_address);
    let mut cost = if comp.ctx.fork.is_at_least(ward_forks::Fork::Berlin) {
        if was_warm {
            comp.ctx.gas_schedule.warm_storage_read_cost
        } else {
            comp.ctx.gas_schedule.cold_account_access_cost
        }
    } else {
        0
    };
    if transfers_value {
        cost += comp.ctx.gas_schedule.call_value_transfer_cost;
    }
    let is_new_account = kind == CallKind::Call && transfers_value && !comp.state.account_exists(code_address);
    if is_new_account {
        cost += comp.ctx.gas_schedule.new_account_cost;
    }

    let args_expansion = comp.memory.extend(args_offset, args_size);
    let ret_expansion = comp.memory.extend(ret_offset, ret_size);
    comp.gas.consume_gas(cost)?;
    comp.gas.consume_gas(args_expansion + ret_expansion)?;

    let args = comp.memory.read(args_offset, args_size).to_vec();

    let available = comp.gas.gas_remaining();
    let capped = available - available / 64;
    // The 63/64ths-capped amount is what the caller actually pays; a value
    // transfer's stipend is extra gas credited to the callee for free on top
    // of that, never charged against the caller.
    let charged_to_caller = gas_requested.min(U256::from(capped)).to::<u64>();
    let mut child_gas = charged_to_caller;
    if transfers_value {
        child_gas += comp.ctx.gas_schedule.call_value_stipend;
    }

    if comp.depth >= MAX_CALL_DEPTH
        || (matches!(kind, CallKind::Call | CallKind::CallCode) && comp.state.get_balance(comp.address) < value)
    {
        comp.stack.push(U256::ZERO)?;
        return Ok(ControlFlow::Continue);
    }
    comp.gas.consume_gas(charged_to_caller)?;

    let (exec_address, exec_caller, exec_value, is_static) = match kind {
        CallKind::Call => (code_address, comp.address, value, comp.is_static),
        CallKind::StaticCall => (code_address, comp.address, U256::ZERO, true),
        CallKind::CallCode => (comp.address, comp.address, value, comp.is_static),
        CallKind::DelegateCall => (comp.address, comp.caller, comp.value, comp.is_static),
    };

    if transfers_value {
        // CALLCODE executes in the caller's own storage context, so its value
        // transfer is to itself (a balance-sufficiency check in effect, not a
        // real movement of funds); only CALL moves value to `code_address`.
        match kind {
            CallKind::Call => transfer_value(comp, code_address, value),
            CallKind::CallCode => {
                let self_address = comp.address;
                transfer_value(comp, self_address, value);
            }
            _ => {}
        }
    }

    let result = if is_precompile_address(code_address, comp.ctx.fork) {
        run_precompile(comp.ctx, code_address, &args, child_gas)
    } else {
        let code = comp.state.get_code(exec_address).to_vec();
        let child = Computation::new(
            exec_address,
            exec_caller,
            exec_value,
            code,
            args.into(),
            child_gas,
            is_static,
            comp.depth + 1,
            comp.state,
            comp.ctx,
        );
        child.run()
    };

    comp.gas.return_gas(result.gas_left);
    comp.gas.refund_gas(result.gas_refunded);
    comp.return_data = result.output.clone();

    let success = result.error.is_none();
    if success {
        comp.logs.extend(result.logs);
        comp.accounts_to_delete.extend(result.accounts_to_delete);
    }

    let copy_len = result.output.len().min(ret_size);
    comp.memory.write(ret_offset, &result.output[..copy_len]);

    comp.stack.push(U256::from(success as u64))?;
    Ok(ControlFlow::Continue)
}

pub fn op_call(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    call_common(comp, CallKind::Call)
}

pub fn op_callcode(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    call_common(comp, CallKind::CallCode)
}

pub fn op_delegatecall(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    call_common(comp, CallKind::DelegateCall)
}

pub fn op_staticcall(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    call_common(comp, CallKind::StaticCall)
}

pub fn op_return(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let data = read_memory_range(comp, offset, size)?;
    Ok(ControlFlow::Return(data))
}

pub fn op_revert(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let data = read_memory_range(comp, offset, size)?;
    comp.stash_revert_output(data);
    Err(VMError::Revert)
}

pub fn op_invalid(_comp: &mut Computation) -> Result<ControlFlow, VMError> {
    Err(VMError::InvalidInstruction)
}

pub fn op_stop(_comp: &mut Computation) -> Result<ControlFlow, VMError> {
    Ok(ControlFlow::Stop)
}

pub fn op_selfdestruct(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    if comp.is_static {
        return Err(VMError::WriteProtection);
    }
    let beneficiary = pop_address(comp)?;
    if comp.ctx.fork.is_at_least(ward_forks::Fork::Berlin) {
        let was_warm = comp.state.mark_address_warm(beneficiary);
        if !was_warm {
            comp.gas.consume_gas(comp.ctx.gas_schedule.cold_account_access_cost)?;
        }
    }
    let beneficiary_is_new = !comp.state.account_exists(beneficiary) && !comp.state.get_balance(comp.address).is_zero();
    if beneficiary_is_new {
        comp.gas.consume_gas(comp.ctx.gas_schedule.new_account_cost)?;
    }
    Ok(ControlFlow::SelfDestruct(beneficiary))
}
