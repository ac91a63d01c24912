//! Arithmetic, comparison, bitwise, and `KECCAK256` opcodes — the ones that
//! touch only the stack (plus, for `KECCAK256`, memory).

use crate::errors::VMError;
use crate::frame::{Computation, ControlFlow};
use alloy_primitives::{keccak256, I256, U256};

fn binary(comp: &mut Computation, f: impl FnOnce(U256, U256) -> U256) -> Result<ControlFlow, VMError> {
    let a = comp.stack.pop()?;
    let b = comp.stack.pop()?;
    comp.stack.push(f(a, b))?;
    Ok(ControlFlow::Continue)
}

fn unary(comp: &mut Computation, f: impl FnOnce(U256) -> U256) -> Result<ControlFlow, VMError> {
    let a = comp.stack.pop()?;
    comp.stack.push(f(a))?;
    Ok(ControlFlow::Continue)
}

pub fn op_add(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| a.wrapping_add(b))
}

pub fn op_mul(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| a.wrapping_mul(b))
}

pub fn op_sub(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| a.wrapping_sub(b))
}

pub fn op_div(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| if b.is_zero() { U256::ZERO } else { a / b })
}

pub fn op_sdiv(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| {
        let (a, b) = (I256::from_raw(a), I256::from_raw(b));
        if b.is_zero() {
            U256::ZERO
        } else {
            a.wrapping_div(b).into_raw()
        }
    })
}

pub fn op_mod(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| if b.is_zero() { U256::ZERO } else { a % b })
}

pub fn op_smod(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| {
        let (a, b) = (I256::from_raw(a), I256::from_raw(b));
        if b.is_zero() {
            U256::ZERO
        } else {
            a.wrapping_rem(b).into_raw()
        }
    })
}

pub fn op_addmod(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let a = comp.stack.pop()?;
    let b = comp.stack.pop()?;
    let n = comp.stack.pop()?;
    let result = if n.is_zero() {
        U256::ZERO
    } else {
        let (a, b, n) = (to_u512(a), to_u512(b), to_u512(n));
        from_u512((a + b) % n)
    };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_mulmod(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let a = comp.stack.pop()?;
    let b = comp.stack.pop()?;
    let n = comp.stack.pop()?;
    let result = if n.is_zero() {
        U256::ZERO
    } else {
        let (a, b, n) = (to_u512(a), to_u512(b), to_u512(n));
        from_u512((a * b) % n)
    };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

// ADDMOD/MULMOD need headroom past 256 bits to avoid overflow on the
// intermediate product/sum; alloy_primitives::U512 provides it directly.
fn to_u512(v: U256) -> alloy_primitives::U512 {
    alloy_primitives::U512::from(v)
}

fn from_u512(v: alloy_primitives::U512) -> U256 {
    U256::from(v)
}

pub fn op_exp(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let base = comp.stack.pop()?;
    let exponent = comp.stack.pop()?;
    let exponent_bytes = (256 - exponent.leading_zeros() as u64 + 7) / 8;
    comp.gas.consume_gas(50 * exponent_bytes)?;
    comp.stack.push(base.pow(exponent))?;
    Ok(ControlFlow::Continue)
}

pub fn op_signextend(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let byte_index = comp.stack.pop()?;
    let value = comp.stack.pop()?;
    let result = if byte_index >= U256::from(32) {
        value
    } else {
        let index: usize = byte_index.to::<usize>();
        let sign_bit_pos = index * 8 + 7;
        let sign_is_set = value.bit(sign_bit_pos);
        let mut out = value;
        for bit in (sign_bit_pos + 1)..256 {
            out.set_bit(bit, sign_is_set);
        }
        out
    };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_lt(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| U256::from(a < b))
}

pub fn op_gt(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| U256::from(a > b))
}

pub fn op_slt(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| U256::from(I256::from_raw(a) < I256::from_raw(b)))
}

pub fn op_sgt(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| U256::from(I256::from_raw(a) > I256::from_raw(b)))
}

pub fn op_eq(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| U256::from(a == b))
}

pub fn op_iszero(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    unary(comp, |a| U256::from(a.is_zero()))
}

pub fn op_and(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| a & b)
}

pub fn op_or(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| a | b)
}

pub fn op_xor(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    binary(comp, |a, b| a ^ b)
}

pub fn op_not(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    unary(comp, |a| !a)
}

pub fn op_byte(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let index = comp.stack.pop()?;
    let value = comp.stack.pop()?;
    let result = if index >= U256::from(32) {
        U256::ZERO
    } else {
        let i: usize = index.to::<usize>();
        U256::from(value.to_be_bytes::<32>()[i])
    };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_shl(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let shift = comp.stack.pop()?;
    let value = comp.stack.pop()?;
    let result = if shift >= U256::from(256) { U256::ZERO } else { value << shift.to::<usize>() };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_shr(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let shift = comp.stack.pop()?;
    let value = comp.stack.pop()?;
    let result = if shift >= U256::from(256) { U256::ZERO } else { value >> shift.to::<usize>() };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_sar(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let shift = comp.stack.pop()?;
    let value = I256::from_raw(comp.stack.pop()?);
    let result = if shift >= U256::from(256) {
        if value.is_negative() { U256::MAX } else { U256::ZERO }
    } else {
        value.asr(shift.to::<usize>()).into_raw()
    };
    comp.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_keccak256(comp: &mut Computation) -> Result<ControlFlow, VMError> {
    let offset = comp.stack.pop()?.to::<usize>();
    let size = comp.stack.pop()?.to::<usize>();
    let expansion = comp.memory.extend(offset, size);
    comp.gas.consume_gas(expansion)?;
    // The flat 30 gas base is charged by the opcode's static tier; only the
    // per-word cost is charged here.
    let words = (size as u64 + 31) / 32;
    comp.gas.consume_gas(6 * words)?;
    let hash = keccak256(comp.memory.read(offset, size));
    comp.stack.push(U256::from_be_bytes(hash.0))?;
    Ok(ControlFlow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use alloy_primitives::Address;
    use ward_forks::{Fork, GasSchedule};
    use ward_state::AccountStateDb;

    fn ctx() -> ExecutionContext<'static> {
        ExecutionContext {
            fork: Fork::Cancun,
            gas_schedule: GasSchedule::for_fork(Fork::Cancun),
            coinbase: Address::ZERO,
            timestamp: 0,
            block_number: 0,
            difficulty_or_prevrandao: U256::ZERO,
            block_gas_limit: 30_000_000,
            chain_id: 1,
            base_fee_per_gas: U256::ZERO,
            blob_base_fee: U256::ZERO,
            origin: Address::ZERO,
            gas_price: U256::ZERO,
            blob_hashes: Vec::new(),
            recent_block_hashes: Vec::new(),
            kzg_settings: c_kzg::ethereum_kzg_settings(),
        }
    }

    #[test]
    fn add_wraps() {
        let mut state = AccountStateDb::new();
        let context = ctx();
        let mut comp = Computation::new(
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            vec![],
            Default::default(),
            1_000_000,
            false,
            0,
            &mut state,
            &context,
        );
        comp.stack.push(U256::MAX).unwrap();
        comp.stack.push(U256::from(1)).unwrap();
        op_add(&mut comp).unwrap();
        assert_eq!(comp.stack.pop().unwrap(), U256::ZERO);
    }

    #[test]
    fn div_by_zero_is_zero() {
        let mut state = AccountStateDb::new();
        let context = ctx();
        let mut comp = Computation::new(
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            vec![],
            Default::default(),
            1_000_000,
            false,
            0,
            &mut state,
            &context,
        );
        comp.stack.push(U256::from(5)).unwrap();
        comp.stack.push(U256::ZERO).unwrap();
        op_div(&mut comp).unwrap();
        assert_eq!(comp.stack.pop().unwrap(), U256::ZERO);
    }

    #[test]
    fn signextend_propagates_sign() {
        let mut state = AccountStateDb::new();
        let context = ctx();
        let mut comp = Computation::new(
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            vec![],
            Default::default(),
            1_000_000,
            false,
            0,
            &mut state,
            &context,
        );
        comp.stack.push(U256::from(0xFFu64)).unwrap(); // value = 0x..FF (negative byte)
        comp.stack.push(U256::ZERO).unwrap(); // byte index 0
        op_signextend(&mut comp).unwrap();
        assert_eq!(comp.stack.pop().unwrap(), U256::MAX);
    }
}
