//! The 256-entry opcode dispatch table, and the two fork/opcode lookups the
//! run loop consults before it ever gets there: each opcode's static gas
//! tier, and whether it's forbidden inside a `STATICCALL`.

use crate::frame::{Computation, ControlFlow};
use crate::errors::VMError;
use crate::opcode;
use crate::{ops_env, ops_memory, ops_pure, ops_system};
use ward_forks::Fork;

/// Signature every opcode handler shares.
pub type OpFn = fn(&mut Computation) -> Result<ControlFlow, VMError>;

/// The function-pointer dispatch table, indexed by opcode byte. Unassigned
/// slots hold [`ops_system::op_invalid`], so an undefined byte always fails
/// the same way `INVALID` (`0xFE`) does once [`super::code::CodeStream`] and
/// the fork-availability check have let it through.
pub fn opcode_table() -> &'static [OpFn; 256] {
    static TABLE: std::sync::OnceLock<[OpFn; 256]> = std::sync::OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: [OpFn; 256] = [ops_system::op_invalid; 256];

        table[opcode::STOP as usize] = ops_system::op_stop;
        table[opcode::ADD as usize] = ops_pure::op_add;
        table[opcode::MUL as usize] = ops_pure::op_mul;
        table[opcode::SUB as usize] = ops_pure::op_sub;
        table[opcode::DIV as usize] = ops_pure::op_div;
        table[opcode::SDIV as usize] = ops_pure::op_sdiv;
        table[opcode::MOD as usize] = ops_pure::op_mod;
        table[opcode::SMOD as usize] = ops_pure::op_smod;
        table[opcode::ADDMOD as usize] = ops_pure::op_addmod;
        table[opcode::MULMOD as usize] = ops_pure::op_mulmod;
        table[opcode::EXP as usize] = ops_pure::op_exp;
        table[opcode::SIGNEXTEND as usize] = ops_pure::op_signextend;

        table[opcode::LT as usize] = ops_pure::op_lt;
        table[opcode::GT as usize] = ops_pure::op_gt;
        table[opcode::SLT as usize] = ops_pure::op_slt;
        table[opcode::SGT as usize] = ops_pure::op_sgt;
        table[opcode::EQ as usize] = ops_pure::op_eq;
        table[opcode::ISZERO as usize] = ops_pure::op_iszero;
        table[opcode::AND as usize] = ops_pure::op_and;
        table[opcode::OR as usize] = ops_pure::op_or;
        table[opcode::XOR as usize] = ops_pure::op_xor;
        table[opcode::NOT as usize] = ops_pure::op_not;
        table[opcode::BYTE as usize] = ops_pure::op_byte;
        table[opcode::SHL as usize] = ops_pure::op_shl;
        table[opcode::SHR as usize] = ops_pure::op_shr;
        table[opcode::SAR as usize] = ops_pure::op_sar;

        table[opcode::KECCAK256 as usize] = ops_pure::op_keccak256;

        table[opcode::ADDRESS as usize] = ops_env::op_address;
        table[opcode::BALANCE as usize] = ops_env::op_balance;
        table[opcode::ORIGIN as usize] = ops_env::op_origin;
        table[opcode::CALLER as usize] = ops_env::op_caller;
        table[opcode::CALLVALUE as usize] = ops_env::op_callvalue;
        table[opcode::CALLDATALOAD as usize] = ops_env::op_calldataload;
        table[opcode::CALLDATASIZE as usize] = ops_env::op_calldatasize;
        table[opcode::CALLDATACOPY as usize] = ops_env::op_calldatacopy;
        table[opcode::CODESIZE as usize] = ops_env::op_codesize;
        table[opcode::CODECOPY as usize] = ops_env::op_codecopy;
        table[opcode::GASPRICE as usize] = ops_env::op_gasprice;
        table[opcode::EXTCODESIZE as usize] = ops_env::op_extcodesize;
        table[opcode::EXTCODECOPY as usize] = ops_env::op_extcodecopy;
        table[opcode::RETURNDATASIZE as usize] = ops_env::op_returndatasize;
        table[opcode::RETURNDATACOPY as usize] = ops_env::op_returndatacopy;
        table[opcode::EXTCODEHASH as usize] = ops_env::op_extcodehash;

        table[opcode::BLOCKHASH as usize] = ops_env::op_blockhash;
        table[opcode::COINBASE as usize] = ops_env::op_coinbase;
        table[opcode::TIMESTAMP as usize] = ops_env::op_timestamp;
        table[opcode::NUMBER as usize] = ops_env::op_number;
        table[opcode::DIFFICULTY as usize] = ops_env::op_difficulty;
        table[opcode::GASLIMIT as usize] = ops_env::op_gaslimit;
        table[opcode::CHAINID as usize] = ops_env::op_chainid;
        table[opcode::SELFBALANCE as usize] = ops_env::op_selfbalance;
        table[opcode::BASEFEE as usize] = ops_env::op_basefee;
        table[opcode::BLOBHASH as usize] = ops_env::op_blobhash;
        table[opcode::BLOBBASEFEE as usize] = ops_env::op_blobbasefee;

        table[opcode::POP as usize] = ops_memory::op_pop;
        table[opcode::MLOAD as usize] = ops_memory::op_mload;
        table[opcode::MSTORE as usize] = ops_memory::op_mstore;
        table[opcode::MSTORE8 as usize] = ops_memory::op_mstore8;
        table[opcode::SLOAD as usize] = ops_memory::op_sload;
        table[opcode::SSTORE as usize] = ops_memory::op_sstore;
        table[opcode::JUMP as usize] = ops_memory::op_jump;
        table[opcode::JUMPI as usize] = ops_memory::op_jumpi;
        table[opcode::PC as usize] = ops_memory::op_pc;
        table[opcode::MSIZE as usize] = ops_memory::op_msize;
        table[opcode::GAS as usize] = ops_memory::op_gas;
        table[opcode::JUMPDEST as usize] = ops_memory::op_jumpdest;
        table[opcode::TLOAD as usize] = ops_memory::op_tload;
        table[opcode::TSTORE as usize] = ops_memory::op_tstore;
        table[opcode::MCOPY as usize] = ops_memory::op_mcopy;
        table[opcode::PUSH0 as usize] = ops_memory::op_push0;

        for op in opcode::PUSH1..=opcode::PUSH32 {
            table[op as usize] = ops_memory::op_push;
        }
        for op in opcode::DUP1..=opcode::DUP16 {
            table[op as usize] = ops_memory::op_dup;
        }
        for op in opcode::SWAP1..=opcode::SWAP16 {
            table[op as usize] = ops_memory::op_swap;
        }
        for op in opcode::LOG0..=opcode::LOG4 {
            table[op as usize] = ops_memory::op_log;
        }

        table[opcode::CREATE as usize] = ops_system::op_create;
        table[opcode::CALL as usize] = ops_system::op_call;
        table[opcode::CALLCODE as usize] = ops_system::op_callcode;
        table[opcode::RETURN as usize] = ops_system::op_return;
        table[opcode::DELEGATECALL as usize] = ops_system::op_delegatecall;
        table[opcode::CREATE2 as usize] = ops_system::op_create2;
        table[opcode::STATICCALL as usize] = ops_system::op_staticcall;
        table[opcode::REVERT as usize] = ops_system::op_revert;
        table[opcode::INVALID as usize] = ops_system::op_invalid;
        table[opcode::SELFDESTRUCT as usize] = ops_system::op_selfdestruct;

        table
    })
}

const G_ZERO: u64 = 0;
const G_BASE: u64 = 2;
const G_VERY_LOW: u64 = 3;
const G_LOW: u64 = 5;
const G_MID: u64 = 8;
const G_HIGH: u64 = 10;
const G_JUMPDEST: u64 = 1;
const G_EXP: u64 = 10;
const G_KECCAK256: u64 = 30;
const G_CREATE: u64 = 32_000;
const G_BLOCKHASH: u64 = 20;
const G_LOG: u64 = 0; // op_log charges its own flat + dynamic cost directly

/// The pre-EIP-2929 flat cost of touching another account's balance/code/hash,
/// or issuing a message call to one. `0` from Berlin on, where the opcode's
/// own handler charges the cold/warm split instead.
fn address_access_cost(fork: Fork) -> u64 {
    if fork.is_at_least(Fork::Berlin) {
        0
    } else if fork.is_at_least(Fork::Istanbul) {
        700
    } else if fork.is_at_least(Fork::TangerineWhistle) {
        400
    } else {
        20
    }
}

/// The pre-EIP-2929 flat base cost of a message call. `0` from Berlin on.
fn call_base_cost(fork: Fork) -> u64 {
    if fork.is_at_least(Fork::Berlin) {
        0
    } else if fork.is_at_least(Fork::TangerineWhistle) {
        700
    } else {
        40
    }
}

/// The pre-EIP-2929 flat cost of `SELFDESTRUCT`. `0` from Berlin on (the
/// cold-beneficiary surcharge is charged by the handler instead).
fn selfdestruct_base_cost(fork: Fork) -> u64 {
    if fork.is_at_least(Fork::Berlin) {
        0
    } else if fork.is_at_least(Fork::TangerineWhistle) {
        5_000
    } else {
        0
    }
}

/// The static (non-dynamic) gas cost charged before an opcode's handler
/// runs. Opcodes whose entire cost depends on operands (`SSTORE`, `SLOAD`,
/// `EXP`'s per-byte term, `LOG`, memory expansion, `CALL`-family access,
/// `CREATE2`'s per-word hashing, ...) charge the rest of their cost
/// themselves and contribute only their flat floor here (`0` where there is
/// none).
pub fn static_gas_cost(fork: Fork, op: u8) -> u64 {
    use opcode::*;
    match op {
        STOP | RETURN | REVERT => G_ZERO,
        ADD | SUB | NOT | LT | GT | SLT | SGT | EQ | ISZERO | AND | OR | XOR | BYTE | SHL | SHR
        | SAR | CALLDATALOAD | MLOAD | MSTORE | MSTORE8 | PUSH0 => G_VERY_LOW,
        op if is_push(op) || is_dup(op) || is_swap(op) => G_VERY_LOW,
        MUL | DIV | SDIV | MOD | SMOD | SIGNEXTEND => G_LOW,
        ADDMOD | MULMOD | JUMP => G_MID,
        JUMPI => G_HIGH,
        JUMPDEST => G_JUMPDEST,
        EXP => G_EXP,
        KECCAK256 => G_KECCAK256,
        ADDRESS | ORIGIN | CALLER | CALLVALUE | CALLDATASIZE | CODESIZE | GASPRICE | COINBASE
        | TIMESTAMP | NUMBER | DIFFICULTY | GASLIMIT | RETURNDATASIZE | POP | PC | MSIZE | GAS
        | CHAINID | BASEFEE | BLOBBASEFEE | BLOBHASH => G_BASE,
        SELFBALANCE => G_LOW,
        CALLDATACOPY | CODECOPY | RETURNDATACOPY | MCOPY => G_VERY_LOW,
        BALANCE | EXTCODESIZE | EXTCODEHASH | EXTCODECOPY => address_access_cost(fork),
        BLOCKHASH => G_BLOCKHASH,
        SLOAD => G_ZERO, // op_sload charges the fork-appropriate cost itself
        SSTORE => G_ZERO, // op_sstore charges its own EIP-2200/net-metering cost
        op if is_log(op) => G_LOG,
        CREATE | CREATE2 => G_CREATE,
        CALL | CALLCODE | DELEGATECALL | STATICCALL => call_base_cost(fork),
        SELFDESTRUCT => selfdestruct_base_cost(fork),
        TLOAD | TSTORE => 100, // EIP-1153: same flat cost as a warm storage slot
        INVALID => G_ZERO,
        _ => G_ZERO,
    }
}

/// Whether `op` is unconditionally forbidden inside a `STATICCALL` context.
/// `CALL` is handled separately (only forbidden when it carries a non-zero
/// value), and `CALLCODE` never needs forbidding since it can only ever touch
/// the calling contract's own storage.
pub fn is_state_modifying(op: u8) -> bool {
    use opcode::*;
    op == SSTORE || is_log(op) || op == CREATE || op == CREATE2 || op == SELFDESTRUCT || op == TSTORE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_opcode_dispatches_to_invalid() {
        let table = opcode_table();
        assert_eq!(table[0x0C] as usize, ops_system::op_invalid as usize);
    }

    #[test]
    fn push_opcodes_all_dispatch_to_shared_handler() {
        let table = opcode_table();
        assert_eq!(table[opcode::PUSH1 as usize] as usize, ops_memory::op_push as usize);
        assert_eq!(table[opcode::PUSH32 as usize] as usize, ops_memory::op_push as usize);
    }

    #[test]
    fn sstore_and_log_are_state_modifying() {
        assert!(is_state_modifying(opcode::SSTORE));
        assert!(is_state_modifying(opcode::LOG0));
        assert!(!is_state_modifying(opcode::CALLCODE));
        assert!(!is_state_modifying(opcode::CALL));
    }

    #[test]
    fn call_base_cost_drops_to_zero_at_berlin() {
        assert_eq!(call_base_cost(Fork::Istanbul), 700);
        assert_eq!(call_base_cost(Fork::Berlin), 0);
    }
}
