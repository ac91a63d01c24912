//! The call-frame state machine (one [`Computation`] per `CALL`/`CREATE`).

use crate::code::CodeStream;
use crate::context::ExecutionContext;
use crate::errors::VMError;
use crate::gas::GasMeter;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::table::opcode_table;
use alloy_primitives::{Address, Bytes, U256};
use std::collections::HashSet;
use ward_primitives::log::Log;
use ward_state::AccountStateDb;

/// Maximum call depth (yellow paper `1024`).
pub const MAX_CALL_DEPTH: usize = 1024;

/// How a child message was invoked; governs value transfer, code address
/// resolution, and `is_static` inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `CALL`: executes at `address`, `msg.sender` becomes `address`.
    Call,
    /// `STATICCALL`: `Call` with `is_static` forced true and value forced zero.
    StaticCall,
    /// `DELEGATECALL`: executes `code_address`'s code in the caller's own
    /// storage/value/sender context.
    DelegateCall,
    /// `CALLCODE`: like `DelegateCall` but keeps this frame's own `address`
    /// as `msg.sender` rather than forwarding the grandparent's.
    CallCode,
}

/// What a non-halting opcode tells the run loop to do next.
pub enum ControlFlow {
    /// Advance to `pc + 1`.
    Continue,
    /// Set `pc` to this absolute position (validated as a JUMPDEST before the loop acts on it).
    Jump(usize),
    /// `STOP`: end the frame successfully with no output.
    Stop,
    /// `RETURN`: end the frame successfully with this output.
    Return(Bytes),
    /// `SELFDESTRUCT`: end the frame successfully, scheduling `address` for
    /// deletion and crediting `beneficiary`.
    SelfDestruct(Address),
}

/// A completed frame's outcome, as reported to its parent (or, for the
/// outermost frame, the transaction executor).
#[derive(Debug, Clone)]
pub struct ComputationResult {
    /// Whether the frame succeeded (`None`) or hit a [`VMError`].
    pub error: Option<VMError>,
    /// Gas left unspent; burned by the caller unless `error.burns_gas() == false`.
    pub gas_left: u64,
    /// Net refund this frame (and its successful children) accumulated.
    pub gas_refunded: i64,
    /// `RETURN`/`REVERT` data, or empty for `STOP` and non-`Revert` errors.
    pub output: Bytes,
    /// Logs emitted, populated only if the frame succeeded.
    pub logs: Vec<Log>,
    /// Accounts scheduled for deletion via `SELFDESTRUCT`, populated only if
    /// the frame succeeded.
    pub accounts_to_delete: HashSet<Address>,
}

/// One call frame: its own stack, memory, code, and gas meter, holding a
/// shared mutable view of the state database and a shared read-only view of
/// the block/transaction environment.
pub struct Computation<'a> {
    /// The address whose storage/code this frame executes against.
    pub address: Address,
    /// `msg.sender` as seen by this frame's code.
    pub caller: Address,
    /// `msg.value` as seen by `CALLVALUE`.
    pub value: U256,
    /// Forbids state-modifying opcodes (`STATICCALL` context).
    pub is_static: bool,
    /// Call stack depth; the outermost frame is depth 0.
    pub depth: usize,
    /// Operand stack.
    pub stack: Stack,
    /// Linear memory.
    pub memory: Memory,
    /// Executing bytecode.
    pub code: CodeStream,
    /// Gas meter.
    pub gas: GasMeter,
    /// Program counter.
    pub pc: usize,
    /// Calldata.
    pub input: Bytes,
    /// Output of the most recently completed child call, for
    /// `RETURNDATASIZE`/`RETURNDATACOPY`.
    pub return_data: Bytes,
    /// Logs emitted by this frame (not yet including children's).
    pub logs: Vec<Log>,
    /// Addresses this frame (or a successful child) has selfdestructed.
    pub accounts_to_delete: HashSet<Address>,
    /// Output staged by `REVERT` before it returns control via `Err`.
    pub(crate) pending_revert_output: Bytes,
    /// Shared state database.
    pub state: &'a mut AccountStateDb,
    /// Shared block/transaction environment.
    pub ctx: &'a ExecutionContext<'a>,
}

impl<'a> Computation<'a> {
    /// Builds a fresh top-level or child frame. Does not itself run it —
    /// call [`Computation::run`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: Address,
        caller: Address,
        value: U256,
        code: Vec<u8>,
        input: Bytes,
        gas_limit: u64,
        is_static: bool,
        depth: usize,
        state: &'a mut AccountStateDb,
        ctx: &'a ExecutionContext<'a>,
    ) -> Self {
        Self {
            address,
            caller,
            value,
            is_static,
            depth,
            stack: Stack::new(),
            memory: Memory::new(),
            code: CodeStream::new(code),
            gas: GasMeter::new(gas_limit),
            pc: 0,
            input,
            return_data: Bytes::new(),
            logs: Vec::new(),
            accounts_to_delete: HashSet::new(),
            pending_revert_output: Bytes::new(),
            state,
            ctx,
        }
    }

    /// Stashes a `REVERT`'s output ahead of unwinding via `Err(VMError::Revert)`.
    pub(crate) fn stash_revert_output(&mut self, data: Bytes) {
        self.pending_revert_output = data;
    }

    /// Runs the opcode loop to completion, returning the frame's outcome.
    /// A [`VMError`] never panics or propagates as a Rust `Result::Err` past
    /// this boundary — it's folded into [`ComputationResult::error`].
    pub fn run(mut self) -> ComputationResult {
        let checkpoint = self.state.checkpoint();
        let outcome = self.execute_loop();

        match outcome {
            Ok((output, accounts_to_delete)) => {
                self.state.commit(checkpoint);
                ComputationResult {
                    error: None,
                    gas_left: self.gas.gas_remaining(),
                    gas_refunded: self.gas.gas_refunded(),
                    output,
                    logs: self.logs,
                    accounts_to_delete,
                }
            }
            Err(VMError::Revert) => {
                self.state.discard(checkpoint);
                ComputationResult {
                    error: Some(VMError::Revert),
                    gas_left: self.gas.gas_remaining(),
                    gas_refunded: 0,
                    output: self.pending_revert_output.clone(),
                    logs: Vec::new(),
                    accounts_to_delete: HashSet::new(),
                }
            }
            Err(error) => {
                self.state.discard(checkpoint);
                ComputationResult {
                    error: Some(error),
                    gas_left: 0,
                    gas_refunded: 0,
                    output: Bytes::new(),
                    logs: Vec::new(),
                    accounts_to_delete: HashSet::new(),
                }
            }
        }
    }

    fn execute_loop(&mut self) -> Result<(Bytes, HashSet<Address>), VMError> {
        loop {
            let Some(op) = self.code.opcode_at(self.pc) else {
                return Ok((Bytes::new(), std::mem::take(&mut self.accounts_to_delete)));
            };

            if !ward_forks::is_opcode_enabled(self.ctx.fork, op) {
                return Err(VMError::InvalidInstruction);
            }

            let static_cost = crate::table::static_gas_cost(self.ctx.fork, op);
            self.gas.consume_gas(static_cost)?;

            if self.is_static && crate::table::is_state_modifying(op) {
                return Err(VMError::WriteProtection);
            }

            let handler = opcode_table()[op as usize];
            match handler(self)? {
                ControlFlow::Continue => self.pc += 1,
                ControlFlow::Jump(dest) => {
                    if !self.code.is_valid_opcode(dest) {
                        return Err(VMError::InvalidJumpDestination);
                    }
                    self.pc = dest;
                }
                ControlFlow::Stop => {
                    return Ok((Bytes::new(), std::mem::take(&mut self.accounts_to_delete)))
                }
                ControlFlow::Return(output) => {
                    return Ok((output, std::mem::take(&mut self.accounts_to_delete)))
                }
                ControlFlow::SelfDestruct(beneficiary) => {
                    self.selfdestruct_to(beneficiary);
                    return Ok((Bytes::new(), std::mem::take(&mut self.accounts_to_delete)));
                }
            }
        }
    }

    fn selfdestruct_to(&mut self, beneficiary: Address) {
        let balance = self.state.get_balance(self.address);
        if !balance.is_zero() {
            let delta: i128 = balance.try_into().unwrap_or(i128::MAX);
            self.state.delta_balance(beneficiary, delta);
            self.state.set_balance(self.address, U256::ZERO);
        }
        self.accounts_to_delete.insert(self.address);
    }
}
