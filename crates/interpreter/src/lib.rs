//! The bytecode interpreter: gas metering, the operand stack, linear memory,
//! code-stream/`JUMPDEST` validity, and the 256-entry opcode dispatch table
//! that together execute one call frame.

#![warn(missing_docs, unreachable_pub)]

mod code;
mod context;
mod errors;
mod frame;
mod gas;
mod memory;
mod opcode;
mod ops_env;
mod ops_memory;
mod ops_pure;
mod ops_system;
mod stack;
mod table;
mod util;

pub use code::CodeStream;
pub use context::ExecutionContext;
pub use errors::VMError;
pub use frame::{CallKind, Computation, ComputationResult, ControlFlow, MAX_CALL_DEPTH};
pub use gas::GasMeter;
pub use memory::Memory;
pub use ops_system::{create_address, MAX_CODE_SIZE, RESERVED_CODE_PREFIX};
pub use stack::{Stack, STACK_LIMIT};
pub use table::{is_state_modifying, opcode_table, static_gas_cost, OpFn};
