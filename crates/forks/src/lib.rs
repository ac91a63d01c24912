//! Hard fork schedule, gas cost tables, difficulty formulas, and static
//! block rewards (C12 plus the schedule half of C7).

#![warn(missing_docs, unreachable_pub)]

mod block_reward;
mod difficulty;
mod fork;
mod gas_schedule;
mod opcode_availability;

pub use block_reward::{block_reward, ommer_inclusion_reward, ommer_reward};
pub use difficulty::compute_difficulty;
pub use fork::{Fork, ForkSchedule};
pub use gas_schedule::GasSchedule;
pub use opcode_availability::is_opcode_enabled;
