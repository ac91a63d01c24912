//! Which opcode bytes are defined at a given [Fork].
//!
//! Opcode execution semantics themselves live in `ward-interpreter`; this
//! module only answers "does this byte mean anything yet", which the
//! interpreter consults when building its per-fork dispatch table.

use crate::fork::Fork;

/// Returns `false` for opcode bytes not yet introduced at `fork`, `true`
/// otherwise (including opcodes with no fork gate at all, i.e. everything
/// in the base Frontier set).
pub fn is_opcode_enabled(fork: Fork, opcode: u8) -> bool {
    match opcode {
        // Homestead
        0xF4 => fork >= Fork::Homestead, // DELEGATECALL
        // Byzantium
        0x3D | 0x3E | 0xFA | 0xFD => fork >= Fork::Byzantium, // RETURNDATASIZE/COPY, STATICCALL, REVERT
        // Constantinople
        0x1B | 0x1C | 0x1D | 0x3F | 0xF5 => fork >= Fork::Constantinople, // SHL/SHR/SAR, EXTCODEHASH, CREATE2
        // Istanbul
        0x46 | 0x47 => fork >= Fork::Istanbul, // CHAINID, SELFBALANCE
        // London
        0x48 => fork >= Fork::London, // BASEFEE
        // Shanghai
        0x5F => fork >= Fork::Shanghai, // PUSH0
        // Cancun
        0x49 | 0x4A | 0x5C | 0x5D | 0x5E => fork >= Fork::Cancun, // BLOBHASH, BLOBBASEFEE, TLOAD, TSTORE, MCOPY
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push0_is_shanghai_only() {
        assert!(!is_opcode_enabled(Fork::Paris, 0x5F));
        assert!(is_opcode_enabled(Fork::Shanghai, 0x5F));
    }

    #[test]
    fn arithmetic_opcodes_are_always_enabled() {
        assert!(is_opcode_enabled(Fork::Frontier, 0x01)); // ADD
    }

    #[test]
    fn revert_requires_byzantium() {
        assert!(!is_opcode_enabled(Fork::Homestead, 0xFD));
        assert!(is_opcode_enabled(Fork::Byzantium, 0xFD));
    }
}
