//! Gas accounting for one call frame.

use crate::errors::VMError;

/// Tracks remaining gas and the separate refund accumulator for a frame.
/// The refund is never folded into `remaining` mid-execution — only the
/// transaction executor applies it, once, after execution finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    start_gas: u64,
    remaining: u64,
    refunded: i64,
}

impl GasMeter {
    /// Creates a meter with `start_gas` available and no refund yet.
    pub const fn new(start_gas: u64) -> Self {
        Self { start_gas, remaining: start_gas, refunded: 0 }
    }

    /// Gas the frame started with.
    pub const fn start_gas(&self) -> u64 {
        self.start_gas
    }

    /// Gas left to spend.
    pub const fn gas_remaining(&self) -> u64 {
        self.remaining
    }

    /// Gas used so far, i.e. `start_gas - remaining`.
    pub const fn gas_used(&self) -> u64 {
        self.start_gas - self.remaining
    }

    /// Net refund accumulated (can be negative if refunds were later undone,
    /// e.g. an `SSTORE` that re-dirties a slot it had just cleared).
    pub const fn gas_refunded(&self) -> i64 {
        self.refunded
    }

    /// Deducts `amount` from the remaining balance.
    ///
    /// # Errors
    /// Returns [`VMError::OutOfGas`] if `amount > gas_remaining()`; the meter
    /// is left unchanged so the caller can surface the error without the
    /// frame accounting for a partial charge.
    pub fn consume_gas(&mut self, amount: u64) -> Result<(), VMError> {
        match self.remaining.checked_sub(amount) {
            Some(remaining) => {
                self.remaining = remaining;
                Ok(())
            }
            None => Err(VMError::OutOfGas),
        }
    }

    /// Credits unspent gas back, e.g. gas a child frame returned unused.
    pub fn return_gas(&mut self, amount: u64) {
        self.remaining += amount;
    }

    /// Adds to the refund accumulator. Accepts negative deltas so `SSTORE`
    /// can undo a refund it previously granted.
    pub fn refund_gas(&mut self, delta: i64) {
        self.refunded += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_past_remaining_errors_without_mutating() {
        let mut meter = GasMeter::new(10);
        assert_eq!(meter.consume_gas(11), Err(VMError::OutOfGas));
        assert_eq!(meter.gas_remaining(), 10);
    }

    #[test]
    fn refund_is_separate_from_remaining() {
        let mut meter = GasMeter::new(100);
        meter.consume_gas(40).unwrap();
        meter.refund_gas(15);
        assert_eq!(meter.gas_remaining(), 60);
        assert_eq!(meter.gas_refunded(), 15);
    }

    #[test]
    fn refund_can_go_negative_to_undo_itself() {
        let mut meter = GasMeter::new(100);
        meter.refund_gas(20);
        meter.refund_gas(-20);
        assert_eq!(meter.gas_refunded(), 0);
    }

    #[test]
    fn return_gas_credits_remaining() {
        let mut meter = GasMeter::new(100);
        meter.consume_gas(30).unwrap();
        meter.return_gas(10);
        assert_eq!(meter.gas_remaining(), 80);
        assert_eq!(meter.gas_used(), 20);
    }
}
