//! Whole-transaction execution: validation, fee settlement, and dispatch to
//! either a top-level `CALL` or a top-level contract-creation deployment.

use crate::env::BlockContext;
use crate::errors::{ExecutorError, ExecutorResult};
use crate::gas;
use alloy_primitives::{Address, Bytes, U256};
use std::collections::HashSet;
use tracing::debug;
use ward_forks::Fork;
use ward_interpreter::{create_address, Computation, ExecutionContext, MAX_CODE_SIZE, RESERVED_CODE_PREFIX};
use ward_primitives::authorization::DELEGATION_PREFIX;
use ward_primitives::log::Log;
use ward_primitives::transaction::Transaction;
use ward_state::AccountStateDb;

/// A breakdown of where a transaction's gas went, kept as separate fields
/// rather than collapsed into one total so callers (block building, tracing)
/// can see intrinsic cost, the EIP-7623 floor, and the refund independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasAccounting {
    /// Base cost, calldata cost, creation surcharge, access-list cost, and
    /// EIP-7702 authorization cost — payable before a single opcode runs.
    pub intrinsic_gas: u64,
    /// EIP-7623's calldata floor, `None` before Prague.
    pub floor_gas: Option<u64>,
    /// Gas the interpreter itself consumed, before any refund is applied.
    pub execution_gas_used: u64,
    /// Refund actually granted, after EIP-3529's cap.
    pub refund_granted: u64,
    /// Final gas charged to the sender: `intrinsic + execution - refund`,
    /// raised to `floor_gas` if that is higher.
    pub gas_used: u64,
}

/// The result of executing one transaction against a [`BlockContext`].
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Whether the top-level call or creation completed without error.
    /// `Revert` counts as unsuccessful, matching EIP-658's receipt status.
    pub success: bool,
    /// Gas bookkeeping for this transaction.
    pub gas: GasAccounting,
    /// `RETURN`/`REVERT` output of a `CALL`, or empty for a creation.
    pub output: Bytes,
    /// The deployed address, for a successful contract-creation transaction.
    pub created_address: Option<Address>,
    /// Logs emitted, empty on failure.
    pub logs: Vec<Log>,
}

/// Executes transactions one at a time against a shared [`AccountStateDb`].
///
/// Stateless beyond the gas schedule, mirroring the teacher's own
/// configuration-holding executor rather than a bag of free functions, so a
/// caller can build it once per block and reuse it across every transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransactionExecutor {
    fork: Fork,
    schedule: ward_forks::GasSchedule,
}

impl TransactionExecutor {
    /// Builds an executor for `fork`, caching its gas schedule.
    pub fn new(fork: Fork) -> Self {
        Self { fork, schedule: ward_forks::GasSchedule::for_fork(fork) }
    }

    /// Validates and executes `tx` against `state`, crediting the sender's
    /// refund and the coinbase's fee before returning.
    ///
    /// `gas_used_in_block` is the sum of every prior transaction's
    /// [`GasAccounting::gas_used`] in this block, used to enforce the block
    /// gas limit.
    pub fn execute(
        &self,
        tx: &Transaction,
        block: &BlockContext<'_>,
        state: &mut AccountStateDb,
        gas_used_in_block: u64,
    ) -> ExecutorResult<ExecutionOutcome> {
        let sender = tx.recover_sender()?;
        self.validate(tx, block, state, sender, gas_used_in_block)?;

        let intrinsic = gas::intrinsic_gas(tx, &self.schedule, self.fork);
        let floor = gas::floor_gas(tx, &self.schedule, self.fork);
        let effective_gas_price = tx.effective_gas_price(block.base_fee_per_gas);

        // Upfront debit and nonce bump happen unconditionally, independent of
        // whether execution below succeeds.
        let upfront_cost = U256::from(tx.gas_limit()) * U256::from(effective_gas_price);
        state.delta_balance(sender, -(i128::try_from(upfront_cost).unwrap_or(i128::MAX)));
        state.increment_nonce(sender).map_err(|_| ExecutorError::NonceMismatch {
            account: state.get_nonce(sender),
            transaction: tx.nonce(),
        })?;

        state.lock_changes();
        self.prewarm(tx, block, state, sender);
        let authorization_refund = if self.fork.is_at_least(Fork::Prague) {
            self.apply_authorizations(tx, block, state)
        } else {
            0
        };

        let execution_gas_limit = tx.gas_limit() - intrinsic;
        let ctx = self.execution_context(tx, block, sender, effective_gas_price);

        let (success, output, logs, created_address, execution_gas_used, gas_refunded, accounts_to_delete) =
            if tx.is_create() {
                self.run_creation(tx, sender, execution_gas_limit, state, &ctx)
            } else {
                self.run_call(tx, sender, execution_gas_limit, state, &ctx)
            };

        self.sweep_selfdestructs(state, accounts_to_delete, created_address);

        let pre_refund_used = intrinsic + execution_gas_used;
        let total_refund = gas_refunded + i64::try_from(authorization_refund).unwrap_or(i64::MAX);
        let refund_granted = gas::capped_refund(total_refund, pre_refund_used, &self.schedule);
        let post_refund_used = pre_refund_used - refund_granted;
        let gas_used = floor.map_or(post_refund_used, |f| post_refund_used.max(f));

        let gas_left = tx.gas_limit() - gas_used;
        let refund_amount = U256::from(gas_left) * U256::from(effective_gas_price);
        state.delta_balance(sender, i128::try_from(refund_amount).unwrap_or(i128::MAX));

        let tip_per_gas = effective_gas_price.saturating_sub(block.base_fee_per_gas as u128);
        let coinbase_fee = U256::from(gas_used) * U256::from(tip_per_gas);
        state.delta_balance(block.coinbase, i128::try_from(coinbase_fee).unwrap_or(i128::MAX));

        self.sweep_empty_accounts(state);

        Ok(ExecutionOutcome {
            success,
            gas: GasAccounting { intrinsic_gas: intrinsic, floor_gas: floor, execution_gas_used, refund_granted, gas_used },
            output,
            created_address,
            logs,
        })
    }

    fn validate(
        &self,
        tx: &Transaction,
        block: &BlockContext<'_>,
        state: &AccountStateDb,
        sender: Address,
        gas_used_in_block: u64,
    ) -> ExecutorResult<()> {
        if let Some(chain_id) = tx.chain_id() {
            if chain_id != block.chain_id {
                return Err(ExecutorError::InvalidBlobTransaction { reason: "chain id mismatch" });
            }
        }

        let account_nonce = state.get_nonce(sender);
        if account_nonce != tx.nonce() {
            return Err(ExecutorError::NonceMismatch { account: account_nonce, transaction: tx.nonce() });
        }

        let code = state.get_code(sender);
        if !code.is_empty() && !is_delegation_designator(&code) {
            return Err(ExecutorError::SenderNotAnEoa);
        }

        let intrinsic = gas::intrinsic_gas(tx, &self.schedule, self.fork);
        if tx.gas_limit() < intrinsic {
            return Err(ExecutorError::IntrinsicGasTooLow { limit: tx.gas_limit(), intrinsic });
        }

        let remaining_block_gas = block.gas_limit.saturating_sub(gas_used_in_block);
        if tx.gas_limit() > remaining_block_gas {
            return Err(ExecutorError::BlockGasLimitExceeded { limit: tx.gas_limit(), remaining: remaining_block_gas });
        }

        let max_fee = tx.max_fee_per_gas();
        let max_priority = tx.max_priority_fee_per_gas();
        if max_priority > max_fee {
            return Err(ExecutorError::TipAboveFeeCap { priority: max_priority, max_fee });
        }
        if self.fork.is_at_least(Fork::London) && max_fee < block.base_fee_per_gas as u128 {
            return Err(ExecutorError::FeeCapTooLow { max_fee, base_fee: block.base_fee_per_gas as u128 });
        }

        if let Transaction::Eip4844(blob_tx) = tx {
            if blob_tx.blob_versioned_hashes.is_empty() {
                return Err(ExecutorError::InvalidBlobTransaction { reason: "no blobs attached" });
            }
            if !blob_tx.has_valid_blob_versions() {
                return Err(ExecutorError::InvalidBlobTransaction { reason: "bad blob version byte" });
            }
            let blob_base_fee: u128 = block.blob_base_fee.try_into().unwrap_or(u128::MAX);
            if blob_tx.max_fee_per_blob_gas < blob_base_fee {
                return Err(ExecutorError::BlobFeeCapTooLow { max_fee: blob_tx.max_fee_per_blob_gas, blob_base_fee });
            }
        }

        let effective_gas_price = tx.effective_gas_price(block.base_fee_per_gas);
        let upfront = U256::from(tx.gas_limit()) * U256::from(effective_gas_price) + tx.value();
        if state.get_balance(sender) < upfront {
            return Err(ExecutorError::InsufficientBalance);
        }

        Ok(())
    }

    fn prewarm(&self, tx: &Transaction, block: &BlockContext<'_>, state: &mut AccountStateDb, sender: Address) {
        state.mark_address_warm(sender);
        if let Some(to) = tx.to() {
            state.mark_address_warm(to);
        }
        if self.fork.is_at_least(Fork::Shanghai) {
            state.mark_address_warm(block.coinbase);
        }
        if let Some(access_list) = tx.access_list() {
            for address in access_list.iter_addresses() {
                state.mark_address_warm(address);
            }
            for (address, slot) in access_list.iter_storage() {
                state.mark_storage_warm(address, slot);
            }
        }
    }

    /// Applies every valid EIP-7702 authorization tuple, returning the total
    /// gas to refund: each tuple whose authority account already exists was
    /// charged the conservative `PER_EMPTY_ACCOUNT_COST` at intrinsic-gas
    /// time and is owed back the difference down to `PER_AUTH_BASE_COST`.
    fn apply_authorizations(&self, tx: &Transaction, block: &BlockContext<'_>, state: &mut AccountStateDb) -> u64 {
        let mut refund = 0u64;
        for auth in tx.authorization_list() {
            if auth.inner.chain_id != 0 && auth.inner.chain_id != block.chain_id {
                continue;
            }
            let Ok(authority) = auth.recover_authority() else { continue };
            if state.get_nonce(authority) != auth.inner.nonce {
                continue;
            }
            let existing_code = state.get_code(authority);
            if !existing_code.is_empty() && !is_delegation_designator(&existing_code) {
                continue;
            }
            let authority_existed = state.account_exists(authority);
            if state.increment_nonce(authority).is_err() {
                continue;
            }
            if authority_existed {
                refund += gas::PER_EMPTY_ACCOUNT_COST - gas::PER_AUTH_BASE_COST;
            }
            state.mark_address_warm(authority);
            if auth.inner.address.is_zero() {
                state.delete_code(authority);
            } else {
                state.set_code(authority, delegation_designator(auth.inner.address));
                state.mark_address_warm(auth.inner.address);
            }
        }
        refund
    }

    fn execution_context<'a>(
        &self,
        tx: &Transaction,
        block: &BlockContext<'a>,
        sender: Address,
        effective_gas_price: u128,
    ) -> ExecutionContext<'a> {
        ExecutionContext {
            fork: self.fork,
            gas_schedule: self.schedule,
            coinbase: block.coinbase,
            timestamp: block.timestamp,
            block_number: block.number,
            difficulty_or_prevrandao: block.difficulty_or_prevrandao,
            block_gas_limit: block.gas_limit,
            chain_id: block.chain_id,
            base_fee_per_gas: U256::from(block.base_fee_per_gas),
            blob_base_fee: block.blob_base_fee,
            origin: sender,
            gas_price: U256::from(effective_gas_price),
            blob_hashes: tx.blob_versioned_hashes().to_vec(),
            recent_block_hashes: block.recent_block_hashes.clone(),
            kzg_settings: block.kzg_settings,
        }
    }

    #[allow(clippy::type_complexity)]
    fn run_call(
        &self,
        tx: &Transaction,
        sender: Address,
        gas_limit: u64,
        state: &mut AccountStateDb,
        ctx: &ExecutionContext<'_>,
    ) -> (bool, Bytes, Vec<Log>, Option<Address>, u64, i64, HashSet<Address>) {
        let to = tx.to().expect("run_call only for non-creation transactions");
        let checkpoint = state.checkpoint();

        let value = tx.value();
        if !value.is_zero() {
            let sender_balance = state.get_balance(sender);
            state.set_balance(sender, sender_balance - value);
            let recipient_balance = state.get_balance(to);
            state.set_balance(to, recipient_balance + value);
        }
        state.touch_account(to);

        let code = resolve_code(state, to);
        let comp = Computation::new(to, sender, value, code, tx.input().clone(), gas_limit, false, 0, state, ctx);
        let result = comp.run();

        let start_gas = gas_limit;
        let execution_gas_used = start_gas - result.gas_left;
        match result.error {
            None => {
                state.commit(checkpoint);
                (true, result.output, result.logs, None, execution_gas_used, result.gas_refunded, result.accounts_to_delete)
            }
            Some(ward_interpreter::VMError::Revert) => {
                state.discard(checkpoint);
                (false, result.output, Vec::new(), None, execution_gas_used, 0, HashSet::new())
            }
            Some(_) => {
                state.discard(checkpoint);
                (false, Bytes::new(), Vec::new(), None, start_gas, 0, HashSet::new())
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn run_creation(
        &self,
        tx: &Transaction,
        sender: Address,
        gas_limit: u64,
        state: &mut AccountStateDb,
        ctx: &ExecutionContext<'_>,
    ) -> (bool, Bytes, Vec<Log>, Option<Address>, u64, i64, HashSet<Address>) {
        let new_address = create_address(sender, tx.nonce());
        let checkpoint = state.checkpoint();

        if state.account_has_code_or_nonce(new_address) {
            state.discard(checkpoint);
            return (false, Bytes::new(), Vec::new(), None, gas_limit, 0, HashSet::new());
        }

        state.set_nonce(new_address, 1);
        let value = tx.value();
        if !value.is_zero() {
            let sender_balance = state.get_balance(sender);
            state.set_balance(sender, sender_balance - value);
            let recipient_balance = state.get_balance(new_address);
            state.set_balance(new_address, recipient_balance + value);
        }

        let init_code = tx.input().to_vec();
        let comp = Computation::new(new_address, sender, value, init_code, Bytes::new(), gas_limit, false, 0, state, ctx);
        let result = comp.run();

        match result.error {
            None => {
                let code = result.output;
                let code_rejected = (code.first() == Some(&RESERVED_CODE_PREFIX) && self.fork.is_at_least(Fork::London))
                    || code.len() > MAX_CODE_SIZE;
                if code_rejected {
                    state.discard(checkpoint);
                    return (false, Bytes::new(), Vec::new(), None, gas_limit, 0, HashSet::new());
                }
                let deposit_cost = self.schedule.code_deposit_cost * code.len() as u64;
                if result.gas_left < deposit_cost {
                    state.discard(checkpoint);
                    return (false, Bytes::new(), Vec::new(), None, gas_limit, 0, HashSet::new());
                }
                state.set_code(new_address, code);
                state.commit(checkpoint);
                let execution_gas_used = gas_limit - (result.gas_left - deposit_cost);
                (true, Bytes::new(), result.logs, Some(new_address), execution_gas_used, result.gas_refunded, result.accounts_to_delete)
            }
            Some(ward_interpreter::VMError::Revert) => {
                state.discard(checkpoint);
                let execution_gas_used = gas_limit - result.gas_left;
                (false, result.output, Vec::new(), None, execution_gas_used, 0, HashSet::new())
            }
            Some(_) => {
                state.discard(checkpoint);
                (false, Bytes::new(), Vec::new(), None, gas_limit, 0, HashSet::new())
            }
        }
    }

    /// Deletes selfdestructed accounts, downgrading to EIP-6780's
    /// same-transaction-only rule from Cancun on.
    ///
    /// Only the top-level creation's own address is tracked as "created this
    /// transaction" — a contract spawned mid-execution via `CREATE`/`CREATE2`
    /// and then selfdestructed in the same transaction is not recognized
    /// here, since [`ward_interpreter::ComputationResult`] does not surface
    /// addresses created by nested frames. Such a contract keeps its balance
    /// zeroed (the transfer to the beneficiary always happens) but is not
    /// removed from the trie pre-Cancun-equivalent, erring toward *not*
    /// deleting rather than deleting an account EIP-6780 would have spared.
    fn sweep_selfdestructs(&self, state: &mut AccountStateDb, accounts_to_delete: HashSet<Address>, created_this_tx: Option<Address>) {
        for address in accounts_to_delete {
            let created_here = created_this_tx == Some(address);
            if self.fork.is_before(Fork::Cancun) || created_here {
                state.delete_account(address);
            }
        }
    }

    fn sweep_empty_accounts(&self, state: &mut AccountStateDb) {
        if self.fork.is_before(Fork::SpuriousDragon) {
            return;
        }
        let touched: Vec<Address> = state.touched_accounts().collect();
        for address in touched {
            if state.account_is_empty(address) {
                state.delete_account(address);
            }
        }
    }
}

/// Whether `code` is an EIP-7702 delegation designator: `0xef0100 ++ address`.
fn is_delegation_designator(code: &[u8]) -> bool {
    code.len() == 23 && code[0] == DELEGATION_PREFIX[0] && code[1] == DELEGATION_PREFIX[1] && code[2] == 0x00
}

fn delegation_designator(target: Address) -> Bytes {
    let mut code = Vec::with_capacity(23);
    code.extend_from_slice(&DELEGATION_PREFIX);
    code.push(0x00);
    code.extend_from_slice(target.as_slice());
    Bytes::from(code)
}

/// The code actually executed at `address`: the delegated target's code if
/// `address` carries an EIP-7702 designator, else its own code.
///
/// Resolved only at the top-level `CALL` boundary; nested `CALL`/`CALLCODE`/
/// `DELEGATECALL`/`STATICCALL` inside the interpreter do not yet re-resolve
/// through a delegation, a known gap noted rather than silently accepted.
fn resolve_code(state: &AccountStateDb, address: Address) -> Vec<u8> {
    let code = state.get_code(address);
    if is_delegation_designator(&code) {
        let target = Address::from_slice(&code[3..]);
        debug!(target: "ward_executor", %address, %target, "resolved EIP-7702 delegation");
        return state.get_code(target).to_vec();
    }
    code.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, U256};
    use ward_primitives::access_list::AccessList;
    use ward_primitives::transaction::{Eip1559Tx, LegacyTx, Signature, TransactionKind};

    fn kzg() -> &'static c_kzg::KzgSettings {
        c_kzg::ethereum_kzg_settings()
    }

    fn signed_legacy(nonce: u64, to: Address, value: U256, gas_price: u128) -> (Transaction, Address) {
        // A fixed, valid secp256k1 keypair's signature isn't reproduced here;
        // tests that need a recoverable sender build one via `k256` directly.
        let signing_key = k256::ecdsa::SigningKey::from_bytes(&[7u8; 32].into()).unwrap();
        let tx_unsigned = LegacyTx {
            nonce,
            gas_price,
            gas_limit: 21_000,
            kind: TransactionKind::Call(to),
            value,
            input: Bytes::new(),
            chain_id: Some(1),
            signature: Signature { y_parity: 0, r: U256::ZERO, s: U256::ZERO },
        };
        let hash = tx_unsigned.signature_hash();
        let (sig, recovery_id) = signing_key.sign_prehash_recoverable(hash.as_slice()).unwrap();
        let signed = LegacyTx {
            signature: Signature {
                y_parity: recovery_id.to_byte(),
                r: U256::from_be_slice(&sig.r().to_bytes()),
                s: U256::from_be_slice(&sig.s().to_bytes()),
            },
            ..tx_unsigned
        };
        let tx = Transaction::Legacy(signed);
        let sender = tx.recover_sender().unwrap();
        (tx, sender)
    }

    #[test]
    fn simple_transfer_debits_sender_and_credits_recipient() {
        let settings = kzg();
        let mut state = AccountStateDb::new();
        let to = Address::repeat_byte(0xaa);
        let (tx, sender) = signed_legacy(0, to, U256::from(1_000), 10);
        state.set_balance(sender, U256::from(10_000_000));

        let block = crate::env::BlockContextBuilder::new(Fork::Berlin, settings).chain_id(1).build();
        let executor = TransactionExecutor::new(Fork::Berlin);
        let outcome = executor.execute(&tx, &block, &mut state, 0).unwrap();

        assert!(outcome.success);
        assert_eq!(state.get_balance(to), U256::from(1_000));
        assert_eq!(state.get_nonce(sender), 1);
    }

    #[test]
    fn nonce_mismatch_is_rejected_before_any_state_change() {
        let settings = kzg();
        let mut state = AccountStateDb::new();
        let to = Address::repeat_byte(0xbb);
        let (tx, sender) = signed_legacy(5, to, U256::ZERO, 10);
        state.set_balance(sender, U256::from(10_000_000));

        let block = crate::env::BlockContextBuilder::new(Fork::Berlin, settings).chain_id(1).build();
        let executor = TransactionExecutor::new(Fork::Berlin);
        let err = executor.execute(&tx, &block, &mut state, 0).unwrap_err();
        assert!(matches!(err, ExecutorError::NonceMismatch { account: 0, transaction: 5 }));
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let settings = kzg();
        let mut state = AccountStateDb::new();
        let to = Address::repeat_byte(0xcc);
        let (tx, sender) = signed_legacy(0, to, U256::from(1_000), 10);
        state.set_balance(sender, U256::from(100));

        let block = crate::env::BlockContextBuilder::new(Fork::Berlin, settings).chain_id(1).build();
        let executor = TransactionExecutor::new(Fork::Berlin);
        let err = executor.execute(&tx, &block, &mut state, 0).unwrap_err();
        assert!(matches!(err, ExecutorError::InsufficientBalance));
    }

    #[test]
    fn gas_below_intrinsic_is_rejected() {
        let settings = kzg();
        let mut state = AccountStateDb::new();
        let to = Address::repeat_byte(0xdd);
        let signing_key = k256::ecdsa::SigningKey::from_bytes(&[9u8; 32].into()).unwrap();
        let tx_unsigned = LegacyTx {
            nonce: 0,
            gas_price: 10,
            gas_limit: 1_000,
            kind: TransactionKind::Call(to),
            value: U256::ZERO,
            input: Bytes::new(),
            chain_id: Some(1),
            signature: Signature { y_parity: 0, r: U256::ZERO, s: U256::ZERO },
        };
        let hash = tx_unsigned.signature_hash();
        let (sig, recovery_id) = signing_key.sign_prehash_recoverable(hash.as_slice()).unwrap();
        let tx = Transaction::Legacy(LegacyTx {
            signature: Signature {
                y_parity: recovery_id.to_byte(),
                r: U256::from_be_slice(&sig.r().to_bytes()),
                s: U256::from_be_slice(&sig.s().to_bytes()),
            },
            ..tx_unsigned
        });
        let sender = tx.recover_sender().unwrap();
        state.set_balance(sender, U256::from(10_000_000));

        let block = crate::env::BlockContextBuilder::new(Fork::Berlin, settings).chain_id(1).build();
        let executor = TransactionExecutor::new(Fork::Berlin);
        let err = executor.execute(&tx, &block, &mut state, 0).unwrap_err();
        assert!(matches!(err, ExecutorError::IntrinsicGasTooLow { .. }));
    }

    #[test]
    fn delegation_designator_round_trips() {
        let target = Address::repeat_byte(0x11);
        let code = delegation_designator(target);
        assert!(is_delegation_designator(&code));
        assert_eq!(Address::from_slice(&code[3..]), target);
    }

    fn signed_authorization(signing_key: &k256::ecdsa::SigningKey, chain_id: u64, address: Address, nonce: u64) -> ward_primitives::authorization::SignedAuthorization {
        use ward_primitives::authorization::Authorization;
        let inner = Authorization { chain_id, address, nonce };
        let hash = inner.signature_hash();
        let (sig, recovery_id) = signing_key.sign_prehash_recoverable(hash.as_slice()).unwrap();
        ward_primitives::authorization::SignedAuthorization {
            inner,
            y_parity: recovery_id.to_byte(),
            r: alloy_primitives::B256::from_slice(&sig.r().to_bytes()),
            s: alloy_primitives::B256::from_slice(&sig.s().to_bytes()),
        }
    }

    fn eip7702_tx(authorization_list: Vec<ward_primitives::authorization::SignedAuthorization>) -> Transaction {
        Transaction::Eip7702(ward_primitives::transaction::Eip7702Tx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 1,
            gas_limit: 1_000_000,
            to: Address::ZERO,
            value: U256::ZERO,
            input: Bytes::new(),
            access_list: AccessList::default(),
            authorization_list,
            y_parity: 0,
            r: U256::from(1),
            s: U256::from(1),
        })
    }

    #[test]
    fn authorization_against_existing_account_is_refunded() {
        let settings = kzg();
        let mut state = AccountStateDb::new();
        let authority_key = k256::ecdsa::SigningKey::from_bytes(&[3u8; 32].into()).unwrap();
        let encoded = authority_key.verifying_key().to_encoded_point(false);
        let authority = Address::from_slice(&alloy_primitives::keccak256(&encoded.as_bytes()[1..])[12..]);
        state.set_balance(authority, U256::from(1)); // makes the account pre-exist

        let auth = signed_authorization(&authority_key, 1, Address::repeat_byte(0x42), 0);
        let tx = eip7702_tx(vec![auth]);
        let block = crate::env::BlockContextBuilder::new(Fork::Prague, settings).chain_id(1).build();
        let executor = TransactionExecutor::new(Fork::Prague);

        let refund = executor.apply_authorizations(&tx, &block, &mut state);
        assert_eq!(refund, gas::PER_EMPTY_ACCOUNT_COST - gas::PER_AUTH_BASE_COST);
        assert_eq!(state.get_nonce(authority), 1);
    }

    #[test]
    fn authorization_against_fresh_account_is_not_refunded() {
        let settings = kzg();
        let mut state = AccountStateDb::new();
        let authority_key = k256::ecdsa::SigningKey::from_bytes(&[4u8; 32].into()).unwrap();

        let auth = signed_authorization(&authority_key, 1, Address::repeat_byte(0x42), 0);
        let tx = eip7702_tx(vec![auth]);
        let block = crate::env::BlockContextBuilder::new(Fork::Prague, settings).chain_id(1).build();
        let executor = TransactionExecutor::new(Fork::Prague);

        let refund = executor.apply_authorizations(&tx, &block, &mut state);
        assert_eq!(refund, 0);
    }

    #[test]
    fn eip1559_sample_tx_has_access_list_support() {
        // Sanity check that the Eip1559Tx constructor used elsewhere in this
        // crate's gas tests also satisfies `Transaction::access_list`.
        let tx = Transaction::Eip1559(Eip1559Tx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 1,
            gas_limit: 21_000,
            kind: TransactionKind::Call(Address::ZERO),
            value: U256::ZERO,
            input: Bytes::new(),
            access_list: AccessList::default(),
            y_parity: 0,
            r: U256::from(1),
            s: U256::from(1),
        });
        assert!(tx.access_list().is_some());
    }
}
