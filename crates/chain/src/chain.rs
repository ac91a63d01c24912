//! Block import: execution, root verification, and canonical-chain
//! reconciliation atop a [`ChainDb`].

use crate::block::{receipts_root, transactions_root, Block};
use crate::db::{BlockLocation, ChainDb};
use crate::errors::{ChainError, ChainResult};
use crate::withdrawals::{apply_withdrawals, withdrawals_root};
use alloy_primitives::{Address, B256, U256};
use std::collections::BTreeSet;
use ward_consensus::validate_header;
use ward_executor::{BlockContextBuilder, TransactionExecutor};
use ward_forks::{Fork, ForkSchedule};
use ward_primitives::header::BlockHeader;
use ward_primitives::receipt::{Receipt, ReceiptEnvelope, ReceiptOutcome};
use ward_state::AccountStateDb;

const MAX_BLOCK_HASH_WINDOW: usize = 256;

/// The set of accounts touched while importing a block: the output of
/// [`AccountStateDb::persist`] a caller can use to build a state proof
/// without re-executing the block.
///
/// `AccountStateDb` clears its own touched-account set at the start of every
/// transaction (for EIP-2200 net-metering bookkeeping), so [`Chain`]
/// accumulates it here across the whole block instead of reading it once at
/// the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Witness {
    /// Every address touched by a transaction or withdrawal in the block,
    /// in ascending order.
    pub touched_addresses: Vec<Address>,
}

/// What importing a block changed about the canonical chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// The imported block's hash.
    pub imported: B256,
    /// Blocks that became canonical, oldest first. Empty if the import was
    /// accepted onto a side chain without becoming canonical.
    pub new_canonical: Vec<B256>,
    /// Canonical blocks displaced by a reorg, oldest first. Empty unless a
    /// reorg occurred.
    pub old_canonical: Vec<B256>,
    /// Accounts touched while executing the block.
    pub witness: Witness,
}

/// Drives block import against a [`ChainDb`] and a fork schedule.
///
/// Mirrors the executor's own stateless-but-configured shape: built once per
/// chain, reused across every imported block.
pub struct Chain<D: ChainDb> {
    db: D,
    fork_schedule: ForkSchedule,
    chain_id: u64,
}

impl<D: ChainDb> Chain<D> {
    /// Builds a chain driver over `db`, using `fork_schedule` to pick the
    /// active ruleset per block number and `chain_id` for EIP-155 replay
    /// protection checks delegated to the executor.
    pub fn new(db: D, fork_schedule: ForkSchedule, chain_id: u64) -> Self {
        Self { db, fork_schedule, chain_id }
    }

    /// The backing store, for callers that need to inspect it directly.
    pub fn db(&self) -> &D {
        &self.db
    }

    /// Imports `block`: executes its transactions against `state`, applies
    /// post-Shanghai withdrawals, and (when `validate` is set) checks the
    /// header against its parent and every trie root the header declares
    /// against what was actually computed.
    ///
    /// Persists the block and reconciles the canonical chain whether or not
    /// `validate` is set; callers that already trust a block's correctness
    /// (e.g. replaying a previously-validated chain) can skip the root
    /// checks without skipping persistence.
    pub fn import_block(
        &mut self,
        block: Block,
        state: &mut AccountStateDb,
        kzg_settings: &c_kzg::KzgSettings,
        validate: bool,
    ) -> ChainResult<ImportOutcome> {
        let fork = self.fork_schedule.fork_at(block.header.number);

        if validate && block.header.number > 0 {
            let parent = self
                .db
                .header_by_hash(block.header.parent_hash)
                .ok_or(ChainError::HeaderNotFound { hash: block.header.parent_hash })?;
            validate_header(fork, &block.header, &parent)?;
        }

        let mut touched = BTreeSet::new();
        let receipts = self.execute_block(&block, fork, state, kzg_settings, &mut touched)?;

        if fork.is_at_least(Fork::Shanghai) {
            let withdrawals =
                block.body.withdrawals.as_ref().ok_or(ChainError::MissingWithdrawals)?;
            apply_withdrawals(state, withdrawals);
            touched.extend(state.touched_accounts());
        }

        if validate {
            self.verify_roots(&block, fork, &receipts, state)?;
        } else {
            state.make_state_root();
        }

        let score = self.compute_score(&block.header)?;
        self.db.put_block(&block, &receipts, score);
        for (index, tx) in block.body.transactions.iter().enumerate() {
            self.db.put_transaction_location(
                tx.hash(),
                BlockLocation { block_number: block.header.number, index: index as u64 },
            );
        }

        let hash = block.hash();
        let (new_canonical, old_canonical) = self.reconcile_canonical_chain(&block, fork)?;
        let witness = Witness { touched_addresses: touched.into_iter().collect() };

        if !old_canonical.is_empty() {
            tracing::warn!(
                number = block.header.number,
                depth = old_canonical.len(),
                "reorg: displaced {} canonical block(s)",
                old_canonical.len()
            );
        } else if !new_canonical.is_empty() {
            tracing::debug!(number = block.header.number, %hash, "imported block onto canonical chain");
        } else {
            tracing::debug!(number = block.header.number, %hash, "imported block onto a side chain");
        }

        Ok(ImportOutcome { imported: hash, new_canonical, old_canonical, witness })
    }

    fn execute_block(
        &self,
        block: &Block,
        fork: Fork,
        state: &mut AccountStateDb,
        kzg_settings: &c_kzg::KzgSettings,
        touched: &mut BTreeSet<Address>,
    ) -> ChainResult<Vec<ReceiptEnvelope>> {
        let recent_block_hashes = self.recent_block_hashes(&block.header);
        let blob_base_fee = block
            .header
            .excess_blob_gas
            .map(|excess| U256::from(alloy_eips::eip4844::calc_blob_gas_price(excess)))
            .unwrap_or(U256::ZERO);
        let difficulty_or_prevrandao = if fork.is_at_least(Fork::Paris) {
            U256::from_be_bytes(block.header.mix_hash.0)
        } else {
            block.header.difficulty
        };

        let context = BlockContextBuilder::new(fork, kzg_settings)
            .coinbase(block.header.beneficiary)
            .block(block.header.number, block.header.timestamp)
            .difficulty_or_prevrandao(difficulty_or_prevrandao)
            .gas_limit(block.header.gas_limit)
            .chain_id(self.chain_id)
            .base_fee_per_gas(block.header.base_fee_per_gas.unwrap_or(0))
            .blob_base_fee(blob_base_fee)
            .recent_block_hashes(recent_block_hashes)
            .build();

        let executor = TransactionExecutor::new(fork);
        let mut cumulative_gas_used = 0u64;
        let mut receipts = Vec::with_capacity(block.body.transactions.len());
        for tx in &block.body.transactions {
            let outcome = executor.execute(tx, &context, state, cumulative_gas_used)?;
            cumulative_gas_used += outcome.gas.gas_used;
            touched.extend(state.touched_accounts());
            let outcome_kind = if fork.is_at_least(Fork::Byzantium) {
                ReceiptOutcome::Status(outcome.success)
            } else {
                ReceiptOutcome::StateRoot(state.make_state_root())
            };
            let receipt = Receipt::new(outcome_kind, cumulative_gas_used, outcome.logs);
            receipts.push(ReceiptEnvelope { tx_type: tx.tx_type(), receipt });
        }
        Ok(receipts)
    }

    fn verify_roots(
        &self,
        block: &Block,
        fork: Fork,
        receipts: &[ReceiptEnvelope],
        state: &mut AccountStateDb,
    ) -> ChainResult<()> {
        let computed_transactions_root = transactions_root(&block.body.transactions);
        if computed_transactions_root != block.header.transactions_root {
            return Err(ChainError::TransactionsRootMismatch {
                expected: block.header.transactions_root,
                actual: computed_transactions_root,
            });
        }

        let computed_receipts_root = receipts_root(receipts);
        if computed_receipts_root != block.header.receipts_root {
            return Err(ChainError::ReceiptsRootMismatch {
                expected: block.header.receipts_root,
                actual: computed_receipts_root,
            });
        }

        if fork.is_at_least(Fork::Shanghai) {
            let withdrawals = block.body.withdrawals.as_deref().unwrap_or(&[]);
            let computed_withdrawals_root = withdrawals_root(withdrawals);
            if Some(computed_withdrawals_root) != block.header.withdrawals_root {
                return Err(ChainError::WithdrawalsRootMismatch {
                    expected: block.header.withdrawals_root.unwrap_or_default(),
                    actual: computed_withdrawals_root,
                });
            }
        }

        let computed_gas_used =
            receipts.last().map(|envelope| envelope.receipt.cumulative_gas_used).unwrap_or(0);
        if computed_gas_used != block.header.gas_used {
            return Err(ChainError::GasUsedMismatch { expected: block.header.gas_used, actual: computed_gas_used });
        }

        let computed_state_root = state.make_state_root();
        if computed_state_root != block.header.state_root {
            return Err(ChainError::StateRootMismatch {
                expected: block.header.state_root,
                actual: computed_state_root,
            });
        }

        Ok(())
    }

    /// The last 256 block hashes before `header`, oldest first, for
    /// `BLOCKHASH`. Truncates early if fewer than 256 ancestors are stored.
    fn recent_block_hashes(&self, header: &BlockHeader) -> Vec<B256> {
        let mut hashes = Vec::new();
        let mut hash = header.parent_hash;
        loop {
            hashes.push(hash);
            if hashes.len() >= MAX_BLOCK_HASH_WINDOW {
                break;
            }
            let Some(parent) = self.db.header_by_hash(hash) else { break };
            if parent.number == 0 {
                break;
            }
            hash = parent.parent_hash;
        }
        hashes.reverse();
        hashes
    }

    fn compute_score(&self, header: &BlockHeader) -> ChainResult<U256> {
        if header.number == 0 {
            return Ok(header.difficulty);
        }
        let parent_score = self
            .db
            .score(header.parent_hash)
            .ok_or(ChainError::MissingScore { hash: header.parent_hash })?;
        Ok(parent_score + header.difficulty)
    }

    /// Extends or reorganizes the canonical chain onto `block`.
    ///
    /// Pre-Paris, a side chain only displaces the canonical head once its
    /// cumulative difficulty exceeds it (the usual heaviest-chain rule).
    /// From Paris on, difficulty is always zero and carries no weight; the
    /// caller (standing in for a consensus client's forkchoice update) is
    /// trusted to only import blocks it wants to become canonical.
    fn reconcile_canonical_chain(&mut self, block: &Block, fork: Fork) -> ChainResult<(Vec<B256>, Vec<B256>)> {
        let hash = block.hash();
        let current_head = self.db.canonical_head();

        if current_head.is_none() || current_head == Some(block.header.parent_hash) {
            self.db.canonicalize(block.header.number, hash);
            self.db.set_canonical_head(hash);
            let mut gaps = self.db.gaps();
            gaps.fill_gap(block.header.number)?;
            self.db.set_gaps(gaps);
            return Ok((vec![hash], Vec::new()));
        }

        let head_hash = current_head.unwrap();
        if fork.is_before(Fork::Paris) {
            let new_score = self.db.score(hash).ok_or(ChainError::MissingScore { hash })?;
            let head_score =
                self.db.score(head_hash).ok_or(ChainError::MissingScore { hash: head_hash })?;
            if new_score <= head_score {
                return Ok((Vec::new(), Vec::new()));
            }
        }

        self.reorganize_onto(block, hash)
    }

    /// Walks the new branch back to its fork point with the current
    /// canonical chain, decanonicalizes the displaced suffix, and
    /// canonicalizes the new branch in its place.
    fn reorganize_onto(&mut self, block: &Block, hash: B256) -> ChainResult<(Vec<B256>, Vec<B256>)> {
        let mut new_branch = vec![hash];
        let mut cursor = block.header.clone();
        while self.db.hash_by_number(cursor.number) != Some(cursor.parent_hash) {
            if cursor.number == 0 {
                return Err(ChainError::ReorgAncestorNotFound { at_number: block.header.number });
            }
            let parent_hash = cursor.parent_hash;
            new_branch.push(parent_hash);
            cursor =
                self.db.header_by_hash(parent_hash).ok_or(ChainError::HeaderNotFound { hash: parent_hash })?;
        }
        let ancestor_number = cursor.number;

        let mut old_branch = Vec::new();
        let mut number = ancestor_number + 1;
        while let Some(displaced_hash) = self.db.hash_by_number(number) {
            if let Some(body) = self.db.body_by_hash(displaced_hash) {
                for tx in &body.transactions {
                    self.db.remove_transaction_location(tx.hash());
                }
            }
            self.db.decanonicalize(number);
            old_branch.push(displaced_hash);
            number += 1;
        }

        for (offset, branch_hash) in new_branch.iter().rev().enumerate() {
            self.db.canonicalize(ancestor_number + 1 + offset as u64, *branch_hash);
        }
        self.db.set_canonical_head(hash);

        let mut gaps = self.db.gaps();
        gaps.fill_gap(block.header.number)?;
        self.db.set_gaps(gaps);

        new_branch.reverse();
        Ok((new_branch, old_branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBody;
    use crate::db::InMemoryChainDb;
    use alloy_primitives::{Address, Bytes};
    use ward_forks::ForkSchedule;
    use ward_primitives::transaction::{LegacyTx, Signature, Transaction, TransactionKind};

    fn kzg_settings() -> &'static c_kzg::KzgSettings {
        c_kzg::ethereum_kzg_settings()
    }

    fn signed_legacy(nonce: u64, to: Address, value: U256, gas_price: u128) -> (Transaction, Address) {
        let signing_key = k256::ecdsa::SigningKey::from_bytes(&[11u8; 32].into()).unwrap();
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

    fn genesis_block() -> Block {
        let header = BlockHeader {
            number: 0,
            gas_limit: 30_000_000,
            state_root: ward_trie::EMPTY_ROOT_HASH,
            ..BlockHeader::default()
        };
        Block { header, body: BlockBody::default() }
    }

    fn chain_with_genesis() -> (Chain<InMemoryChainDb>, AccountStateDb) {
        let mut db = InMemoryChainDb::default();
        let mut state = AccountStateDb::new();
        let genesis = genesis_block();
        db.put_block(&genesis, &[], U256::ZERO);
        db.canonicalize(0, genesis.hash());
        db.set_canonical_head(genesis.hash());
        let mut gaps = db.gaps();
        gaps.fill_gap(0).unwrap();
        db.set_gaps(gaps);
        (Chain::new(db, ForkSchedule::mainnet(), 1), state)
    }

    fn empty_child_header(parent_hash: B256, number: u64) -> BlockHeader {
        BlockHeader {
            number,
            parent_hash,
            gas_limit: 30_000_000,
            gas_used: 0,
            state_root: ward_trie::EMPTY_ROOT_HASH,
            transactions_root: ward_trie::EMPTY_ROOT_HASH,
            receipts_root: ward_trie::EMPTY_ROOT_HASH,
            ..BlockHeader::default()
        }
    }

    #[test]
    fn importing_an_empty_block_extends_the_canonical_chain() {
        let (mut chain, mut state) = chain_with_genesis();
        let genesis_hash = chain.db().canonical_head().unwrap();
        let header = empty_child_header(genesis_hash, 1);
        let block = Block { header, body: BlockBody::default() };
        let kzg = kzg_settings();

        let outcome = chain.import_block(block.clone(), &mut state, kzg, false).unwrap();
        assert_eq!(outcome.imported, block.hash());
        assert_eq!(outcome.new_canonical, vec![block.hash()]);
        assert_eq!(chain.db().canonical_head(), Some(block.hash()));
        assert_eq!(chain.db().hash_by_number(1), Some(block.hash()));
    }

    #[test]
    fn importing_rejects_a_header_with_the_wrong_state_root() {
        let (mut chain, mut state) = chain_with_genesis();
        let genesis_hash = chain.db().canonical_head().unwrap();
        let mut header = empty_child_header(genesis_hash, 1);
        header.state_root = B256::repeat_byte(0xee);
        let block = Block { header, body: BlockBody::default() };
        let kzg = kzg_settings();

        let result = chain.import_block(block, &mut state, kzg, true);
        assert!(matches!(result, Err(ChainError::StateRootMismatch { .. })));
    }

    #[test]
    fn same_weight_side_chain_does_not_displace_the_canonical_head() {
        let (mut chain, mut state) = chain_with_genesis();
        let genesis_hash = chain.db().canonical_head().unwrap();
        let kzg = kzg_settings();

        let block_a = Block { header: empty_child_header(genesis_hash, 1), body: BlockBody::default() };
        chain.import_block(block_a.clone(), &mut state, kzg, false).unwrap();

        let mut header_b = empty_child_header(genesis_hash, 1);
        header_b.beneficiary = Address::repeat_byte(1);
        let block_b = Block { header: header_b, body: BlockBody::default() };
        let outcome = chain.import_block(block_b.clone(), &mut state, kzg, false).unwrap();

        assert!(outcome.new_canonical.is_empty());
        assert!(outcome.old_canonical.is_empty());
        assert_eq!(chain.db().canonical_head(), Some(block_a.hash()));
    }

    #[test]
    fn reorg_decanonicalizes_the_old_branch_and_canonicalizes_the_new_one() {
        // Past Paris, difficulty carries no weight, so an arriving block
        // whose parent is not the current head always triggers a reorg.
        let fork_schedule = ForkSchedule::new(vec![(0, Fork::Frontier), (1, Fork::Paris)]);
        let mut db = InMemoryChainDb::default();
        let mut state = AccountStateDb::new();
        let genesis = genesis_block();
        db.put_block(&genesis, &[], U256::ZERO);
        db.canonicalize(0, genesis.hash());
        db.set_canonical_head(genesis.hash());
        let mut chain = Chain::new(db, fork_schedule, 1);
        let genesis_hash = genesis.hash();
        let kzg = kzg_settings();

        let block_a = Block { header: empty_child_header(genesis_hash, 1), body: BlockBody::default() };
        chain.import_block(block_a.clone(), &mut state, kzg, false).unwrap();
        assert_eq!(chain.db().canonical_head(), Some(block_a.hash()));

        let mut header_b = empty_child_header(genesis_hash, 1);
        header_b.beneficiary = Address::repeat_byte(1);
        let block_b = Block { header: header_b, body: BlockBody::default() };
        let outcome = chain.import_block(block_b.clone(), &mut state, kzg, false).unwrap();

        assert_eq!(outcome.new_canonical, vec![block_b.hash()]);
        assert_eq!(outcome.old_canonical, vec![block_a.hash()]);
        assert_eq!(chain.db().canonical_head(), Some(block_b.hash()));
        assert_eq!(chain.db().hash_by_number(1), Some(block_b.hash()));
    }

    #[test]
    fn gaps_advance_past_imported_blocks() {
        let (mut chain, mut state) = chain_with_genesis();
        let genesis_hash = chain.db().canonical_head().unwrap();
        let kzg = kzg_settings();
        let block = Block { header: empty_child_header(genesis_hash, 1), body: BlockBody::default() };
        chain.import_block(block, &mut state, kzg, false).unwrap();
        assert_eq!(chain.db().gaps().tip_child, 2);
    }

    #[test]
    fn witness_names_every_address_touched_by_a_transaction() {
        let (mut chain, mut state) = chain_with_genesis();
        let genesis_hash = chain.db().canonical_head().unwrap();
        let kzg = kzg_settings();

        let recipient = Address::repeat_byte(0xaa);
        let (tx, sender) = signed_legacy(0, recipient, U256::from(1_000), 10);
        state.set_balance(sender, U256::from(10_000_000));

        let mut header = empty_child_header(genesis_hash, 1);
        header.gas_used = 21_000;
        let block = Block { header, body: BlockBody { transactions: vec![tx], ..BlockBody::default() } };

        let outcome = chain.import_block(block, &mut state, kzg, false).unwrap();
        assert!(outcome.witness.touched_addresses.contains(&sender));
        assert!(outcome.witness.touched_addresses.contains(&recipient));
    }
}
