//! Local ledger that runs the program's state transitions in-process.
//!
//! Accounts live in a map of `address -> (version, record)`. A submission
//! snapshots every account it names, executes against the snapshot, then
//! commits only if none of those versions moved in the meantime; otherwise
//! it re-executes against fresh state. Two submissions racing for one offer
//! therefore serialize, and the loser sees the winner's writes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::{system_program, AccountSerialize};
use anchor_spl::token::spl_token;
use anchor_spl::token::spl_token::solana_program::program_pack::Pack;
use async_trait::async_trait;
use log::{debug, info};
use peer_lending::error::LendingError;
use peer_lending::state::{BorrowerProfile, Loan, LoanOffer, Obligation, OfferTerms};
use solana_sdk::signature::Signature;

use crate::error::LedgerError;
use crate::ledger::{Ledger, LendingInstruction, TokenHolding, TxStatus};
use crate::pda::{self, Role};

/// Attempts before a submission under constant contention gives up
const MAX_COMMIT_ATTEMPTS: usize = 64;

#[derive(Clone, Debug)]
struct MintState {
    decimals: u8,
}

#[derive(Clone, Debug)]
enum Record {
    Offer(LoanOffer),
    Obligation(Obligation),
    Loan(Loan),
    Profile(BorrowerProfile),
    Token(TokenHolding),
    Mint(MintState),
}

impl Record {
    fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        let mut data = Vec::new();
        let encoded = match self {
            Record::Offer(a) => a.try_serialize(&mut data),
            Record::Obligation(a) => a.try_serialize(&mut data),
            Record::Loan(a) => a.try_serialize(&mut data),
            Record::Profile(a) => a.try_serialize(&mut data),
            Record::Token(t) => {
                let account = spl_token::state::Account {
                    mint: t.mint,
                    owner: t.owner,
                    amount: t.amount,
                    state: spl_token::state::AccountState::Initialized,
                    ..Default::default()
                };
                data.resize(spl_token::state::Account::LEN, 0);
                return spl_token::state::Account::pack(account, &mut data)
                    .map(|_| data)
                    .map_err(|e| LedgerError::Failed(e.to_string()));
            }
            Record::Mint(m) => {
                let mint = spl_token::state::Mint {
                    decimals: m.decimals,
                    is_initialized: true,
                    ..Default::default()
                };
                data.resize(spl_token::state::Mint::LEN, 0);
                return spl_token::state::Mint::pack(mint, &mut data)
                    .map(|_| data)
                    .map_err(|e| LedgerError::Failed(e.to_string()));
            }
        };
        encoded
            .map(|_| data)
            .map_err(|e| LedgerError::Failed(e.to_string()))
    }
}

/// Typed access to a record kind
trait Stored: Clone {
    const KIND: &'static str;
    fn from_record(record: &Record) -> Option<&Self>;
    fn into_record(self) -> Record;
}

macro_rules! stored {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl Stored for $ty {
            const KIND: &'static str = $kind;
            fn from_record(record: &Record) -> Option<&Self> {
                match record {
                    Record::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
            fn into_record(self) -> Record {
                Record::$variant(self)
            }
        }
    };
}

stored!(LoanOffer, Offer, "loan offer");
stored!(Obligation, Obligation, "obligation");
stored!(Loan, Loan, "loan");
stored!(BorrowerProfile, Profile, "borrower profile");
stored!(TokenHolding, Token, "token account");
stored!(MintState, Mint, "mint");

#[derive(Clone, Debug)]
struct Versioned {
    version: u64,
    record: Record,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Pubkey, Versioned>,
    statuses: HashMap<Signature, TxStatus>,
    clock: i64,
    submitted: u64,
    confirmations_held: bool,
}

impl State {
    fn next_signature(&mut self) -> Signature {
        self.submitted += 1;
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&self.submitted.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.clock.to_le_bytes());
        Signature::from(bytes)
    }

    fn insert(&mut self, address: Pubkey, record: Record) {
        let version = self.accounts.get(&address).map_or(1, |v| v.version + 1);
        self.accounts.insert(address, Versioned { version, record });
    }
}

fn rejected(err: anchor_lang::error::Error) -> LedgerError {
    match LendingError::from_anchor(&err) {
        Some(kind) => LedgerError::Rejected(kind),
        None => LedgerError::Failed(err.to_string()),
    }
}

fn check_token(holding: &TokenHolding, mint: &Pubkey, owner: &Pubkey) -> Result<(), LedgerError> {
    if holding.mint != *mint {
        return Err(LedgerError::Rejected(LendingError::InvalidTokenMint));
    }
    if holding.owner != *owner {
        return Err(LedgerError::Rejected(LendingError::InvalidTokenOwner));
    }
    Ok(())
}

// ============================================================================
// TRANSACTION OVERLAY
// ============================================================================

/// One execution attempt: a versioned read set and a write set
struct Txn {
    program_id: Pubkey,
    now: i64,
    reads: HashMap<Pubkey, Option<u64>>,
    snapshot: HashMap<Pubkey, Record>,
    writes: HashMap<Pubkey, Record>,
}

impl Txn {
    fn begin(state: &State, keys: &[Pubkey], program_id: Pubkey) -> Self {
        let mut reads = HashMap::new();
        let mut snapshot = HashMap::new();
        for key in keys {
            let current = state.accounts.get(key);
            reads.insert(*key, current.map(|v| v.version));
            if let Some(v) = current {
                snapshot.insert(*key, v.record.clone());
            }
        }
        Txn {
            program_id,
            now: state.clock,
            reads,
            snapshot,
            writes: HashMap::new(),
        }
    }

    fn still_current(&self, state: &State) -> bool {
        self.reads
            .iter()
            .all(|(key, seen)| state.accounts.get(key).map(|v| v.version) == *seen)
    }

    fn commit(self, state: &mut State) {
        for (address, record) in self.writes {
            state.insert(address, record);
        }
    }

    fn load<T: Stored>(&self, key: &Pubkey) -> Result<Option<T>, LedgerError> {
        let Some(record) = self.writes.get(key).or_else(|| self.snapshot.get(key)) else {
            return Ok(None);
        };
        T::from_record(record)
            .cloned()
            .map(Some)
            .ok_or_else(|| LedgerError::Failed(format!("account {key} is not a {}", T::KIND)))
    }

    /// Missing accounts fail the way an uninitialized Anchor account does
    fn require<T: Stored>(&self, key: &Pubkey) -> Result<T, LedgerError> {
        self.load(key)?.ok_or_else(|| {
            LedgerError::Failed(format!("{} {key} is not initialized", T::KIND))
        })
    }

    fn store<T: Stored>(&mut self, key: Pubkey, value: T) {
        self.writes.insert(key, value.into_record());
    }

    fn expect_pda(&self, actual: &Pubkey, role: Role, inputs: &[Pubkey]) -> Result<u8, LedgerError> {
        let (expected, bump) = match (role, inputs) {
            (Role::Offer, [lender, mint]) => pda::offer_address(lender, mint, &self.program_id),
            (Role::Vault, [offer]) => pda::vault_address(offer, &self.program_id),
            (Role::Obligation, [borrower]) => pda::obligation_address(borrower, &self.program_id),
            (Role::CollateralVault, [borrower, mint]) => {
                pda::collateral_vault_address(borrower, mint, &self.program_id)
            }
            (Role::Loan, [offer, borrower]) => pda::loan_address(offer, borrower, &self.program_id),
            (Role::BorrowerProfile, [borrower]) => {
                pda::borrower_profile_address(borrower, &self.program_id)
            }
            _ => {
                return Err(LedgerError::Failed(format!(
                    "{role:?} derived from {} input(s)",
                    inputs.len()
                )))
            }
        };
        if *actual != expected {
            return Err(LedgerError::Failed(format!(
                "seeds constraint violated for {role:?}: expected {expected}, got {actual}"
            )));
        }
        Ok(bump)
    }

    fn expect_program(&self, actual: &Pubkey, expected: &Pubkey) -> Result<(), LedgerError> {
        if actual != expected {
            return Err(LedgerError::Failed(format!(
                "invalid program id: expected {expected}, got {actual}"
            )));
        }
        Ok(())
    }

    /// Token account created on first use with the given mint and authority
    fn token_or_init(&mut self, key: Pubkey, mint: Pubkey, owner: Pubkey) -> Result<(), LedgerError> {
        match self.load::<TokenHolding>(&key)? {
            Some(existing) => {
                if existing.mint != mint || existing.owner != owner {
                    return Err(LedgerError::Failed(format!(
                        "token account {key} exists with a different mint or authority"
                    )));
                }
            }
            None => self.store(
                key,
                TokenHolding {
                    address: key,
                    mint,
                    owner,
                    amount: 0,
                },
            ),
        }
        Ok(())
    }

    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        let mut source = self.require::<TokenHolding>(from)?;
        if source.mint != self.require::<TokenHolding>(to)?.mint {
            return Err(LedgerError::Failed("account not associated with this mint".into()));
        }
        source.amount = source
            .amount
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::Failed(format!("insufficient funds in {from}")))?;
        self.store(*from, source);

        // Read after the debit so a self-transfer nets to zero
        let mut destination = self.require::<TokenHolding>(to)?;
        destination.amount = destination
            .amount
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Failed("token amount overflow".into()))?;
        self.store(*to, destination);
        Ok(())
    }

    fn execute(
        &mut self,
        instruction: LendingInstruction,
        ix: &Instruction,
        payer: &Pubkey,
    ) -> Result<(), LedgerError> {
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        if keys.len() < instruction.account_count() {
            return Err(LedgerError::Failed("not enough account keys".into()));
        }
        if let Some(signer) = ix.accounts.first() {
            if !signer.is_signer || signer.pubkey != *payer {
                return Err(LedgerError::Failed(format!(
                    "missing required signature for {}",
                    signer.pubkey
                )));
            }
        }

        match instruction {
            LendingInstruction::Initialize => Ok(()),
            LendingInstruction::InitializeBorrowerProfile => self.initialize_borrower_profile(&keys),
            LendingInstruction::CreateOffer(terms) => self.create_offer(&keys, &terms),
            LendingInstruction::CreateObligation { deposit_amount } => {
                self.create_obligation(&keys, deposit_amount)
            }
            LendingInstruction::AcceptLoan => self.accept_loan(&keys),
            LendingInstruction::RepayLoan { repayment_amount } => {
                self.repay_loan(&keys, repayment_amount)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Instructions. Account order matches the program's Accounts structs.
    // ------------------------------------------------------------------------

    fn initialize_borrower_profile(&mut self, keys: &[Pubkey]) -> Result<(), LedgerError> {
        let (borrower, profile_key) = (keys[0], keys[1]);
        self.expect_program(&keys[2], &system_program::ID)?;
        let bump = self.expect_pda(&profile_key, Role::BorrowerProfile, &[borrower])?;
        if self.load::<BorrowerProfile>(&profile_key)?.is_some() {
            return Err(LedgerError::Failed(format!("account {profile_key} already in use")));
        }

        let mut profile = BorrowerProfile::default();
        profile.init(borrower, self.now, bump);
        self.store(profile_key, profile);
        Ok(())
    }

    fn create_offer(&mut self, keys: &[Pubkey], terms: &OfferTerms) -> Result<(), LedgerError> {
        let (lender, offer_key, vault_key, lender_token, mint) =
            (keys[0], keys[1], keys[2], keys[3], keys[4]);
        self.expect_program(&keys[5], &anchor_spl::token::ID)?;
        self.expect_program(&keys[6], &system_program::ID)?;
        self.require::<MintState>(&mint)?;

        let offer_bump = self.expect_pda(&offer_key, Role::Offer, &[lender, mint])?;
        let mut offer = self.load::<LoanOffer>(&offer_key)?.unwrap_or_default();
        self.expect_pda(&vault_key, Role::Vault, &[offer_key])?;
        self.token_or_init(vault_key, mint, offer_key)?;
        check_token(&self.require(&lender_token)?, &mint, &lender)?;

        offer
            .open(lender, mint, vault_key, terms, self.now, offer_bump)
            .map_err(rejected)?;
        self.store(offer_key, offer);
        self.transfer(&lender_token, &vault_key, terms.amount)
    }

    fn create_obligation(&mut self, keys: &[Pubkey], deposit_amount: u64) -> Result<(), LedgerError> {
        let (borrower, obligation_key, collateral_vault, source, mint) =
            (keys[0], keys[1], keys[2], keys[3], keys[4]);
        self.expect_program(&keys[5], &anchor_spl::token::ID)?;
        self.expect_program(&keys[6], &system_program::ID)?;
        self.require::<MintState>(&mint)?;

        let bump = self.expect_pda(&obligation_key, Role::Obligation, &[borrower])?;
        let mut obligation = self.load::<Obligation>(&obligation_key)?.unwrap_or_default();
        self.expect_pda(&collateral_vault, Role::CollateralVault, &[borrower, mint])?;
        self.token_or_init(collateral_vault, mint, obligation_key)?;
        check_token(&self.require(&source)?, &mint, &borrower)?;

        obligation
            .deposit(borrower, mint, collateral_vault, deposit_amount, bump)
            .map_err(rejected)?;
        self.store(obligation_key, obligation);
        self.transfer(&source, &collateral_vault, deposit_amount)
    }

    fn accept_loan(&mut self, keys: &[Pubkey]) -> Result<(), LedgerError> {
        let (borrower, offer_key, vault_key, loan_key, obligation_key, profile_key) =
            (keys[0], keys[1], keys[2], keys[3], keys[4], keys[5]);
        let (destination, mint) = (keys[6], keys[7]);
        self.expect_program(&keys[8], &anchor_spl::token::ID)?;
        self.expect_program(&keys[9], &system_program::ID)?;

        let mut offer = self.require::<LoanOffer>(&offer_key)?;
        self.expect_pda(&offer_key, Role::Offer, &[offer.lender, mint])?;
        if offer.token_mint != mint {
            return Err(LedgerError::Rejected(LendingError::InvalidTokenMint));
        }
        if offer.vault != vault_key {
            return Err(LedgerError::Rejected(LendingError::InvalidVault));
        }
        self.expect_pda(&vault_key, Role::Vault, &[offer_key])?;

        let loan_bump = self.expect_pda(&loan_key, Role::Loan, &[offer_key, borrower])?;
        let mut loan = self.load::<Loan>(&loan_key)?.unwrap_or_default();

        let mut obligation = self.require::<Obligation>(&obligation_key)?;
        self.expect_pda(&obligation_key, Role::Obligation, &[borrower])?;
        if obligation.borrower != borrower {
            return Err(LedgerError::Rejected(LendingError::InvalidLoanAccount));
        }

        let profile = self.require::<BorrowerProfile>(&profile_key)?;
        self.expect_pda(&profile_key, Role::BorrowerProfile, &[borrower])?;
        check_token(&self.require(&destination)?, &mint, &borrower)?;
        self.require::<MintState>(&mint)?;

        let principal = loan
            .accept(
                offer_key,
                &mut offer,
                &mut obligation,
                borrower,
                profile.score,
                self.now,
                loan_bump,
            )
            .map_err(rejected)?;

        if self.require::<TokenHolding>(&vault_key)?.amount < principal {
            return Err(LedgerError::Rejected(LendingError::InvalidVault));
        }

        self.store(offer_key, offer);
        self.store(obligation_key, obligation);
        self.store(loan_key, loan);
        self.transfer(&vault_key, &destination, principal)
    }

    fn repay_loan(&mut self, keys: &[Pubkey], repayment_amount: u64) -> Result<(), LedgerError> {
        let (borrower, offer_key, loan_key, obligation_key, profile_key) =
            (keys[0], keys[1], keys[2], keys[3], keys[4]);
        let (source, lender_destination, collateral_vault, collateral_destination) =
            (keys[5], keys[6], keys[7], keys[8]);
        self.expect_program(&keys[9], &anchor_spl::token::ID)?;

        let offer = self.require::<LoanOffer>(&offer_key)?;
        self.expect_pda(&offer_key, Role::Offer, &[offer.lender, offer.token_mint])?;

        let mut loan = self.require::<Loan>(&loan_key)?;
        self.expect_pda(&loan_key, Role::Loan, &[offer_key, borrower])?;
        if loan.borrower != borrower || loan.offer != offer_key {
            return Err(LedgerError::Rejected(LendingError::InvalidLoanAccount));
        }

        let mut obligation = self.require::<Obligation>(&obligation_key)?;
        self.expect_pda(&obligation_key, Role::Obligation, &[borrower])?;
        if obligation.borrower != borrower {
            return Err(LedgerError::Rejected(LendingError::InvalidLoanAccount));
        }

        let mut profile = self.require::<BorrowerProfile>(&profile_key)?;
        self.expect_pda(&profile_key, Role::BorrowerProfile, &[borrower])?;

        check_token(&self.require(&source)?, &offer.token_mint, &borrower)?;
        check_token(&self.require(&lender_destination)?, &offer.token_mint, &offer.lender)?;

        self.expect_pda(
            &collateral_vault,
            Role::CollateralVault,
            &[borrower, obligation.collateral_token_mint],
        )?;
        if collateral_vault != obligation.collateral_account {
            return Err(LedgerError::Rejected(LendingError::InvalidVault));
        }
        check_token(
            &self.require(&collateral_destination)?,
            &obligation.collateral_token_mint,
            &borrower,
        )?;

        let repayment = loan
            .repay(&mut obligation, repayment_amount, self.now)
            .map_err(rejected)?;
        profile.reward_repayment(self.now);

        self.store(loan_key, loan);
        self.store(obligation_key, obligation);
        self.store(profile_key, profile);
        self.transfer(&source, &lender_destination, repayment.amount_due)?;
        if repayment.collateral_returned > 0 {
            self.transfer(&collateral_vault, &collateral_destination, repayment.collateral_returned)?;
        }
        Ok(())
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// In-process ledger with a settable clock
pub struct InMemoryLedger {
    program_id: Pubkey,
    state: Mutex<State>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_program_id(peer_lending::ID)
    }

    pub fn with_program_id(program_id: Pubkey) -> Self {
        Self {
            program_id,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // State is only mutated under complete commits, so a poisoned lock
        // still guards consistent data
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn now(&self) -> i64 {
        self.state().clock
    }

    pub fn set_clock(&self, unix_timestamp: i64) {
        self.state().clock = unix_timestamp;
    }

    pub fn advance_clock(&self, seconds: i64) {
        let mut state = self.state();
        state.clock = state.clock.saturating_add(seconds);
    }

    /// While held, every signature reports as unconfirmed
    pub fn hold_confirmations(&self, held: bool) {
        self.state().confirmations_held = held;
    }

    pub fn create_mint(&self, decimals: u8) -> Pubkey {
        let mint = Pubkey::new_unique();
        self.add_mint(mint, decimals);
        mint
    }

    pub fn add_mint(&self, mint: Pubkey, decimals: u8) {
        self.state().insert(mint, Record::Mint(MintState { decimals }));
    }

    pub fn create_token_account(&self, owner: Pubkey, mint: Pubkey, amount: u64) -> Pubkey {
        let address = Pubkey::new_unique();
        self.state().insert(
            address,
            Record::Token(TokenHolding {
                address,
                mint,
                owner,
                amount,
            }),
        );
        address
    }

    pub fn token_balance(&self, address: &Pubkey) -> Option<u64> {
        match self.state().accounts.get(address).map(|v| &v.record) {
            Some(Record::Token(t)) => Some(t.amount),
            _ => None,
        }
    }

    /// Write a borrower's reputation score directly, standing in for the
    /// external authority that maintains it.
    pub fn set_borrower_score(&self, borrower: &Pubkey, score: u64) {
        let (address, bump) = pda::borrower_profile_address(borrower, &self.program_id);
        let mut state = self.state();
        let now = state.clock;
        let mut profile = match state.accounts.get(&address).map(|v| &v.record) {
            Some(Record::Profile(p)) => p.clone(),
            _ => {
                let mut p = BorrowerProfile::default();
                p.init(*borrower, now, bump);
                p
            }
        };
        profile.score = score;
        profile.last_updated = now;
        state.insert(address, Record::Profile(profile));
    }

    /// Current version of an account; bumps on every committed write
    pub fn version(&self, address: &Pubkey) -> Option<u64> {
        self.state().accounts.get(address).map(|v| v.version)
    }

    fn decode(&self, ix: &Instruction) -> Result<LendingInstruction, LedgerError> {
        if ix.program_id != self.program_id {
            return Err(LedgerError::Failed(format!(
                "unsupported program {}",
                ix.program_id
            )));
        }
        LendingInstruction::decode(&ix.data)
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenHolding>, LedgerError> {
        let state = self.state();
        let mut holdings: Vec<TokenHolding> = state
            .accounts
            .values()
            .filter_map(|v| match &v.record {
                Record::Token(t) if t.owner == *owner && t.mint == *mint => Some(t.clone()),
                _ => None,
            })
            .collect();
        holdings.sort_by_key(|t| t.address);
        Ok(holdings)
    }

    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8, LedgerError> {
        match self.state().accounts.get(mint).map(|v| &v.record) {
            Some(Record::Mint(m)) => Ok(m.decimals),
            Some(_) => Err(LedgerError::Failed(format!("account {mint} is not a mint"))),
            None => Err(LedgerError::AccountNotFound(*mint)),
        }
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let record = self.state().accounts.get(address).map(|v| v.record.clone());
        record.map(|r| r.encode()).transpose()
    }

    async fn submit(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
    ) -> Result<Signature, LedgerError> {
        let decoded = instructions
            .iter()
            .map(|ix| self.decode(ix).map(|d| (d, ix)))
            .collect::<Result<Vec<_>, _>>()?;
        let touched: Vec<Pubkey> = instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter().map(|m| m.pubkey))
            .collect();

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut txn = Txn::begin(&self.state(), &touched, self.program_id);

            // Let concurrent submissions interleave between read and commit
            tokio::task::yield_now().await;

            let outcome = decoded
                .iter()
                .try_for_each(|(instruction, ix)| txn.execute(*instruction, ix, payer));

            let mut state = self.state();
            if !txn.still_current(&state) {
                debug!("Write conflict on attempt {}, re-executing", attempt);
                continue;
            }

            return match outcome {
                Ok(()) => {
                    let signature = state.next_signature();
                    txn.commit(&mut state);
                    state.statuses.insert(signature, TxStatus::Confirmed);
                    info!("Committed {} instruction(s) as {}", decoded.len(), signature);
                    Ok(signature)
                }
                Err(err) => {
                    debug!("Simulation rejected transaction: {}", err);
                    Err(err)
                }
            };
        }

        Err(LedgerError::Failed(format!(
            "gave up after {MAX_COMMIT_ATTEMPTS} conflicting attempts"
        )))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TxStatus>, LedgerError> {
        let state = self.state();
        if state.confirmations_held {
            return Ok(None);
        }
        Ok(state.statuses.get(signature).cloned())
    }
}
