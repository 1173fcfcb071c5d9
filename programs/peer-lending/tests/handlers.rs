//! Runs the Anchor handlers themselves under `solana-program-test`, with the
//! SPL token program doing the real transfers.

use anchor_lang::solana_program::account_info::AccountInfo;
use anchor_lang::solana_program::entrypoint::ProgramResult;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::pubkey::Pubkey;
use anchor_lang::{
    system_program, AccountDeserialize, AccountSerialize, InstructionData, Space, ToAccountMetas,
};
use anchor_spl::token::spl_token;
use anchor_spl::token::spl_token::solana_program::program_pack::Pack;
use peer_lending::constants::{
    BORROWER_PROFILE_SEED, COLLATERAL_VAULT_SEED, LOAN_OFFER_SEED, LOAN_SEED, OBLIGATION_SEED,
    VAULT_SEED,
};
use peer_lending::error::LendingError;
use peer_lending::state::{BorrowerProfile, Loan, LoanOffer, Obligation};
use peer_lending::{accounts, instruction as ix};
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::account::Account;
use solana_sdk::instruction::InstructionError;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};

const SOL: u64 = 1_000_000_000;
const DAY: u64 = 86_400;

// Anchor's entry wants one lifetime for the slice and its elements
fn process(program_id: &Pubkey, accounts: &[AccountInfo], data: &[u8]) -> ProgramResult {
    let accounts = Box::leak(Box::new(accounts.to_vec()));
    peer_lending::entry(program_id, accounts, data)
}

fn pda(seeds: &[&[u8]]) -> Pubkey {
    Pubkey::find_program_address(seeds, &peer_lending::ID).0
}

fn offer_key(lender: &Pubkey, mint: &Pubkey) -> Pubkey {
    pda(&[LOAN_OFFER_SEED, lender.as_ref(), mint.as_ref()])
}

fn obligation_key(borrower: &Pubkey) -> Pubkey {
    pda(&[OBLIGATION_SEED, borrower.as_ref()])
}

fn profile_key(borrower: &Pubkey) -> Pubkey {
    pda(&[BORROWER_PROFILE_SEED, borrower.as_ref()])
}

fn collateral_vault_key(borrower: &Pubkey, mint: &Pubkey) -> Pubkey {
    pda(&[COLLATERAL_VAULT_SEED, borrower.as_ref(), mint.as_ref()])
}

struct Wallet {
    keypair: Keypair,
    loan_tokens: Pubkey,
    collateral_tokens: Pubkey,
}

impl Wallet {
    fn key(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

/// Genesis accounts for one market: two mints plus funded wallets
struct Genesis {
    program: ProgramTest,
    loan_mint: Pubkey,
    collateral_mint: Pubkey,
}

impl Genesis {
    fn new() -> Self {
        let mut program = ProgramTest::new("peer_lending", peer_lending::ID, processor!(process));
        program.prefer_bpf(false);
        let mut genesis = Genesis {
            program,
            loan_mint: Pubkey::new_unique(),
            collateral_mint: Pubkey::new_unique(),
        };
        genesis.add_mint(genesis.loan_mint);
        genesis.add_mint(genesis.collateral_mint);
        genesis
    }

    fn add_mint(&mut self, address: Pubkey) {
        let mut data = vec![0; spl_token::state::Mint::LEN];
        spl_token::state::Mint::pack(
            spl_token::state::Mint {
                decimals: 6,
                is_initialized: true,
                ..Default::default()
            },
            &mut data,
        )
        .unwrap();
        self.program.add_account(address, token_owned(data));
    }

    fn add_token_account(&mut self, owner: Pubkey, mint: Pubkey, amount: u64) -> Pubkey {
        let address = Pubkey::new_unique();
        let mut data = vec![0; spl_token::state::Account::LEN];
        spl_token::state::Account::pack(
            spl_token::state::Account {
                mint,
                owner,
                amount,
                state: spl_token::state::AccountState::Initialized,
                ..Default::default()
            },
            &mut data,
        )
        .unwrap();
        self.program.add_account(address, token_owned(data));
        address
    }

    fn wallet(&mut self, loan_amount: u64, collateral_amount: u64) -> Wallet {
        let keypair = Keypair::new();
        let owner = keypair.pubkey();
        self.program.add_account(
            owner,
            Account {
                lamports: 10 * SOL,
                owner: system_program::ID,
                ..Account::default()
            },
        );
        Wallet {
            loan_tokens: self.add_token_account(owner, self.loan_mint, loan_amount),
            collateral_tokens: self.add_token_account(owner, self.collateral_mint, collateral_amount),
            keypair,
        }
    }

    /// A profile with `score`, as the external scoring authority would leave it
    fn add_profile(&mut self, borrower: &Pubkey, score: u64) {
        let (address, bump) = Pubkey::find_program_address(
            &[BORROWER_PROFILE_SEED, borrower.as_ref()],
            &peer_lending::ID,
        );
        let profile = BorrowerProfile {
            borrower: *borrower,
            score,
            last_updated: 0,
            bump,
        };
        let mut data = Vec::new();
        profile.try_serialize(&mut data).unwrap();
        data.resize(8 + BorrowerProfile::INIT_SPACE, 0);
        self.program.add_account(
            address,
            Account {
                lamports: SOL,
                data,
                owner: peer_lending::ID,
                ..Account::default()
            },
        );
    }
}

fn token_owned(data: Vec<u8>) -> Account {
    Account {
        lamports: SOL,
        data,
        owner: spl_token::ID,
        ..Account::default()
    }
}

struct Market {
    ctx: ProgramTestContext,
    loan_mint: Pubkey,
    collateral_mint: Pubkey,
}

impl Market {
    async fn send(&mut self, instruction: Instruction, signer: &Keypair) -> Result<(), BanksClientError> {
        // A fresh blockhash keeps identical retries from being deduplicated
        let blockhash = self.ctx.get_new_latest_blockhash().await.unwrap();
        let tx = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&signer.pubkey()),
            &[signer],
            blockhash,
        );
        self.ctx.banks_client.process_transaction(tx).await
    }

    async fn account(&mut self, address: &Pubkey) -> Option<Account> {
        self.ctx.banks_client.get_account(*address).await.unwrap()
    }

    async fn balance(&mut self, address: &Pubkey) -> u64 {
        let account = self.account(address).await.expect("token account exists");
        spl_token::state::Account::unpack(&account.data).unwrap().amount
    }

    async fn state<T: AccountDeserialize>(&mut self, address: &Pubkey) -> T {
        let account = self.account(address).await.expect("program account exists");
        T::try_deserialize(&mut account.data.as_slice()).unwrap()
    }

    async fn create_offer(&mut self, lender: &Wallet, amount: u64, min_score: u64) -> Result<(), BanksClientError> {
        let offer = offer_key(&lender.key(), &self.loan_mint);
        let instruction = Instruction {
            program_id: peer_lending::ID,
            accounts: accounts::CreateOffer {
                lender: lender.key(),
                loan_offer: offer,
                vault: pda(&[VAULT_SEED, offer.as_ref()]),
                lender_token_account: lender.loan_tokens,
                token_mint: self.loan_mint,
                token_program: spl_token::ID,
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ix::CreateOffer {
                amount,
                interest_rate_bps: 500,
                duration_seconds: 30 * DAY,
                min_score,
            }
            .data(),
        };
        self.send(instruction, &lender.keypair).await
    }

    async fn initialize_profile(&mut self, borrower: &Wallet) -> Result<(), BanksClientError> {
        let instruction = Instruction {
            program_id: peer_lending::ID,
            accounts: accounts::InitializeBorrowerProfile {
                borrower: borrower.key(),
                borrower_profile: profile_key(&borrower.key()),
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ix::InitializeBorrowerProfile {}.data(),
        };
        self.send(instruction, &borrower.keypair).await
    }

    async fn deposit(&mut self, borrower: &Wallet, amount: u64) -> Result<(), BanksClientError> {
        let instruction = Instruction {
            program_id: peer_lending::ID,
            accounts: accounts::CreateObligation {
                borrower: borrower.key(),
                obligation: obligation_key(&borrower.key()),
                collateral_vault: collateral_vault_key(&borrower.key(), &self.collateral_mint),
                borrower_collateral_account: borrower.collateral_tokens,
                collateral_mint: self.collateral_mint,
                token_program: spl_token::ID,
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ix::CreateObligation {
                deposit_amount: amount,
            }
            .data(),
        };
        self.send(instruction, &borrower.keypair).await
    }

    async fn accept(&mut self, borrower: &Wallet, lender: &Pubkey) -> Result<(), BanksClientError> {
        let offer = offer_key(lender, &self.loan_mint);
        let instruction = Instruction {
            program_id: peer_lending::ID,
            accounts: accounts::AcceptLoan {
                borrower: borrower.key(),
                loan_offer: offer,
                vault: pda(&[VAULT_SEED, offer.as_ref()]),
                loan: pda(&[LOAN_SEED, offer.as_ref(), borrower.key().as_ref()]),
                obligation: obligation_key(&borrower.key()),
                borrower_profile: profile_key(&borrower.key()),
                borrower_token_account: borrower.loan_tokens,
                token_mint: self.loan_mint,
                token_program: spl_token::ID,
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ix::AcceptLoan {}.data(),
        };
        self.send(instruction, &borrower.keypair).await
    }

    async fn repay(
        &mut self,
        borrower: &Wallet,
        lender: &Wallet,
        repayment_amount: u64,
    ) -> Result<(), BanksClientError> {
        let offer = offer_key(&lender.key(), &self.loan_mint);
        let instruction = Instruction {
            program_id: peer_lending::ID,
            accounts: accounts::RepayLoan {
                borrower: borrower.key(),
                loan_offer: offer,
                loan: pda(&[LOAN_SEED, offer.as_ref(), borrower.key().as_ref()]),
                obligation: obligation_key(&borrower.key()),
                borrower_profile: profile_key(&borrower.key()),
                borrower_token_account: borrower.loan_tokens,
                lender_token_account: lender.loan_tokens,
                collateral_vault: collateral_vault_key(&borrower.key(), &self.collateral_mint),
                borrower_collateral_account: borrower.collateral_tokens,
                token_program: spl_token::ID,
            }
            .to_account_metas(None),
            data: ix::RepayLoan { repayment_amount }.data(),
        };
        self.send(instruction, &borrower.keypair).await
    }
}

fn lending_error(result: Result<(), BanksClientError>) -> Option<LendingError> {
    match result.expect_err("transaction should fail").unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            LendingError::from_code(code)
        }
        _ => None,
    }
}

#[tokio::test]
async fn offer_to_repayment_through_the_handlers() {
    let mut genesis = Genesis::new();
    let lender = genesis.wallet(5_000_000, 0);
    let borrower = genesis.wallet(2_000_000, 1_000_000);
    let rival = genesis.wallet(0, 1_000_000);
    genesis.add_profile(&borrower.key(), 600);
    genesis.add_profile(&rival.key(), 900);
    let (loan_mint, collateral_mint) = (genesis.loan_mint, genesis.collateral_mint);
    let mut m = Market {
        ctx: genesis.program.start_with_context().await,
        loan_mint,
        collateral_mint,
    };

    let offer = offer_key(&lender.key(), &loan_mint);
    let vault = pda(&[VAULT_SEED, offer.as_ref()]);
    let collateral_vault = collateral_vault_key(&borrower.key(), &collateral_mint);

    // CreateOffer initializes the offer and its vault, then escrows
    m.create_offer(&lender, 1_000_000, 500).await.unwrap();
    assert_eq!(m.balance(&vault).await, 1_000_000);
    assert_eq!(m.balance(&lender.loan_tokens).await, 4_000_000);
    let opened: LoanOffer = m.state(&offer).await;
    assert!(opened.is_active);
    assert_eq!(opened.vault, vault);

    // Collateral, twice, lands in one PDA-owned vault
    m.deposit(&borrower, 300_000).await.unwrap();
    m.deposit(&borrower, 200_000).await.unwrap();
    assert_eq!(m.balance(&collateral_vault).await, 500_000);
    assert_eq!(m.balance(&borrower.collateral_tokens).await, 500_000);
    m.deposit(&rival, 100_000).await.unwrap();

    // Accept pays out from the vault under the offer's signer seeds
    m.accept(&borrower, &lender.key()).await.unwrap();
    assert_eq!(m.balance(&vault).await, 0);
    assert_eq!(m.balance(&borrower.loan_tokens).await, 3_000_000);
    let closed: LoanOffer = m.state(&offer).await;
    assert!(!closed.is_active);
    let loan_address = pda(&[LOAN_SEED, offer.as_ref(), borrower.key().as_ref()]);
    let loan: Loan = m.state(&loan_address).await;
    assert_eq!(loan.principal, 1_000_000);
    assert_eq!(loan.interest_owed, 50_000);
    assert!(m.state::<Obligation>(&obligation_key(&borrower.key())).await.loan_active);

    // The filled offer is closed to everyone
    assert_eq!(
        lending_error(m.accept(&borrower, &lender.key()).await),
        Some(LendingError::LoanAlreadyExists)
    );
    assert_eq!(
        lending_error(m.accept(&rival, &lender.key()).await),
        Some(LendingError::OfferNotActive)
    );
    assert_eq!(m.balance(&rival.loan_tokens).await, 0);

    // Short of principal plus interest
    for short in [1_020_000, 1_049_999] {
        assert_eq!(
            lending_error(m.repay(&borrower, &lender, short).await),
            Some(LendingError::InsufficientRepayment)
        );
    }

    // Generous ceiling, exact charge; collateral comes back under the
    // obligation's signer seeds
    m.repay(&borrower, &lender, 2_000_000).await.unwrap();
    assert_eq!(m.balance(&lender.loan_tokens).await, 4_000_000 + 1_050_000);
    assert_eq!(m.balance(&borrower.loan_tokens).await, 3_000_000 - 1_050_000);
    assert_eq!(m.balance(&collateral_vault).await, 0);
    assert_eq!(m.balance(&borrower.collateral_tokens).await, 1_000_000);

    let repaid: Loan = m.state(&loan_address).await;
    assert!(repaid.is_repaid);
    let obligation: Obligation = m.state(&obligation_key(&borrower.key())).await;
    assert!(!obligation.loan_active);
    assert_eq!(obligation.deposited_amount, 0);
    let profile: BorrowerProfile = m.state(&profile_key(&borrower.key())).await;
    assert_eq!(profile.score, 650);

    assert_eq!(
        lending_error(m.repay(&borrower, &lender, 2_000_000).await),
        Some(LendingError::LoanAlreadyRepaid)
    );
}

#[tokio::test]
async fn handlers_enforce_offer_and_profile_rules() {
    let mut genesis = Genesis::new();
    let lender = genesis.wallet(5_000_000, 0);
    let newcomer = genesis.wallet(0, 1_000_000);
    let (loan_mint, collateral_mint) = (genesis.loan_mint, genesis.collateral_mint);
    let mut m = Market {
        ctx: genesis.program.start_with_context().await,
        loan_mint,
        collateral_mint,
    };

    assert_eq!(
        lending_error(m.create_offer(&lender, 0, 500).await),
        Some(LendingError::InvalidAmount)
    );
    m.create_offer(&lender, 1_000_000, 500).await.unwrap();
    assert_eq!(
        lending_error(m.create_offer(&lender, 1_000_000, 500).await),
        Some(LendingError::OfferAlreadyExists)
    );
    assert_eq!(m.balance(&lender.loan_tokens).await, 4_000_000);

    // A program-created profile starts at zero and can only be created once
    m.initialize_profile(&newcomer).await.unwrap();
    assert!(m.initialize_profile(&newcomer).await.is_err());
    let profile: BorrowerProfile = m.state(&profile_key(&newcomer.key())).await;
    assert_eq!(profile.score, 0);

    m.deposit(&newcomer, 400_000).await.unwrap();
    assert_eq!(
        lending_error(m.accept(&newcomer, &lender.key()).await),
        Some(LendingError::InsufficientScore)
    );
    let offer = offer_key(&lender.key(), &loan_mint);
    assert!(m.state::<LoanOffer>(&offer).await.is_active);
    assert_eq!(m.balance(&pda(&[VAULT_SEED, offer.as_ref()])).await, 1_000_000);
    assert!(m
        .account(&pda(&[LOAN_SEED, offer.as_ref(), newcomer.key().as_ref()]))
        .await
        .is_none());
}
