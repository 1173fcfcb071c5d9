//! Deterministic program-derived addresses for every protocol role.
//!
//! The same inputs always yield the same address, so the client can locate
//! any account from public keys alone.

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use peer_lending::constants::{
    BORROWER_PROFILE_SEED, COLLATERAL_VAULT_SEED, LOAN_OFFER_SEED, LOAN_SEED, OBLIGATION_SEED,
    VAULT_SEED,
};

use crate::error::DeriveError;

/// Account roles and the seed tag each is derived under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// (lender, mint)
    Offer,
    /// (offer)
    Vault,
    /// (borrower)
    Obligation,
    /// (borrower, collateral mint)
    CollateralVault,
    /// (offer, borrower)
    Loan,
    /// (borrower)
    BorrowerProfile,
}

impl Role {
    pub fn seed(self) -> &'static [u8] {
        match self {
            Role::Offer => LOAN_OFFER_SEED,
            Role::Vault => VAULT_SEED,
            Role::Obligation => OBLIGATION_SEED,
            Role::CollateralVault => COLLATERAL_VAULT_SEED,
            Role::Loan => LOAN_SEED,
            Role::BorrowerProfile => BORROWER_PROFILE_SEED,
        }
    }

    /// Number of public-key inputs the role is derived from
    pub fn arity(self) -> usize {
        match self {
            Role::Offer | Role::CollateralVault | Role::Loan => 2,
            Role::Vault | Role::Obligation | Role::BorrowerProfile => 1,
        }
    }
}

/// Parse a base58 public key
pub fn parse_pubkey(input: &str) -> Result<Pubkey, DeriveError> {
    Pubkey::from_str(input.trim())
        .map_err(|e| DeriveError::InvalidInput(format!("{input:?} is not a public key: {e}")))
}

/// Derive the address for `role` from base58 inputs.
///
/// Fails with `InvalidInput` on a malformed key or the wrong number of
/// inputs for the role.
pub fn derive_address(
    role: Role,
    inputs: &[&str],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DeriveError> {
    if inputs.len() != role.arity() {
        return Err(DeriveError::InvalidInput(format!(
            "{role:?} takes {} input(s), got {}",
            role.arity(),
            inputs.len()
        )));
    }

    let keys = inputs
        .iter()
        .map(|input| parse_pubkey(input))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(find(role, &keys, program_id))
}

fn find(role: Role, keys: &[Pubkey], program_id: &Pubkey) -> (Pubkey, u8) {
    let mut seeds: Vec<&[u8]> = Vec::with_capacity(keys.len() + 1);
    seeds.push(role.seed());
    seeds.extend(keys.iter().map(|k| k.as_ref()));
    Pubkey::find_program_address(&seeds, program_id)
}

// ============================================================================
// TYPED HELPERS
// ============================================================================

pub fn offer_address(lender: &Pubkey, mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    find(Role::Offer, &[*lender, *mint], program_id)
}

pub fn vault_address(offer: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    find(Role::Vault, &[*offer], program_id)
}

pub fn obligation_address(borrower: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    find(Role::Obligation, &[*borrower], program_id)
}

pub fn collateral_vault_address(
    borrower: &Pubkey,
    collateral_mint: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    find(Role::CollateralVault, &[*borrower, *collateral_mint], program_id)
}

pub fn loan_address(offer: &Pubkey, borrower: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    find(Role::Loan, &[*offer, *borrower], program_id)
}

pub fn borrower_profile_address(borrower: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    find(Role::BorrowerProfile, &[*borrower], program_id)
}
