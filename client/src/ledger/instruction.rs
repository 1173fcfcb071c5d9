use anchor_lang::{AnchorDeserialize, Discriminator};
use peer_lending::instruction as ix;
use peer_lending::state::OfferTerms;

use crate::error::LedgerError;

/// Closed set of program instructions, decoded from Anchor instruction data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LendingInstruction {
    Initialize,
    InitializeBorrowerProfile,
    CreateOffer(OfferTerms),
    CreateObligation { deposit_amount: u64 },
    AcceptLoan,
    RepayLoan { repayment_amount: u64 },
}

fn args<T: AnchorDeserialize>(data: &[u8], discriminator: &[u8]) -> Result<T, LedgerError> {
    T::try_from_slice(&data[discriminator.len()..])
        .map_err(|e| LedgerError::MalformedInstruction(e.to_string()))
}

impl LendingInstruction {
    pub fn decode(data: &[u8]) -> Result<Self, LedgerError> {
        if data.starts_with(&ix::Initialize::DISCRIMINATOR) {
            Ok(Self::Initialize)
        } else if data.starts_with(&ix::InitializeBorrowerProfile::DISCRIMINATOR) {
            Ok(Self::InitializeBorrowerProfile)
        } else if data.starts_with(&ix::CreateOffer::DISCRIMINATOR) {
            let a: ix::CreateOffer = args(data, &ix::CreateOffer::DISCRIMINATOR)?;
            Ok(Self::CreateOffer(OfferTerms {
                amount: a.amount,
                interest_rate_bps: a.interest_rate_bps,
                duration_seconds: a.duration_seconds,
                min_score: a.min_score,
            }))
        } else if data.starts_with(&ix::CreateObligation::DISCRIMINATOR) {
            let a: ix::CreateObligation = args(data, &ix::CreateObligation::DISCRIMINATOR)?;
            Ok(Self::CreateObligation {
                deposit_amount: a.deposit_amount,
            })
        } else if data.starts_with(&ix::AcceptLoan::DISCRIMINATOR) {
            Ok(Self::AcceptLoan)
        } else if data.starts_with(&ix::RepayLoan::DISCRIMINATOR) {
            let a: ix::RepayLoan = args(data, &ix::RepayLoan::DISCRIMINATOR)?;
            Ok(Self::RepayLoan {
                repayment_amount: a.repayment_amount,
            })
        } else {
            Err(LedgerError::MalformedInstruction(
                "unknown instruction discriminator".to_string(),
            ))
        }
    }

    /// Accounts the instruction expects, in order
    pub fn account_count(&self) -> usize {
        match self {
            Self::Initialize => 0,
            Self::InitializeBorrowerProfile => 3,
            Self::CreateOffer(_) | Self::CreateObligation { .. } => 7,
            Self::AcceptLoan | Self::RepayLoan { .. } => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::InstructionData;

    #[test]
    fn decodes_what_the_program_encodes() {
        let data = ix::CreateOffer {
            amount: 1_000_000,
            interest_rate_bps: 500,
            duration_seconds: 2_592_000,
            min_score: 500,
        }
        .data();
        assert_eq!(
            LendingInstruction::decode(&data).unwrap(),
            LendingInstruction::CreateOffer(OfferTerms {
                amount: 1_000_000,
                interest_rate_bps: 500,
                duration_seconds: 2_592_000,
                min_score: 500,
            })
        );

        let data = ix::RepayLoan { repayment_amount: 7 }.data();
        assert_eq!(
            LendingInstruction::decode(&data).unwrap(),
            LendingInstruction::RepayLoan { repayment_amount: 7 }
        );
        assert_eq!(
            LendingInstruction::decode(&ix::AcceptLoan {}.data()).unwrap(),
            LendingInstruction::AcceptLoan
        );
    }

    #[test]
    fn rejects_unknown_and_truncated_data() {
        assert!(LendingInstruction::decode(&[0u8; 8]).is_err());
        assert!(LendingInstruction::decode(&[]).is_err());

        let mut data = ix::CreateObligation { deposit_amount: 9 }.data();
        data.truncate(data.len() - 1);
        assert!(LendingInstruction::decode(&data).is_err());
    }
}
