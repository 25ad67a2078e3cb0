//! Block validation
//!
//! Signature and generation-proof checks for a signed header against its
//! parent and the track tip it is judged by. Structural checks happen at
//! sealing time; linkage checks happen in the engine.

use crate::domain::proof::{
    capacity_proof, stake_generation_signature, stake_hit, verify_stake_hit,
};
use crate::domain::{BlockMode, ConsensusError, ConsensusResult, LinkedBlock, UnlinkedHeader};
use crate::ports::AccountLedger;
use shared_crypto::{Ed25519PublicKey, Ed25519Signature, VerifyMode};
use shared_types::PublicKey;
use tracing::{debug, instrument};

/// Verifies signatures and generation proofs.
#[derive(Clone, Debug)]
pub struct BlockValidator {
    capacity_retirement_height: u32,
}

impl BlockValidator {
    pub fn new(capacity_retirement_height: u32) -> Self {
        Self {
            capacity_retirement_height,
        }
    }

    /// Check the block signature under the effective signer key.
    #[instrument(skip_all, fields(block = %header.id()))]
    pub fn verify_signature(
        &self,
        header: &UnlinkedHeader,
        parent: &LinkedBlock,
        ledger: &dyn AccountLedger,
    ) -> ConsensusResult<()> {
        let invalid = || ConsensusError::InvalidSignature(header.id());
        let signer = self.effective_signer(header, parent, ledger).ok_or_else(invalid)?;

        let mode = if header.version() >= 3 {
            VerifyMode::Strict
        } else {
            VerifyMode::Legacy
        };
        let key = Ed25519PublicKey::from_bytes(signer).map_err(|_| invalid())?;
        key.verify(
            &header.signing_bytes(),
            &Ed25519Signature::from_bytes(*header.block_signature()),
            mode,
        )
        .map_err(|_| invalid())
    }

    fn effective_signer(
        &self,
        header: &UnlinkedHeader,
        parent: &LinkedBlock,
        ledger: &dyn AccountLedger,
    ) -> Option<PublicKey> {
        let generator = header.generator_id();
        match header.mode() {
            BlockMode::Stake => {
                if !ledger.has_account(generator) {
                    debug!(%generator, "Stake generator unknown");
                    return None;
                }
                match ledger.public_key(generator) {
                    Some(bound) if bound != *header.generator_public_key() => {
                        debug!(%generator, "Generator key differs from bound key");
                        None
                    }
                    _ => Some(*header.generator_public_key()),
                }
            }
            BlockMode::Capacity { .. } => match ledger.reward_recipient(generator) {
                None => Some(*header.generator_public_key()),
                Some(assignment) => {
                    let signer = if parent.height() + 1 >= assignment.from_height {
                        assignment.recipient_id
                    } else {
                        assignment.previous_recipient_id
                    };
                    ledger.public_key(signer)
                }
            },
        }
    }

    /// Check the generation proof against the track tip `reference`.
    #[instrument(skip_all, fields(block = %header.id(), mode = ?header.mode()))]
    pub fn verify_generation_proof(
        &self,
        header: &UnlinkedHeader,
        parent: &LinkedBlock,
        reference: &LinkedBlock,
        ledger: &dyn AccountLedger,
    ) -> ConsensusResult<()> {
        let invalid = |reason: String| ConsensusError::InvalidGenerationProof {
            block_id: header.id(),
            reason,
        };
        let generator = header.generator_id();
        let elapsed = i64::from(header.timestamp()) - i64::from(reference.timestamp());

        match header.mode() {
            BlockMode::Stake => {
                let effective_balance = ledger.effective_balance(generator);
                if effective_balance == 0 {
                    return Err(invalid(format!("{generator} has no effective balance")));
                }
                let expected = stake_generation_signature(reference.generation_signature(), generator);
                if expected != *header.generation_signature() {
                    return Err(invalid("generation signature mismatch".to_string()));
                }
                let hit = stake_hit(&expected);
                if !verify_stake_hit(hit, reference.base_target(), effective_balance, elapsed) {
                    return Err(invalid(format!("hit {hit} above target after {elapsed}s")));
                }
                Ok(())
            }
            BlockMode::Capacity { nonce } => {
                if parent.height() >= self.capacity_retirement_height {
                    return Err(ConsensusError::ProofFamilyRetired {
                        height: parent.height(),
                    });
                }
                let proof = capacity_proof(
                    reference.generation_signature(),
                    reference.generator_id(),
                    reference.height(),
                    reference.base_target(),
                    generator,
                    nonce,
                );
                if proof.generation_signature != *header.generation_signature() {
                    return Err(invalid("generation signature mismatch".to_string()));
                }
                if elapsed < 0 || (elapsed as u64) < proof.deadline {
                    return Err(invalid(format!(
                        "deadline {} not reached after {elapsed}s",
                        proof.deadline
                    )));
                }
                Ok(())
            }
        }
    }
}
