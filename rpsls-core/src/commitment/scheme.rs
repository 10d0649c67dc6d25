use crate::commitment::{Commitment, Salt};
use crate::error::Result;
use crate::moves::Move;
use sha3::{Digest, Keccak256};

/// Trait for commitment schemes
pub trait CommitmentScheme {
    type Secret;
    type Commitment;

    fn commit(secret: &Self::Secret) -> Result<Self::Commitment>;
    fn verify(commitment: &Self::Commitment, secret: &Self::Secret) -> bool;
}

/// `keccak256(abi.encodePacked(uint8 move, uint256 salt))`, the hash the
/// game contract recomputes when Player 1 reveals.
///
/// The preimage is exactly 33 bytes: one byte of move ordinal followed by the
/// 32 salt bytes, no padding and no length prefix.
pub struct PackedKeccak;

pub const PREIMAGE_LEN: usize = 1 + Salt::LEN;

impl PackedKeccak {
    pub fn preimage(mv: Move, salt: &Salt) -> [u8; PREIMAGE_LEN] {
        let mut packed = [0u8; PREIMAGE_LEN];
        packed[0] = mv.ordinal();
        packed[1..].copy_from_slice(salt.as_bytes());
        packed
    }
}

impl CommitmentScheme for PackedKeccak {
    type Secret = (Move, Salt);
    type Commitment = Commitment;

    fn commit(secret: &Self::Secret) -> Result<Commitment> {
        let (mv, salt) = secret;
        let mv = mv.require_playable()?;

        let digest = Keccak256::digest(Self::preimage(mv, salt));
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        Ok(Commitment::from_bytes(hash))
    }

    fn verify(commitment: &Commitment, secret: &Self::Secret) -> bool {
        match Self::commit(secret) {
            Ok(computed) => &computed == commitment,
            Err(_) => false,
        }
    }
}
