//! Mining plots
//!
//! A plot is 4096 scoops of 64 bytes, expanded from `(account, nonce)` by
//! chained Shabal-256 hashing from the tail of a seed buffer backwards,
//! then whitened with the hash of the whole buffer.

use shared_crypto::{shabal256, shabal256_many};
use shared_types::{AccountId, Hash};

/// Digest size in bytes.
pub const HASH_SIZE: usize = 32;

/// Bytes fed to each chained hash, at most.
pub const HASH_CAP: usize = 4096;

/// Scoop size in bytes.
pub const SCOOP_SIZE: usize = 64;

/// Scoops in one plot.
pub const SCOOPS_PER_PLOT: usize = 4096;

/// Plot size in bytes.
pub const PLOT_SIZE: usize = SCOOPS_PER_PLOT * SCOOP_SIZE;

const SEED_LEN: usize = 16;

/// Fully expanded plot for one `(account, nonce)` pair.
pub struct MiningPlot {
    data: Vec<u8>,
}

impl MiningPlot {
    /// Expand the plot into 256 KiB. Costs 8192 chained Shabal-256 hashes
    /// of up to 4 KiB each.
    #[tracing::instrument(level = "trace")]
    pub fn new(account: AccountId, nonce: u64) -> Self {
        let mut gendata = vec![0u8; PLOT_SIZE + SEED_LEN];
        gendata[PLOT_SIZE..PLOT_SIZE + 8].copy_from_slice(&account.to_be_bytes());
        gendata[PLOT_SIZE + 8..].copy_from_slice(&nonce.to_be_bytes());

        let mut end = PLOT_SIZE;
        while end >= HASH_SIZE {
            let len = (PLOT_SIZE + SEED_LEN - end).min(HASH_CAP);
            let digest = shabal256(&gendata[end..end + len]);
            gendata[end - HASH_SIZE..end].copy_from_slice(&digest);
            end -= HASH_SIZE;
        }

        let whitening = shabal256(&gendata);
        let data = gendata[..PLOT_SIZE]
            .iter()
            .enumerate()
            .map(|(i, byte)| byte ^ whitening[i % HASH_SIZE])
            .collect();

        Self { data }
    }

    /// Bytes of one scoop. Indices wrap modulo the scoop count.
    pub fn scoop(&self, index: usize) -> &[u8] {
        let start = (index % SCOOPS_PER_PLOT) * SCOOP_SIZE;
        &self.data[start..start + SCOOP_SIZE]
    }

    /// Hash a scoop together with a generation signature.
    pub fn hash_scoop(&self, generation_signature: &Hash, index: usize) -> Hash {
        shabal256_many(&[generation_signature, self.scoop(index)])
    }
}

impl std::fmt::Debug for MiningPlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiningPlot")
            .field("len", &self.data.len())
            .finish()
    }
}
