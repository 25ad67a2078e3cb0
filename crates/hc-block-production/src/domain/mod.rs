//! Block production domain: leader election for both tracks and the
//! pieces they share.

mod assembly;
mod forger;
mod miner;
mod retry;

pub use assembly::BlockTemplate;
pub use forger::{Forger, ForgingCandidate, StakeForger};
pub use miner::{CapacityMiner, MiningInfo, NonceSubmission};
pub use retry::RetryPolicy;
