//! Core domain types: loss events, pools, scores, tranches, buyers and
//! cycle reports.

pub mod buyer;
pub mod error;
pub mod event;
pub mod id;
pub mod money;
pub mod pool;
pub mod report;
pub mod score;
pub mod tranche;

pub use buyer::{BuyerDirectory, InstitutionalBuyer, MatchResult, RiskAppetite};
pub use error::DomainError;
pub use event::{AnonymizedLossEvent, LossEvent, LossRecord};
pub use id::{BuyerId, EventSeq, Pseudonym, SnapshotId, TrancheId};
pub use money::{Amount, Tokens};
pub use pool::{Pool, PoolKind, PoolSet, PoolSnapshot, PoolTotals};
pub use report::{CycleReport, IngestionSummary, Rejection};
pub use score::{CompositeScore, ScoreComponents, ScoreReport, ScoreWeights, Trend};
pub use tranche::{Rating, Segment, Tranche, TrancheStatus};
