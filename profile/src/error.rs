use thiserror::Error;
use units::UnitError;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("{0}")]
    InvalidUnit(#[from] UnitError),

    #[error("ground profile has {ground} samples but view profile has {view}")]
    PrecomputedData { ground: usize, view: usize },

    #[error("no ground profile samples")]
    NoGroundProfile,

    #[error("rebuild aborted by a newer request")]
    Aborted,
}

impl ProfileError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Failure of a single per-layer intersection query. Recovered by the
/// rebuild: the layer contributes no series.
#[derive(Error, Debug)]
#[error("intersection query failed: {0}")]
pub struct QueryError(pub String);
