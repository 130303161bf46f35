use crate::LinearUnit;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unrecognized unit symbol {0:?}")]
    InvalidUnit(String),

    #[error("cannot convert between {0} and {1}")]
    Incompatible(LinearUnit, LinearUnit),
}
