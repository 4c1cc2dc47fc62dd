//! Common errors

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

/// The validity duration supplied at construction is not usable
///
/// A provider only ever issues tokens that expire in the future, so the
/// validity must be strictly positive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("validity duration must be positive")]
pub struct InvalidConfiguration {
    _p: (),
}

pub(crate) const fn invalid_configuration() -> InvalidConfiguration {
    InvalidConfiguration { _p: () }
}

/// The token signature could not be computed
///
/// The provider leaves its cache untouched when signing fails, so a retry
/// attempts regeneration again.
#[derive(Debug, Error)]
#[error("unable to sign token")]
pub struct SigningError {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl From<std::convert::Infallible> for SigningError {
    fn from(_: std::convert::Infallible) -> Self {
        unreachable!("infallible result")
    }
}
