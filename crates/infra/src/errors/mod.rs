//! Infrastructure error handling.

pub mod conversions;

pub use conversions::InfraError;

use taskbridge_domain::TaskBridgeError;

/// Map any convertible infrastructure error into the domain error.
pub(crate) fn to_domain<E>(err: E) -> TaskBridgeError
where
    InfraError: From<E>,
{
    InfraError::from(err).into()
}
