//! A cached Shared Access Signature (SAS) token provider for the Azure API
//! Management gateway.
//!
//! A [`TokenProvider`] owns an identifier, an HMAC-SHA512 access key, and a
//! validity duration. Each request for a token returns the cached token
//! while it remains valid and transparently signs a fresh one once it
//! expires. Issued tokens take the form expected by the gateway:
//!
//! ```text
//! SharedAccessSignature uid=<identifier>&ex=<expiry>&sn=<base64 signature>
//! ```
//!
//! where the expiry is an RFC 3339 stamp carrying exactly seven fractional
//! digits, and the signature is the standard base64 encoding of
//! HMAC-SHA512 over the identifier and the expiry stamp joined by a
//! newline.
//!
//! # Example
//!
//! ```
//! use apim_sas::TokenProvider;
//! use apim_sas_clock::TestClock;
//! use chrono::{TimeDelta, Utc};
//!
//! let clock = TestClock::new(Utc::now());
//! let mut provider = TokenProvider::new("my-principal", "my-access-key")
//!     .with_validity(TimeDelta::minutes(5))?
//!     .with_clock(&clock);
//!
//! let first = provider.token()?;
//! assert!(provider.is_valid());
//!
//! // the same token is served until it expires
//! assert_eq!(first, provider.token()?);
//!
//! clock.advance(TimeDelta::minutes(10));
//! assert!(!provider.is_valid());
//!
//! let second = provider.token()?;
//! assert_ne!(first, second);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_must_use
)]
#![deny(unsafe_code)]

mod braids;
pub mod error;
mod provider;
pub mod sign;
mod token;

pub use braids::{AccessKey, AccessKeyRef, SasToken, SasTokenRef, Uid, UidRef};
pub use provider::{SharedTokenProvider, TokenProvider};
pub use token::{CachedToken, Expiry};
