//! The caching token provider

use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use apim_sas_clock::{Clock, System};
use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    braids::{AccessKey, SasToken, SasTokenRef, Uid, UidRef},
    error::{self, InvalidConfiguration, SigningError},
    sign::{HmacSha512, Signer},
    token::{CachedToken, Expiry, STAMP_LEN},
};

const SCHEME: &str = "SharedAccessSignature";

/// A provider of Shared Access Signature tokens
///
/// The provider owns an identifier, a signer holding the access key, and a
/// validity duration. The most recently issued token is cached and served
/// until it expires, at which point the next request transparently signs a
/// fresh one.
///
/// Requesting a token takes `&mut self`, so the check-generate-store
/// sequence is single-writer by construction. For a provider shared across
/// threads, see [`SharedTokenProvider`].
#[derive(Debug)]
#[must_use]
pub struct TokenProvider<S = HmacSha512, C = System> {
    uid: Uid,
    signer: S,
    validity: TimeDelta,
    cached: Option<CachedToken>,
    clock: C,
}

impl TokenProvider {
    /// The validity applied when none is specified: two hours
    pub const DEFAULT_VALIDITY: TimeDelta = TimeDelta::hours(2);

    /// Constructs a provider signing with HMAC-SHA512
    ///
    /// Issued tokens live for [`DEFAULT_VALIDITY`][Self::DEFAULT_VALIDITY];
    /// use [`with_validity`][Self::with_validity] to specify a different
    /// lifetime.
    pub fn new(uid: impl Into<Uid>, key: impl Into<AccessKey>) -> Self {
        Self::from_signer(uid, HmacSha512::new(key))
    }
}

impl<S> TokenProvider<S, System> {
    /// Constructs a provider with a caller-built signer
    pub fn from_signer(uid: impl Into<Uid>, signer: S) -> Self {
        Self {
            uid: uid.into(),
            signer,
            validity: TokenProvider::DEFAULT_VALIDITY,
            cached: None,
            clock: System,
        }
    }
}

impl<S, C> TokenProvider<S, C> {
    /// Sets the lifetime of each issued token
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfiguration`] if `validity` is zero or negative.
    pub fn with_validity(mut self, validity: TimeDelta) -> Result<Self, InvalidConfiguration> {
        if validity <= TimeDelta::zero() {
            return Err(error::invalid_configuration());
        }

        self.validity = validity;
        Ok(self)
    }

    /// Sets a custom clock to be used
    ///
    /// Useful for testing purposes
    pub fn with_clock<D>(self, clock: D) -> TokenProvider<S, D> {
        TokenProvider {
            uid: self.uid,
            signer: self.signer,
            validity: self.validity,
            cached: self.cached,
            clock,
        }
    }

    /// Replaces the signer
    ///
    /// Any cached token is dropped: a token signed with the previous key
    /// must not be served.
    pub fn with_signer<T>(self, signer: T) -> TokenProvider<T, C> {
        TokenProvider {
            uid: self.uid,
            signer,
            validity: self.validity,
            cached: None,
            clock: self.clock,
        }
    }

    /// Wraps the provider in a mutex for use through a shared reference
    pub fn into_shared(self) -> SharedTokenProvider<S, C> {
        SharedTokenProvider {
            inner: Mutex::new(self),
        }
    }

    /// Gets the identifier tokens are issued for
    #[inline]
    pub fn uid(&self) -> &UidRef {
        &self.uid
    }

    /// Gets the lifetime of each issued token
    #[inline]
    pub fn validity(&self) -> TimeDelta {
        self.validity
    }

    /// Gets the most recently issued token, if any
    #[inline]
    pub fn cached_token(&self) -> Option<&SasTokenRef> {
        self.cached.as_ref().map(CachedToken::token)
    }

    /// Gets the expiry of the most recently issued token, if any
    #[inline]
    pub fn cached_expiry(&self) -> Option<Expiry> {
        self.cached.as_ref().map(CachedToken::expiry)
    }

    /// Whether the cached token is usable at the provided instant
    ///
    /// A provider that has never issued a token is never valid.
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.cached.as_ref().is_some_and(|c| c.is_valid_at(now))
    }
}

impl<S, C: Clock> TokenProvider<S, C> {
    /// Whether the cached token is usable right now
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(self.clock.now())
    }
}

impl<S, C> TokenProvider<S, C>
where
    S: Signer,
    SigningError: From<S::Error>,
    C: Clock,
{
    /// Returns a token guaranteed valid at the instant it is returned
    ///
    /// The cached token is served while it remains valid; otherwise a fresh
    /// token is signed, cached, and returned.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the signature could not be computed. The
    /// cache is left untouched, so a retry attempts regeneration again.
    pub fn token(&mut self) -> Result<SasToken, SigningError> {
        let now = self.clock.now();
        self.token_at(now)
    }

    /// Returns a token valid as of the provided instant
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the signature could not be computed.
    pub fn token_at(&mut self, now: DateTime<Utc>) -> Result<SasToken, SigningError> {
        if let Some(cached) = &self.cached {
            if cached.is_valid_at(now) {
                tracing::trace!(uid = %self.uid, expiry = %cached.expiry(), "serving cached token");
                return Ok(cached.token().to_owned());
            }
        }

        self.generate(now)
    }

    fn generate(&mut self, now: DateTime<Utc>) -> Result<SasToken, SigningError> {
        use std::fmt::Write;

        let instant = now
            .checked_add_signed(self.validity)
            .expect("expiry beyond the representable range of time");
        let expiry = Expiry::from_instant(instant);
        let stamp = expiry.to_string();

        let mut payload = String::with_capacity(self.uid.as_str().len() + 1 + STAMP_LEN);
        write!(payload, "{}\n{}", self.uid, stamp).expect("writes to strings never fail");

        let digest = self.signer.sign(payload.as_bytes())?;
        let signature = base64::engine::general_purpose::STANDARD.encode(digest);

        let expected_len = SCHEME.len()
            + " uid=".len()
            + self.uid.as_str().len()
            + "&ex=".len()
            + STAMP_LEN
            + "&sn=".len()
            + signature.len();

        let mut raw = String::with_capacity(expected_len);
        write!(raw, "{SCHEME} uid={}&ex={}&sn={}", self.uid, stamp, signature)
            .expect("writes to strings never fail");

        debug_assert_eq!(raw.len(), expected_len);

        let token = SasToken::new(raw);
        tracing::debug!(uid = %self.uid, expiry = %expiry, "issued new token");
        self.cached = Some(CachedToken::new(token.clone(), expiry));

        Ok(token)
    }
}

/// Renders the provider's cache state for diagnostics as
/// `{ Token: <token>, Expires: <expiry>, IsValid: <bool> }`
///
/// The token's signature is elided and the access key never appears.
impl<S, C: Clock> fmt::Display for TokenProvider<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("{ Token: ")?;
        match &self.cached {
            Some(cached) => write!(f, "{:#1}", cached.token())?,
            None => f.write_str("<none>")?,
        }

        f.write_str(", Expires: ")?;
        match &self.cached {
            Some(cached) => write!(f, "{}", cached.expiry())?,
            None => f.write_str("<never>")?,
        }

        write!(f, ", IsValid: {} }}", self.is_valid())
    }
}

/// A [`TokenProvider`] behind a mutex, usable through a shared reference
///
/// The check-generate-store sequence runs under the lock, so concurrent
/// callers around an expiry boundary never perform redundant signing work.
#[derive(Debug)]
#[must_use]
pub struct SharedTokenProvider<S = HmacSha512, C = System> {
    inner: Mutex<TokenProvider<S, C>>,
}

impl<S, C> SharedTokenProvider<S, C> {
    /// Unwraps the provider, discarding the mutex
    pub fn into_inner(self) -> TokenProvider<S, C> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, TokenProvider<S, C>> {
        // The cache is coherent between statements, so a peer that panicked
        // while holding the lock cannot have left it corrupt.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, C: Clock> SharedTokenProvider<S, C> {
    /// Whether the cached token is usable right now
    pub fn is_valid(&self) -> bool {
        self.lock().is_valid()
    }
}

impl<S, C> SharedTokenProvider<S, C>
where
    S: Signer,
    SigningError: From<S::Error>,
    C: Clock,
{
    /// Returns a token guaranteed valid at the instant it is returned
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the signature could not be computed.
    pub fn token(&self) -> Result<SasToken, SigningError> {
        self.lock().token()
    }
}

impl<S, C: Clock> fmt::Display for SharedTokenProvider<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&*self.lock(), f)
    }
}
