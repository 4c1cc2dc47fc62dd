//! Token expiry instants and the issued-token cache

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};

use crate::braids::{SasToken, SasTokenRef};

/// The length of a rendered expiry stamp, e.g. `2024-05-01T12:00:00.0000000Z`
pub(crate) const STAMP_LEN: usize = 28;

/// A whole-second UTC instant at which a token stops being valid
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[must_use]
pub struct Expiry(DateTime<Utc>);

impl Expiry {
    /// Constructs an expiry from an instant, rounding to the nearest whole
    /// second (half a second rounds up)
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.round_subsecs(0))
    }

    /// The instant at which the token expires
    #[inline]
    pub fn instant(self) -> DateTime<Utc> {
        self.0
    }
}

/// Renders the wire form expected by the gateway's timestamp parser: an
/// RFC 3339 stamp with exactly seven fractional digits. The instant is
/// always whole seconds, so the fraction is emitted as a literal
/// `.0000000Z` suffix after the seconds field.
impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.0000000Z", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// An issued token retained until its expiry passes
#[derive(Clone, Debug)]
pub struct CachedToken {
    token: SasToken,
    expiry: Expiry,
}

impl CachedToken {
    pub(crate) fn new(token: SasToken, expiry: Expiry) -> Self {
        Self { token, expiry }
    }

    /// Gets the retained token
    #[inline]
    pub fn token(&self) -> &SasTokenRef {
        &self.token
    }

    /// Gets the instant at which the retained token expires
    #[inline]
    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    /// Whether the retained token is still usable at `now`
    ///
    /// Validity is strict: a token is no longer usable at the exact instant
    /// of its expiry.
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn sub_second_instants_round_to_the_nearest_second() {
        let down = Expiry::from_instant(base() + TimeDelta::milliseconds(499));
        let up = Expiry::from_instant(base() + TimeDelta::milliseconds(501));

        assert_eq!(down.instant(), base());
        assert_eq!(up.instant(), base() + TimeDelta::seconds(1));
    }

    #[test]
    fn exact_half_seconds_round_up() {
        let tied = Expiry::from_instant(base() + TimeDelta::milliseconds(500));

        assert_eq!(tied.instant(), base() + TimeDelta::seconds(1));
    }

    #[test]
    fn stamp_carries_the_seven_zero_fraction() {
        let expiry = Expiry::from_instant(base());
        let stamp = expiry.to_string();

        assert_eq!(stamp, "2024-05-01T12:00:00.0000000Z");
        assert_eq!(stamp.len(), STAMP_LEN);
    }

    #[test]
    fn validity_is_strictly_before_expiry() {
        let expiry = Expiry::from_instant(base());
        let cached = CachedToken::new(SasToken::from_static("token"), expiry);

        assert!(cached.is_valid_at(base() - TimeDelta::nanoseconds(1)));
        assert!(!cached.is_valid_at(base()));
        assert!(!cached.is_valid_at(base() + TimeDelta::seconds(1)));
    }
}
