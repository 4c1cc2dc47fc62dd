use std::fmt;

use aliri_braid::braid;

macro_rules! limited_reveal {
    ($ty:ty: $hidden:literal, $default:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    f.write_str("\"")?;
                    limited_reveal(&self.0, &mut *f, $default)?;
                    f.write_str("\"")
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    limited_reveal(&self.0, &mut *f, usize::MAX)
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }
    };
}

fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

/// An identifier naming the principal a token authorizes
///
/// Rendered verbatim as the `uid=` field of an issued token.
#[braid(serde)]
pub struct Uid;

/// An access key used as the HMAC secret when signing tokens
///
/// This type is deliberately not serializable, and its [`Debug`] and
/// [`Display`] implementations print a placeholder unless the alternate
/// format is explicitly requested.
#[braid(debug = "owned", display = "owned")]
pub struct AccessKey;

limited_reveal!(AccessKeyRef: "ACCESS KEY", 5);

/// An issued Shared Access Signature token
///
/// This type provides custom implementations of [`Display`][SasTokenRef#impl-Display] and
/// [`Debug`][SasTokenRef#impl-Debug] to prevent unintentional disclosures of sensitive values.
/// See the documentation on those trait implementations on the [`SasTokenRef`] type for more
/// information.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ref_doc = "\
    A borrowed reference to a Shared Access Signature token ([`SasToken`])\n\
    \n\
    This type provides custom implementations of [`Display`][Self#impl-Display] and \
    [`Debug`][Self#impl-Debug] to prevent unintentional disclosures of sensitive values. \
    See the documentation on those trait implementations for more information.
    "
)]
#[must_use]
pub struct SasToken;

/// By default, this type will not print out its contents without explicitly
/// specifying the alternate format, i.e. `{:#?}`. When specified in this
/// form, everything up through `&sn=` is printed, and the signature value is
/// elided. To reveal some of the signature's characters, specify the
/// quantity as a width, i.e. `{:#25?}`.
///
/// If not specified, a placeholder value will be printed out instead to
/// indicate that it is hiding sensitive information.
///
/// If, for any reason, the token does not contain a `&sn=` marker, then the
/// limitations specified above will apply to the token as a whole.
impl fmt::Debug for SasTokenRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            if let Some(idx) = self.0.rfind("&sn=") {
                let sig_start = idx + "&sn=".len();
                f.write_str(&self.0[..sig_start])?;
                limited_reveal(&self.0[sig_start..], &mut *f, 0)?;
            } else {
                limited_reveal(&self.0, &mut *f, 0)?;
            }
            f.write_str("\"")
        } else {
            f.write_str(concat!("***", "SAS TOKEN", "***"))
        }
    }
}

/// By default, this type holds potentially sensitive information. To prevent
/// unintentional disclosure of this value, this type will not print out its
/// contents without explicitly specifying the alternate format, i.e. `{:#}`.
/// When specified in this form, it will print out the entire token by
/// default. However, if it is preferable to elide some of the characters in
/// the signature, then that can be modified by specifying the quantity as a
/// width in the format string, i.e. `{:#10}`.
///
/// If not specified, a placeholder value will be printed out instead to
/// indicate that it is hiding sensitive information.
///
/// If, for any reason, the token does not contain a `&sn=` marker, then the
/// limitations specified above will apply to the token as a whole.
impl fmt::Display for SasTokenRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            if let Some(idx) = self.0.rfind("&sn=") {
                let sig_start = idx + "&sn=".len();
                f.write_str(&self.0[..sig_start])?;
                limited_reveal(&self.0[sig_start..], &mut *f, usize::MAX)
            } else {
                limited_reveal(&self.0, &mut *f, usize::MAX)
            }
        } else {
            f.write_str(concat!("***", "SAS TOKEN", "***"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "SharedAccessSignature uid=id&ex=2024-05-01T12:00:00.0000000Z&sn=c2lnbmF0dXJl";

    #[test]
    fn access_key_hides_by_default() {
        let key = AccessKey::new("super-secret-key".to_string());

        assert_eq!(format!("{key:?}"), "***ACCESS KEY***");
        assert_eq!(format!("{key}"), "***ACCESS KEY***");
    }

    #[test]
    fn access_key_reveals_bounded_prefix_in_alternate_debug() {
        let key = AccessKey::new("super-secret-key".to_string());

        assert_eq!(format!("{key:#?}"), "\"supe…\"");
    }

    #[test]
    fn sas_token_hides_by_default() {
        let token = SasToken::from_static(TOKEN);

        assert_eq!(format!("{token:?}"), "***SAS TOKEN***");
        assert_eq!(format!("{token}"), "***SAS TOKEN***");
    }

    #[test]
    fn sas_token_alternate_debug_elides_signature() {
        let token = SasToken::from_static(TOKEN);

        assert_eq!(
            format!("{token:#?}"),
            "\"SharedAccessSignature uid=id&ex=2024-05-01T12:00:00.0000000Z&sn=…\""
        );
    }

    #[test]
    fn sas_token_alternate_display_reveals_in_full() {
        let token = SasToken::from_static(TOKEN);

        assert_eq!(format!("{token:#}"), TOKEN);
    }

    #[test]
    fn sas_token_width_bounds_the_signature_reveal() {
        let token = SasToken::from_static(TOKEN);

        assert_eq!(
            format!("{token:#4}"),
            "SharedAccessSignature uid=id&ex=2024-05-01T12:00:00.0000000Z&sn=c2l…"
        );
    }
}
