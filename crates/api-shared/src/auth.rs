use base64::{engine::general_purpose, Engine as _};
use consent_core::BasicAuth;
use subtle::ConstantTimeEq;

/// Challenge sent with `401` responses.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"consented\"";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    Missing,
    #[error("malformed authorization header")]
    Malformed,
    #[error("invalid credentials")]
    Invalid,
}

/// Validates an `Authorization` header value against the configured credentials.
///
/// # Arguments
/// * `header` - the raw header value, `None` when the request carried none
/// * `expected` - user and password from configuration
///
/// # Errors
/// Returns an [`AuthError`] describing why the request is not authenticated.
pub fn validate_basic_auth(header: Option<&str>, expected: &BasicAuth) -> Result<(), AuthError> {
    let header = header.ok_or(AuthError::Missing)?;
    let (scheme, encoded) = header.trim().split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::Malformed);
    }

    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Malformed)?;
    let (user, password) = decoded.split_once(':').ok_or(AuthError::Malformed)?;

    // Both comparisons always run.
    let matches: bool = (user.as_bytes().ct_eq(expected.user.as_bytes())
        & password.as_bytes().ct_eq(expected.password.as_bytes()))
    .into();
    if matches {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> BasicAuth {
        BasicAuth {
            user: "test".into(),
            password: "test".into(),
        }
    }

    fn header(credentials: &str) -> String {
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }

    #[test]
    fn accepts_matching_credentials() {
        assert_eq!(
            validate_basic_auth(Some(&header("test:test")), &expected()),
            Ok(())
        );
        assert_eq!(
            validate_basic_auth(Some("basic dGVzdDp0ZXN0"), &expected()),
            Ok(())
        );
    }

    #[test]
    fn password_may_contain_colons() {
        let auth = BasicAuth {
            user: "test".into(),
            password: "a:b".into(),
        };
        assert_eq!(validate_basic_auth(Some(&header("test:a:b")), &auth), Ok(()));
    }

    #[test]
    fn rejects_wrong_credentials() {
        assert_eq!(
            validate_basic_auth(Some(&header("test:wrong")), &expected()),
            Err(AuthError::Invalid)
        );
        assert_eq!(
            validate_basic_auth(Some(&header("other:test")), &expected()),
            Err(AuthError::Invalid)
        );
    }

    #[test]
    fn rejects_prefixes_and_extensions_of_expected_credentials() {
        for credentials in ["tes:test", "test:tes", "testt:test", "test:testt", ":", "test:"] {
            assert_eq!(
                validate_basic_auth(Some(&header(credentials)), &expected()),
                Err(AuthError::Invalid),
                "{credentials}"
            );
        }
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(validate_basic_auth(None, &expected()), Err(AuthError::Missing));
        assert_eq!(
            validate_basic_auth(Some("Bearer abc"), &expected()),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            validate_basic_auth(Some("Basic !!!"), &expected()),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            validate_basic_auth(Some(&header("no-colon")), &expected()),
            Err(AuthError::Malformed)
        );
    }
}
