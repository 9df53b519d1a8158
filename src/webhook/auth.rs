// ABOUTME: Decodes the encoded auth parameter of a deployment request.
// ABOUTME: URL-safe base64 of basic://user:pass or token://value.

use base64::Engine as _;
use base64::alphabet::URL_SAFE;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;

use crate::source::Credentials;

use super::RequestError;

/// URL-safe alphabet, padding optional.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const MIN_VALUE_LEN: usize = 3;

/// Decode an encoded auth string into credentials.
///
/// An empty input means no credentials.
pub fn decode_auth(encoded: &str) -> Result<Option<Credentials>, RequestError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Ok(None);
    }

    let bytes = URL_SAFE_LENIENT.decode(encoded)?;
    let decoded = String::from_utf8(bytes).map_err(|_| RequestError::AuthFormat)?;
    parse_auth(&decoded).map(Some)
}

/// Parse the decoded `scheme://value` form.
pub fn parse_auth(decoded: &str) -> Result<Credentials, RequestError> {
    let (scheme, value) = decoded.split_once("://").ok_or(RequestError::AuthFormat)?;
    if value.chars().count() < MIN_VALUE_LEN || value.contains('\n') {
        return Err(RequestError::AuthFormat);
    }

    match scheme {
        "basic" => {
            let (username, password) = value.split_once(':').unwrap_or((value, ""));
            Ok(Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            })
        }
        "token" => Ok(Credentials::Token(value.to_string())),
        _ => Err(RequestError::AuthFormat),
    }
}

/// Encode credentials the way [`decode_auth`] expects them.
pub fn encode_auth(credentials: &Credentials) -> String {
    let plain = match credentials {
        Credentials::Basic { username, password } => format!("basic://{}:{}", username, password),
        Credentials::Token(token) => format!("token://{}", token),
    };
    base64::engine::general_purpose::URL_SAFE.encode(plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &str) -> String {
        base64::engine::general_purpose::URL_SAFE.encode(s)
    }

    #[test]
    fn basic_credentials() {
        let creds = decode_auth(&encode("basic://alice:s3cr3t")).unwrap();
        assert_eq!(
            creds,
            Some(Credentials::Basic {
                username: "alice".to_string(),
                password: "s3cr3t".to_string(),
            })
        );
    }

    #[test]
    fn basic_password_may_contain_colons() {
        let creds = parse_auth("basic://alice:a:b:c").unwrap();
        assert_eq!(
            creds,
            Credentials::Basic {
                username: "alice".to_string(),
                password: "a:b:c".to_string(),
            }
        );
    }

    #[test]
    fn basic_without_password_keeps_username() {
        let creds = parse_auth("basic://alice").unwrap();
        assert_eq!(
            creds,
            Credentials::Basic {
                username: "alice".to_string(),
                password: String::new(),
            }
        );
    }

    #[test]
    fn token_credentials() {
        let creds = decode_auth(&encode("token://abcd1234")).unwrap();
        assert_eq!(creds, Some(Credentials::Token("abcd1234".to_string())));
    }

    #[test]
    fn unpadded_input_is_accepted() {
        let padded = encode("token://abcd1234x");
        let unpadded = padded.trim_end_matches('=');
        assert_eq!(
            decode_auth(unpadded).unwrap(),
            Some(Credentials::Token("abcd1234x".to_string()))
        );
    }

    #[test]
    fn empty_means_anonymous() {
        assert_eq!(decode_auth("").unwrap(), None);
    }

    #[test]
    fn malformed_inputs_are_format_errors() {
        for plain in ["token://ab", "ssh://abcdef", "basic:alice:pw", "token://"] {
            let err = decode_auth(&encode(plain)).unwrap_err();
            assert!(matches!(err, RequestError::AuthFormat), "{plain}: {err}");
        }
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = decode_auth("not base64!").unwrap_err();
        assert!(matches!(err, RequestError::AuthEncoding(_)));
    }

    #[test]
    fn encode_then_decode_returns_the_same_credentials() {
        let creds = Credentials::Basic {
            username: "bob".to_string(),
            password: "pa:ss".to_string(),
        };
        assert_eq!(decode_auth(&encode_auth(&creds)).unwrap(), Some(creds));
    }
}
