use rand::RngCore;

const TOKEN_BYTES: usize = 20;

/// A fresh opaque token: 20 random bytes rendered as 40 lowercase hex chars.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Extracts the key from an `Authorization` header value.
///
/// Both `Token <key>` and `Bearer <key>` are accepted.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn tokens_are_forty_hex_chars() {
        let token = generate_token();

        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn tokens_decode_back_to_twenty_bytes() {
        let bytes = hex::decode(generate_token()).expect("valid hex");

        assert_eq!(bytes.len(), TOKEN_BYTES);
    }

    #[rstest]
    #[case("Token abc123", Some("abc123"))]
    #[case("Bearer abc123", Some("abc123"))]
    #[case("token   abc123 ", Some("abc123"))]
    #[case("Basic abc123", None)]
    #[case("Token", None)]
    #[case("Token ", None)]
    #[case("abc123", None)]
    fn authorization_schemes(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_authorization(header), expected);
    }
}
