use rand::Rng;

/// Random bytes behind every session and invitation token.
pub const TOKEN_BYTES: usize = 64;

/// Generate a cryptographically secure, URL-safe token (hex encoded).
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_128_hex_chars() {
        let token = generate_secure_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_is_unique() {
        let t1 = generate_secure_token();
        let t2 = generate_secure_token();
        let t3 = generate_secure_token();
        assert_ne!(t1, t2);
        assert_ne!(t2, t3);
        assert_ne!(t1, t3);
    }
}
