//! Human-shareable room codes

use rand::Rng;

/// Alphabet without easily confused characters (no 0/O, 1/I)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Room code length
pub const CODE_LEN: usize = 4;

/// Generate a random room code
pub fn generate<R: Rng>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user input into canonical code form, rejecting malformed codes
pub fn normalize(input: &str) -> Option<String> {
    let code: String = input.trim().to_ascii_uppercase();
    if code.len() != CODE_LEN {
        return None;
    }
    if !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
        return None;
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_codes_normalize_to_themselves() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let code = generate(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            assert_eq!(normalize(&code), Some(code));
        }
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize(" kn3p "), Some("KN3P".to_string()));
    }

    #[test]
    fn malformed_codes_are_rejected() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("AB"), None);
        assert_eq!(normalize("AB0D"), None); // ambiguous zero
        assert_eq!(normalize("TOOLONG"), None);
    }
}
