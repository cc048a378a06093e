use rand::Rng;

pub const PNR_LEN: usize = 10;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random reservation code: 10 characters of A-Z / 0-9.
///
/// Uniqueness is not guaranteed here; callers check against the store.
pub fn generate_pnr() -> String {
    let mut rng = rand::thread_rng();
    (0..PNR_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_pnr(pnr: &str) -> bool {
    pnr.len() == PNR_LEN
        && pnr
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_pnr_shape() {
        for _ in 0..100 {
            let pnr = generate_pnr();
            assert!(is_valid_pnr(&pnr), "bad pnr {}", pnr);
        }
    }

    #[test]
    fn test_pnrs_rarely_collide() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_pnr()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_validation_rejects_lowercase_and_length() {
        assert!(!is_valid_pnr("abcde12345"));
        assert!(!is_valid_pnr("ABC123"));
        assert!(!is_valid_pnr("ABCDE-1234"));
        assert!(is_valid_pnr("ABCDE12345"));
    }
}
