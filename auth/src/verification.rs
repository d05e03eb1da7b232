use rand::rngs::OsRng;
use rand::Rng;

/// Lowest and highest values of a verification code, inclusive.
pub const CODE_MIN: u32 = 100_000;
pub const CODE_MAX: u32 = 999_999;

/// Generate a one-time 6-digit verification code.
///
/// Drawn uniformly from `[100000, 999999]` using the OS CSPRNG; a
/// predictable generator here would let an attacker verify someone else's
/// email. Collisions across users are acceptable since uniqueness is scoped
/// to `(user_id, code)`.
pub fn generate_code() -> u32 {
    OsRng.gen_range(CODE_MIN..=CODE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..1_000 {
            let code = generate_code();
            assert!((CODE_MIN..=CODE_MAX).contains(&code), "code {code}");
        }
    }

    #[test]
    fn test_codes_vary() {
        let first = generate_code();
        let mut saw_different = false;
        for _ in 0..64 {
            if generate_code() != first {
                saw_different = true;
                break;
            }
        }
        assert!(saw_different);
    }
}
