use rand::{distributions::Alphanumeric, Rng};

/// Length of the string rendered for the `randomness` parameter.
pub const RANDOM_LEN: usize = 16;

/// Random string of `len` characters drawn uniformly from `[0-9a-zA-Z]`.
pub fn rand_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn length_and_alphabet() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let s = rand_string(&mut rng, RANDOM_LEN);
            assert_eq!(s.len(), RANDOM_LEN);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()), "{s}");
        }
    }

    #[test]
    fn thousand_strings_are_distinct() {
        let mut rng = rand::thread_rng();
        let seen: HashSet<String> = (0..1000)
            .map(|_| rand_string(&mut rng, RANDOM_LEN))
            .collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn seeded_generator_is_deterministic() {
        let a = rand_string(&mut StdRng::seed_from_u64(7), RANDOM_LEN);
        let b = rand_string(&mut StdRng::seed_from_u64(7), RANDOM_LEN);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_length() {
        assert_eq!(rand_string(&mut rand::thread_rng(), 0), "");
    }
}
