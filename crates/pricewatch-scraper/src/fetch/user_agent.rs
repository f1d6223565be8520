use rand::Rng;

/// Desktop browser user-agents rotated across attempts.
pub const USER_AGENT_POOL: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// Pick a user-agent from [`USER_AGENT_POOL`] using the supplied random source.
pub fn pick_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENT_POOL[rng.random_range(0..USER_AGENT_POOL.len())]
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn same_seed_same_choice() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..16 {
            assert_eq!(pick_user_agent(&mut a), pick_user_agent(&mut b));
        }
    }

    #[test]
    fn always_picks_from_pool() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            assert!(USER_AGENT_POOL.contains(&pick_user_agent(&mut rng)));
        }
    }

    #[test]
    fn rotation_covers_more_than_one_agent() {
        let mut rng = StdRng::seed_from_u64(1);
        let first = pick_user_agent(&mut rng);
        assert!((0..64).any(|_| pick_user_agent(&mut rng) != first));
    }
}
