//! Weighted Endpoint Pool - Adaptive RPC Endpoint Selection
//!
//! Holds the redundant RPC endpoints with an adaptive weight each.
//! Selection is a weighted random draw, so a penalized endpoint keeps a
//! small chance of being picked and can earn its weight back. Endpoints
//! are never removed; weight only decays and recovers within [1, 1024].

use std::sync::Mutex;

use rand::Rng;
use tracing::debug;

/// Upper weight bound; also the initial weight of every endpoint.
pub const MAX_WEIGHT: u32 = 1024;
/// Lower weight bound; a fully penalized endpoint stays selectable.
pub const MIN_WEIGHT: u32 = 1;

#[derive(Debug)]
struct Slot {
    url: String,
    weight: u32,
}

/// Ordered collection of endpoints with adaptive weights.
#[derive(Debug)]
pub struct EndpointPool {
    slots: Mutex<Vec<Slot>>,
}

impl EndpointPool {
    /// Build a pool with every endpoint at full weight.
    ///
    /// # Panics
    /// Panics if `urls` is empty; config validation rejects that earlier.
    pub fn new(urls: impl IntoIterator<Item = String>) -> Self {
        let slots: Vec<Slot> = urls
            .into_iter()
            .map(|url| Slot {
                url,
                weight: MAX_WEIGHT,
            })
            .collect();
        assert!(!slots.is_empty(), "endpoint pool requires at least one URL");
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Pick one endpoint with probability proportional to its weight.
    pub fn select(&self) -> String {
        self.select_with(&mut rand::thread_rng())
    }

    /// Weighted draw with a caller-supplied RNG (seedable in tests).
    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let slots = self.slots.lock().expect("endpoint pool poisoned");
        let total: u64 = slots.iter().map(|s| u64::from(s.weight)).sum();
        let draw = rng.gen_range(0.0..total as f64);

        let mut cumulative = 0.0;
        for slot in slots.iter() {
            cumulative += f64::from(slot.weight);
            if draw < cumulative {
                return slot.url.clone();
            }
        }
        // Float accumulation can land the draw a hair past the last
        // interval; the last endpoint owns that boundary.
        slots.last().map(|s| s.url.clone()).unwrap_or_default()
    }

    /// Halve the weight of `url` after a failure correlated to it.
    pub fn penalize(&self, url: &str) {
        let mut slots = self.slots.lock().expect("endpoint pool poisoned");
        for slot in slots.iter_mut() {
            if slot.url == url {
                slot.weight = (slot.weight / 2).max(MIN_WEIGHT);
                debug!(endpoint = %slot.url, weight = slot.weight, "Endpoint penalized");
            }
        }
    }

    /// Double every endpoint's weight after a successful reconnection.
    pub fn recover_all(&self) {
        let mut slots = self.slots.lock().expect("endpoint pool poisoned");
        for slot in slots.iter_mut() {
            slot.weight = slot.weight.saturating_mul(2).min(MAX_WEIGHT);
        }
    }

    /// Current (url, weight) pairs, for metrics and tests.
    pub fn weights(&self) -> Vec<(String, u32)> {
        self.slots
            .lock()
            .expect("endpoint pool poisoned")
            .iter()
            .map(|s| (s.url.clone(), s.weight))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().expect("endpoint pool poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn pool(urls: &[&str]) -> EndpointPool {
        EndpointPool::new(urls.iter().map(|u| (*u).to_string()))
    }

    #[test]
    fn test_penalize_halves_with_floor() {
        let p = pool(&["a", "b"]);
        for _ in 0..20 {
            p.penalize("a");
        }
        let weights: HashMap<_, _> = p.weights().into_iter().collect();
        assert_eq!(weights["a"], MIN_WEIGHT);
        assert_eq!(weights["b"], MAX_WEIGHT);
    }

    #[test]
    fn test_recover_doubles_with_ceiling() {
        let p = pool(&["a", "b"]);
        p.penalize("a"); // 512
        p.penalize("a"); // 256
        p.recover_all(); // a: 512, b stays capped
        let weights: HashMap<_, _> = p.weights().into_iter().collect();
        assert_eq!(weights["a"], 512);
        assert_eq!(weights["b"], MAX_WEIGHT);
        for _ in 0..5 {
            p.recover_all();
        }
        let weights: HashMap<_, _> = p.weights().into_iter().collect();
        assert_eq!(weights["a"], MAX_WEIGHT);
    }

    #[test]
    fn test_weights_never_leave_bounds() {
        let p = pool(&["a"]);
        for _ in 0..100 {
            p.penalize("a");
        }
        assert_eq!(p.weights()[0].1, MIN_WEIGHT);
        for _ in 0..100 {
            p.recover_all();
        }
        assert_eq!(p.weights()[0].1, MAX_WEIGHT);
    }

    #[test]
    fn test_selection_frequency_tracks_weights() {
        let p = pool(&["heavy", "light"]);
        // heavy: 1024, light: 128 → expect ~8:1.
        p.penalize("light");
        p.penalize("light");
        p.penalize("light");

        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<String, u32> = HashMap::new();
        let draws = 20_000;
        for _ in 0..draws {
            *counts.entry(p.select_with(&mut rng)).or_default() += 1;
        }

        let heavy = f64::from(counts["heavy"]);
        let light = f64::from(counts["light"]);
        let expected = 1024.0 / (1024.0 + 128.0);
        let observed = heavy / (heavy + light);
        assert!(
            (observed - expected).abs() < 0.02,
            "observed {observed}, expected {expected}"
        );
        assert!(light > 0.0, "penalized endpoint must stay selectable");
    }

    #[test]
    fn test_selection_always_returns_member() {
        let p = pool(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let url = p.select_with(&mut rng);
            assert!(["a", "b", "c"].contains(&url.as_str()));
        }
    }

    #[test]
    fn test_penalize_unknown_url_is_noop() {
        let p = pool(&["a"]);
        p.penalize("https://unknown.example");
        assert_eq!(p.weights()[0].1, MAX_WEIGHT);
    }
}
