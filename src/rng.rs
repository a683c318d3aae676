use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeded random number generator stored inside the match state.
///
/// Serializes as its seed plus the stream cursor, so a match carried across a
/// process boundary continues the exact same random sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RngSnapshot", into = "RngSnapshot")]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct RngSnapshot {
    seed: u64,
    cursor: u64,
}

impl From<RngSnapshot> for GameRng {
    fn from(snapshot: RngSnapshot) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(snapshot.seed);
        rng.set_word_pos(snapshot.cursor as u128);
        GameRng {
            rng,
            seed: snapshot.seed,
        }
    }
}

impl From<GameRng> for RngSnapshot {
    fn from(rng: GameRng) -> Self {
        RngSnapshot {
            seed: rng.seed,
            cursor: rng.cursor(),
        }
    }
}

impl PartialEq for GameRng {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.cursor() == other.cursor()
    }
}

impl GameRng {
    /// Create a new GameRng with an optional seed
    /// If seed is None, generates a random seed
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            use rand::thread_rng;
            thread_rng().gen()
        });

        let rng = ChaCha8Rng::seed_from_u64(seed);
        GameRng { rng, seed }
    }

    /// Get the seed used for this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Position in the generator's output stream
    pub fn cursor(&self) -> u64 {
        self.rng.get_word_pos() as u64
    }

    /// Generate a random integer in range [0, max)
    pub fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }

    /// Fisher-Yates shuffle for a mutable slice
    pub fn shuffle<T>(&mut self, array: &mut [T]) {
        for i in (1..array.len()).rev() {
            let j = self.random_range(i + 1);
            array.swap(i, j);
        }
    }

    /// Pick up to `count` entries without replacement, in pick order.
    pub fn pick<T: Clone>(&mut self, entries: &[T], count: usize) -> Vec<T> {
        let mut pool: Vec<T> = entries.to_vec();
        let mut chosen = Vec::with_capacity(count.min(pool.len()));
        while chosen.len() < count && !pool.is_empty() {
            let idx = self.random_range(pool.len());
            chosen.push(pool.remove(idx));
        }
        chosen
    }
}
