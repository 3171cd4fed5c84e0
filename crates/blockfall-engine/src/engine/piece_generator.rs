use std::{fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    ActivePiece, GameConfig,
    config::{ColorPolicy, GeneratorPolicy},
    core::{color::Color, shape::ShapeKind},
};

/// Produces the pieces of a session.
///
/// # Bag policy
///
/// With [`GeneratorPolicy::Bag`] the generator keeps a working list of
/// shapes:
///
/// 1. When the list is empty, it is refilled with all seven kinds
/// 2. The refilled list is shuffled uniformly (Fisher–Yates)
/// 3. Each draw pops one entry
///
/// Every window of seven consecutive draws aligned to a refill therefore
/// holds each shape exactly once, and at most twelve pieces separate two
/// pieces of the same kind.
///
/// [`GeneratorPolicy::Uniform`] draws each shape independently instead.
///
/// # Example
///
/// ```
/// use blockfall_engine::{ColorPolicy, GeneratorPolicy, PieceGenerator};
///
/// let mut generator = PieceGenerator::new(GeneratorPolicy::Bag, ColorPolicy::RandomPerSpawn, 10);
/// let piece = generator.next();
/// assert_eq!(piece.y(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: Pcg32,
    policy: GeneratorPolicy,
    color_policy: ColorPolicy,
    cols: usize,
    bag: Vec<ShapeKind>,
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed initialising the generator's random source. The same seed
/// yields the same shapes and colors, which makes sessions reproducible for
/// debugging, scripted replays and tests. Serialised as a 32-character hex
/// string.
///
/// ```
/// use blockfall_engine::PieceSeed;
///
/// let seed: PieceSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
/// assert_eq!(seed.to_string(), "000102030405060708090a0b0c0d0e0f");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed([u8; 16]);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed {input:?}: {reason}")]
pub struct ParseSeedError {
    input: String,
    reason: String,
}

impl PieceSeed {
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |reason: String| ParseSeedError {
            input: s.to_owned(),
            reason,
        };
        if s.len() != 32 {
            return Err(error(format!("expected 32 characters, got {}", s.len())));
        }
        let num = u128::from_str_radix(s, 16).map_err(|e| error(e.to_string()))?;
        Ok(Self::from_u128(num))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceGenerator {
    /// Creates a generator seeded from the thread-local random source.
    ///
    /// For reproducible sequences, use [`Self::with_seed`] instead.
    #[must_use]
    pub fn new(policy: GeneratorPolicy, color_policy: ColorPolicy, cols: usize) -> Self {
        Self::with_seed(policy, color_policy, cols, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed.
    #[must_use]
    pub fn with_seed(
        policy: GeneratorPolicy,
        color_policy: ColorPolicy,
        cols: usize,
        seed: PieceSeed,
    ) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
            policy,
            color_policy,
            cols,
            bag: Vec::with_capacity(ShapeKind::LEN),
        }
    }

    /// Creates a generator following `config`, seeded from `config.seed`
    /// when present.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Self::with_seed(config.generator, config.color, config.cols, seed)
    }

    #[must_use]
    pub fn policy(&self) -> GeneratorPolicy {
        self.policy
    }

    /// Returns the shapes left in the current bag; the last entry is drawn next.
    ///
    /// Always empty under [`GeneratorPolicy::Uniform`].
    #[must_use]
    pub fn bag_remaining(&self) -> &[ShapeKind] {
        &self.bag
    }

    /// Draws the next piece, placed at its spawn position.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> ActivePiece {
        let kind = self.next_kind();
        let color = match self.color_policy {
            ColorPolicy::RandomPerSpawn => self.rng.random::<Color>(),
            ColorPolicy::PerShape => Color::for_shape(kind),
        };
        ActivePiece::spawn(kind, kind.shape(), color, self.cols)
    }

    /// # Panics
    ///
    /// Panics if the bag is empty right after a refill (never happens).
    fn next_kind(&mut self) -> ShapeKind {
        match self.policy {
            GeneratorPolicy::Uniform => self.rng.random(),
            GeneratorPolicy::Bag => {
                if self.bag.is_empty() {
                    self.refill_bag();
                }
                self.bag.pop().expect("refilled bag should never be empty")
            }
        }
    }

    fn refill_bag(&mut self) {
        self.bag.extend(ShapeKind::ALL);
        self.bag.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: PieceSeed = PieceSeed::from_u128(0x1234_5678_9abc_def0_1122_3344_5566_7788);

    fn count_kinds(pieces: &[ActivePiece]) -> [usize; ShapeKind::LEN] {
        let mut counts = [0; ShapeKind::LEN];
        for piece in pieces {
            counts[piece.kind() as usize] += 1;
        }
        counts
    }

    #[test]
    fn test_bag_yields_each_shape_once_per_seven() {
        let mut generator =
            PieceGenerator::with_seed(GeneratorPolicy::Bag, ColorPolicy::RandomPerSpawn, 10, SEED);

        let first: Vec<_> = (0..7).map(|_| generator.next()).collect();
        assert_eq!(count_kinds(&first), [1; ShapeKind::LEN]);

        let mut fourteen = first;
        fourteen.extend((0..7).map(|_| generator.next()));
        assert_eq!(count_kinds(&fourteen), [2; ShapeKind::LEN]);
    }

    #[test]
    fn test_bag_bounds_repeat_distance() {
        let mut generator =
            PieceGenerator::with_seed(GeneratorPolicy::Bag, ColorPolicy::PerShape, 10, SEED);
        let kinds: Vec<_> = (0..700).map(|_| generator.next().kind()).collect();
        for window in kinds.chunks(7) {
            let mut seen = [false; ShapeKind::LEN];
            for kind in window {
                assert!(!seen[*kind as usize], "duplicate {kind:?} in {window:?}");
                seen[*kind as usize] = true;
            }
        }
    }

    #[test]
    fn test_bag_remaining_shrinks() {
        let mut generator =
            PieceGenerator::with_seed(GeneratorPolicy::Bag, ColorPolicy::PerShape, 10, SEED);
        assert!(generator.bag_remaining().is_empty());
        let piece = generator.next();
        assert_eq!(generator.bag_remaining().len(), 6);
        assert!(!generator.bag_remaining().contains(&piece.kind()));
    }

    #[test]
    fn test_uniform_draws_every_shape_eventually() {
        let mut generator =
            PieceGenerator::with_seed(GeneratorPolicy::Uniform, ColorPolicy::PerShape, 10, SEED);
        let pieces: Vec<_> = (0..500).map(|_| generator.next()).collect();
        assert!(count_kinds(&pieces).iter().all(|&n| n > 0));
        assert!(generator.bag_remaining().is_empty());
    }

    #[test]
    fn test_spawn_position_is_centered() {
        let mut generator =
            PieceGenerator::with_seed(GeneratorPolicy::Bag, ColorPolicy::PerShape, 10, SEED);
        for _ in 0..7 {
            let piece = generator.next();
            let expected = match piece.kind() {
                ShapeKind::O => 4,
                ShapeKind::I => 4,
                _ => 3,
            };
            assert_eq!(piece.x(), expected, "{:?}", piece.kind());
            assert_eq!(piece.y(), 0);
        }
    }

    #[test]
    fn test_per_shape_colors() {
        let mut generator =
            PieceGenerator::with_seed(GeneratorPolicy::Uniform, ColorPolicy::PerShape, 10, SEED);
        for _ in 0..50 {
            let piece = generator.next();
            assert_eq!(piece.color(), Color::for_shape(piece.kind()));
        }
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let mut generator1 =
            PieceGenerator::with_seed(GeneratorPolicy::Bag, ColorPolicy::RandomPerSpawn, 10, SEED);
        let mut generator2 =
            PieceGenerator::with_seed(GeneratorPolicy::Bag, ColorPolicy::RandomPerSpawn, 10, SEED);
        for _ in 0..20 {
            assert_eq!(generator1.next(), generator2.next());
        }
    }

    mod piece_seed_serialization {
        use super::*;

        #[test]
        fn test_format_is_32_char_hex_string() {
            let seed: PieceSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let hex_str = serialized.trim_matches('"');

            assert_eq!(hex_str.len(), 32);
            assert!(hex_str.chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = PieceSeed([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");

            let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, seed);
        }

        #[test]
        fn test_deserialize_uppercase_hex() {
            let json = "\"0123456789ABCDEFFEDCBA9876543210\"";
            let deserialized: PieceSeed = serde_json::from_str(json).unwrap();
            assert_eq!(
                deserialized,
                PieceSeed::from_u128(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210)
            );
        }

        #[test]
        fn test_error_cases() {
            for json in [
                "\"ghijklmnopqrstuvwxyzghijklmnopqr\"",
                "\"0123456789abcdef0123456789abcde\"",
                "\"0123456789abcdef0123456789abcdef0\"",
                "\"\"",
            ] {
                let err = serde_json::from_str::<PieceSeed>(json).unwrap_err();
                assert!(err.to_string().contains("invalid hex"), "{json}: {err}");
            }
        }

        #[test]
        fn test_serialize_deserialize_preserves_piece_generation() {
            let original_seed: PieceSeed = rand::rng().random();
            let serialized = serde_json::to_string(&original_seed).unwrap();
            let deserialized_seed: PieceSeed = serde_json::from_str(&serialized).unwrap();

            let mut generator1 = PieceGenerator::with_seed(
                GeneratorPolicy::Bag,
                ColorPolicy::RandomPerSpawn,
                10,
                original_seed,
            );
            let mut generator2 = PieceGenerator::with_seed(
                GeneratorPolicy::Bag,
                ColorPolicy::RandomPerSpawn,
                10,
                deserialized_seed,
            );
            for _ in 0..20 {
                assert_eq!(generator1.next(), generator2.next());
            }
        }
    }
}
