use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::shape::ShapeKind;

/// Color tag carried by active pieces and locked cells.
///
/// The palette is independent of [`ShapeKind`]: with the default
/// [`ColorPolicy`](crate::ColorPolicy) any shape may spawn in any color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Color {
    Amber = 0,
    Red = 1,
    Blue = 2,
    Green = 3,
    Purple = 4,
    Orange = 5,
}

impl Distribution<Color> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        Color::ALL[rng.random_range(0..Color::LEN)]
    }
}

impl Color {
    /// Number of palette entries.
    pub const LEN: usize = 6;

    pub const ALL: [Color; Color::LEN] = [
        Color::Amber,
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Purple,
        Color::Orange,
    ];

    /// Returns the `#rrggbb` representation, for front ends that want one.
    ///
    /// ```
    /// use blockfall_engine::Color;
    ///
    /// assert_eq!(Color::Blue.hex(), "#3498db");
    /// ```
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Color::Amber => "#f39c12",
            Color::Red => "#e74c3c",
            Color::Blue => "#3498db",
            Color::Green => "#2ecc71",
            Color::Purple => "#9b59b6",
            Color::Orange => "#e67e22",
        }
    }

    /// Fixed color used by [`ColorPolicy::PerShape`](crate::ColorPolicy::PerShape).
    ///
    /// The palette has six entries for seven shapes, so `J` and `L` share
    /// a color.
    #[must_use]
    pub const fn for_shape(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::T => Color::Purple,
            ShapeKind::S => Color::Green,
            ShapeKind::Z => Color::Red,
            ShapeKind::O => Color::Amber,
            ShapeKind::I => Color::Blue,
            ShapeKind::L | ShapeKind::J => Color::Orange,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_sampling_covers_palette() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [false; Color::LEN];
        for _ in 0..500 {
            let color: Color = rng.random();
            seen[color as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "every color should be drawn: {seen:?}");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Color::Amber).unwrap();
        assert_eq!(json, "\"amber\"");
        let color: Color = serde_json::from_str("\"orange\"").unwrap();
        assert_eq!(color, Color::Orange);
    }
}
