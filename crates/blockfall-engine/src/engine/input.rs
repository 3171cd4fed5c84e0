use serde::{Deserialize, Serialize};

/// A discrete player intent.
///
/// Mapping physical keys to intents is the front end's job; the session
/// only sees these values.
///
/// ```
/// use blockfall_engine::Intent;
///
/// assert_eq!("HardDrop".parse::<Intent>().unwrap(), Intent::HardDrop);
/// assert!("Teleport".parse::<Intent>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::FromStr,
)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    Rotate,
    Hold,
    Restore,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::MoveLeft,
        Intent::MoveRight,
        Intent::SoftDrop,
        Intent::HardDrop,
        Intent::Rotate,
        Intent::Hold,
        Intent::Restore,
    ];
}
