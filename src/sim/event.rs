/// Events emitted during a simulation step.
/// The sound layer turns each one into an effect.

use crate::domain::tile::Surface;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped { power: f64 },
    Landed { surface: Surface },
    Footstep { index: u32 },
    WallBounce,
    Won,
    Paused,
    Resumed,
}
