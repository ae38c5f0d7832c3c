/// Per-step input and the small direction vocabulary shared by the
/// controller, the input layer and the renderer.

/// Horizontal direction. `Neutral` is the jump aim before A/D is pressed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Direction {
    Left,
    Right,
    #[default]
    Neutral,
}

impl Direction {
    /// Direction of a held left/right pair. Both or neither is neutral.
    pub fn from_held(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, false) => Direction::Left,
            (false, true) => Direction::Right,
            _ => Direction::Neutral,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
            Direction::Neutral => 0.0,
        }
    }
}

/// Frame input: held movement/jump keys plus a pause edge.
/// Jump press/release edges are derived by the controller from consecutive
/// frames, so the input layer only reports what is held.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub pause: bool,
}

impl FrameInput {
    pub fn direction(&self) -> Direction {
        Direction::from_held(self.left, self.right)
    }
}
