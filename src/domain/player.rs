/// Player controller: charged jumping, surface reactions, wall bounce and
/// pose selection layered over a `Body`.
///
/// ## Step order
///
///   1. input edges: jump press starts a charge, A/D presses aim it,
///      jump release fires it
///   2. snow gate (deep snow pins the player until a jump starts)
///   3. body integration, then the animation advances
///   4. ground reaction for a downward contact (ice / snow / win / solid)
///   5. wall bounce once airborne long enough
///   6. pose by priority: Jump > Run > Crouch > Idle
///   7. a charge held to the cap fires on its own
///
/// The charge is timed with the wall clock through `TimeSource`; the
/// rest of the state advances once per step.

use std::time::Instant;

use super::animation::{Animation, AnimationLibrary, EntityKind, Frame};
use super::body::{Body, Collisions};
use super::entity::{Direction, FrameInput};
use super::geom::Vec2;
use super::tile::Surface;
use super::tilemap::Tilemap;
use crate::config::PhysicsConfig;

/// Pose shown by the player. One animation per action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Idle,
    Run,
    Jump,
    Crouch,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Idle, Action::Run, Action::Jump, Action::Crouch];
}

/// The start instant only exists while the jump key is held.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpCharge {
    Idle,
    Charging { started: Instant, aim: Direction },
}

/// What happened during one controller step.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct StepOutcome {
    pub jumped: Option<f64>,
    pub landed: Option<Surface>,
    pub wall_bounce: bool,
    pub won: bool,
    pub footstep: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub jumps_remaining: u8,
    pub air_time: u32,
    pub charge: JumpCharge,
    /// Power of the most recent jump.
    pub jump_charge_power: f64,
    /// Aim of the most recent jump; reset to neutral when jumping off the ground.
    pub last_direction: Direction,
    pub surface: Surface,
    pub action: Action,
    pub has_won: bool,
    pub total_jumps: u32,
    /// A jump is in flight; cleared on landing.
    pub in_jump: bool,
    animation: Animation,
    footstep_counter: u32,
    footstep_index: u32,
    prev_input: FrameInput,
    physics: PhysicsConfig,
}

impl Player {
    pub fn new(
        pos: Vec2,
        size: (i32, i32),
        physics: &PhysicsConfig,
        library: &AnimationLibrary,
    ) -> Self {
        Player {
            body: Body::new(pos, size, physics),
            jumps_remaining: 1,
            air_time: 0,
            charge: JumpCharge::Idle,
            jump_charge_power: 0.0,
            last_direction: Direction::Neutral,
            surface: Surface::None,
            action: Action::Idle,
            has_won: false,
            total_jumps: 0,
            in_jump: false,
            animation: library.get(EntityKind::Player, Action::Idle).instantiate(),
            footstep_counter: 0,
            footstep_index: 0,
            prev_input: FrameInput::default(),
            physics: physics.clone(),
        }
    }

    // ── Charge protocol ──

    pub fn is_charging(&self) -> bool {
        matches!(self.charge, JumpCharge::Charging { .. })
    }

    pub fn begin_charge(&mut self, now: Instant) {
        self.charge = JumpCharge::Charging { started: now, aim: Direction::Neutral };
    }

    /// Drop a held charge and forget the held keys. A charge held across a
    /// pause would otherwise fire at full power on resume.
    pub fn suspend(&mut self) {
        self.charge = JumpCharge::Idle;
        self.prev_input = FrameInput::default();
    }

    /// Fire the held charge. Returns the power if a jump actually happened.
    pub fn release_charge(&mut self, now: Instant) -> Option<f64> {
        let JumpCharge::Charging { started, aim } = self.charge else {
            return None;
        };
        self.charge = JumpCharge::Idle;
        let held = now.saturating_duration_since(started).as_secs_f64();
        let power = held.min(self.physics.max_jump_power);
        self.last_direction = aim;
        self.jump(power).then_some(power)
    }

    /// Charge progress in `0.0..=1.0` for the HUD, `None` when not charging.
    pub fn charge_power_preview(&self, now: Instant) -> Option<f64> {
        match self.charge {
            JumpCharge::Charging { started, .. } => {
                let held = now.saturating_duration_since(started).as_secs_f64();
                Some((held / self.physics.max_jump_power).min(1.0))
            }
            JumpCharge::Idle => None,
        }
    }

    /// Launch with `power` seconds of charge. Only possible with a jump in
    /// hand; otherwise nothing happens.
    pub fn jump(&mut self, power: f64) -> bool {
        if self.jumps_remaining != 1 {
            return false;
        }
        self.body.velocity.y = -self.physics.jump_coefficient * power;
        match self.last_direction {
            Direction::Right => {
                self.body.velocity.x = self.physics.jump_kick;
                self.body.flip = false;
            }
            Direction::Left => {
                self.body.velocity.x = -self.physics.jump_kick;
                self.body.flip = true;
            }
            Direction::Neutral => {}
        }
        self.jumps_remaining = 0;
        self.total_jumps += 1;
        self.air_time = self.physics.jump_air_grace + 1;
        self.in_jump = true;
        self.jump_charge_power = power;
        if self.body.collisions.down {
            self.last_direction = Direction::Neutral;
        }
        true
    }

    // ── Step ──

    pub fn step(
        &mut self,
        input: FrameInput,
        map: &Tilemap,
        now: Instant,
        library: &AnimationLibrary,
    ) -> StepOutcome {
        let mut out = StepOutcome::default();
        let prev = std::mem::replace(&mut self.prev_input, input);

        if input.jump && !prev.jump {
            self.begin_charge(now);
        }
        if let JumpCharge::Charging { aim, .. } = &mut self.charge {
            if input.left && !prev.left {
                *aim = Direction::Left;
            }
            if input.right && !prev.right {
                *aim = Direction::Right;
            }
        }
        if !input.jump && prev.jump {
            out.jumped = self.release_charge(now);
        }

        let mut intent = if self.is_charging() { 0.0 } else { input.direction().sign() };
        if self.surface == Surface::Snow && !self.is_charging() && !self.in_jump {
            self.body.velocity.x = 0.0;
            intent = 0.0;
        }

        self.body.airborne = self.is_charging() || self.in_jump;
        self.body.integrate(map, Vec2::new(intent, 0.0), &self.physics);
        self.animation.update();

        self.air_time += 1;
        if self.body.collisions.down {
            self.air_time = 0;
            self.jumps_remaining = 1;
            if let Some(kind) = self.body.ground {
                self.react_to_ground(kind.surface(), &mut out);
            }
        }

        let grace = self.physics.jump_air_grace;
        if self.body.collisions.right && self.air_time > grace {
            self.body.velocity.x = -self.physics.wall_bounce;
            out.wall_bounce = true;
        } else if self.body.collisions.left && self.air_time > grace {
            self.body.velocity.x = self.physics.wall_bounce;
            out.wall_bounce = true;
        }

        let next = if self.air_time > grace {
            Action::Jump
        } else if intent != 0.0 {
            Action::Run
        } else if self.is_charging() && self.air_time == 0 {
            Action::Crouch
        } else if !self.is_charging() && !self.in_jump {
            Action::Idle
        } else {
            self.action
        };
        self.set_action(next, library);

        if let JumpCharge::Charging { started, aim } = self.charge {
            let held = now.saturating_duration_since(started).as_secs_f64();
            if held >= self.physics.max_jump_power {
                out.jumped = self.release_charge(now).or(out.jumped);
            } else {
                match aim {
                    Direction::Right => self.body.flip = false,
                    Direction::Left => self.body.flip = true,
                    Direction::Neutral => {}
                }
            }
        }

        out.footstep = self.advance_footsteps(intent);
        out
    }

    fn react_to_ground(&mut self, surface: Surface, out: &mut StepOutcome) {
        if self.in_jump {
            self.in_jump = false;
            out.landed = Some(surface);
        }
        match surface {
            Surface::Ice => {
                let vx = self.body.velocity.x;
                let decay = self.physics.ice_decay;
                self.body.velocity.x = if vx > 0.0 {
                    (vx - decay).max(0.0)
                } else if vx < 0.0 {
                    (vx + decay).min(0.0)
                } else {
                    0.0
                };
                self.surface = Surface::Ice;
            }
            Surface::Snow => self.surface = Surface::Snow,
            Surface::Win => {
                self.surface = Surface::Win;
                out.won = !self.has_won;
                self.has_won = true;
            }
            Surface::Solid | Surface::None => {
                self.surface = Surface::Solid;
                self.body.velocity.x = 0.0;
            }
        }
    }

    fn set_action(&mut self, action: Action, library: &AnimationLibrary) {
        if action != self.action {
            self.action = action;
            self.animation = library.get(EntityKind::Player, action).instantiate();
        }
    }

    /// Footsteps tick while walking with ground underfoot.
    fn advance_footsteps(&mut self, intent: f64) -> Option<u32> {
        if intent == 0.0 {
            self.footstep_counter = 0;
            return None;
        }
        if self.air_time > self.physics.jump_air_grace {
            return None;
        }
        self.footstep_counter += 1;
        if self.footstep_counter < self.physics.footstep_interval {
            return None;
        }
        self.footstep_counter = 0;
        let index = self.footstep_index;
        self.footstep_index = (self.footstep_index + 1) % self.physics.footstep_variants.max(1);
        Some(index)
    }

    // ── Render surface ──

    pub fn position(&self) -> Vec2 {
        self.body.pos
    }

    pub fn flip(&self) -> bool {
        self.body.flip
    }

    #[allow(dead_code)]
    pub fn collisions(&self) -> Collisions {
        self.body.collisions
    }

    pub fn frame(&self) -> &Frame {
        self.animation.frame()
    }

    /// Sprite anchor relative to the hitbox. The crouch art is shorter.
    pub fn render_offset(&self) -> (i32, i32) {
        if self.action == Action::Crouch {
            (-3, 7)
        } else {
            (-3, -3)
        }
    }
}
