/// Axis-separated body integrator: the physics core.
///
/// ## Step order
///
///   1. frame movement = intent + velocity
///   2. X: move, then clamp against every overlapping solid rect
///   3. Y: move, then clamp; a downward contact records the floor kind
///   4. gravity, capped at terminal velocity
///   5. floor or ceiling contact zeroes vertical velocity
///   6. facing follows the sign of the horizontal intent
///
/// X is always resolved before Y. Each axis is clamped against the full
/// collision set, so a diagonal move cannot slip through a corner.
///
/// ## Hitbox
///
/// Integer rect at the truncated position. While airborne and rising it is
/// `hitbox_shrink` pixels smaller on both axes, which lets jumps clear
/// gaps exactly one body wide.

use super::geom::{Rect, Vec2};
use super::tile::TileKind;
use super::tilemap::Tilemap;
use crate::config::PhysicsConfig;

/// Contact flags from the most recent step. Never carried across steps.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Collisions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Clone, Debug)]
pub struct Body {
    pub pos: Vec2,
    pub size: (i32, i32),
    pub velocity: Vec2,
    pub collisions: Collisions,
    /// Facing left when true.
    pub flip: bool,
    /// Kind of the tile last landed on during this step.
    pub ground: Option<TileKind>,
    /// Enables the rising-hitbox shrink.
    pub airborne: bool,
    hitbox_shrink: i32,
}

impl Body {
    pub fn new(pos: Vec2, size: (i32, i32), physics: &PhysicsConfig) -> Self {
        Body {
            pos,
            size,
            velocity: Vec2::ZERO,
            collisions: Collisions::default(),
            flip: false,
            ground: None,
            airborne: false,
            hitbox_shrink: physics.hitbox_shrink,
        }
    }

    pub fn rect(&self) -> Rect {
        if self.airborne && self.velocity.y < 0.0 {
            Rect::from_pos(
                self.pos,
                self.size.0 - self.hitbox_shrink,
                self.size.1 - self.hitbox_shrink,
            )
        } else {
            Rect::from_pos(self.pos, self.size.0, self.size.1)
        }
    }

    pub fn integrate(&mut self, map: &Tilemap, movement: Vec2, physics: &PhysicsConfig) {
        self.collisions = Collisions::default();
        self.ground = None;

        let fm = movement + self.velocity;

        // Everything the body can touch this step lies inside its swept box.
        let ts = map.tile_size() as i32;
        let reach = self.rect().inflate(
            fm.x.abs().ceil() as i32 + ts,
            fm.y.abs().ceil() as i32 + ts,
        );
        let solids = map.physics_rects_near(reach);

        // ── X axis ──
        self.pos.x += fm.x;
        let mut r = self.rect();
        for (tile, _) in &solids {
            if r.overlaps(tile) {
                if fm.x > 0.0 {
                    r.set_right(tile.left());
                    self.collisions.right = true;
                }
                if fm.x < 0.0 {
                    r.set_left(tile.right());
                    self.collisions.left = true;
                }
                self.pos.x = r.x as f64;
            }
        }

        // ── Y axis ──
        self.pos.y += fm.y;
        let mut r = self.rect();
        for (tile, kind) in &solids {
            if r.overlaps(tile) {
                if fm.y > 0.0 {
                    r.set_bottom(tile.top());
                    self.collisions.down = true;
                    self.ground = Some(*kind);
                }
                if fm.y < 0.0 {
                    r.set_top(tile.bottom());
                    self.collisions.up = true;
                }
                self.pos.y = r.y as f64;
            }
        }

        self.velocity.y = (self.velocity.y + physics.gravity).min(physics.terminal_velocity);
        if self.collisions.down || self.collisions.up {
            self.velocity.y = 0.0;
        }

        if movement.x > 0.0 {
            self.flip = false;
        } else if movement.x < 0.0 {
            self.flip = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tilemap::GridPos;

    fn physics() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    /// Stone floor along row 10 (y = 160..176) from x = -5 to 20.
    fn floor() -> Tilemap {
        let mut map = Tilemap::new(16);
        for x in -5..=20 {
            map.set_tile(TileKind::Stone, 0, GridPos::new(x, 10));
        }
        map
    }

    fn body_at(x: f64, y: f64) -> Body {
        Body::new(Vec2::new(x, y), (16, 28), &physics())
    }

    #[test]
    fn falls_onto_floor_and_never_sinks() {
        let map = floor();
        let mut b = body_at(32.0, 100.0);
        let mut landings = 0;
        for _ in 0..200 {
            b.integrate(&map, Vec2::ZERO, &physics());
            assert!(b.rect().bottom() <= 160);
            if b.collisions.down {
                landings += 1;
                assert_eq!(b.ground, Some(TileKind::Stone));
                assert_eq!(b.pos.y, 160.0 - 28.0);
                assert_eq!(b.velocity.y, 0.0);
            }
        }
        assert!(landings > 0);
    }

    #[test]
    fn gravity_never_exceeds_terminal_velocity() {
        let map = Tilemap::new(16);
        let mut b = body_at(0.0, 0.0);
        let mut prev = b.velocity.y;
        for _ in 0..500 {
            b.integrate(&map, Vec2::ZERO, &physics());
            assert!(b.velocity.y <= 5.0);
            assert!(b.velocity.y >= prev);
            prev = b.velocity.y;
        }
        assert_eq!(b.velocity.y, 5.0);
    }

    #[test]
    fn grounded_step_always_ends_with_zero_vertical_velocity() {
        let map = floor();
        let mut b = body_at(40.0, 160.0 - 28.0);
        for i in 0..50 {
            let intent = if i % 2 == 0 { Vec2::new(1.0, 0.0) } else { Vec2::new(-1.0, 0.0) };
            b.integrate(&map, intent, &physics());
            if b.collisions.down {
                assert_eq!(b.velocity.y, 0.0);
            }
        }
    }

    #[test]
    fn wall_clamps_right_edge() {
        let mut map = floor();
        // Wall column at x = 5 (80..96), two tiles tall above the floor
        map.set_tile(TileKind::Stone, 0, GridPos::new(5, 9));
        map.set_tile(TileKind::Stone, 0, GridPos::new(5, 8));
        let mut b = body_at(60.0, 160.0 - 28.0);
        for _ in 0..10 {
            b.integrate(&map, Vec2::new(3.0, 0.0), &physics());
        }
        assert!(b.collisions.right);
        assert_eq!(b.rect().right(), 80);
    }

    #[test]
    fn wall_clamps_left_edge() {
        let mut map = floor();
        map.set_tile(TileKind::Stone, 0, GridPos::new(1, 9));
        map.set_tile(TileKind::Stone, 0, GridPos::new(1, 8));
        let mut b = body_at(40.0, 160.0 - 28.0);
        for _ in 0..10 {
            b.integrate(&map, Vec2::new(-3.0, 0.0), &physics());
        }
        assert!(b.collisions.left);
        assert_eq!(b.rect().left(), 32);
        assert!(b.flip);
    }

    #[test]
    fn no_tunneling_for_tile_sized_moves() {
        let mut map = Tilemap::new(16);
        map.set_tile(TileKind::Stone, 0, GridPos::new(4, 0));
        let wall = map.cell_rect(GridPos::new(4, 0));
        for speed in 1..=16 {
            let mut b = body_at(40.0, 0.0);
            b.size = (16, 16);
            for _ in 0..20 {
                b.velocity.y = 0.0;
                b.integrate(&map, Vec2::new(speed as f64, 0.0), &physics());
                assert!(!b.rect().overlaps(&wall), "overlap at speed {speed}");
            }
        }
    }

    #[test]
    fn ceiling_hit_zeroes_velocity() {
        let mut map = Tilemap::new(16);
        map.set_tile(TileKind::Stone, 0, GridPos::new(2, 0));
        let mut b = body_at(32.0, 18.0);
        b.velocity.y = -4.0;
        b.integrate(&map, Vec2::ZERO, &physics());
        assert!(b.collisions.up);
        assert_eq!(b.pos.y, 16.0);
        assert_eq!(b.velocity.y, 0.0);
    }

    #[test]
    fn rising_airborne_hitbox_is_smaller() {
        let mut b = body_at(0.0, 0.0);
        b.airborne = true;
        b.velocity.y = -1.0;
        assert_eq!(b.rect(), Rect::new(0, 0, 11, 23));
        b.velocity.y = 1.0;
        assert_eq!(b.rect(), Rect::new(0, 0, 16, 28));
        b.airborne = false;
        b.velocity.y = -1.0;
        assert_eq!(b.rect(), Rect::new(0, 0, 16, 28));
    }

    #[test]
    fn zero_intent_keeps_facing() {
        let map = Tilemap::new(16);
        let mut b = body_at(0.0, 0.0);
        b.integrate(&map, Vec2::new(-1.0, 0.0), &physics());
        assert!(b.flip);
        b.integrate(&map, Vec2::ZERO, &physics());
        assert!(b.flip);
        b.integrate(&map, Vec2::new(1.0, 0.0), &physics());
        assert!(!b.flip);
    }

    #[test]
    fn collision_flags_reset_each_step() {
        let map = floor();
        let mut b = body_at(32.0, 160.0 - 28.0);
        b.velocity.y = 1.0;
        b.integrate(&map, Vec2::ZERO, &physics());
        assert!(b.collisions.down);
        b.pos.y = 0.0;
        b.integrate(&map, Vec2::ZERO, &physics());
        assert_eq!(b.collisions, Collisions::default());
        assert_eq!(b.ground, None);
    }
}
