/// WorldState: everything a running session owns.
///
/// ## Ownership
///
///   - `tilemap`: the level for this attempt. Only the level loader replaces it.
///   - `player`: rebuilt at the spawn point on every (re)start.
///   - `library`: shared animation templates, validated once at startup.
///
/// ## Camera / Viewport
///
/// The camera scrolls in world pixels and eases toward the player:
///   `scroll += (target - scroll) / CAMERA_EASE`
/// where `target` puts the player's hitbox centre in the middle of the view.
/// The renderer maps pixels to cells with `world_to_view`.

use crate::config::{GameConfig, PhysicsConfig, PlayerConfig};
use crate::domain::animation::AnimationLibrary;
use crate::domain::geom::Vec2;
use crate::domain::player::Player;
use crate::domain::tilemap::Tilemap;

use super::scores::ScoreRecord;

/// Divisor of the per-step camera catch-up.
pub const CAMERA_EASE: f64 = 30.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    LevelSelect,
    Playing,
    /// Level cleared: summary screen with name entry.
    Won,
}

/// Camera: a viewport into the world, in pixels.
///
/// `(x, y)` is the world pixel at the top-left of the view.
/// `(view_w, view_h)` is the viewport size in world cells, set by the
/// renderer from the terminal size.
#[derive(Clone, Debug)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    pub fn new() -> Self {
        Camera { x: 0.0, y: 0.0, view_w: 0, view_h: 0 }
    }

    fn target(&self, center: (i32, i32), tile_size: u32) -> (f64, f64) {
        let ts = tile_size as f64;
        (
            center.0 as f64 - self.view_w as f64 * ts / 2.0,
            center.1 as f64 - self.view_h as f64 * ts / 2.0,
        )
    }

    /// Ease toward `center` (a world pixel).
    pub fn follow(&mut self, center: (i32, i32), tile_size: u32) {
        let (tx, ty) = self.target(center, tile_size);
        self.x += (tx - self.x) / CAMERA_EASE;
        self.y += (ty - self.y) / CAMERA_EASE;
    }

    /// Jump straight to `center`. Used on level load / restart.
    pub fn center_on(&mut self, center: (i32, i32), tile_size: u32) {
        let (tx, ty) = self.target(center, tile_size);
        self.x = tx;
        self.y = ty;
    }

    /// World pixel to viewport cell. `None` if outside the visible area.
    pub fn world_to_view(&self, px: f64, py: f64, tile_size: u32) -> Option<(usize, usize)> {
        let ts = tile_size as f64;
        let vx = ((px - self.x.trunc()) / ts).floor();
        let vy = ((py - self.y.trunc()) / ts).floor();
        if vx >= 0.0 && vx < self.view_w as f64 && vy >= 0.0 && vy < self.view_h as f64 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }
}

pub struct WorldState {
    // ── Level ──
    pub tilemap: Tilemap,
    pub level_name: String,
    pub spawn: Vec2,

    // ── Entities ──
    pub player: Player,
    pub library: AnimationLibrary,
    pub physics: PhysicsConfig,
    pub player_cfg: PlayerConfig,

    // ── Game state ──
    pub phase: Phase,
    pub paused: bool,
    /// Simulation steps since the attempt started; the timer.
    pub steps: u64,
    pub fps: u32,
    pub message: String,
    pub message_timer: u32,
    pub camera: Camera,

    // ── Level select ──
    pub select_cursor: usize,
    pub level_names: Vec<String>,

    // ── Summary ──
    pub name_entry: String,
    pub score_saved: bool,
    pub leaderboard: Vec<ScoreRecord>,
}

impl WorldState {
    pub fn new(config: &GameConfig, library: AnimationLibrary) -> Self {
        let spawn = Vec2::new(config.player.start.0, config.player.start.1);
        let player = Player::new(spawn, config.player.size, &config.physics, &library);
        WorldState {
            tilemap: Tilemap::default(),
            level_name: String::new(),
            spawn,
            player,
            library,
            physics: config.physics.clone(),
            player_cfg: config.player.clone(),
            phase: Phase::LevelSelect,
            paused: false,
            steps: 0,
            fps: config.timing.fps,
            message: String::new(),
            message_timer: 0,
            camera: Camera::new(),
            select_cursor: 0,
            level_names: vec![],
            name_entry: String::new(),
            score_saved: false,
            leaderboard: vec![],
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// A fresh player at the spawn point.
    pub fn spawn_player(&mut self) {
        self.player = Player::new(self.spawn, self.player_cfg.size, &self.physics, &self.library);
    }
}
