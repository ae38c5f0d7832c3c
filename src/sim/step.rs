/// The step function: advances the world by one fixed tick.
///
/// Processing order:
///   1. Pause toggle (a paused world only renders)
///   2. Phase gate (only `Playing` simulates)
///   3. Player step: input → charge → integrate → reactions → pose
///   4. Timer, camera
///   5. Events; a win ends the attempt
///
/// Wall-clock time enters only through the `TimeSource`, which times the
/// jump charge.

use tracing::info;

use crate::domain::clock::TimeSource;
use crate::domain::entity::FrameInput;
use crate::domain::player::StepOutcome;
use super::event::GameEvent;
use super::scores::format_elapsed;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, clock: &dyn TimeSource) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    if input.pause && world.phase == Phase::Playing {
        world.paused = !world.paused;
        if world.paused {
            world.player.suspend();
        }
        events.push(if world.paused { GameEvent::Paused } else { GameEvent::Resumed });
    }
    if world.paused || world.phase != Phase::Playing {
        return events;
    }

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    let outcome = world.player.step(input, &world.tilemap, clock.now(), &world.library);
    world.steps += 1;

    let center = world.player.body.rect().center();
    world.camera.follow(center, world.tilemap.tile_size());

    collect_events(&outcome, &mut events);
    if outcome.won {
        resolve_win(world);
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn collect_events(outcome: &StepOutcome, events: &mut Vec<GameEvent>) {
    if let Some(power) = outcome.jumped {
        events.push(GameEvent::Jumped { power });
    }
    if let Some(surface) = outcome.landed {
        events.push(GameEvent::Landed { surface });
    }
    if outcome.wall_bounce {
        events.push(GameEvent::WallBounce);
    }
    if let Some(index) = outcome.footstep {
        events.push(GameEvent::Footstep { index });
    }
    if outcome.won {
        events.push(GameEvent::Won);
    }
}

fn resolve_win(world: &mut WorldState) {
    world.phase = Phase::Won;
    world.name_entry.clear();
    world.score_saved = false;
    info!(
        level = %world.level_name,
        time = %format_elapsed(world.steps, world.fps),
        jumps = world.player.total_jumps,
        "level_cleared"
    );
}

/// Start the current level over: fresh player at the spawn, timer zeroed.
pub fn restart_level(world: &mut WorldState) {
    world.spawn_player();
    world.steps = 0;
    world.paused = false;
    world.phase = Phase::Playing;
    world.message.clear();
    world.message_timer = 0;

    // Re-center camera on player
    let center = world.player.body.rect().center();
    world.camera.center_on(center, world.tilemap.tile_size());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::animation::AnimationLibrary;
    use crate::domain::clock::ManualClock;
    use crate::sim::level::{parse_ascii, spawn_point};

    /// World whose player stands on the floor of the given diagram.
    fn world_from(rows: &[&str]) -> WorldState {
        let config = GameConfig::default();
        let mut world = WorldState::new(&config, AnimationLibrary::builtin().unwrap());
        let (map, spawn) = parse_ascii(rows, 16);
        world.spawn = spawn_point(spawn.unwrap(), map.tile_size(), config.player.size);
        world.tilemap = map;
        restart_level(&mut world);
        world
    }

    fn pause() -> FrameInput {
        FrameInput { pause: true, ..Default::default() }
    }

    const ROOM: &[&str] = &[
        "          ",
        "          ",
        "    P     ",
        "          ",
        "==========",
    ];

    #[test]
    fn pause_freezes_simulation() {
        let clock = ManualClock::new();
        let mut w = world_from(ROOM);
        step(&mut w, FrameInput::default(), &clock);
        let events = step(&mut w, pause(), &clock);
        assert_eq!(events, vec![GameEvent::Paused]);

        let (pos, steps) = (w.player.position(), w.steps);
        for _ in 0..30 {
            let input = FrameInput { right: true, ..Default::default() };
            assert!(step(&mut w, input, &clock).is_empty());
        }
        assert_eq!(w.player.position(), pos);
        assert_eq!(w.steps, steps);

        assert_eq!(step(&mut w, pause(), &clock), vec![GameEvent::Resumed]);
        assert!(!w.paused);
    }

    #[test]
    fn charge_does_not_survive_a_pause() {
        let clock = ManualClock::new();
        let mut w = world_from(ROOM);
        for _ in 0..60 {
            step(&mut w, FrameInput::default(), &clock);
        }
        let jump = FrameInput { jump: true, ..Default::default() };
        step(&mut w, jump, &clock);
        clock.advance(std::time::Duration::from_millis(100));
        step(&mut w, FrameInput { pause: true, ..jump }, &clock);
        assert!(w.paused);

        clock.advance(std::time::Duration::from_secs(5));
        let events = step(&mut w, FrameInput { pause: true, ..jump }, &clock);
        assert_eq!(events, vec![GameEvent::Resumed]);
        assert_eq!(w.player.total_jumps, 0);
        assert!(w.player.is_charging());
    }

    #[test]
    fn timer_counts_playing_steps() {
        let clock = ManualClock::new();
        let mut w = world_from(ROOM);
        for _ in 0..90 {
            step(&mut w, FrameInput::default(), &clock);
        }
        assert_eq!(w.steps, 90);
    }

    #[test]
    fn reaching_win_tiles_ends_the_attempt() {
        let clock = ManualClock::new();
        let mut w = world_from(&[
            "          ",
            "  P       ",
            "          ",
            "WWWWWWWWWW",
        ]);
        let mut won = false;
        for _ in 0..120 {
            if step(&mut w, FrameInput::default(), &clock).contains(&GameEvent::Won) {
                won = true;
                break;
            }
        }
        assert!(won);
        assert_eq!(w.phase, Phase::Won);

        let steps = w.steps;
        let input = FrameInput { right: true, ..Default::default() };
        assert!(step(&mut w, input, &clock).is_empty());
        assert_eq!(w.steps, steps);
    }

    #[test]
    fn jump_emits_event_and_restart_resets() {
        let clock = ManualClock::new();
        let mut w = world_from(ROOM);
        for _ in 0..60 {
            step(&mut w, FrameInput::default(), &clock);
        }
        step(&mut w, FrameInput { jump: true, ..Default::default() }, &clock);
        clock.advance(std::time::Duration::from_millis(500));
        let events = step(&mut w, FrameInput::default(), &clock);
        assert!(matches!(events[0], GameEvent::Jumped { power } if (power - 0.5).abs() < 1e-9));
        assert_eq!(w.player.total_jumps, 1);

        restart_level(&mut w);
        assert_eq!(w.steps, 0);
        assert_eq!(w.player.total_jumps, 0);
        assert_eq!(w.player.position(), w.spawn);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn level_select_does_not_simulate() {
        let clock = ManualClock::new();
        let mut w = world_from(ROOM);
        w.phase = Phase::LevelSelect;
        assert!(step(&mut w, pause(), &clock).is_empty());
        assert!(!w.paused);
        assert_eq!(w.steps, 0);
    }
}
