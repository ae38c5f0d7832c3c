/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::animation::AnimationLibrary;
use domain::clock::SystemClock;
use domain::entity::FrameInput;
use sim::level::{level_names, load_level};
use sim::scores::{format_elapsed, ScoreFile, ScoreRecord, ScoreSink};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::{self, GamepadState};
use ui::input::{self as keys, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const NAME_MAX: usize = 16;

fn main() {
    // Config problems are reported on stderr; the log file isn't known yet.
    let startup = tracing_subscriber::fmt().with_writer(io::stderr).with_target(false).compact().finish();
    let config = tracing::subscriber::with_default(startup, GameConfig::load);
    init_tracing(&config);
    info!(
        levels_dir = %config.levels_dir.display(),
        fps = config.timing.fps,
        "frosthop_starting"
    );

    // A missing animation is a content bug; refuse to start.
    let library = match AnimationLibrary::builtin() {
        Ok(lib) => lib,
        Err(e) => {
            eprintln!("Animation assets are incomplete: {e}");
            std::process::exit(1);
        }
    };

    let mut world = WorldState::new(&config, library);
    world.level_names = level_names(&config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut kb = InputState::new();
    kb.honor_release = enable_release_events();
    info!(release_events = kb.honor_release, "keyboard_ready");

    let sound = SoundEngine::new();
    if sound.is_none() {
        warn!("audio output unavailable; playing silently");
    }

    let result = game_loop(&mut world, &mut renderer, &mut kb, sound.as_ref(), &config);

    if kb.honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        warn!(error = %e, "game_loop_failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Frosthop!");
}

/// Log to the configured file; the terminal belongs to the renderer.
fn init_tracing(config: &GameConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();
    match OpenOptions::new().create(true).append(true).open(&config.log_file) {
        Ok(file) => builder.with_writer(Mutex::new(file)).init(),
        Err(_) => builder.with_writer(io::sink).init(),
    }
}

/// Ask the terminal for key Release events. Without them a held key can't
/// be told apart from autorepeat, and the input layer falls back to latching.
fn enable_release_events() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let clock = SystemClock;
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_secs_f64(1.0 / f64::from(config.timing.fps));

    // Edge-triggered pause must survive until the next tick.
    let mut pending_pause = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        match world.phase {
            Phase::LevelSelect => handle_level_select(world, kb, &gp, sound, config),
            Phase::Won => handle_summary(world, kb, &gp, config),
            Phase::Playing => {
                if kb.any_pressed(keys::KEYS_BACK) || gp.cancel_pressed() {
                    back_to_select(world, kb);
                } else if kb.any_pressed(keys::KEYS_RESTART) || gp.restart_pressed() {
                    step::restart_level(world);
                    kb.reset_latch();
                    pending_pause = false;
                    info!(level = %world.level_name, "level_restarted");
                } else {
                    let input = gamepad::merge(kb.frame_input(), gp.frame_input());
                    pending_pause |= input.pause;

                    if last_tick.elapsed() >= tick_rate {
                        let input = FrameInput { pause: std::mem::take(&mut pending_pause), ..input };
                        let events = step::step(world, input, &clock);
                        if let Some(sfx) = sound {
                            for event in &events {
                                sfx.handle(event);
                            }
                        }
                        last_tick = Instant::now();
                    }
                }
            }
        }

        renderer.render(world, Instant::now())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn handle_level_select(
    world: &mut WorldState,
    kb: &mut InputState,
    gp: &GamepadState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) {
    let count = world.level_names.len().max(1);
    if kb.any_pressed(keys::KEYS_UP) || gp.up_pressed() {
        world.select_cursor = (world.select_cursor + count - 1) % count;
        if let Some(sfx) = sound { sfx.play_select(); }
    } else if kb.any_pressed(keys::KEYS_DOWN) || gp.down_pressed() {
        world.select_cursor = (world.select_cursor + 1) % count;
        if let Some(sfx) = sound { sfx.play_select(); }
    } else if kb.any_pressed(keys::KEYS_CONFIRM) || gp.confirm_pressed() {
        let idx = world.select_cursor;
        match load_level(world, idx, config) {
            Ok(()) => kb.reset_latch(),
            Err(e) => {
                warn!(level = idx, error = %e, "level_load_failed");
                world.set_message(&e.to_string(), 0);
            }
        }
    }
}

/// Name entry, then the leaderboard. Either screen returns to level select.
fn handle_summary(world: &mut WorldState, kb: &mut InputState, gp: &GamepadState, config: &GameConfig) {
    let confirm = kb.any_pressed(keys::KEYS_CONFIRM) || gp.confirm_pressed();
    let back = kb.any_pressed(keys::KEYS_BACK) || gp.cancel_pressed();

    if world.score_saved {
        if confirm || back {
            back_to_select(world, kb);
        }
        return;
    }

    if back {
        back_to_select(world, kb);
        return;
    }
    for _ in 0..kb.backspace_count() {
        world.name_entry.pop();
    }
    for ch in kb.typed_chars() {
        if world.name_entry.chars().count() < NAME_MAX {
            world.name_entry.push(ch);
        }
    }
    if confirm {
        record_score(world, config);
    }
}

fn record_score(world: &mut WorldState, config: &GameConfig) {
    let name = world.name_entry.trim();
    let record = ScoreRecord {
        user_name: if name.is_empty() { "anonymous".to_string() } else { name.to_string() },
        time: format_elapsed(world.steps, world.fps),
        total_jumps: world.player.total_jumps,
        level: world.level_name.clone(),
    };
    let mut file = ScoreFile::new(&config.scores_file);
    let result = file.append(&record).and_then(|()| file.read_all());
    match result {
        Ok(rows) => world.leaderboard = rows,
        Err(e) => {
            warn!(error = %e, "score_save_failed");
            world.set_message(&e.to_string(), 0);
        }
    }
    world.score_saved = true;
}

fn back_to_select(world: &mut WorldState, kb: &mut InputState) {
    world.phase = Phase::LevelSelect;
    world.paused = false;
    world.message.clear();
    world.message_timer = 0;
    kb.reset_latch();
}
