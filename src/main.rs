/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::world::{SelectInput, WorldState};
use ui::atlas::{required_images, SpriteAtlas};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_BACK, KEYS_CONFIRM, KEYS_JUMP, KEYS_LEFT, KEYS_PAUSE, KEYS_RIGHT};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// A stalled frame (suspend, resize) advances the clock by at most this much.
const MAX_DT: f32 = 0.25;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let atlas = SpriteAtlas::builtin();
    if let Err(e) = atlas.preload(required_images()) {
        log::error!("{e}");
        eprintln!("Asset error: {e}");
        std::process::exit(1);
    }

    let seed = config.seed.unwrap_or_else(clock_seed);
    log::info!("base seed {seed}");
    let mut world = WorldState::new(config.session.clone(), seed);

    let mut renderer = Renderer::new(atlas);
    let mut kb = InputState::new();
    match renderer.init() {
        Ok(enhanced) => kb.honor_release = enhanced,
        Err(e) => {
            let _ = renderer.cleanup();
            eprintln!("Terminal init failed: {e}");
            return;
        }
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, &mut kb, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }

    println!();
    println!("Thanks for playing Avatar Catch!");
    if world.sessions_played > 0 {
        println!("Best Score: {}", world.best_score);
    }
}

/// Logging goes to `general.log_file` when configured, otherwise to stderr
/// only if RUST_LOG is set. The terminal is in raw mode while playing, so
/// nothing is logged to it by default.
fn init_logging(config: &GameConfig) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);

    match &config.log_file {
        Some(path) => match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Warning: could not open log file {}: {e}", path.display());
                return;
            }
        },
        None if std::env::var_os("RUST_LOG").is_some() => {
            builder.target(env_logger::Target::Stderr);
        }
        None => return,
    }

    if let Err(e) = builder.try_init() {
        eprintln!("Warning: logger already initialized: {e}");
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gp = GamepadState::new(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut pending_jump = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        if world.is_playing() {
            if handle_playing_keys(world, kb, &gp) {
                pending_jump = false;
            } else if !world.paused && (kb.any_pressed(KEYS_JUMP) || gp.jump_pressed()) {
                pending_jump = true;
            }
        } else if handle_selection_keys(world, sound, kb, &gp) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            let dt = last_tick.elapsed().as_secs_f32().min(MAX_DT);
            last_tick = Instant::now();

            if world.is_playing() && !world.paused {
                let input = FrameInput {
                    horizontal: kb.horizontal().or_else(|| gp.horizontal()),
                    jump: std::mem::take(&mut pending_jump),
                };
                let events = world.tick(dt, input);
                process_events(sound, &events);
            }
            world.tick_message();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Selection screen keys. Returns true to quit the program.
fn handle_selection_keys(
    world: &mut WorldState,
    sound: Option<&SoundEngine>,
    kb: &InputState,
    gp: &GamepadState,
) -> bool {
    if kb.any_pressed(KEYS_BACK) || gp.cancel_pressed() {
        return true;
    }

    let input = if kb.any_pressed(KEYS_LEFT) || gp.left_pressed() {
        SelectInput::Previous
    } else if kb.any_pressed(KEYS_RIGHT) || gp.right_pressed() {
        SelectInput::Next
    } else if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
        SelectInput::Confirm
    } else {
        return false;
    };

    let events = world.select(input);
    if events.is_empty() {
        if let Some(sfx) = sound { sfx.play_select(); }
    }
    process_events(sound, &events);
    false
}

/// Pause and back keys while playing. Returns true if the session ended.
fn handle_playing_keys(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> bool {
    if kb.any_pressed(KEYS_BACK) || gp.cancel_pressed() {
        world.quit_session();
        return true;
    }
    if kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
        world.toggle_pause();
    }
    false
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for ev in events {
        match ev {
            GameEvent::SessionStarted { avatar } => log::trace!("event: start {avatar}"),
            GameEvent::Jumped => log::trace!("event: jump"),
            GameEvent::ObjectSpawned { id, x } => log::trace!("event: spawn #{id} x={x:.1}"),
            GameEvent::ObjectCaught { id, score } => log::trace!("event: catch #{id} -> {score}"),
            GameEvent::ObjectMissed { id } => log::trace!("event: miss #{id}"),
            GameEvent::TimeUp { score } => log::trace!("event: time up at {score}"),
            GameEvent::SessionEnded { score } => log::trace!("event: end at {score}"),
        }
    }

    let Some(sfx) = sound else { return };
    for ev in events {
        match ev {
            GameEvent::SessionStarted { .. } => sfx.play_start(),
            GameEvent::Jumped => sfx.play_jump(),
            GameEvent::ObjectCaught { .. } => sfx.play_catch(),
            GameEvent::TimeUp { .. } => sfx.play_time_up(),
            GameEvent::ObjectSpawned { .. }
            | GameEvent::ObjectMissed { .. }
            | GameEvent::SessionEnded { .. } => {}
        }
    }
}
