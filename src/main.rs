/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::GameConfig;
use sim::event::GameEvent;
use sim::step;
use sim::world::Session;
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_QUIT, KEYS_RESET};
use ui::renderer::Renderer;
use ui::sprites;

const LOG_FILE: &str = "golddigger.log";

fn main() -> anyhow::Result<()> {
    init_logging();
    log::info!("Starting Gold Digger v{}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load();
    let look = sprites::resolve_look(&config);

    let mut renderer = Renderer::new(look);
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            let _ = renderer.cleanup();
            return Err(e).context("terminal init failed");
        }
    };
    log::debug!("key release events: {}", if honor_release { "reported" } else { "timeout fallback" });

    let epoch = Instant::now();
    let mut session = Session::new(
        config.grid.clone(),
        config.speed.clone(),
        StdRng::from_entropy(),
        0,
    );
    log::info!(
        "round {} started: {}x{} grid, {} gold",
        session.round, session.grid.cols(), session.grid.rows(), session.gold_total,
    );

    let result = game_loop(&mut session, &mut renderer, honor_release, &config, epoch);

    if let Err(e) = renderer.cleanup() {
        log::error!("terminal cleanup failed: {e}");
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(ref e) = result {
        log::error!("game exited with error: {e}");
    }
    result.context("game loop failed")?;

    println!();
    println!("Thanks for playing Gold Digger!");
    println!("Gold collected: {} / {}", session.score, session.gold_total);
    log::info!("shut down cleanly");
    Ok(())
}

/// Log to a file so output never lands on the game screen.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging() {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    );
    match OpenOptions::new().create(true).write(true).truncate(true).open(LOG_FILE) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    honor_release: bool,
    config: &GameConfig,
    epoch: Instant,
) -> error::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }
    let frame_sleep = Duration::from_millis(config.speed.frame_sleep_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            break;
        }

        let now_ms = epoch.elapsed().as_millis() as u64;

        let wants_reset = kb.any_pressed(KEYS_RESET) || gp.confirm_pressed();
        if wants_reset && session.try_reset(now_ms) {
            log::info!("round {} started", session.round);
        } else if !session.phase.is_terminal() {
            let held = kb.held_dirs().union(gp.held_dirs());
            let events = step::step(session, held, now_ms);
            log_events(&events, session);
        }

        renderer.render(session, now_ms)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

fn log_events(events: &[GameEvent], session: &Session) {
    for event in events {
        match event {
            GameEvent::PlayerMoved { to } => log::trace!("player -> ({}, {})", to.x, to.y),
            GameEvent::Dug { at } => log::trace!("dug ({}, {})", at.x, at.y),
            GameEvent::GoldPicked { at, score } => {
                log::debug!("gold at ({}, {}), {}/{}", at.x, at.y, score, session.gold_total);
            }
            GameEvent::EnemySpawned { id, at } => {
                log::debug!("enemy {} spawned at ({}, {}), {} alive", id, at.x, at.y, session.enemies.len());
            }
            GameEvent::AllGoldCollected => {
                log::info!("round {} won with {} gold", session.round, session.score);
            }
            GameEvent::PlayerCaught { enemy, at } => {
                log::info!(
                    "round {} lost: caught by enemy {} at ({}, {}) with {}/{} gold",
                    session.round, enemy, at.x, at.y, session.score, session.gold_total,
                );
            }
        }
    }
}
