//! Gravity Dash entry point
//!
//! The browser build starts from `platform::web`. Natively this runs a
//! headless session against the stand-in physics world as a smoke test.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gravity_dash::Settings;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Gravity Dash (native) starting...");

    // Optional settings file as the first argument
    let json = std::env::args().nth(1).and_then(|path| {
        std::fs::read_to_string(&path)
            .map_err(|err| log::warn!("Could not read {}: {}", path, err))
            .ok()
    });
    let settings = Settings::load_or_default(json.as_deref());

    let seed = gravity_dash::platform::entropy_seed();
    run_headless(seed, &settings);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}

/// Hold forward until the run ends or the frame budget runs out
#[cfg(not(target_arch = "wasm32"))]
fn run_headless(seed: u64, settings: &gravity_dash::Settings) {
    use gravity_dash::render::RenderSnapshot;
    use gravity_dash::sim::{Controls, GameEvent, GameState, HeadlessWorld, TickInput, tick};

    const DT: f32 = 1.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 60;

    let mut state = GameState::new(seed, settings);
    let mut world = HeadlessWorld::new();
    world.set_course(state.plan.bounds());

    state.store.subscribe_phase(|from, to| {
        println!("phase: {} -> {}", from.as_str(), to.as_str());
    });

    let kinds: Vec<&str> = state
        .plan
        .obstacle_kinds()
        .iter()
        .map(|k| k.as_str())
        .collect();
    log::info!("Course (seed {}): {}", state.plan.seed(), kinds.join(", "));

    let controls = Controls {
        forward: true,
        ..Controls::default()
    };
    let mut now_ms = 0.0;
    for frame in 0..MAX_FRAMES {
        let input = TickInput {
            controls,
            now_ms,
            ..TickInput::default()
        };
        let events = tick(&mut state, &input, DT, &mut world);
        world.step(DT);
        now_ms += f64::from(DT) * 1000.0;

        let mut done = false;
        for event in events {
            match event {
                GameEvent::CourseRebuilt { .. } => world.set_course(state.plan.bounds()),
                GameEvent::Finished { elapsed_ms } => {
                    println!(
                        "finished in {}s after {} frames",
                        gravity_dash::format_elapsed(elapsed_ms),
                        frame + 1
                    );
                    done = true;
                }
                other => log::debug!("{:?}", other),
            }
        }
        if done {
            break;
        }
    }

    let snapshot = RenderSnapshot::capture(&state, now_ms);
    println!(
        "final phase: {}, health {}, {} obstacle parts",
        state.phase().as_str(),
        state.store.health(),
        snapshot.parts.len()
    );
}
