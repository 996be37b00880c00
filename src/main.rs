//! Transit Merge - native entry point
//!
//! Runs a headless autoplay session at a fixed frame rate and persists the
//! resulting progress. The browser build enters through `web::wasm_start`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::Parser;

    use transit_merge::audio::{AudioService, NullSink};
    use transit_merge::autoplay::AutoPlayer;
    use transit_merge::sim::{Game, GameEvent};
    use transit_merge::storage::{FileStore, KeyValueStore};
    use transit_merge::{Progress, Settings, Tuning};

    const FRAME_DT: f32 = 1.0 / 60.0;

    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// RNG seed for the run
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Simulated seconds to play before stopping
        #[arg(long, default_value_t = 120.0)]
        seconds: f32,

        /// Tuning JSON overriding the default balance
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Directory holding saved progress and settings
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Ignore saved progress for this run
        #[arg(long)]
        fresh: bool,
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::init();
        let args = Args::parse();

        let tuning = match &args.tuning {
            Some(path) => Tuning::load(path).with_context(|| format!("loading tuning from {}", path.display()))?,
            None => Tuning::default(),
        };

        let mut store = FileStore::open(&args.data_dir)
            .with_context(|| format!("opening data directory {}", args.data_dir.display()))?;
        let progress = if args.fresh {
            log::info!("--fresh flag detected, starting from default progress");
            Progress::default()
        } else {
            Progress::load(&store)
        };
        let mut audio = AudioService::new(NullSink, Settings::load(&store));

        log::info!("Transit Merge (native) starting with seed {}", args.seed);

        let mut game = Game::new(tuning, args.seed, &progress);
        let mut player = AutoPlayer::new(args.seed);
        audio.set_game_active(true);

        let frames = (args.seconds / FRAME_DT).ceil() as u64;
        for _ in 0..frames {
            player.update(&mut game);
            let mut events = game.take_events();
            events.extend(game.advance(FRAME_DT));
            audio.handle_events(&events);
            audio.set_game_active(game.is_simulating());

            for event in &events {
                log_event(event);
            }
            if events.iter().any(Progress::affected_by) {
                save_progress(&game, &mut store);
            }
            if game.is_game_over() {
                break;
            }
        }
        save_progress(&game, &mut store);

        let session = game.session();
        println!("seed:        {}", args.seed);
        println!("time:        {:.1}s", game.time_ticks() as f32 * transit_merge::consts::SIM_DT);
        println!("drops:       {}", session.drops);
        println!("merges:      {}", session.merges);
        println!("score:       {}", session.score);
        println!("high score:  {}", session.high_score);
        println!("unlocked:    {:?}", session.unlocked);
        println!("game over:   {}", session.game_over);
        Ok(())
    }

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::Merged(merge) => {
                log::debug!("Merged into {:?} (+{})", merge.new_kind, merge.score_awarded)
            }
            GameEvent::Discovered(d) => log::info!("New discovery: {}", d.kind.info().name),
            GameEvent::GameOver(over) => log::info!("Final score {}", over.final_score),
            _ => {}
        }
    }

    fn save_progress(game: &Game, store: &mut dyn KeyValueStore) {
        if let Err(e) = game.progress().save(store) {
            log::warn!("Failed to save progress: {}", e);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::wasm_start, this is just to satisfy the compiler
}
