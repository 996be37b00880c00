//! Browser host
//!
//! Exposes the game to JavaScript. The page owns rendering and input; it
//! calls `advance` once per animation frame and reads `snapshot_json`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::audio::{AudioService, SoundEffect, WebAudioSink};
use crate::progress::Progress;
use crate::settings::Settings;
use crate::sim::{BodySnapshot, Discovery, Game, GameEvent, ItemKind};
use crate::storage::{KeyValueStore, LocalStore, MemoryStore};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Transit Merge starting...");
}

/// Frame view handed to the renderer
#[derive(Serialize)]
struct FrameView<'a> {
    bodies: Vec<BodySnapshot>,
    score: u64,
    high_score: u64,
    next_item: Option<ItemKind>,
    game_over: bool,
    warning_line_y: f32,
    pending_discovery: Option<Discovery>,
    events: &'a [GameEvent],
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    store: Box<dyn KeyValueStore>,
    audio: AudioService<WebAudioSink>,
    /// Events from the last `advance`/input call, for the renderer
    last_events: Vec<GameEvent>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WebGame {
        let store: Box<dyn KeyValueStore> = match LocalStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{} - progress will not be saved", e);
                Box::new(MemoryStore::new())
            }
        };
        let progress = Progress::load(store.as_ref());
        let settings = Settings::load(store.as_ref());

        let mut audio = AudioService::new(WebAudioSink::new(), settings);
        audio.set_game_active(true);

        WebGame {
            game: Game::new(Tuning::default(), seed, &progress),
            store,
            audio,
            last_events: Vec::new(),
        }
    }

    /// Game seeded from the page clock
    pub fn from_clock() -> WebGame {
        WebGame::new(js_sys::Date::now() as u64)
    }

    /// Drop the next item at `x`; false when the drop was rejected
    pub fn drop_item(&mut self, x: f32) -> bool {
        let dropped = self.game.drop_item(x).is_some();
        let events = self.game.take_events();
        self.dispatch(events);
        dropped
    }

    /// Advance by a frame's elapsed milliseconds
    pub fn advance(&mut self, elapsed_ms: f64) {
        let events = self.game.advance((elapsed_ms / 1000.0) as f32);
        self.dispatch(events);
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        let view = FrameView {
            bodies: self.game.snapshot(),
            score: self.game.score(),
            high_score: self.game.high_score(),
            next_item: self.game.next_item(),
            game_over: self.game.is_game_over(),
            warning_line_y: self.game.warning_line_y(),
            pending_discovery: self.game.pending_discovery(),
            events: &self.last_events,
        };
        serde_json::to_string(&view).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn preview_x(&self, x: f32) -> f32 {
        self.game.preview_x(x)
    }

    pub fn restart(&mut self) {
        self.game.restart();
        let events = self.game.take_events();
        self.dispatch(events);
    }

    /// Pause or resume (modals, hidden tab)
    pub fn set_active(&mut self, active: bool) {
        self.game.set_active(active);
        self.audio.set_game_active(self.game.is_simulating());
    }

    pub fn dismiss_discovery(&mut self) {
        self.game.dismiss_discovery();
        let events = self.game.take_events();
        self.dispatch(events);
    }

    pub fn score(&self) -> f64 {
        self.game.score() as f64
    }

    pub fn high_score(&self) -> f64 {
        self.game.high_score() as f64
    }

    /// Level of the queued item, or -1 when none
    pub fn next_item(&self) -> i32 {
        self.game.next_item().map_or(-1, |k| i32::from(k.level()))
    }

    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    /// Catalog with this player's discoveries, for the encyclopedia
    pub fn catalog_json(&self) -> Result<String, JsValue> {
        let book = self.game.progress().encyclopedia();
        serde_json::to_string(&book).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn toggle_sfx(&mut self) -> bool {
        let on = self.audio.toggle_sfx();
        self.save_settings();
        on
    }

    pub fn toggle_bgm(&mut self) -> bool {
        let on = self.audio.toggle_bgm();
        self.save_settings();
        on
    }

    pub fn play_click(&mut self) {
        self.audio.play(SoundEffect::ButtonClick);
    }

    pub fn play_encyclopedia_select(&mut self) {
        self.audio.play(SoundEffect::EncyclopediaSelect);
    }
}

impl WebGame {
    fn dispatch(&mut self, events: Vec<GameEvent>) {
        self.audio.handle_events(&events);
        self.audio.set_game_active(self.game.is_simulating());

        if events.iter().any(Progress::affected_by) {
            if let Err(e) = self.game.progress().save(self.store.as_mut()) {
                log::warn!("Failed to save progress: {}", e);
            }
        }
        self.last_events = events;
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.audio.settings().save(self.store.as_mut()) {
            log::warn!("Failed to save settings: {}", e);
        }
    }
}
