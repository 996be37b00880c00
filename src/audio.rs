//! Sound service
//!
//! Game events map to short procedural effects. The output device sits behind
//! `SoundSink` so the browser build plays through WebAudio while native runs
//! and tests use silent or recording sinks.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Item released from the dropper
    Drop,
    /// Two items combined
    Merge,
    /// Run ended
    GameOver,
    /// First merge into a new kind
    NewDiscovery,
    /// UI button press
    ButtonClick,
    /// Entry picked in the encyclopedia view
    EncyclopediaSelect,
}

impl SoundEffect {
    /// Effect for a game event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Dropped { .. } => Some(SoundEffect::Drop),
            GameEvent::Merged(_) => Some(SoundEffect::Merge),
            GameEvent::Discovered(_) => Some(SoundEffect::NewDiscovery),
            GameEvent::GameOver(_) => Some(SoundEffect::GameOver),
            GameEvent::NextItem(_) | GameEvent::Restarted => None,
        }
    }
}

/// Output device
pub trait SoundSink {
    fn play_effect(&mut self, effect: SoundEffect, volume: f32);
    /// Start or stop the background loop
    fn set_music(&mut self, playing: bool, volume: f32);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl SoundSink for NullSink {
    fn play_effect(&mut self, _effect: SoundEffect, _volume: f32) {}
    fn set_music(&mut self, _playing: bool, _volume: f32) {}
}

/// Remembers what was played
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub effects: Vec<SoundEffect>,
    pub music_playing: bool,
    pub music_changes: u32,
}

impl SoundSink for RecordingSink {
    fn play_effect(&mut self, effect: SoundEffect, _volume: f32) {
        self.effects.push(effect);
    }

    fn set_music(&mut self, playing: bool, _volume: f32) {
        self.music_playing = playing;
        self.music_changes += 1;
    }
}

/// Routes game events to a sink according to the player's settings
pub struct AudioService<S: SoundSink> {
    sink: S,
    settings: Settings,
    game_active: bool,
    music_playing: bool,
}

impl<S: SoundSink> AudioService<S> {
    pub fn new(sink: S, settings: Settings) -> Self {
        Self {
            sink,
            settings,
            game_active: false,
            music_playing: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    /// Play an effect unless effects are muted
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.settings.effective_sfx_volume();
        if vol <= 0.0 {
            return;
        }
        self.sink.play_effect(effect, vol);
    }

    pub fn handle_event(&mut self, event: &GameEvent) {
        if let Some(effect) = SoundEffect::for_event(event) {
            self.play(effect);
        }
    }

    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            self.handle_event(event);
        }
    }

    /// Music follows the physics loop: it plays only while the game runs
    pub fn set_game_active(&mut self, active: bool) {
        self.game_active = active;
        self.sync_music();
    }

    pub fn toggle_sfx(&mut self) -> bool {
        let on = self.settings.toggle_sfx();
        log::info!("Sound effects {}", if on { "on" } else { "off" });
        on
    }

    pub fn toggle_bgm(&mut self) -> bool {
        let on = self.settings.toggle_bgm();
        log::info!("Music {}", if on { "on" } else { "off" });
        self.sync_music();
        on
    }

    fn sync_music(&mut self) {
        let want = self.settings.bgm_enabled && self.game_active;
        if want != self.music_playing {
            self.music_playing = want;
            self.sink.set_music(want, self.settings.music_volume);
        }
    }
}

/// WebAudio output using procedurally generated tones
#[cfg(target_arch = "wasm32")]
pub use web_audio::WebAudioSink;

#[cfg(target_arch = "wasm32")]
mod web_audio {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundEffect, SoundSink};

    pub struct WebAudioSink {
        ctx: Option<AudioContext>,
        music: Vec<(OscillatorNode, GainNode)>,
    }

    impl Default for WebAudioSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudioSink {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                music: Vec::new(),
            }
        }

        fn create_osc(ctx: &AudioContext, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single enveloped tone starting `delay` seconds from now
        fn tone(ctx: &AudioContext, freq: f32, osc_type: OscillatorType, vol: f32, delay: f64, len: f64) {
            let Some((osc, gain)) = Self::create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + delay;
            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + len).ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + len + 0.05).ok();
        }

        fn play_drop(ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = Self::create_osc(ctx, 220.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.12).ok();
            osc.frequency().set_value_at_time(220.0, t).ok();
            osc.frequency().exponential_ramp_to_value_at_time(110.0, t + 0.12).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        fn play_merge(ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = Self::create_osc(ctx, 400.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(vol * 0.35, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.2).ok();
            osc.frequency().set_value_at_time(400.0, t).ok();
            osc.frequency().exponential_ramp_to_value_at_time(800.0, t + 0.1).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.25).ok();
        }
    }

    impl SoundSink for WebAudioSink {
        fn play_effect(&mut self, effect: SoundEffect, vol: f32) {
            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Drop => Self::play_drop(ctx, vol),
                SoundEffect::Merge => Self::play_merge(ctx, vol),
                SoundEffect::GameOver => {
                    for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
                        Self::tone(ctx, *freq, OscillatorType::Sine, vol * 0.3, i as f64 * 0.2, 0.3);
                    }
                }
                SoundEffect::NewDiscovery => {
                    for (i, freq) in [500.0, 600.0, 700.0, 800.0, 1000.0].iter().enumerate() {
                        Self::tone(ctx, *freq, OscillatorType::Triangle, vol * 0.25, i as f64 * 0.08, 0.25);
                    }
                }
                SoundEffect::ButtonClick => Self::tone(ctx, 600.0, OscillatorType::Square, vol * 0.15, 0.0, 0.05),
                SoundEffect::EncyclopediaSelect => {
                    for (i, freq) in [600.0, 900.0].iter().enumerate() {
                        Self::tone(ctx, *freq, OscillatorType::Sine, vol * 0.2, i as f64 * 0.06, 0.12);
                    }
                }
            }
        }

        fn set_music(&mut self, playing: bool, vol: f32) {
            for (osc, _) in self.music.drain(..) {
                osc.stop().ok();
            }
            if !playing {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Soft sustained chord
            for freq in [130.81, 164.81, 196.0] {
                if let Some((osc, gain)) = Self::create_osc(ctx, freq, OscillatorType::Sine) {
                    gain.gain().set_value(vol * 0.08);
                    osc.start().ok();
                    self.music.push((osc, gain));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::GameOverEvent;
    use crate::sim::{BodyId, ItemKind};

    fn dropped() -> GameEvent {
        GameEvent::Dropped {
            body: BodyId(1),
            kind: ItemKind::Bicycle,
            x: 100.0,
        }
    }

    #[test]
    fn test_events_map_to_effects() {
        let mut audio = AudioService::new(RecordingSink::default(), Settings::default());
        audio.handle_events(&[
            dropped(),
            GameEvent::NextItem(ItemKind::Motorcycle),
            GameEvent::GameOver(GameOverEvent {
                final_score: 0,
                high_score: 0,
                new_record: false,
            }),
        ]);
        assert_eq!(audio.sink().effects, vec![SoundEffect::Drop, SoundEffect::GameOver]);
    }

    #[test]
    fn test_muted_effects_are_skipped() {
        let mut audio = AudioService::new(RecordingSink::default(), Settings::default());
        assert!(!audio.toggle_sfx());
        audio.handle_event(&dropped());
        audio.play(SoundEffect::ButtonClick);
        assert!(audio.sink().effects.is_empty());
    }

    #[test]
    fn test_music_follows_activity_and_toggle() {
        let mut audio = AudioService::new(RecordingSink::default(), Settings::default());
        assert!(!audio.is_music_playing());

        audio.set_game_active(true);
        assert!(audio.sink().music_playing);

        audio.toggle_bgm();
        assert!(!audio.sink().music_playing);
        // Still disabled, activity changes do nothing
        audio.set_game_active(false);
        audio.set_game_active(true);
        assert_eq!(audio.sink().music_changes, 2);

        audio.toggle_bgm();
        assert!(audio.is_music_playing());
        audio.set_game_active(false);
        assert!(!audio.sink().music_playing);
    }
}
