//! Session flow
//!
//! Lobby -> Instructions -> Playing -> Results, with the chosen theme,
//! language and settings carried in an explicit [`SessionContext`]. The
//! session also owns the orientation sampler, whose permission outlives any
//! single round.

use futures_channel::mpsc::UnboundedReceiver;
use glam::Vec2;
use rand::Rng;

use crate::catalog::{Catalog, Theme};
use crate::error::Result;
use crate::score::{Tally, tally};
use crate::settings::{InputMode, Settings};
use crate::sim::{
    Language, OrientationSample, OrientationSampler, Permission, PermissionGate, PointerInput,
    RoundController, RoundEvent, ScoreEntry, SensorReading, TickInput, tick,
};

/// Everything a round needs to know about the player's choices
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub theme: Theme,
    pub language: Language,
    pub settings: Settings,
}

/// Which screen the session is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Lobby,
    Instructions,
    Playing,
    Results,
}

pub struct Session {
    catalog: Catalog,
    settings: Settings,
    screen: Screen,
    context: Option<SessionContext>,
    round: Option<RoundController>,
    last_scores: Vec<ScoreEntry>,
    sampler: OrientationSampler,
    sensor_rx: UnboundedReceiver<SensorReading>,
    /// Inputs waiting for the next `advance`
    input: TickInput,
    events: Vec<RoundEvent>,
}

impl Session {
    pub fn new(catalog: Catalog, settings: Settings) -> Self {
        let (sampler, sensor_rx) = OrientationSampler::new(settings.tilt);
        Self {
            catalog,
            settings,
            screen: Screen::Lobby,
            context: None,
            round: None,
            last_scores: Vec::new(),
            sampler,
            sensor_rx,
            input: TickInput::default(),
            events: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    pub fn round(&self) -> Option<&RoundController> {
        self.round.as_ref()
    }

    pub fn sampler(&self) -> &OrientationSampler {
        &self.sampler
    }

    pub fn permission(&self) -> Permission {
        self.sampler.permission()
    }

    /// Scores of the last finished round
    pub fn last_scores(&self) -> &[ScoreEntry] {
        &self.last_scores
    }

    pub fn last_tally(&self) -> Tally {
        tally(&self.last_scores)
    }

    /// Take queued presentation events
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        self.collect_round_events();
        std::mem::take(&mut self.events)
    }

    pub fn request_permission<G: PermissionGate + ?Sized>(
        &mut self,
        gate: &mut G,
        now_ms: u64,
    ) -> Permission {
        self.sampler.request_permission(gate, now_ms)
    }

    /// Record the answer of an asynchronous consent prompt
    pub fn resolve_permission(&mut self, result: Permission, now_ms: u64) {
        self.sampler.resolve_permission(result, now_ms);
    }

    /// Fails when motion was granted but the sensor never reported
    pub fn check_sensor(&self, now_ms: u64) -> Result<()> {
        self.sampler.check_alive(now_ms, self.settings.sensor_timeout_ms)
    }

    /// Also switches a round in progress, so a dead sensor can fall back to swipe
    pub fn set_input_mode(&mut self, mode: InputMode) {
        log::info!("Input mode: {}", mode.as_str());
        self.settings.input_mode = mode;
        if let Some(ctx) = self.context.as_mut() {
            ctx.settings.input_mode = mode;
        }
        if let Some(round) = self.round.as_mut() {
            round.set_input_mode(mode);
            self.input.clear();
        }
    }

    /// Lobby -> Instructions
    pub fn select_theme(&mut self, theme_id: &str, language: Language) -> Result<()> {
        let theme = self.catalog.get(theme_id)?.clone();
        log::info!("Selected theme {} ({})", theme.id, language.code());
        self.context = Some(SessionContext {
            theme,
            language,
            settings: self.settings.clone(),
        });
        self.last_scores.clear();
        self.screen = Screen::Instructions;
        Ok(())
    }

    /// Instructions -> Playing with a fresh deck and countdown
    pub fn start_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.screen != Screen::Instructions {
            log::warn!("start_round ignored on {:?}", self.screen);
            return Ok(());
        }
        let Some(ctx) = self.context.as_ref() else {
            return Ok(());
        };
        if ctx.settings.input_mode == InputMode::Tilt {
            self.sampler.ensure_granted()?;
        }

        let round = RoundController::new(ctx, rng)?;
        // Readings from before the round must not reach it
        self.discard_input();
        self.round = Some(round);
        self.screen = Screen::Playing;
        Ok(())
    }

    /// Feed a raw orientation sample to the sampler; the round sees it on the next `advance`
    pub fn on_orientation(&mut self, sample: OrientationSample) {
        if self.sampler.on_sample(sample).is_some() && self.round.is_none() {
            // No round to receive them
            self.discard_input();
        }
    }

    pub fn on_press(&mut self, pos: Vec2) {
        self.queue_pointer(PointerInput::Press(pos));
    }

    pub fn on_drag(&mut self, pos: Vec2) {
        self.queue_pointer(PointerInput::Drag(pos));
    }

    pub fn on_release(&mut self) {
        self.queue_pointer(PointerInput::Release);
    }

    /// Apply queued input to the live round, then move its clock; returns the
    /// tally when it finishes
    pub fn advance(&mut self, dt_ms: u64) -> Option<Tally> {
        let round = self.round.as_mut()?;
        self.input.collect_sensor(&mut self.sensor_rx);
        tick(round, &self.input, dt_ms);
        self.input.clear();
        if round.is_finished() {
            return self.finish_round();
        }
        None
    }

    /// Playing -> Results once the round is over
    pub fn finish_round(&mut self) -> Option<Tally> {
        if !self.round.as_ref().is_some_and(RoundController::is_finished) {
            return None;
        }
        self.collect_round_events();
        let round = self.round.take()?;
        self.last_scores = round.into_scores();
        self.screen = Screen::Results;
        Some(self.last_tally())
    }

    /// Results -> Instructions for the same theme
    pub fn replay(&mut self) {
        if self.context.is_none() {
            return;
        }
        self.round = None;
        self.discard_input();
        self.last_scores.clear();
        self.screen = Screen::Instructions;
    }

    /// Back to the lobby, tearing down any round in progress
    pub fn go_home(&mut self) {
        if self.round.take().is_some() {
            log::info!("Round abandoned");
        }
        self.discard_input();
        self.events.clear();
        self.context = None;
        self.last_scores.clear();
        self.screen = Screen::Lobby;
    }

    fn queue_pointer(&mut self, pointer: PointerInput) {
        if self.round.is_some() {
            self.input.pointer.push(pointer);
        }
    }

    fn discard_input(&mut self) {
        while let Ok(Some(_)) = self.sensor_rx.try_next() {}
        self.input.clear();
    }

    fn collect_round_events(&mut self) {
        if let Some(round) = self.round.as_mut() {
            self.events.extend(round.drain_events());
        }
    }
}
