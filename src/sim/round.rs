//! Round controller
//!
//! Drives countdown -> playing -> finished for one theme/language. Time only
//! moves through [`RoundController::advance`]; inputs are applied between
//! advances, so a commit and a clock tick never interleave.

use futures_channel::mpsc::UnboundedReceiver;
use glam::Vec2;
use rand::Rng;

use super::deck::{Card, Deck, Language};
use super::gesture::{GestureLatch, SwipeTracker, TiltClassifier, Verdict};
use super::sampler::{SensorReading, TiltDirection};
use super::state::{Feedback, RoundEvent, RoundPhase, RoundState, ScoreEntry};
use crate::consts::SECOND_MS;
use crate::error::Result;
use crate::score::{Tally, tally};
use crate::session::SessionContext;
use crate::settings::{InputMode, Settings};

/// Pointer input for swipe mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Press(Vec2),
    Drag(Vec2),
    Release,
}

/// Inputs gathered since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Classified tilt directions, oldest first
    pub tilt: Vec<TiltDirection>,
    /// Pointer events, oldest first
    pub pointer: Vec<PointerInput>,
}

impl TickInput {
    /// Queue every pending sensor reading; returns how many were taken
    pub fn collect_sensor(&mut self, rx: &mut UnboundedReceiver<SensorReading>) -> usize {
        let before = self.tilt.len();
        while let Ok(Some(reading)) = rx.try_next() {
            self.tilt.push(reading.direction);
        }
        self.tilt.len() - before
    }

    pub fn is_empty(&self) -> bool {
        self.tilt.is_empty() && self.pointer.is_empty()
    }

    pub fn clear(&mut self) {
        self.tilt.clear();
        self.pointer.clear();
    }
}

/// Apply `input`, then advance the clock by `dt_ms`
pub fn tick(round: &mut RoundController, input: &TickInput, dt_ms: u64) {
    for &direction in &input.tilt {
        round.on_tilt(direction);
    }
    for &pointer in &input.pointer {
        match pointer {
            PointerInput::Press(pos) => round.on_press(pos),
            PointerInput::Drag(pos) => round.on_drag(pos),
            PointerInput::Release => {
                round.on_release();
            }
        }
    }
    round.advance(dt_ms);
}

/// Owns the deck, clock and score list of one round
#[derive(Debug)]
pub struct RoundController {
    deck: Deck,
    language: Language,
    input_mode: InputMode,
    round_secs: u32,
    feedback_ms: u64,
    state: RoundState,
    tilt: TiltClassifier,
    swipe: SwipeTracker,
}

impl RoundController {
    /// Start a round with a freshly shuffled deck of the context's theme
    pub fn new<R: Rng + ?Sized>(ctx: &SessionContext, rng: &mut R) -> Result<Self> {
        let deck = Deck::shuffled(&ctx.theme.items, rng)?;
        log::info!(
            "New round: theme={} lang={} cards={}",
            ctx.theme.id,
            ctx.language.code(),
            deck.len()
        );
        Ok(Self::with_deck(deck, ctx.language, &ctx.settings))
    }

    /// Start a round over an already ordered deck
    pub fn with_deck(deck: Deck, language: Language, settings: &Settings) -> Self {
        let mut round = Self {
            deck,
            language,
            input_mode: settings.input_mode,
            round_secs: settings.round_secs,
            feedback_ms: settings.cooldown_ms,
            state: RoundState::new(settings.countdown_secs),
            tilt: TiltClassifier::new(settings.cooldown_ms),
            swipe: SwipeTracker::new(settings.swipe_threshold_px),
        };
        if settings.countdown_secs == 0 {
            round.start_playing();
        }
        round
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase.is_finished()
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn card_index(&self) -> usize {
        self.state.card_index
    }

    pub fn current_card(&self) -> &Card {
        self.deck.card(self.state.card_index)
    }

    /// Text of the card on screen
    pub fn current_word(&self) -> &str {
        self.current_card().text(self.language)
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn scores(&self) -> &[ScoreEntry] {
        &self.state.scores
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.state.feedback
    }

    pub fn clock_ms(&self) -> u64 {
        self.state.clock_ms
    }

    pub fn tilt_latch(&self) -> GestureLatch {
        self.tilt.latch()
    }

    /// Horizontal card offset while a swipe is in progress
    pub fn drag_offset(&self) -> f32 {
        self.swipe.offset()
    }

    pub fn tally(&self) -> Tally {
        tally(&self.state.scores)
    }

    /// Take queued presentation events
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Hand the score list to the results view
    pub fn into_scores(self) -> Vec<ScoreEntry> {
        self.state.scores
    }

    /// Switch gesture source mid-round; any half-made gesture is dropped
    pub fn set_input_mode(&mut self, mode: InputMode) {
        if self.input_mode == mode {
            return;
        }
        log::info!("Round input mode: {}", mode.as_str());
        self.input_mode = mode;
        self.tilt.reset();
        self.swipe.cancel();
    }

    /// Tilt-mode input
    pub fn on_tilt(&mut self, direction: TiltDirection) -> Option<Verdict> {
        if self.input_mode != InputMode::Tilt || !self.state.phase.is_playing() {
            return None;
        }
        let verdict = self.tilt.observe(direction, self.state.clock_ms)?;
        if self.state.feedback.is_some() {
            return None;
        }
        self.commit(verdict);
        Some(verdict)
    }

    /// Swipe-mode pointer down
    pub fn on_press(&mut self, pos: Vec2) {
        if self.accepts_swipe() {
            self.swipe.press(pos);
        }
    }

    /// Swipe-mode pointer move
    pub fn on_drag(&mut self, pos: Vec2) {
        if self.accepts_swipe() {
            self.swipe.drag_to(pos);
        }
    }

    /// Swipe-mode pointer up
    pub fn on_release(&mut self) -> Option<Verdict> {
        let verdict = self.swipe.release().verdict()?;
        if !self.accepts_swipe() {
            return None;
        }
        self.commit(verdict);
        Some(verdict)
    }

    fn accepts_swipe(&self) -> bool {
        self.input_mode == InputMode::Swipe
            && self.state.phase.is_playing()
            && self.state.feedback.is_none()
    }

    fn commit(&mut self, verdict: Verdict) {
        let card_index = self.state.card_index;
        let entry = ScoreEntry {
            word: self.deck.card(card_index).text(self.language).to_string(),
            status: verdict,
        };
        log::debug!("Commit {:?} on card {}: {}", verdict, card_index, entry.word);

        self.state.scores.push(entry.clone());
        self.state.feedback = Some(Feedback {
            verdict,
            until_ms: self.state.clock_ms + self.feedback_ms,
        });
        self.state.emit(RoundEvent::Committed { entry, card_index });
    }

    /// Advance the round clock, firing due feedback expiries and second ticks in order
    pub fn advance(&mut self, dt_ms: u64) {
        let target = self.state.clock_ms + dt_ms;

        while !self.is_finished() {
            let feedback_due = self.state.feedback.map(|f| f.until_ms);
            let next_second = self.state.next_second_ms;
            let next = feedback_due.map_or(next_second, |f| f.min(next_second));
            if next > target {
                break;
            }
            self.state.clock_ms = next;

            // Feedback expiry goes first when both land on the same instant
            if feedback_due == Some(next) {
                self.end_feedback();
            }
            if next_second == next {
                self.state.next_second_ms += SECOND_MS;
                self.on_second();
            }
        }

        self.state.clock_ms = target;
        self.tilt.poll(target);
    }

    fn end_feedback(&mut self) {
        self.state.feedback = None;
        self.state.card_index = self.deck.next_index(self.state.card_index);
        self.state.emit(RoundEvent::CardShown(self.state.card_index));
    }

    fn on_second(&mut self) {
        match self.state.phase {
            RoundPhase::Countdown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.state.phase = RoundPhase::Countdown { remaining };
                self.state.emit(RoundEvent::Countdown(remaining));
                if remaining == 0 {
                    self.start_playing();
                }
            }
            RoundPhase::Playing { time_remaining } => {
                let time_remaining = time_remaining.saturating_sub(1);
                self.state.phase = RoundPhase::Playing { time_remaining };
                self.state.emit(RoundEvent::TimeTick(time_remaining));
                if time_remaining == 0 {
                    self.finish();
                }
            }
            RoundPhase::Finished => {}
        }
    }

    fn start_playing(&mut self) {
        self.state.phase = RoundPhase::Playing {
            time_remaining: self.round_secs,
        };
        self.tilt.reset();
        self.swipe.cancel();
        self.state.emit(RoundEvent::Started);
        self.state.emit(RoundEvent::CardShown(self.state.card_index));
        log::info!("Round started: {}s on the clock", self.round_secs);
    }

    fn finish(&mut self) {
        self.state.phase = RoundPhase::Finished;
        self.swipe.cancel();
        let t = self.tally();
        log::info!("Round finished: {}/{} correct", t.correct_count, t.total);
        self.state.emit(RoundEvent::Finished {
            total: t.total,
            correct_count: t.correct_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{NoGate, OrientationSample, OrientationSampler, TiltThresholds};
    use proptest::prelude::*;
    use TiltDirection::*;

    fn deck(words: &[&str]) -> Deck {
        Deck::ordered(
            words
                .iter()
                .map(|w| Card::new(w.to_lowercase(), &[(Language::En, *w), (Language::Fr, "mot")]))
                .collect(),
        )
        .unwrap()
    }

    fn round(words: &[&str], settings: &Settings) -> RoundController {
        RoundController::with_deck(deck(words), Language::En, settings)
    }

    fn playing(words: &[&str]) -> RoundController {
        let mut r = round(words, &Settings::default());
        r.advance(3 * SECOND_MS);
        assert!(r.phase().is_playing());
        r
    }

    fn gesture(r: &mut RoundController, dir: TiltDirection) -> Option<Verdict> {
        r.on_tilt(Neutral);
        let v = r.on_tilt(dir);
        r.advance(r.feedback_ms);
        v
    }

    fn entry(word: &str, status: Verdict) -> ScoreEntry {
        ScoreEntry {
            word: word.to_string(),
            status,
        }
    }

    #[test]
    fn test_end_to_end_three_cards() {
        let mut r = playing(&["A", "B", "C"]);
        assert_eq!(gesture(&mut r, Down), Some(Verdict::Correct));
        assert_eq!(gesture(&mut r, Up), Some(Verdict::Pass));
        assert_eq!(gesture(&mut r, Down), Some(Verdict::Correct));

        assert_eq!(
            r.scores(),
            &[
                entry("A", Verdict::Correct),
                entry("B", Verdict::Pass),
                entry("C", Verdict::Correct),
            ]
        );
        assert_eq!(r.card_index(), 0);

        r.advance(60 * SECOND_MS);
        assert!(r.is_finished());
        let t = r.tally();
        assert_eq!(t.correct_count, 2);
        assert_eq!(t.total, 3);
    }

    #[test]
    fn test_end_to_end_through_sampler_channel() {
        let (mut sampler, mut rx) = OrientationSampler::new(TiltThresholds::default());
        sampler.request_permission(&mut NoGate, 0);
        let mut r = playing(&["A", "B", "C"]);
        let mut input = TickInput::default();

        for beta in [90.0, 20.0, 25.0, 30.0] {
            sampler.on_sample(OrientationSample::beta(beta));
        }
        assert_eq!(input.collect_sensor(&mut rx), 4);
        tick(&mut r, &input, 900);
        input.clear();
        assert_eq!(r.scores().len(), 1);

        // Tilt still held past the cooldown: no second commit
        sampler.on_sample(OrientationSample::beta(15.0));
        input.collect_sensor(&mut rx);
        tick(&mut r, &input, 0);
        input.clear();
        assert_eq!(r.scores().len(), 1);

        for beta in [100.0, 150.0] {
            sampler.on_sample(OrientationSample::beta(beta));
        }
        input.collect_sensor(&mut rx);
        tick(&mut r, &input, 0);
        assert_eq!(
            r.scores(),
            &[entry("A", Verdict::Correct), entry("B", Verdict::Pass)]
        );
        assert_eq!(input.collect_sensor(&mut rx), 0);
    }

    #[test]
    fn test_countdown_reaches_zero_after_three_ticks() {
        let mut r = round(&["A"], &Settings::default());
        assert_eq!(r.phase(), RoundPhase::Countdown { remaining: 3 });

        r.on_tilt(Neutral);
        assert_eq!(r.on_tilt(Down), None);
        r.advance(SECOND_MS);
        assert_eq!(r.phase(), RoundPhase::Countdown { remaining: 2 });
        r.on_tilt(Neutral);
        assert_eq!(r.on_tilt(Up), None);
        r.advance(SECOND_MS);
        assert_eq!(r.phase(), RoundPhase::Countdown { remaining: 1 });
        r.advance(SECOND_MS);
        assert_eq!(r.phase(), RoundPhase::Playing { time_remaining: 60 });
        assert!(r.scores().is_empty());

        // Arming during countdown does not carry into play
        assert_eq!(r.on_tilt(Down), None);
        assert_eq!(
            r.drain_events(),
            vec![
                RoundEvent::Countdown(3),
                RoundEvent::Countdown(2),
                RoundEvent::Countdown(1),
                RoundEvent::Countdown(0),
                RoundEvent::Started,
                RoundEvent::CardShown(0),
            ]
        );
    }

    #[test]
    fn test_zero_gestures_finishes_empty() {
        let mut r = round(&["A", "B"], &Settings::default());
        r.advance(63 * SECOND_MS);
        assert!(r.is_finished());
        assert!(r.tally().is_empty());
        assert!(r.into_scores().is_empty());
    }

    #[test]
    fn test_round_takes_exactly_round_secs() {
        let mut r = playing(&["A"]);
        r.advance(60 * SECOND_MS - 1);
        assert_eq!(r.phase(), RoundPhase::Playing { time_remaining: 1 });
        r.advance(1);
        assert_eq!(r.phase(), RoundPhase::Finished);
    }

    #[test]
    fn test_card_advances_only_after_feedback() {
        let mut r = playing(&["A", "B"]);
        r.on_tilt(Neutral);
        r.on_tilt(Down);
        assert_eq!(r.feedback().map(|f| f.verdict), Some(Verdict::Correct));
        r.advance(799);
        assert_eq!(r.card_index(), 0);
        assert_eq!(r.current_word(), "A");
        r.advance(1);
        assert_eq!(r.card_index(), 1);
        assert!(r.feedback().is_none());
    }

    #[test]
    fn test_deck_wraps_single_card() {
        let mut r = playing(&["Solo"]);
        for _ in 0..4 {
            gesture(&mut r, Down);
        }
        assert_eq!(r.card_index(), 0);
        assert!(r.scores().iter().all(|e| e.word == "Solo"));
        assert_eq!(r.scores().len(), 4);
    }

    #[test]
    fn test_commit_before_expiry_counts() {
        let mut r = playing(&["A", "B"]);
        r.advance(59 * SECOND_MS + 800);
        assert_eq!(r.phase(), RoundPhase::Playing { time_remaining: 1 });

        r.on_tilt(Neutral);
        assert_eq!(r.on_tilt(Down), Some(Verdict::Correct));
        r.advance(SECOND_MS);
        assert!(r.is_finished());
        // Feedback was still showing at expiry; the entry stands
        assert!(r.feedback().is_some());
        assert_eq!(r.scores(), &[entry("A", Verdict::Correct)]);
        assert_eq!(r.card_index(), 0);
    }

    #[test]
    fn test_input_after_expiry_ignored() {
        let mut r = playing(&["A"]);
        r.advance(60 * SECOND_MS);
        r.on_tilt(Neutral);
        assert_eq!(r.on_tilt(Down), None);
        assert!(r.scores().is_empty());
    }

    #[test]
    fn test_language_picks_recorded_word() {
        let mut r = RoundController::with_deck(deck(&["A"]), Language::Fr, &Settings::default());
        r.advance(3 * SECOND_MS);
        gesture(&mut r, Down);
        assert_eq!(r.scores()[0].word, "mot");
    }

    #[test]
    fn test_tilt_ignored_in_swipe_mode() {
        let settings = Settings::default().with_input_mode(InputMode::Swipe);
        let mut r = round(&["A"], &settings);
        r.advance(3 * SECOND_MS);
        r.on_tilt(Neutral);
        assert_eq!(r.on_tilt(Down), None);
    }

    #[test]
    fn test_swipe_round() {
        let settings = Settings::default().with_input_mode(InputMode::Swipe);
        let mut r = round(&["A", "B", "C"], &settings);

        // Swipes during countdown do nothing
        r.on_press(Vec2::ZERO);
        r.on_drag(Vec2::new(300.0, 0.0));
        assert_eq!(r.on_release(), None);
        r.advance(3 * SECOND_MS);

        r.on_press(Vec2::new(50.0, 10.0));
        r.on_drag(Vec2::new(180.0, 12.0));
        assert_eq!(r.drag_offset(), 130.0);
        assert_eq!(r.on_release(), Some(Verdict::Correct));
        assert_eq!(r.drag_offset(), 0.0);

        // Swipe while feedback is showing is dropped
        r.on_press(Vec2::new(300.0, 0.0));
        r.on_drag(Vec2::new(0.0, 0.0));
        assert_eq!(r.on_release(), None);
        r.advance(800);

        // Short drag snaps back
        r.on_press(Vec2::new(300.0, 0.0));
        r.on_drag(Vec2::new(250.0, 0.0));
        assert_eq!(r.on_release(), None);

        r.on_press(Vec2::new(300.0, 0.0));
        r.on_drag(Vec2::new(150.0, 0.0));
        assert_eq!(r.on_release(), Some(Verdict::Pass));
        assert_eq!(
            r.scores(),
            &[entry("A", Verdict::Correct), entry("B", Verdict::Pass)]
        );
    }

    #[test]
    fn test_tick_applies_inputs_before_time() {
        let mut r = playing(&["A", "B"]);
        r.advance(59 * SECOND_MS);
        let input = TickInput {
            tilt: vec![Neutral, Up],
            ..Default::default()
        };
        tick(&mut r, &input, SECOND_MS);
        assert!(r.is_finished());
        assert_eq!(r.scores(), &[entry("A", Verdict::Pass)]);
    }

    #[test]
    fn test_tick_applies_pointer_input() {
        let settings = Settings::default().with_input_mode(InputMode::Swipe);
        let mut r = round(&["A", "B"], &settings);
        r.advance(3 * SECOND_MS);
        let input = TickInput {
            pointer: vec![
                PointerInput::Press(Vec2::new(0.0, 0.0)),
                PointerInput::Drag(Vec2::new(150.0, 0.0)),
                PointerInput::Release,
            ],
            ..Default::default()
        };
        assert!(!input.is_empty());
        tick(&mut r, &input, 800);
        assert_eq!(r.scores(), &[entry("A", Verdict::Correct)]);
        assert_eq!(r.card_index(), 1);
    }

    #[test]
    fn test_switch_to_swipe_mid_round() {
        let mut r = playing(&["A", "B"]);
        // Half-made tilt gesture is forgotten by the switch
        r.on_tilt(Neutral);
        r.set_input_mode(InputMode::Swipe);
        assert_eq!(r.input_mode(), InputMode::Swipe);
        assert_eq!(r.on_tilt(Down), None);

        r.on_press(Vec2::new(400.0, 0.0));
        r.on_drag(Vec2::new(100.0, 0.0));
        assert_eq!(r.on_release(), Some(Verdict::Pass));

        r.advance(800);
        r.set_input_mode(InputMode::Tilt);
        r.on_press(Vec2::new(0.0, 0.0));
        r.on_drag(Vec2::new(300.0, 0.0));
        assert_eq!(r.on_release(), None);
        assert_eq!(r.on_tilt(Down), None);
        assert_eq!(gesture(&mut r, Down), Some(Verdict::Correct));
        assert_eq!(
            r.scores(),
            &[entry("A", Verdict::Pass), entry("B", Verdict::Correct)]
        );
    }

    #[test]
    fn test_zero_countdown_starts_playing() {
        let settings = Settings {
            countdown_secs: 0,
            round_secs: 5,
            ..Default::default()
        };
        let mut r = round(&["A"], &settings);
        assert_eq!(r.phase(), RoundPhase::Playing { time_remaining: 5 });
        r.advance(5 * SECOND_MS);
        assert!(r.is_finished());
    }

    #[test]
    fn test_finished_event_carries_tally() {
        let mut r = playing(&["A", "B"]);
        gesture(&mut r, Down);
        r.drain_events();
        r.advance(60 * SECOND_MS);
        let events = r.drain_events();
        assert_eq!(
            events.last(),
            Some(&RoundEvent::Finished {
                total: 1,
                correct_count: 1
            })
        );
    }

    proptest! {
        #[test]
        fn prop_card_index_is_commits_mod_len(
            len in 1usize..7,
            gestures in proptest::collection::vec(prop_oneof![Just(Down), Just(Up)], 0..40)
        ) {
            let words: Vec<String> = (0..len).map(|i| format!("W{i}")).collect();
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let mut r = playing(&refs);

            for (k, &dir) in gestures.iter().enumerate() {
                prop_assert!(gesture(&mut r, dir).is_some());
                prop_assert_eq!(r.card_index(), (k + 1) % len);
            }
            prop_assert_eq!(r.scores().len(), gestures.len());
            let t = r.tally();
            prop_assert!(t.correct_count <= t.total);
            prop_assert_eq!(t.correct_count, gestures.iter().filter(|&&d| d == Down).count());
        }
    }
}
