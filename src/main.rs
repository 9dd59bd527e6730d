//! Tilt Party entry point
//!
//! Handles platform-specific initialization and drives the session.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, MouseEvent, PointerEvent};

    use tilt_party::platform::now_ms;
    use tilt_party::platform::web::{Interval, OrientationSubscription, request_permission};
    use tilt_party::sim::{Permission, RoundEvent, Verdict};
    use tilt_party::{Catalog, GameError, InputMode, Screen, Session, Settings};

    /// Session clock resolution
    const TICK_MS: i32 = 50;

    /// Game instance holding the session and its browser hooks
    struct Game {
        session: Session,
        rng: Pcg32,
        last_time: u64,
        sensor_checked: bool,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                session: Session::new(Catalog::builtin(), Settings::default()),
                rng: Pcg32::seed_from_u64(seed),
                last_time: now_ms(),
                sensor_checked: false,
            }
        }

        fn update(&mut self) {
            let now = now_ms();
            let dt = now.saturating_sub(self.last_time);
            self.last_time = now;

            if !self.sensor_checked && self.session.permission() == Permission::Granted {
                if let Err(e) = self.session.check_sensor(now) {
                    log::warn!("{}", e.user_message());
                    set_text("status", e.user_message());
                    self.session.set_input_mode(InputMode::Swipe);
                    self.sensor_checked = true;
                } else if self.session.sampler().latest().beta.is_some() {
                    self.sensor_checked = true;
                }
            }

            if let Some(tally) = self.session.advance(dt) {
                log::info!("Round over: {} correct of {}", tally.correct_count, tally.total);
            }
            for event in self.session.drain_events() {
                self.present(&event);
            }
        }

        fn present(&self, event: &RoundEvent) {
            match event {
                RoundEvent::Countdown(n) => set_text("card", &n.to_string()),
                RoundEvent::Started => set_text("status", ""),
                RoundEvent::TimeTick(secs) => set_text("timer", &secs.to_string()),
                RoundEvent::CardShown(_) => {
                    if let Some(round) = self.session.round() {
                        set_text("card", round.current_word());
                    }
                }
                RoundEvent::Committed { entry, .. } => set_text(
                    "status",
                    match entry.status {
                        Verdict::Correct => "✓",
                        Verdict::Pass => "✗",
                    },
                ),
                RoundEvent::Finished { total, correct_count } => {
                    set_text("card", &format!("{correct_count} / {total}"));
                }
            }
        }

        /// Tilt rounds need the motion prompt answered first
        fn needs_permission(&self) -> bool {
            self.session.settings().input_mode == InputMode::Tilt
                && self.session.permission() == Permission::Unrequested
        }

        fn start_round(&mut self) {
            if let Err(e) = self.session.start_round(&mut self.rng) {
                log::warn!("{}", e);
                set_text("status", e.user_message());
            }
        }

        /// Enter walks the screens forward, Escape goes home, S toggles swipe
        fn on_key(&mut self, key: &str) {
            match (key, self.session.screen()) {
                ("Enter", Screen::Lobby) => {
                    let language = self.session.settings().language;
                    let first = self.session.catalog().themes().first().map(|t| t.id.clone());
                    if let Some(id) = first
                        && let Err(e) = self.session.select_theme(&id, language)
                    {
                        log::error!("{}", e);
                    }
                }
                ("Enter", Screen::Instructions) => self.start_round(),
                ("Enter", Screen::Results) => self.session.replay(),
                ("Escape", _) => self.session.go_home(),
                ("s" | "S", Screen::Lobby | Screen::Instructions) => {
                    let mode = match self.session.settings().input_mode {
                        InputMode::Tilt => InputMode::Swipe,
                        InputMode::Swipe => InputMode::Tilt,
                    };
                    self.session.set_input_mode(mode);
                }
                _ => {}
            }
        }
    }

    /// Route a key press; starting a tilt round first asks for motion access
    fn handle_key(game: &Rc<RefCell<Game>>, key: &str) {
        let prompt = {
            let g = game.borrow();
            key == "Enter" && g.session.screen() == Screen::Instructions && g.needs_permission()
        };
        if prompt {
            start_with_permission(game.clone());
        } else {
            game.borrow_mut().on_key(key);
        }
    }

    /// Called from inside a user gesture: the prompt is issued synchronously
    fn start_with_permission(game: Rc<RefCell<Game>>) {
        let answer = request_permission();
        wasm_bindgen_futures::spawn_local(async move {
            let permission = answer.await;
            let mut g = game.borrow_mut();
            g.session.resolve_permission(permission, now_ms());
            if permission == Permission::Denied {
                g.session.set_input_mode(InputMode::Swipe);
                set_text("status", GameError::PermissionDenied.user_message());
            }
            g.start_round();
        });
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            el.set_text_content(Some(text));
        }
    }

    /// Hooks that must live as long as the page
    struct Hooks {
        _orientation: Option<OrientationSubscription>,
        _tick: Option<Interval>,
    }

    thread_local! {
        static HOOKS: RefCell<Option<Hooks>> = const { RefCell::new(None) };
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Tilt Party starting...");

        let game = Rc::new(RefCell::new(Game::new(now_ms())));

        let orientation = {
            let game = game.clone();
            OrientationSubscription::new(move |sample| {
                game.borrow_mut().session.on_orientation(sample);
            })
        };

        let tick = {
            let game = game.clone();
            Interval::new(TICK_MS, move || game.borrow_mut().update())
        };

        setup_input_handlers(game);

        HOOKS.with(|hooks| {
            *hooks.borrow_mut() = Some(Hooks {
                _orientation: orientation,
                _tick: tick,
            });
        });
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document");
            return;
        };

        // Pointer down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                game.borrow_mut().session.on_press(pos);
            });
            let _ = document
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                game.borrow_mut().session.on_drag(pos);
            });
            let _ = document
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer up / cancel
        for name in ["pointerup", "pointercancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().session.on_release();
            });
            let _ =
                document.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Tap outside a round acts as Enter
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let screen = game.borrow().session.screen();
                if screen != Screen::Playing {
                    handle_key(&game, "Enter");
                }
            });
            let _ = document
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                handle_key(&game, &event.key());
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tilt Party (native) starting...");
    log::info!("Native mode plays a scripted round - run with `trunk serve` for the web version");

    if let Err(e) = demo::run(std::env::args().nth(1)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use tilt_party::consts::SECOND_MS;
    use tilt_party::sim::{NoGate, OrientationSample, RoundEvent};
    use tilt_party::{Catalog, Result, Session, Settings};

    /// Pitch readings alternating neutral with down, up, down, down
    const SCRIPT: [f32; 8] = [90.0, 20.0, 92.0, 160.0, 88.0, 25.0, 91.0, 30.0];

    /// Sample spacing; tilts land two steps apart, past the default cooldown
    const STEP_MS: u64 = 500;

    pub fn run(settings_path: Option<String>) -> Result<()> {
        let settings = match settings_path {
            Some(path) => Settings::from_json(&std::fs::read_to_string(path)?)?,
            None => Settings::default(),
        };
        let language = settings.language;
        let mut session = Session::new(Catalog::builtin(), settings);
        let mut rng = Pcg32::seed_from_u64(7);

        session.request_permission(&mut NoGate, 0);
        session.select_theme("animals", language)?;
        session.start_round(&mut rng)?;

        let countdown = u64::from(session.settings().countdown_secs) * SECOND_MS;
        session.advance(countdown);

        for beta in SCRIPT {
            session.on_orientation(OrientationSample::beta(beta));
            session.advance(STEP_MS);
        }

        let round_ms = u64::from(session.settings().round_secs) * SECOND_MS;
        let tally = session.advance(round_ms).unwrap_or_else(|| session.last_tally());

        for event in session.drain_events() {
            if let RoundEvent::Committed { entry, .. } = event {
                println!("  {:?}: {}", entry.status, entry.word);
            }
        }
        println!(
            "Score: {} correct, {} passed ({} cards)",
            tally.correct_count, tally.pass_count, tally.total
        );
        Ok(())
    }
}
