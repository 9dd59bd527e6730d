//! Browser bindings
//!
//! Listeners and timers are held by guards; dropping a guard unsubscribes, so
//! nothing fires into a torn-down round.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DeviceOrientationEvent, Window};

use crate::sim::{OrientationSample, Permission};

const ORIENTATION_EVENT: &str = "deviceorientation";

/// Ask for motion access.
///
/// Must be called from a user gesture handler: the prompt is issued before
/// this returns, only the answer is awaited. Browsers without
/// `DeviceOrientationEvent.requestPermission` have no consent gate and are
/// treated as granted.
pub fn request_permission() -> impl Future<Output = Permission> {
    let prompt = start_prompt();
    async move {
        let promise = match prompt {
            Ok(promise) => promise,
            Err(settled) => return settled,
        };
        match JsFuture::from(promise).await {
            Ok(result) if result.as_string().as_deref() == Some("granted") => Permission::Granted,
            Ok(result) => {
                log::warn!("Motion permission answer: {:?}", result.as_string());
                Permission::Denied
            }
            Err(e) => {
                log::error!("Permission request failed: {:?}", e);
                Permission::Denied
            }
        }
    }
}

/// Pending prompt, or the answer when no prompt is needed
fn start_prompt() -> Result<js_sys::Promise, Permission> {
    let global = js_sys::global();
    let ctor = match js_sys::Reflect::get(&global, &JsValue::from_str("DeviceOrientationEvent")) {
        Ok(ctor) if !ctor.is_undefined() => ctor,
        _ => return Err(Permission::Granted),
    };
    let request = match js_sys::Reflect::get(&ctor, &JsValue::from_str("requestPermission")) {
        Ok(f) if f.is_function() => f.unchecked_into::<js_sys::Function>(),
        _ => return Err(Permission::Granted),
    };

    request
        .call0(&ctor)
        .and_then(|p| p.dyn_into::<js_sys::Promise>())
        .map_err(|e| {
            log::error!("Permission request failed: {:?}", e);
            Permission::Denied
        })
}

/// Live `deviceorientation` listener
pub struct OrientationSubscription {
    window: Window,
    closure: Closure<dyn FnMut(DeviceOrientationEvent)>,
}

impl OrientationSubscription {
    pub fn new<F>(mut on_sample: F) -> Option<Self>
    where
        F: FnMut(OrientationSample) + 'static,
    {
        let window = web_sys::window()?;
        let closure = Closure::<dyn FnMut(_)>::new(move |event: DeviceOrientationEvent| {
            on_sample(OrientationSample {
                beta: event.beta().map(|b| b as f32),
                gamma: event.gamma().map(|g| g as f32),
            });
        });
        window
            .add_event_listener_with_callback(ORIENTATION_EVENT, closure.as_ref().unchecked_ref())
            .ok()?;
        log::debug!("Subscribed to {}", ORIENTATION_EVENT);
        Some(Self { window, closure })
    }
}

impl Drop for OrientationSubscription {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            ORIENTATION_EVENT,
            self.closure.as_ref().unchecked_ref(),
        );
        log::debug!("Unsubscribed from {}", ORIENTATION_EVENT);
    }
}

/// Repeating `setInterval` timer
pub struct Interval {
    window: Window,
    handle: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new<F>(period_ms: i32, callback: F) -> Option<Self>
    where
        F: FnMut() + 'static,
    {
        let window = web_sys::window()?;
        let closure = Closure::<dyn FnMut()>::new(callback);
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms,
            )
            .ok()?;
        Some(Self {
            window,
            handle,
            _closure: closure,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.handle);
    }
}
