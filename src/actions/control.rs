use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use streamdeck_lib::prelude::*;
use tracing::{debug, warn};

use crate::settings::{InvalidNumber, get_i64, get_str, get_u64};
use crate::store::{self, CounterHandle};

/// A key that drives the counter through the global handle, the same way
/// any other code outside the display would.
pub struct ControlAction {
    holding: Arc<AtomicBool>,
    press_seq: u64,
    active_press_id: Arc<AtomicU64>,
    long_fired_press_id: Arc<AtomicU64>,

    active: Option<ControlSettings>,
}

impl Default for ControlAction {
    fn default() -> Self {
        Self {
            holding: Arc::new(AtomicBool::new(false)),
            press_seq: 0,
            active_press_id: Arc::new(AtomicU64::new(0)),
            long_fired_press_id: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }
}

impl ActionStatic for ControlAction {
    const ID: &'static str = super::ids::CONTROL;
}

impl Action for ControlAction {
    fn id(&self) -> &str {
        Self::ID
    }

    fn init(&mut self, cx: &Context, ctx_id: &str) {
        cx.sd().get_settings(ctx_id);
    }

    fn did_receive_settings(&mut self, cx: &Context, ev: &incoming::DidReceiveSettings) {
        // Flag bad numbers as soon as they are entered, not on the next press.
        if let Err(e) = parse_settings(&ev.settings) {
            warn!(ctx = ev.context, "{e}");
            cx.sd().show_alert(ev.context);
        }
    }

    fn key_down(&mut self, cx: &Context, ev: &incoming::KeyDown) {
        self.active = None;
        let settings = match parse_settings(&ev.settings) {
            Ok(s) => s,
            Err(e) => {
                warn!(ctx = ev.context, "{e}");
                cx.sd().show_alert(ev.context);
                return;
            }
        };

        self.press_seq = self.press_seq.wrapping_add(1);
        self.active_press_id.store(self.press_seq, Ordering::SeqCst);
        self.long_fired_press_id.store(0, Ordering::SeqCst);
        self.holding.store(true, Ordering::SeqCst);

        if settings.long_action != Op::None {
            self.arm_long_press(self.press_seq, &settings);
        }
        self.active = Some(settings);
    }

    fn key_up(&mut self, _cx: &Context, _ev: &incoming::KeyUp) {
        self.holding.store(false, Ordering::SeqCst);

        let press = self.active_press_id.load(Ordering::SeqCst);
        let settings = self.active.take();
        // The hold already acted for this press.
        if self.long_fired_press_id.load(Ordering::SeqCst) == press {
            return;
        }
        if let Some(settings) = settings {
            apply(store::counter(), settings.short_action, settings.short_value);
        }
    }
}

impl ControlAction {
    /// After `long_press_ms`, apply the long op if press `press` is still held.
    fn arm_long_press(&self, press: u64, settings: &ControlSettings) {
        let holding = Arc::clone(&self.holding);
        let active = Arc::clone(&self.active_press_id);
        let fired = Arc::clone(&self.long_fired_press_id);
        let delay = Duration::from_millis(settings.long_press_ms);
        let (op, n) = (settings.long_action, settings.long_value);

        std::thread::spawn(move || {
            std::thread::sleep(delay);
            // Not released, and no newer press since.
            let still_held =
                holding.load(Ordering::SeqCst) && active.load(Ordering::SeqCst) == press;
            if still_held {
                fired.store(press, Ordering::SeqCst);
                apply(store::counter(), op, n);
            }
        });
    }
}

// ── Settings ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    #[default]
    None,
    Increment,
    Set,
}

#[derive(Clone, Debug, PartialEq)]
struct ControlSettings {
    short_action: Op,
    short_value: i64,
    long_action: Op,
    long_value: i64,
    long_press_ms: u64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            short_action: Op::Increment,
            short_value: 1,
            long_action: Op::None,
            long_value: 0,
            long_press_ms: 500,
        }
    }
}

fn parse_settings(v: &Map<String, Value>) -> Result<ControlSettings, InvalidNumber> {
    let d = ControlSettings::default();
    Ok(ControlSettings {
        short_action: get_op(v, "shortAction").unwrap_or(d.short_action),
        short_value: get_i64(v, "shortValue")?.unwrap_or(d.short_value),
        long_action: get_op(v, "longAction").unwrap_or(d.long_action),
        long_value: get_i64(v, "longValue")?.unwrap_or(d.long_value),
        long_press_ms: get_u64(v, "longPressMs")?.unwrap_or(d.long_press_ms),
    })
}

fn get_op(v: &Map<String, Value>, k: &str) -> Option<Op> {
    get_str(v, k).and_then(|s| serde_json::from_value(Value::from(s)).ok())
}

fn apply(counter: CounterHandle<'_>, op: Op, n: i64) {
    debug!(?op, n, "control pressed");
    match op {
        Op::None => {}
        Op::Increment => counter.increment(n),
        Op::Set => counter.set(n),
    }
}
