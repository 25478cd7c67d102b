use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use streamdeck_lib::prelude::*;
use tracing::{debug, trace};

use crate::clock::ElapsedClock;
use crate::render::render_display;
use crate::store::{self, CounterStore, Subscription};
use crate::ticker::Ticker;

const TICK: Duration = Duration::from_secs(1);

/// Shows the counter value and how long it has held it.
#[derive(Default)]
pub struct DisplayAction {
    screen: Screen,
}

impl ActionStatic for DisplayAction {
    const ID: &'static str = super::ids::DISPLAY;
}

impl Action for DisplayAction {
    fn id(&self) -> &str {
        Self::ID
    }

    fn init(&mut self, cx: &Context, ctx_id: &str) {
        self.mount(cx, ctx_id);
    }

    fn will_appear(&mut self, cx: &Context, ev: &incoming::WillAppear) {
        // Back from a page or profile switch.
        self.mount(cx, ev.context);
    }

    fn will_disappear(&mut self, _cx: &Context, _ev: &incoming::WillDisappear) {
        self.screen.unmount();
    }

    fn teardown(&mut self, _cx: &Context, _ctx_id: &str) {
        self.screen.unmount();
    }
}

impl DisplayAction {
    fn mount(&mut self, cx: &Context, ctx_id: &str) {
        let cx = cx.clone();
        let ctx = ctx_id.to_string();
        self.screen.mount(store::global(), TICK, move |value, secs| {
            render_display(&cx, &ctx, value, secs);
        });
    }
}

/// One mounted face: its subscription to the store and its ticker.
#[derive(Default)]
struct Screen {
    shared: Arc<Mutex<Shared>>,
    subscription: Option<Subscription>,
}

#[derive(Default)]
struct Shared {
    mounted: bool,
    state: DisplayState,
    // At most one live ticker; replacing it cancels the old one.
    ticker: Option<Ticker>,
}

/// What the key currently shows.
#[derive(Debug, Default)]
struct DisplayState {
    value: i64,
    clock: ElapsedClock,
    // Bumped on every rearm so ticks from a replaced ticker are ignored.
    epoch: u64,
}

impl DisplayState {
    fn changed(&mut self, value: i64, now: Instant) -> u64 {
        self.value = value;
        self.clock.rearm(now);
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    fn tick(&mut self, epoch: u64, now: Instant) -> Option<u64> {
        (epoch == self.epoch).then(|| self.clock.tick(now))
    }
}

impl Screen {
    /// Subscribe to `store` and start the clock. A second mount is a no-op.
    fn mount<R>(&mut self, store: &CounterStore, interval: Duration, render: R)
    where
        R: Fn(i64, u64) + Clone + Send + 'static,
    {
        if self.subscription.is_some() {
            return;
        }
        debug!("display mounted");
        lock(&self.shared).mounted = true;

        let shared = Arc::clone(&self.shared);
        let on_change = render.clone();
        self.subscription = Some(store.subscribe(move |value| {
            rearm(&shared, interval, &on_change, value);
        }));

        rearm(&self.shared, interval, &render, store.value());
    }

    fn unmount(&mut self) {
        if self.subscription.take().is_some() {
            debug!("display unmounted");
        }
        let mut s = lock(&self.shared);
        s.mounted = false;
        s.ticker = None;
    }
}

/// Reset the clock to now, render, and replace the ticker.
fn rearm<R>(shared: &Arc<Mutex<Shared>>, interval: Duration, render: &R, value: i64)
where
    R: Fn(i64, u64) + Clone + Send + 'static,
{
    let mut s = lock(shared);
    // A notification already in flight when the key went away.
    if !s.mounted {
        return;
    }
    let epoch = s.state.changed(value, Instant::now());
    render(value, 0);
    s.ticker = Some(Ticker::start(
        interval,
        on_tick(Arc::downgrade(shared), epoch, render.clone()),
    ));
}

fn on_tick<R>(shared: Weak<Mutex<Shared>>, epoch: u64, render: R) -> impl FnMut() -> ControlFlow<()>
where
    R: Fn(i64, u64),
{
    move || {
        let Some(shared) = shared.upgrade() else {
            return ControlFlow::Break(());
        };
        let mut s = lock(&shared);
        if !s.mounted {
            return ControlFlow::Break(());
        }
        match s.state.tick(epoch, Instant::now()) {
            Some(secs) => {
                trace!(readout = %s.state.clock.readout(), "tick");
                render(s.state.value, secs);
                ControlFlow::Continue(())
            }
            None => ControlFlow::Break(()),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
