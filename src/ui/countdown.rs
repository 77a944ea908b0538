use actix_rt::task::JoinHandle;
use actix_rt::time::{interval_at, Instant};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use crate::ui::view::PageView;

/// Where the turn countdown stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountdownFloor {
    /// Stop on the tick that shows 0
    #[default]
    Zero,
    /// Run one silent extra tick after 0, matching older clients' timing
    LegacySentinel,
}

impl FromStr for CountdownFloor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zero" => Ok(CountdownFloor::Zero),
            "legacy" | "legacy-sentinel" => Ok(CountdownFloor::LegacySentinel),
            other => Err(format!("unknown countdown floor: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownSettings {
    /// Seconds per turn
    pub duration: u32,
    /// At or below this many seconds the display is flagged urgent
    pub urgent_threshold: u32,
    pub tick: Duration,
    pub floor: CountdownFloor,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        CountdownSettings {
            duration: 30,
            urgent_threshold: 10,
            tick: Duration::from_secs(1),
            floor: CountdownFloor::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

/// One tick of the turn countdown
pub fn turn_tick(remaining: &Cell<i64>, settings: &CountdownSettings, view: &dyn PageView) -> Tick {
    let current = remaining.get();
    view.set_countdown_urgent(current <= i64::from(settings.urgent_threshold));

    match settings.floor {
        CountdownFloor::Zero => {
            view.show_countdown(current);
            if current <= 0 {
                return Tick::Stop;
            }
        }
        CountdownFloor::LegacySentinel => {
            if current <= -1 {
                return Tick::Stop;
            }
            view.show_countdown(current);
        }
    }

    remaining.set(current - 1);
    Tick::Continue
}

/// One tick of the post-game redirect countdown; navigates once it runs out
pub fn redirect_tick(remaining: &Cell<i64>, url: &str, view: &dyn PageView) -> Tick {
    let current = remaining.get();
    view.update_redirect_countdown(current);
    remaining.set(current - 1);

    if current - 1 <= 0 {
        info!("Redirecting to {}", url);
        view.navigate(url);
        Tick::Stop
    } else {
        Tick::Continue
    }
}

/// Repeating per-turn countdown.
///
/// Tickers are local tasks on the current actix system, so `start` must be
/// called from inside one.
pub struct TurnCountdown {
    settings: CountdownSettings,
    view: Rc<dyn PageView>,
    remaining: Rc<Cell<i64>>,
    handle: Option<JoinHandle<()>>,
}

impl TurnCountdown {
    pub fn new(settings: CountdownSettings, view: Rc<dyn PageView>) -> Self {
        TurnCountdown {
            settings,
            view,
            remaining: Rc::new(Cell::new(i64::from(settings.duration))),
            handle: None,
        }
    }

    /// Cancel any live ticker, reset to the full duration and start ticking
    pub fn start(&mut self) {
        self.cancel();
        self.remaining.set(i64::from(self.settings.duration));

        let settings = self.settings;
        let view = Rc::clone(&self.view);
        let remaining = Rc::clone(&self.remaining);

        self.handle = Some(actix_rt::spawn(async move {
            let mut ticks = interval_at(Instant::now() + settings.tick, settings.tick);
            loop {
                ticks.tick().await;
                if turn_tick(&remaining, &settings, view.as_ref()) == Tick::Stop {
                    break;
                }
            }
            debug!("Turn countdown expired");
        }));
    }

    pub fn stop(&mut self) {
        self.cancel();
    }

    pub fn remaining(&self) -> i64 {
        self.remaining.get()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn settings(&self) -> &CountdownSettings {
        &self.settings
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TurnCountdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Post-game countdown that ends in a single navigation
pub struct RedirectCountdown {
    tick: Duration,
    view: Rc<dyn PageView>,
    remaining: Rc<Cell<i64>>,
    handle: Option<JoinHandle<()>>,
}

impl RedirectCountdown {
    pub fn new(tick: Duration, view: Rc<dyn PageView>) -> Self {
        RedirectCountdown {
            tick,
            view,
            remaining: Rc::new(Cell::new(0)),
            handle: None,
        }
    }

    pub fn start(&mut self, url: String, seconds: u32) {
        self.cancel();
        self.remaining.set(i64::from(seconds));

        let tick = self.tick;
        let view = Rc::clone(&self.view);
        let remaining = Rc::clone(&self.remaining);

        self.handle = Some(actix_rt::spawn(async move {
            let mut ticks = interval_at(Instant::now() + tick, tick);
            loop {
                ticks.tick().await;
                if redirect_tick(&remaining, &url, view.as_ref()) == Tick::Stop {
                    break;
                }
            }
        }));
    }

    pub fn remaining(&self) -> i64 {
        self.remaining.get()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RedirectCountdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::view::{HeadlessView, ViewEvent};
    use actix_rt::time::sleep;

    fn settings(duration: u32, floor: CountdownFloor) -> CountdownSettings {
        CountdownSettings {
            duration,
            floor,
            ..CountdownSettings::default()
        }
    }

    fn run_to_stop(duration: u32, floor: CountdownFloor) -> (usize, Vec<i64>) {
        let view = HeadlessView::new();
        let remaining = Cell::new(i64::from(duration));
        let settings = settings(duration, floor);
        let mut ticks = 0;
        loop {
            ticks += 1;
            if turn_tick(&remaining, &settings, &view) == Tick::Stop {
                break;
            }
        }
        (ticks, view.countdown_values())
    }

    #[test]
    fn zero_floor_stops_on_the_tick_showing_zero() {
        let (ticks, shown) = run_to_stop(3, CountdownFloor::Zero);
        assert_eq!(ticks, 4);
        assert_eq!(shown, vec![3, 2, 1, 0]);
    }

    #[test]
    fn legacy_floor_runs_one_extra_tick() {
        let (ticks, shown) = run_to_stop(3, CountdownFloor::LegacySentinel);
        assert_eq!(ticks, 5);
        assert_eq!(shown, vec![3, 2, 1, 0]);
    }

    #[test]
    fn urgency_flag_follows_threshold() {
        let view = HeadlessView::new();
        let settings = settings(12, CountdownFloor::Zero);
        let remaining = Cell::new(11);

        turn_tick(&remaining, &settings, &view);
        turn_tick(&remaining, &settings, &view);
        assert_eq!(
            view.events(),
            vec![
                ViewEvent::Urgent(false),
                ViewEvent::Countdown(11),
                ViewEvent::Urgent(true),
                ViewEvent::Countdown(10),
            ]
        );
    }

    #[test]
    fn redirect_tick_navigates_when_exhausted() {
        let view = HeadlessView::new();
        let remaining = Cell::new(2);
        assert_eq!(redirect_tick(&remaining, "/next", &view), Tick::Continue);
        assert!(view.navigations().is_empty());
        assert_eq!(redirect_tick(&remaining, "/next", &view), Tick::Stop);
        assert_eq!(view.navigations(), vec!["/next".to_string()]);
    }

    #[actix_rt::test]
    async fn restart_leaves_a_single_ticker_at_full_duration() {
        tokio::time::pause();
        let view = Rc::new(HeadlessView::new());
        let mut countdown = TurnCountdown::new(settings(30, CountdownFloor::Zero), view.clone());

        countdown.start();
        countdown.start();
        assert_eq!(countdown.remaining(), 30);
        assert!(countdown.is_running());

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(view.countdown_values(), vec![30, 29, 28]);
        assert_eq!(countdown.remaining(), 27);
    }

    #[actix_rt::test]
    async fn restart_mid_count_resets_remaining() {
        tokio::time::pause();
        let view = Rc::new(HeadlessView::new());
        let mut countdown = TurnCountdown::new(settings(30, CountdownFloor::Zero), view.clone());

        countdown.start();
        sleep(Duration::from_millis(5500)).await;
        assert_eq!(countdown.remaining(), 25);

        countdown.start();
        assert_eq!(countdown.remaining(), 30);
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(view.countdown_values().last(), Some(&30));
    }

    #[actix_rt::test]
    async fn countdown_stops_by_itself() {
        tokio::time::pause();
        let view = Rc::new(HeadlessView::new());
        let mut countdown = TurnCountdown::new(settings(2, CountdownFloor::Zero), view.clone());

        countdown.start();
        sleep(Duration::from_secs(10)).await;
        assert_eq!(view.countdown_values(), vec![2, 1, 0]);
        assert!(!countdown.is_running());
    }

    #[actix_rt::test]
    async fn stop_cancels_ticking() {
        tokio::time::pause();
        let view = Rc::new(HeadlessView::new());
        let mut countdown = TurnCountdown::new(settings(30, CountdownFloor::Zero), view.clone());

        countdown.start();
        sleep(Duration::from_millis(1500)).await;
        countdown.stop();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(view.countdown_values(), vec![30]);
        assert!(!countdown.is_running());
    }

    #[actix_rt::test]
    async fn redirect_navigates_once_after_ten_ticks() {
        tokio::time::pause();
        let view = Rc::new(HeadlessView::new());
        let mut redirect = RedirectCountdown::new(Duration::from_secs(1), view.clone());

        redirect.start("/result/42".to_string(), 10);
        sleep(Duration::from_millis(9500)).await;
        assert!(view.navigations().is_empty());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(view.navigations(), vec!["/result/42".to_string()]);
        assert!(!redirect.is_running());
    }
}
