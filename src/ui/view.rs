use log::{info, warn};
use std::cell::RefCell;

/// Page elements the game session drives: countdown display, status line,
/// redirect hint and error, board styling and navigation.
///
/// Methods take `&self` because the view is shared with the timers;
/// implementations use interior mutability.
pub trait PageView {
    fn show_countdown(&self, seconds: i64);

    fn set_countdown_urgent(&self, urgent: bool);

    fn hide_countdown(&self);

    fn set_status(&self, status: &str);

    fn show_redirect_hint(&self, url: &str, seconds: i64);

    fn update_redirect_countdown(&self, seconds: i64);

    fn show_redirect_error(&self);

    fn grey_out_board(&self);

    fn navigate(&self, url: &str);
}

/// Everything a `HeadlessView` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Countdown(i64),
    Urgent(bool),
    CountdownHidden,
    Status(String),
    RedirectHint { url: String, seconds: i64 },
    RedirectCountdown(i64),
    RedirectError,
    BoardGreyed,
    Navigate(String),
}

/// View without a display that records every update in order
#[derive(Debug, Default)]
pub struct HeadlessView {
    events: RefCell<Vec<ViewEvent>>,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn countdown_values(&self) -> Vec<i64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Countdown(seconds) => Some(*seconds),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Navigate(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            ViewEvent::Status(status) => Some(status.clone()),
            _ => None,
        })
    }

    pub fn contains(&self, event: &ViewEvent) -> bool {
        self.events.borrow().contains(event)
    }

    fn push(&self, event: ViewEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl PageView for HeadlessView {
    fn show_countdown(&self, seconds: i64) {
        self.push(ViewEvent::Countdown(seconds));
    }

    fn set_countdown_urgent(&self, urgent: bool) {
        self.push(ViewEvent::Urgent(urgent));
    }

    fn hide_countdown(&self) {
        self.push(ViewEvent::CountdownHidden);
    }

    fn set_status(&self, status: &str) {
        self.push(ViewEvent::Status(status.to_string()));
    }

    fn show_redirect_hint(&self, url: &str, seconds: i64) {
        self.push(ViewEvent::RedirectHint {
            url: url.to_string(),
            seconds,
        });
    }

    fn update_redirect_countdown(&self, seconds: i64) {
        self.push(ViewEvent::RedirectCountdown(seconds));
    }

    fn show_redirect_error(&self) {
        self.push(ViewEvent::RedirectError);
    }

    fn grey_out_board(&self) {
        self.push(ViewEvent::BoardGreyed);
    }

    fn navigate(&self, url: &str) {
        self.push(ViewEvent::Navigate(url.to_string()));
    }
}

/// Terminal rendition of the page
#[derive(Debug)]
pub struct ConsoleView {
    urgent: RefCell<bool>,
    countdown_visible: RefCell<bool>,
    navigated: RefCell<Option<String>>,
}

impl ConsoleView {
    pub fn new() -> Self {
        ConsoleView {
            urgent: RefCell::new(false),
            countdown_visible: RefCell::new(true),
            navigated: RefCell::new(None),
        }
    }

    /// Where the page navigated to, once it has
    pub fn navigated_to(&self) -> Option<String> {
        self.navigated.borrow().clone()
    }
}

impl Default for ConsoleView {
    fn default() -> Self {
        Self::new()
    }
}

impl PageView for ConsoleView {
    fn show_countdown(&self, seconds: i64) {
        if !*self.countdown_visible.borrow() {
            return;
        }
        if *self.urgent.borrow() {
            println!("[timer] {}s left!", seconds);
        } else if seconds % 10 == 0 {
            println!("[timer] {}s left", seconds);
        }
    }

    fn set_countdown_urgent(&self, urgent: bool) {
        self.urgent.replace(urgent);
    }

    fn hide_countdown(&self) {
        self.countdown_visible.replace(false);
    }

    fn set_status(&self, status: &str) {
        println!("{}", status);
    }

    fn show_redirect_hint(&self, url: &str, seconds: i64) {
        println!("Game over. Redirecting in {} seconds, or open: {}", seconds, url);
    }

    fn update_redirect_countdown(&self, seconds: i64) {
        println!("[redirect] {}", seconds);
    }

    fn show_redirect_error(&self) {
        warn!("Game ended without a redirect target");
        println!("Game over, but the server did not say where to continue.");
    }

    fn grey_out_board(&self) {
        info!("Board disabled");
    }

    fn navigate(&self, url: &str) {
        println!("Navigating to {}", url);
        self.navigated.replace(Some(url.to_string()));
    }
}
