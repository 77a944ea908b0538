pub mod countdown;
pub mod view;
pub mod widget;

pub use countdown::{CountdownFloor, CountdownSettings, RedirectCountdown, TurnCountdown};
pub use view::{ConsoleView, HeadlessView, PageView, ViewEvent};
pub use widget::{placement, BoardWidget, TextBoard};
