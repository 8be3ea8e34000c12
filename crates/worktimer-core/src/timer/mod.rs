mod clock;
pub mod idle;
mod machine;
pub mod policy;
mod service;
mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use idle::{IdleMonitor, IdleSignal, ManualIdleSignal, NeverIdle, IDLE_THRESHOLD_SECS};
pub use machine::{SessionInfo, TimerState, TimerStateMachine};
pub use policy::{CapAndReminderPolicy, PolicyAction, HARD_CAP_SECS, REMINDER_INTERVAL_SECS};
pub use service::{TimerService, TICK_PERIOD};
pub use ticker::{TickFlow, Ticker};
