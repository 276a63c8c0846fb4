//! Cancelable timers driven by an injectable clock

mod clock;
mod debounce;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use debounce::Debouncer;
