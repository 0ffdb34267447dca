//! Tick source abstraction for the soft-timer layer

/// A monotonically incrementing 16-bit counter with silent wraparound.
///
/// This is the only contract the scheduler has with the timing hardware:
/// the value advances by one per fixed real-time interval and a read never
/// observes a torn value. On target the RTC soft counter implements it
/// behind a critical section; tests drive a counter by hand.
pub trait TickSource {
    /// Current counter value.
    fn ticks(&self) -> u16;
}
