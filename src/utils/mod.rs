pub(crate) mod clock;
pub(crate) mod date;

pub(crate) use clock::{Clock, SystemClock};
pub(crate) use date::parse_timestamp;

#[cfg(test)]
pub(crate) use clock::FakeClock;
