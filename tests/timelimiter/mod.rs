//! Time limiter behaviour with real and paused clocks.

mod precision;
