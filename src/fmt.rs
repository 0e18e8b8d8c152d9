//! Internal logging macros.
//!
//! `debug!`, `warn!` and `error!` forward to `defmt` or `log` depending on
//! which feature is enabled, and expand to nothing (apart from evaluating
//! their arguments by reference) when neither is.
//!
//! Only primitives, arrays and this crate's own enums are passed to them so
//! the same call sites work with both backends.

#![allow(unused_macros)]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! debug {
            ($($arg:tt)*) => { defmt::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { defmt::warn!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { defmt::error!($($arg)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! debug {
            ($($arg:tt)*) => { log::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { log::warn!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { log::error!($($arg)*) };
        }
    } else {
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {{ $( let _ = &$x; )* }};
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {{ $( let _ = &$x; )* }};
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => {{ $( let _ = &$x; )* }};
        }
    }
}
