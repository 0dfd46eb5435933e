//! A deferred-formatting logging framework that targets resource-constrained
//! devices, like microcontrollers.
//!
//! Log sites do not format text. Each format string is interned into a
//! level-keyed linker section at compile time and a log record only carries a
//! timestamp, the string's load address and the raw arguments, all LEB128
//! encoded. A host tool expands the records later against the ELF.
//!
//! Format strings are printf-style (`%s`, `%d`, `%u`, `%o`, `%x`, `%p`, `%k`
//! with `hh`/`h`/`l`/`ll` size modifiers) and are checked against the
//! argument types at compile time: a mismatch does not build.
//!
//! This crate is transport agnostic. The framed transports live in
//! `postform-rtt` (debugger-readable ring buffer) and `postform-serial`
//! (byte-oriented links); `postform-persist` writes records to a host file.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[doc(hidden)]
pub mod export;
pub mod leb;

mod args;
mod logger;
mod traits;

pub use crate::{
    args::{Argument, InternedString},
    logger::{Level, Logger},
    traits::{Writer, WriterSource},
};

/// Logs data at *debug* level.
///
/// The first argument is the logger, the second the format string, followed
/// by one argument per format specifier.
pub use postform_macros::debug;

/// Logs data at *error* level.
pub use postform_macros::error;

/// Logs data at *info* level.
pub use postform_macros::info;

/// Logs data at *warning* level.
pub use postform_macros::warning;

/// Interns a string literal into the `user` section and evaluates to the
/// [`InternedString`] referring to it.
///
/// The result is what `%k` arguments expect: only the address is ever
/// serialized, so long strings cost one pointer on the wire.
pub use postform_macros::intern;

/// Process-wide configuration shared with the host through the
/// `.postform_config` section.
#[repr(C)]
pub struct Config {
    /// Frequency of the timestamp counter in Hz, used by the host to turn
    /// timestamps into seconds.
    pub timestamp_frequency: u32,
}

/// Defines the timestamp source for all loggers in the program.
///
/// The expression is evaluated once per emitted record. It must be defined
/// exactly once in the crate graph or the program does not link.
#[macro_export]
macro_rules! timestamp {
    ($expr:expr) => {
        #[export_name = "_postform_timestamp"]
        fn __postform_timestamp() -> u64 {
            $expr
        }
    };
}

/// Declares the postform configuration of this program.
///
/// Places a [`Config`] under the `_postform_config` symbol in the
/// `.postform_config` section, where the host reads it statically. Declaring
/// it twice is a link error.
#[macro_export]
macro_rules! postform_config {
    (timestamp_frequency: $freq:expr $(,)?) => {
        #[export_name = "_postform_config"]
        #[link_section = ".postform_config"]
        #[used]
        static __POSTFORM_CONFIG: $crate::Config = $crate::Config {
            timestamp_frequency: $freq,
        };
    };
}

// This must be in the root lib.rs, otherwise it doesn't appear in the final
// binary. The host refuses to decode records from a firmware whose version
// string does not match its own.
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

#[used]
#[link_section = ".postform_version"]
static POSTFORM_VERSION: [u8; VERSION.len()] = export::to_byte_array(VERSION);
