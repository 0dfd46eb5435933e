use core::sync::atomic::{AtomicU8, Ordering};

use crate::{
    export, leb,
    traits::{Writer, WriterSource},
    Argument, InternedString,
};

/// Severity of a log record.
///
/// `Off` is only meaningful as a filter level; no record carries it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// Verbose diagnostics.
    Debug = 0,
    /// Regular operation.
    Info = 1,
    /// Unexpected but recoverable conditions.
    Warning = 2,
    /// Failures.
    Error = 3,
    /// Filter level that suppresses all records.
    Off = 4,
}

/// Transport-generic logger front end.
///
/// Filters by level, stamps each record with the collaborator timestamp and
/// the interned format-string address, then serializes the arguments through
/// a writer acquired from the source. If another producer holds the writer
/// token the record is dropped silently.
pub struct Logger<S> {
    level: AtomicU8,
    source: S,
}

impl<S: WriterSource> Logger<S> {
    /// Creates a logger over `source`, initially logging everything.
    pub const fn new(source: S) -> Self {
        Self {
            level: AtomicU8::new(Level::Debug as u8),
            source,
        }
    }

    /// Sets the minimum level that produces output.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// Emits one record. Called through the logging macros, which supply the
    /// interned string and the type-checked argument carriers.
    pub fn log(&self, level: Level, message: InternedString, args: &[Argument<'_>]) {
        if (level as u8) < self.level.load(Ordering::Relaxed) {
            return;
        }

        let timestamp = export::timestamp();
        let mut writer = self.source.get_writer();
        if !writer.is_writable() {
            return;
        }

        write_uleb128(&mut writer, timestamp);
        write_uleb128(&mut writer, message.address() as u64);
        for arg in args {
            match *arg {
                Argument::SignedInt(value) => write_sleb128(&mut writer, value),
                Argument::UnsignedInt(value) => write_uleb128(&mut writer, value),
                Argument::Str(string) => {
                    // A `&str` may embed NUL, which the NUL-delimited wire
                    // format cannot carry: everything past it would be read
                    // as the following arguments. The string ends at the
                    // first NUL either way.
                    let bytes = string.as_bytes();
                    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                    writer.write(&bytes[..len]);
                    writer.write(&[0]);
                }
                Argument::Pointer(address) => write_uleb128(&mut writer, address as u64),
                Argument::Interned(interned) => {
                    write_uleb128(&mut writer, interned.address() as u64)
                }
            }
        }
        writer.commit();
    }
}

fn write_uleb128(writer: &mut impl Writer, value: u64) {
    let mut buf = [0; leb::MAX_LEN];
    let len = leb::uleb128_encode(value, &mut buf);
    writer.write(&buf[..len]);
}

fn write_sleb128(writer: &mut impl Writer, value: i64) {
    let mut buf = [0; leb::MAX_LEN];
    let len = leb::sleb128_encode(value, &mut buf);
    writer.write(&buf[..len]);
}
