/// Handle to a string interned in one of the `.interned_strings.*` linker
/// sections.
///
/// Only the load address travels on the wire; the host recovers the contents
/// from the ELF. Values are created by the logging macros and by
/// [`intern!`](crate::intern), never constructed from arbitrary pointers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InternedString {
    ptr: *const u8,
}

impl InternedString {
    /// Creates a handle from a section-placed static.
    pub const fn new(bytes: &'static [u8]) -> Self {
        Self {
            ptr: bytes.as_ptr(),
        }
    }

    /// The load address serialized on the wire.
    pub fn address(self) -> usize {
        self.ptr as usize
    }
}

// The pointee is an immutable static with program lifetime.
unsafe impl Send for InternedString {}
unsafe impl Sync for InternedString {}

/// Tagged carrier used to funnel every log argument through a single
/// serialization path.
///
/// Integers are widened to 64 bits at the call site; the original width is a
/// compile-time contract between the format string and the argument type and
/// is not recoverable from the carrier.
#[derive(Clone, Copy, Debug)]
pub enum Argument<'a> {
    /// A sign-extended signed integer, emitted as SLEB128.
    SignedInt(i64),
    /// A zero-extended unsigned integer, emitted as ULEB128.
    UnsignedInt(u64),
    /// A string emitted inline, bytes followed by a NUL terminator.
    Str(&'a str),
    /// An opaque pointer, emitted as the ULEB128 of its address.
    Pointer(usize),
    /// An interned string, emitted as the ULEB128 of its section address.
    Interned(InternedString),
}
