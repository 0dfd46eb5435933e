/// Integer width selected by a size modifier.
///
/// The modifiers bind to fixed widths: the embedded targets postform runs on
/// use 32-bit `int` and `long`, so both the empty modifier and `l` select a
/// 32-bit argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    /// `hh`, an 8-bit integer.
    Char,
    /// `h`, a 16-bit integer.
    Short,
    /// No modifier, a 32-bit integer.
    Default,
    /// `l`, a 32-bit integer.
    Long,
    /// `ll`, a 64-bit integer.
    LongLong,
}

impl Width {
    /// Number of bits of the argument type this width matches.
    pub const fn bits(self) -> u32 {
        match self {
            Width::Char => 8,
            Width::Short => 16,
            Width::Default | Width::Long => 32,
            Width::LongLong => 64,
        }
    }
}

/// Argument type selected by a conversion specifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    /// `%s`, a string emitted inline with its NUL terminator.
    Str,
    /// `%d` / `%i`, a signed integer of the given width.
    Signed(Width),
    /// `%u`, an unsigned integer of the given width.
    Unsigned(Width),
    /// `%o`, an integer of the given width, either signedness.
    Octal(Width),
    /// `%x`, an integer of the given width, either signedness.
    Hex(Width),
    /// `%p`, a pointer rendered by its address.
    Pointer,
    /// `%k`, an interned string referenced by its section address.
    Interned,
}
