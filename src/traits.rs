/// A framed record writer obtained from a [`WriterSource`].
///
/// A writer is either *writable* or *finished*. Default-constructed and
/// failed-acquisition writers start out finished; `write` and `commit` on a
/// finished writer are no-ops. Dropping a writable writer commits it, so a
/// record is finalized exactly once even on early returns.
pub trait Writer {
    /// `false` once the writer has finished (or never was writable).
    fn is_writable(&self) -> bool;

    /// Appends `data` to the current record.
    fn write(&mut self, data: &[u8]);

    /// Finalizes the record and releases the producer token.
    fn commit(self);
}

/// Source of writers for a transport.
///
/// Implementations hold the producer-serializing token: `get_writer` hands
/// out at most one writable writer at a time and a finished writer otherwise,
/// so concurrent producers are either serialized or dropped at acquisition.
pub trait WriterSource {
    /// The writer type for this transport; it may borrow the source.
    type Writer<'a>: Writer
    where
        Self: 'a;

    /// Attempts to take the producer token.
    fn get_writer(&self) -> Self::Writer<'_>;
}
