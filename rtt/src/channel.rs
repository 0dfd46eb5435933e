use core::{
    ptr,
    sync::atomic::{AtomicU32, Ordering},
};

/// One RTT ring buffer, as laid out inside the control block.
///
/// The layout is a contract with the host debugger: little-endian, natural
/// alignment, `u32` control words. The producer owns `write`, the host owns
/// `read`; each side publishes its cursor with a release store and the other
/// observes it with an acquire load before touching the buffer.
#[repr(C)]
pub struct Channel {
    name: *const u8,
    buffer: *mut u8,
    size: u32,
    /// Written by the target.
    write: AtomicU32,
    /// Written by the host.
    read: AtomicU32,
    flags: AtomicU32,
}

// The raw pointers reference program-lifetime statics (or, in tests, buffers
// that outlive the channel); all shared cursor state is atomic.
unsafe impl Send for Channel {}
unsafe impl Sync for Channel {}

impl Channel {
    /// Creates a channel over `buffer`. `name` must point to a NUL-terminated
    /// string with program lifetime.
    pub const fn new(name: *const u8, buffer: *mut u8, size: u32, flags: u32) -> Self {
        Self {
            name,
            buffer,
            size,
            write: AtomicU32::new(0),
            read: AtomicU32::new(0),
            flags: AtomicU32::new(flags),
        }
    }

    /// Ring capacity in bytes. One slot is always kept free to tell a full
    /// ring from an empty one.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Channel name as a NUL-terminated C string, shown by host tools.
    pub fn name(&self) -> *const u8 {
        self.name
    }

    // `flags` is only ever modified by the host while the target is halted,
    // so a relaxed load per check is enough.
    pub(crate) fn flags(&self) -> u32 {
        self.flags.load(Ordering::Relaxed)
    }

    // The producer is the only writer of `write`; relaxed is enough to read
    // our own last publication.
    pub(crate) fn write_cursor(&self) -> u32 {
        self.write.load(Ordering::Relaxed)
    }

    pub(crate) fn read_cursor(&self, order: Ordering) -> u32 {
        self.read.load(order)
    }

    /// Publishes `write_ptr`, making every byte stored before it visible to
    /// the host.
    pub(crate) fn publish(&self, write_ptr: u32) {
        self.write.store(write_ptr, Ordering::Release);
    }

    pub(crate) fn store_byte(&self, index: u32, value: u8) {
        debug_assert!(index < self.size);
        // SAFETY: index is in bounds and the producer token guarantees no
        // other writer; the host only reads below the published cursor.
        unsafe { *self.buffer.add(index as usize) = value }
    }

    /// Copies `data` into the ring starting at `index`. The run must be
    /// contiguous; the caller splits at the wrap point.
    pub(crate) fn copy_in(&self, index: u32, data: &[u8]) {
        debug_assert!(index as usize + data.len() <= self.size as usize);
        // SAFETY: see `store_byte`; bounds are checked by the caller.
        unsafe { ptr::copy_nonoverlapping(data.as_ptr(), self.buffer.add(index as usize), data.len()) }
    }

    /// Host-side cursor update, used by tests to play the consumer role.
    #[cfg(test)]
    pub(crate) fn set_read_cursor(&self, read: u32) {
        self.read.store(read, Ordering::Release);
    }

    /// Host-side view of the producer cursor, used by tests.
    #[cfg(test)]
    pub(crate) fn host_write_cursor(&self) -> u32 {
        self.write.load(Ordering::Acquire)
    }
}
