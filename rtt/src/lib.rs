//! [`postform`](https://docs.rs/postform) transport over RTT.
//!
//! The target exposes a control block in RAM that an attached debugger finds
//! by scanning for its magic id, then drains log frames out of the up channel
//! without stopping the core. Log records are COBS framed, so the host can
//! resynchronize after overruns; a raw unframed writer is available for
//! byte streams that are already structured.
//!
//! NOTE when using this crate it's not possible to link against another crate
//! that defines the `_SEGGER_RTT` control block.

#![cfg_attr(not(test), no_std)]

use core::{
    cell::UnsafeCell,
    ptr,
    sync::atomic::{AtomicBool, Ordering},
};

use postform::{Logger, WriterSource};

mod channel;
mod cobs;
mod raw;

pub use channel::Channel;
pub use cobs::CobsWriter;
pub use raw::RawWriter;

/// Flag value: drop data that does not fit in the ring.
pub const NOBLOCK_TRIM: u32 = 1;
/// Flag value: busy-wait for the host instead of losing data.
pub const BLOCK_IF_FULL: u32 = 2;

// NOTE use a power of 2 for best performance
const UP_BUFFER_SIZE: usize = 1024;
const DOWN_BUFFER_SIZE: usize = 16;

const CHANNEL_NAME: &[u8] = b"postform\0";

/// Channel buffers live in `.uninit` so a warm reset does not clear pending
/// data; both cursors start at zero, so stale contents are never replayed.
#[repr(transparent)]
struct RingBuffer<const N: usize>(UnsafeCell<[u8; N]>);

// Accessed only through the channel cursors' acquire/release protocol.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

#[link_section = ".uninit.postform-rtt.UP_BUFFER"]
static UP_BUFFER: RingBuffer<UP_BUFFER_SIZE> = RingBuffer(UnsafeCell::new([0; UP_BUFFER_SIZE]));

#[link_section = ".uninit.postform-rtt.DOWN_BUFFER"]
static DOWN_BUFFER: RingBuffer<DOWN_BUFFER_SIZE> =
    RingBuffer(UnsafeCell::new([0; DOWN_BUFFER_SIZE]));

/// The shared descriptor a host debugger scans RAM for.
///
/// Layout is fixed: 16-byte id, the channel counts, then the up channels
/// followed by the down channels, contiguous.
#[repr(C)]
pub struct ControlBlock {
    id: UnsafeCell<[u8; 16]>,
    max_up_channels: u32,
    max_down_channels: u32,
    up_channel: Channel,
    down_channel: Channel,
}

// The id is written once before anything is published; channels are Sync.
unsafe impl Sync for ControlBlock {}

impl ControlBlock {
    /// Number of up (target to host) channels in the block.
    pub fn max_up_channels(&self) -> u32 {
        self.max_up_channels
    }

    /// Number of down (host to target) channels in the block.
    pub fn max_down_channels(&self) -> u32 {
        self.max_down_channels
    }

    /// The up channel carrying log frames to the host.
    pub fn up_channel(&self) -> &Channel {
        &self.up_channel
    }

    /// The down channel, reserved for host-to-target data.
    pub fn down_channel(&self) -> &Channel {
        &self.down_channel
    }
}

#[no_mangle]
static _SEGGER_RTT: ControlBlock = ControlBlock {
    // Filled in on first use, see `control_block()`.
    id: UnsafeCell::new([0; 16]),
    max_up_channels: 1,
    max_down_channels: 1,
    up_channel: Channel::new(
        CHANNEL_NAME.as_ptr(),
        UP_BUFFER.0.get().cast(),
        UP_BUFFER_SIZE as u32,
        NOBLOCK_TRIM,
    ),
    down_channel: Channel::new(
        CHANNEL_NAME.as_ptr(),
        DOWN_BUFFER.0.get().cast(),
        DOWN_BUFFER_SIZE as u32,
        NOBLOCK_TRIM,
    ),
};

static ID_WRITTEN: AtomicBool = AtomicBool::new(false);

// The id is stitched together from two halves at runtime: if the assembled
// magic existed in the load image, a host scan could lock onto the wrong
// address.
const ID_PREFIX: &[u8] = b"SEGGER";
const ID_SUFFIX: &[u8] = b" RTT\0\0\0\0\0\0";

/// The global control block, with its id stitched in if this is the first
/// use.
pub fn control_block() -> &'static ControlBlock {
    if !ID_WRITTEN.swap(true, Ordering::Relaxed) {
        let id = _SEGGER_RTT.id.get().cast::<u8>();
        // SAFETY: in-bounds writes; concurrent callers would write the same
        // bytes, and the host tolerates a partially written id (it simply
        // does not find the block yet).
        unsafe {
            ptr::copy_nonoverlapping(ID_PREFIX.as_ptr(), id, ID_PREFIX.len());
            ptr::copy_nonoverlapping(
                ID_SUFFIX.as_ptr(),
                id.add(ID_PREFIX.len()),
                ID_SUFFIX.len(),
            );
        }
    }
    &_SEGGER_RTT
}

/// The up channel of the global control block, carrying frames to the host.
pub fn up_channel() -> &'static Channel {
    control_block().up_channel()
}

/// Serializes producers of a shared channel.
///
/// Holds the single writer token: whoever exchanges it first owns the channel
/// until their writer commits. A producer that loses the exchange gets a
/// finished writer back and its record is dropped at the source, so an ISR
/// logging over a preempted thread never interleaves bytes.
pub struct Manager {
    taken: AtomicBool,
}

static MANAGER: Manager = Manager::new();

impl Manager {
    /// Creates a standalone manager, for channels outside the global control
    /// block.
    pub const fn new() -> Self {
        Self {
            taken: AtomicBool::new(false),
        }
    }

    /// The manager guarding the global control block.
    pub fn global() -> &'static Manager {
        &MANAGER
    }

    /// Attempts to start a COBS frame on `channel`; returns a finished writer
    /// if another producer currently holds the token.
    pub fn get_cobs_writer<'a>(&'a self, channel: &'a Channel) -> CobsWriter<'a> {
        if self.take_writer() {
            CobsWriter::new(self, channel)
        } else {
            CobsWriter::default()
        }
    }

    /// Attempts to start an unframed write on `channel`; returns a finished
    /// writer if another producer currently holds the token.
    pub fn get_raw_writer<'a>(&'a self, channel: &'a Channel) -> RawWriter<'a> {
        if self.take_writer() {
            RawWriter::new(self, channel)
        } else {
            RawWriter::default()
        }
    }

    fn take_writer(&self) -> bool {
        !self.taken.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn release_writer(&self) {
        self.taken.store(false, Ordering::Release);
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer source feeding COBS frames into the global up channel.
pub struct RttSource;

impl WriterSource for RttSource {
    type Writer<'a> = CobsWriter<'static> where Self: 'a;

    fn get_writer(&self) -> CobsWriter<'static> {
        Manager::global().get_cobs_writer(up_channel())
    }
}

/// Logger over the RTT COBS channel.
///
/// Declare one as a `static` and hand it to the logging macros:
///
/// ```ignore
/// static LOGGER: postform_rtt::RttLogger = postform::Logger::new(postform_rtt::RttSource);
/// postform::info!(LOGGER, "starting up");
/// ```
pub type RttLogger = Logger<RttSource>;
