use core::sync::atomic::Ordering;

use postform::Writer;

use crate::{channel::Channel, Manager, BLOCK_IF_FULL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Writable,
    Finished,
}

/// Frames a record with reverse-marker COBS directly inside the channel ring.
///
/// Instead of staging a block and rewriting it, the writer leaves a marker
/// slot at the start of each block and patches it with the block length once
/// the next zero (real or virtual) is known. A committed frame is a chain of
/// nonzero distance bytes and data bytes ending in a single `0x00`, so the
/// host can resynchronize at any zero after data loss.
///
/// The writer owns the producer token of its [`Manager`]; dropping it commits
/// the frame and returns the token.
pub struct CobsWriter<'a> {
    manager: Option<&'a Manager>,
    channel: Option<&'a Channel>,
    write_ptr: u32,
    marker_ptr: u32,
    frame_start: u32,
    state: State,
}

impl<'a> CobsWriter<'a> {
    pub(crate) fn new(manager: &'a Manager, channel: &'a Channel) -> Self {
        let write_ptr = channel.write_cursor();
        let mut writer = CobsWriter {
            manager: Some(manager),
            channel: Some(channel),
            write_ptr,
            marker_ptr: write_ptr,
            frame_start: write_ptr,
            state: State::Writable,
        };

        // Reserve the frame-start marker slot; it is patched with the first
        // block's length on the first zero or on commit.
        if writer.ensure_space(channel) {
            channel.store_byte(writer.write_ptr, 0);
            writer.write_ptr = writer.next_ptr(channel);
        }
        writer
    }

    fn next_ptr(&self, channel: &Channel) -> u32 {
        let mut write_ptr = self.write_ptr + 1;
        if write_ptr >= channel.size() {
            write_ptr -= channel.size();
        }
        write_ptr
    }

    fn marker_distance(&self, channel: &Channel) -> u32 {
        if self.marker_ptr > self.write_ptr {
            channel.size() - self.marker_ptr + self.write_ptr
        } else {
            self.write_ptr - self.marker_ptr
        }
    }

    /// Patches the current marker with its block length and opens a new block
    /// at the write cursor.
    fn update_marker(&mut self, channel: &Channel) {
        self.store_marker_byte(channel);

        self.marker_ptr = self.write_ptr;
        channel.store_byte(self.write_ptr, 0);
        self.write_ptr = self.next_ptr(channel);
    }

    fn store_marker_byte(&mut self, channel: &Channel) {
        channel.store_byte(self.marker_ptr, self.marker_distance(channel) as u8);
    }

    /// Makes room for one byte. Under `BlockIfFull` this publishes the
    /// cursor of the last completed block (never the half-written one, which
    /// the host must not see) and spins until the host consumes. Under
    /// `NoBlockTrim` it rolls the whole frame back and finishes the writer:
    /// a partially written frame is never published.
    fn ensure_space(&mut self, channel: &Channel) -> bool {
        let next_write_ptr = self.next_ptr(channel);
        if channel.read_cursor(Ordering::Acquire) != next_write_ptr {
            return true;
        }

        if channel.flags() == BLOCK_IF_FULL {
            channel.publish(self.marker_ptr);
            while channel.read_cursor(Ordering::Relaxed) == next_write_ptr {}
            return true;
        }

        self.write_ptr = self.frame_start;
        self.marker_ptr = self.frame_start;
        self.state = State::Finished;
        false
    }

    fn finish(&mut self) {
        let Some(manager) = self.manager.take() else {
            return;
        };

        if self.state == State::Writable {
            if let Some(channel) = self.channel {
                // Close the trailing block and terminate the frame, unless
                // the ring fills up and the frame gets trimmed instead.
                if self.ensure_space(channel) {
                    self.update_marker(channel);
                    channel.publish(self.write_ptr);
                }
            }
            self.state = State::Finished;
        }

        manager.release_writer();
    }
}

impl Writer for CobsWriter<'_> {
    fn is_writable(&self) -> bool {
        self.state == State::Writable
    }

    fn write(&mut self, data: &[u8]) {
        let Some(channel) = self.channel else {
            return;
        };

        for &byte in data {
            if self.state == State::Finished {
                return;
            }
            if !self.ensure_space(channel) {
                return;
            }

            if byte == 0 {
                self.update_marker(channel);
            } else {
                channel.store_byte(self.write_ptr, byte);
                self.write_ptr = self.next_ptr(channel);

                // A block may span at most 254 data bytes; insert a virtual
                // zero to keep every distance encodable in one byte.
                if self.marker_distance(channel) == 0xff {
                    if !self.ensure_space(channel) {
                        return;
                    }
                    self.update_marker(channel);
                }
            }
        }
    }

    fn commit(mut self) {
        self.finish();
    }
}

impl Drop for CobsWriter<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl Default for CobsWriter<'_> {
    /// An invalid writer: not attached to a channel, already finished.
    fn default() -> Self {
        CobsWriter {
            manager: None,
            channel: None,
            write_ptr: 0,
            marker_ptr: 0,
            frame_start: 0,
            state: State::Finished,
        }
    }
}
