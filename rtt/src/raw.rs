use core::sync::atomic::Ordering;

use postform::Writer;

use crate::{channel::Channel, Manager, BLOCK_IF_FULL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Writable,
    Finished,
}

/// Unframed ring producer, for byte streams that carry their own structure.
///
/// Bytes are copied into the channel as-is in maximal contiguous runs.
/// Record boundaries are known only to the producer; a host that attaches
/// mid-stream sees an arbitrary suffix.
pub struct RawWriter<'a> {
    manager: Option<&'a Manager>,
    channel: Option<&'a Channel>,
    write_ptr: u32,
    state: State,
}

impl<'a> RawWriter<'a> {
    pub(crate) fn new(manager: &'a Manager, channel: &'a Channel) -> Self {
        RawWriter {
            manager: Some(manager),
            channel: Some(channel),
            write_ptr: channel.write_cursor(),
            state: State::Writable,
        }
    }

    /// Free bytes reachable without wrapping, keeping the one-slot sentinel
    /// that separates a full ring from an empty one.
    fn max_contiguous(&self, channel: &Channel) -> u32 {
        let read = channel.read_cursor(Ordering::Relaxed);
        let size = channel.size();

        if read == 0 {
            size - self.write_ptr - 1
        } else if read > self.write_ptr {
            read - self.write_ptr - 1
        } else {
            size - self.write_ptr
        }
    }

    fn finish(&mut self) {
        let Some(manager) = self.manager.take() else {
            return;
        };

        if self.state == State::Writable {
            if let Some(channel) = self.channel {
                channel.publish(self.write_ptr);
            }
            self.state = State::Finished;
        }

        manager.release_writer();
    }
}

impl Writer for RawWriter<'_> {
    fn is_writable(&self) -> bool {
        self.state == State::Writable
    }

    fn write(&mut self, data: &[u8]) {
        let Some(channel) = self.channel else {
            return;
        };
        if self.state == State::Finished {
            return;
        }

        let mut data = data;
        while !data.is_empty() {
            let max_contiguous = self.max_contiguous(channel) as usize;
            let count = data.len().min(max_contiguous);

            if count == 0 {
                // Expose what we have so the host can drain the ring, then
                // either wait for it or drop the tail.
                channel.publish(self.write_ptr);
                if channel.flags() == BLOCK_IF_FULL {
                    continue;
                }
                self.state = State::Finished;
                return;
            }

            channel.copy_in(self.write_ptr, &data[..count]);
            data = &data[count..];

            self.write_ptr += count as u32;
            if self.write_ptr >= channel.size() {
                self.write_ptr = 0;
            }
        }
    }

    fn commit(mut self) {
        self.finish();
    }
}

impl Drop for RawWriter<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl Default for RawWriter<'_> {
    /// An invalid writer: not attached to a channel, already finished.
    fn default() -> Self {
        RawWriter {
            manager: None,
            channel: None,
            write_ptr: 0,
            state: State::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::RingHarness;
    use crate::NOBLOCK_TRIM;
    use postform::Writer as _;

    #[test]
    fn bytes_are_published_verbatim_on_commit() {
        let harness = RingHarness::new(64, NOBLOCK_TRIM);
        let mut writer = harness.manager.get_raw_writer(&harness.channel);
        writer.write(&[0x00, 0x01, 0x02, 0x03]);

        // Nothing is visible before the commit.
        assert_eq!(harness.channel.write_cursor(), 0);
        writer.commit();
        assert_eq!(harness.published(), [0x00, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn writes_wrap_across_the_ring_edge() {
        let harness = RingHarness::new(16, NOBLOCK_TRIM);
        {
            let mut writer = harness.manager.get_raw_writer(&harness.channel);
            writer.write(&[0x11; 12]);
            writer.commit();
        }
        harness.channel.set_read_cursor(12);

        let mut writer = harness.manager.get_raw_writer(&harness.channel);
        writer.write(&[1, 2, 3, 4, 5, 6, 7, 8]);
        writer.commit();
        assert_eq!(harness.published(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn trim_drops_the_tail_and_keeps_the_head() {
        let harness = RingHarness::new(8, NOBLOCK_TRIM);
        let mut writer = harness.manager.get_raw_writer(&harness.channel);
        writer.write(&[0xaa; 10]);
        assert!(!writer.is_writable());
        writer.commit();

        // 7 bytes fit (one slot is the sentinel); the rest was dropped.
        assert_eq!(harness.published(), [0xaa; 7]);

        // The token was returned even though the writer trimmed.
        assert!(harness.manager.get_raw_writer(&harness.channel).is_writable());
    }

    #[test]
    fn blocking_writer_waits_for_the_host() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let harness = RingHarness::new(8, BLOCK_IF_FULL);
        let done = AtomicBool::new(false);
        let payload: Vec<u8> = (1..=20).collect();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let mut writer = harness.manager.get_raw_writer(&harness.channel);
                writer.write(&payload);
                writer.commit();
                done.store(true, Ordering::Release);
            });

            let mut consumed = vec![];
            while !done.load(Ordering::Acquire) {
                consumed.extend(harness.consume_all());
                std::thread::yield_now();
            }
            consumed.extend(harness.consume_all());
            assert_eq!(consumed, payload);
        });
    }

    #[test]
    fn default_writer_is_finished() {
        let mut writer = RawWriter::default();
        assert!(!writer.is_writable());
        writer.write(&[1, 2, 3]);
        writer.commit();
    }
}
