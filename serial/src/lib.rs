//! [`postform`](https://docs.rs/postform) transport over byte-oriented links.
//!
//! Unlike the RTT ring, a serial sink offers no random access, so frames are
//! reverse-COBS encoded on the fly: each zero byte is replaced by the count
//! of bytes since the previous zero, and the frame ends with the final count
//! and a terminating zero. The decoder walks the frame backwards from the
//! terminator.

#![cfg_attr(not(test), no_std)]

use core::{
    cell::UnsafeCell,
    sync::atomic::{AtomicBool, Ordering},
};

use postform::{Logger, Writer, WriterSource};

/// An opaque byte sink: a UART, a socket, a file.
///
/// `write` must not fail; a lossy link is fine (the framing resynchronizes),
/// a blocking one too. `commit` marks the end of a frame for sinks that care
/// about flushing.
pub trait SerialTransport {
    /// Pushes one byte into the sink.
    fn write(&mut self, byte: u8);

    /// Flushes the frame written so far.
    fn commit(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Writable,
    Finished,
}

/// Frames one record with reverse-COBS over a [`SerialTransport`].
///
/// Obtained from [`SerialSource::get_writer`]; holds the source's producer
/// token until commit (explicit or on drop). A default-constructed writer is
/// finished and writes nothing.
pub struct SerialWriter<'a, T: SerialTransport> {
    source: Option<&'a SerialSource<T>>,
    transport: Option<&'a mut T>,
    /// Bytes since the last zero, plus one; emitted in place of each zero.
    marker: u8,
    state: State,
}

impl<'a, T: SerialTransport> SerialWriter<'a, T> {
    fn emit_marker(&mut self) {
        let marker = self.marker;
        if let Some(transport) = self.transport.as_deref_mut() {
            transport.write(marker);
        }
        self.marker = 1;
    }

    fn finish(&mut self) {
        if self.state != State::Writable {
            self.source = None;
            self.transport = None;
            return;
        }
        self.state = State::Finished;

        self.emit_marker();
        if let Some(transport) = self.transport.take() {
            transport.write(0);
            transport.commit();
        }
        if let Some(source) = self.source.take() {
            source.release();
        }
    }
}

impl<T: SerialTransport> Writer for SerialWriter<'_, T> {
    fn is_writable(&self) -> bool {
        self.state == State::Writable
    }

    fn write(&mut self, data: &[u8]) {
        if self.state != State::Writable {
            return;
        }

        for &byte in data {
            if self.marker == 255 {
                // Virtual zero, keeps the running count in one byte.
                self.emit_marker();
            }

            if byte == 0 {
                self.emit_marker();
            } else {
                if let Some(transport) = self.transport.as_deref_mut() {
                    transport.write(byte);
                }
                self.marker += 1;
            }
        }
    }

    fn commit(mut self) {
        self.finish();
    }
}

impl<T: SerialTransport> Drop for SerialWriter<'_, T> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl<T: SerialTransport> Default for SerialWriter<'_, T> {
    /// An invalid writer: not attached to a transport, already finished.
    fn default() -> Self {
        SerialWriter {
            source: None,
            transport: None,
            marker: 1,
            state: State::Finished,
        }
    }
}

/// Owns a [`SerialTransport`] and the token serializing its producers.
pub struct SerialSource<T: SerialTransport> {
    taken: AtomicBool,
    transport: UnsafeCell<T>,
}

// The transport is only ever reached through the token.
unsafe impl<T: SerialTransport + Send> Sync for SerialSource<T> {}

impl<T: SerialTransport> SerialSource<T> {
    /// Wraps `transport` as a writer source.
    pub const fn new(transport: T) -> Self {
        Self {
            taken: AtomicBool::new(false),
            transport: UnsafeCell::new(transport),
        }
    }

    fn release(&self) {
        self.taken.store(false, Ordering::Release);
    }
}

impl<T: SerialTransport> WriterSource for SerialSource<T> {
    type Writer<'a> = SerialWriter<'a, T> where Self: 'a;

    fn get_writer(&self) -> SerialWriter<'_, T> {
        if !self.taken.swap(true, Ordering::AcqRel) {
            SerialWriter {
                source: Some(self),
                // SAFETY: the token was just taken, so until `release` this
                // is the only live reference to the transport.
                transport: Some(unsafe { &mut *self.transport.get() }),
                marker: 1,
                state: State::Writable,
            }
        } else {
            SerialWriter::default()
        }
    }
}

/// Logger over a serial byte sink.
pub type SerialLogger<T> = Logger<SerialSource<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    postform::timestamp!(0xbeef);

    /// Records every sink call, standing in for a UART.
    #[derive(Default)]
    struct MockTransport {
        bytes: Rc<RefCell<Vec<u8>>>,
        commits: Rc<RefCell<usize>>,
    }

    impl SerialTransport for MockTransport {
        fn write(&mut self, byte: u8) {
            self.bytes.borrow_mut().push(byte);
        }

        fn commit(&mut self) {
            *self.commits.borrow_mut() += 1;
        }
    }

    struct Fixture {
        source: SerialSource<MockTransport>,
        bytes: Rc<RefCell<Vec<u8>>>,
        commits: Rc<RefCell<usize>>,
    }

    impl Fixture {
        fn new() -> Self {
            let transport = MockTransport::default();
            let bytes = transport.bytes.clone();
            let commits = transport.commits.clone();
            Self {
                source: SerialSource::new(transport),
                bytes,
                commits,
            }
        }

        fn bytes(&self) -> Vec<u8> {
            self.bytes.borrow().clone()
        }

        fn commits(&self) -> usize {
            *self.commits.borrow()
        }
    }

    #[test]
    fn empty_frame_is_marker_and_terminator() {
        let fixture = Fixture::new();
        let writer = fixture.source.get_writer();
        assert!(writer.is_writable());
        writer.commit();

        assert_eq!(fixture.bytes(), [1, 0]);
        assert_eq!(fixture.commits(), 1);
    }

    #[test]
    fn cannot_obtain_two_writable_writers() {
        let fixture = Fixture::new();
        let first = fixture.source.get_writer();
        assert!(first.is_writable());

        let second = fixture.source.get_writer();
        assert!(!second.is_writable());
        drop(second);

        // The loser must not have emitted anything or released the token.
        assert!(fixture.bytes().is_empty());
        assert!(first.is_writable());
    }

    #[test]
    fn commit_releases_the_writer_for_reuse() {
        let fixture = Fixture::new();
        fixture.source.get_writer().commit();
        assert_eq!(fixture.commits(), 1);

        let again = fixture.source.get_writer();
        assert!(again.is_writable());
        again.commit();
        assert_eq!(fixture.commits(), 2);
    }

    #[test]
    fn dropping_a_writable_writer_commits() {
        let fixture = Fixture::new();
        {
            let mut writer = fixture.source.get_writer();
            writer.write(&[123]);
        }
        assert_eq!(fixture.bytes(), [123, 2, 0]);
        assert_eq!(fixture.commits(), 1);
    }

    #[test]
    fn default_writer_is_not_valid() {
        let mut writer = SerialWriter::<MockTransport>::default();
        assert!(!writer.is_writable());
        writer.write(&[123, 213, 231]);
        writer.commit();
    }

    #[test]
    fn nonzero_bytes_pass_through_with_a_running_count() {
        let fixture = Fixture::new();
        let mut writer = fixture.source.get_writer();
        writer.write(&[123, 213, 231]);
        writer.commit();

        assert_eq!(fixture.bytes(), [123, 213, 231, 4, 0]);
    }

    #[test]
    fn zeros_are_replaced_by_the_count() {
        let fixture = Fixture::new();
        let mut writer = fixture.source.get_writer();
        writer.write(&[123, 213, 0, 231]);
        writer.commit();

        assert_eq!(fixture.bytes(), [123, 213, 3, 231, 2, 0]);
    }

    #[test]
    fn virtual_zero_after_254_nonzero_bytes() {
        let fixture = Fixture::new();
        let mut writer = fixture.source.get_writer();
        writer.write(&[123, 213, 0, 231]);
        assert_eq!(fixture.bytes(), [123, 213, 3, 231]);

        writer.write(&[0]);
        assert_eq!(fixture.bytes(), [123, 213, 3, 231, 2]);

        for _ in 0..254 {
            writer.write(&[1]);
        }
        let mut expected = vec![123, 213, 3, 231, 2];
        expected.extend([1; 254]);
        assert_eq!(fixture.bytes(), expected);

        // The 255th byte since the marker forces a virtual zero first.
        writer.write(&[1]);
        expected.extend([255, 1]);
        assert_eq!(fixture.bytes(), expected);

        writer.commit();
        expected.extend([2, 0]);
        assert_eq!(fixture.bytes(), expected);
    }

    #[test]
    fn log_records_frame_through_the_serial_logger() {
        use postform::leb::uleb128_decode;

        let transport = MockTransport::default();
        let bytes = transport.bytes.clone();
        let logger: SerialLogger<MockTransport> = Logger::new(SerialSource::new(transport));

        postform::info!(logger, "%u bottles", 99u32);

        let frame = bytes.borrow().clone();
        let (&terminator, body) = frame.split_last().unwrap();
        assert_eq!(terminator, 0);
        assert!(body.iter().all(|&b| b != 0));

        // Reverse-COBS: walking the markers backwards from the final count
        // recovers the payload.
        let payload = rcobs_decode(body);
        let (timestamp, used) = uleb128_decode(&payload).unwrap();
        assert_eq!(timestamp, 0xbeef);
        let rest = &payload[used..];
        let (_address, used) = uleb128_decode(rest).unwrap();
        assert_eq!(&rest[used..], [99]);
    }

    /// Undoes reverse-COBS (frame body without the trailing zero), walking
    /// the markers backwards from the final count. The trailing marker and
    /// virtual markers (255) stand for no byte; every other marker stood
    /// where a zero was.
    fn rcobs_decode(body: &[u8]) -> Vec<u8> {
        let mut out = vec![];
        let mut end = body.len();
        let mut trailing = true;

        while end > 0 {
            let marker = body[end - 1] as usize;
            assert!(marker >= 1);
            let block = &body[end - marker..end - 1];

            if !trailing && marker < 255 {
                out.push(0);
            }
            trailing = false;

            out.extend(block.iter().rev());
            end -= marker;
        }

        out.reverse();
        out
    }
}
