//! File-backed [`postform`](https://docs.rs/postform) sink for host-side use.
//!
//! Records are stored back to back as a little-endian `u32` length followed
//! by the record payload. Unlike the ring transports there is no shared
//! consumer, so no framing beyond the length prefix is needed.

use std::{
    fs::File,
    io::Write as _,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use postform::{Logger, Writer, WriterSource};

/// Errors of the persisted-log file format.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("persist IO error")]
    Io(#[from] std::io::Error),
    #[error("truncated record: expected {expected} bytes, {available} left")]
    TruncatedRecord {
        expected: usize,
        available: usize,
    },
}

/// Writer source appending length-prefixed records to a file.
pub struct FileSource {
    taken: AtomicBool,
    file: File,
}

impl FileSource {
    /// Creates (or truncates) the log file at `path`.
    pub fn create(path: &Path) -> Result<Self, Error> {
        Ok(Self {
            taken: AtomicBool::new(false),
            file: File::create(path)?,
        })
    }

    fn release(&self) {
        self.taken.store(false, Ordering::Release);
    }
}

impl WriterSource for FileSource {
    type Writer<'a> = FileWriter<'a> where Self: 'a;

    fn get_writer(&self) -> FileWriter<'_> {
        if !self.taken.swap(true, Ordering::AcqRel) {
            FileWriter {
                source: Some(self),
                record: vec![],
            }
        } else {
            FileWriter::default()
        }
    }
}

/// Buffers one record and writes it out, length first, on commit.
#[derive(Default)]
pub struct FileWriter<'a> {
    source: Option<&'a FileSource>,
    record: Vec<u8>,
}

impl FileWriter<'_> {
    fn finish(&mut self) {
        let Some(source) = self.source.take() else {
            return;
        };

        let size = self.record.len() as u32;
        // A sink that stops taking data cannot be reported through the
        // logging path itself; the record is dropped, like on a full ring.
        let mut file = &source.file;
        let _ = file
            .write_all(&size.to_le_bytes())
            .and_then(|()| file.write_all(&self.record));

        source.release();
    }
}

impl Writer for FileWriter<'_> {
    fn is_writable(&self) -> bool {
        self.source.is_some()
    }

    fn write(&mut self, data: &[u8]) {
        if self.source.is_some() {
            self.record.extend_from_slice(data);
        }
    }

    fn commit(mut self) {
        self.finish();
    }
}

impl Drop for FileWriter<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Logger writing length-prefixed binary records to a file.
pub type FileLogger = Logger<FileSource>;

/// Splits the contents of a persisted log file back into records.
pub fn read_records(mut data: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
    let mut records = vec![];

    while !data.is_empty() {
        if data.len() < 4 {
            return Err(Error::TruncatedRecord {
                expected: 4,
                available: data.len(),
            });
        }
        let (size, rest) = data.split_at(4);
        let size = u32::from_le_bytes(size.try_into().unwrap()) as usize;

        if rest.len() < size {
            return Err(Error::TruncatedRecord {
                expected: size,
                available: rest.len(),
            });
        }
        let (record, rest) = rest.split_at(size);
        records.push(record.to_vec());
        data = rest;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use postform::leb::uleb128_decode;

    postform::timestamp!(55);

    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str) -> Self {
            let mut path = std::env::temp_dir();
            path.push(format!("postform-persist-{}-{}", std::process::id(), name));
            Self(path)
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn records_round_trip_through_the_file() {
        let file = TempFile::new("round-trip");
        let source = FileSource::create(&file.0).unwrap();

        let mut writer = source.get_writer();
        writer.write(&[1, 2, 3]);
        writer.commit();

        let mut writer = source.get_writer();
        writer.write(&[]);
        writer.write(&[0xff; 300]);
        writer.commit();

        let data = std::fs::read(&file.0).unwrap();
        let records = read_records(&data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], [1, 2, 3]);
        assert_eq!(records[1], [0xff; 300]);
    }

    #[test]
    fn second_writer_is_dropped_while_the_first_is_live() {
        let file = TempFile::new("token");
        let source = FileSource::create(&file.0).unwrap();

        let mut first = source.get_writer();
        first.write(&[0xaa]);

        let mut second = source.get_writer();
        assert!(!second.is_writable());
        second.write(&[0xbb]);
        second.commit();

        first.commit();

        let data = std::fs::read(&file.0).unwrap();
        let records = read_records(&data).unwrap();
        assert_eq!(records, [[0xaa]]);
    }

    #[test]
    fn truncated_files_are_reported() {
        assert!(matches!(
            read_records(&[3, 0]),
            Err(Error::TruncatedRecord { .. })
        ));
        assert!(matches!(
            read_records(&[3, 0, 0, 0, 1]),
            Err(Error::TruncatedRecord {
                expected: 3,
                available: 1,
            })
        ));
    }

    #[test]
    fn logger_records_decode_from_the_file() {
        let file = TempFile::new("logger");
        let logger: FileLogger = Logger::new(FileSource::create(&file.0).unwrap());

        postform::info!(logger, "voltage %u", 1234u32);

        let data = std::fs::read(&file.0).unwrap();
        let records = read_records(&data).unwrap();
        assert_eq!(records.len(), 1);

        let payload = &records[0];
        let (timestamp, used) = uleb128_decode(payload).unwrap();
        assert_eq!(timestamp, 55);
        let rest = &payload[used..];
        let (_address, used) = uleb128_decode(rest).unwrap();
        let (value, used_value) = uleb128_decode(&rest[used..]).unwrap();
        assert_eq!(value, 1234);
        assert_eq!(used + used_value, rest.len());
    }
}
