// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame accumulator: coalesces length-prefixed records from a byte
// stream into frames, trading latency against page density.
//
// Records arrive as a 3-byte big-endian length followed by that many
// payload bytes; a zero length is an idle marker. While the buffer is
// empty the accumulator polls for readability at the configured rate so
// the termination flag stays responsive; once data is held, a bounded
// wait decides between pulling the next record and flushing what we
// have.

use std::io::{ErrorKind, Read};
use std::mem;
use std::os::fd::AsRawFd;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder};
use nix::poll::{PollFd, PollFlags, poll};
use tracing::{debug, trace};

use ipops_core::config::PrinterSettings;
use ipops_core::error::{IpopsError, Result};
use ipops_core::shutdown;

/// Result of one accumulation round.
#[derive(Debug, PartialEq, Eq)]
pub enum Accumulated {
    /// A frame ready to print. Never discarded once begun: every flush
    /// path (threshold, idle timeout, EOF) hands the buffer over intact.
    Frame(Vec<u8>),
    /// The stream ended or termination was requested while idle.
    Terminated,
}

enum Record {
    Idle,
    Eof,
    Payload(Vec<u8>),
}

pub struct FrameAccumulator<R> {
    input: R,
    buffer: Vec<u8>,
    min_buffer_size: usize,
    data_timeout: Duration,
    polling_rate: Duration,
    stop: Arc<AtomicBool>,
}

impl<R: Read + AsRawFd> FrameAccumulator<R> {
    pub fn new(input: R, settings: &PrinterSettings, stop: Arc<AtomicBool>) -> Self {
        Self {
            input,
            buffer: Vec::with_capacity(settings.contiguous_min_buffer_size),
            min_buffer_size: settings.contiguous_min_buffer_size,
            data_timeout: settings.contiguous_data_timeout,
            polling_rate: settings.new_frame_polling_rate,
            stop,
        }
    }

    /// Block until a frame is ready or the stream is over.
    ///
    /// A record whose length prefix has been consumed is always read to
    /// completion before termination is honoured, so no partial record is
    /// ever truncated into a frame.
    pub fn accumulate(&mut self) -> Result<Accumulated> {
        loop {
            if self.buffer.is_empty() {
                loop {
                    if shutdown::requested(&self.stop) {
                        return Ok(Accumulated::Terminated);
                    }
                    if self.wait_readable(self.polling_rate)? {
                        break;
                    }
                }
            } else if !self.wait_readable(self.data_timeout)? {
                debug!(frame_len = self.buffer.len(), "idle timeout, flushing frame");
                return Ok(Accumulated::Frame(mem::take(&mut self.buffer)));
            }

            match self.read_record()? {
                Record::Idle => {
                    trace!("zero-length idle record skipped");
                }
                Record::Eof => {
                    return if self.buffer.is_empty() {
                        debug!("input stream closed");
                        Ok(Accumulated::Terminated)
                    } else {
                        debug!(
                            frame_len = self.buffer.len(),
                            "input stream closed, flushing final frame"
                        );
                        Ok(Accumulated::Frame(mem::take(&mut self.buffer)))
                    };
                }
                Record::Payload(payload) => {
                    self.buffer.extend_from_slice(&payload);
                    trace!(
                        record_len = payload.len(),
                        buffered = self.buffer.len(),
                        "record buffered"
                    );
                    if self.buffer.len() >= self.min_buffer_size {
                        return Ok(Accumulated::Frame(mem::take(&mut self.buffer)));
                    }
                }
            }
        }
    }

    /// Wait for the input to become readable, up to `timeout`.
    ///
    /// A signal interrupting the wait reports "not readable" so the
    /// caller re-checks the termination flag.
    fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        let mut fds = [PollFd::new(self.input.as_raw_fd(), PollFlags::POLLIN)];
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        match poll(&mut fds, timeout_ms) {
            Ok(n) => Ok(n > 0),
            Err(nix::errno::Errno::EINTR) => Ok(false),
            Err(e) => Err(std::io::Error::from_raw_os_error(e as i32).into()),
        }
    }

    /// Read one record. The 3-byte length field cannot represent a
    /// negative value, so the only malformed shapes left are truncations.
    fn read_record(&mut self) -> Result<Record> {
        let mut len_buf = [0u8; 3];
        let got = read_until_full(&mut self.input, &mut len_buf)?;
        if got == 0 {
            return Ok(Record::Eof);
        }
        if got < len_buf.len() {
            return Err(IpopsError::MalformedStream(
                "stream ended inside a record length".into(),
            ));
        }

        let len = BigEndian::read_u24(&len_buf) as usize;
        if len == 0 {
            return Ok(Record::Idle);
        }

        let mut payload = vec![0u8; len];
        let got = read_until_full(&mut self.input, &mut payload)?;
        if got < len {
            return Err(IpopsError::MalformedStream(format!(
                "stream ended {got} bytes into a {len}-byte record"
            )));
        }
        Ok(Record::Payload(payload))
    }
}

/// Fill `buf` from `input`, retrying short reads. Returns the number of
/// bytes obtained, which is only less than `buf.len()` at EOF.
fn read_until_full(input: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::Ordering;

    fn test_settings(min_buffer_size: usize, timeout_ms: u64) -> PrinterSettings {
        PrinterSettings {
            contiguous_min_buffer_size: min_buffer_size,
            contiguous_data_timeout: Duration::from_millis(timeout_ms),
            new_frame_polling_rate: Duration::from_millis(10),
            ..PrinterSettings::default()
        }
    }

    fn accumulator(
        reader: UnixStream,
        min_buffer_size: usize,
        timeout_ms: u64,
    ) -> FrameAccumulator<UnixStream> {
        FrameAccumulator::new(
            reader,
            &test_settings(min_buffer_size, timeout_ms),
            Arc::new(AtomicBool::new(false)),
        )
    }

    fn record(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 3];
        BigEndian::write_u24(&mut out, payload.len() as u32);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn coalesces_records_until_threshold() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 10, 5000);

        writer.write_all(&record(b"HELLO")).unwrap();
        writer.write_all(&record(b"WORLD")).unwrap();

        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"HELLOWORLD".to_vec())
        );
    }

    #[test]
    fn exact_threshold_flushes_immediately() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 10, 5000);

        writer.write_all(&record(b"0123456789")).unwrap();

        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"0123456789".to_vec())
        );
    }

    #[test]
    fn lone_idle_record_produces_no_frame() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 10, 5000);

        writer.write_all(&record(b"")).unwrap();
        drop(writer);

        assert_eq!(acc.accumulate().unwrap(), Accumulated::Terminated);
    }

    #[test]
    fn idle_record_between_payloads_is_skipped() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 10, 5000);

        writer.write_all(&record(b"HELLO")).unwrap();
        writer.write_all(&record(b"")).unwrap();
        writer.write_all(&record(b"WORLD")).unwrap();

        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"HELLOWORLD".to_vec())
        );
    }

    #[test]
    fn idle_timeout_flushes_partial_frame() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 100, 50);

        writer.write_all(&record(b"HELLO")).unwrap();
        // Writer stays open; only the timeout can flush.
        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"HELLO".to_vec())
        );
        drop(writer);
    }

    #[test]
    fn eof_flushes_partial_frame() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 100, 5000);

        writer.write_all(&record(b"HELLO")).unwrap();
        drop(writer);

        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"HELLO".to_vec())
        );
        assert_eq!(acc.accumulate().unwrap(), Accumulated::Terminated);
    }

    #[test]
    fn consecutive_frames_in_arrival_order() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 5, 5000);

        writer.write_all(&record(b"FIRST")).unwrap();
        writer.write_all(&record(b"SECOND")).unwrap();
        drop(writer);

        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"FIRST".to_vec())
        );
        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"SECOND".to_vec())
        );
        assert_eq!(acc.accumulate().unwrap(), Accumulated::Terminated);
    }

    #[test]
    fn eof_inside_length_is_malformed() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 10, 5000);

        writer.write_all(&[0x00, 0x00]).unwrap();
        drop(writer);

        assert!(matches!(
            acc.accumulate(),
            Err(IpopsError::MalformedStream(_))
        ));
    }

    #[test]
    fn eof_inside_payload_is_malformed() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 10, 5000);

        writer.write_all(&[0x00, 0x00, 0x05]).unwrap();
        writer.write_all(b"HEL").unwrap();
        drop(writer);

        assert!(matches!(
            acc.accumulate(),
            Err(IpopsError::MalformedStream(_))
        ));
    }

    #[test]
    fn termination_flag_observed_while_idle() {
        let (_writer, reader) = UnixStream::pair().unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let mut acc = FrameAccumulator::new(reader, &test_settings(10, 5000), Arc::clone(&stop));

        stop.store(true, Ordering::SeqCst);
        assert_eq!(acc.accumulate().unwrap(), Accumulated::Terminated);
    }

    #[test]
    fn record_split_across_writes_is_reassembled() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut acc = accumulator(reader, 5, 5000);

        let handle = std::thread::spawn(move || {
            writer.write_all(&[0x00, 0x00]).unwrap();
            std::thread::sleep(Duration::from_millis(20));
            writer.write_all(&[0x05]).unwrap();
            std::thread::sleep(Duration::from_millis(20));
            writer.write_all(b"HELLO").unwrap();
        });

        assert_eq!(
            acc.accumulate().unwrap(),
            Accumulated::Frame(b"HELLO".to_vec())
        );
        handle.join().unwrap();
    }
}
