//! Command log reader.
//!
//! [`CommandLogReader`] reads command records from any `Read` source with
//! one record of lookahead: after the header (and after every record) it
//! reads the frame number of the next record, so callers can ask whether
//! the next command belongs to the current frame before decoding it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use genrep_core::MAX_SLOTS;

use crate::codec::{decode_command_body, decode_frame_number, decode_header};
use crate::error::ReplayError;
use crate::types::{CommandRecord, ReplayHeader};

/// Reads a command log from a byte stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`.
pub struct CommandLogReader<R: Read> {
    reader: R,
    header: ReplayHeader,
    next_frame: Option<u32>,
    records_read: u64,
}

impl<R: Read> CommandLogReader<R> {
    /// Open a command log, validating the header and priming the lookahead.
    ///
    /// Fails if the magic tag is wrong, the header is malformed, or the
    /// recorded local player slot is outside `-1..MAX_SLOTS`.
    pub fn open(mut reader: R) -> Result<Self, ReplayError> {
        let header = decode_header(&mut reader)?;
        validate_local_slot(&header)?;
        let mut log = Self {
            reader,
            header,
            next_frame: None,
            records_read: 0,
        };
        log.advance();
        Ok(log)
    }

    /// The header read when the log was opened.
    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    /// Frame number of the next record, or `None` once the log is exhausted.
    pub fn peek_frame(&self) -> Option<u32> {
        self.next_frame
    }

    /// Whether every record has been consumed.
    pub fn is_finished(&self) -> bool {
        self.next_frame.is_none()
    }

    /// Number of records decoded so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Decode the next record and refill the lookahead.
    ///
    /// Returns `Ok(None)` once the log is exhausted. If the stream ends
    /// inside a record, returns [`ReplayError::Truncated`] and the reader
    /// is finished.
    pub fn next_record(&mut self) -> Result<Option<CommandRecord>, ReplayError> {
        let Some(frame) = self.next_frame.take() else {
            return Ok(None);
        };
        let command = decode_command_body(&mut self.reader)?;
        self.records_read += 1;
        self.advance();
        Ok(Some(CommandRecord { frame, command }))
    }

    /// Convert into an iterator over the remaining records.
    pub fn records(self) -> RecordIter<R> {
        RecordIter {
            log: self,
            done: false,
        }
    }

    /// Read the next frame number into the lookahead.
    ///
    /// A short read here is an ordinary end of log.
    fn advance(&mut self) {
        self.next_frame = match decode_frame_number(&mut self.reader) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, records = self.records_read, "command log ended early");
                None
            }
        };
    }
}

impl CommandLogReader<BufReader<File>> {
    /// Open a command log on disk.
    pub fn open_file(path: &Path) -> Result<Self, ReplayError> {
        Self::open(BufReader::new(open(path)?))
    }
}

/// Read only the header of the replay at `path`.
pub fn read_header(path: &Path) -> Result<ReplayHeader, ReplayError> {
    let mut reader = BufReader::new(open(path)?);
    let header = decode_header(&mut reader)?;
    validate_local_slot(&header)?;
    Ok(header)
}

fn open(path: &Path) -> Result<File, ReplayError> {
    File::open(path).map_err(|source| ReplayError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_local_slot(header: &ReplayHeader) -> Result<(), ReplayError> {
    let index = header.local_player_index;
    if index < -1 || index >= MAX_SLOTS as i32 {
        return Err(ReplayError::InvalidLocalSlot { index });
    }
    Ok(())
}

/// Iterator adapter over command records.
pub struct RecordIter<R: Read> {
    log: CommandLogReader<R>,
    done: bool,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<CommandRecord, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.log.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
