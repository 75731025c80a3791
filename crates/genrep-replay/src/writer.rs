//! Command log writer.
//!
//! [`CommandLogWriter`] streams frame-stamped command records to any
//! `Write + Seek` sink. The header is written on construction with
//! placeholder values in its patchable prefix; those values are filled in
//! later by seeking back, overwriting, and returning to the end of the log.

use std::io::{Seek, SeekFrom, Write};

use genrep_core::{Command, MAX_SLOTS};

use crate::codec::{
    encode_header, encode_record, DESYNC_OFFSET, DISCONNECT_OFFSET, END_TIME_OFFSET,
    FRAME_COUNT_OFFSET, QUIT_EARLY_OFFSET, START_TIME_OFFSET,
};
use crate::error::ReplayError;
use crate::types::ReplayHeader;

/// Writes a command log to a seekable byte stream.
///
/// Generic over `W: Write + Seek` so tests can use `Cursor<Vec<u8>>` and
/// production code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use genrep_core::{ArgValue, Command, CommandType};
/// use genrep_replay::{CommandLogReader, CommandLogWriter, ReplayHeader};
///
/// let header = ReplayHeader {
///     replay_name: "Last Replay".into(),
///     ..ReplayHeader::default()
/// };
///
/// let mut writer = CommandLogWriter::create(Cursor::new(Vec::new()), &header).unwrap();
/// writer.log_game_start(1_000).unwrap();
/// let cmd = Command::new(CommandType(1001), 0).with_arg(ArgValue::Integer(1));
/// writer.write_record(0, &cmd).unwrap();
/// let buf = writer.finish(1_060, 1).unwrap().into_inner();
///
/// let mut reader = CommandLogReader::open(buf.as_slice()).unwrap();
/// assert_eq!(reader.header().start_time, 1_000);
/// assert_eq!(reader.header().frame_count, 1);
/// let record = reader.next_record().unwrap().unwrap();
/// assert_eq!(record.command, cmd);
/// assert!(reader.next_record().unwrap().is_none());
/// ```
pub struct CommandLogWriter<W: Write + Seek> {
    writer: W,
    records_written: u64,
    last_frame: Option<u32>,
}

impl<W: Write + Seek> CommandLogWriter<W> {
    /// Create a writer, immediately writing the header with every
    /// patchable field set to its placeholder.
    pub fn create(mut writer: W, header: &ReplayHeader) -> Result<Self, ReplayError> {
        encode_header(&mut writer, &header.with_placeholders())?;
        Ok(Self {
            writer,
            records_written: 0,
            last_frame: None,
        })
    }

    /// Append one command record stamped with `frame`.
    ///
    /// Frames must not decrease across the log; an earlier frame than the
    /// last one written is rejected with [`ReplayError::FrameOutOfOrder`]
    /// and nothing is written.
    pub fn write_record(&mut self, frame: u32, command: &Command) -> Result<(), ReplayError> {
        if let Some(last) = self.last_frame.filter(|&last| frame < last) {
            return Err(ReplayError::FrameOutOfOrder { last, frame });
        }
        encode_record(&mut self.writer, frame, command)?;
        self.records_written += 1;
        self.last_frame = Some(frame);
        tracing::trace!(frame, command_type = %command.command_type, "recorded command");
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Patch the session start time.
    pub fn log_game_start(&mut self, start_time: u32) -> Result<(), ReplayError> {
        self.patch(START_TIME_OFFSET, &start_time.to_le_bytes())
    }

    /// Mark `slot` as disconnected. Slots outside `0..MAX_SLOTS` are ignored.
    pub fn log_player_disconnect(&mut self, slot: usize) -> Result<(), ReplayError> {
        if slot >= MAX_SLOTS {
            tracing::warn!(slot, "ignoring disconnect for out-of-range slot");
            return Ok(());
        }
        self.patch(DISCONNECT_OFFSET + slot as u64, &[1])
    }

    /// Mark the session as desynchronized.
    pub fn log_crc_mismatch(&mut self) -> Result<(), ReplayError> {
        self.patch(DESYNC_OFFSET, &[1])
    }

    /// Mark the local player as having quit early.
    pub fn log_quit_early(&mut self) -> Result<(), ReplayError> {
        self.patch(QUIT_EARLY_OFFSET, &[1])
    }

    /// Patch the end time and frame count, flush, and return the sink.
    pub fn finish(mut self, end_time: u32, frame_count: u32) -> Result<W, ReplayError> {
        self.patch(END_TIME_OFFSET, &end_time.to_le_bytes())?;
        self.patch(FRAME_COUNT_OFFSET, &frame_count.to_le_bytes())?;
        self.writer.flush()?;
        tracing::debug!(
            records = self.records_written,
            frame_count,
            "command log finished"
        );
        Ok(self.writer)
    }

    /// Overwrite `bytes` at `offset`, then return to the end of the log.
    fn patch(&mut self, offset: u64, bytes: &[u8]) -> Result<(), ReplayError> {
        let end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(offset))?;
        self.writer.write_all(bytes)?;
        self.writer.seek(SeekFrom::Start(end))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use genrep_core::{ArgValue, CommandType, ObjectId};

    use crate::codec::{decode_header, FIXED_PREFIX_LEN};

    fn header() -> ReplayHeader {
        ReplayHeader {
            replay_name: "Last Replay".into(),
            version_string: "1.0".into(),
            slot_config: "S=H:Alice,C;".into(),
            local_player_index: 0,
            difficulty: 1,
            original_game_mode: 2,
            max_fps: 30,
            ..ReplayHeader::default()
        }
    }

    fn new_writer() -> CommandLogWriter<Cursor<Vec<u8>>> {
        CommandLogWriter::create(Cursor::new(Vec::new()), &header()).unwrap()
    }

    #[test]
    fn header_is_written_with_placeholders() {
        let with_values = ReplayHeader {
            start_time: 5,
            frame_count: 9,
            desync: true,
            ..header()
        };
        let writer = CommandLogWriter::create(Cursor::new(Vec::new()), &with_values).unwrap();
        let buf = writer.writer.into_inner();
        assert!(buf[6..FIXED_PREFIX_LEN as usize].iter().all(|&b| b == 0));
        let decoded = decode_header(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, header());
    }

    #[test]
    fn patches_return_to_end_of_log() {
        let mut writer = new_writer();
        let cmd = Command::new(CommandType(1001), 0).with_arg(ArgValue::Integer(7));
        writer.write_record(0, &cmd).unwrap();
        let end = writer.writer.position();

        writer.log_crc_mismatch().unwrap();
        writer.log_player_disconnect(3).unwrap();
        assert_eq!(writer.writer.position(), end);

        writer.write_record(1, &cmd).unwrap();
        assert_eq!(writer.records_written(), 2);
        assert!(writer.writer.position() > end);
    }

    #[test]
    fn patch_then_read_back() {
        let mut writer = new_writer();
        writer.log_game_start(1_000).unwrap();
        writer
            .write_record(
                4,
                &Command::new(CommandType(1050), 1).with_arg(ArgValue::ObjectId(ObjectId(2))),
            )
            .unwrap();
        writer.log_player_disconnect(1).unwrap();
        writer.log_player_disconnect(7).unwrap();
        writer.log_quit_early().unwrap();
        let buf = writer.finish(1_090, 4).unwrap().into_inner();

        let decoded = decode_header(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded.start_time, 1_000);
        assert_eq!(decoded.end_time, 1_090);
        assert_eq!(decoded.frame_count, 4);
        assert!(!decoded.desync);
        assert!(decoded.quit_early);
        assert_eq!(
            decoded.player_disconnects,
            [false, true, false, false, false, false, false, true]
        );
        // Everything outside the patchable prefix is untouched.
        let expected = ReplayHeader {
            start_time: 1_000,
            end_time: 1_090,
            frame_count: 4,
            quit_early: true,
            player_disconnects: decoded.player_disconnects,
            ..header()
        };
        assert_eq!(decoded, expected);
    }

    #[test]
    fn flag_patch_changes_exactly_one_byte() {
        let mut writer = new_writer();
        let before = writer.writer.get_ref().clone();
        writer.log_player_disconnect(2).unwrap();
        let after = writer.writer.get_ref().clone();
        let changed: Vec<usize> = before
            .iter()
            .zip(&after)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(changed, vec![DISCONNECT_OFFSET as usize + 2]);
    }

    #[test]
    fn earlier_frame_is_rejected() {
        let mut writer = new_writer();
        let cmd = Command::new(CommandType(1001), 0).with_arg(ArgValue::Integer(7));
        writer.write_record(10, &cmd).unwrap();
        writer.write_record(10, &cmd).unwrap();
        let end = writer.writer.position();

        let err = writer.write_record(3, &cmd).unwrap_err();
        assert!(matches!(err, ReplayError::FrameOutOfOrder { last: 10, frame: 3 }));
        assert_eq!(writer.writer.position(), end);
        assert_eq!(writer.records_written(), 2);

        writer.write_record(11, &cmd).unwrap();
        let buf = writer.finish(0, 11).unwrap().into_inner();
        let frames: Vec<u32> = crate::CommandLogReader::open(buf.as_slice())
            .unwrap()
            .records()
            .map(|r| r.unwrap().frame)
            .collect();
        assert_eq!(frames, vec![10, 10, 11]);
    }

    #[test]
    fn out_of_range_disconnect_is_ignored() {
        let mut writer = new_writer();
        let before = writer.writer.get_ref().clone();
        writer.log_player_disconnect(MAX_SLOTS).unwrap();
        writer.log_player_disconnect(usize::MAX).unwrap();
        assert_eq!(writer.writer.get_ref(), &before);
    }
}
