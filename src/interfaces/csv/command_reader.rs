use super::command::CommandRecord;
use crate::error::{OddJobsError, Result};
use std::io::Read;

/// Reads a marketplace command log (`type, actor, job, target, min, max,
/// rating, tip, note`).
///
/// Cells are trimmed and trailing empty cells may be omitted, so hand-written
/// logs like `start, 2, 10` parse the same as fully padded rows.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// One `CommandRecord` per log row, in file order. A row that does not
    /// parse yields an error without stopping the rows after it.
    pub fn commands(self) -> impl Iterator<Item = Result<CommandRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(OddJobsError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{JobId, UserId};
    use crate::interfaces::csv::command::CommandType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "type, actor, job, target, min, max, rating, tip, note
post, 1, 10, , 300, 500, , , Paint fence
assign, 1, 10, 2, , , , , ";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<CommandRecord>> = reader.commands().collect();

        assert_eq!(results.len(), 2);
        let post = results[0].as_ref().unwrap();
        assert_eq!(post.r#type, CommandType::Post);
        assert_eq!(post.job, Some(JobId(10)));
        assert_eq!(post.max, Some(dec!(500)));
        assert_eq!(post.note.as_deref(), Some("Paint fence"));

        let assign = results[1].as_ref().unwrap();
        assert_eq!(assign.target, Some(UserId(2)));
        assert_eq!(assign.note, None);
    }

    #[test]
    fn test_reader_accepts_short_rows() {
        let data = "type, actor, job, target, min, max, rating, tip, note
start, 2, 10";
        let commands: Vec<CommandRecord> = CommandReader::new(data.as_bytes())
            .commands()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(commands[0].r#type, CommandType::Start);
        assert_eq!(commands[0].job, Some(JobId(10)));
        assert_eq!(commands[0].note, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "type, actor, job, target, min, max, rating, tip, note
invalid, 1, 1, , , , , ,
start, abc, 1, , , , , ,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<CommandRecord>> = reader.commands().collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_err());
    }
}
