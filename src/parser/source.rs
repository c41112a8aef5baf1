//! Forward-only line cursor over a build file.

use std::io::{self, BufRead};

use snafu::ResultExt;

use crate::error::{KakeResult, ReadSnafu, SourceNotAdvancedSnafu};
use crate::model::Line;

pub struct Source<R> {
    reader: R,
    next_index: usize,
    started: bool,
    current: Option<Line>,
}

impl<R: BufRead> Source<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            next_index: 0,
            started: false,
            current: None,
        }
    }

    /// Reads the next physical line.
    ///
    /// A line ends at `\n`, `\r\n` or a lone `\r`. Returns `false` once the
    /// stream is exhausted; `current` is then absent for good.
    pub fn advance(&mut self) -> KakeResult<bool> {
        self.started = true;
        self.current = None;

        let mut bytes = Vec::new();
        let mut ending = None;
        loop {
            let available = self.reader.fill_buf().context(ReadSnafu)?;
            if available.is_empty() {
                break;
            }
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    bytes.extend_from_slice(&available[..i]);
                    ending = Some(available[i]);
                    self.reader.consume(i + 1);
                    break;
                }
                None => {
                    let n = available.len();
                    bytes.extend_from_slice(available);
                    self.reader.consume(n);
                }
            }
        }

        if ending.is_none() && bytes.is_empty() {
            return Ok(false);
        }

        // `\r\n` may straddle two buffer fills.
        if ending == Some(b'\r') {
            let next = self.reader.fill_buf().context(ReadSnafu)?;
            if next.first() == Some(&b'\n') {
                self.reader.consume(1);
            }
        }

        let text = String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            .context(ReadSnafu)?;
        self.current = Some(Line::new(self.next_index, text));
        self.next_index += 1;
        Ok(true)
    }

    /// Line under the cursor, `None` at end of stream.
    pub fn current(&self) -> KakeResult<Option<&Line>> {
        if !self.started {
            return SourceNotAdvancedSnafu.fail();
        }
        Ok(self.current.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KakeError;

    #[test]
    fn reading_before_advance_is_rejected() {
        let source = Source::new("a\n".as_bytes());
        assert!(matches!(source.current(), Err(KakeError::SourceNotAdvanced)));
    }

    #[test]
    fn lines_are_numbered_from_zero() {
        let mut source = Source::new("first\r\nsecond\nthird".as_bytes());
        let mut seen = Vec::new();
        while source.advance().unwrap() {
            let line = source.current().unwrap().unwrap();
            seen.push((line.index(), line.text().to_string()));
        }
        assert_eq!(
            seen,
            vec![
                (0, "first".to_string()),
                (1, "second".to_string()),
                (2, "third".to_string()),
            ]
        );
        assert_eq!(source.current().unwrap(), None);
    }

    fn texts<R: BufRead>(mut source: Source<R>) -> Vec<String> {
        let mut seen = Vec::new();
        while source.advance().unwrap() {
            seen.push(source.current().unwrap().unwrap().text().to_string());
        }
        seen
    }

    #[test]
    fn lone_cr_ends_a_line() {
        let seen = texts(Source::new("a\rb\r\nc\n\rd".as_bytes()));
        assert_eq!(seen, ["a", "b", "c", "", "d"]);
    }

    #[test]
    fn crlf_split_across_reads_is_one_ending() {
        let reader = io::BufReader::with_capacity(2, "ab\r\ncd\r".as_bytes());
        assert_eq!(texts(Source::new(reader)), ["ab", "cd"]);
    }

    #[test]
    fn invalid_utf8_is_a_read_error() {
        let mut source = Source::new(&b"\xff\n"[..]);
        assert!(matches!(source.advance(), Err(KakeError::Read { .. })));
    }

    #[test]
    fn empty_input_ends_immediately() {
        let mut source = Source::new("".as_bytes());
        assert!(!source.advance().unwrap());
        assert_eq!(source.current().unwrap(), None);
    }
}
