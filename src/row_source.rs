use std::fs::File;
use std::io::{self, Read};
use std::iter::FusedIterator;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::error::LoadError;

pub type Row = Vec<String>;

/// Reads the header row up front, then yields data rows one at a time.
///
/// The sequence is finite and cannot be restarted: it ends at end-of-input or
/// after the first error. Rows are not checked against the header's width here.
pub struct RowSource<R> {
    reader: Reader<NormalizeLineEndings<R>>,
    headers: Vec<String>,
    record: StringRecord,
    rows_read: u64,
    done: bool,
}

impl RowSource<File> {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|err| {
            LoadError::Io(io::Error::new(err.kind(), format!("{}: {err}", path.display())))
        })?;
        Self::new(file, delimiter)
    }
}

impl<R: Read> RowSource<R> {
    pub fn new(input: R, delimiter: u8) -> Result<Self, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(NormalizeLineEndings::new(input));

        let mut record = StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Err(LoadError::MalformedInput(
                "input is empty, expected a header row".to_string(),
            ));
        }
        let headers = record.iter().map(str::to_owned).collect();

        Ok(Self {
            reader,
            headers,
            record,
            rows_read: 0,
            done: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows yielded so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Input line on which the most recently read record starts.
    pub fn line(&self) -> u64 {
        self.record
            .position()
            .map_or_else(|| self.reader.position().line(), |pos| pos.line())
    }
}

impl<R: Read> Iterator for RowSource<R> {
    type Item = Result<Row, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.rows_read += 1;
                Some(Ok(self.record.iter().map(str::to_owned).collect()))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err.into()))
            }
        }
    }
}

impl<R: Read> FusedIterator for RowSource<R> {}

/// Rewrites CRLF and lone CR line endings to LF, including inside quoted fields.
pub struct NormalizeLineEndings<R> {
    inner: R,
    after_cr: bool,
}

impl<R: Read> NormalizeLineEndings<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            after_cr: false,
        }
    }
}

impl<R: Read> Read for NormalizeLineEndings<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }

            // a CR is emitted as LF straight away; the LF of a CRLF pair is then skipped.
            let mut out = 0;
            for i in 0..n {
                let byte = buf[i];
                if self.after_cr && byte == b'\n' {
                    self.after_cr = false;
                    continue;
                }
                self.after_cr = byte == b'\r';
                buf[out] = if byte == b'\r' { b'\n' } else { byte };
                out += 1;
            }

            // a chunk holding only the LF of a split CRLF yields nothing; read on
            if out > 0 {
                return Ok(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn normalized(input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        NormalizeLineEndings::new(input).read_to_end(&mut out).unwrap();
        out
    }

    // hands out one byte per read, to split CRLF pairs across reads
    struct OneByte<'a>(&'a [u8]);

    impl Read for OneByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let data: &[u8] = self.0;
            match data.split_first() {
                Some((first, rest)) if !buf.is_empty() => {
                    buf[0] = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_line_endings_are_normalized() {
        assert_eq!(normalized(b"a\r\nb\rc\nd"), b"a\nb\nc\nd");
        assert_eq!(normalized(b"\r\r\n"), b"\n\n");
        assert_eq!(normalized(b"no newline"), b"no newline");
    }

    #[test]
    fn test_line_endings_split_across_reads() {
        let mut out = Vec::new();
        NormalizeLineEndings::new(OneByte(b"x\r\ny\r\n"))
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"x\ny\n");
    }

    #[test]
    fn test_header_then_rows() {
        let input = Cursor::new("Name,Order,city\r\nAl,1,NYC\r\nBo,2,LA\r\n");
        let mut rows = RowSource::new(input, b',').unwrap();
        assert_eq!(rows.headers(), &["Name", "Order", "city"]);
        assert_eq!(rows.next().unwrap().unwrap(), vec!["Al", "1", "NYC"]);
        assert_eq!(rows.next().unwrap().unwrap(), vec!["Bo", "2", "LA"]);
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
        assert_eq!(rows.rows_read(), 2);
    }

    #[test]
    fn test_quoted_fields_keep_embedded_newlines() {
        let input = Cursor::new("note,id\n\"line one\r\nline two\",7\n");
        let rows: Vec<Row> = RowSource::new(input, b',')
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![vec!["line one\nline two".to_string(), "7".to_string()]]);
    }

    #[test]
    fn test_custom_delimiter() {
        let input = Cursor::new("a;b\n1;2,5\n");
        let mut rows = RowSource::new(input, b';').unwrap();
        assert_eq!(rows.headers(), &["a", "b"]);
        assert_eq!(rows.next().unwrap().unwrap(), vec!["1", "2,5"]);
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = RowSource::new(Cursor::new(""), b',').err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_ragged_rows_are_passed_through() {
        let input = Cursor::new("a,b,c\n1,2\n");
        let mut rows = RowSource::new(input, b',').unwrap();
        assert_eq!(rows.next().unwrap().unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_stops_after_first_error() {
        let mut input = b"a,b\n1,2\n".to_vec();
        input.extend_from_slice(&[0xff, b',', b'x', b'\n', b'3', b',', b'4', b'\n']);
        let mut rows = RowSource::new(Cursor::new(input), b',').unwrap();
        assert!(rows.next().unwrap().is_ok());
        let err = rows.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(rows.next().is_none());
    }
}
