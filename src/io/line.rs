use anyhow::Result;
use std::io::BufRead;

use super::{SeqRecord, SeqReader};

/// One sequence per line; blank lines are skipped and records are
/// named by their ordinal.
pub struct LineReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    records: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            records: 0,
        }
    }
}

impl<R: BufRead> SeqReader for LineReader<R> {
    fn next_record(&mut self) -> Result<Option<SeqRecord>> {
        if self.done {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                return Ok(None);
            }
            let line = self.buf.trim_end();
            if line.is_empty() {
                continue;
            }
            let rec = SeqRecord {
                name: self.records.to_string(),
                seq: line.as_bytes().to_vec(),
            };
            self.records += 1;
            return Ok(Some(rec));
        }
    }
}
