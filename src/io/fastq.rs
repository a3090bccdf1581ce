use anyhow::{anyhow, Result};
use std::io::BufRead;

use super::{SeqRecord, SeqReader};

/// Four-line FASTQ records; the quality line is validated for length
/// and then discarded, since the index consumes bases only.
pub struct FastqReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead> SeqReader for FastqReader<R> {
    fn next_record(&mut self) -> Result<Option<SeqRecord>> {
        if self.done {
            return Ok(None);
        }

        // header line starting with '@'
        self.buf.clear();
        let mut n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            self.done = true;
            return Ok(None);
        }
        if !self.buf.starts_with('@') {
            return Err(anyhow!("FASTQ header not starting with '@'"));
        }
        let header = self.buf[1..].trim_end().to_string();
        let name = header
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();

        // sequence line
        self.buf.clear();
        n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            return Err(anyhow!("FASTQ record truncated after header"));
        }
        let seq: Vec<u8> = self.buf.trim_end().as_bytes().to_vec();

        // '+' separator line
        self.buf.clear();
        n = self.reader.read_line(&mut self.buf)?;
        if n == 0 || !self.buf.starts_with('+') {
            return Err(anyhow!("FASTQ separator line missing"));
        }

        // quality line, validated and dropped
        self.buf.clear();
        n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            return Err(anyhow!("FASTQ quality line missing"));
        }
        let qual_len = self.buf.trim_end().len();
        if qual_len != seq.len() {
            return Err(anyhow!(
                "FASTQ quality length {} does not match sequence length {}",
                qual_len,
                seq.len()
            ));
        }

        Ok(Some(SeqRecord { name, seq }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_simple_fastq() {
        let data = b"@r1 lane1\nACGT\n+\nIIII\n@r2\nTTGCA\n+r2\nJJJJJ\n";
        let cursor = Cursor::new(&data[..]);
        let mut r = FastqReader::new(cursor);

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.name, "r1");
        assert_eq!(r1.seq, b"ACGT");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.name, "r2");
        assert_eq!(r2.seq, b"TTGCA");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn bad_header_is_an_error() {
        let data = b">r1\nACGT\n+\nIIII\n";
        let mut r = FastqReader::new(Cursor::new(&data[..]));
        assert!(r.next_record().is_err());
    }

    #[test]
    fn quality_length_mismatch_is_an_error() {
        let data = b"@r1\nACGT\n+\nII\n";
        let mut r = FastqReader::new(Cursor::new(&data[..]));
        assert!(r.next_record().is_err());
    }

    #[test]
    fn truncated_record_is_an_error() {
        let data = b"@r1\nACGT\n";
        let mut r = FastqReader::new(Cursor::new(&data[..]));
        assert!(r.next_record().is_err());
    }
}
