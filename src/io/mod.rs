use anyhow::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod fasta;
pub mod fastq;
pub mod line;

/// One input sequence, ready for the collection builder.
#[derive(Debug, Clone)]
pub struct SeqRecord {
    pub name: String,
    pub seq: Vec<u8>,
}

/// Common interface over the input formats (line / FASTA / FASTQ).
pub trait SeqReader {
    fn next_record(&mut self) -> Result<Option<SeqRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Line,
    Fasta,
    Fastq,
}

impl InputFormat {
    /// Guess the format from a file extension; plain lines otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("fa" | "fasta" | "fna") => InputFormat::Fasta,
            Some("fq" | "fastq") => InputFormat::Fastq,
            _ => InputFormat::Line,
        }
    }
}

/// Open a reader of the given format over a file.
pub fn open(format: InputFormat, path: &Path) -> Result<Box<dyn SeqReader>> {
    use anyhow::Context;
    let file =
        File::open(path).with_context(|| format!("cannot open input file '{}'", path.display()))?;
    let buf = BufReader::new(file);
    Ok(match format {
        InputFormat::Line => Box::new(line::LineReader::new(buf)),
        InputFormat::Fasta => Box::new(fasta::FastaReader::new(buf)),
        InputFormat::Fastq => Box::new(fastq::FastqReader::new(buf)),
    })
}
