use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;

use readfm::io::{self, InputFormat, SeqReader};
use readfm::util::alphabet;
use readfm::{CollectionBuilder, FMIndex};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "readfm", author, version, about = "FM self-index over sequence read collections", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Line,
    Fasta,
    Fastq,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an index (and its sample file) from a sequence file
    Build {
        /// Input file: one sequence per line, FASTA or FASTQ
        input: String,
        /// Output prefix for <prefix>.fmi and <prefix>.sa
        #[arg(short, long, default_value = "index")]
        output: String,
        /// Input format (guessed from the extension if omitted)
        #[arg(long, value_enum)]
        format: Option<CliFormat>,
        /// Suffix sampling rate (0 = default)
        #[arg(long, default_value_t = 0)]
        samplerate: u32,
        /// Mark the collection as color-coded (SOLiD reads)
        #[arg(long)]
        color: bool,
        /// Keep bases as-is instead of normalizing to upper-case ACGTN
        #[arg(long)]
        raw: bool,
    },
    /// Count exact pattern occurrences (no sample file needed)
    Count {
        /// Index prefix (expects <prefix>.fmi)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Patterns to count
        patterns: Vec<String>,
        /// Also count the reverse complement of each pattern
        #[arg(long)]
        revcomp: bool,
    },
    /// Locate pattern occurrences as (document, offset) pairs
    Locate {
        /// Index prefix (expects <prefix>.fmi and <prefix>.sa)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Patterns to locate
        patterns: Vec<String>,
    },
    /// Write every indexed document back to stdout
    Extract {
        /// Index prefix (expects <prefix>.fmi)
        #[arg(short = 'i', long = "index")]
        index: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            input,
            output,
            format,
            samplerate,
            color,
            raw,
        } => run_build(&input, &output, format, samplerate, color, raw),
        Commands::Count {
            index,
            patterns,
            revcomp,
        } => run_count(&index, &patterns, revcomp),
        Commands::Locate { index, patterns } => run_locate(&index, &patterns),
        Commands::Extract { index } => run_extract(&index),
    }
}

fn run_build(
    input: &str,
    output: &str,
    format: Option<CliFormat>,
    samplerate: u32,
    color: bool,
    raw: bool,
) -> Result<()> {
    let path = Path::new(input);
    let format = match format {
        Some(CliFormat::Line) => InputFormat::Line,
        Some(CliFormat::Fasta) => InputFormat::Fasta,
        Some(CliFormat::Fastq) => InputFormat::Fastq,
        None => InputFormat::from_path(path),
    };
    let mut reader = io::open(format, path)?;

    let mut builder = CollectionBuilder::new(samplerate).with_color_coded(color);
    let mut n_seqs = 0usize;
    let mut total_len = 0usize;
    while let Some(rec) = reader.next_record()? {
        n_seqs += 1;
        total_len += rec.seq.len();
        if raw || color {
            builder.insert_named_text(&rec.seq, &rec.name)?;
        } else {
            builder.insert_named_text(&alphabet::normalize_seq(&rec.seq), &rec.name)?;
        }
    }
    if n_seqs == 0 {
        anyhow::bail!("input file '{}' contains no sequences", input);
    }

    println!("input:      {input}");
    println!("sequences:  {n_seqs}");
    println!("total_len:  {total_len}");

    let mut fm = builder.finish()?;
    fm.save(output)?;
    fm.save_samples(output)?;
    println!("index saved: {output}{}", readfm::index::fm::FMINDEX_EXTENSION);
    println!("samples saved: {output}{}", readfm::index::fm::SAMPLE_EXTENSION);
    Ok(())
}

fn run_count(index: &str, patterns: &[String], revcomp: bool) -> Result<()> {
    anyhow::ensure!(!patterns.is_empty(), "no patterns given");
    let fm = FMIndex::load(index, None)?;

    // 查询只读无锁，模式间直接并行
    let counts: Vec<(String, u64)> = patterns
        .par_iter()
        .map(|p| {
            let mut c = fm.count(p.as_bytes());
            if revcomp {
                c += fm.count(&alphabet::revcomp(p.as_bytes()));
            }
            (p.clone(), c)
        })
        .collect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (pattern, count) in counts {
        writeln!(out, "{pattern}\t{count}")?;
    }
    Ok(())
}

fn run_locate(index: &str, patterns: &[String]) -> Result<()> {
    anyhow::ensure!(!patterns.is_empty(), "no patterns given");
    let fm = FMIndex::load(index, Some(index))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for pattern in patterns {
        match fm.search(pattern.as_bytes()) {
            Some((sp, ep)) => {
                let mut occ = fm.get_occurrences(sp, ep)?;
                occ.sort_unstable();
                for (doc, offset) in occ {
                    match fm.get_name(doc) {
                        Some(name) => writeln!(out, "{pattern}\t{name}\t{offset}")?,
                        None => writeln!(out, "{pattern}\t{doc}\t{offset}")?,
                    }
                }
            }
            None => writeln!(out, "{pattern}\t*\t*")?,
        }
    }
    Ok(())
}

fn run_extract(index: &str) -> Result<()> {
    let fm = FMIndex::load(index, None)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let nreads = fm.output_reads(&mut out, |_| true)?;
    eprintln!("{nreads} reads written");
    Ok(())
}
