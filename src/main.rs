#![forbid(unsafe_code)]
//! # bibliostat CLI
//!
//! Command-line interface for the `bibliostat` crate: turns reference-manager
//! exports into keyword histograms, N-gram frequency tables and decade bins.
//!
//! ## Example
//! ```bash
//! cargo run --release -- transcode library.xml library.json
//! cargo run --release -- ngrams library.json --n 2 --include-abstract -o bigrams.json
//! cargo run --release -- batch data/ out/ --keywords
//! ```
//!
//! Set `RUST_LOG=info` to see progress. See `--help` for all options.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::{error, info};

use bibliostat::{
    BatchConfig, ExportFormat, HistogramKind, NgramOrder, Result, TextCleaningConfig,
    WindowMode, bin_by_decade, keyword_histogram, load_file, ngram_histogram, run_all,
    transcode_file, write_decade_bins, write_histogram,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an XML export into JSON
    Transcode {
        /// XML export to read
        input: PathBuf,
        /// JSON file to write
        output: PathBuf,
    },
    /// Count words, bigrams or trigrams over titles (and abstracts)
    Ngrams {
        /// JSON record collection
        input: PathBuf,
        /// N-gram order (1, 2 or 3)
        #[arg(long, default_value_t = 1)]
        n: usize,
        /// Append each record's abstract to its title
        #[arg(long, default_value_t = false)]
        include_abstract: bool,
        /// Let windows run across record boundaries (legacy behaviour)
        #[arg(long, default_value_t = false)]
        cross_record: bool,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "json")]
        export_format: ExportFormat,
        #[command(flatten)]
        cleaning: CleaningArgs,
    },
    /// Histogram of record keywords
    Keywords {
        /// JSON record collection
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "json")]
        export_format: ExportFormat,
    },
    /// Split records into publication-year bins
    Decades {
        /// JSON record collection
        input: PathBuf,
        /// Directory receiving one file per bin
        output_dir: PathBuf,
    },
    /// Run the N-gram pipeline over every JSON file in a directory
    Batch {
        /// Directory of JSON record collections
        input_dir: PathBuf,
        /// Directory receiving the outputs and batch_report.json
        output_dir: PathBuf,
        /// N-gram orders to compute (repeatable)
        #[arg(long = "n", default_values_t = [1, 2, 3])]
        orders: Vec<usize>,
        /// Only count titles
        #[arg(long, default_value_t = false)]
        titles_only: bool,
        /// Only count titles with abstracts
        #[arg(long, default_value_t = false, conflicts_with = "titles_only")]
        abstracts_only: bool,
        #[arg(long, default_value_t = false)]
        cross_record: bool,
        /// Also write keyword histograms
        #[arg(long, default_value_t = false)]
        keywords: bool,
        /// Process files in parallel
        #[arg(long, default_value_t = false)]
        parallel: bool,
        #[arg(long, default_value = "json")]
        export_format: ExportFormat,
        #[command(flatten)]
        cleaning: CleaningArgs,
    },
}

#[derive(Args)]
struct CleaningArgs {
    /// JSON file overriding the text cleaning configuration
    #[arg(long)]
    cleaning_config: Option<PathBuf>,

    /// Optional path to additional stopword file (.txt, one word per line)
    #[arg(long)]
    stopwords: Option<PathBuf>,
}

impl CleaningArgs {
    fn resolve(&self) -> Result<TextCleaningConfig> {
        let config = match &self.cleaning_config {
            Some(path) => TextCleaningConfig::from_json_file(path)?,
            None => TextCleaningConfig::default(),
        };
        match &self.stopwords {
            Some(path) => config.with_stopword_file(path),
            None => Ok(config),
        }
    }
}

fn window(cross_record: bool) -> WindowMode {
    if cross_record {
        WindowMode::Corpus
    } else {
        WindowMode::PerRecord
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records".to_string())
}

fn run(command: Command) -> Result<bool> {
    match command {
        Command::Transcode { input, output } => {
            transcode_file(&input, &output)?;
        }
        Command::Ngrams {
            input,
            n,
            include_abstract,
            cross_record,
            output,
            export_format,
            cleaning,
        } => {
            let order = NgramOrder::new(n)?;
            let stoplist = cleaning.resolve()?.stoplist(order);
            let records = load_file(&input)?;
            let table = ngram_histogram(
                &records,
                order,
                include_abstract,
                window(cross_record),
                &stoplist,
            );
            write_histogram(&table, HistogramKind::Ngram, &output, export_format)?;
        }
        Command::Keywords {
            input,
            output,
            export_format,
        } => {
            let records = load_file(&input)?;
            let table = keyword_histogram(&records);
            write_histogram(&table, HistogramKind::Keyword, &output, export_format)?;
        }
        Command::Decades { input, output_dir } => {
            let records = load_file(&input)?;
            let bins = bin_by_decade(&records);
            write_decade_bins(&bins, &output_dir, &stem_of(&input))?;
        }
        Command::Batch {
            input_dir,
            output_dir,
            orders,
            titles_only,
            abstracts_only,
            cross_record,
            keywords,
            parallel,
            export_format,
            cleaning,
        } => {
            let mut config = BatchConfig::new(input_dir, output_dir);
            config.orders = orders
                .into_iter()
                .map(NgramOrder::new)
                .collect::<Result<Vec<_>>>()?;
            config.include_abstract = match (titles_only, abstracts_only) {
                (true, _) => vec![false],
                (_, true) => vec![true],
                _ => vec![true, false],
            };
            config.window = window(cross_record);
            config.keywords = keywords;
            config.parallel = parallel;
            config.format = export_format;
            config.cleaning = cleaning.resolve()?;

            let report = run_all(&config)?;
            println!("{} files written", report.written.len());
            for failure in &report.failures {
                eprintln!(
                    "failed: {} {:?}: {}",
                    failure.file.display(),
                    failure.task,
                    failure.error
                );
            }
            return Ok(report.is_complete());
        }
    }
    Ok(true)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => info!("done"),
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Error: {}", e);
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
