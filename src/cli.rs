//! Command-line interface: training and an interactive prediction loop.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rustc_hash::FxHashSet;

use predictext_predict::{PredictionParameter, WordPredictor};
use predictext_train::{Trainer, TrainingConfiguration, TrainingStep};

#[derive(Parser)]
#[command(name = "predictext")]
#[command(about = "French next-word prediction engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a word dictionary and an n-gram dictionary from a corpus
    Train {
        /// Corpus directory (every file is one document)
        input: PathBuf,

        /// Language preset
        #[arg(long, default_value = "fr")]
        language: String,

        /// Output path of the word dictionary
        #[arg(long)]
        word_dictionary: PathBuf,

        /// Output path of the static n-gram dictionary
        #[arg(long)]
        ngram_dictionary: PathBuf,

        /// Training configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,

        /// Resume from a later stage against cached artifacts
        /// (parser, token-convert, words-dictionary, ngram-dictionary)
        #[arg(long, default_value = "parser")]
        from_step: String,

        /// Directory for stage artifacts (default: next to the n-gram output)
        #[arg(long)]
        working_dir: Option<PathBuf>,
    },
    /// Load trained dictionaries and predict interactively from stdin
    Predict {
        /// Path of the word dictionary
        #[arg(long)]
        word_dictionary: PathBuf,

        /// Path of the static n-gram dictionary
        #[arg(long)]
        ngram_dictionary: PathBuf,

        /// Number of predictions per input
        #[arg(long, default_value_t = 5)]
        count: usize,

        /// Enable accent correction on the started word
        #[arg(long)]
        correction: bool,

        /// Attach scoring detail to every prediction
        #[arg(long)]
        debug: bool,
    },
}

/// Entry point for the CLI.
pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            input,
            language,
            word_dictionary,
            ngram_dictionary,
            config,
            overwrite,
            from_step,
            working_dir,
        } => cmd_train(
            &input,
            &language,
            &word_dictionary,
            &ngram_dictionary,
            config.as_deref(),
            overwrite,
            &from_step,
            working_dir,
        ),
        Commands::Predict {
            word_dictionary,
            ngram_dictionary,
            count,
            correction,
            debug,
        } => cmd_predict(&word_dictionary, &ngram_dictionary, count, correction, debug),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_train(
    input: &Path,
    language: &str,
    word_dictionary: &Path,
    ngram_dictionary: &Path,
    config: Option<&Path>,
    overwrite: bool,
    from_step: &str,
    working_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if language != "fr" {
        return Err(format!("unsupported language '{}'", language).into());
    }
    if !input.is_dir() {
        return Err(format!("'{}' is not a directory", input.display()).into());
    }
    for output in [word_dictionary, ngram_dictionary] {
        if output.exists() && !overwrite {
            return Err(format!(
                "'{}' already exists (use --overwrite to replace it)",
                output.display()
            )
            .into());
        }
    }

    let configuration = match config {
        Some(path) => TrainingConfiguration::load(path)?,
        None => TrainingConfiguration::default(),
    };
    let step: TrainingStep = from_step.parse()?;
    let working_dir = working_dir.unwrap_or_else(|| {
        let mut dir = ngram_dictionary.as_os_str().to_os_string();
        dir.push(".work");
        PathBuf::from(dir)
    });
    fs::create_dir_all(&working_dir)?;

    let trainer = Trainer::new(configuration, working_dir)?;
    trainer.run(input, word_dictionary, ngram_dictionary, step)?;
    println!(
        "trained {} and {}",
        word_dictionary.display(),
        ngram_dictionary.display()
    );
    Ok(())
}

fn cmd_predict(
    word_dictionary: &Path,
    ngram_dictionary: &Path,
    count: usize,
    correction: bool,
    debug: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut parameter = PredictionParameter::default();
    parameter.enable_word_correction = correction;
    parameter.enable_debug_information = debug;
    let mut predictor = WordPredictor::open(word_dictionary, ngram_dictionary, parameter)?;

    println!("type a context to get predictions; '/train <text>' feeds the dynamic model");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(text) = line.strip_prefix("/train ") {
            predictor.train_dynamic_model(text, true)?;
            println!("trained dynamic model on {} chars", text.len());
            continue;
        }
        let result = predictor.predict(line, None, count, &FxHashSet::default());
        if let Some(prefix) = &result.prefix {
            println!("prefix: '{}'", prefix);
        }
        for (rank, prediction) in result.predictions.iter().enumerate() {
            match &prediction.debug {
                Some(detail) => println!(
                    "{:2}. {:20} {:.3e}  [{}]",
                    rank + 1,
                    prediction.display,
                    prediction.score,
                    detail
                ),
                None => println!(
                    "{:2}. {:20} {:.3e}",
                    rank + 1,
                    prediction.display,
                    prediction.score
                ),
            }
        }
    }
    Ok(())
}
