use std::{
    io::{self, stdin, stdout, BufRead, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::{Parser, Subcommand};
use hmmtagger::{
    evaluate_corpus, read_sentences, CorpusReader, Error, HmmModel, InteractiveSession,
    ModelTrainer, Result, ViterbiDecoder, DEFAULT_BATCH_PENALTY, DEFAULT_SESSION_PENALTY,
};

/// Train a bigram HMM tagger and tag sentences with it.
#[derive(Debug, Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Argv {
    /// raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// train a model from a tag file and its sentence file
    Train {
        #[arg(long, value_name = "FILE")]
        tags: PathBuf,
        #[arg(long, value_name = "FILE")]
        words: PathBuf,
        /// write the model to a file (MODEL)
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
    },
    /// tag every line of the given files; reads STDIN when none or '-'
    Tag {
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
        #[arg(long, default_value_t = DEFAULT_BATCH_PENALTY, allow_negative_numbers = true)]
        penalty: f64,
        #[arg(value_name = "FILE")]
        datasets: Vec<PathBuf>,
    },
    /// report the accuracy of the model on a tagged corpus
    Evaluate {
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
        #[arg(long, value_name = "FILE")]
        tags: PathBuf,
        #[arg(long, value_name = "FILE")]
        words: PathBuf,
        #[arg(long, default_value_t = DEFAULT_BATCH_PENALTY, allow_negative_numbers = true)]
        penalty: f64,
    },
    /// tag sentences typed on STDIN until 'q'
    Interactive {
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SESSION_PENALTY, allow_negative_numbers = true)]
        penalty: f64,
    },
}

fn train(tags: &Path, words: &Path, model: &Path) -> Result<()> {
    let begin = Instant::now();
    let mut trainer = ModelTrainer::new();
    for pair in CorpusReader::open(tags, words)? {
        let pair = pair?;
        trainer.append(&pair.tags, &pair.words)?;
    }
    log::info!("read {} examples", trainer.num_examples());
    let hmm = trainer.finish()?;
    hmm.save(model)?;
    log::info!("write model to {} ({:?})", model.display(), begin.elapsed());
    Ok(())
}

fn tag_lines<I, W>(decoder: &ViterbiDecoder, lines: I, out: &mut W) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    for (i, line) in lines.enumerate() {
        let line = line?;
        match decoder.decode_line(&line) {
            Ok(decoding) => writeln!(out, "{}", decoding.labels().join(" "))?,
            Err(e @ Error::NoPathFound { .. }) => {
                eprintln!("line {}: {e}", i + 1);
                writeln!(out)?;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn tag(model: &Path, penalty: f64, datasets: &[PathBuf]) -> Result<()> {
    let hmm = HmmModel::load(model)?;
    let decoder = ViterbiDecoder::new(&hmm, penalty)?;
    let mut out = BufWriter::new(stdout().lock());
    if datasets.is_empty() {
        tag_lines(&decoder, stdin().lock().lines(), &mut out)?;
    }
    for fpath in datasets {
        if fpath.as_os_str() == "-" {
            tag_lines(&decoder, stdin().lock().lines(), &mut out)?;
        } else {
            tag_lines(&decoder, read_sentences(fpath)?, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn evaluate(model: &Path, tags: &Path, words: &Path, penalty: f64) -> Result<()> {
    let hmm = HmmModel::load(model)?;
    let decoder = ViterbiDecoder::new(&hmm, penalty)?;
    let evaluation = evaluate_corpus(&decoder, CorpusReader::open(tags, words)?)?;
    print!("{evaluation}");
    Ok(())
}

fn interactive(model: &Path, penalty: f64) -> Result<()> {
    let hmm = HmmModel::load(model)?;
    let decoder = ViterbiDecoder::new(&hmm, penalty)?;
    let mut session = InteractiveSession::new(stdin().lock(), stdout().lock());
    let n = session.run(&decoder)?;
    log::info!("tagged {n} sentences");
    Ok(())
}

fn exit_code(e: &Error) -> u8 {
    match e {
        Error::MalformedCorpusLine { .. } => 2,
        Error::EmptyModel => 3,
        Error::NoPathFound { .. } => 4,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let argv = Argv::parse();
    let level = match argv.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();
    log::debug!("argv: {:?}", argv);

    let r = match &argv.command {
        Command::Train { tags, words, model } => train(tags, words, model),
        Command::Tag {
            model,
            penalty,
            datasets,
        } => tag(model, *penalty, datasets),
        Command::Evaluate {
            model,
            tags,
            words,
            penalty,
        } => evaluate(model, tags, words, *penalty),
        Command::Interactive { model, penalty } => interactive(model, *penalty),
    };
    match r {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}
