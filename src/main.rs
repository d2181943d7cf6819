use std::fs::File;
use std::io::{stdin, stdout, BufRead, BufReader, Write};

use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use tracing_subscriber::EnvFilter;

use ondux::{
    render_tagged, segment_record, Block, KnowledgeBase, PsmTrainer, StopWords, TransitionMatrix,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let knowledge_base_arg = Arg::with_name("knowledge-base")
        .short("k")
        .long("knowledge-base")
        .value_name("FILE")
        .help("JSON file mapping every attribute to its known values.")
        .takes_value(true)
        .required(true);
    let stop_words_arg = Arg::with_name("stop-words")
        .short("s")
        .long("stop-words")
        .value_name("FILE")
        .help("File with one stop word per line. May be given several times.")
        .takes_value(true)
        .multiple(true)
        .number_of_values(1);

    let matches = App::new("ondux")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Segment records into blocks, or learn label transitions from labeled blocks.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("segment")
                .about("Split records into blocks using knowledge base co-occurrences")
                .arg(knowledge_base_arg.clone())
                .arg(stop_words_arg.clone())
                .arg(
                    Arg::with_name("input")
                        .short("i")
                        .long("input")
                        .value_name("FILE")
                        .help("File containing records, one per line. stdin by default.")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("FILE")
                        .help("File into which the blocks of every record will be written as a JSON array per line. stdout by default.")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("train")
                .about("Learn a transition matrix from labeled blocks")
                .arg(knowledge_base_arg)
                .arg(stop_words_arg)
                .arg(
                    Arg::with_name("input")
                        .short("i")
                        .long("input")
                        .value_name("FILE")
                        .help("File containing labeled records, one JSON array of {\"value\", \"label\"} blocks per line.")
                        .takes_value(true)
                        .required(true)
                        .multiple(true),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("FILE")
                        .help("File where the newly trained transition matrix will be written.")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("tag")
                .about("Render labeled blocks as inline tags, merging runs of the same label")
                .arg(
                    Arg::with_name("input")
                        .short("i")
                        .long("input")
                        .value_name("FILE")
                        .help("File containing labeled records, one JSON array of {\"value\", \"raw_value\", \"label\"} blocks per line. stdin by default.")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("FILE")
                        .help("File into which the tagged records will be written, one per line. stdout by default.")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Print a trained transition matrix as a table")
                .arg(
                    Arg::with_name("model")
                        .short("m")
                        .long("model")
                        .value_name("FILE")
                        .help("File containing the transition matrix produced by `train` command")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("segment", Some(matches)) => do_segment(matches),
        ("train", Some(matches)) => do_train(matches),
        ("tag", Some(matches)) => do_tag(matches),
        ("show", Some(matches)) => do_show(matches),
        _ => unreachable!("a subcommand is required"),
    }
}

fn load_stop_words(matches: &ArgMatches) -> Result<StopWords> {
    let mut stop_words = StopWords::new();
    for filename in matches.values_of("stop-words").into_iter().flatten() {
        stop_words
            .extend_from_file(filename)
            .with_context(|| format!("loading stop words from {}", filename))?;
    }
    tracing::info!(words = stop_words.len(), "loaded stop words");
    Ok(stop_words)
}

fn load_knowledge_base(matches: &ArgMatches, stop_words: &StopWords) -> Result<KnowledgeBase> {
    // .unwrap is safe because the argument is required
    let filename = matches.value_of("knowledge-base").unwrap();
    KnowledgeBase::load_from_file(filename, stop_words)
        .with_context(|| format!("loading knowledge base from {}", filename))
}

fn open_input(matches: &ArgMatches) -> Result<Box<dyn BufRead>> {
    Ok(match matches.value_of("input") {
        Some(filename) => Box::new(BufReader::new(File::open(filename)?)),
        None => Box::new(BufReader::new(stdin())),
    })
}

fn open_output(matches: &ArgMatches) -> Result<Box<dyn Write>> {
    Ok(match matches.value_of("output") {
        Some(filename) => Box::new(File::create(filename)?),
        None => Box::new(stdout()),
    })
}

fn do_segment(matches: &ArgMatches) -> Result<()> {
    let stop_words = load_stop_words(matches)?;
    let knowledge_base = load_knowledge_base(matches, &stop_words)?;

    let input = open_input(matches)?;
    let mut output = open_output(matches)?;

    for (number, record) in input.lines().enumerate() {
        let record = record?;
        let blocks = segment_record(&record, &knowledge_base, &stop_words)
            .with_context(|| format!("record on line {}", number + 1))?;
        let values: Vec<_> = blocks.iter().map(|block| block.value.as_str()).collect();
        serde_json::to_writer(&mut output, &values)?;
        output.write_all(b"\n")?;
    }
    output.flush()?;

    Ok(())
}

fn do_train(matches: &ArgMatches) -> Result<()> {
    let stop_words = load_stop_words(matches)?;
    let knowledge_base = load_knowledge_base(matches, &stop_words)?;

    let mut trainer = PsmTrainer::new(&knowledge_base);
    for filename in matches.values_of("input").into_iter().flatten() {
        let reader = BufReader::new(File::open(filename)?);
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let blocks: Vec<Block> = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: malformed labeled record", filename, number + 1))?;
            trainer
                .add_record(&blocks)
                .with_context(|| format!("{}:{}", filename, number + 1))?;
        }
    }

    let model_filename = matches.value_of("output").unwrap();
    let matrix = trainer.into_matrix();
    matrix
        .save_to_file(model_filename)
        .with_context(|| format!("saving transition matrix to {}", model_filename))?;

    Ok(())
}

fn do_tag(matches: &ArgMatches) -> Result<()> {
    let input = open_input(matches)?;
    let mut output = open_output(matches)?;

    for (number, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let blocks: Vec<Block> = serde_json::from_str(&line)
            .with_context(|| format!("line {}: malformed labeled record", number + 1))?;
        let tagged = render_tagged(&blocks).with_context(|| format!("line {}", number + 1))?;
        output.write_all(tagged.as_bytes())?;
        output.write_all(b"\n")?;
    }
    output.flush()?;

    Ok(())
}

fn do_show(matches: &ArgMatches) -> Result<()> {
    let model_filename = matches.value_of("model").unwrap();
    let matrix = TransitionMatrix::load_from_file(model_filename)
        .with_context(|| format!("loading transition matrix from {}", model_filename))?;

    print!("{}", matrix);
    for label in matrix.labels_without_evidence() {
        eprintln!("no transitions observed from {:?}", label);
    }

    Ok(())
}
