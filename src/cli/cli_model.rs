use std::path::PathBuf;

use clap::{Arg, Command, command, value_parser};

use crate::log_utils::LogLevel;

pub fn cli_model() -> Command {
    command!()
    .next_help_heading("STR model")
    .arg(
        Arg::new("str_model_file")
            .short('m')
            .long("str-model-file")
            .value_parser(value_parser!(PathBuf))
            .value_name("FILE")
            .help("STR amplification error model parameter file"),
    )
    .arg(
        Arg::new("str_min_length")
            .long("str-min-length")
            .value_parser(value_parser!(usize))
            .value_name("INT")
            .default_value("10")
            .help("Minimum total length (bp) of a repeat"),
    )
    .arg(
        Arg::new("str_max_unit")
            .long("str-max-unit")
            .value_parser(value_parser!(usize))
            .value_name("INT")
            .default_value("10")
            .help("Maximum length of a repeat unit"),
    )
    .arg(
        Arg::new("str_min_count")
            .long("str-min-count")
            .value_parser(value_parser!(usize))
            .value_name("INT")
            .default_value("2")
            .help("Minimum number of copies of the repeat unit"),
    )
    .arg(
        Arg::new("str_log")
            .long("str-log")
            .value_parser(value_parser!(PathBuf))
            .value_name("FILE")
            .help("Write details of STR sites with alleles to FILE"),
    )
    .next_help_heading("Operation")
    .arg(
        Arg::new("region")
            .short('r')
            .long("region")
            .value_parser(value_parser!(String))
            .value_name("REGION")
            .conflicts_with("sites")
            .help("Genomic region to consider"),
    )
    .arg(
        Arg::new("sites")
            .short('s')
            .long("sites")
            .value_parser(value_parser!(PathBuf))
            .value_name("FILE")
            .help(
                "File with sites to consider (contig, position and optionally ref and alt alleles)",
            ),
    )
    .arg(
        Arg::new("window")
            .short('w')
            .long("window")
            .value_parser(value_parser!(usize))
            .value_name("INT")
            .default_value("64")
            .help("Reference bases either side of a site used for repeat detection"),
    )
    .next_help_heading("Input/Output")
    .arg(
        Arg::new("reference")
            .short('T')
            .long("reference")
            .value_parser(value_parser!(PathBuf))
            .required(true)
            .value_name("FASTA File")
            .help("Reference FASTA file"),
    )
    .arg(
        Arg::new("output")
            .short('o')
            .long("output")
            .value_parser(value_parser!(PathBuf))
            .value_name("FILE")
            .help("Output file for STR report [default: stdout]"),
    )
    .arg(
        Arg::new("loglevel")
            .short('l')
            .long("loglevel")
            .value_name("LOGLEVEL")
            .value_parser(value_parser!(LogLevel))
            .ignore_case(true)
            .default_value("info")
            .help("Set log level"),
    )
}
