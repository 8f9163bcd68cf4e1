use super::{DEFAULT_CSVOUT, DEFAULT_GRAPHOUT, DEFAULT_JSONIN, VERSION};
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Takes the CLI arguments for the whole run: json in, csv and charts out.
/// It is safe to unwrap get_one when a default is given,
/// the default is used when the argument is not passed.
pub fn parse_cli() -> (PathBuf, PathBuf, PathBuf, Option<PathBuf>, bool, bool) {
    let arg_json = Arg::new("input_jsonfile")
        .help("name of the input json file with the EVA records")
        .short('f')
        .long("json")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .default_value(DEFAULT_JSONIN);
    let arg_csvout = Arg::new("output_csvfile")
        .help("name of the output csv file with the cleaned records")
        .short('o')
        .long("csv")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .default_value(DEFAULT_CSVOUT);
    let arg_graph = Arg::new("output_graph")
        .help("name of the output chart, svg for .svg and png otherwise")
        .short('g')
        .long("graph")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .default_value(DEFAULT_GRAPHOUT);
    let arg_html = Arg::new("output_html")
        .help("also write the chart as an interactive html page")
        .long("html")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .required(false);
    let arg_derived = Arg::new("derived")
        .help("append duration_hours and cumulative_time to the csv")
        .long("derived")
        .action(ArgAction::SetTrue);
    let arg_verbose = Arg::new("verbose")
        .help("print verbose information")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue);
    let cli_args = Command::new("EVA_process")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to clean the EVA records, save them to csv, and plot the cumulative EVA time.")
        .arg(arg_json)
        .arg(arg_csvout)
        .arg(arg_graph)
        .arg(arg_html)
        .arg(arg_derived)
        .arg(arg_verbose)
        .get_matches();
    let jsonin = cli_args
        .get_one::<PathBuf>("input_jsonfile")
        .unwrap()
        .to_owned();
    let csvout = cli_args
        .get_one::<PathBuf>("output_csvfile")
        .unwrap()
        .to_owned();
    let graphout = cli_args
        .get_one::<PathBuf>("output_graph")
        .unwrap()
        .to_owned();
    let htmlout = cli_args.get_one::<PathBuf>("output_html").cloned();
    let derived = cli_args.get_flag("derived");
    let verbose = cli_args.get_flag("verbose");
    return (jsonin, csvout, graphout, htmlout, derived, verbose);
}
