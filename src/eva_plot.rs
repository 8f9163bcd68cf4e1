use super::{DEFAULT_CSVOUT, VERSION};
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Takes the CLI arguments that control the plotting of an exported csv.
pub fn parse_cli() -> (PathBuf, PathBuf, Option<PathBuf>, bool) {
    let arg_csvin = Arg::new("input_csvfile")
        .help("name of the csv file exported by eva_process")
        .short('f')
        .long("csvfile")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .default_value(DEFAULT_CSVOUT);
    let arg_graph = Arg::new("output_graph")
        .help("name of the output chart, svg for .svg and png otherwise")
        .short('o')
        .long("graph")
        .num_args(1)
        .value_parser(value_parser!(PathBuf));
    let arg_html = Arg::new("output_html")
        .help("also write the chart as an interactive html page")
        .long("html")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .required(false);
    let arg_verbose = Arg::new("verbose")
        .help("print verbose information")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue);
    let cli_args = Command::new("EVA_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the cumulative EVA time from the exported csv")
        .arg(arg_csvin)
        .arg(arg_graph)
        .arg(arg_html)
        .arg(arg_verbose)
        .get_matches();
    // csvin get_one will always return Some(T) because the default was set
    let csvin: PathBuf = cli_args
        .get_one::<PathBuf>("input_csvfile")
        .unwrap()
        .to_owned();
    // the graph has no default because it is defined based on the csvin name
    let graphout = match cli_args.get_one::<PathBuf>("output_graph") {
        Some(p) => p.to_owned(),
        None => csvin.with_extension("png"),
    };
    let htmlout = cli_args.get_one::<PathBuf>("output_html").cloned();
    let verbose = cli_args.get_flag("verbose");
    return (csvin, graphout, htmlout, verbose);
}
