use anyhow::{bail, Context, Result};
use eva_lpp::eva_process::parse_cli;
use eva_lpp::init_tracing;
use eva_lpp::pipeline::{CsvExporter, Pipeline};

fn main() -> Result<()> {
    let (jsonin, csvout, graphout, htmlout, derived, verbose) = parse_cli();
    init_tracing(verbose);

    println!("--START--");
    if verbose {
        println!("jsonin {:?}", jsonin);
        println!("csvout {:?}", csvout);
        println!("graphout {:?}", graphout);
        println!("htmlout {:?}", htmlout);
        println!("derived {}", derived);
    }

    let mut charts = vec![graphout];
    charts.extend(htmlout);

    let result = Pipeline::new()
        .with_exporter(CsvExporter {
            with_derived: derived,
        })
        .run(&jsonin, Some(csvout.as_path()), &charts);
    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_load() => {
            println!("> no records loaded, nothing saved or plotted");
            return Err(e).with_context(|| format!("could not load {}", jsonin.display()));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("could not process {}", jsonin.display()))
        }
    };

    println!(
        "> {} of {} records kept, {:.2} hours in total",
        report.records_kept, report.records_loaded, report.total_hours
    );
    if verbose {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    println!("--END--");

    if !report.is_complete() {
        bail!("{}", report.failures.join("; "));
    }
    Ok(())
}
