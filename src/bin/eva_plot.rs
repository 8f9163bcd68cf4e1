use anyhow::{bail, Context, Result};
use eva_lpp::eva_plot::parse_cli;
use eva_lpp::init_tracing;
use eva_lpp::pipeline::{CsvLoader, Pipeline};

fn main() -> Result<()> {
    let (csvin, graphout, htmlout, verbose) = parse_cli();
    init_tracing(verbose);
    println!(
        "read data from {} and plot to {}",
        csvin.display(),
        graphout.display()
    );
    let mut charts = vec![graphout];
    charts.extend(htmlout);
    let report = Pipeline::new()
        .with_loader(CsvLoader)
        .run(&csvin, None, &charts)
        .with_context(|| format!("could not plot {}", csvin.display()))?;
    if !report.is_complete() {
        bail!("{}", report.failures.join("; "));
    }
    Ok(())
}
