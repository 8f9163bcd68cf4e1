//! The five stages of a run, load, clean, export, transform, render,
//! each behind a small trait so that any of them can be swapped.
//!
//! Load, clean, and transform failures stop the run.
//! Export and render failures are logged and collected in the report,
//! the remaining stages still run.

use crate::{EvaError, EvaTable};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub trait Loader {
    fn load(&self, fin: &Path) -> Result<EvaTable, EvaError>;
}

pub trait Cleaner {
    fn clean(&self, table: EvaTable) -> Result<EvaTable, EvaError>;
}

pub trait Exporter {
    fn export(&self, table: &EvaTable, fout: &Path) -> Result<(), EvaError>;

    /// Exporters that write the derived columns run after the transform.
    fn needs_derived(&self) -> bool {
        false
    }
}

pub trait Transformer {
    fn transform(&self, table: EvaTable) -> Result<EvaTable, EvaError>;
}

pub trait Renderer {
    fn render(&self, table: &EvaTable, fout: &Path) -> Result<(), EvaError>;
}

pub struct JsonLoader;

impl Loader for JsonLoader {
    fn load(&self, fin: &Path) -> Result<EvaTable, EvaError> {
        EvaTable::from_json(fin)
    }
}

/// Reload a csv previously exported by a run.
pub struct CsvLoader;

impl Loader for CsvLoader {
    fn load(&self, fin: &Path) -> Result<EvaTable, EvaError> {
        EvaTable::from_csv(fin)
    }
}

pub struct DropMissingCleaner;

impl Cleaner for DropMissingCleaner {
    fn clean(&self, table: EvaTable) -> Result<EvaTable, EvaError> {
        table.clean()
    }
}

#[derive(Default)]
pub struct CsvExporter {
    pub with_derived: bool,
}

impl Exporter for CsvExporter {
    fn export(&self, table: &EvaTable, fout: &Path) -> Result<(), EvaError> {
        table.to_csv(fout, self.with_derived)
    }

    fn needs_derived(&self) -> bool {
        self.with_derived
    }
}

pub struct CumulativeTransformer;

impl Transformer for CumulativeTransformer {
    fn transform(&self, mut table: EvaTable) -> Result<EvaTable, EvaError> {
        table.derive_cumulative_time()?;
        Ok(table)
    }
}

/// Html for a .html path, svg or png otherwise.
pub struct ChartRenderer;

impl Renderer for ChartRenderer {
    fn render(&self, table: &EvaTable, fout: &Path) -> Result<(), EvaError> {
        let is_html = fout
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("html"));
        if is_html {
            table.plot_cumulative_html(fout)
        } else {
            table.plot_cumulative(fout)
        }
    }
}

/// What a run produced.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    pub records_loaded: usize,
    pub records_kept: usize,
    pub csv_written: Option<PathBuf>,
    pub charts_written: Vec<PathBuf>,
    pub total_hours: f64,
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Pipeline {
    loader: Box<dyn Loader>,
    cleaner: Box<dyn Cleaner>,
    exporter: Box<dyn Exporter>,
    transformer: Box<dyn Transformer>,
    renderer: Box<dyn Renderer>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline {
            loader: Box::new(JsonLoader),
            cleaner: Box::new(DropMissingCleaner),
            exporter: Box::new(CsvExporter::default()),
            transformer: Box::new(CumulativeTransformer),
            renderer: Box::new(ChartRenderer),
        }
    }
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Pipeline {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_cleaner(mut self, cleaner: impl Cleaner + 'static) -> Pipeline {
        self.cleaner = Box::new(cleaner);
        self
    }

    pub fn with_exporter(mut self, exporter: impl Exporter + 'static) -> Pipeline {
        self.exporter = Box::new(exporter);
        self
    }

    pub fn with_transformer(mut self, transformer: impl Transformer + 'static) -> Pipeline {
        self.transformer = Box::new(transformer);
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Pipeline {
        self.renderer = Box::new(renderer);
        self
    }

    /// Run all the stages once.
    /// Without a csv path the export is skipped, each chart path is rendered in turn.
    pub fn run(
        &self,
        fin: &Path,
        csvout: Option<&Path>,
        charts: &[PathBuf],
    ) -> Result<RunReport, EvaError> {
        let mut report = RunReport::default();

        info!("reading {}", fin.display());
        let table = self.loader.load(fin).map_err(|e| halt("load", e))?;
        report.records_loaded = table.len();

        let table = self.cleaner.clean(table).map_err(|e| halt("clean", e))?;
        report.records_kept = table.len();
        info!(
            "kept {} of {} records after cleaning",
            report.records_kept, report.records_loaded
        );

        if !self.exporter.needs_derived() {
            self.export(&table, csvout, &mut report);
        }

        let table = self
            .transformer
            .transform(table)
            .map_err(|e| halt("transform", e))?;
        report.total_hours = table.total_hours();

        if self.exporter.needs_derived() {
            self.export(&table, csvout, &mut report);
        }

        for chart in charts.iter() {
            info!("plotting cumulative EVA time to {}", chart.display());
            match self.renderer.render(&table, chart) {
                Ok(()) => report.charts_written.push(chart.to_owned()),
                Err(e) => {
                    error!("render stage failed: {}", e);
                    report.failures.push(e.to_string());
                }
            }
        }
        Ok(report)
    }

    fn export(&self, table: &EvaTable, csvout: Option<&Path>, report: &mut RunReport) {
        let fout = match csvout {
            Some(fout) => fout,
            None => return,
        };
        info!("saving to csv {}", fout.display());
        match self.exporter.export(table, fout) {
            Ok(()) => report.csv_written = Some(fout.to_owned()),
            Err(e) => {
                error!("export stage failed: {}", e);
                report.failures.push(e.to_string());
            }
        }
    }
}

fn halt(stage: &str, e: EvaError) -> EvaError {
    error!("{} stage failed, stopping: {}", stage, e);
    e
}
