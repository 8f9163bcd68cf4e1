use crate::utils::*;
use chrono::prelude::*;
use plotly::common::{Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
pub mod error;
pub mod eva_plot;
pub mod eva_process;
pub mod pipeline;
pub mod utils;

pub use error::EvaError;

// constants
pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
pub const DATE_COLUMN: &str = "date";
pub const ID_COLUMN: &str = "eva";
pub const DURATION_COLUMN: &str = "duration";
pub const DURATION_HOURS_COLUMN: &str = "duration_hours";
pub const CUMULATIVE_COLUMN: &str = "cumulative_time";
pub const REQUIRED_COLUMNS: [&str; 3] = [DATE_COLUMN, ID_COLUMN, DURATION_COLUMN];

pub const PLOT_TITLE: &str = "Cumulative Extravehicular Activity (EVA) Time Over Years";
pub const PLOT_XDESC: &str = "Year";
pub const PLOT_YDESC: &str = "Total time spent in space to date (hours)";
pub const PLOT_LEGEND: &str = "Cumulative EVA Time";
const PLOT_SIZE: (u32, u32) = (1200, 800);

// default paths, relative to the working directory
pub const DEFAULT_JSONIN: &str = "./eva-data.json";
pub const DEFAULT_CSVOUT: &str = "./eva-data.csv";
pub const DEFAULT_GRAPHOUT: &str = "./cumulative_eva_graph.png";

/// A single cell of the EVA table.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Field {
    /// NAN counts as missing, as a failed float coercion would.
    pub fn is_missing(&self) -> bool {
        match self {
            Field::Missing => true,
            Field::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    fn from_json(v: &Value) -> Field {
        match v {
            Value::Null => Field::Missing,
            Value::Bool(b) => Field::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Field::Missing, Field::Number),
            Value::String(s) => Field::Text(s.to_owned()),
            other => Field::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Missing => Ok(()),
            Field::Bool(b) => write!(f, "{}", b),
            Field::Number(n) if n.fract() == 0. && n.abs() < 1E+15 => write!(f, "{:.1}", n),
            Field::Number(n) => write!(f, "{}", n),
            Field::Text(s) => write!(f, "{}", s),
            Field::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// The main struct for the EVA records.
/// Rows follow the column order; the derived vectors are either empty
/// or as long as the rows.
#[derive(Debug, Clone, Default)]
pub struct EvaTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Field>>,
    pub duration_hours: Vec<f64>,
    pub cumulative_time: Vec<f64>,
}

impl EvaTable {
    /// Initiate a new EvaTable with the given columns
    /// and capacity for the rows.
    pub fn new(columns: Vec<String>, capacity: usize) -> EvaTable {
        EvaTable {
            columns,
            rows: Vec::with_capacity(capacity),
            duration_hours: Vec::new(),
            cumulative_time: Vec::new(),
        }
    }

    /// Initiate an EvaTable from a JSON file holding an array of objects.
    pub fn from_json<P>(fin: P) -> Result<EvaTable, EvaError>
    where
        P: AsRef<Path>,
    {
        let path = fin.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| EvaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        EvaTable::parse_json(&content, path)
    }

    /// Same as from_json, for a document already in memory.
    pub fn from_json_str(s: &str) -> Result<EvaTable, EvaError> {
        EvaTable::parse_json(s, Path::new("<memory>"))
    }

    /// Columns are the union of the object keys, in first-seen order.
    /// Absent keys and nulls become missing cells, left for the cleaning;
    /// the date is parsed here and an unparseable one fails the load.
    fn parse_json(s: &str, path: &Path) -> Result<EvaTable, EvaError> {
        let load_err = |message: String| EvaError::DataLoad {
            path: path.to_path_buf(),
            message,
        };
        let document: Value = serde_json::from_str(s).map_err(|source| EvaError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let records = match document {
            Value::Array(records) => records,
            _ => return Err(load_err("expected an array of records".to_string())),
        };
        let mut objects = Vec::with_capacity(records.len());
        for (i, r) in records.into_iter().enumerate() {
            match r {
                Value::Object(o) => objects.push(o),
                other => return Err(load_err(format!("record {} is not an object: {}", i, other))),
            }
        }
        let mut columns: Vec<String> = Vec::new();
        for o in objects.iter() {
            for k in o.keys() {
                if !columns.contains(k) {
                    columns.push(k.to_owned());
                }
            }
        }
        if !objects.is_empty() {
            if let Some(c) = REQUIRED_COLUMNS
                .iter()
                .find(|c| !columns.iter().any(|k| k.as_str() == **c))
            {
                return Err(load_err(format!("no record has the '{}' field", c)));
            }
        }
        let mut table = EvaTable::new(columns, objects.len());
        for (i, o) in objects.iter().enumerate() {
            let mut row = Vec::with_capacity(table.columns.len());
            for c in table.columns.iter() {
                let field = match (c.as_str(), o.get(c)) {
                    (_, None) => Field::Missing,
                    (DATE_COLUMN, Some(Value::String(s))) if s.trim().is_empty() => Field::Missing,
                    (DATE_COLUMN, Some(Value::String(s))) => match parse_date(s) {
                        Some(d) => Field::Date(d),
                        None => return Err(load_err(format!("record {}: invalid date '{}'", i, s))),
                    },
                    (DATE_COLUMN, Some(Value::Null)) => Field::Missing,
                    (DATE_COLUMN, Some(v)) => {
                        return Err(load_err(format!("record {}: invalid date {}", i, v)))
                    }
                    (_, Some(v)) => Field::from_json(v),
                };
                row.push(field);
            }
            table.rows.push(row);
        }
        debug!(
            "loaded {} records with columns {:?} from {}",
            table.rows.len(),
            table.columns,
            path.display()
        );
        Ok(table)
    }

    /// Initiate an EvaTable from a csv written by to_csv.
    /// The date is parsed, all the other cells are kept as text;
    /// derived columns, when present, are read back as derived vectors.
    pub fn from_csv<P>(fin: P) -> Result<EvaTable, EvaError>
    where
        P: AsRef<Path>,
    {
        let path = fin.as_ref();
        let load_err = |message: String| EvaError::DataLoad {
            path: path.to_path_buf(),
            message,
        };
        let mut rdr = csv::Reader::from_path(path).map_err(|e| load_err(e.to_string()))?;
        let header: Vec<String> = rdr
            .headers()
            .map_err(|e| load_err(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let hours_idx = header.iter().position(|h| h == DURATION_HOURS_COLUMN);
        let cumulative_idx = header.iter().position(|h| h == CUMULATIVE_COLUMN);
        let columns: Vec<String> = header
            .iter()
            .filter(|h| *h != DURATION_HOURS_COLUMN && *h != CUMULATIVE_COLUMN)
            .cloned()
            .collect();
        if !columns.is_empty() {
            if let Some(c) = REQUIRED_COLUMNS
                .iter()
                .find(|c| !columns.iter().any(|k| k.as_str() == **c))
            {
                return Err(load_err(format!("no '{}' column in the header", c)));
            }
        }
        let mut table = EvaTable::new(columns, 1000);
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| load_err(e.to_string()))?;
            let mut row = Vec::with_capacity(table.columns.len());
            for (j, cell) in record.iter().enumerate() {
                if Some(j) == hours_idx || Some(j) == cumulative_idx {
                    let v = cell
                        .parse::<f64>()
                        .map_err(|e| load_err(format!("row {}: '{}' {}", i, cell, e)))?;
                    if Some(j) == hours_idx {
                        table.duration_hours.push(v);
                    } else {
                        table.cumulative_time.push(v);
                    }
                } else if header[j] == DATE_COLUMN {
                    row.push(match parse_date(cell) {
                        Some(d) => Field::Date(d),
                        None if cell.trim().is_empty() => Field::Missing,
                        None => return Err(load_err(format!("row {}: invalid date '{}'", i, cell))),
                    });
                } else {
                    row.push(Field::Text(cell.to_string()));
                }
            }
            table.rows.push(row);
        }
        debug!("read {} rows from {}", table.rows.len(), path.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// True once duration_hours and cumulative_time cover all the rows.
    pub fn is_derived(&self) -> bool {
        self.duration_hours.len() == self.rows.len()
            && self.cumulative_time.len() == self.rows.len()
    }

    /// All the values of one column, None if the column does not exist.
    pub fn column(&self, name: &str) -> Option<Vec<&Field>> {
        let i = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[i]).collect())
    }

    /// The dates of the rows, skipping missing ones.
    pub fn dates(&self) -> Vec<NaiveDate> {
        match self.column(DATE_COLUMN) {
            Some(c) => c
                .into_iter()
                .filter_map(|f| match f {
                    Field::Date(d) => Some(*d),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Coerce the id column to float.
    /// Missing values stay missing, anything non-numeric is an error.
    pub fn coerce_id_to_float(&mut self) -> Result<(), EvaError> {
        let idx = match self.column_index(ID_COLUMN) {
            Some(idx) => idx,
            None => return Ok(()),
        };
        for (i, row) in self.rows.iter_mut().enumerate() {
            let coerced = match &row[idx] {
                Field::Missing => Field::Missing,
                Field::Number(n) => Field::Number(*n),
                Field::Bool(b) => Field::Number(if *b { 1. } else { 0. }),
                Field::Text(s) => match s.trim().parse::<f64>() {
                    Ok(n) => Field::Number(n),
                    Err(_) => {
                        return Err(EvaError::TypeConversion {
                            row: i,
                            column: ID_COLUMN.to_string(),
                            value: format!("'{}'", s),
                        })
                    }
                },
                other => {
                    return Err(EvaError::TypeConversion {
                        row: i,
                        column: ID_COLUMN.to_string(),
                        value: other.to_string(),
                    })
                }
            };
            row[idx] = coerced;
        }
        Ok(())
    }

    /// Remove the rows with any missing value, return how many were removed.
    pub fn drop_missing(&mut self) -> usize {
        let ncols = self.columns.len();
        let before = self.rows.len();
        self.rows
            .retain(|r| r.len() == ncols && !r.iter().any(|f| f.is_missing()));
        let dropped = before - self.rows.len();
        if dropped > 0 {
            warn!("dropped {} of {} records with missing values", dropped, before);
        }
        dropped
    }

    /// Stable sort by date, equal dates keep their relative order.
    pub fn sort_by_date(&mut self) {
        let idx = match self.column_index(DATE_COLUMN) {
            Some(idx) => idx,
            None => return,
        };
        self.rows.sort_by_key(|r| match &r[idx] {
            Field::Date(d) => Some(*d),
            _ => None,
        });
    }

    /// Coerce, drop missing, and sort, consuming the loaded table.
    /// Derived values do not survive the cleaning.
    pub fn clean(mut self) -> Result<EvaTable, EvaError> {
        self.coerce_id_to_float()?;
        self.drop_missing();
        self.sort_by_date();
        self.duration_hours.clear();
        self.cumulative_time.clear();
        Ok(self)
    }

    /// Convert the durations to decimal hours and accumulate them
    /// in the current row order. Nothing is set if any duration is invalid.
    pub fn derive_cumulative_time(&mut self) -> Result<(), EvaError> {
        let idx = match self.column_index(DURATION_COLUMN) {
            Some(idx) => idx,
            None if self.rows.is_empty() => {
                self.duration_hours.clear();
                self.cumulative_time.clear();
                return Ok(());
            }
            None => {
                return Err(EvaError::Format {
                    row: 0,
                    value: String::new(),
                })
            }
        };
        let mut hours = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let h = match &row[idx] {
                Field::Text(s) => parse_duration_hours(s),
                _ => None,
            };
            match h {
                Some(h) => hours.push(h),
                None => {
                    return Err(EvaError::Format {
                        row: i,
                        value: row[idx].to_string(),
                    })
                }
            }
        }
        self.cumulative_time = cumulative_sum(&hours);
        self.duration_hours = hours;
        Ok(())
    }

    /// Write the table to a csv file at the given path, header first, no index.
    /// Append the derived columns when asked and available.
    pub fn to_csv<P>(&self, fout: P, with_derived: bool) -> Result<(), EvaError>
    where
        P: AsRef<Path>,
    {
        let path = fout.as_ref();
        let write_err = |source: csv::Error| EvaError::Write {
            path: path.to_path_buf(),
            source,
        };
        let derived = with_derived && self.is_derived();
        let mut wtr = csv::Writer::from_path(path).map_err(write_err)?;
        let mut header: Vec<&str> = self.columns.iter().map(|c| c.as_str()).collect();
        if derived {
            header.push(DURATION_HOURS_COLUMN);
            header.push(CUMULATIVE_COLUMN);
        }
        // an empty table gives an empty file, not a lone empty record
        if !header.is_empty() {
            wtr.write_record(&header).map_err(write_err)?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            let mut record: Vec<String> = row.iter().map(|f| f.to_string()).collect();
            if derived {
                record.push(self.duration_hours[i].to_string());
                record.push(self.cumulative_time[i].to_string());
            }
            wtr.write_record(&record).map_err(write_err)?;
        }
        wtr.flush()
            .map_err(|e| EvaError::write_io(path.to_path_buf(), e))?;
        info!("wrote {} records to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// The dates and cumulative times to plot, or why they cannot be plotted.
    fn plot_series(&self, path: &Path) -> Result<(Vec<NaiveDate>, Vec<f64>), EvaError> {
        let render_err = |message: &str| EvaError::Render {
            path: path.to_path_buf(),
            message: message.to_string(),
        };
        if self.rows.is_empty() {
            return Err(render_err("no records to plot"));
        }
        if !self.is_derived() {
            return Err(render_err("cumulative time has not been derived"));
        }
        let dates = self.dates();
        if dates.len() != self.cumulative_time.len() {
            return Err(render_err("some records have no date"));
        }
        Ok((dates, self.cumulative_time.clone()))
    }

    /// Plot the cumulative time against the date,
    /// to svg for a .svg path and to png otherwise.
    pub fn plot_cumulative<P>(&self, fout: P) -> Result<(), EvaError>
    where
        P: AsRef<Path>,
    {
        let path = fout.as_ref();
        let (dates, cumulative) = self.plot_series(path)?;
        let is_svg = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("svg"));
        let drawn = if is_svg {
            draw_cumulative(
                SVGBackend::new(path, PLOT_SIZE).into_drawing_area(),
                &dates,
                &cumulative,
            )
        } else {
            draw_cumulative(
                BitMapBackend::new(path, PLOT_SIZE).into_drawing_area(),
                &dates,
                &cumulative,
            )
        };
        drawn.map_err(|e| EvaError::Render {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        info!("plotted {} records to {}", dates.len(), path.display());
        Ok(())
    }

    /// Write the same chart as a standalone interactive html page.
    pub fn plot_cumulative_html<P>(&self, fout: P) -> Result<(), EvaError>
    where
        P: AsRef<Path>,
    {
        let path = fout.as_ref();
        let (dates, cumulative) = self.plot_series(path)?;
        let x: Vec<String> = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
        let trace = Scatter::new(x, cumulative)
            .mode(Mode::LinesMarkers)
            .name(PLOT_LEGEND);
        let layout = Layout::new()
            .title(Title::new(PLOT_TITLE))
            .show_legend(true)
            .x_axis(Axis::new().title(Title::new(PLOT_XDESC)).tick_angle(45.))
            .y_axis(Axis::new().title(Title::new(PLOT_YDESC)));
        let mut plot = Plot::new();
        plot.add_trace(trace);
        plot.set_layout(layout);
        std::fs::write(path, plot.to_html()).map_err(|e| EvaError::Render {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        info!("wrote html chart to {}", path.display());
        Ok(())
    }

    /// Total decimal hours, zero before the derivation.
    pub fn total_hours(&self) -> f64 {
        self.cumulative_time.last().copied().unwrap_or(0.)
    }
}

impl fmt::Display for EvaTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let derived = self.is_derived() && !self.rows.is_empty();
        write!(f, "{}", self.columns.join(","))?;
        if derived {
            write!(f, ",{},{}", DURATION_HOURS_COLUMN, CUMULATIVE_COLUMN)?;
        }
        writeln!(f)?;
        for (i, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            write!(f, "{}", cells.join(","))?;
            if derived {
                write!(f, ",{:.3},{:.3}", self.duration_hours[i], self.cumulative_time[i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Draw the line and markers of the cumulative time on any plotters backend.
/// The date axis is padded by a month on each side.
fn draw_cumulative<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    dates: &[NaiveDate],
    cumulative: &[f64],
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let (xmin, xmax) = min_and_max(dates.iter()).ok_or("no dates to plot")?;
    let xmin = xmin - chrono::Duration::days(30);
    let xmax = xmax + chrono::Duration::days(30);
    let xfmt = suitable_xfmt(xmax - xmin);
    let (_, ymax) = min_and_max(cumulative.iter()).ok_or("no values to plot")?;
    let ymax = if ymax > 0. { ymax * 1.05 } else { 1. };
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(PLOT_TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(90)
        .y_label_area_size(80)
        .build_cartesian_2d(xmin..xmax, 0f64..ymax)?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(100, 100, 100).mix(0.5).stroke_width(1))
        .set_all_tick_mark_size(2)
        .x_labels(16)
        .y_labels(12)
        .x_label_style(
            ("sans-serif", 15)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", 15))
        .x_label_formatter(&|x: &NaiveDate| x.format(xfmt).to_string())
        .y_label_formatter(&|y: &f64| format!("{:.0}", y))
        .x_desc(PLOT_XDESC)
        .y_desc(PLOT_YDESC)
        .draw()?;
    let points: Vec<(NaiveDate, f64)> = dates
        .iter()
        .copied()
        .zip(cumulative.iter().copied())
        .collect();
    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLACK))?
        .label(PLOT_LEGEND)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));
    chart.draw_series(points.iter().map(|p| Circle::new(*p, 3, BLACK.filled())))?;
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Install the stdout subscriber for the binaries.
/// RUST_LOG wins over the verbose flag when set.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    // run tests with:
    // cargo test -- --nocapture
    // to allow println! to stdout

    const SCENARIO: &str = r#"[
        {"date":"2020-01-01","eva":"1","duration":"1:30"},
        {"date":"2020-01-02","eva":"2","duration":"0:30"}
    ]"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn f64vec_close(va: &[f64], vb: &[f64]) -> bool {
        (va.len() == vb.len()) && va.iter().zip(vb).all(|(a, b)| (a - b).abs() < 1E-9)
    }

    #[test]
    fn scenario_two_records() {
        let mut tl = EvaTable::from_json_str(SCENARIO).unwrap().clean().unwrap();
        assert_eq!(tl.columns, vec!["date", "eva", "duration"]);
        assert_eq!(tl.dates(), vec![date(2020, 1, 1), date(2020, 1, 2)]);
        tl.derive_cumulative_time().unwrap();
        assert_eq!(tl.duration_hours, vec![1.5, 0.5]);
        assert_eq!(tl.cumulative_time, vec![1.5, 2.0]);
        assert_eq!(tl.total_hours(), 2.0);

        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("eva-data.csv");
        tl.to_csv(&fout, false).unwrap();
        let written = std::fs::read_to_string(&fout).unwrap();
        assert_eq!(
            written,
            "date,eva,duration\n2020-01-01,1.0,1:30\n2020-01-02,2.0,0:30\n"
        );
    }

    #[test]
    fn fixture_is_cleaned_and_sorted() {
        let tl = EvaTable::from_json("./test/eva-data.json").unwrap();
        assert_eq!(tl.len(), 10);
        assert_eq!(
            tl.columns,
            vec!["eva", "country", "crew", "vehicle", "date", "duration", "purpose"]
        );
        let tl = tl.clean().unwrap();
        // one null duration, one absent purpose, one empty date
        assert_eq!(tl.len(), 7);
        assert!(tl.rows.iter().all(|r| r.iter().all(|f| !f.is_missing())));
        let dates = tl.dates();
        assert_eq!(dates.len(), tl.len());
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(dates[0], date(1965, 3, 18));
        let ids: Vec<String> = tl
            .column(ID_COLUMN)
            .unwrap()
            .iter()
            .map(|f| f.to_string())
            .collect();
        // 7.0 and 8.0 share a date and keep their input order
        assert_eq!(ids, vec!["2.0", "1.0", "3.0", "4.0", "7.0", "8.0", "6.0"]);
    }

    #[test]
    fn missing_field_record_is_dropped() {
        let s = r#"[
            {"date":"2001-01-01","eva":1,"duration":"1:00","crew":"A"},
            {"date":"2002-01-01","eva":2,"duration":"2:00"},
            {"date":"2003-01-01","eva":null,"duration":"3:00","crew":"C"}
        ]"#;
        let tl = EvaTable::from_json_str(s).unwrap().clean().unwrap();
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.rows[0][3], Field::Text("A".to_string()));
    }

    #[test]
    fn non_numeric_id_fails_conversion() {
        let s = r#"[{"date":"2001-01-01","eva":"one","duration":"1:00"}]"#;
        match EvaTable::from_json_str(s).unwrap().clean() {
            Err(EvaError::TypeConversion { row, value, .. }) => {
                assert_eq!(row, 0);
                assert_eq!(value, "'one'");
            }
            other => panic!("expected a type conversion error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_duration_fails_format() {
        let s = r#"[
            {"date":"2001-01-01","eva":1,"duration":"1:00"},
            {"date":"2002-01-01","eva":2,"duration":"abc"}
        ]"#;
        let mut tl = EvaTable::from_json_str(s).unwrap().clean().unwrap();
        match tl.derive_cumulative_time() {
            Err(EvaError::Format { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "abc");
            }
            other => panic!("expected a format error, got {:?}", other),
        }
        assert!(tl.duration_hours.is_empty());
        assert!(tl.cumulative_time.is_empty());
    }

    #[test]
    fn bad_documents_fail_to_load() {
        assert!(matches!(
            EvaTable::from_json("./test/does-not-exist.json"),
            Err(EvaError::Read { .. })
        ));
        assert!(matches!(
            EvaTable::from_json_str("[{\"date\": "),
            Err(EvaError::Json { .. })
        ));
        assert!(matches!(
            EvaTable::from_json_str("{\"date\": \"2001-01-01\"}"),
            Err(EvaError::DataLoad { .. })
        ));
        assert!(matches!(
            EvaTable::from_json_str("[1, 2]"),
            Err(EvaError::DataLoad { .. })
        ));
        assert!(matches!(
            EvaTable::from_json_str(r#"[{"date":"yesterday","eva":1,"duration":"1:00"}]"#),
            Err(EvaError::DataLoad { .. })
        ));
        assert!(matches!(
            EvaTable::from_json_str(r#"[{"date":"2001-01-01","eva":1}]"#),
            Err(EvaError::DataLoad { .. })
        ));
        assert!(EvaTable::from_json_str("[]").unwrap().is_empty());
    }

    #[test]
    fn csv_round_trip_reproduces_derived_values() {
        let mut tl = EvaTable::from_json("./test/eva-data.json")
            .unwrap()
            .clean()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("eva-data.csv");
        tl.to_csv(&fout, false).unwrap();
        tl.derive_cumulative_time().unwrap();

        let mut rtl = EvaTable::from_csv(&fout).unwrap().clean().unwrap();
        assert_eq!(rtl.columns, tl.columns);
        assert_eq!(rtl.dates(), tl.dates());
        rtl.derive_cumulative_time().unwrap();
        assert!(f64vec_close(&rtl.duration_hours, &tl.duration_hours));
        assert!(f64vec_close(&rtl.cumulative_time, &tl.cumulative_time));
    }

    #[test]
    fn csv_with_derived_columns() {
        let mut tl = EvaTable::from_json_str(SCENARIO).unwrap().clean().unwrap();
        tl.derive_cumulative_time().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("derived.csv");
        tl.to_csv(&fout, true).unwrap();
        let written = std::fs::read_to_string(&fout).unwrap();
        let header = written.lines().next().unwrap();
        assert_eq!(header, "date,eva,duration,duration_hours,cumulative_time");
        let rtl = EvaTable::from_csv(&fout).unwrap();
        assert_eq!(rtl.columns, vec!["date", "eva", "duration"]);
        assert_eq!(rtl.duration_hours, vec![1.5, 0.5]);
        assert_eq!(rtl.cumulative_time, vec![1.5, 2.0]);
        println!("{}", rtl);
    }

    #[test]
    fn csv_to_unwritable_path() {
        let tl = EvaTable::from_json_str(SCENARIO).unwrap().clean().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("missing_dir").join("eva-data.csv");
        assert!(matches!(tl.to_csv(&fout, false), Err(EvaError::Write { .. })));
    }

    #[test]
    fn plot_requires_derived_rows() {
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("chart.png");
        let tl = EvaTable::from_json_str(SCENARIO).unwrap().clean().unwrap();
        assert!(matches!(tl.plot_cumulative(&fout), Err(EvaError::Render { .. })));
        let empty = EvaTable::from_json_str("[]").unwrap();
        assert!(matches!(empty.plot_cumulative(&fout), Err(EvaError::Render { .. })));
    }

    #[test]
    fn plot_to_unwritable_path() {
        let mut tl = EvaTable::from_json_str(SCENARIO).unwrap().clean().unwrap();
        tl.derive_cumulative_time().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("missing_dir").join("chart.png");
        assert!(matches!(tl.plot_cumulative(&fout), Err(EvaError::Render { .. })));
    }

    #[test]
    fn csv_without_required_columns_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let no_date = dir.path().join("no_date.csv");
        std::fs::write(&no_date, "eva,duration\n1,1:30\n2,0:30\n").unwrap();
        match EvaTable::from_csv(&no_date) {
            Err(EvaError::DataLoad { message, .. }) => assert!(message.contains("'date'")),
            other => panic!("expected a load error, got {:?}", other),
        }
        let no_duration = dir.path().join("no_duration.csv");
        std::fs::write(&no_duration, "date,eva\n2020-01-01,1\n").unwrap();
        match EvaTable::from_csv(&no_duration) {
            Err(EvaError::DataLoad { message, .. }) => assert!(message.contains("'duration'")),
            other => panic!("expected a load error, got {:?}", other),
        }
    }

    #[test]
    fn empty_table_writes_empty_csv() {
        let tl = EvaTable::from_json_str("[]").unwrap().clean().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("empty.csv");
        tl.to_csv(&fout, false).unwrap();
        assert_eq!(std::fs::read_to_string(&fout).unwrap(), "");
        assert!(EvaTable::from_csv(&fout).unwrap().is_empty());
    }

    #[test]
    fn png_and_svg_charts() {
        let mut tl = EvaTable::from_json("./test/eva-data.json")
            .unwrap()
            .clean()
            .unwrap();
        tl.derive_cumulative_time().unwrap();
        let dir = tempfile::tempdir().unwrap();
        for name in ["chart.png", "chart.svg"] {
            let fout = dir.path().join(name);
            tl.plot_cumulative(&fout).unwrap();
            let size = std::fs::metadata(&fout).unwrap().len();
            assert!(size > 0, "{} is empty", name);
        }
        let svg = std::fs::read_to_string(dir.path().join("chart.svg")).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn html_chart() {
        let mut tl = EvaTable::from_json("./test/eva-data.json")
            .unwrap()
            .clean()
            .unwrap();
        tl.derive_cumulative_time().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("chart.html");
        tl.plot_cumulative_html(&fout).unwrap();
        let html = std::fs::read_to_string(&fout).unwrap();
        assert!(html.contains(PLOT_LEGEND));
        assert!(html.contains("1965-03-18"));
    }

    #[test]
    fn field_display_matches_csv_conventions() {
        assert_eq!(Field::Number(1.).to_string(), "1.0");
        assert_eq!(Field::Number(2.5).to_string(), "2.5");
        assert_eq!(Field::Date(date(1965, 6, 3)).to_string(), "1965-06-03");
        assert_eq!(Field::Missing.to_string(), "");
        assert!(Field::Number(f64::NAN).is_missing());
        assert!(!Field::Text(String::new()).is_missing());
    }
}
