use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info, span, trace, Level};

use crate::error::{HeatmapError, HeatmapResult};
use crate::instrumented_reader::InstrumentedReader;
use crate::parse::{ParseMode, RowLocation, Sample, Y_BUCKETS};

/// Per-x totals, indexed by x bucket from 0 to xmax.
pub type ColumnSums = Vec<u64>;

/// Accumulates (x bucket, y bucket) counts across any number of sample files.
///
/// Ingest every input first, then derive the column sums once and stream the
/// normalized grid with [`HeatmapBuilder::emit_grid`]. Each emitted column is
/// the distribution of that x bucket's samples over the 101 y buckets.
#[derive(Debug, Default)]
pub struct HeatmapBuilder {
    mode: ParseMode,
    counts: HashMap<(i64, i64), u64>,
    xmax: i64,
    samples: u64,
}

impl HeatmapBuilder {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Highest x bucket seen so far; never below 0.
    pub fn xmax(&self) -> i64 {
        self.xmax
    }

    /// Number of samples accepted so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn count(&self, x_bucket: i64, y_bucket: i64) -> u64 {
        self.counts.get(&(x_bucket, y_bucket)).copied().unwrap_or(0)
    }

    /// Number of grid columns, `xmax + 1`, if that fits in memory indexing.
    pub fn width(&self) -> Option<usize> {
        usize::try_from(self.xmax).ok()?.checked_add(1)
    }

    /// Ingest files in the given order. Stops at the first file that fails.
    pub fn ingest<P: AsRef<Path>>(&mut self, paths: &[P]) -> HeatmapResult<()> {
        for path in paths {
            self.ingest_file(path.as_ref())?;
        }
        Ok(())
    }

    pub fn ingest_file(&mut self, path: &Path) -> HeatmapResult<()> {
        let _span = span!(Level::INFO, "ingest_file", path = %path.display()).entered();

        let file = File::open(path).map_err(|e| HeatmapError::io(path, e))?;
        let reader = InstrumentedReader::new(file, |bytes| {
            trace!("read {} MiB of {}", bytes / (1024 * 1024), path.display());
        });
        let rows = self.ingest_reader(BufReader::new(reader), path)?;

        info!("ingested {} rows from {}", rows, path.display());
        Ok(())
    }

    /// Ingest one file's worth of lines. The first line is a header and is
    /// skipped unread. `path` only labels errors. Returns the number of data rows.
    pub fn ingest_reader<R: BufRead>(&mut self, mut reader: R, path: &Path) -> HeatmapResult<usize> {
        let mut raw = Vec::new();
        let mut index = 0usize;
        loop {
            raw.clear();
            let n = reader
                .read_until(b'\n', &mut raw)
                .map_err(|e| HeatmapError::io(path, e))?;
            if n == 0 {
                break;
            }
            index += 1;
            if index == 1 {
                debug!("skipping header of {}", path.display());
                continue;
            }

            let line = String::from_utf8_lossy(&raw);
            let at = RowLocation { path, line: index };
            let sample = Sample::parse(&line, self.mode, at)?;
            let y_bucket = sample.y_bucket(at)?;
            trace!(line = index, x = sample.x_bucket, y = sample.y_value, y_bucket, "sample");
            self.add(sample.x_bucket, y_bucket);
        }
        Ok(index.saturating_sub(1))
    }

    /// Record one sample. `y_bucket` must already be in `0..=100`.
    pub fn add(&mut self, x_bucket: i64, y_bucket: i64) {
        debug_assert!((0..=Y_BUCKETS).contains(&y_bucket));
        *self.counts.entry((x_bucket, y_bucket)).or_insert(0) += 1;
        self.xmax = self.xmax.max(x_bucket);
        self.samples += 1;
    }

    /// Total count for every x bucket in `0..=xmax`. Samples with a negative
    /// x bucket fall outside the grid and are not counted.
    pub fn compute_column_sums(&self) -> HeatmapResult<ColumnSums> {
        let too_wide = || HeatmapError::GridTooWide { xmax: self.xmax };
        let width = self.width().ok_or_else(too_wide)?;
        let mut sums = ColumnSums::new();
        sums.try_reserve_exact(width).map_err(|_| too_wide())?;
        sums.resize(width, 0);

        for (&(x, _), &count) in &self.counts {
            if x >= 0 {
                sums[x as usize] += count;
            }
        }
        debug!(
            "column sums computed: {} columns, {} empty",
            width,
            sums.iter().filter(|&&s| s == 0).count()
        );
        Ok(sums)
    }

    /// Fraction of column `x_bucket` that falls in `y_bucket`; 0 for empty columns.
    pub fn ratio(&self, sums: &[u64], x_bucket: i64, y_bucket: i64) -> f64 {
        match sums.get(x_bucket as usize) {
            Some(&total) if x_bucket >= 0 && total > 0 => {
                self.count(x_bucket, y_bucket) as f64 / total as f64
            }
            _ => 0.0,
        }
    }

    /// Write 101 rows (y bucket 0 first) of `xmax + 1` values. Every value is
    /// followed by a single space, every row by a newline. Columns missing
    /// from `sums` are written as empty.
    pub fn emit_grid<W: Write>(&self, sums: &[u64], out: &mut W) -> io::Result<()> {
        for y in 0..=Y_BUCKETS {
            for x in 0..=self.xmax {
                if sums.get(x as usize).copied().unwrap_or(0) == 0 {
                    out.write_all(b"0 ")?;
                } else {
                    write!(out, "{} ", self.ratio(sums, x, y))?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Read everything in `paths` and return the finished grid text.
pub fn render<P: AsRef<Path>>(paths: &[P], mode: ParseMode) -> HeatmapResult<String> {
    let mut builder = HeatmapBuilder::new(mode);
    builder.ingest(paths)?;
    let sums = builder.compute_column_sums()?;

    let mut out = Vec::new();
    builder
        .emit_grid(&sums, &mut out)
        .map_err(|e| HeatmapError::io("<memory>", e))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
