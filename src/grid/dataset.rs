//! Population dataset loading
//!
//! Reads the census grid CSV (columns `N`, `E`, `populations`, `countries`,
//! optionally preceded by an unnamed index column) and applies the country
//! down-weighting rule. Coordinates are shifted to the origin and divided by
//! the larger of the two spans, so distances keep their native proportions.

use super::{Domain, SpatialIndex, WeightedPoint};
use crate::error::{AntennaError, AntennaResult};
use antennae_spatial::Point;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Country code whose population counts at full weight.
pub const DOMESTIC_COUNTRY: &str = "PL";

/// Divisor applied to the population of every non-domestic record.
pub const FOREIGN_WEIGHT_DIVISOR: f64 = 100.0;

const REQUIRED_COLUMNS: [&str; 4] = ["N", "E", "populations", "countries"];

/// One raw row of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(rename = "E")]
    pub easting: f64,
    #[serde(rename = "N")]
    pub northing: f64,
    #[serde(rename = "populations")]
    pub population: f64,
    #[serde(rename = "countries")]
    pub country: String,
}

impl DatasetRecord {
    pub fn is_domestic(&self) -> bool {
        self.country == DOMESTIC_COUNTRY
    }

    fn validate(&self, line: usize) -> AntennaResult<()> {
        for (name, value) in [("N", self.northing), ("E", self.easting), ("populations", self.population)] {
            if !value.is_finite() {
                return Err(AntennaError::Dataset {
                    line,
                    message: format!("field '{}' is not finite", name),
                });
            }
        }
        if self.population < 0.0 {
            return Err(AntennaError::Dataset {
                line,
                message: format!("negative population {}", self.population),
            });
        }
        Ok(())
    }
}

/// Uniform mapping from native easting/northing onto the index domain.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    origin: Point,
    scale: f64,
    degenerate: [bool; 2],
    domain: Domain,
}

impl Frame {
    fn fit(records: &[DatasetRecord]) -> AntennaResult<Self> {
        let (e_min, e_max) = bounds(records.iter().map(|r| r.easting));
        let (n_min, n_max) = bounds(records.iter().map(|r| r.northing));
        let spans = [e_max - e_min, n_max - n_min];
        let scale = spans[0].max(spans[1]);
        let degenerate = [spans[0] <= 0.0, spans[1] <= 0.0];
        // A flat axis keeps a unit extent and its points sit at the centre
        let extent = |axis: usize| if degenerate[axis] { 1.0 } else { spans[axis] / scale };
        Ok(Self {
            origin: [e_min, n_min],
            scale,
            degenerate,
            domain: Domain::new(extent(0), extent(1))?,
        })
    }

    fn project(&self, easting: f64, northing: f64) -> Point {
        let axis = |value: f64, i: usize| {
            if self.degenerate[i] {
                0.5
            } else {
                (value - self.origin[i]) / self.scale
            }
        };
        [axis(easting, 0), axis(northing, 1)]
    }
}

/// The loaded grid, prior to index construction.
#[derive(Debug, Clone, Default)]
pub struct GeoGrid {
    records: Vec<DatasetRecord>,
}

fn csv_error(err: csv::Error) -> AntennaError {
    let line = err.position().map_or(0, |p| p.line() as usize);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => AntennaError::Io(io),
        _ => AntennaError::Dataset { line, message },
    }
}

impl GeoGrid {
    pub fn new(records: Vec<DatasetRecord>) -> Self {
        Self { records }
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> AntennaResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let grid = Self::from_reader(file)?;
        info!(path = %path.display(), records = grid.len(), "dataset loaded");
        Ok(grid)
    }

    pub fn from_reader<R: Read>(reader: R) -> AntennaResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(csv_error)?.clone();
        if headers.is_empty() {
            return Err(AntennaError::Dataset {
                line: 1,
                message: "empty dataset".to_string(),
            });
        }
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|name| !headers.iter().any(|h| h == **name))
        {
            return Err(AntennaError::Dataset {
                line: 1,
                message: format!("missing column '{}'", missing),
            });
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(csv_error)?;
            let line = row.position().map_or(0, |p| p.line() as usize);
            let record: DatasetRecord =
                row.deserialize(Some(&headers)).map_err(|e| AntennaError::Dataset {
                    line,
                    message: e.to_string(),
                })?;
            record.validate(line)?;
            records.push(record);
        }
        debug!(records = records.len(), "parsed dataset rows");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn frame(&self) -> AntennaResult<Frame> {
        if self.records.is_empty() {
            return Err(AntennaError::Configuration("dataset has no records".to_string()));
        }
        Frame::fit(&self.records)
    }

    /// Domain the projected coordinates live in: `[0, 1]` along the wider
    /// axis, proportionally less along the other.
    pub fn domain(&self) -> AntennaResult<Domain> {
        Ok(self.frame()?.domain)
    }

    /// Map a native (easting, northing) pair into the index domain.
    pub fn project(&self, easting: f64, northing: f64) -> AntennaResult<Point> {
        Ok(self.frame()?.project(easting, northing))
    }

    /// Weighted points in the projected domain.
    ///
    /// Non-domestic populations are divided by [`FOREIGN_WEIGHT_DIVISOR`];
    /// the result is renormalized to sum to 1.
    pub fn weighted_points(&self) -> AntennaResult<Vec<WeightedPoint>> {
        let frame = self.frame()?;

        let weights: Vec<f64> = self
            .records
            .iter()
            .map(|r| {
                if r.is_domestic() {
                    r.population
                } else {
                    r.population / FOREIGN_WEIGHT_DIVISOR
                }
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(AntennaError::Configuration(
                "dataset has zero total population".to_string(),
            ));
        }

        Ok(self
            .records
            .iter()
            .zip(weights)
            .map(|(r, w)| {
                let [x, y] = frame.project(r.easting, r.northing);
                WeightedPoint::new(x, y, w / total)
            })
            .collect())
    }

    pub fn build_index(&self) -> AntennaResult<SpatialIndex> {
        SpatialIndex::build_in(self.weighted_points()?, self.domain()?)
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
