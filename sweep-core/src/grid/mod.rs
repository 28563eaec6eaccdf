//! Parameter grid enumeration.
//!
//! Expands the configured axes into the full, ordered sequence of
//! [`JobDescriptor`]s. Axes are nested outer to inner in a fixed order,
//! which only determines the dispatch order since all jobs are independent.
//!
//! The whole sequence is materialized up front, the total job count has to
//! be known before dispatching starts.
//!
//! [`JobDescriptor`]: ../job/struct.JobDescriptor.html

pub mod epistasis;

pub use epistasis::{EpistasisScales, FitnessModelKind};

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::job::JobDescriptor;

/// Job generation mode, selects the external program and the shape of its
/// argument list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Run the eco-evolutionary simulations on existing landscapes
    Simulate,
    /// Generate the fitness landscapes the simulations later load
    CreateLandscapes,
    /// Record the detailed time evolution of single landscapes
    Convergence,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Simulate
    }
}

/// Model variant the simulation runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Static fitness landscape without ecological interactions
    Null,
    /// Dynamic fitness landscape with ecological interactions
    Full,
}

impl Variant {
    /// Flag selecting the variant. The full model is the simulation
    /// programs' default and has no flag of its own.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            Variant::Null => Some("--null"),
            Variant::Full => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Null => "null",
            Variant::Full => "full",
        }
    }
}

/// Paths to the external programs, one per mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Executables {
    pub simulate: PathBuf,
    pub create_landscapes: PathBuf,
    pub convergence: PathBuf,
}

impl Default for Executables {
    fn default() -> Self {
        Executables {
            simulate: PathBuf::from("../simulations/target/release/ecoevo_landscapes"),
            create_landscapes: PathBuf::from("../simulations/target/release/create_landscape"),
            convergence: PathBuf::from("../simulations/target/release/convergence"),
        }
    }
}

impl Executables {
    pub fn for_mode(&self, mode: Mode) -> &PathBuf {
        match mode {
            Mode::Simulate => &self.simulate,
            Mode::CreateLandscapes => &self.create_landscapes,
            Mode::Convergence => &self.convergence,
        }
    }
}

/// Every axis of the parameter grid together with the fixed parameters
/// shared by all jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub mode: Mode,

    /// Model variants, outermost axis
    pub variants: Vec<Variant>,
    /// Correlations between the traits
    pub correlations: Vec<f64>,
    /// Epistasis parameter `a`, between fully epistatic (0) and fully
    /// additive (1)
    pub epistasis: Vec<f64>,
    pub mutation_rates: Vec<f64>,

    /// Fitness effect size
    pub sigma: f64,
    /// Mean of the additive fitness effects
    pub mean: f64,
    pub fitness_model: FitnessModelKind,

    /// Population sizes, passed to every job as a single list
    pub sizes: Vec<usize>,
    /// Amount of each resource, has to match the number of resources the
    /// simulation program was built with
    pub resources: Vec<f64>,

    /// Number of landscapes
    pub landscapes: usize,
    /// Index of the first landscape
    pub first_landscape: usize,
    /// Split the landscape range into jobs of at most this many landscapes
    pub landscape_chunk: Option<usize>,
    /// Replicates per landscape
    pub replicates: usize,
    /// Load existing landscapes instead of requiring them to be present
    pub load_landscape: bool,

    /// Directory under which convergence runs store their output
    pub convergence_dir: String,

    pub executables: Executables,
    /// Fixed number of decimal places for float arguments, shortest
    /// round-trip representation if not set
    pub float_precision: Option<usize>,
    /// Arguments appended verbatim to every job
    pub extra_args: Vec<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            mode: Mode::default(),
            variants: vec![Variant::Null, Variant::Full],
            correlations: vec![-0.9, 0., 0.9],
            epistasis: vec![0.9],
            mutation_rates: vec![0.001],
            sigma: 0.1,
            mean: 0.,
            fitness_model: FitnessModelKind::default(),
            sizes: vec![1000],
            resources: vec![1., 1.],
            landscapes: 100,
            first_landscape: 0,
            landscape_chunk: None,
            replicates: 50,
            load_landscape: false,
            convergence_dir: "convergence".to_string(),
            executables: Executables::default(),
            float_precision: None,
            extra_args: Vec::new(),
        }
    }
}

/// Single point of the grid, before it's rendered into arguments.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Point {
    variant: Option<Variant>,
    correlation: f64,
    a: f64,
    mutation_rate: f64,
    /// Half-open landscape index range
    landscapes: (usize, usize),
}

impl GridConfig {
    /// Checks every axis the selected mode uses.
    pub fn validate(&self) -> Result<()> {
        if self.mode != Mode::CreateLandscapes {
            non_empty("variants", &self.variants)?;
            non_empty("sizes", &self.sizes)?;
            non_empty("resources", &self.resources)?;
            if self.sizes.contains(&0) {
                return Err(Error::config("sizes", "population size can't be 0"));
            }
            for r in &self.resources {
                finite("resources", *r)?;
            }
        }
        non_empty("correlations", &self.correlations)?;
        non_empty("epistasis", &self.epistasis)?;
        non_empty("mutation_rates", &self.mutation_rates)?;

        for c in &self.correlations {
            finite("correlations", *c)?;
        }
        for a in &self.epistasis {
            finite("epistasis", *a)?;
            if !(-1. ..=1.).contains(a) {
                return Err(Error::config(
                    "epistasis",
                    format!("{} is outside of [-1, 1]", a),
                ));
            }
        }
        for m in &self.mutation_rates {
            finite("mutation_rates", *m)?;
            if *m < 0. {
                return Err(Error::config(
                    "mutation_rates",
                    format!("{} is negative", m),
                ));
            }
        }
        finite("sigma", self.sigma)?;
        finite("mean", self.mean)?;

        if self.landscapes == 0 {
            return Err(Error::config("landscapes", "at least one landscape is required"));
        }
        if self.first_landscape.checked_add(self.landscapes).is_none() {
            return Err(Error::config(
                "landscapes",
                format!(
                    "landscape range starting at {} with {} landscape(s) overflows",
                    self.first_landscape, self.landscapes
                ),
            ));
        }
        if self.landscape_chunk == Some(0) {
            return Err(Error::config("landscape_chunk", "chunk size can't be 0"));
        }
        if self.mode == Mode::Simulate && self.replicates == 0 {
            return Err(Error::config("replicates", "at least one replicate is required"));
        }
        if self.executables.for_mode(self.mode).as_os_str().is_empty() {
            return Err(Error::config("executables", "empty executable path"));
        }
        if self.checked_job_count().is_none() {
            return Err(Error::config("landscapes", "number of jobs overflows"));
        }
        Ok(())
    }

    /// Number of jobs the grid expands to, the product of the cardinalities
    /// of the axes used by the selected mode. Saturates at `usize::MAX`,
    /// which validation rejects.
    pub fn job_count(&self) -> usize {
        self.checked_job_count().unwrap_or(usize::MAX)
    }

    fn checked_job_count(&self) -> Option<usize> {
        let shared = self
            .correlations
            .len()
            .checked_mul(self.epistasis.len())?
            .checked_mul(self.mutation_rates.len())?;
        match self.mode {
            Mode::Simulate => self
                .variants
                .len()
                .checked_mul(shared)?
                .checked_mul(self.chunk_count()),
            Mode::CreateLandscapes => Some(shared),
            Mode::Convergence => self
                .variants
                .len()
                .checked_mul(shared)?
                .checked_mul(self.landscapes),
        }
    }

    /// Number of simulation jobs each grid point is split into.
    fn chunk_count(&self) -> usize {
        match self.landscape_chunk {
            Some(chunk) if chunk > 0 => {
                self.landscapes / chunk + (self.landscapes % chunk != 0) as usize
            }
            _ => 1,
        }
    }

    /// One past the last landscape index, clamped to `usize::MAX`.
    fn last_landscape(&self) -> usize {
        self.first_landscape.saturating_add(self.landscapes)
    }

    /// Landscape index ranges assigned to simulation jobs.
    pub fn landscape_ranges(&self) -> Vec<(usize, usize)> {
        let first = self.first_landscape;
        let last = self.last_landscape();
        match self.landscape_chunk {
            Some(chunk) if chunk > 0 => (first..last)
                .step_by(chunk)
                .map(|start| (start, start.saturating_add(chunk).min(last)))
                .collect(),
            _ => vec![(first, last)],
        }
    }

    fn points(&self) -> Vec<Point> {
        let variants: Vec<Option<Variant>> = match self.mode {
            Mode::CreateLandscapes => vec![None],
            _ => self.variants.iter().cloned().map(Some).collect(),
        };
        let ranges: Vec<(usize, usize)> = match self.mode {
            Mode::Simulate => self.landscape_ranges(),
            Mode::CreateLandscapes => vec![(self.landscapes, 0)],
            Mode::Convergence => (self.first_landscape..self.last_landscape())
                .map(|l| (l, l + 1))
                .collect(),
        };

        let mut points = Vec::with_capacity(self.job_count());
        for variant in &variants {
            for &correlation in &self.correlations {
                for &a in &self.epistasis {
                    for &mutation_rate in &self.mutation_rates {
                        for &landscapes in &ranges {
                            points.push(Point {
                                variant: *variant,
                                correlation,
                                a,
                                mutation_rate,
                                landscapes,
                            });
                        }
                    }
                }
            }
        }
        points
    }

    fn fmt_float(&self, x: f64) -> String {
        format_float(x, self.float_precision)
    }

    fn model_args(&self, point: &Point) -> Vec<String> {
        let scales = EpistasisScales::derive(self.sigma, point.a, point.correlation);
        let mut args = vec![self.fitness_model.flag().to_string()];
        args.extend(
            scales
                .model_params(self.fitness_model, self.mean)
                .into_iter()
                .map(|x| self.fmt_float(x)),
        );
        args
    }

    fn population_args(&self, point: &Point) -> Vec<String> {
        let mut args = vec!["--size".to_string()];
        args.extend(self.sizes.iter().map(|s| s.to_string()));
        args.push("--mutation_rate".to_string());
        args.push(self.fmt_float(point.mutation_rate));
        args.push("--resources".to_string());
        args.extend(self.resources.iter().map(|r| self.fmt_float(*r)));
        args
    }

    fn render(&self, point: &Point) -> JobDescriptor {
        let mut args = Vec::new();
        match self.mode {
            Mode::Simulate => {
                args.push("--landscapes".to_string());
                args.push(point.landscapes.0.to_string());
                args.push(point.landscapes.1.to_string());
                args.push("--replicates".to_string());
                args.push(self.replicates.to_string());
                args.push("--mutation_rate".to_string());
                args.push(self.fmt_float(point.mutation_rate));
                args.push("--size".to_string());
                args.extend(self.sizes.iter().map(|s| s.to_string()));
                args.push("--resources".to_string());
                args.extend(self.resources.iter().map(|r| self.fmt_float(*r)));
                args.extend(self.model_args(point));
                if self.load_landscape {
                    args.push("--load".to_string());
                }
            }
            Mode::CreateLandscapes => {
                args.push("--landscapes".to_string());
                args.push(point.landscapes.0.to_string());
                args.extend(self.model_args(point));
            }
            Mode::Convergence => {
                args.extend(self.population_args(point));
                args.push("--landscape".to_string());
                args.push(point.landscapes.0.to_string());
                args.push("--folder".to_string());
                args.push(self.convergence_folder(point));
                args.extend(self.model_args(point));
            }
        }
        if let Some(flag) = point.variant.and_then(|v| v.flag()) {
            args.push(flag.to_string());
        }
        args.extend(self.extra_args.iter().cloned());

        JobDescriptor::new(self.executables.for_mode(self.mode).clone(), args)
    }

    fn convergence_folder(&self, point: &Point) -> String {
        let dir = self.convergence_dir.trim_end_matches('/');
        let name = format!(
            "{}_c{}_a{}_m{}_l{}",
            point.variant.map(|v| v.name()).unwrap_or("full"),
            self.fmt_float(point.correlation),
            self.fmt_float(point.a),
            self.fmt_float(point.mutation_rate),
            point.landscapes.0,
        );
        if dir.is_empty() {
            format!("{}/", name)
        } else {
            format!("{}/{}/", dir, name)
        }
    }
}

/// Expands the grid into the full ordered job sequence.
///
/// Pure function of the configuration, calling it twice with the same
/// configuration yields identical sequences.
pub fn enumerate(config: &GridConfig) -> Result<Vec<JobDescriptor>> {
    config.validate()?;
    if config.mode == Mode::CreateLandscapes && config.mutation_rates.len() > 1 {
        warn!(
            "mutation rates don't affect landscape creation, {} identical job(s) per landscape set",
            config.mutation_rates.len()
        );
    }
    let jobs: Vec<JobDescriptor> = config.points().iter().map(|p| config.render(p)).collect();
    debug!("enumerated {} job(s) in {:?} mode", jobs.len(), config.mode);
    Ok(jobs)
}

/// Renders a float argument. Negative zero is rendered as zero, also when
/// it only shows up after rounding to a fixed precision.
pub fn format_float(x: f64, precision: Option<usize>) -> String {
    let x = if x == 0. { 0. } else { x };
    let s = match precision {
        Some(p) => format!("{:.*}", p, x),
        None => format!("{}", x),
    };
    match s.strip_prefix('-') {
        Some(digits) if digits.chars().all(|c| c == '0' || c == '.') => digits.to_string(),
        _ => s,
    }
}

fn non_empty<T>(axis: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        Err(Error::config(axis, "value list is empty"))
    } else {
        Ok(())
    }
}

fn finite(axis: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::config(axis, format!("{} is not a finite number", value)))
    }
}
