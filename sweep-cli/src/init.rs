//! Initialize sweep configuration files based on templates.

use std::fs;
use std::path::Path;

use anyhow::{Error, Result};

// Create a new config file at the given path from the selected template
pub fn init_at_path(path: &Path, template_str: &str) -> Result<()> {
    println!(
        "Initiating new sweep config at: {path} (template: {template}) ",
        path = path.to_string_lossy(),
        template = template_str
    );

    // don't clobber existing sweeps
    if path.exists() {
        return Err(Error::msg(format!(
            "Can't initialize sweep config, file already exists ({}). Try another path.",
            path.to_string_lossy()
        )));
    }

    let content = match template(template_str) {
        Some(c) => c,
        None => {
            return Err(Error::msg(format!(
                "Failed getting template \"{}\"",
                template_str
            )))
        }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn template(template_str: &str) -> Option<String> {
    match template_str {
        "commented" => Some(template_commented()),
        "landscapes" => Some(template_landscapes()),
        _ => None,
    }
}

// commented template, spells out every default
fn template_commented() -> String {
    r##"# Sweep over fitness landscape simulations.
#
# Every job is one invocation of an external simulation program. Jobs are
# generated from the grid below, nesting the axes in the order
# variants > correlations > epistasis > mutation_rates.

[dispatch]
# maximum number of jobs running at the same time
parallelism = 4
# how terminated jobs are detected: "notify" (waiter per job) or "poll"
strategy = "notify"
# sleep between idle polling cycles, in milliseconds (only used by "poll")
poll_interval = 1000

[grid]
# "simulate" runs simulations on existing landscapes, "create_landscapes"
# generates them, "convergence" records the evolution of single landscapes
mode = "simulate"

# null: static fitness landscape, no ecological interactions
# full: dynamic fitness landscape with ecological interactions
variants = ["null", "full"]
# correlations between the traits
correlations = [-0.9, 0.0, 0.9]
# epistasis parameter, 1 is fully additive, 0 maximally epistatic
epistasis = [0.9]
mutation_rates = [0.001]

# fitness model passed to the programs: "rmf", "additive" or "hoc"
fitness_model = "rmf"
# fitness effect size
sigma = 0.1
# mean additive fitness effect
mean = 0.0

# population sizes, every job simulates all of them
sizes = [1000]
# amount of each resource, must match the number of resources the
# simulation programs were compiled with
resources = [1.0, 1.0]

# number of independent landscapes
landscapes = 100
first_landscape = 0
# split the landscapes across several jobs of this size
# landscape_chunk = 10
# replicates per landscape
replicates = 50
load_landscape = false

# output directory for convergence runs
convergence_dir = "convergence"

# fixed number of decimal places for float arguments
# float_precision = 6
# appended to every job
extra_args = []

[grid.executables]
simulate = "../simulations/target/release/ecoevo_landscapes"
create_landscapes = "../simulations/target/release/create_landscape"
convergence = "../simulations/target/release/convergence"
"##
    .to_string()
}

// minimal template for generating the landscapes a sweep needs
fn template_landscapes() -> String {
    r##"[dispatch]
parallelism = 4

[grid]
mode = "create_landscapes"
correlations = [-0.9, 0.0, 0.9]
epistasis = [0.9]
landscapes = 100
"##
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep::{Mode, SweepConfig};

    #[test]
    fn commented_template_spells_out_defaults() {
        let config = SweepConfig::from_toml_str(&template("commented").unwrap()).unwrap();
        assert_eq!(config, SweepConfig::default());
    }

    #[test]
    fn landscapes_template_parses() {
        let config = SweepConfig::from_toml_str(&template("landscapes").unwrap()).unwrap();
        assert_eq!(config.grid.mode, Mode::CreateLandscapes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn refuses_to_overwrite() {
        let path = std::env::temp_dir().join("sweep-init-test.toml");
        fs::write(&path, "").unwrap();
        assert!(init_at_path(&path, "commented").is_err());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unknown_template() {
        assert!(template("elaborate").is_none());
    }
}
