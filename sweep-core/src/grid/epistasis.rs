//! Derived epistasis parameters for the fitness models.

/// Fitness model family understood by the simulation programs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessModelKind {
    /// Rough Mount Fuji: additive component plus random epistatic
    /// component, `--rmf mu ca_diag ca_offdiag cb_diag cb_offdiag`
    Rmf,
    /// Purely additive, `--add mu ca_diag ca_offdiag`
    Additive,
    /// House of Cards, purely epistatic, `--hoc cb_diag cb_offdiag`
    Hoc,
}

impl Default for FitnessModelKind {
    fn default() -> Self {
        FitnessModelKind::Rmf
    }
}

impl FitnessModelKind {
    pub fn flag(&self) -> &'static str {
        match self {
            FitnessModelKind::Rmf => "--rmf",
            FitnessModelKind::Additive => "--add",
            FitnessModelKind::Hoc => "--hoc",
        }
    }
}

/// Effect size scales derived from a single epistasis parameter.
///
/// With fitness effect size `σ`, epistasis parameter `a` and trait
/// correlation `ρ`:
///
/// ```text
/// scale_a = σ·a
/// scale_b = σ·√(0.5·(1 - a²))
/// ```
///
/// and the correlated (off-diagonal) variants are `scale_a·ρ` and
/// `scale_b·ρ`. `a = 1` gives a fully additive landscape, `a = 0` a
/// maximally epistatic one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EpistasisScales {
    pub scale_a: f64,
    pub scale_a_corr: f64,
    pub scale_b: f64,
    pub scale_b_corr: f64,
}

impl EpistasisScales {
    pub fn derive(sigma: f64, a: f64, correlation: f64) -> Self {
        let scale_a = sigma * a;
        let scale_b = sigma * (0.5 * (1. - a * a)).sqrt();
        EpistasisScales {
            scale_a,
            scale_a_corr: scale_a * correlation,
            scale_b,
            scale_b_corr: scale_b * correlation,
        }
    }

    /// Numeric parameters following the model flag, in the order the
    /// simulation programs expect them.
    pub fn model_params(&self, kind: FitnessModelKind, mean: f64) -> Vec<f64> {
        match kind {
            FitnessModelKind::Rmf => vec![
                mean,
                self.scale_a,
                self.scale_a_corr,
                self.scale_b,
                self.scale_b_corr,
            ],
            FitnessModelKind::Additive => vec![mean, self.scale_a, self.scale_a_corr],
            FitnessModelKind::Hoc => vec![self.scale_b, self.scale_b_corr],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn derive_anticorrelated_rmf_scales() {
        let s = EpistasisScales::derive(0.1, 0.9, -0.9);
        assert!(close(s.scale_a, 0.09, 1e-12));
        assert!(close(s.scale_a_corr, -0.081, 1e-12));
        // σ·√(0.5·0.19)
        assert!(close(s.scale_b, 0.030822, 1e-6));
        assert!(close(s.scale_b_corr, -0.027740, 1e-6));
    }

    #[test]
    fn additive_limit_has_no_epistatic_scale() {
        let s = EpistasisScales::derive(0.1, 1.0, 0.5);
        assert!(close(s.scale_a, 0.1, 1e-12));
        assert_eq!(s.scale_b, 0.);
        assert_eq!(s.scale_b_corr, 0.);
    }

    #[test]
    fn model_params_follow_flag_layout() {
        let s = EpistasisScales::derive(0.1, 0.9, 0.);
        assert_eq!(s.model_params(FitnessModelKind::Rmf, 0.).len(), 5);
        assert_eq!(s.model_params(FitnessModelKind::Additive, 0.).len(), 3);
        let hoc = s.model_params(FitnessModelKind::Hoc, 0.);
        assert_eq!(hoc, vec![s.scale_b, s.scale_b_corr]);
    }
}
