use std::f64::consts::LN_2;

use statrs::function::factorial::ln_factorial;

/// Relative tolerance for treating two probabilities as equally likely
const TIE_TOLERANCE: f64 = 1e-9;

/// Levene-Haldane distribution: the heterozygote count of `n` diploid genotypes
/// carrying `n_minor` minor alleles, conditional on Hardy-Weinberg equilibrium.
///
/// Only heterozygote counts with the same parity as `n_minor` have positive
/// probability, `probs[k]` holds the probability of `parity + 2k` heterozygotes.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveneHaldane {
    n: u64,
    n_minor: u64,
    probs: Vec<f64>,
}

impl LeveneHaldane {
    pub fn new(n: u64, n_minor: u64) -> Self {
        // the minor allele can not hold more than half of the 2n alleles
        let n_minor = n_minor.min(2 * n - n_minor.min(2 * n));
        let parity = n_minor % 2;

        let ln_probs: Vec<f64> = (parity..=n_minor)
            .step_by(2)
            .map(|het| {
                let hom_minor = (n_minor - het) / 2;
                let hom_major = n - het - hom_minor;
                het as f64 * LN_2
                    - ln_factorial(hom_minor)
                    - ln_factorial(het)
                    - ln_factorial(hom_major)
            })
            .collect();

        let max = ln_probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let unscaled: Vec<f64> = ln_probs.iter().map(|p| (p - max).exp()).collect();
        let total: f64 = unscaled.iter().sum();

        Self {
            n,
            n_minor,
            probs: unscaled.into_iter().map(|p| p / total).collect(),
        }
    }

    /// `None` if no genotype was called
    pub fn from_counts(n_hom_ref: u64, n_het: u64, n_hom_var: u64) -> Option<Self> {
        let n = n_hom_ref + n_het + n_hom_var;
        if n == 0 {
            return None;
        }
        let n_ref = 2 * n_hom_ref + n_het;
        let n_var = 2 * n_hom_var + n_het;
        Some(Self::new(n, n_ref.min(n_var)))
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn n_minor(&self) -> u64 {
        self.n_minor
    }

    pub fn probability(&self, n_het: u64) -> f64 {
        if n_het > self.n_minor || n_het % 2 != self.n_minor % 2 {
            return 0.0;
        }
        self.probs[(n_het / 2) as usize]
    }

    fn hets(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        let parity = self.n_minor % 2;
        self.probs
            .iter()
            .enumerate()
            .map(move |(k, p)| (parity + 2 * k as u64, *p))
    }

    /// Mid-p value: the mass of outcomes less likely than `n_het` plus half the
    /// mass of outcomes as likely
    pub fn two_sided_mid_p(&self, n_het: u64) -> f64 {
        let p_obs = self.probability(n_het);

        let (less, equal) = self.hets().fold((0.0, 0.0), |(less, equal), (_, p)| {
            if (p - p_obs).abs() <= TIE_TOLERANCE * p_obs {
                (less, equal + p)
            } else if p < p_obs {
                (less + p, equal)
            } else {
                (less, equal)
            }
        });

        (less + 0.5 * equal).min(1.0)
    }

    /// One-sided mid-p value for an excess of heterozygotes
    pub fn upper_mid_p(&self, n_het: u64) -> f64 {
        let above: f64 = self
            .hets()
            .filter(|(het, _)| *het > n_het)
            .map(|(_, p)| p)
            .sum();

        (above + 0.5 * self.probability(n_het)).min(1.0)
    }
}

/// Two-sided exact test of Hardy-Weinberg equilibrium
pub fn hardy_weinberg_p(n_hom_ref: u64, n_het: u64, n_hom_var: u64) -> Option<f64> {
    LeveneHaldane::from_counts(n_hom_ref, n_het, n_hom_var).map(|d| d.two_sided_mid_p(n_het))
}

/// One-sided exact test for more heterozygotes than expected under Hardy-Weinberg equilibrium
pub fn excess_het_p(n_hom_ref: u64, n_het: u64, n_hom_var: u64) -> Option<f64> {
    LeveneHaldane::from_counts(n_hom_ref, n_het, n_hom_var).map(|d| d.upper_mid_p(n_het))
}
