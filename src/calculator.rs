use crate::params::{ParamName, StrModelParameter};

/// Calculates log10 P(observed repeat count j | true repeat count i)
#[derive(Debug, Clone)]
pub enum Calculator {
    /// No cross repeat count leakage
    Null,
    Simple(SimpleCalculator),
}

impl Calculator {
    pub fn log10_coefficient(&self, i: usize, j: usize) -> f64 {
        match self {
            Self::Null => {
                if i == j {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            }
            Self::Simple(c) => c.log10_coefficient(i, j),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Stutter model built from the four regression curves for a unit length.
///
/// At true repeat count `i`, `pi` gives the probability of no change. A change is an insertion or
/// a deletion with relative weights `ins` and `del`, and the size of the change (in units) is
/// geometric with ratio `tau`.  Deletions are truncated at zero copies and renormalized, and at
/// `i == 0` all changes are insertions, so the coefficients over `j` always sum to 1.
#[derive(Debug, Clone)]
pub struct SimpleCalculator {
    pi: StrModelParameter,
    tau: StrModelParameter,
    del: StrModelParameter,
    ins: StrModelParameter,
}

impl SimpleCalculator {
    pub fn new(
        pi: StrModelParameter,
        tau: StrModelParameter,
        del: StrModelParameter,
        ins: StrModelParameter,
    ) -> Self {
        Self { pi, tau, del, ins }
    }

    pub fn parameter(&self, name: ParamName) -> &StrModelParameter {
        match name {
            ParamName::Pi => &self.pi,
            ParamName::Tau => &self.tau,
            ParamName::Del => &self.del,
            ParamName::Ins => &self.ins,
        }
    }

    pub fn log10_coefficient(&self, i: usize, j: usize) -> f64 {
        let pi = self.pi.value(i);
        if i == j {
            return pi.log10();
        }
        let k = i.abs_diff(j);
        let tau = self.tau.value(i);
        let (d, n) = (self.del.value(i), self.ins.value(i));
        // Direction of change.  From zero copies every change is an insertion
        let dir = if i == 0 {
            1.0
        } else if d + n > 0.0 {
            if j > i { n / (d + n) } else { d / (d + n) }
        } else {
            0.5
        };
        let size = if j > i {
            log10_geometric(tau, k)
        } else {
            // Deletions are truncated at zero copies.  As tau -> 1 this tends to uniform on 1..=i
            let norm = 1.0 - tau.powi(i as i32);
            if tau >= 1.0 || norm <= 0.0 {
                -(i as f64).log10()
            } else {
                log10_geometric(tau, k) - norm.log10()
            }
        };
        (1.0 - pi).log10() + dir.log10() + size
    }
}

/// log10 of (1 - tau) * tau^(k-1), the probability of a change of k >= 1 units
fn log10_geometric(tau: f64, k: usize) -> f64 {
    if tau >= 1.0 {
        f64::NEG_INFINITY
    } else if k > 1 {
        (1.0 - tau).log10() + (k - 1) as f64 * tau.log10()
    } else {
        (1.0 - tau).log10()
    }
}
