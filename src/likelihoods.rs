use nalgebra::DMatrix;

/// log10(sum(10^x)) without overflow.  Returns -inf if all inputs are -inf
pub fn log10_sum_log10<I: Iterator<Item = f64> + Clone>(itr: I) -> f64 {
    let mx = itr.clone().fold(f64::NEG_INFINITY, f64::max);
    if mx == f64::NEG_INFINITY {
        mx
    } else {
        mx + itr.map(|x| 10f64.powf(x - mx)).sum::<f64>().log10()
    }
}

/// Per sample log10 likelihoods of each piece of evidence (read) given each allele.
/// Each sample has a matrix with one row per evidence and one column per allele.
#[derive(Clone, Debug)]
pub struct AlleleLikelihoods<A> {
    alleles: Vec<A>,
    samples: Vec<Box<str>>,
    values: Vec<DMatrix<f64>>,
}

impl<A> AlleleLikelihoods<A> {
    pub fn new(
        alleles: Vec<A>,
        samples: &[&str],
        values: Vec<DMatrix<f64>>,
    ) -> anyhow::Result<Self> {
        if samples.len() != values.len() {
            return Err(anyhow!(
                "Number of samples ({}) does not match the number of likelihood matrices ({})",
                samples.len(),
                values.len()
            ));
        }
        if let Some((s, m)) = samples
            .iter()
            .zip(values.iter())
            .find(|(_, m)| m.ncols() != alleles.len())
        {
            return Err(anyhow!(
                "Likelihood matrix for sample {} has {} columns (expected {})",
                s,
                m.ncols(),
                alleles.len()
            ));
        }
        Ok(Self {
            alleles,
            samples: samples.iter().map(|s| Box::from(*s)).collect(),
            values,
        })
    }

    pub fn alleles(&self) -> &[A] {
        &self.alleles
    }

    pub fn allele_count(&self) -> usize {
        self.alleles.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|s| s as &str)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn sample_matrix(&self, sample_ix: usize) -> &DMatrix<f64> {
        &self.values[sample_ix]
    }

    pub fn evidence_count(&self, sample_ix: usize) -> usize {
        self.values[sample_ix].nrows()
    }

    /// Group alleles: new allele `k` takes, for each evidence, the maximum likelihood over
    /// the old alleles listed in `old_for_new[k]`
    pub fn marginalize<B>(
        &self,
        new_alleles: Vec<B>,
        old_for_new: &[Vec<usize>],
    ) -> anyhow::Result<AlleleLikelihoods<B>> {
        if new_alleles.len() != old_for_new.len() {
            return Err(anyhow!("Allele mapping size does not match new allele count"));
        }
        if let Some(k) = old_for_new
            .iter()
            .position(|v| v.is_empty() || v.iter().any(|&i| i >= self.alleles.len()))
        {
            return Err(anyhow!("Invalid allele mapping for new allele {}", k));
        }
        let values = self
            .values
            .iter()
            .map(|m| {
                DMatrix::from_fn(m.nrows(), new_alleles.len(), |e, k| {
                    old_for_new[k]
                        .iter()
                        .map(|&i| m[(e, i)])
                        .fold(f64::NEG_INFINITY, f64::max)
                })
            })
            .collect();
        Ok(AlleleLikelihoods {
            alleles: new_alleles,
            samples: self.samples.clone(),
            values,
        })
    }

    /// Move to a new allele space via a log10 transition matrix.  `log10_matrix[(i, j)]` is the
    /// log10 probability of observing current allele `j` given new allele `i`, so the new
    /// likelihood is log10 sum_j 10^(M[i][j] + L[e][j])
    pub fn transform<B>(
        &self,
        new_alleles: Vec<B>,
        log10_matrix: &DMatrix<f64>,
    ) -> anyhow::Result<AlleleLikelihoods<B>> {
        if log10_matrix.nrows() != new_alleles.len() || log10_matrix.ncols() != self.alleles.len() {
            return Err(anyhow!(
                "Transformation matrix is {}x{} (expected {}x{})",
                log10_matrix.nrows(),
                log10_matrix.ncols(),
                new_alleles.len(),
                self.alleles.len()
            ));
        }
        let values = self
            .values
            .iter()
            .map(|m| {
                DMatrix::from_fn(m.nrows(), new_alleles.len(), |e, i| {
                    log10_sum_log10((0..m.ncols()).map(|j| log10_matrix[(i, j)] + m[(e, j)]))
                })
            })
            .collect();
        Ok(AlleleLikelihoods {
            alleles: new_alleles,
            samples: self.samples.clone(),
            values,
        })
    }

    /// For each allele, the number of evidence rows in a sample where the allele is the (first)
    /// best
    pub fn best_allele_counts(&self, sample_ix: usize) -> Vec<usize> {
        let m = &self.values[sample_ix];
        let mut cts = vec![0; m.ncols()];
        for row in m.row_iter() {
            if let Some((ix, _)) = row
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
                    Some((_, y)) if y >= x => best,
                    _ => Some((i, x)),
                })
            {
                cts[ix] += 1
            }
        }
        cts
    }
}
