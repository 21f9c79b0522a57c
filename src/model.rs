use std::path::PathBuf;

use nalgebra::DMatrix;

use crate::{
    allele::Allele,
    calculator::Calculator,
    context::StrContext,
    detect::{DetectParams, Repeat, detect_repeat},
    likelihoods::AlleleLikelihoods,
    params::{ParamName, read_parameter_file},
    reference::RefContext,
    str_allele::StrAlleleSet,
};

/// Key for the VCF info annotation for the Pi parameter
pub const PI_INFO_KEY: &str = "STRPi";

/// Key for the VCF info annotation for the Tau parameter
pub const TAU_INFO_KEY: &str = "STRTau";

/// Key for the VCF info annotation for the deletion model
pub const DEL_INFO_KEY: &str = "STRDel";

/// Key for the VCF info annotation for the insertion model
pub const INS_INFO_KEY: &str = "STRIns";

/// Key for the VCF info annotation for the repeat unit
pub const UNIT_INFO_KEY: &str = "STRUnit";

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub parameter_file: Option<PathBuf>,
    pub minimum_repeat_total_length: usize,
    pub maximum_unit_length: usize,
    pub minimum_repeat_count: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            parameter_file: None,
            minimum_repeat_total_length: 10,
            maximum_unit_length: 10,
            minimum_repeat_count: 2,
            log_file: None,
        }
    }
}

impl ModelConfig {
    pub fn detect_params(&self) -> DetectParams {
        DetectParams {
            maximum_unit_length: self.maximum_unit_length,
            minimum_repeat_count: self.minimum_repeat_count,
            minimum_repeat_total_length: self.minimum_repeat_total_length,
        }
    }
}

/// STR amplification error model.  Immutable once loaded.
#[derive(Debug, Clone)]
pub struct StrModel {
    cfg: ModelConfig,
    calculators: Vec<Calculator>,
}

impl StrModel {
    /// Load the parameter file (if any) named in `cfg`.  Without a parameter file STR sites are
    /// still detected but no correction is applied.
    pub fn load(cfg: ModelConfig) -> anyhow::Result<Self> {
        let calculators = match cfg.parameter_file.as_ref() {
            Some(file) => read_parameter_file(file)?,
            None => {
                debug!("No STR model file; using null model");
                vec![Calculator::Null]
            }
        };
        Ok(Self::with_calculators(cfg, calculators))
    }

    /// Model that detects STRs but never changes likelihoods
    pub fn null(cfg: ModelConfig) -> Self {
        Self::with_calculators(cfg, vec![Calculator::Null])
    }

    pub fn with_calculators(cfg: ModelConfig, calculators: Vec<Calculator>) -> Self {
        assert!(!calculators.is_empty(), "No STR model calculators");
        Self { cfg, calculators }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.cfg
    }

    pub fn is_null(&self) -> bool {
        self.calculators.iter().all(|c| c.is_null())
    }

    /// Maximum unit length with its own calculator
    pub fn max_unit_length(&self) -> usize {
        self.calculators.len() - 1
    }

    /// Longer units use the calculator for the longest unit length in the model
    pub fn calculator_for(&self, unit_length: usize) -> &Calculator {
        &self.calculators[unit_length.min(self.calculators.len() - 1)]
    }

    pub fn for_context(&self, ctx: &StrContext) -> &Calculator {
        self.calculator_for(ctx.alleles().repeat_unit_length())
    }

    pub fn detect(&self, ref_ctx: &RefContext) -> Option<Repeat> {
        detect_repeat(ref_ctx, &self.cfg.detect_params())
    }

    pub fn alleles_qualify(&self, alleles: &StrAlleleSet) -> bool {
        let ul = alleles.repeat_unit_length();
        let mx = alleles.maximum_repeat_count();
        ul <= self.cfg.maximum_unit_length
            && mx >= self.cfg.minimum_repeat_count
            && mx * ul >= self.cfg.minimum_repeat_total_length
    }

    /// Element (i, j) is the log10 probability of observing the repeat count of allele j given
    /// the true repeat count of allele i
    pub fn log10_transformation_matrix(&self, ctx: &StrContext) -> DMatrix<f64> {
        let calc = self.for_context(ctx);
        let alleles = ctx.alleles();
        let counts: Vec<_> = alleles.iter().map(|a| a.repeat_count()).collect();
        let n = counts.len();
        let mut m = DMatrix::zeros(n, n);
        for i in 0..n {
            let ri = counts[i];
            m[(i, i)] = calc.log10_coefficient(ri, ri);
            for j in i + 1..n {
                let rj = counts[j];
                m[(i, j)] = calc.log10_coefficient(ri, rj);
                m[(j, i)] = calc.log10_coefficient(rj, ri);
            }
        }
        m
    }

    /// Transform the context likelihoods to the caller's allele space, with alleles expressed
    /// as changes to `ref_allele`
    pub fn transform_likelihoods(
        &self,
        ctx: &StrContext,
        ref_allele: &Allele,
    ) -> anyhow::Result<AlleleLikelihoods<Allele>> {
        let lk = ctx.likelihoods().ok_or_else(|| {
            anyhow!("STR context at {}:{} has no likelihoods", ctx.contig(), ctx.pos())
        })?;
        let alleles = ctx.alleles();
        let new_alleles = alleles
            .iter()
            .map(|a| alleles.map_allele(ref_allele, a.repeat_count()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let m = if self.is_null() {
            log10_identity(new_alleles.len())
        } else {
            self.log10_transformation_matrix(ctx)
        };
        lk.transform(new_alleles, &m)
    }

    /// VCF header lines for annotations that may be added when applying the model
    pub fn vcf_header_lines(&self) -> Vec<String> {
        vec![format!(
            "##INFO=<ID={},Number=1,Type=Character,Description=\"STR repeat unit\">",
            UNIT_INFO_KEY
        )]
    }

    /// INFO annotations for a context: the repeat unit and, when the context's calculator has
    /// parameters, their values at the reference repeat count
    pub fn info_annotations(&self, ctx: &StrContext) -> Vec<(&'static str, String)> {
        let a = ctx.alleles();
        let mut v = vec![(UNIT_INFO_KEY, String::from_utf8_lossy(a.repeat_unit()).into_owned())];
        if let Calculator::Simple(c) = self.for_context(ctx) {
            let r = a.reference_repeat_count();
            for (key, p) in [
                (PI_INFO_KEY, ParamName::Pi),
                (TAU_INFO_KEY, ParamName::Tau),
                (DEL_INFO_KEY, ParamName::Del),
                (INS_INFO_KEY, ParamName::Ins),
            ] {
                v.push((key, format!("{:.4}", c.parameter(p).value(r))))
            }
        }
        v
    }
}

fn log10_identity(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| if i == j { 0.0 } else { f64::NEG_INFINITY })
}
