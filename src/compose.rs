use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    allele::Allele,
    context::StrContext,
    likelihoods::AlleleLikelihoods,
    model::StrModel,
    reference::RefContext,
    str_allele::{StrAllele, StrAlleleSet},
    variant::Variant,
};

/// Long form record of every STR context composed from a variant or likelihoods.
/// The file is truncated when created.
pub struct StrLog {
    path: PathBuf,
    wrt: BufWriter<File>,
}

impl StrLog {
    pub fn create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_owned();
        let wrt = BufWriter::new(
            File::create(&path)
                .with_context(|| format!("Could not create STR log file {}", path.display()))?,
        );
        debug!("Opened STR log {}", path.display());
        Ok(Self { path, wrt })
    }

    pub fn write_context(&mut self, ctx: &StrContext) -> anyhow::Result<()> {
        writeln!(self.wrt, "{}", ctx.to_long_string())
            .with_context(|| format!("Error writing to STR log file {}", self.path.display()))
    }

    pub fn finish(mut self) -> anyhow::Result<()> {
        self.wrt
            .flush()
            .with_context(|| format!("Error writing to STR log file {}", self.path.display()))
    }
}

/// Builds STR contexts for a run, writing to the STR log (if configured)
pub struct Composer<'a> {
    model: &'a StrModel,
    log: Option<StrLog>,
    logged: usize,
}

impl<'a> Composer<'a> {
    pub fn new(model: &'a StrModel) -> anyhow::Result<Self> {
        let log = match model.config().log_file.as_ref() {
            Some(p) => Some(StrLog::create(p)?),
            None => None,
        };
        Ok(Self {
            model,
            log,
            logged: 0,
        })
    }

    pub fn model(&self) -> &StrModel {
        self.model
    }

    /// Look for a repeat starting after the locus in the reference
    pub fn compose_from_reference(&self, rc: &RefContext) -> Option<StrContext> {
        let rep = self.model.detect(rc)?;
        let set = StrAlleleSet::from_reference_bases(rc.forward_bases(), rep.unit_length)?;
        StrContext::new(rc.contig(), rc.locus(), None, set, None).ok()
    }

    pub fn compose_from_variant(
        &mut self,
        rc: &RefContext,
        vc: &Variant,
    ) -> anyhow::Result<Option<StrContext>> {
        if vc.contig() != rc.contig() || vc.pos() != rc.locus() {
            return Err(anyhow!(
                "Variant at {}:{} does not match reference context {}",
                vc.contig(),
                vc.pos(),
                rc
            ));
        }
        if vc.is_non_variant_block() {
            return self
                .compose_from_reference(rc)
                .map(|ctx| {
                    StrContext::new(
                        ctx.contig(),
                        ctx.pos(),
                        Some(vc.clone()),
                        ctx.alleles().clone(),
                        None,
                    )
                })
                .transpose();
        }
        let set = match self.qualifying_set(vc.alleles(), rc) {
            Some(s) => s,
            None => return Ok(None),
        };
        let ref_len = vc.reference_allele().len();
        let have_ad = vc.genotypes().iter().any(|g| g.ad().is_some());
        let mut depths = vec![0; set.allele_count()];
        for (a, d) in vc.alleles().iter().zip(vc.total_allele_depths()) {
            if !a.is_symbolic()
                && let Some(ix) = set.repeat_count_of(a, ref_len).and_then(|c| set.index_of(c))
            {
                depths[ix] += d
            }
        }
        let ctx = StrContext::new(rc.contig(), rc.locus(), Some(vc.clone()), set, None)?;
        let ctx = if have_ad {
            ctx.with_allele_depths(depths)?
        } else {
            ctx
        };
        self.dump(&ctx)?;
        Ok(Some(ctx))
    }

    /// Likelihood columns for alleles with the same repeat count are merged (taking the maximum).
    /// Columns for symbolic alleles are dropped.
    pub fn compose_from_likelihoods(
        &mut self,
        rc: &RefContext,
        lk: &AlleleLikelihoods<Allele>,
    ) -> anyhow::Result<Option<StrContext>> {
        let ref_allele = lk
            .alleles()
            .iter()
            .find(|a| a.is_reference())
            .ok_or_else(|| anyhow!("No reference allele in likelihoods at {}", rc))?;
        let set = match self.qualifying_set(lk.alleles(), rc) {
            Some(s) => s,
            None => return Ok(None),
        };
        let ref_len = ref_allele.len();
        let mut old_for_new = vec![Vec::new(); set.allele_count()];
        for (i, a) in lk.alleles().iter().enumerate() {
            if !a.is_symbolic()
                && let Some(ix) = set.repeat_count_of(a, ref_len).and_then(|c| set.index_of(c))
            {
                old_for_new[ix].push(i)
            }
        }
        let str_alleles: Vec<StrAllele> = set.iter().cloned().collect();
        let mlk = lk.marginalize(str_alleles, &old_for_new)?;
        let ctx = StrContext::new(rc.contig(), rc.locus(), None, set, Some(mlk))?;
        self.dump(&ctx)?;
        Ok(Some(ctx))
    }

    fn qualifying_set(&self, alleles: &[Allele], rc: &RefContext) -> Option<StrAlleleSet> {
        StrAlleleSet::from_alleles(alleles, rc.forward_bases()).filter(|s| {
            let q = self.model.alleles_qualify(s);
            if !q {
                trace!("STR alleles {} at {} do not qualify", s, rc);
            }
            q
        })
    }

    fn dump(&mut self, ctx: &StrContext) -> anyhow::Result<()> {
        debug!("Found STR {}", ctx);
        if let Some(log) = self.log.as_mut() {
            log.write_context(ctx)?;
            self.logged += 1;
        }
        Ok(())
    }

    /// Flush the STR log
    pub fn finish(self) -> anyhow::Result<()> {
        if let Some(log) = self.log {
            info!("{} STR contexts written to {}", self.logged, log.path.display());
            log.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::ModelConfig, variant::Genotype};
    use nalgebra::DMatrix;

    // CA repeated 6 times after the G at position 3
    fn rc() -> RefContext {
        RefContext::new("chr1", 3, 1, b"TTGCACACACACACAGTT").unwrap()
    }

    fn model(log_file: Option<PathBuf>) -> StrModel {
        StrModel::null(ModelConfig {
            log_file,
            ..Default::default()
        })
    }

    fn variant() -> Variant {
        Variant::new(
            "chr1",
            3,
            vec![
                Allele::reference(b"GCA"),
                Allele::alternate(b"G"),
                Allele::alternate(b"GCACA"),
                Allele::alternate(b"GTACA"),
            ],
            vec![
                Genotype::new("s1", Some(vec![4, 1, 2, 3])),
                Genotype::new("s2", Some(vec![1, 0, 1, 1])),
                Genotype::new("s3", None),
            ],
        )
        .unwrap()
    }

    #[test]
    fn from_reference() {
        let m = model(None);
        let c = Composer::new(&m).unwrap();
        let ctx = c.compose_from_reference(&rc()).unwrap();
        assert_eq!(ctx.alleles().repeat_unit(), b"CA");
        assert_eq!(ctx.alleles().reference_repeat_count(), 6);
        assert_eq!(ctx.pos(), 3);
        let flat = RefContext::new("chr1", 3, 1, b"TTGCATGACCTGAT").unwrap();
        assert!(c.compose_from_reference(&flat).is_none());
    }

    #[test]
    fn depths_summed_per_repeat_count() {
        let m = model(None);
        let mut c = Composer::new(&m).unwrap();
        let ctx = c.compose_from_variant(&rc(), &variant()).unwrap().unwrap();
        let counts: Vec<_> = ctx.alleles().iter().map(|a| a.repeat_count()).collect();
        assert_eq!(counts, vec![5, 6, 7]);
        assert_eq!(ctx.allele_depths(), Some(&[1, 5, 7][..]));
        assert!(ctx.variant().is_some());
        c.finish().unwrap();
    }

    #[test]
    fn non_variant_block() {
        let m = model(None);
        let mut c = Composer::new(&m).unwrap();
        let alleles = vec![Allele::reference(b"G"), Allele::non_ref()];
        let v = Variant::new("chr1", 3, alleles, vec![]).unwrap();
        let ctx = c.compose_from_variant(&rc(), &v).unwrap().unwrap();
        assert_eq!(ctx.alleles().allele_count(), 1);
        assert_eq!(ctx.alleles().reference_repeat_count(), 6);
        assert!(ctx.variant().unwrap().is_non_variant_block());
        assert!(ctx.allele_depths().is_none());
    }

    #[test]
    fn variant_checks() {
        let m = model(None);
        let mut c = Composer::new(&m).unwrap();
        let biallelic = |pos, r: &[u8], a: &[u8]| {
            let alleles = vec![Allele::reference(r), Allele::alternate(a)];
            Variant::new("chr1", pos, alleles, vec![]).unwrap()
        };
        assert!(c.compose_from_variant(&rc(), &biallelic(4, b"C", b"T")).is_err());
        // Too short to qualify
        let short = RefContext::new("chr1", 3, 1, b"TTGCATTTTTT").unwrap();
        let v = biallelic(3, b"G", b"GCA");
        assert!(c.compose_from_variant(&short, &v).unwrap().is_none());
        // SNP only
        let v = biallelic(3, b"G", b"T");
        assert!(c.compose_from_variant(&rc(), &v).unwrap().is_none());
    }

    #[test]
    fn from_likelihoods() {
        let m = model(None);
        let mut c = Composer::new(&m).unwrap();
        let alleles = vec![Allele::reference(b"G"), Allele::alternate(b"GCA"), Allele::non_ref()];
        let mat = DMatrix::from_row_slice(2, 3, &[-0.1, -2.0, -0.05, -3.0, -0.2, -1.0]);
        let lk = AlleleLikelihoods::new(alleles, &["s1"], vec![mat]).unwrap();
        let ctx = c.compose_from_likelihoods(&rc(), &lk).unwrap().unwrap();
        let slk = ctx.likelihoods().unwrap();
        assert_eq!(slk.allele_count(), 2);
        assert_eq!(slk.sample_matrix(0)[(0, 0)], -0.1);
        assert_eq!(slk.sample_matrix(0)[(1, 1)], -0.2);
        assert_eq!(slk.alleles()[1].repeat_count(), 7);

        let no_ref = AlleleLikelihoods::new(
            vec![Allele::alternate(b"G"), Allele::alternate(b"GCA")],
            &["s1"],
            vec![DMatrix::from_element(1, 2, -1.0)],
        )
        .unwrap();
        assert!(c.compose_from_likelihoods(&rc(), &no_ref).is_err());
    }

    #[test]
    fn log_records_each_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("str.log");
        let m = model(Some(path.clone()));
        let mut c = Composer::new(&m).unwrap();
        c.compose_from_variant(&rc(), &variant()).unwrap().unwrap();
        // Contexts from the reference alone are not logged
        c.compose_from_reference(&rc()).unwrap();
        let lk = AlleleLikelihoods::new(
            vec![Allele::reference(b"G"), Allele::alternate(b"GCACA")],
            &["s1"],
            vec![DMatrix::from_row_slice(1, 2, &[-0.5, -0.1])],
        )
        .unwrap();
        c.compose_from_likelihoods(&rc(), &lk).unwrap().unwrap();
        c.finish().unwrap();

        let s = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = s.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "chr1\t3\tCA\t2\t6\t5,6,7\t1,5,7\t.");
        assert_eq!(lines[1], "chr1\t3\tCA\t2\t6\t6,8\t.\ts1=0,1");
    }
}
