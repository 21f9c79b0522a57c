use std::fmt::{self, Write};

use crate::{
    likelihoods::AlleleLikelihoods,
    str_allele::{StrAllele, StrAlleleSet},
    variant::Variant,
};

/// An STR site: the repeat allele set plus whatever evidence it was built from
#[derive(Clone, Debug)]
pub struct StrContext {
    contig: Box<str>,
    pos: usize,
    variant: Option<Variant>,
    alleles: StrAlleleSet,
    likelihoods: Option<AlleleLikelihoods<StrAllele>>,
    allele_depths: Option<Vec<usize>>,
}

impl StrContext {
    pub fn new(
        contig: &str,
        pos: usize,
        variant: Option<Variant>,
        alleles: StrAlleleSet,
        likelihoods: Option<AlleleLikelihoods<StrAllele>>,
    ) -> anyhow::Result<Self> {
        if let Some(lk) = likelihoods.as_ref()
            && lk.allele_count() != alleles.allele_count()
        {
            return Err(anyhow!(
                "Likelihoods at {}:{} have {} alleles; expected {}",
                contig,
                pos,
                lk.allele_count(),
                alleles.allele_count()
            ));
        }
        Ok(Self {
            contig: Box::from(contig),
            pos,
            variant,
            alleles,
            likelihoods,
            allele_depths: None,
        })
    }

    /// Attach allele depths (one per STR allele, in repeat count order)
    pub fn with_allele_depths(mut self, depths: Vec<usize>) -> anyhow::Result<Self> {
        if self.allele_depths.is_some() {
            Err(anyhow!("Allele depths already set for {}:{}", self.contig, self.pos))
        } else if depths.len() != self.alleles.allele_count() {
            Err(anyhow!(
                "{} allele depths given for {} STR alleles at {}:{}",
                depths.len(),
                self.alleles.allele_count(),
                self.contig,
                self.pos
            ))
        } else {
            self.allele_depths = Some(depths);
            Ok(self)
        }
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn variant(&self) -> Option<&Variant> {
        self.variant.as_ref()
    }

    pub fn alleles(&self) -> &StrAlleleSet {
        &self.alleles
    }

    pub fn likelihoods(&self) -> Option<&AlleleLikelihoods<StrAllele>> {
        self.likelihoods.as_ref()
    }

    pub fn allele_depths(&self) -> Option<&[usize]> {
        self.allele_depths.as_deref()
    }

    /// Tab separated record for the STR log:
    ///
    /// contig, pos, unit, unit length, reference count, repeat counts, allele depths and, for each
    /// sample with likelihoods, the number of reads best supporting each repeat count
    pub fn to_long_string(&self) -> String {
        let join = |v: &mut dyn Iterator<Item = usize>| {
            let mut s = String::new();
            for (i, x) in v.enumerate() {
                if i > 0 {
                    s.push(',')
                }
                write!(s, "{}", x).unwrap();
            }
            s
        };
        let a = &self.alleles;
        let mut s = format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.contig,
            self.pos,
            String::from_utf8_lossy(a.repeat_unit()),
            a.repeat_unit_length(),
            a.reference_repeat_count(),
            join(&mut a.iter().map(|x| x.repeat_count()))
        );
        match self.allele_depths.as_ref() {
            Some(d) => write!(s, "\t{}", join(&mut d.iter().copied())).unwrap(),
            None => s.push_str("\t."),
        }
        match self.likelihoods.as_ref() {
            Some(lk) if lk.sample_count() > 0 => {
                s.push('\t');
                for (i, name) in lk.samples().enumerate() {
                    if i > 0 {
                        s.push(';')
                    }
                    let counts = join(&mut lk.best_allele_counts(i).into_iter());
                    write!(s, "{}={}", name, counts).unwrap();
                }
            }
            _ => s.push_str("\t."),
        }
        s
    }
}

impl fmt::Display for StrContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.contig, self.pos, self.alleles)?;
        if let Some(d) = self.allele_depths.as_ref() {
            write!(f, " AD={:?}", d)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn long_string() {
        let set = StrAlleleSet::from_reference_bases(b"GCACACAGT", 2).unwrap();
        let ctx = StrContext::new("chr1", 100, None, set.clone(), None).unwrap();
        assert_eq!(ctx.to_long_string(), "chr1\t100\tCA\t2\t3\t3\t.\t.");
        let ctx = ctx.with_allele_depths(vec![7]).unwrap();
        assert_eq!(ctx.to_long_string(), "chr1\t100\tCA\t2\t3\t3\t7\t.");
        assert_eq!(format!("{}", ctx), "chr1:100 (CA)[3*] AD=[7]");

        let str_alleles: Vec<_> = set.iter().cloned().collect();
        let mat = DMatrix::from_element(4, 1, -1.0);
        let lk = AlleleLikelihoods::new(str_alleles, &["s1"], vec![mat]).unwrap();
        let ctx = StrContext::new("chr1", 100, None, set, Some(lk)).unwrap();
        assert_eq!(ctx.to_long_string(), "chr1\t100\tCA\t2\t3\t3\t.\ts1=4");
    }

    #[test]
    fn mismatched_sizes() {
        let set = StrAlleleSet::from_reference_bases(b"GCACACAGT", 2).unwrap();
        let mut str_alleles: Vec<_> = set.iter().cloned().collect();
        str_alleles.push(str_alleles[0].clone());
        let mat = DMatrix::from_element(1, 2, -1.0);
        let lk = AlleleLikelihoods::new(str_alleles, &["s1"], vec![mat]).unwrap();
        let e = StrContext::new("chr1", 100, None, set.clone(), Some(lk)).unwrap_err();
        assert!(e.to_string().contains("have 2 alleles; expected 1"), "{}", e);

        let ctx = StrContext::new("chr1", 100, None, set, None).unwrap();
        assert!(ctx.clone().with_allele_depths(vec![3, 4]).is_err());
        assert!(ctx.clone().with_allele_depths(vec![]).is_err());
        let ctx = ctx.with_allele_depths(vec![3]).unwrap();
        let e = ctx.with_allele_depths(vec![3]).unwrap_err();
        assert!(e.to_string().contains("already set"), "{}", e);
    }
}
