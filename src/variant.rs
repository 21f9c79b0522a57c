use crate::allele::Allele;

#[derive(Clone, Debug)]
pub struct Genotype {
    sample: Box<str>,
    ad: Option<Vec<usize>>,
}

impl Genotype {
    pub fn new(sample: &str, ad: Option<Vec<usize>>) -> Self {
        Self {
            sample: Box::from(sample),
            ad,
        }
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Allelic depths, in the allele order of the owning variant
    pub fn ad(&self) -> Option<&[usize]> {
        self.ad.as_deref()
    }
}

/// Variant record as seen by the STR model.  The first allele is the reference
#[derive(Clone, Debug)]
pub struct Variant {
    contig: Box<str>,
    pos: usize,
    alleles: Vec<Allele>,
    genotypes: Vec<Genotype>,
}

impl Variant {
    pub fn new(
        contig: &str,
        pos: usize,
        alleles: Vec<Allele>,
        genotypes: Vec<Genotype>,
    ) -> anyhow::Result<Self> {
        match alleles.first() {
            Some(a) if a.is_reference() => (),
            _ => {
                return Err(anyhow!(
                    "First allele of variant at {}:{} must be the reference",
                    contig,
                    pos
                ));
            }
        }
        if alleles[1..].iter().any(|a| a.is_reference()) {
            return Err(anyhow!("Variant at {}:{} has multiple reference alleles", contig, pos));
        }
        for g in genotypes.iter() {
            if let Some(ad) = g.ad()
                && ad.len() != alleles.len()
            {
                return Err(anyhow!(
                    "AD for sample {} at {}:{} has {} values (expected {})",
                    g.sample(),
                    contig,
                    pos,
                    ad.len(),
                    alleles.len()
                ));
            }
        }
        Ok(Self {
            contig: Box::from(contig),
            pos,
            alleles,
            genotypes,
        })
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    pub fn reference_allele(&self) -> &Allele {
        &self.alleles[0]
    }

    pub fn alternate_alleles(&self) -> &[Allele] {
        &self.alleles[1..]
    }

    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    /// True for GVCF style reference blocks (no alternates, or only <NON_REF>)
    pub fn is_non_variant_block(&self) -> bool {
        match self.alternate_alleles() {
            [] => true,
            [a] => a.is_non_ref(),
            _ => false,
        }
    }

    /// Allelic depths summed over all genotypes with AD
    pub fn total_allele_depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.alleles.len()];
        for ad in self.genotypes.iter().filter_map(|g| g.ad()) {
            for (d, x) in depths.iter_mut().zip(ad.iter()) {
                *d += x
            }
        }
        depths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_variant_blocks() {
        let alleles = vec![Allele::reference(b"A"), Allele::non_ref()];
        let v = Variant::new("chrM", 10, alleles, vec![]).unwrap();
        assert!(v.is_non_variant_block());
        let v = Variant::new("chrM", 10, vec![Allele::reference(b"A")], vec![]).unwrap();
        assert!(v.is_non_variant_block());
        let v = Variant::new(
            "chrM",
            10,
            vec![Allele::reference(b"A"), Allele::alternate(b"AC"), Allele::non_ref()],
            vec![],
        )
        .unwrap();
        assert!(!v.is_non_variant_block());
    }

    #[test]
    fn depths_are_summed_across_samples() {
        let v = Variant::new(
            "chrM",
            10,
            vec![Allele::reference(b"A"), Allele::alternate(b"AC")],
            vec![
                Genotype::new("s1", Some(vec![3, 4])),
                Genotype::new("s2", None),
                Genotype::new("s3", Some(vec![1, 0])),
            ],
        )
        .unwrap();
        assert_eq!(v.total_allele_depths(), vec![4, 4]);
    }

    #[test]
    fn reference_must_come_first() {
        assert!(Variant::new("chrM", 1, vec![Allele::alternate(b"A")], vec![]).is_err());
        assert!(Variant::new("chrM", 1, vec![], vec![]).is_err());
        let bad_ad = vec![Genotype::new("s1", Some(vec![1]))];
        let alleles = vec![Allele::reference(b"A"), Allele::alternate(b"C")];
        assert!(Variant::new("chrM", 1, alleles, bad_ad).is_err());
    }
}
