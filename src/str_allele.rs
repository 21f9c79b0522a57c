use std::fmt;

use crate::{allele::Allele, detect::count_repeats};

/// Allele defined by the number of copies of the repeat unit
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StrAllele {
    repeat_count: usize,
    bases: Box<[u8]>,
}

impl StrAllele {
    fn new(unit: &[u8], repeat_count: usize) -> Self {
        Self {
            repeat_count,
            bases: unit.repeat(repeat_count).into_boxed_slice(),
        }
    }

    pub fn repeat_count(&self) -> usize {
        self.repeat_count
    }

    /// Repeat unit repeated `repeat_count` times
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }
}

/// Alleles of an STR site sorted by (and unique on) repeat count
#[derive(Clone, Debug)]
pub struct StrAlleleSet {
    padding: Box<[u8]>,
    unit: Box<[u8]>,
    reference_repeat_count: usize,
    alleles: Vec<StrAllele>,
}

impl StrAlleleSet {
    /// Set with just the reference allele
    pub fn new(padding: &[u8], unit: &[u8], reference_repeat_count: usize) -> Self {
        assert!(!unit.is_empty(), "Empty repeat unit");
        Self {
            padding: Box::from(padding),
            unit: Box::from(unit),
            reference_repeat_count,
            alleles: vec![StrAllele::new(unit, reference_repeat_count)],
        }
    }

    /// Takes the unit from the bases following the anchor (first) base
    pub fn from_reference_bases(forward: &[u8], unit_length: usize) -> Option<Self> {
        if unit_length == 0 || forward.len() <= unit_length {
            return None;
        }
        let unit = &forward[1..=unit_length];
        let repeats = count_repeats(unit, &forward[1..]);
        Some(Self::new(&forward[..1], unit, repeats))
    }

    /// Build from the alleles of a site.  The repeat unit is inferred from the first
    /// alternate allele that changes the allele length.  Symbolic alleles are ignored.
    ///
    /// Returns None if no unit can be inferred, if an allele length change is not a multiple of
    /// the unit length or if an allele would have a negative repeat count.
    pub fn from_alleles(alleles: &[Allele], forward: &[u8]) -> Option<Self> {
        let ref_allele = alleles.iter().find(|a| a.is_reference())?;
        let ref_len = ref_allele.len();
        if ref_len == 0 || forward.is_empty() {
            return None;
        }
        let unit = alleles
            .iter()
            .filter(|a| !a.is_symbolic() && !a.is_empty() && a.len() != ref_len)
            .find_map(|a| {
                let (long, delta) = if a.len() > ref_len {
                    (a.bases(), a.len() - ref_len)
                } else {
                    (ref_allele.bases(), ref_len - a.len())
                };
                long.get(1..=delta).map(|s| &s[..shortest_period(s)])
            })?;
        let unit_length = unit.len();
        let reference_repeat_count = count_repeats(unit, &forward[1..]);

        let mut set = Self::new(&forward[..1], unit, reference_repeat_count);
        for a in alleles.iter().filter(|a| !a.is_symbolic()) {
            let c = set.repeat_count_of(a, ref_len)?;
            set.insert(c);
        }
        trace!(
            "Allele set with unit {} ({} bp), counts {:?}",
            String::from_utf8_lossy(&set.unit),
            unit_length,
            set.alleles.iter().map(|a| a.repeat_count).collect::<Vec<_>>()
        );
        Some(set)
    }

    /// Repeat count corresponding to allele `a`, given the length of the reference allele
    pub fn repeat_count_of(&self, a: &Allele, ref_len: usize) -> Option<usize> {
        let delta = a.len() as isize - ref_len as isize;
        let ul = self.unit.len() as isize;
        if delta % ul != 0 {
            None
        } else {
            let c = self.reference_repeat_count as isize + delta / ul;
            if c < 0 {
                None
            } else {
                Some(c as usize)
            }
        }
    }

    fn insert(&mut self, repeat_count: usize) {
        if let Err(ix) = self
            .alleles
            .binary_search_by_key(&repeat_count, |a| a.repeat_count)
        {
            self.alleles
                .insert(ix, StrAllele::new(&self.unit, repeat_count))
        }
    }

    pub fn repeat_unit(&self) -> &[u8] {
        &self.unit
    }

    pub fn repeat_unit_length(&self) -> usize {
        self.unit.len()
    }

    pub fn padding(&self) -> &[u8] {
        &self.padding
    }

    pub fn reference_repeat_count(&self) -> usize {
        self.reference_repeat_count
    }

    pub fn maximum_repeat_count(&self) -> usize {
        self.alleles.last().map(|a| a.repeat_count).unwrap_or(0)
    }

    pub fn allele_count(&self) -> usize {
        self.alleles.len()
    }

    pub fn get(&self, ix: usize) -> Option<&StrAllele> {
        self.alleles.get(ix)
    }

    pub fn index_of(&self, repeat_count: usize) -> Option<usize> {
        self.alleles
            .binary_search_by_key(&repeat_count, |a| a.repeat_count)
            .ok()
    }

    pub fn by_repeat_count(&self, repeat_count: usize) -> Option<&StrAllele> {
        self.index_of(repeat_count).map(|ix| &self.alleles[ix])
    }

    pub fn reference_index(&self) -> usize {
        self.index_of(self.reference_repeat_count)
            .expect("Reference repeat count missing from allele set")
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrAllele> {
        self.alleles.iter()
    }

    /// Express `repeat_count` as a change to `ref_allele`: copies of the unit are inserted or
    /// removed immediately after the anchor base.  The reference count returns the reference
    /// allele itself.
    pub fn map_allele(&self, ref_allele: &Allele, repeat_count: usize) -> anyhow::Result<Allele> {
        let rc = self.reference_repeat_count;
        let bases = ref_allele.bases();
        if !ref_allele.is_reference() || bases.is_empty() {
            return Err(anyhow!(
                "Can not map repeat count onto non reference allele {}",
                ref_allele
            ));
        }
        if repeat_count == rc {
            return Ok(ref_allele.clone());
        }
        let mut v = Vec::with_capacity(bases.len() + self.unit.len() * repeat_count.abs_diff(rc));
        v.push(bases[0]);
        if repeat_count > rc {
            v.extend(self.unit.repeat(repeat_count - rc));
            v.extend_from_slice(&bases[1..]);
        } else {
            let skip = 1 + (rc - repeat_count) * self.unit.len();
            if skip > bases.len() {
                return Err(anyhow!(
                    "Reference allele {} too short to remove {} copies of the repeat unit",
                    ref_allele,
                    rc - repeat_count
                ));
            }
            v.extend_from_slice(&bases[skip..]);
        }
        Ok(Allele::alternate(&v))
    }
}

impl<'a> IntoIterator for &'a StrAlleleSet {
    type Item = &'a StrAllele;
    type IntoIter = std::slice::Iter<'a, StrAllele>;

    fn into_iter(self) -> Self::IntoIter {
        self.alleles.iter()
    }
}

impl fmt::Display for StrAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repeat_count)
    }
}

impl fmt::Display for StrAlleleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})[", String::from_utf8_lossy(&self.unit))?;
        for (i, a) in self.alleles.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", a)?;
            if a.repeat_count == self.reference_repeat_count {
                write!(f, "*")?;
            }
        }
        write!(f, "]")
    }
}

/// Length of the shortest unit that tiles `s`
fn shortest_period(s: &[u8]) -> usize {
    let n = s.len();
    (1..n)
        .filter(|p| n % p == 0)
        .find(|&p| s.chunks_exact(p).all(|c| c == &s[..p]))
        .unwrap_or(n)
}
