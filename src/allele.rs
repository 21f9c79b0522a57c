use std::fmt;

/// Symbolic allele used by GVCF reference blocks
pub const NON_REF_SYMBOLIC_ALLELE: &str = "<NON_REF>";

/// A sequence (or symbolic) allele as handed over by the calling pipeline
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Allele {
    bases: Box<[u8]>,
    reference: bool,
    symbolic: bool,
}

impl Allele {
    pub fn new(bases: &[u8], reference: bool) -> Self {
        let symbolic = is_symbolic(bases);
        assert!(
            !(reference && symbolic),
            "Reference allele can not be symbolic"
        );
        Self {
            bases: Box::from(bases.to_ascii_uppercase()),
            reference,
            symbolic,
        }
    }

    pub fn reference(bases: &[u8]) -> Self {
        Self::new(bases, true)
    }

    pub fn alternate(bases: &[u8]) -> Self {
        Self::new(bases, false)
    }

    pub fn non_ref() -> Self {
        Self::new(NON_REF_SYMBOLIC_ALLELE.as_bytes(), false)
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Length in bases (0 for symbolic alleles)
    pub fn len(&self) -> usize {
        if self.symbolic {
            0
        } else {
            self.bases.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_reference(&self) -> bool {
        self.reference
    }

    pub fn is_symbolic(&self) -> bool {
        self.symbolic
    }

    pub fn is_non_ref(&self) -> bool {
        self.symbolic && &*self.bases == NON_REF_SYMBOLIC_ALLELE.as_bytes()
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bases))?;
        if self.reference {
            write!(f, "*")?;
        }
        Ok(())
    }
}

// <DEL>, <NON_REF>, breakends and single breakend notation
fn is_symbolic(bases: &[u8]) -> bool {
    match bases {
        [b'<', .., b'>'] => true,
        [b'.', ..] | [.., b'.'] => bases.len() > 1,
        _ => bases.iter().any(|c| matches!(c, b'[' | b']')),
    }
}
