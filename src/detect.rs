use crate::reference::RefContext;

/// Repeat found immediately downstream of the anchor base of a reference context
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Repeat {
    pub unit_length: usize,
    pub repeats: usize,
}

impl Repeat {
    pub fn span(&self) -> usize {
        self.unit_length * self.repeats
    }
}

#[derive(Debug, Copy, Clone)]
pub struct DetectParams {
    pub maximum_unit_length: usize,
    pub minimum_repeat_count: usize,
    pub minimum_repeat_total_length: usize,
}

/// Number of contiguous copies of `unit` at the start of `s`
pub fn count_repeats(unit: &[u8], s: &[u8]) -> usize {
    if unit.is_empty() {
        0
    } else {
        s.chunks_exact(unit.len()).take_while(|c| *c == unit).count()
    }
}

/// Look for the shortest repeat unit starting after the anchor base that satisfies the
/// count and span thresholds.  Repeats that continue to the left of the anchor are skipped
/// as they will have been picked up at an earlier locus.
pub fn detect_repeat(ctx: &RefContext, par: &DetectParams) -> Option<Repeat> {
    let fwd = ctx.forward_bases();
    let window = ctx.bases();
    // Offset of anchor in window
    let anchor = ctx.locus() - ctx.window_start();
    for unit_length in 1..=par.maximum_unit_length {
        // End of contig (or window)
        if unit_length + 1 >= fwd.len() {
            break;
        }
        let unit = &fwd[1..=unit_length];
        if anchor + 1 >= unit_length && &window[anchor + 1 - unit_length..=anchor] == unit {
            continue;
        }
        let repeats = count_repeats(unit, &fwd[1..]);
        if repeats >= par.minimum_repeat_count
            && repeats * unit_length >= par.minimum_repeat_total_length
        {
            return Some(Repeat {
                unit_length,
                repeats,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn par(max_unit: usize, min_count: usize, min_len: usize) -> DetectParams {
        DetectParams {
            maximum_unit_length: max_unit,
            minimum_repeat_count: min_count,
            minimum_repeat_total_length: min_len,
        }
    }

    fn ctx(bases: &[u8], offset: usize) -> RefContext {
        RefContext::new("chr1", 100 + offset, 100, bases).unwrap()
    }

    #[test]
    fn count() {
        assert_eq!(count_repeats(b"CA", b"CACACAG"), 3);
        assert_eq!(count_repeats(b"CA", b"GCACA"), 0);
        assert_eq!(count_repeats(b"CA", b"CAC"), 1);
        assert_eq!(count_repeats(b"", b"CAC"), 0);
    }

    #[test]
    fn dinucleotide_repeat() {
        // Anchor G, followed by (CA)x6
        let c = ctx(b"TTGCACACACACACAGTT", 2);
        let r = detect_repeat(&c, &par(10, 2, 10)).unwrap();
        assert_eq!(r, Repeat { unit_length: 2, repeats: 6 });
        assert_eq!(r.span(), 12);
    }

    #[test]
    fn smallest_unit_wins() {
        // AAAAAAAAAAAA could be (A)12, (AA)6, (AAA)4...
        let c = ctx(b"GTAAAAAAAAAAAAG", 1);
        let r = detect_repeat(&c, &par(10, 2, 10)).unwrap();
        assert_eq!(r, Repeat { unit_length: 1, repeats: 12 });
    }

    #[test]
    fn thresholds() {
        let c = ctx(b"TTGCACACACACACAGTT", 2);
        assert!(detect_repeat(&c, &par(10, 7, 10)).is_none());
        assert!(detect_repeat(&c, &par(10, 2, 13)).is_none());
        assert!(detect_repeat(&c, &par(1, 2, 2)).is_none());
    }

    #[test]
    fn no_repeat() {
        let c = ctx(b"ACGTTGCAATCGGATC", 0);
        assert!(detect_repeat(&c, &par(10, 2, 1)).is_none());
        assert!(detect_repeat(&c, &par(10, 3, 0)).is_none());
    }

    #[test]
    fn repeat_anchored_upstream_is_skipped() {
        // Locus in the middle of (CA)n: base before the candidate unit continues the repeat
        let c = ctx(b"GCACACACACACACAGTT", 2);
        assert_eq!(c.forward_bases()[0], b'A');
        assert!(detect_repeat(&c, &par(2, 2, 4)).is_none());
        // Same sequence anchored at the G finds it
        let c = ctx(b"GCACACACACACACAGTT", 0);
        assert_eq!(detect_repeat(&c, &par(2, 2, 4)), Some(Repeat { unit_length: 2, repeats: 7 }));
    }

    #[test]
    fn short_window() {
        // Window shorter than twice the maximum unit length
        let c = ctx(b"GAAAA", 0);
        assert_eq!(detect_repeat(&c, &par(10, 2, 4)), Some(Repeat { unit_length: 1, repeats: 4 }));
        let c = ctx(b"GA", 0);
        assert!(detect_repeat(&c, &par(10, 1, 1)).is_none());
    }
}
