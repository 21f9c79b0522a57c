use std::{collections::HashMap, fmt, io::BufRead, rc::Rc};

// Maps FASTA characters to upper case ACGTN.  IUPAC ambiguity codes become N, anything else is
// illegal (0)
const BASE_TRANS: [u8; 256] = {
    let mut t = [0u8; 256];
    let valid = b"ACGTNRYSWKMBDHV";
    let mut i = 0;
    while i < valid.len() {
        let c = valid[i];
        let u = match c {
            b'A' | b'C' | b'G' | b'T' => c,
            _ => b'N',
        };
        t[c as usize] = u;
        t[(c + 32) as usize] = u;
        i += 1;
    }
    t
};

pub struct Contig {
    seq: Vec<u8>,
    name: Rc<str>,
}

impl Contig {
    pub fn new(name: &str, seq: &[u8]) -> anyhow::Result<Self> {
        let seq = translate(seq)
            .ok_or_else(|| anyhow!("Illegal base in sequence for contig {}", name))?;
        Ok(Self {
            seq,
            name: Rc::from(name),
        })
    }

    pub fn size(&self) -> usize {
        self.seq.len()
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference context at 1 based position `pos` with `flank` bases either side (clipped to the
    /// contig)
    pub fn ref_context(&self, pos: usize, flank: usize) -> Option<RefContext> {
        if pos == 0 || pos > self.seq.len() {
            return None;
        }
        let window_start = pos.saturating_sub(flank).max(1);
        let window_end = (pos + flank).min(self.seq.len());
        RefContext::new(&self.name, pos, window_start, &self.seq[window_start - 1..window_end]).ok()
    }
}

fn translate(s: &[u8]) -> Option<Vec<u8>> {
    s.iter()
        .map(|x| match BASE_TRANS[*x as usize] {
            0 => None,
            c => Some(c),
        })
        .collect()
}

struct FastaReader<R: BufRead> {
    rdr: R,
    buffer: String,
    line: usize,
}

impl<R: BufRead> FastaReader<R> {
    fn new(rdr: R) -> FastaReader<R> {
        let buffer = String::new();
        Self {
            rdr,
            buffer,
            line: 0,
        }
    }

    fn next_record(&mut self) -> anyhow::Result<Option<Contig>> {
        if self.buffer.is_empty() {
            if self.rdr.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;
        }
        let name: Rc<str> = self
            .buffer
            .strip_prefix('>')
            .and_then(|s| s.split_ascii_whitespace().next())
            .map(Rc::from)
            .ok_or_else(|| anyhow!("Expected '>' at start of line {}", self.line))?;
        trace!("Found contig {}", name);
        let mut seq = Vec::new();
        loop {
            self.buffer.clear();
            if self.rdr.read_line(&mut self.buffer)? == 0 {
                break;
            }
            self.line += 1;
            if self.buffer.starts_with('>') {
                break;
            }
            for c in self
                .buffer
                .trim_end()
                .as_bytes()
                .iter()
                .map(|x| BASE_TRANS[*x as usize])
            {
                if c > 0 {
                    seq.push(c)
                } else {
                    return Err(anyhow!("Illegal base at line {}", self.line));
                }
            }
        }
        Ok(Some(Contig { name, seq }))
    }
}

#[derive(Default)]
pub struct Reference {
    contigs: Vec<Contig>,
    name2ix: HashMap<Rc<str>, usize>,
}

impl Reference {
    pub fn from_reader<R: BufRead>(rdr: R) -> anyhow::Result<Self> {
        let mut reference = Self::default();
        let mut fasta_rdr = FastaReader::new(rdr);
        while let Some(ctg) = fasta_rdr.next_record()? {
            debug!("Read in contig {} ({} bp)", ctg.name(), ctg.size());
            reference.add_contig(ctg)?;
        }
        Ok(reference)
    }

    pub fn add_contig(&mut self, ctg: Contig) -> anyhow::Result<()> {
        if self.name2ix.contains_key(&ctg.name) {
            return Err(anyhow!("Duplicate contig {} in reference", ctg.name));
        }
        self.name2ix.insert(ctg.name.clone(), self.contigs.len());
        self.contigs.push(ctg);
        Ok(())
    }

    pub fn n_contigs(&self) -> usize {
        self.contigs.len()
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn name2contig(&self, s: &str) -> Option<&Contig> {
        self.name2ix.get(s).map(|x| &self.contigs[*x])
    }
}

/// A window of reference bases around a (1 based) locus.  The locus base is the anchor (padding)
/// base of the site; candidate repeats start at the following base.
#[derive(Clone, Debug)]
pub struct RefContext {
    contig: Rc<str>,
    locus: usize,
    window_start: usize,
    bases: Vec<u8>,
}

impl RefContext {
    pub fn new(
        contig: &str,
        locus: usize,
        window_start: usize,
        bases: &[u8],
    ) -> anyhow::Result<Self> {
        if locus < window_start || locus >= window_start + bases.len() {
            return Err(anyhow!(
                "Locus {}:{} outside of reference window {}-{}",
                contig,
                locus,
                window_start,
                window_start + bases.len()
            ));
        }
        Ok(Self {
            contig: Rc::from(contig),
            locus,
            window_start,
            bases: bases.to_ascii_uppercase(),
        })
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn locus(&self) -> usize {
        self.locus
    }

    pub fn window_start(&self) -> usize {
        self.window_start
    }

    /// All bases in the window
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Bases from the locus to the end of the window
    pub fn forward_bases(&self) -> &[u8] {
        &self.bases[self.locus - self.window_start..]
    }

    pub fn base(&self) -> u8 {
        self.bases[self.locus - self.window_start]
    }
}

impl fmt::Display for RefContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contig, self.locus)
    }
}
