use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::ArgMatches;
use compress_io::compress::CompressIo;

use crate::{
    allele::Allele,
    model::ModelConfig,
    reference::Reference,
    variant::Variant,
};

use super::{super::Region, Config, Site, Targets};

impl Config {
    pub fn from_matches(m: &ArgMatches) -> anyhow::Result<Self> {
        let model_cfg = ModelConfig {
            parameter_file: m.get_one::<PathBuf>("str_model_file").cloned(),
            minimum_repeat_total_length: *m.try_get_one::<usize>("str_min_length")?.unwrap(),
            maximum_unit_length: *m.try_get_one::<usize>("str_max_unit")?.unwrap(),
            minimum_repeat_count: *m.try_get_one::<usize>("str_min_count")?.unwrap(),
            log_file: m.get_one::<PathBuf>("str_log").cloned(),
        };
        let window = *m.try_get_one::<usize>("window")?.unwrap();
        if window == 0
            || model_cfg.maximum_unit_length == 0
            || model_cfg.minimum_repeat_count == 0
        {
            return Err(anyhow!(
                "--window, --str-max-unit and --str-min-count must be greater than 0"
            ));
        }
        let output = m.get_one::<PathBuf>("output").cloned();

        let ref_file = m
            .get_one::<PathBuf>("reference")
            .expect("Missing reference"); // Should be enforced by clap

        let rdr = CompressIo::new()
            .path(ref_file)
            .bufreader()
            .with_context(|| format!("Could not open reference file {}", ref_file.display()))?;
        debug!("Opened {} for input", ref_file.display());
        let reference = Reference::from_reader(rdr)
            .with_context(|| format!("Error reading reference file {}", ref_file.display()))?;
        if reference.n_contigs() == 0 {
            return Err(anyhow!(
                "No contigs read in from reference file {}",
                ref_file.display()
            ));
        }
        debug!(
            "Reference read in successfully with {} contigs",
            reference.n_contigs()
        );

        let targets = if let Some(file) = m.get_one::<PathBuf>("sites") {
            Targets::Sites(read_sites(file, &reference)?)
        } else if let Some(reg_str) = m.get_one::<String>("region") {
            Targets::Regions(vec![Region::from_str(reg_str, &reference)?])
        } else {
            Targets::Regions(
                reference
                    .contigs()
                    .iter()
                    .filter(|c| c.size() > 0)
                    .map(|c| Region::new(c.name(), None, None, &reference))
                    .collect::<anyhow::Result<Vec<_>>>()?,
            )
        };

        Ok(Config {
            reference,
            targets,
            model_cfg,
            window,
            output,
        })
    }
}

/// Sites file: tab separated contig, position (1 based) and optionally the reference allele and
/// a comma separated list of alternate alleles.  Blank lines and lines starting with '#' are
/// skipped.
pub(super) fn read_sites<S: AsRef<Path>>(
    file: S,
    reference: &Reference,
) -> anyhow::Result<Vec<Site>> {
    let file = file.as_ref();
    let rdr = CompressIo::new()
        .path(file)
        .bufreader()
        .with_context(|| format!("Could not open sites file {}", file.display()))?;
    debug!("Reading in sites from {}", file.display());
    let v = parse_sites(rdr, reference)
        .with_context(|| format!("Error reading sites file {}", file.display()))?;
    debug!("Sites read: {}", v.len());
    Ok(v)
}

fn parse_sites<R: BufRead>(mut rdr: R, reference: &Reference) -> anyhow::Result<Vec<Site>> {
    let mut buf = String::new();
    let mut v = Vec::new();
    let mut line = 0;
    loop {
        buf.clear();
        if rdr.read_line(&mut buf)? == 0 {
            break;
        }
        line += 1;
        let s = buf.trim_end();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let site = parse_site_line(s, reference).with_context(|| format!("line {}", line))?;
        trace!("Site {}:{}", site.contig, site.pos);
        v.push(site)
    }
    Ok(v)
}

fn parse_site_line(s: &str, reference: &Reference) -> anyhow::Result<Site> {
    let fields: Vec<_> = s.split('\t').collect();
    if fields.len() != 2 && fields.len() != 4 {
        return Err(anyhow!(
            "Wrong number of fields (seen {}, expected 2 or 4)",
            fields.len()
        ));
    }
    let ctg = reference
        .name2contig(fields[0])
        .ok_or_else(|| anyhow!("Contig {} not present in reference", fields[0]))?;
    let pos = fields[1]
        .parse::<usize>()
        .map_err(|e| anyhow!("Could not parse position '{}': {}", fields[1], e))?;
    if pos == 0 || pos > ctg.size() {
        return Err(anyhow!(
            "Position {} outside of contig {} (length {})",
            pos,
            ctg.name(),
            ctg.size()
        ));
    }
    let variant = if fields.len() == 4 {
        let r = fields[2].as_bytes();
        if r.is_empty() || Allele::alternate(r).is_symbolic() {
            return Err(anyhow!("Invalid reference allele '{}'", fields[2]));
        }
        let mut alleles = vec![Allele::reference(r)];
        if fields[3] != "." {
            alleles.extend(fields[3].split(',').map(|a| Allele::alternate(a.as_bytes())))
        }
        Some(Variant::new(ctg.name(), pos, alleles, Vec::new())?)
    } else {
        None
    };
    Ok(Site {
        contig: Box::from(ctg.name()),
        pos,
        variant,
    })
}
