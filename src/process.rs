use std::io::Write;

use anyhow::Context;
use compress_io::compress::CompressIo;

use crate::{
    cli::{Config, Region, Site, Targets},
    compose::Composer,
    context::StrContext,
    model::StrModel,
    reference::Reference,
};

const REPORT_HEADER: &str =
    "contig\tpos\tunit\tunit_length\tref_repeats\tspan\trepeat_counts\tp_no_change";

fn write_row<W: Write>(wrt: &mut W, ctx: &StrContext, model: &StrModel) -> std::io::Result<()> {
    let a = ctx.alleles();
    let r = a.reference_repeat_count();
    let p = 10f64.powf(model.for_context(ctx).log10_coefficient(r, r));
    write!(
        wrt,
        "{}\t{}\t{}\t{}\t{}\t{}\t",
        ctx.contig(),
        ctx.pos(),
        String::from_utf8_lossy(a.repeat_unit()),
        a.repeat_unit_length(),
        r,
        r * a.repeat_unit_length()
    )?;
    for (i, x) in a.iter().enumerate() {
        if i > 0 {
            write!(wrt, ",")?
        }
        write!(wrt, "{}", x.repeat_count())?
    }
    writeln!(wrt, "\t{:.6}", p)
}

struct Counts {
    positions: usize,
    found: usize,
}

fn scan_region<W: Write>(
    wrt: &mut W,
    reference: &Reference,
    reg: &Region,
    window: usize,
    composer: &Composer,
    cts: &mut Counts,
) -> anyhow::Result<()> {
    let ctg = reference
        .name2contig(reg.contig())
        .ok_or_else(|| anyhow!("Contig {} not found", reg.contig()))?;
    debug!("Scanning {}:{}-{}", reg.contig(), reg.start() + 1, reg.stop() + 1);
    // Positions inside a reported repeat are skipped
    let mut next = 0;
    for pos in reg.positions() {
        cts.positions += 1;
        if pos < next {
            continue;
        }
        if let Some(rc) = ctg.ref_context(pos, window)
            && let Some(ctx) = composer.compose_from_reference(&rc)
        {
            write_row(wrt, &ctx, composer.model())?;
            let a = ctx.alleles();
            next = pos + a.reference_repeat_count() * a.repeat_unit_length();
            cts.found += 1;
        }
    }
    Ok(())
}

fn process_sites<W: Write>(
    wrt: &mut W,
    reference: &Reference,
    sites: &[Site],
    window: usize,
    composer: &mut Composer,
    cts: &mut Counts,
) -> anyhow::Result<()> {
    for site in sites {
        cts.positions += 1;
        let rc = reference
            .name2contig(site.contig())
            .and_then(|c| c.ref_context(site.pos(), window))
            .ok_or_else(|| {
                anyhow!("Could not get reference context for {}:{}", site.contig(), site.pos())
            })?;
        let ctx = match site.variant() {
            Some(vc) => {
                if !rc.forward_bases().starts_with(vc.reference_allele().bases()) {
                    warn!(
                        "Reference allele {} does not match reference at {}; skipping",
                        vc.reference_allele(),
                        rc
                    );
                    continue;
                }
                composer.compose_from_variant(&rc, vc)?
            }
            None => composer.compose_from_reference(&rc),
        };
        match ctx {
            Some(ctx) => {
                write_row(wrt, &ctx, composer.model())?;
                cts.found += 1;
            }
            None => trace!("No STR at {}", rc),
        }
    }
    Ok(())
}

pub fn process_data(cfg: Config) -> anyhow::Result<()> {
    let model = StrModel::load(cfg.model_config().clone())?;
    if model.is_null() {
        info!("No STR model file supplied; p_no_change will be 1");
    } else {
        info!(
            "STR model loaded with calculators for unit lengths up to {}",
            model.max_unit_length()
        );
    }
    let mut composer = Composer::new(&model)?;

    let mut wrt = match cfg.output() {
        Some(p) => CompressIo::new()
            .path(p)
            .bufwriter()
            .with_context(|| format!("Could not open output file {}", p.display()))?,
        None => CompressIo::new().bufwriter()?,
    };
    writeln!(wrt, "{}", REPORT_HEADER)?;

    let mut cts = Counts {
        positions: 0,
        found: 0,
    };
    match cfg.targets() {
        Targets::Regions(regions) => {
            for reg in regions {
                scan_region(&mut wrt, cfg.reference(), reg, cfg.window(), &composer, &mut cts)?
            }
        }
        Targets::Sites(sites) => process_sites(
            &mut wrt,
            cfg.reference(),
            sites,
            cfg.window(),
            &mut composer,
            &mut cts,
        )?,
    }
    wrt.flush()?;
    composer.finish()?;
    info!(
        "Processed {} positions; {} STR sites reported",
        cts.positions, cts.found
    );
    Ok(())
}
