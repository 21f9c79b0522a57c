use std::path::PathBuf;

use crate::{model::ModelConfig, reference::Reference, variant::Variant};
use super::Region;

mod getters;
mod mk_config;

/// A site from the sites file.  If alleles were given they are held as a variant record.
#[derive(Debug, Clone)]
pub struct Site {
    contig: Box<str>,
    pos: usize,
    variant: Option<Variant>,
}

pub enum Targets {
    Regions(Vec<Region>),
    Sites(Vec<Site>),
}

pub struct Config {
    reference: Reference,
    targets: Targets,
    model_cfg: ModelConfig,
    window: usize,
    output: Option<PathBuf>,
}
