#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod allele;
pub mod calculator;
pub mod cli;
pub mod compose;
pub mod context;
pub mod detect;
pub mod likelihoods;
pub mod log_utils;
pub mod model;
pub mod params;
pub mod process;
pub mod reference;
pub mod str_allele;
pub mod variant;
