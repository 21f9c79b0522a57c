use crate::log_utils::init_log;

mod cli_model;
mod config;
mod region;

pub use cli_model::cli_model;
pub use config::{Config, Site, Targets};
pub use region::Region;

pub fn handle_cli() -> anyhow::Result<Config> {
    let m = cli_model().get_matches();
    init_log(&m);
    Config::from_matches(&m)
}
