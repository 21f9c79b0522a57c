use std::path::Path;

use crate::{model::ModelConfig, reference::Reference, variant::Variant};

use super::{Config, Site, Targets};

impl Config {
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_cfg
    }

    /// Number of reference bases either side of a site
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

impl Site {
    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn variant(&self) -> Option<&Variant> {
        self.variant.as_ref()
    }
}
