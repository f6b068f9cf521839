//! Page-wide filter state

use crate::adapters::{select_adapters, AdapterKind};
use crate::config::{StoredConfig, SubOptions};
use crate::page::PageContext;
use crate::parser::RuleSet;
use crate::types::SiteType;

/// Everything a pass needs to know about the page and the user's settings.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub enabled: bool,
    pub site_enabled: bool,
    pub page: PageContext,
    pub sub_options: SubOptions,
    pub rules: RuleSet,
    pub hidden_count: usize,
    pub revealed: bool,
}

impl FilterState {
    pub fn new(page: PageContext, config: &StoredConfig) -> Self {
        let mut state = Self {
            enabled: config.enabled,
            site_enabled: config.site_enabled(page.site),
            page,
            sub_options: config.sub_options,
            rules: RuleSet::parse(&config.block_list),
            hidden_count: 0,
            revealed: false,
        };
        state.sync(config);
        state
    }

    pub fn site(&self) -> SiteType {
        self.page.site
    }

    /// Refresh toggles from `config`. The rule set is left alone.
    pub fn sync(&mut self, config: &StoredConfig) {
        self.enabled = config.enabled;
        self.site_enabled = config.site_enabled(self.page.site);
        self.sub_options = config.sub_options;
    }

    pub fn adapters(&self) -> Vec<AdapterKind> {
        select_adapters(&self.page, &self.sub_options)
    }

    /// Global and site toggles on, and at least one adapter for this page.
    pub fn is_filtering(&self) -> bool {
        self.enabled && self.site_enabled && !self.adapters().is_empty()
    }
}
