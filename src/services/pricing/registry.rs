//! Canonical rule registry shared by runtime pricing and the SQL compiler

use super::types::{CostRule, Pricing, ProviderCosts};

/// Ordered provider tables plus the global fallback table
#[derive(Debug, Clone, Default)]
pub struct CostRegistry {
    pub(super) providers: Vec<ProviderCosts>,
    pub(super) global: Vec<CostRule>,
}

impl CostRegistry {
    pub fn new(providers: Vec<ProviderCosts>, global: Vec<CostRule>) -> Self {
        Self { providers, global }
    }

    pub fn providers(&self) -> &[ProviderCosts] {
        &self.providers
    }

    pub fn global(&self) -> &[CostRule] {
        &self.global
    }

    /// Provider table by exact name, else the first whose regex matches
    pub fn provider_table(&self, provider: &str) -> Option<&ProviderCosts> {
        self.providers
            .iter()
            .find(|p| p.pattern.name() == provider)
            .or_else(|| {
                self.providers
                    .iter()
                    .find(|p| p.pattern.matches_regex(provider))
            })
    }

    /// Name of the table `provider` is priced under, or `provider` itself
    ///
    /// Warehouse rows carry this name so the compiled aggregate, which
    /// branches on exact table names, picks the same table as [`Self::lookup`].
    pub fn canonical_provider<'a>(&'a self, provider: &'a str) -> &'a str {
        self.provider_table(provider)
            .map(|table| table.pattern.name())
            .unwrap_or(provider)
    }

    /// First matching rule: provider rules, then the global table
    pub fn lookup(&self, provider: &str, model: &str) -> Option<&Pricing> {
        let model = model.to_lowercase();
        if model.is_empty() {
            return None;
        }

        let table = self.provider_table(provider)?;

        table
            .costs
            .iter()
            .chain(self.global.iter())
            .find(|rule| rule.model.matches_lowercase(&model))
            .map(|rule| &rule.cost)
    }

    /// Cost of one call, `None` when unpriced
    pub fn price(
        &self,
        model: &str,
        provider: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        images: u64,
        per_call: u64,
    ) -> Option<f64> {
        self.lookup(provider, model)
            .map(|pricing| pricing.cost(prompt_tokens, completion_tokens, images, per_call))
    }

    pub fn rule_count(&self) -> usize {
        self.providers.iter().map(|p| p.costs.len()).sum::<usize>() + self.global.len()
    }
}
