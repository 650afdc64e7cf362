//! Process-lifetime token and request accounting, partitioned by provider

use std::collections::BTreeMap;

use crate::provider::TokenUsage;
use crate::providers::ProviderKind;

/// Running totals for one provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderUsage {
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ProviderUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Cumulative usage for the current process. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageLedger {
    entries: BTreeMap<ProviderKind, ProviderUsage>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute one completed request to `provider`
    pub(crate) fn record(&mut self, provider: ProviderKind, usage: TokenUsage) {
        let entry = self.entries.entry(provider).or_default();
        entry.requests += 1;
        entry.input_tokens += usage.input_tokens;
        entry.output_tokens += usage.output_tokens;
    }

    pub fn usage_for(&self, provider: ProviderKind) -> ProviderUsage {
        self.entries.get(&provider).copied().unwrap_or_default()
    }

    pub fn total_input(&self, provider: ProviderKind) -> u64 {
        self.usage_for(provider).input_tokens
    }

    pub fn total_output(&self, provider: ProviderKind) -> u64 {
        self.usage_for(provider).output_tokens
    }

    pub fn request_count(&self, provider: ProviderKind) -> u64 {
        self.usage_for(provider).requests
    }

    /// Providers with at least one recorded request, in stable order
    pub fn providers(&self) -> impl Iterator<Item = (ProviderKind, ProviderUsage)> + '_ {
        self.entries.iter().map(|(kind, usage)| (*kind, *usage))
    }

    /// Sum across all providers
    pub fn grand_total(&self) -> ProviderUsage {
        self.entries
            .values()
            .fold(ProviderUsage::default(), |acc, u| ProviderUsage {
                requests: acc.requests + u.requests,
                input_tokens: acc.input_tokens + u.input_tokens,
                output_tokens: acc.output_tokens + u.output_tokens,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_are_sums() {
        let mut ledger = UsageLedger::new();
        let calls = [(10, 5), (20, 7), (3, 1)];
        for (input, output) in calls {
            ledger.record(ProviderKind::Gemini, TokenUsage::new(input, output));
        }

        assert_eq!(ledger.total_input(ProviderKind::Gemini), 33);
        assert_eq!(ledger.total_output(ProviderKind::Gemini), 13);
        assert_eq!(ledger.request_count(ProviderKind::Gemini), 3);
        assert_eq!(ledger.request_count(ProviderKind::OpenRouter), 0);
    }

    #[test]
    fn test_partitioned_by_provider() {
        let mut ledger = UsageLedger::new();
        ledger.record(ProviderKind::Gemini, TokenUsage::new(1, 2));
        ledger.record(ProviderKind::OpenRouter, TokenUsage::new(10, 20));

        let kinds: Vec<_> = ledger.providers().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![ProviderKind::Gemini, ProviderKind::OpenRouter]);

        let total = ledger.grand_total();
        assert_eq!(total.requests, 2);
        assert_eq!(total.total_tokens(), 33);
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = UsageLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.usage_for(ProviderKind::Gemini), ProviderUsage::default());
    }
}
