//! FX quoting and route construction.
//!
//! Rates come from configuration; the engine's real job is choosing the
//! route shape: a direct quote names one provider's sender-side and
//! recipient-side instances, a PVPVP quote bridges two providers through
//! an intermediate leg and carries the four intermediate fields that mark
//! an instruction as intermediated.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use rand::Rng;

use corridor_core::messages::{QuoteRequest, QuoteResponse, RateType};
use corridor_core::{Amount, Currency, Endpoint};

use crate::config::HubConfig;
use crate::error::HubError;

#[derive(Debug, Clone)]
struct FxProviderEntry {
    name: String,
    instances: HashMap<Currency, Endpoint>,
}

impl FxProviderEntry {
    fn covers(&self, source: Currency, target: Currency) -> bool {
        self.instances.contains_key(&source) && self.instances.contains_key(&target)
    }
}

pub struct QuoteEngine {
    rates: HashMap<(Currency, Currency), f64>,
    providers: Vec<FxProviderEntry>,
    pvpvp_enabled: bool,
    quote_expiry: Duration,
}

impl QuoteEngine {
    pub fn from_config(config: &HubConfig) -> Self {
        let rates = config
            .rates
            .iter()
            .map(|entry| ((entry.source, entry.target), entry.rate))
            .collect();
        let providers = config
            .providers
            .iter()
            .map(|provider| FxProviderEntry {
                name: provider.name.clone(),
                instances: provider
                    .instances
                    .iter()
                    .map(|instance| {
                        (
                            instance.currency,
                            Endpoint::new(instance.wallet.as_str(), instance.host.as_str()),
                        )
                    })
                    .collect(),
            })
            .collect();
        Self {
            rates,
            providers,
            pvpvp_enabled: config.pvpvp_enabled,
            quote_expiry: Duration::seconds(config.quote_expiry_secs as i64),
        }
    }

    pub fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, HubError> {
        let source = request.source_currency;
        let target = request.target_currency;

        let rate = *self
            .rates
            .get(&(source, target))
            .ok_or(HubError::UnsupportedPair { src: source, target })?;

        let candidates: Vec<&FxProviderEntry> = self
            .providers
            .iter()
            .filter(|provider| provider.covers(source, target))
            .collect();
        if candidates.is_empty() {
            return Err(HubError::UnsupportedPair { src: source, target });
        }

        // Bid-rate conversion from whichever side the caller fixed.
        let rate_type = RateType::Bid;
        let (source_amount, target_amount) = match (request.source_amount, request.target_amount) {
            (Some(source_amount), _) => (source_amount.0, source_amount.0 * rate),
            (None, Some(target_amount)) => (target_amount.0 / rate, target_amount.0),
            (None, None) => {
                return Err(HubError::InvalidQuote(
                    "one of sourceAmount or targetAmount is required".into(),
                ))
            }
        };
        let source_amount = Amount(source_amount).round_bankers(source.decimals());
        let target_amount = Amount(target_amount).round_bankers(target.decimals());

        let mut response = {
            let provider = candidates[rand::thread_rng().gen_range(0..candidates.len())];
            QuoteResponse {
                source_currency: source,
                target_currency: target,
                source_amount,
                target_amount,
                quote_id: uuid::Uuid::now_v7(),
                rate,
                rate_type,
                fx_name: provider.name.clone(),
                sender_system_fx: provider.instances[&source].clone(),
                recipient_system_fx: provider.instances[&target].clone(),
                expiry_timestamp: Utc::now() + self.quote_expiry,
                intermediate_currency: None,
                intermediate_amount: None,
                intermediate_sender_fx: None,
                intermediate_recipient_fx: None,
            }
        };

        // Same-currency pairs can bridge two providers when PVPVP is on:
        // provider one carries the sender leg, provider two the recipient
        // leg, with the intermediate leg between their wallets.
        if self.pvpvp_enabled && source == target && candidates.len() >= 2 {
            let first = candidates[0];
            let second = candidates[1];
            response.rate_type = RateType::Effective;
            response.fx_name = format!("{} + {}", first.name, second.name);
            response.sender_system_fx = first.instances[&source].clone();
            response.recipient_system_fx = second.instances[&target].clone();
            response.intermediate_currency = Some(source);
            response.intermediate_amount = Some(response.source_amount);
            response.intermediate_sender_fx = Some(first.instances[&source].clone());
            response.intermediate_recipient_fx = Some(second.instances[&target].clone());
        }

        tracing::info!(
            quote_id = %response.quote_id,
            %source,
            %target,
            rate,
            fx = %response.fx_name,
            "quote issued"
        );
        Ok(response)
    }
}
