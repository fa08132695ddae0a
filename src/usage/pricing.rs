use serde::Serialize;

/// Rates are quoted per this many tokens.
const TOKENS_PER_RATE_UNIT: f64 = 1_000_000.0;

/// Per-model API rates in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
    pub cache_creation: f64,
    pub cache_read: f64,
}

const OPUS: ModelPricing = ModelPricing {
    input: 15.0,
    output: 75.0,
    cache_creation: 18.75,
    cache_read: 1.50,
};

const SONNET: ModelPricing = ModelPricing {
    input: 3.0,
    output: 15.0,
    cache_creation: 3.75,
    cache_read: 0.30,
};

const HAIKU: ModelPricing = ModelPricing {
    input: 0.8,
    output: 4.0,
    cache_creation: 1.0,
    cache_read: 0.08,
};

/// Pricing keyed by canonical model name.
const PRICING: &[(&str, ModelPricing)] = &[
    ("opus-4.6", OPUS),
    ("opus-4.5", OPUS),
    ("opus-4.1", OPUS),
    ("sonnet-4.5", SONNET),
    ("sonnet-4", SONNET),
    ("haiku-4.5", HAIKU),
];

/// Anything carrying the four token sums can be priced.
pub trait TokenCounts {
    fn input_tokens(&self) -> u64;
    fn output_tokens(&self) -> u64;
    fn cache_creation_tokens(&self) -> u64;
    fn cache_read_tokens(&self) -> u64;

    fn total_tokens(&self) -> u64 {
        self.input_tokens()
            .saturating_add(self.output_tokens())
            .saturating_add(self.cache_creation_tokens())
            .saturating_add(self.cache_read_tokens())
    }
}

/// Look up pricing for a canonical model name.
pub fn get_model_pricing(model: &str) -> Option<&'static ModelPricing> {
    PRICING
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, pricing)| pricing)
}

/// API-equivalent cost in USD.
///
/// Returns exactly 0.0 for models missing from the table.
pub fn calculate_cost<T: TokenCounts + ?Sized>(model: &str, usage: &T) -> f64 {
    let pricing = match get_model_pricing(model) {
        Some(p) => p,
        None => return 0.0,
    };

    token_cost(usage.input_tokens(), pricing.input)
        + token_cost(usage.output_tokens(), pricing.output)
        + token_cost(usage.cache_creation_tokens(), pricing.cache_creation)
        + token_cost(usage.cache_read_tokens(), pricing.cache_read)
}

fn token_cost(tokens: u64, rate_per_million: f64) -> f64 {
    tokens as f64 * rate_per_million / TOKENS_PER_RATE_UNIT
}
