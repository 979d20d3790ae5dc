//! Construction-time knobs for a [`crate::session::Session`] (§4.5/§4.9
//! describe the behavior these drive, not their construction surface).

/// Builder-style configuration for a session. `url` is the only required
/// field; everything else defaults to the values spec.md's prose implies.
#[derive(Debug, Clone)]
pub struct PulseConfig {
    pub url: String,
    pub initial_connecting_delay_ms: u32,
    pub initial_error_delay_ms: u32,
    pub reconnect_error_delay_ms: u32,
    pub hydrate: bool,
    pub offline_cache_capacity: usize,
    pub offline_cache_persist: bool,
}

impl PulseConfig {
    pub fn new(url: impl Into<String>) -> PulseConfig {
        PulseConfig { url: url.into(), ..PulseConfig::default() }
    }

    pub fn with_initial_connecting_delay_ms(mut self, ms: u32) -> PulseConfig {
        self.initial_connecting_delay_ms = ms;
        self
    }

    pub fn with_initial_error_delay_ms(mut self, ms: u32) -> PulseConfig {
        self.initial_error_delay_ms = ms;
        self
    }

    pub fn with_reconnect_error_delay_ms(mut self, ms: u32) -> PulseConfig {
        self.reconnect_error_delay_ms = ms;
        self
    }

    pub fn with_hydrate(mut self, hydrate: bool) -> PulseConfig {
        self.hydrate = hydrate;
        self
    }

    pub fn with_offline_cache_capacity(mut self, capacity: usize) -> PulseConfig {
        self.offline_cache_capacity = capacity;
        self
    }

    pub fn with_offline_cache_persist(mut self, persist: bool) -> PulseConfig {
        self.offline_cache_persist = persist;
        self
    }
}

impl Default for PulseConfig {
    fn default() -> PulseConfig {
        PulseConfig {
            url: String::new(),
            initial_connecting_delay_ms: 300,
            initial_error_delay_ms: 3_000,
            reconnect_error_delay_ms: 3_000,
            hydrate: true,
            offline_cache_capacity: pulse_router::DEFAULT_CAPACITY,
            offline_cache_persist: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_touched_fields() {
        let config = PulseConfig::new("wss://example/pulse").with_initial_connecting_delay_ms(50);
        assert_eq!(config.url, "wss://example/pulse");
        assert_eq!(config.initial_connecting_delay_ms, 50);
        assert_eq!(config.initial_error_delay_ms, PulseConfig::default().initial_error_delay_ms);
    }
}
