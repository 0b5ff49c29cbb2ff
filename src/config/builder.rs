use super::{ConfigResult, ConfigValidator, DelimiterPair, DelimiterPreset, StreamConfig};

/// Builder for StreamConfig that wraps the config itself
#[derive(Debug, Clone, Default)]
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from an existing configuration (takes ownership)
    pub fn from_config(config: StreamConfig) -> Self {
        Self { config }
    }

    pub fn delimiters(mut self, pair: DelimiterPair) -> Self {
        self.config.delimiters = pair;
        self
    }

    pub fn preset(self, preset: DelimiterPreset) -> Self {
        self.delimiters(DelimiterPair::from_preset(preset))
    }

    pub fn show_thoughts(mut self, show: bool) -> Self {
        self.config.show_thoughts = show;
        self
    }

    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.config.max_buffer_size = size;
        self
    }

    /// Build the configuration, running validation
    pub fn build(self) -> ConfigResult<StreamConfig> {
        ConfigValidator::validate(&self.config)?;
        Ok(self.config)
    }

    /// Build without validation
    pub fn build_unchecked(self) -> StreamConfig {
        self.config
    }
}
