use super::*;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &StreamConfig) -> ConfigResult<()> {
        Self::validate_delimiters(&config.delimiters)?;

        if config.max_buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_buffer_size".to_string(),
                value: config.max_buffer_size.to_string(),
                reason: "Must be > 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn validate_delimiters(pair: &DelimiterPair) -> ConfigResult<()> {
        if pair.open.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "delimiters.open".to_string(),
            });
        }

        if pair.close.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "delimiters.close".to_string(),
            });
        }

        if pair.open == pair.close {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "open and close markers must differ, both are '{}'",
                    pair.open
                ),
            });
        }

        // Such an open marker would also terminate its own thought.
        if pair.open.contains(&pair.close) {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "open marker '{}' must not contain close marker '{}'",
                    pair.open, pair.close
                ),
            });
        }

        Ok(())
    }
}
