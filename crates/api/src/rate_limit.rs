//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Limits the control routes per peer IP using tower_governor. Alert and
//! monitoring commands share one budget; sensor set-points get their own,
//! looser budget since a slider drag sends a request per step.

use governor::middleware::StateInformationMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config with X-RateLimit-* headers enabled
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Milliseconds to replenish one request; takes precedence over `per_second`
    pub period_ms: Option<u64>,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            period_ms: None,
            burst_size: 10, // operators click alert buttons in quick bursts
        }
    }
}

impl RateLimitConfig {
    /// Config for set-point updates: 20 requests per second, burst of 40
    pub fn set_points() -> Self {
        Self {
            per_second: 1,
            period_ms: Some(50),
            burst_size: 40,
        }
    }
}

/// Budgets for the two groups of control routes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    /// Monitoring start/stop/reset and alert commands
    pub commands: RateLimitConfig,
    /// `PUT /api/v1/parameters/:name`
    pub set_points: RateLimitConfig,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            commands: RateLimitConfig::default(),
            set_points: RateLimitConfig::set_points(),
        }
    }
}

/// Create a rate limiting governor config.
///
/// Returns `None` when the period or burst is zero. Keys on the peer IP, so
/// the service must be served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<DefaultGovernorConfig>> {
    let mut builder = GovernorConfigBuilder::default();
    match config.period_ms {
        Some(period_ms) => builder.per_millisecond(period_ms),
        None => builder.per_second(config.per_second),
    };

    builder
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_second, 1);
        assert_eq!(config.burst_size, 10);
        assert!(create_governor_config(&config).is_some());
    }

    #[test]
    fn test_set_points_looser_than_commands() {
        let limits = RateLimits::default();
        assert_eq!(limits.commands.burst_size, 10);
        assert_eq!(limits.set_points.period_ms, Some(50));
        assert!(limits.set_points.burst_size > limits.commands.burst_size);
        assert!(create_governor_config(&limits.set_points).is_some());
    }

    #[test]
    fn test_zero_burst_rejected() {
        let config = RateLimitConfig {
            burst_size: 0,
            ..RateLimitConfig::default()
        };
        assert!(create_governor_config(&config).is_none());
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = RateLimitConfig {
            period_ms: Some(0),
            ..RateLimitConfig::set_points()
        };
        assert!(create_governor_config(&config).is_none());
    }
}
