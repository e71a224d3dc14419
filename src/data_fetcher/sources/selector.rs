//! Per-request routing between the public and internal backends

use tracing::debug;

use super::health::{SourceHealth, SourceKind};
use crate::config::{Config, RacingConfig};
use crate::data_fetcher::models::{ContentType, LoadOptions};
use crate::error::AppError;

/// Where a request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub kind: SourceKind,
    pub endpoint: String,
    pub requires_auth: bool,
}

#[derive(Debug, Clone)]
pub struct SourceSelector {
    public_endpoint: String,
    internal_endpoint: Option<String>,
    premium_enabled: bool,
    racing: RacingConfig,
}

impl SourceSelector {
    pub fn new(
        public_endpoint: impl Into<String>,
        internal_endpoint: Option<String>,
        premium_enabled: bool,
        racing: RacingConfig,
    ) -> Self {
        Self {
            public_endpoint: public_endpoint.into(),
            internal_endpoint,
            premium_enabled,
            racing,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.public_api_url.clone(),
            config.internal_api_url.clone(),
            config.premium_enabled,
            config.racing,
        )
    }

    pub fn premium_enabled(&self) -> bool {
        self.premium_enabled
    }

    pub fn has_internal_source(&self) -> bool {
        self.internal_endpoint.is_some()
    }

    fn internal(&self) -> Option<ResolvedSource> {
        self.internal_endpoint.as_ref().map(|endpoint| ResolvedSource {
            kind: SourceKind::Internal,
            endpoint: endpoint.clone(),
            requires_auth: true,
        })
    }

    fn public(&self) -> ResolvedSource {
        ResolvedSource {
            kind: SourceKind::Public,
            endpoint: self.public_endpoint.clone(),
            requires_auth: false,
        }
    }

    /// Picks the backend for one request from a health snapshot.
    ///
    /// Racing, ranking and rider data need the internal source. Premium
    /// requests prefer it when premium access is enabled and fall back to the
    /// public source otherwise. Never falls back across sources for
    /// internal-only types.
    pub fn resolve(
        &self,
        content_type: ContentType,
        health: &SourceHealth,
        options: &LoadOptions,
    ) -> Result<ResolvedSource, AppError> {
        if content_type.requires_internal_source() {
            let Some(internal) = self.internal() else {
                return Err(AppError::api_unavailable(
                    SourceKind::Internal.as_str(),
                    format!("no internal endpoint configured for {content_type}"),
                ));
            };
            if !health.is_healthy(SourceKind::Internal) {
                return Err(AppError::api_unavailable(
                    SourceKind::Internal.as_str(),
                    format!("health check failing, cannot load {content_type}"),
                ));
            }
            return Ok(internal);
        }

        if options.premium && self.premium_enabled {
            match self.internal() {
                Some(internal) if health.is_healthy(SourceKind::Internal) => {
                    debug!("Routing premium {content_type} request to internal source");
                    return Ok(internal);
                }
                _ => debug!("Internal source down, serving premium {content_type} from public"),
            }
        }

        if !health.is_healthy(SourceKind::Public) {
            return Err(AppError::api_unavailable(
                SourceKind::Public.as_str(),
                format!("health check failing, cannot load {content_type}"),
            ));
        }
        Ok(self.public())
    }

    /// `X-Racing-Port` value for a request, if it carries one
    pub fn racing_port_for(&self, content_type: ContentType, options: &LoadOptions) -> Option<u16> {
        (content_type == ContentType::Races)
            .then(|| racing_port(&self.racing, options.canonical().race_id.as_deref()))
    }
}

fn fnv1a(input: &str) -> u64 {
    input.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Deterministic port for a race: `port_base + id mod port_range`.
///
/// Non-numeric ids are hashed first. Without an id the live interaction port
/// is used.
pub fn racing_port(racing: &RacingConfig, race_id: Option<&str>) -> u16 {
    let Some(race_id) = race_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return racing.live_port;
    };
    let range = u64::from(racing.port_range.max(1));
    let slot = match race_id.parse::<u64>() {
        Ok(numeric) => numeric % range,
        Err(_) => fnv1a(race_id) % range,
    };
    // slot < port_range, which fits in u16
    racing.port_base.saturating_add(slot as u16)
}
