use crate::proxy::config::{DefaultParams, GatewayConfig, RateLimitConfig};
use crate::proxy::dispatch::DispatchBundle;
use crate::proxy::rate_limit::{FixedWindowGate, RateLimitGate};
use crate::proxy::registry::ServerRegistry;
use crate::proxy::success_tracker::{InMemorySuccessTracker, SuccessTracker};
use crate::proxy::upstream::client::{Transport, UpstreamClient};
use std::sync::Arc;

// Shared, process-wide gateway services. Everything here is read-only after
// construction or internally synchronized, so clones are cheap and safe to
// hand to concurrent requests.
pub struct GatewayState<T: Transport = UpstreamClient> {
    pub registry: Arc<ServerRegistry>,
    pub defaults: Arc<DefaultParams>,
    pub transport: Arc<T>,
    pub tracker: Arc<dyn SuccessTracker>,
    pub gate: Arc<dyn RateLimitGate>,
}

impl<T: Transport> Clone for GatewayState<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            defaults: self.defaults.clone(),
            transport: self.transport.clone(),
            tracker: self.tracker.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl GatewayState<UpstreamClient> {
    pub fn from_config(
        registry: ServerRegistry,
        gateway: &GatewayConfig,
        rate_limit: &RateLimitConfig,
    ) -> Result<Self, reqwest::Error> {
        let transport = UpstreamClient::new(gateway)?;
        Ok(Self::new(
            registry,
            gateway.default_params.clone(),
            transport,
            Arc::new(InMemorySuccessTracker::new()),
            Arc::new(FixedWindowGate::new(rate_limit)),
        ))
    }
}

impl<T: Transport> GatewayState<T> {
    pub fn new(
        registry: ServerRegistry,
        defaults: DefaultParams,
        transport: T,
        tracker: Arc<dyn SuccessTracker>,
        gate: Arc<dyn RateLimitGate>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            defaults: Arc::new(defaults),
            transport: Arc::new(transport),
            tracker,
            gate,
        }
    }

    pub fn admit(&self, client_key: &str) -> bool {
        self.gate.check(client_key)
    }

    // Bundle for a server id; `None` when no such server is configured.
    pub fn bundle_for(&self, server_id: &str) -> Option<DispatchBundle<'_, T>> {
        let server = self.registry.resolve(server_id)?;
        Some(DispatchBundle::new(
            server,
            &self.defaults,
            &self.transport,
            self.tracker.as_ref(),
        ))
    }

    pub fn bundle_for_host(&self, host: &str) -> Option<DispatchBundle<'_, T>> {
        let server = self.registry.resolve_host(host)?;
        Some(DispatchBundle::new(
            server,
            &self.defaults,
            &self.transport,
            self.tracker.as_ref(),
        ))
    }
}
