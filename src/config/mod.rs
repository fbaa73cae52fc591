//! Instrumentation configuration.
//!
//! A [`Config`] is built once, validated at build time, and immutable
//! afterwards except for the atomically updatable global attributes. Three
//! settings are mandatory: an ingest endpoint (explicit or derived from a
//! realm), an access token, and an application name. Everything else has a
//! sensible default.

pub mod attributes;
pub mod filter;

use std::sync::Arc;

use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::telemetry::{Attributes, SpanRecorder};

pub use attributes::GlobalAttributes;
pub use filter::SpanFilterBuilder;

/// Attribute key the deployment environment is published under.
pub const DEPLOYMENT_ENVIRONMENT_KEY: &str = "deployment.environment";

/// Validated, immutable instrumentation configuration.
pub struct Config {
    endpoint: String,
    access_token: String,
    application_name: String,
    debug_enabled: bool,
    crash_reporting_enabled: bool,
    network_monitor_enabled: bool,
    anr_detection_enabled: bool,
    global_attributes: Arc<GlobalAttributes>,
    span_filter: SpanFilterBuilder,
}

impl Config {
    /// Start building a config. All defaults are pre-populated.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The ingest endpoint spans are exported to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The access token used to authenticate against the ingest endpoint.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The name this application reports itself under.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn is_crash_reporting_enabled(&self) -> bool {
        self.crash_reporting_enabled
    }

    pub fn is_network_monitor_enabled(&self) -> bool {
        self.network_monitor_enabled
    }

    pub fn is_anr_detection_enabled(&self) -> bool {
        self.anr_detection_enabled
    }

    /// The attribute store merged into every span at creation.
    pub fn global_attributes(&self) -> &Arc<GlobalAttributes> {
        &self.global_attributes
    }

    /// Swap in updated global attributes. Future spans see the new snapshot;
    /// spans already created keep what they were seeded with.
    pub fn update_global_attributes(&self, mutator: impl FnOnce(&mut Attributes)) {
        self.global_attributes.update(mutator);
    }

    /// Wrap a recorder in the configured span-filter chain.
    pub fn decorate_recorder(&self, recorder: Arc<dyn SpanRecorder>) -> Arc<dyn SpanRecorder> {
        self.span_filter.decorate(recorder)
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder {
    endpoint: Option<String>,
    realm: Option<String>,
    access_token: Option<String>,
    application_name: Option<String>,
    debug_enabled: bool,
    crash_reporting_enabled: bool,
    network_monitor_enabled: bool,
    anr_detection_enabled: bool,
    deployment_environment: Option<String>,
    global_attributes: Attributes,
    span_filter: SpanFilterBuilder,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            realm: None,
            access_token: None,
            application_name: None,
            debug_enabled: false,
            crash_reporting_enabled: true,
            network_monitor_enabled: true,
            anr_detection_enabled: true,
            deployment_environment: None,
            global_attributes: Attributes::new(),
            span_filter: SpanFilterBuilder::new(),
        }
    }
}

impl ConfigBuilder {
    /// Set the full ingest endpoint URL.
    ///
    /// If a realm was set earlier, the explicit endpoint wins and the realm
    /// configuration is discarded with a warning.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        if self.realm.take().is_some() {
            warn!("explicitly setting the endpoint overrides the realm configuration");
        }
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Derive the ingest endpoint from a realm name.
    ///
    /// Ignored with a warning if an explicit endpoint was already set.
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        if self.endpoint.is_some() && self.realm.is_none() {
            warn!("endpoint has already been set; realm configuration will be ignored");
            return self;
        }
        let realm = realm.into();
        self.endpoint = Some(format!("https://ingest.{realm}.screentrace.io/v1/traces"));
        self.realm = Some(realm);
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Emit verbose diagnostics from the instrumentation itself. Off by
    /// default.
    pub fn debug_enabled(mut self, enable: bool) -> Self {
        self.debug_enabled = enable;
        self
    }

    /// Enable/disable the crash reporting feature. On by default.
    pub fn crash_reporting_enabled(mut self, enable: bool) -> Self {
        self.crash_reporting_enabled = enable;
        self
    }

    /// Enable/disable the network monitoring feature. On by default.
    pub fn network_monitor_enabled(mut self, enable: bool) -> Self {
        self.network_monitor_enabled = enable;
        self
    }

    /// Enable/disable main-thread stall detection. On by default.
    pub fn anr_detection_enabled(mut self, enable: bool) -> Self {
        self.anr_detection_enabled = enable;
        self
    }

    /// Deployment environment, published on every span under
    /// [`DEPLOYMENT_ENVIRONMENT_KEY`].
    pub fn deployment_environment(mut self, environment: impl Into<String>) -> Self {
        self.deployment_environment = Some(environment.into());
        self
    }

    /// Seed the global attributes applied to every span.
    pub fn global_attributes(mut self, attributes: Attributes) -> Self {
        self.global_attributes = attributes;
        self
    }

    /// Configure span filtering on the export path.
    pub fn filter_spans(mut self, configurer: impl FnOnce(&mut SpanFilterBuilder)) -> Self {
        configurer(&mut self.span_filter);
        self
    }

    /// Validate and build. Missing any mandatory field is a fatal error.
    pub fn build(self) -> Result<Config> {
        let access_token = self.access_token.ok_or(ConfigError::MissingAccessToken)?;
        let endpoint = self.endpoint.ok_or(ConfigError::MissingEndpoint)?;
        let application_name = self
            .application_name
            .ok_or(ConfigError::MissingApplicationName)?;

        let mut global_attributes = self.global_attributes;
        if let Some(environment) = self.deployment_environment {
            global_attributes.set(DEPLOYMENT_ENVIRONMENT_KEY, environment);
        }

        Ok(Config {
            endpoint,
            access_token,
            application_name,
            debug_enabled: self.debug_enabled,
            crash_reporting_enabled: self.crash_reporting_enabled,
            network_monitor_enabled: self.network_monitor_enabled,
            anr_detection_enabled: self.anr_detection_enabled,
            global_attributes: Arc::new(GlobalAttributes::new(global_attributes)),
            span_filter: self.span_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_builder() -> ConfigBuilder {
        Config::builder()
            .realm("us1")
            .access_token("token-abc")
            .application_name("demo-app")
    }

    #[test]
    fn build_requires_access_token() {
        let result = Config::builder()
            .realm("us1")
            .application_name("demo-app")
            .build();
        assert!(matches!(result, Err(ConfigError::MissingAccessToken)));
    }

    #[test]
    fn build_requires_endpoint_or_realm() {
        let result = Config::builder()
            .access_token("token-abc")
            .application_name("demo-app")
            .build();
        assert!(matches!(result, Err(ConfigError::MissingEndpoint)));
    }

    #[test]
    fn build_requires_application_name() {
        let result = Config::builder()
            .realm("us1")
            .access_token("token-abc")
            .build();
        assert!(matches!(result, Err(ConfigError::MissingApplicationName)));
    }

    #[test]
    fn realm_derives_the_ingest_endpoint() {
        let config = minimal_builder().build().unwrap();
        assert_eq!(config.endpoint(), "https://ingest.us1.screentrace.io/v1/traces");
    }

    #[test]
    fn explicit_endpoint_overrides_earlier_realm() {
        let config = Config::builder()
            .realm("us1")
            .endpoint("https://collector.internal:4318/v1/traces")
            .access_token("token-abc")
            .application_name("demo-app")
            .build()
            .unwrap();
        assert_eq!(config.endpoint(), "https://collector.internal:4318/v1/traces");
    }

    #[test]
    fn realm_after_explicit_endpoint_is_ignored() {
        let config = Config::builder()
            .endpoint("https://collector.internal:4318/v1/traces")
            .realm("us1")
            .access_token("token-abc")
            .application_name("demo-app")
            .build()
            .unwrap();
        assert_eq!(config.endpoint(), "https://collector.internal:4318/v1/traces");
    }

    #[test]
    fn defaults_match_the_documented_flags() {
        let config = minimal_builder().build().unwrap();
        assert!(!config.is_debug_enabled());
        assert!(config.is_crash_reporting_enabled());
        assert!(config.is_network_monitor_enabled());
        assert!(config.is_anr_detection_enabled());
    }

    #[test]
    fn deployment_environment_lands_in_global_attributes() {
        let config = minimal_builder()
            .deployment_environment("staging")
            .build()
            .unwrap();

        let snapshot = config.global_attributes().current();
        assert_eq!(snapshot.get_str(DEPLOYMENT_ENVIRONMENT_KEY), Some("staging"));
    }

    #[test]
    fn seeded_global_attributes_survive_build() {
        let config = minimal_builder()
            .global_attributes(Attributes::new().with("tenant", "acme"))
            .deployment_environment("prod")
            .build()
            .unwrap();

        let snapshot = config.global_attributes().current();
        assert_eq!(snapshot.get_str("tenant"), Some("acme"));
        assert_eq!(snapshot.get_str(DEPLOYMENT_ENVIRONMENT_KEY), Some("prod"));
    }

    #[test]
    fn update_global_attributes_publishes_for_future_reads() {
        let config = minimal_builder().build().unwrap();
        config.update_global_attributes(|attrs| attrs.set("session", "s-1"));
        assert_eq!(
            config.global_attributes().current().get_str("session"),
            Some("s-1")
        );
    }
}
