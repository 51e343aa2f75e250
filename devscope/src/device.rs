//! Builder and handle for one device operation.

use std::sync::Arc;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::class::Hierarchy;
use crate::communicator::Communicator;
use crate::context::OperationContext;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::transport::discovery::SnmpConnector;
use crate::transport::{
    CachingSnmp, DiscoveryOptions, HttpClient, HttpConfig, HttpTransport, SnmpClient, SnmpConfig,
    SnmpTransport, discover,
};

/// Builder for constructing a [`Device`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use devscope::class::HierarchyLoader;
/// use devscope::device::DeviceBuilder;
/// use devscope::transport::SnmpConfig;
///
/// # async fn example() -> Result<(), devscope::Error> {
/// let hierarchy = Arc::new(HierarchyLoader::new("classes").load()?);
/// let mut device = DeviceBuilder::new("192.168.1.1")
///     .snmp(SnmpConfig::new("192.168.1.1"))
///     .build(hierarchy)
///     .await?;
///
/// let communicator = device.identify().await?;
/// println!("{}", communicator.class_name());
/// println!("{:?}", communicator.get_identify_properties(device.context()).await?);
/// # Ok(())
/// # }
/// ```
pub struct DeviceBuilder {
    host: String,
    snmp: Option<SnmpConfig>,
    discovery: Option<DiscoveryOptions>,
    http: Option<HttpConfig>,
    snmp_transport: Option<Arc<dyn SnmpTransport>>,
    http_transport: Option<Arc<dyn HttpTransport>>,
    community_transports: Vec<(String, Arc<dyn SnmpTransport>)>,
    cancel: CancellationToken,
}

impl DeviceBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            snmp: None,
            discovery: None,
            http: None,
            snmp_transport: None,
            http_transport: None,
            community_transports: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Talk SNMP with this configuration. An empty host is filled in.
    pub fn snmp(mut self, config: SnmpConfig) -> Self {
        self.snmp = Some(config);
        self
    }

    /// Probe versions, communities and ports instead of trusting the
    /// SNMP configuration.
    pub fn discover(mut self, options: DiscoveryOptions) -> Self {
        self.discovery = Some(options);
        self
    }

    /// Enable HTTP probes with this configuration.
    pub fn http(mut self, config: HttpConfig) -> Self {
        self.http = Some(config);
        self
    }

    /// Use an already opened SNMP transport.
    pub fn snmp_transport(mut self, transport: Arc<dyn SnmpTransport>) -> Self {
        self.snmp_transport = Some(transport);
        self
    }

    /// Use an already opened HTTP transport.
    pub fn http_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.http_transport = Some(transport);
        self
    }

    /// Use an already opened transport for a community suffix.
    pub fn community_transport(
        mut self,
        suffix: impl Into<String>,
        transport: Arc<dyn SnmpTransport>,
    ) -> Self {
        self.community_transports.push((suffix.into(), transport));
        self
    }

    /// Cancel the device operation with this token.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Open the transports.
    ///
    /// SNMP is opened from an explicit transport, by discovery, or from the
    /// SNMP configuration, in that order of preference.
    pub async fn build(self, hierarchy: Arc<Hierarchy>) -> Result<Device> {
        let mut ctx = OperationContext::new().with_cancellation(self.cancel.clone());
        let mut snmp_config = self.snmp.map(|mut config| {
            if config.host.is_empty() {
                config.host = self.host.clone();
            }
            config
        });

        let snmp: Option<Arc<dyn SnmpTransport>> = if let Some(transport) = self.snmp_transport {
            Some(transport)
        } else if let Some(options) = &self.discovery {
            let base = snmp_config
                .clone()
                .unwrap_or_else(|| SnmpConfig::new(self.host.clone()));
            let (config, transport) =
                Box::pin(discover(&base, options, &SnmpConnector, &self.cancel)).await?;
            let transport = cached(&config, transport);
            snmp_config = Some(config);
            Some(transport)
        } else if let Some(config) = &snmp_config {
            let client =
                Box::pin(SnmpClient::connect(config.clone(), self.cancel.child_token())).await?;
            Some(cached(config, Arc::new(client)))
        } else {
            None
        };
        if let Some(snmp) = snmp {
            ctx = ctx.with_snmp(snmp);
        }

        let http: Option<Arc<dyn HttpTransport>> = match (self.http_transport, self.http) {
            (Some(transport), _) => Some(transport),
            (None, Some(mut config)) => {
                if config.host.is_empty() {
                    config.host = self.host.clone();
                }
                Some(Arc::new(HttpClient::new(config, self.cancel.clone())?))
            }
            (None, None) => None,
        };
        if let Some(http) = http {
            ctx = ctx.with_http(http);
        }

        for (suffix, transport) in self.community_transports {
            ctx = ctx.with_community_client(suffix, transport);
        }

        debug!(
            "device {} ready (snmp: {}, http: {})",
            self.host,
            ctx.has_snmp(),
            ctx.has_http()
        );
        Ok(Device {
            host: self.host,
            hierarchy,
            ctx,
            snmp_config,
            communicator: None,
        })
    }
}

fn cached(config: &SnmpConfig, transport: Arc<dyn SnmpTransport>) -> Arc<dyn SnmpTransport> {
    if config.cache {
        Arc::new(CachingSnmp::new(transport))
    } else {
        transport
    }
}

/// One device operation: transports, identity and the resolved class.
pub struct Device {
    host: String,
    hierarchy: Arc<Hierarchy>,
    ctx: OperationContext,
    snmp_config: Option<SnmpConfig>,
    communicator: Option<Arc<Communicator>>,
}

impl Device {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The operation context to pass to communicator getters.
    pub fn context(&self) -> &OperationContext {
        &self.ctx
    }

    pub fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.hierarchy
    }

    /// Resolve the device class, once per device.
    pub async fn identify(&mut self) -> Result<Arc<Communicator>> {
        if let Some(communicator) = &self.communicator {
            return Ok(communicator.clone());
        }

        let class = Resolver::new(&self.hierarchy).identify(&self.ctx).await?;
        let communicator = Communicator::new(&self.hierarchy, &class);
        self.open_community_clients(&communicator).await;
        self.communicator = Some(communicator.clone());
        Ok(communicator)
    }

    /// Check whether the device matches the class named `name`.
    pub async fn match_device_class(&self, name: &str) -> Result<bool> {
        Resolver::new(&self.hierarchy)
            .match_device_class(&self.ctx, name)
            .await
    }

    /// Open the additional SNMP clients the class's extensions ask for.
    async fn open_community_clients(&self, communicator: &Communicator) {
        let Some(config) = &self.snmp_config else {
            return;
        };

        let mut level = Some(communicator);
        while let Some(current) = level {
            let suffix = current
                .class()
                .extension()
                .and_then(|e| e.community_suffix().map(str::to_string));
            if let Some(suffix) = suffix {
                if !self.ctx.has_community_client(&suffix) {
                    let config = config.with_community_suffix(&suffix);
                    let cancel = self.ctx.cancellation_token().child_token();
                    match Box::pin(SnmpClient::connect(config, cancel)).await {
                        Ok(client) => self.ctx.add_community_client(suffix, Arc::new(client)),
                        Err(e) => warn!("{}: no SNMP client for community suffix: {e}", self.host),
                    }
                }
            }
            level = current.parent().map(Arc::as_ref);
        }
    }
}
