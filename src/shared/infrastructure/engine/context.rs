// RouteContext owns routes, lifecycle hooks and every diagnostics facility.
//
// Lifecycle
// - Stopped -> Starting: before_application_start hooks run, a failing hook aborts the start.
// - Starting -> Started: one tokio task per timer consumer plus the load sampler.
// - Started -> Stopping -> Stopped: consumers observe the shutdown watch and are awaited.
//
// Processing
// - Steps of one exchange run sequentially inside the consumer task of its route.
// - Failures are logged and counted; there is no redelivery.

use crate::shared::infrastructure::engine::EngineError;
use crate::shared::infrastructure::engine::backlog::BacklogTracer;
use crate::shared::infrastructure::engine::diagnostics::{
    DiagnosticsSettings, ExchangeFactory, ExchangeFactoryStatistics, ManagementAgent,
    RuntimeEndpointRegistry,
};
use crate::shared::infrastructure::engine::endpoint::{Endpoint, TimerEndpoint};
use crate::shared::infrastructure::engine::exchange::Exchange;
use crate::shared::infrastructure::engine::inflight::InflightRepository;
use crate::shared::infrastructure::engine::lifecycle::ContextConfiguration;
use crate::shared::infrastructure::engine::processor::Processor;
use crate::shared::infrastructure::engine::route::{RouteBuilder, RouteDefinition};
use crate::shared::infrastructure::engine::statistics::{StatisticsRegistry, StatisticsSnapshot};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

pub const TIMER_NAME_HEADER: &str = "CamelTimerName";
pub const TIMER_COUNTER_HEADER: &str = "CamelTimerCounter";
pub const TIMER_FIRED_TIME_HEADER: &str = "CamelTimerFiredTime";

const LOAD_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextStatus {
    Stopped,
    Starting,
    Started,
    Stopping,
}

impl ContextStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextStatus::Stopped => "Stopped",
            ContextStatus::Starting => "Starting",
            ContextStatus::Started => "Started",
            ContextStatus::Stopping => "Stopping",
        }
    }
}

#[derive(Debug)]
pub struct Route {
    pub route_id: String,
    pub consumer: TimerEndpoint,
    pub processors: Vec<Processor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub route_id: String,
    pub from: String,
    pub node_ids: Vec<String>,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextStatistics {
    #[serde(flatten)]
    pub runtime: StatisticsSnapshot,
    pub factories: Vec<ExchangeFactoryStatistics>,
    pub inflight: usize,
}

pub struct RouteContext {
    name: String,
    status: Mutex<ContextStatus>,
    routes: RwLock<Vec<Arc<Route>>>,
    configurations: RwLock<Vec<Arc<dyn ContextConfiguration>>>,
    node_counters: Mutex<HashMap<&'static str, usize>>,
    exchange_factory_manager: ExchangeFactory,
    exchange_factory: ExchangeFactory,
    processor_exchange_factory: ExchangeFactory,
    management_agent: ManagementAgent,
    inflight: InflightRepository,
    backlog: BacklogTracer,
    runtime_endpoint_registry: RuntimeEndpointRegistry,
    statistics: StatisticsRegistry,
    shutdown: watch::Sender<bool>,
    consumers: Mutex<Vec<JoinHandle<()>>>,
}

impl RouteContext {
    pub fn new(name: impl Into<String>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            name: name.into(),
            status: Mutex::new(ContextStatus::Stopped),
            routes: RwLock::new(Vec::new()),
            configurations: RwLock::new(Vec::new()),
            node_counters: Mutex::new(HashMap::new()),
            exchange_factory_manager: ExchangeFactory::new("exchangeFactoryManager"),
            exchange_factory: ExchangeFactory::new("exchangeFactory"),
            processor_exchange_factory: ExchangeFactory::new("processorExchangeFactory"),
            management_agent: ManagementAgent::new(),
            inflight: InflightRepository::new(),
            backlog: BacklogTracer::default(),
            runtime_endpoint_registry: RuntimeEndpointRegistry::default(),
            statistics: StatisticsRegistry::new(),
            shutdown,
            consumers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_backlog_size(mut self, size: usize) -> Self {
        self.backlog = BacklogTracer::new(size);
        self
    }

    pub fn with_diagnostics(self, settings: &DiagnosticsSettings) -> Self {
        self.apply_diagnostics(settings);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn status(&self) -> ContextStatus {
        *self.status.lock().await
    }

    pub fn exchange_factory_manager(&self) -> &ExchangeFactory {
        &self.exchange_factory_manager
    }

    pub fn exchange_factory(&self) -> &ExchangeFactory {
        &self.exchange_factory
    }

    pub fn processor_exchange_factory(&self) -> &ExchangeFactory {
        &self.processor_exchange_factory
    }

    pub fn management_agent(&self) -> &ManagementAgent {
        &self.management_agent
    }

    pub fn inflight_repository(&self) -> &InflightRepository {
        &self.inflight
    }

    pub fn backlog_tracer(&self) -> &BacklogTracer {
        &self.backlog
    }

    pub fn runtime_endpoint_registry(&self) -> &RuntimeEndpointRegistry {
        &self.runtime_endpoint_registry
    }

    pub fn statistics(&self) -> &StatisticsRegistry {
        &self.statistics
    }

    pub fn set_backlog_tracing(&self, enabled: bool) {
        self.backlog.set_enabled(enabled);
    }

    pub fn is_backlog_tracing(&self) -> bool {
        self.backlog.is_enabled()
    }

    pub fn diagnostics_settings(&self) -> DiagnosticsSettings {
        DiagnosticsSettings {
            exchange_factory_manager_statistics_enabled: self
                .exchange_factory_manager
                .is_statistics_enabled(),
            exchange_factory_statistics_enabled: self.exchange_factory.is_statistics_enabled(),
            processor_exchange_factory_statistics_enabled: self
                .processor_exchange_factory
                .is_statistics_enabled(),
            load_statistics_enabled: self.management_agent.is_load_statistics_enabled(),
            endpoint_runtime_statistics_enabled: self
                .management_agent
                .is_endpoint_runtime_statistics_enabled(),
            statistics_level: self.management_agent.statistics_level(),
            inflight_browse_enabled: self.inflight.is_inflight_browse_enabled(),
            backlog_tracing: self.is_backlog_tracing(),
            runtime_endpoint_registry_enabled: self.runtime_endpoint_registry.is_enabled(),
        }
    }

    pub fn apply_diagnostics(&self, settings: &DiagnosticsSettings) {
        self.exchange_factory_manager
            .set_statistics_enabled(settings.exchange_factory_manager_statistics_enabled);
        self.exchange_factory
            .set_statistics_enabled(settings.exchange_factory_statistics_enabled);
        self.processor_exchange_factory
            .set_statistics_enabled(settings.processor_exchange_factory_statistics_enabled);
        self.management_agent
            .set_load_statistics_enabled(settings.load_statistics_enabled);
        self.management_agent
            .set_endpoint_runtime_statistics_enabled(settings.endpoint_runtime_statistics_enabled);
        self.management_agent
            .set_statistics_level(settings.statistics_level);
        self.inflight
            .set_inflight_browse_enabled(settings.inflight_browse_enabled);
        self.set_backlog_tracing(settings.backlog_tracing);
        self.runtime_endpoint_registry
            .set_enabled(settings.runtime_endpoint_registry_enabled);
    }

    pub async fn add_configuration(&self, configuration: Arc<dyn ContextConfiguration>) {
        self.configurations.write().await.push(configuration);
    }

    pub async fn add_routes(&self, builder: &dyn RouteBuilder) -> Result<Vec<String>, EngineError> {
        let mut route_ids = Vec::new();
        for definition in builder.configure() {
            route_ids.push(self.add_route(definition).await?);
        }
        Ok(route_ids)
    }

    pub async fn add_route(&self, definition: RouteDefinition) -> Result<String, EngineError> {
        let status = self.status().await;
        if status != ContextStatus::Stopped {
            return Err(EngineError::InvalidState {
                expected: ContextStatus::Stopped.as_str(),
                actual: status.as_str(),
            });
        }

        let consumer = match definition.from.parse::<Endpoint>()? {
            Endpoint::Timer(timer) => timer,
            Endpoint::Log(_) => return Err(EngineError::UnsupportedConsumer(definition.from)),
        };

        let mut processors = Vec::with_capacity(definition.steps.len());
        for step in &definition.steps {
            let node_id = self.next_node_id(step.kind()).await;
            processors.push(Processor::compile(step, node_id)?);
        }

        let mut routes = self.routes.write().await;
        let route_id = definition
            .route_id
            .unwrap_or_else(|| format!("route{}", routes.len() + 1));
        if routes.iter().any(|route| route.route_id == route_id) {
            return Err(EngineError::DuplicateRoute(route_id));
        }
        debug!(route_id = %route_id, from = %consumer.uri, "route added");
        routes.push(Arc::new(Route {
            route_id: route_id.clone(),
            consumer,
            processors,
        }));
        Ok(route_id)
    }

    async fn next_node_id(&self, kind: &'static str) -> String {
        let mut counters = self.node_counters.lock().await;
        let counter = counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{kind}{counter}")
    }

    pub async fn route(&self, route_id: &str) -> Option<Arc<Route>> {
        self.routes
            .read()
            .await
            .iter()
            .find(|route| route.route_id == route_id)
            .cloned()
    }

    pub async fn route_infos(&self) -> Vec<RouteInfo> {
        self.routes
            .read()
            .await
            .iter()
            .map(|route| RouteInfo {
                route_id: route.route_id.clone(),
                from: route.consumer.uri.clone(),
                node_ids: route
                    .processors
                    .iter()
                    .map(|processor| processor.node_id().to_string())
                    .collect(),
                to: route
                    .processors
                    .iter()
                    .filter_map(|processor| processor.producer_uri().map(str::to_string))
                    .collect(),
            })
            .collect()
    }

    pub async fn statistics_snapshot(&self) -> ContextStatistics {
        ContextStatistics {
            runtime: self.statistics.snapshot().await,
            factories: vec![
                self.exchange_factory_manager.statistics(),
                self.exchange_factory.statistics(),
                self.processor_exchange_factory.statistics(),
            ],
            inflight: self.inflight.size().await,
        }
    }

    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        self.transition(ContextStatus::Stopped, ContextStatus::Starting)
            .await?;
        info!(context = %self.name, "starting route context");

        let configurations = self.configurations.read().await.clone();
        for configuration in &configurations {
            if let Err(e) = configuration.before_application_start(self).await {
                error!(context = %self.name, error = %e, "before start hook failed");
                *self.status.lock().await = ContextStatus::Stopped;
                return Err(e);
            }
        }

        self.shutdown.send_replace(false);
        let routes = self.routes.read().await.clone();
        {
            let mut consumers = self.consumers.lock().await;
            consumers.push(tokio::spawn(run_load_sampler(
                Arc::clone(self),
                self.shutdown.subscribe(),
            )));
            for route in &routes {
                info!(route_id = %route.route_id, from = %route.consumer.uri, "route started");
                consumers.push(tokio::spawn(run_timer_consumer(
                    Arc::clone(self),
                    Arc::clone(route),
                    self.shutdown.subscribe(),
                )));
            }
        }
        *self.status.lock().await = ContextStatus::Started;

        for configuration in &configurations {
            if let Err(e) = configuration.after_application_start(self).await {
                error!(context = %self.name, error = %e, "after start hook failed");
                self.stop().await?;
                return Err(e);
            }
        }

        info!(context = %self.name, routes = routes.len(), "route context started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), EngineError> {
        self.transition(ContextStatus::Started, ContextStatus::Stopping)
            .await?;
        info!(context = %self.name, "stopping route context");
        self.shutdown.send_replace(true);

        let consumers = std::mem::take(&mut *self.consumers.lock().await);
        for consumer in consumers {
            if let Err(e) = consumer.await {
                warn!(context = %self.name, error = %e, "consumer task ended abnormally");
            }
        }

        *self.status.lock().await = ContextStatus::Stopped;
        info!(context = %self.name, "route context stopped");
        Ok(())
    }

    async fn transition(&self, from: ContextStatus, to: ContextStatus) -> Result<(), EngineError> {
        let mut status = self.status.lock().await;
        if *status != from {
            return Err(EngineError::InvalidState {
                expected: from.as_str(),
                actual: status.as_str(),
            });
        }
        *status = to;
        Ok(())
    }

    fn create_timer_exchange(&self, route: &Route, counter: u64) -> Exchange {
        let timer = &route.consumer;
        let mut exchange = Exchange::new(&route.route_id, &timer.uri);
        exchange
            .message
            .set_header(TIMER_NAME_HEADER, timer.name.clone());
        exchange.message.set_header(TIMER_COUNTER_HEADER, counter);
        exchange
            .message
            .set_header(TIMER_FIRED_TIME_HEADER, exchange.created_at.to_rfc3339());
        self.exchange_factory_manager.on_created();
        self.exchange_factory.on_created();
        exchange
    }

    /// Runs every step of `route` against `exchange` and returns the exchange as the last step left it.
    pub async fn process(&self, route: &Route, mut exchange: Exchange) -> Result<Exchange, EngineError> {
        let started = Instant::now();
        let level = self.management_agent.statistics_level();
        let endpoint_statistics = self.management_agent.is_endpoint_runtime_statistics_enabled();
        let exchange_id = exchange.exchange_id.clone();

        self.inflight.add(&exchange_id, &route.route_id).await;
        if level.collects_routes() {
            self.statistics.route_started(&route.route_id).await;
        }
        if endpoint_statistics {
            self.statistics.endpoint_in(&route.consumer.uri).await;
        }

        let mut outcome = Ok(());
        for processor in &route.processors {
            let node_id = processor.node_id();
            self.inflight.set_node(&exchange_id, node_id).await;
            let step_started = Instant::now();
            let result = processor.process(&mut exchange);
            if level.collects_processors() {
                self.statistics
                    .processor_done(node_id, step_started.elapsed(), result.is_err())
                    .await;
            }
            if let (true, Some(uri)) = (endpoint_statistics, processor.producer_uri()) {
                self.statistics.endpoint_out(uri).await;
            }
            self.backlog.trace(&route.route_id, node_id, &exchange).await;
            if let Err(e) = result {
                outcome = Err(e);
                break;
            }
        }

        self.inflight.remove(&exchange_id).await;
        if level.collects_routes() {
            self.statistics
                .route_done(&route.route_id, started.elapsed(), outcome.is_err())
                .await;
        }
        self.exchange_factory_manager.on_released();
        self.exchange_factory.on_released();
        outcome.map(|()| exchange)
    }
}

async fn run_timer_consumer(
    context: Arc<RouteContext>,
    route: Arc<Route>,
    mut shutdown: watch::Receiver<bool>,
) {
    let timer = &route.consumer;
    let mut ticker = interval_at(Instant::now() + timer.delay, timer.period);
    ticker.set_missed_tick_behavior(if timer.fixed_rate {
        MissedTickBehavior::Burst
    } else {
        MissedTickBehavior::Delay
    });

    let mut counter: u64 = 0;
    loop {
        tokio::select! {
            _ = shutdown.wait_for(|stop| *stop) => break,
            _ = ticker.tick() => {}
        }
        counter += 1;
        let exchange = context.create_timer_exchange(&route, counter);
        let exchange_id = exchange.exchange_id.clone();
        if let Err(e) = context.process(&route, exchange).await {
            error!(
                route_id = %route.route_id,
                exchange_id = %exchange_id,
                error = %e,
                "failed delivery, exhausted after 0 redelivery attempts"
            );
        }
        if timer.repeat_count > 0 && counter >= timer.repeat_count {
            debug!(route_id = %route.route_id, counter, "timer repeat count reached");
            break;
        }
    }
}

async fn run_load_sampler(context: Arc<RouteContext>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + LOAD_SAMPLE_PERIOD, LOAD_SAMPLE_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.wait_for(|stop| *stop) => break,
            _ = ticker.tick() => {}
        }
        if context.management_agent.is_load_statistics_enabled() {
            let inflight = context.inflight.size().await;
            context.statistics.sample_load(inflight).await;
        }
    }
}
