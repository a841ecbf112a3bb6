//! Scripted gateways shared by the application tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aingine_core::config::ClientConfig;
use aingine_core::gateway::{
    Gateway, GatewayError, GenerateRequest, GenerateResult, HealthReport, LoadModelRequest,
    LoadResult, ResponseSource,
};
use aingine_core::model::{ModelCatalog, ModelConfig};
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

pub fn model(id: &str, name: &str) -> ModelConfig {
    ModelConfig {
        id: id.to_string(),
        name: name.to_string(),
        path: format!("/models/{id}"),
        description: String::new(),
        vram_estimate: "~1 GB".to_string(),
        quantization: Some("awq".to_string()),
    }
}

/// Two-model catalog: `a` ("Model A") and `b` ("Model B").
pub fn catalog() -> ModelCatalog {
    ModelCatalog::from_models(vec![model("a", "Model A"), model("b", "Model B")])
}

pub fn config() -> ClientConfig {
    ClientConfig::default()
}

pub fn online(current_model: Option<&str>) -> HealthReport {
    HealthReport::from_wire("ok", current_model.map(str::to_string), false)
}

pub fn locked(current_model: Option<&str>) -> HealthReport {
    HealthReport::from_wire("ok", current_model.map(str::to_string), true)
}

pub fn reply(text: &str, source: ResponseSource) -> GenerateResult {
    GenerateResult {
        response: text.to_string(),
        model_used: "a".to_string(),
        source,
    }
}

/// Holds a load or generate call open until the test releases it.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// Gateway with scripted answers and call recording.
pub struct MockGateway {
    health: Mutex<HealthReport>,
    health_delay: Mutex<Option<Duration>>,
    loads: Mutex<VecDeque<Result<LoadResult, GatewayError>>>,
    generations: Mutex<VecDeque<Result<GenerateResult, GatewayError>>>,
    call_delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Gate>>>,
    load_requests: Mutex<Vec<LoadModelRequest>>,
    generate_requests: Mutex<Vec<GenerateRequest>>,
    health_calls: AtomicUsize,
    probes_in_flight: AtomicUsize,
    max_probes_in_flight: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            health: Mutex::new(HealthReport::offline()),
            health_delay: Mutex::new(None),
            loads: Mutex::new(VecDeque::new()),
            generations: Mutex::new(VecDeque::new()),
            call_delay: Mutex::new(None),
            gate: Mutex::new(None),
            load_requests: Mutex::new(Vec::new()),
            generate_requests: Mutex::new(Vec::new()),
            health_calls: AtomicUsize::new(0),
            probes_in_flight: AtomicUsize::new(0),
            max_probes_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn set_health(&self, report: HealthReport) {
        *self.health.lock().unwrap() = report;
    }

    pub fn set_health_delay(&self, delay: Duration) {
        *self.health_delay.lock().unwrap() = Some(delay);
    }

    /// Delays every load and generate call.
    pub fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.lock().unwrap() = Some(delay);
    }

    pub fn push_load(&self, result: Result<LoadResult, GatewayError>) {
        self.loads.lock().unwrap().push_back(result);
    }

    pub fn push_generate(&self, result: Result<GenerateResult, GatewayError>) {
        self.generations.lock().unwrap().push_back(result);
    }

    pub fn install_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn remove_gate(&self) {
        *self.gate.lock().unwrap() = None;
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn max_probes_in_flight(&self) -> usize {
        self.max_probes_in_flight.load(Ordering::SeqCst)
    }

    pub fn load_requests(&self) -> Vec<LoadModelRequest> {
        self.load_requests.lock().unwrap().clone()
    }

    pub fn generate_requests(&self) -> Vec<GenerateRequest> {
        self.generate_requests.lock().unwrap().clone()
    }

    async fn hold(&self) {
        let delay = *self.call_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn check_health(&self) -> HealthReport {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.probes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_probes_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.health_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.probes_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.health.lock().unwrap().clone()
    }

    async fn load_model(&self, request: &LoadModelRequest) -> Result<LoadResult, GatewayError> {
        self.load_requests.lock().unwrap().push(request.clone());
        self.hold().await;
        self.loads.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(LoadResult {
                payload: json!({ "status": "success" }),
            })
        })
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResult, GatewayError> {
        self.generate_requests.lock().unwrap().push(request.clone());
        self.hold().await;
        self.generations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(reply("ok", ResponseSource::Gpu)))
    }
}

/// One gateway host shared by several sessions: a load changes what every
/// later health probe reports.
pub struct FakeGatewayServer {
    current_model: Mutex<Option<String>>,
}

impl FakeGatewayServer {
    pub fn new(current_model: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            current_model: Mutex::new(current_model.map(str::to_string)),
        })
    }
}

#[async_trait]
impl Gateway for FakeGatewayServer {
    async fn check_health(&self) -> HealthReport {
        online(self.current_model.lock().unwrap().as_deref())
    }

    async fn load_model(&self, request: &LoadModelRequest) -> Result<LoadResult, GatewayError> {
        *self.current_model.lock().unwrap() = Some(request.model_id.clone());
        Ok(LoadResult {
            payload: json!({ "status": "success" }),
        })
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResult, GatewayError> {
        Ok(reply(&request.prompt, ResponseSource::Gpu))
    }
}
