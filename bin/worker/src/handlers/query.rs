//! Sensor check topics: average a trailing window and write it to the task.

use super::complete;
use async_trait::async_trait;
use greenhouse_core::{CropState, SensorKind};
use greenhouse_engine::{HandlerError, TaskContext, TaskHandler, Variable};
use greenhouse_telemetry::{FluxQuery, QueryTemplate, SensorStore, average_samples};
use std::sync::Arc;
use tracing::{error, info};

/// Averages one sensor's trailing window and writes it back to the task.
pub struct SensorQueryHandler {
    kind: SensorKind,
    query: FluxQuery,
    store: Arc<dyn SensorStore>,
    state: CropState,
}

impl SensorQueryHandler {
    #[must_use]
    pub fn new(
        kind: SensorKind,
        template: &QueryTemplate,
        store: Arc<dyn SensorStore>,
        state: CropState,
    ) -> Self {
        Self {
            kind,
            query: template.for_sensor(kind),
            store,
            state,
        }
    }
}

#[async_trait]
impl TaskHandler for SensorQueryHandler {
    async fn handle(&self, ctx: TaskContext) -> Result<(), HandlerError> {
        let task_id = &ctx.task().id;

        let raw = self.store.raw_values(&self.query).await.map_err(|e| {
            error!(sensor = %self.kind, %task_id, error = %e, "sensor query failed");
            HandlerError::external("influxdb", e.current_context())
        })?;

        let average = average_samples(&raw);
        info!(
            sensor = %self.kind,
            %task_id,
            average = average.value,
            samples = average.used,
            skipped = average.skipped,
            "averaged sensor readings"
        );

        // The snapshot tracks the reading even if completion fails below.
        self.state.record_reading(self.kind, average.value);

        let mut variables = ctx.variables();
        variables.insert(
            self.kind.variable_name().to_string(),
            Variable::double(average.value),
        );
        complete(&ctx, variables).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{FakeStore, RecordingEngine, context};
    use greenhouse_engine::LockedTask;

    fn handler(kind: SensorKind, store: Arc<FakeStore>, state: &CropState) -> SensorQueryHandler {
        SensorQueryHandler::new(kind, &QueryTemplate::default(), store, state.clone())
    }

    #[tokio::test]
    async fn writes_average_and_completes() {
        let engine = Arc::new(RecordingEngine::default());
        let store = Arc::new(FakeStore::with_values(["400", "420", "not-a-number"]));
        let state = CropState::default();

        let ctx = context(LockedTask::new("t-1", "checkCO2"), &engine);
        handler(SensorKind::Co2, store.clone(), &state)
            .handle(ctx)
            .await
            .unwrap();

        let completions = engine.completions();
        assert_eq!(completions.len(), 1);
        let (task_id, request) = &completions[0];
        assert_eq!(task_id, "t-1");
        assert_eq!(request.variables["co2"], Variable::double(410.0));
        assert_eq!(state.snapshot().co2, 410.0);

        let queries = store.queries.lock().unwrap();
        assert_eq!(queries[0].field, "co2");
    }

    #[tokio::test]
    async fn empty_window_writes_zero() {
        let engine = Arc::new(RecordingEngine::default());
        let store = Arc::new(FakeStore::with_values(Vec::<String>::new()));
        let state = CropState::default();

        let ctx = context(LockedTask::new("t-2", "checkHumidity"), &engine);
        handler(SensorKind::Humidity, store, &state)
            .handle(ctx)
            .await
            .unwrap();

        let (_, request) = &engine.completions()[0];
        let humidity = request.variables["humidity"].as_f64().unwrap();
        assert_eq!(humidity, 0.0);
        assert!(!humidity.is_nan());
    }

    #[tokio::test]
    async fn temperature_is_written_to_temp() {
        let engine = Arc::new(RecordingEngine::default());
        let store = Arc::new(FakeStore::with_values(["21.0", "23.0"]));
        let state = CropState::default();

        let task = LockedTask::new("t-3", "checkTemp").with_variable("house", Variable::string("north"));
        handler(SensorKind::Temperature, store, &state)
            .handle(context(task, &engine))
            .await
            .unwrap();

        let (_, request) = &engine.completions()[0];
        assert_eq!(request.variables["temp"], Variable::double(22.0));
        assert_eq!(request.variables["house"].value_text(), "north");
        assert_eq!(state.snapshot().temperature, 22.0);
    }

    #[tokio::test]
    async fn query_failure_propagates_without_completing() {
        let engine = Arc::new(RecordingEngine::default());
        let state = CropState::default();

        let ctx = context(LockedTask::new("t-4", "checkSoil"), &engine);
        let err = handler(SensorKind::Soil, Arc::new(FakeStore::failing()), &state)
            .handle(ctx)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            HandlerError::ExternalService {
                service: "influxdb".to_string(),
                message: "sensor query failed: bucket not found".to_string(),
            }
        );
        assert!(engine.completions().is_empty());
        assert!(state.snapshot().updated_at.is_none());
    }

    #[tokio::test]
    async fn completion_failure_propagates_but_snapshot_is_updated() {
        let engine = Arc::new(RecordingEngine::rejecting());
        let store = Arc::new(FakeStore::with_values(["800", "1000"]));
        let state = CropState::default();

        let ctx = context(LockedTask::new("t-5", "checkCO2"), &engine);
        let err = handler(SensorKind::Co2, store, &state)
            .handle(ctx)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            HandlerError::CompletionFailed {
                task_id: "t-5".to_string(),
                message: "engine returned status 404: task is not locked".to_string(),
            }
        );
        assert_eq!(state.snapshot().co2, 900.0);
    }
}
