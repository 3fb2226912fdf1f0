//! Soil-driven irrigation: decide, publish and report through a oneshot.

use super::complete;
use async_trait::async_trait;
use greenhouse_actuation::{CommandPublisher, PumpCommand};
use greenhouse_core::{Actuator, CropState};
use greenhouse_engine::{HandlerError, TaskContext, TaskHandler, Variable};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Variable holding the soil reading the decision is based on.
pub const SOIL_VARIABLE: &str = "soil";

/// Variable the pump status is written to.
pub const PUMP_VARIABLE: &str = "pump";

/// Switches the irrigation pump from a soil reading.
#[derive(Clone)]
pub struct PumpHandler {
    publisher: Arc<dyn CommandPublisher>,
    subject: String,
    threshold: f64,
    state: CropState,
}

impl PumpHandler {
    #[must_use]
    pub fn new(
        publisher: Arc<dyn CommandPublisher>,
        subject: String,
        threshold: f64,
        state: CropState,
    ) -> Self {
        Self {
            publisher,
            subject,
            threshold,
            state,
        }
    }

    /// Runs the pump decision for a task and reports the outcome on `outcome`.
    pub async fn run_reporting(
        self,
        ctx: TaskContext,
        outcome: oneshot::Sender<Result<PumpCommand, HandlerError>>,
    ) {
        let result = self.control_pump(&ctx).await;
        if outcome.send(result).is_err() {
            warn!(task_id = %ctx.task().id, "pump outcome receiver dropped");
        }
    }

    async fn control_pump(&self, ctx: &TaskContext) -> Result<PumpCommand, HandlerError> {
        let task_id = &ctx.task().id;
        let soil = ctx
            .variable(SOIL_VARIABLE)
            .ok_or_else(|| HandlerError::invalid_input("missing 'soil' variable"))?;
        let reading = soil
            .as_f64()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                HandlerError::invalid_input(format!(
                    "soil reading '{}' is not a number",
                    soil.value_text()
                ))
            })?;

        let command = PumpCommand::for_soil(reading, self.threshold);
        info!(%task_id, soil = reading, threshold = self.threshold, command = command.payload(), "pump decision");

        self.publisher
            .publish(&self.subject, command.payload())
            .await
            .map_err(|e| {
                error!(%task_id, subject = %self.subject, error = %e, "pump publish failed");
                HandlerError::external("nats", e.current_context())
            })?;
        self.state.set_actuator(Actuator::Pump, command.is_on());

        let mut variables = ctx.variables();
        variables.insert(
            PUMP_VARIABLE.to_string(),
            Variable::string(command.status_message()),
        );
        complete(ctx, variables).await?;
        Ok(command)
    }
}

#[async_trait]
impl TaskHandler for PumpHandler {
    async fn handle(&self, ctx: TaskContext) -> Result<(), HandlerError> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(self.clone().run_reporting(ctx, tx));
        rx.await.unwrap_or(Err(HandlerError::Aborted)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{RecordingEngine, RecordingPublisher, context};
    use greenhouse_actuation::command::DEFAULT_PUMP_THRESHOLD;
    use greenhouse_engine::LockedTask;

    fn handler(publisher: &Arc<RecordingPublisher>, state: &CropState) -> PumpHandler {
        PumpHandler::new(
            publisher.clone(),
            "greenhouse".to_string(),
            DEFAULT_PUMP_THRESHOLD,
            state.clone(),
        )
    }

    fn soil_task(soil: Variable) -> LockedTask {
        LockedTask::new("t-1", "controlPump").with_variable(SOIL_VARIABLE, soil)
    }

    async fn run(
        handler: PumpHandler,
        task: LockedTask,
        engine: &Arc<RecordingEngine>,
    ) -> Result<PumpCommand, HandlerError> {
        let (tx, rx) = oneshot::channel();
        handler.run_reporting(context(task, engine), tx).await;
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn threshold_reading_turns_pump_on() {
        let engine = Arc::new(RecordingEngine::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let state = CropState::default();

        let command = run(
            handler(&publisher, &state),
            soil_task(Variable::double(1500.0)),
            &engine,
        )
        .await
        .unwrap();

        assert_eq!(command, PumpCommand::On);
        assert_eq!(
            publisher.messages(),
            vec![("greenhouse".to_string(), "pump-on".to_string())]
        );
        let (_, request) = &engine.completions()[0];
        assert_eq!(request.variables[PUMP_VARIABLE], Variable::string("pump on complete"));
        assert!(state.snapshot().pump_on);
    }

    #[tokio::test]
    async fn reading_above_threshold_turns_pump_off() {
        let engine = Arc::new(RecordingEngine::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let state = CropState::default();
        state.set_actuator(Actuator::Pump, true);

        let command = run(
            handler(&publisher, &state),
            soil_task(Variable::double(1500.01)),
            &engine,
        )
        .await
        .unwrap();

        assert_eq!(command, PumpCommand::Off);
        assert_eq!(publisher.messages()[0].1, "pump-off");
        let (_, request) = &engine.completions()[0];
        assert_eq!(request.variables[PUMP_VARIABLE], Variable::string("pump off complete"));
        assert!(!state.snapshot().pump_on);
    }

    #[tokio::test]
    async fn string_readings_are_parsed() {
        let engine = Arc::new(RecordingEngine::default());
        let publisher = Arc::new(RecordingPublisher::default());

        let command = run(
            handler(&publisher, &CropState::default()),
            soil_task(Variable::string("900")),
            &engine,
        )
        .await
        .unwrap();

        assert_eq!(command, PumpCommand::On);
    }

    #[tokio::test]
    async fn non_numeric_reading_publishes_nothing() {
        let engine = Arc::new(RecordingEngine::default());
        let publisher = Arc::new(RecordingPublisher::default());

        let err = run(
            handler(&publisher, &CropState::default()),
            soil_task(Variable::string("damp")),
            &engine,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, HandlerError::InvalidInput { .. }));
        assert!(publisher.messages().is_empty());
        assert!(engine.completions().is_empty());
    }

    #[tokio::test]
    async fn handle_reports_through_the_dispatcher_contract() {
        let engine = Arc::new(RecordingEngine::default());
        let publisher = Arc::new(RecordingPublisher::failing());

        let err = handler(&publisher, &CropState::default())
            .handle(context(soil_task(Variable::double(100.0)), &engine))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::ExternalService { ref message, .. } if !message.contains('\n')));
        assert!(engine.completions().is_empty());
    }
}
