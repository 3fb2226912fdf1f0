//! Task handlers and their registration.
//!
//! - [`SensorQueryHandler`]: averages one sensor's trailing window
//! - [`ControlHandler`]: relays a control envelope to the actuators
//! - [`PumpHandler`]: switches the pump from a soil reading

mod control;
mod pump;
mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use control::{ACTION_VARIABLE, CONTROL_TOPIC, ControlHandler};
pub use pump::{PUMP_VARIABLE, PumpHandler, SOIL_VARIABLE};
pub use query::SensorQueryHandler;

use crate::config::PumpConfig;
use greenhouse_actuation::CommandPublisher;
use greenhouse_core::{CropState, SensorKind};
use greenhouse_engine::{HandlerError, Processor, TaskContext, VariableBag};
use greenhouse_telemetry::{QueryTemplate, SensorStore};
use std::sync::Arc;
use tracing::{error, info};

/// Long-lived collaborators shared by every handler.
#[derive(Clone)]
pub struct HandlerDeps {
    pub store: Arc<dyn SensorStore>,
    pub publisher: Arc<dyn CommandPublisher>,
    pub state: CropState,
    pub template: QueryTemplate,
    /// Subject actuator commands are published on.
    pub subject: String,
    pub pump: PumpConfig,
}

/// Registers every handler on the processor.
///
/// The pump topic is only registered when `pump.enabled` is set.
pub fn register_handlers(processor: &mut Processor, deps: &HandlerDeps) {
    for kind in SensorKind::ALL {
        let handler = SensorQueryHandler::new(
            kind,
            &deps.template,
            Arc::clone(&deps.store),
            deps.state.clone(),
        );
        processor.add_handler([kind.topic()], Arc::new(handler));
    }

    processor.add_handler(
        [CONTROL_TOPIC],
        Arc::new(ControlHandler::new(
            Arc::clone(&deps.publisher),
            deps.subject.clone(),
            deps.state.clone(),
        )),
    );

    if deps.pump.enabled {
        processor.add_handler(
            [deps.pump.topic.clone()],
            Arc::new(PumpHandler::new(
                Arc::clone(&deps.publisher),
                deps.subject.clone(),
                deps.pump.threshold,
                deps.state.clone(),
            )),
        );
    } else {
        info!(topic = %deps.pump.topic, "pump control disabled");
    }
}

/// Completes the task, logging and converting a rejection.
async fn complete(ctx: &TaskContext, variables: VariableBag) -> Result<(), HandlerError> {
    ctx.complete(variables).await.map_err(|e| {
        error!(task_id = %ctx.task().id, error = %e, "failed to complete task");
        HandlerError::CompletionFailed {
            task_id: ctx.task().id.clone(),
            message: e.current_context().to_string(),
        }
    })
}
