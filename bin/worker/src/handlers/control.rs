//! The `control` topic: relay an actuator envelope and mark its sensor done.

use super::complete;
use async_trait::async_trait;
use greenhouse_actuation::{CommandPublisher, ControlMsg};
use greenhouse_core::CropState;
use greenhouse_engine::{HandlerError, TaskContext, TaskHandler, Variable};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Topic carrying control envelopes.
pub const CONTROL_TOPIC: &str = "control";

/// Variable holding the raw control envelope.
pub const ACTION_VARIABLE: &str = "action";

/// Relays a control envelope to the actuators verbatim.
pub struct ControlHandler {
    publisher: Arc<dyn CommandPublisher>,
    subject: String,
    state: CropState,
}

impl ControlHandler {
    #[must_use]
    pub fn new(publisher: Arc<dyn CommandPublisher>, subject: String, state: CropState) -> Self {
        Self {
            publisher,
            subject,
            state,
        }
    }
}

#[async_trait]
impl TaskHandler for ControlHandler {
    async fn handle(&self, ctx: TaskContext) -> Result<(), HandlerError> {
        let task_id = &ctx.task().id;
        let raw = ctx
            .variable(ACTION_VARIABLE)
            .map(Variable::value_text)
            .ok_or_else(|| HandlerError::invalid_input("missing 'action' variable"))?;

        let msg = ControlMsg::decode(&raw).map_err(|e| {
            warn!(%task_id, raw = %raw, error = %e, "malformed control message");
            HandlerError::invalid_input(format!("malformed control message: {e}"))
        })?;
        if msg.sensor.trim().is_empty() {
            return Err(HandlerError::invalid_input("control message names no sensor"));
        }
        debug!(%task_id, sensor = %msg.sensor, commands = ?msg.commands, "control message");

        self.publisher
            .publish(&self.subject, &raw)
            .await
            .map_err(|e| {
                error!(%task_id, subject = %self.subject, error = %e, "control publish failed");
                HandlerError::external("nats", e.current_context())
            })?;

        for (actuator, on) in msg.requested_states() {
            self.state.set_actuator(actuator, on);
        }

        let mut variables = ctx.variables();
        variables.insert(
            msg.sensor.clone(),
            Variable::string(format!("{} completed", msg.sensor)),
        );
        complete(&ctx, variables).await
    }
}
