//! Update router - Picks which commands handle an update and how

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::application::services::Finch;
use crate::domain::entities::Update;

/// How a command was invoked for an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    Run,
    Reply,
}

/// What happened to one update
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteReport {
    /// `(command, invocation)` in the order they ran
    pub invoked: Vec<(String, Invocation)>,
    /// Commands that returned an error
    pub failed: Vec<String>,
}

impl RouteReport {
    pub fn is_empty(&self) -> bool {
        self.invoked.is_empty()
    }
}

/// Routes updates through the registry of a [`Finch`]
#[derive(Clone)]
pub struct Router {
    finch: Arc<Finch>,
}

impl Router {
    pub fn new(finch: Arc<Finch>) -> Self {
        Self { finch }
    }

    pub fn finch(&self) -> &Arc<Finch> {
        &self.finch
    }

    /// Walk the registry in order. A command waiting for a reply gets
    /// `run_as_reply` whatever the text says; any other command gets `run`
    /// when `should_run` matches. Errors and panics are logged and never stop
    /// the walk.
    pub async fn route(&self, update: &Update) -> RouteReport {
        let mut report = RouteReport::default();

        let Some(message) = update.message.as_ref() else {
            tracing::trace!(update_id = update.id, "Update has no usable message, dropping");
            return report;
        };

        tracing::debug!(
            update_id = update.id,
            chat_id = message.chat_id,
            sender = %message.sender,
            "Routing update"
        );

        for entry in self.finch.commands().iter() {
            let state = entry.state();
            if !state.is_enabled() {
                continue;
            }

            let command = entry.command();
            let name = entry.name();
            let (invocation, outcome) = if state.waiting_for_reply() {
                let call = AssertUnwindSafe(command.run_as_reply(&self.finch, message));
                (Invocation::Reply, call.catch_unwind().await)
            } else {
                match std::panic::catch_unwind(AssertUnwindSafe(|| command.should_run(message))) {
                    Ok(true) => {
                        let call = AssertUnwindSafe(command.run(&self.finch, message));
                        (Invocation::Run, call.catch_unwind().await)
                    }
                    Ok(false) => continue,
                    Err(panic) => {
                        tracing::error!(
                            command = %name,
                            update_id = update.id,
                            "Command predicate panicked: {}",
                            panic_message(&*panic)
                        );
                        report.failed.push(name);
                        continue;
                    }
                }
            };

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(panic) => Some(format!("panicked: {}", panic_message(&*panic))),
            };
            if let Some(reason) = failure {
                tracing::error!(
                    command = %name,
                    update_id = update.id,
                    chat_id = message.chat_id,
                    invocation = ?invocation,
                    "Command failed: {}",
                    reason
                );
                report.failed.push(name.clone());
            }
            report.invoked.push((name, invocation));
        }

        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
