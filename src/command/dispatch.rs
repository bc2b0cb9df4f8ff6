use crate::command::context::{Invocation, RootContext};
use crate::command::error::CommandError;
use crate::command::registry::Registry;
use crate::command::{Command, Params};
use crate::result::{HierarchicalResult, LogSink, TraceConfig};
use std::sync::Arc;
use uuid::Uuid;

type SequenceSource = Box<dyn Fn() -> String + Send + Sync>;

/// Fresh correlation id: 32 lowercase hex characters.
pub fn new_sequence() -> String {
    Uuid::new_v4().simple().to_string()
}

/// What a task-runner invocation produced.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed(HierarchicalResult),
    Help(String),
}

/// Creates root results and runs command trees against a fixed registry.
pub struct Dispatcher {
    registry: Registry,
    config: TraceConfig,
    sink: Option<Arc<dyn LogSink>>,
    sequence_source: SequenceSource,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            config: TraceConfig::default(),
            sink: None,
            sequence_source: Box::new(new_sequence),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sequence_source(mut self, source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.sequence_source = Box::new(source);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// An empty result, traced when a sink is configured.
    pub fn create_result(&self) -> HierarchicalResult {
        let mut result = HierarchicalResult::new();
        if let Some(sink) = &self.sink {
            result.configure_logger(sink.clone(), self.config.format, (self.sequence_source)());
        }
        result
    }

    pub fn execute_test<C: Command>(&self, params: Params) -> Result<HierarchicalResult, CommandError> {
        self.execute_root::<C>(RootContext::Test, params)
    }

    pub fn execute_api<C: Command>(&self, params: Params) -> Result<HierarchicalResult, CommandError> {
        self.execute_root::<C>(RootContext::Api, params)
    }

    pub fn execute_task<C: Command>(&self, params: Params) -> Result<TaskOutcome, CommandError> {
        let schema = self.registry.schema::<C>()?;
        if schema.is_help(&params) {
            return Ok(TaskOutcome::Help(schema.help_text()));
        }
        self.execute_root::<C>(RootContext::Task, params)
            .map(TaskOutcome::Completed)
    }

    pub fn help<C: Command>(&self) -> Result<String, CommandError> {
        Ok(self.registry.schema::<C>()?.help_text())
    }

    fn execute_root<C: Command>(
        &self,
        root: RootContext,
        params: Params,
    ) -> Result<HierarchicalResult, CommandError> {
        let mut result = self.create_result();
        tracing::debug!(command = C::NAME, context = ?root, sequence = ?result.sequence(), "executing root command");
        result.root_command(C::NAME);
        let invocation = Invocation::root(self, root, C::NAME);
        self.create_and_execute::<C>(&invocation, params, &mut result)?;
        Ok(result)
    }

    pub(crate) fn create_and_execute<C: Command>(
        &self,
        invocation: &Invocation<'_>,
        params: Params,
        result: &mut HierarchicalResult,
    ) -> Result<(), CommandError> {
        let schema = self.registry.schema::<C>()?;
        result.log_input(&params);

        if invocation.is_test_context() {
            schema.validate_input(&params)?;
        }
        let mut command = C::default();
        schema.assign(&mut command, &params)?;

        command.execute_internal(invocation, result)?;

        if invocation.is_test_context() {
            schema.validate_output(result.current())?;
        }
        result.log_output();
        Ok(())
    }
}
