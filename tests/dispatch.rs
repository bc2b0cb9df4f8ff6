use cmdtrace::command::{
    Command, CommandError, Dispatcher, Invocation, IoSchema, Registry, RootContext, TaskOutcome,
    params,
};
use cmdtrace::demo::{self, CUSTOM_RESULT_CODE, FAILURE_MESSAGE, Failing, FailWithCode, GreetGroup, HelloWorld};
use cmdtrace::result::{HierarchicalResult, MemorySink, RESULT_CODE_FAILED};
use cmdtrace::{EventKind, TraceReader, pretty_print};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

fn dispatcher() -> Dispatcher {
    Dispatcher::new(demo::registry())
}

#[test]
fn says_hello_world() {
    let result = dispatcher()
        .execute_test::<HelloWorld>(params(json!({"name": "Chris"})))
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(result.get_output("greeting"), Some(&json!("Hello Chris")));
    assert_eq!(result.get_output("context_test"), Some(&json!(true)));
    assert_eq!(result.get_output("context_child"), Some(&json!(false)));
}

#[test]
fn flags_missing_parameters_in_test_context() {
    let err = dispatcher()
        .execute_test::<HelloWorld>(params(json!({})))
        .unwrap_err();
    assert!(matches!(err, CommandError::MissingInput { input: "name", .. }));
}

#[test]
fn api_context_skips_validation() {
    let result = dispatcher()
        .execute_api::<HelloWorld>(params(json!({})))
        .unwrap();
    assert_eq!(result.get_output("greeting"), Some(&json!("Hello ")));
    assert_eq!(result.get_output("context_test"), Some(&json!(false)));
}

#[test]
fn child_commands_write_into_indexed_slots() {
    let result = dispatcher()
        .execute_test::<GreetGroup>(params(json!({"names": ["Avon", "Stringer"]})))
        .unwrap();
    let outputs = serde_json::Value::Object(result.into_outputs());
    assert_eq!(outputs["0"]["greeting"], json!("Hello Avon"));
    assert_eq!(outputs["1"]["greeting"], json!("Hello Stringer"));
    assert_eq!(outputs["1"]["context_child"], json!(true));
}

#[test]
fn failing_command_is_not_ok() {
    let result = dispatcher().execute_test::<Failing>(Default::default()).unwrap();
    assert!(!result.is_ok());
    assert_eq!(result.result_code(), RESULT_CODE_FAILED);
    assert_eq!(result.last_error(), Some(FAILURE_MESSAGE));
}

#[test]
fn failure_with_result_code() {
    let result = dispatcher()
        .execute_test::<FailWithCode>(Default::default())
        .unwrap();
    assert!(!result.is_ok());
    assert_eq!(result.result_code(), CUSTOM_RESULT_CODE);
}

#[test]
fn task_help_returns_usage() {
    let outcome = dispatcher()
        .execute_task::<HelloWorld>(params(json!({"name": "help"})))
        .unwrap();
    let TaskOutcome::Help(text) = outcome else {
        panic!("expected help");
    };
    assert!(text.contains("HelloWorld: Say hello to someone"));
    assert!(text.contains("name: Name of person to say hello to"));
    assert!(text.contains("greeting: Greeting for the person"));
}

#[test]
fn task_runs_normally_without_help() {
    let outcome = dispatcher()
        .execute_task::<HelloWorld>(params(json!({"name": "chris"})))
        .unwrap();
    let TaskOutcome::Completed(result) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(result.get_output("greeting"), Some(&json!("Hello chris")));
}

#[test]
fn unregistered_command_is_an_error() {
    let err = Dispatcher::new(Registry::new())
        .execute_test::<HelloWorld>(params(json!({"name": "x"})))
        .unwrap_err();
    assert!(matches!(err, CommandError::Unregistered("HelloWorld")));
}

// Commands below pin down how failures travel up the tree.

#[derive(Default)]
struct MissingOutput;

impl Command for MissingOutput {
    const NAME: &'static str = "MissingOutput";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Declares an output it never writes").output("answer", "Answer")
    }

    fn execute_internal(&mut self, _: &Invocation<'_>, _: &mut HierarchicalResult) -> Result<(), CommandError> {
        Ok(())
    }
}

/// Runs a failing child, then keeps going and writes its own output.
#[derive(Default)]
struct ParentOfFailure {
    override_code: Option<i32>,
}

impl Command for ParentOfFailure {
    const NAME: &'static str = "ParentOfFailure";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Parent of a failing child").optional_input(
            "override_code",
            "Code to fail with after the child",
            |c: &mut Self, v| {
                c.override_code = v.as_i64().map(|n| n as i32);
                Ok(())
            },
        )
    }

    fn execute_internal(&mut self, ctx: &Invocation<'_>, result: &mut HierarchicalResult) -> Result<(), CommandError> {
        ctx.execute_child::<Failing>(result, Some("child".into()), Default::default())?;
        result.set_output("after_child", true);
        if let Some(code) = self.override_code {
            result.failed_with_code("parent gave up", code);
        }
        Ok(())
    }
}

/// Records where it runs.
#[derive(Default)]
struct Where;

impl Command for Where {
    const NAME: &'static str = "Where";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Reports its context")
    }

    fn execute_internal(&mut self, ctx: &Invocation<'_>, result: &mut HierarchicalResult) -> Result<(), CommandError> {
        let context = serde_json::to_value(ctx.root_context()).unwrap_or_default();
        result.set_output("context", context);
        result.set_output("parent", ctx.parent().unwrap_or("-"));
        let mut ran = false;
        ctx.testing(|| ran = true);
        result.set_output("testing_ran", ran);
        Ok(())
    }
}

#[derive(Default)]
struct WrapsWhere;

impl Command for WrapsWhere {
    const NAME: &'static str = "WrapsWhere";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Runs Where without a slot key")
    }

    fn execute_internal(&mut self, ctx: &Invocation<'_>, result: &mut HierarchicalResult) -> Result<(), CommandError> {
        ctx.execute_child::<Where>(result, None, Default::default())
    }
}

fn registry() -> Registry {
    let mut registry = demo::registry();
    registry
        .register::<MissingOutput>()
        .register::<ParentOfFailure>()
        .register::<Where>()
        .register::<WrapsWhere>();
    registry
}

#[test]
fn flags_missing_output_in_test_context() {
    let d = Dispatcher::new(registry());
    let err = d.execute_test::<MissingOutput>(Default::default()).unwrap_err();
    assert!(matches!(err, CommandError::MissingOutput { output: "answer", .. }));
    assert!(d.execute_api::<MissingOutput>(Default::default()).is_ok());
}

#[test]
fn child_failure_marks_whole_tree_failed() {
    let result = Dispatcher::new(registry())
        .execute_test::<ParentOfFailure>(Default::default())
        .unwrap();
    assert!(!result.is_ok());
    assert_eq!(result.result_code(), RESULT_CODE_FAILED);
    assert_eq!(result.get_output("after_child"), Some(&json!(true)));
    assert!(result.has_output("child"));
}

#[test]
fn later_ancestor_failure_wins_the_code() {
    let result = Dispatcher::new(registry())
        .execute_test::<ParentOfFailure>(params(json!({"override_code": 42})))
        .unwrap();
    assert_eq!(result.result_code(), 42);
    assert_eq!(result.last_error(), Some("parent gave up"));
}

#[test]
fn knows_its_context() {
    let d = Dispatcher::new(registry());

    let root = d.execute_api::<Where>(Default::default()).unwrap();
    assert_eq!(root.get_output("context"), Some(&json!("api")));
    assert_eq!(root.get_output("parent"), Some(&json!("-")));
    assert_eq!(root.get_output("testing_ran"), Some(&json!(false)));

    let nested = d.execute_test::<WrapsWhere>(Default::default()).unwrap();
    assert_eq!(nested.get_output("context"), Some(&json!("test")));
    assert_eq!(nested.get_output("parent"), Some(&json!("WrapsWhere")));
    assert_eq!(nested.get_output("testing_ran"), Some(&json!(true)));

    let TaskOutcome::Completed(task) = d.execute_task::<Where>(Default::default()).unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(task.get_output("context"), Some(&json!("task")));
    assert_eq!(RootContext::Task, serde_json::from_value(json!("task")).unwrap());
}

#[test]
fn keyless_child_traces_at_caller_depth() {
    let sink = Arc::new(MemorySink::new());
    Dispatcher::new(registry())
        .with_sink(sink.clone())
        .execute_test::<WrapsWhere>(Default::default())
        .unwrap();

    let reader = TraceReader::new(Cursor::new(sink.to_log_text()), None).unwrap();
    let events: Vec<_> = reader.map(|e| e.unwrap()).collect();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.is_root() && e.is_command("WrapsWhere") && e.key.is_none()));
    let outputs: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_kind(EventKind::CommandOutput))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(outputs, vec![2, 3]);

    // The child's depth-0 output closes the outline, so the tree prints in two blocks.
    let reader = TraceReader::new(Cursor::new(sink.to_log_text()), None).unwrap();
    let out = String::from_utf8(pretty_print(reader, Vec::new()).unwrap()).unwrap();
    assert_eq!(out.lines().filter(|l| *l == "output:").count(), 2);
    assert_eq!(out.matches("  testing_ran: true").count(), 2);
}
