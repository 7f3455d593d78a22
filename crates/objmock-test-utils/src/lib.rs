//! Testing utilities for objmock workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use objmock::{
    AccessKind, FactoryContext, HandlerId, MockError, MockOptions, MockSpace, Report, Value,
    ValueFactory,
};
use parking_lot::Mutex;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a fmt subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Default-configured space with tracing installed.
pub fn fresh_space() -> MockSpace {
    init_tracing();
    MockSpace::new()
}

/// Root mock of `space` built with default options.
pub fn root_mock(space: &MockSpace) -> objmock::Mock {
    space
        .mock(MockOptions::new())
        .expect("mock heap exhausted in test fixture")
}

/// One invocation seen by a [`RecordingFactory`].
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryInvocation {
    pub arguments: Vec<Value>,
    pub handler: HandlerId,
    pub result: Value,
}

/// Factory returning a fixed value and remembering every invocation.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    result: Value,
    invocations: Mutex<Vec<FactoryInvocation>>,
}

impl RecordingFactory {
    pub fn returning(result: impl Into<Value>) -> Arc<Self> {
        Arc::new(Self {
            result: result.into(),
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn invocations(&self) -> Vec<FactoryInvocation> {
        self.invocations.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.invocations.lock().len()
    }
}

impl ValueFactory for RecordingFactory {
    fn produce(&self, arguments: &[Value], cx: &mut FactoryContext<'_>) -> Result<Value, MockError> {
        self.invocations.lock().push(FactoryInvocation {
            arguments: arguments.to_vec(),
            handler: cx.handler_id(),
            result: self.result.clone(),
        });
        Ok(self.result.clone())
    }
}

pub fn history_kinds(report: &Report) -> Vec<AccessKind> {
    report.history().iter().map(|r| r.kind()).collect()
}

#[track_caller]
pub fn assert_history_kinds(report: &Report, expected: &[AccessKind]) {
    let actual = history_kinds(report);
    assert_eq!(
        actual,
        expected,
        "unexpected history:\n{}",
        report.to_json().unwrap_or_default()
    );
}
