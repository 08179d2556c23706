// ABOUTME: Test support utilities.
// ABOUTME: Provides a recording executor that scripts invocation results.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use davit::executor::{EnvOverlay, ExecContext, Executor, ExecutorError, InvocationResult};

/// One dispatched command as the backend handed it to the executor.
// Each test binary only reads some of these fields.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub cmd: String,
    pub env: EnvOverlay,
    pub cwd: Option<PathBuf>,
    pub pipe: bool,
    pub check: bool,
}

/// Executor double: records every call and plays back scripted results.
///
/// When the script runs out, remaining calls succeed with empty output.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<VecDeque<InvocationResult>>,
}

#[allow(dead_code)]
impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = InvocationResult>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.cmd).collect()
    }
}

/// A successful result with the given captured stdout.
#[allow(dead_code)]
pub fn ok(stdout: &str) -> InvocationResult {
    InvocationResult {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
        succeeded: true,
    }
}

/// A failed result with the given exit code.
#[allow(dead_code)]
pub fn failed(exit_code: i32) -> InvocationResult {
    InvocationResult {
        exit_code,
        stdout: String::new(),
        stderr: String::new(),
        succeeded: false,
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, cmd: &str, ctx: &ExecContext) -> Result<InvocationResult, ExecutorError> {
        self.calls.lock().unwrap().push(RecordedCall {
            cmd: cmd.to_string(),
            env: ctx.env.clone(),
            cwd: ctx.cwd.clone(),
            pipe: ctx.pipe,
            check: ctx.check,
        });

        let result = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok(""));

        if ctx.check && !result.succeeded {
            return Err(ExecutorError::CommandFailed {
                command: cmd.to_string(),
                exit_code: result.exit_code,
            });
        }

        Ok(result)
    }
}
