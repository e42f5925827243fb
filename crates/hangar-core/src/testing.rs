//! Scripted process runner for tests

use std::sync::Mutex;

use crate::error::{ProcessError, Result};
use crate::process::{CommandSpec, ProcessOutput, ProcessRunner};

enum Reply {
    Output(ProcessOutput),
    NotFound,
}

struct Rule {
    program: String,
    args_prefix: Vec<String>,
    reply: Reply,
}

/// Runner that answers from canned replies and records every invocation
///
/// Rules match on program name plus a prefix of the arguments; the first
/// matching rule wins. Unmatched commands fail to spawn.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    /// Create a runner with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to `program` invoked with arguments starting with `args_prefix`
    pub fn on(mut self, program: &str, args_prefix: &[&str], output: ProcessOutput) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|a| a.to_string()).collect(),
            reply: Reply::Output(output),
        });
        self
    }

    /// Pretend `program` is not installed
    pub fn missing(mut self, program: &str) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            args_prefix: Vec::new(),
            reply: Reply::NotFound,
        });
        self
    }

    /// All invocations so far, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Invocations of `program` whose first argument is `subcommand`
    pub fn calls_to(&self, program: &str, subcommand: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program && c.args.first().map(String::as_str) == Some(subcommand))
            .collect()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }

        let rule = self.rules.iter().find(|r| {
            r.program == command.program && command.args.starts_with(&r.args_prefix)
        });

        match rule.map(|r| &r.reply) {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::NotFound) => Err(ProcessError::NotFound(command.program.clone()).into()),
            None => Err(ProcessError::SpawnFailed {
                command: command.to_string(),
                reason: "no scripted reply".to_string(),
            }
            .into()),
        }
    }
}
