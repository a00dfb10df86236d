//! Full-script expression evaluation through an external Node.js process.
//!
//! Each evaluation launches one process, writes a self-contained program to
//! its stdin, reads the single JSON line it prints, and waits for it to exit.
//! No timeout is imposed.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use cwl_inspector_util::{find_on_path, is_executable};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{InspectError, Result};
use crate::resolve::{Evaluated, EvaluationScope, ExpressionEngine};
use crate::templates::{EmbeddedExpression, ExpressionForm};

/// Program names tried on `PATH` when no executable is configured.
pub const NODE_CANDIDATES: [&str; 2] = ["node", "nodejs"];

static ERROR_REPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\w*Error: .+").expect("valid error pattern"));

/// Evaluates expressions by delegating them to a Node.js executable.
#[derive(Debug, Clone, Default)]
pub struct ScriptEngine {
    executable: Option<PathBuf>,
}

impl ScriptEngine {
    /// Uses `executable` when given, otherwise searches `PATH` on each evaluation.
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn locate_executable(&self) -> Result<PathBuf> {
        match &self.executable {
            Some(executable) if is_executable(executable) => Ok(executable.clone()),
            Some(executable) => Err(InspectError::collaborator(format!(
                "{} is not executable or does not exist",
                executable.display()
            ))),
            None => find_on_path(&NODE_CANDIDATES).ok_or_else(|| InspectError::collaborator("No executables for Nodejs")),
        }
    }
}

impl ExpressionEngine for ScriptEngine {
    fn evaluate(&self, expression: &EmbeddedExpression<'_>, scope: &EvaluationScope<'_>) -> Result<Evaluated> {
        let executable = self.locate_executable()?;
        let function = wrap_expression(expression, scope)?;
        let reply = run_collaborator(&executable, &program_for(&function))?;
        Ok(interpret_reply(reply))
    }
}

/// Wraps the expression in a function that binds `runtime`, `inputs`, and `self`.
pub fn wrap_expression(expression: &EmbeddedExpression<'_>, scope: &EvaluationScope<'_>) -> Result<String> {
    let returned = match expression.form {
        ExpressionForm::Braced => format!("(function() {{{}}})()", expression.body),
        ExpressionForm::Parenthesized => expression.body.to_string(),
    };
    let runtime = serde_json::to_string(scope.runtime()).map_err(|error| InspectError::collaborator(error.to_string()))?;
    let inputs = serde_json::to_string(scope.inputs()).map_err(|error| InspectError::collaborator(error.to_string()))?;
    Ok(format!(
        "function() {{\n  const runtime = {runtime};\n  const inputs = {inputs};\n  const self = null;\n  return {returned};\n}}"
    ))
}

/// Full program handed to the collaborator: prints the result, or the caught
/// error as `"<Kind>Error: <message>"`, as one JSON line.
///
/// The function text travels as a string literal and is compiled inside the
/// `try`, so syntax errors in an expression are reported like runtime errors.
pub fn program_for(function: &str) -> String {
    let source = Value::String(format!("({function})"));
    format!(
        "'use strict'\ntry {{\n  const fn = eval({source})\n  process.stdout.write(JSON.stringify(fn()) + '\\n')\n}} catch(e) {{\n  process.stdout.write(JSON.stringify(`${{e.name}}: ${{e.message}}`) + '\\n')\n}}\n"
    )
}

fn run_collaborator(executable: &Path, program: &str) -> Result<Value> {
    debug!(executable = %executable.display(), "launching script engine");
    let mut child = Command::new(executable)
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|error| InspectError::collaborator(format!("failed to launch {}: {error}", executable.display())))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(program.as_bytes())
            .map_err(|error| InspectError::collaborator(format!("failed to send program: {error}")))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|error| InspectError::collaborator(format!("failed to read reply: {error}")))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().unwrap_or_default();
    if line.trim().is_empty() && !output.status.success() {
        return Err(InspectError::collaborator(format!(
            "{} exited with {} without a reply",
            executable.display(),
            output.status
        )));
    }
    serde_json::from_str(line).map_err(|error| InspectError::collaborator(format!("unparsable reply {line:?}: {error}")))
}

/// Converts the collaborator's reply into an outcome. Error reports degrade
/// to [`Evaluated::Unresolved`].
pub fn interpret_reply(reply: Value) -> Evaluated {
    match reply {
        Value::String(message) if ERROR_REPORT.is_match(&message) => {
            debug!(%message, "script engine reported an error");
            Evaluated::Unresolved(message)
        }
        value => Evaluated::Resolved(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::templates::find_expression;
    use cwl_inspector_types::Settings;
    use serde_json::json;

    fn scoped_document() -> Document {
        Document::from_value(
            json!({
                "requirements": [{"class": "InlineJavascriptRequirement"}],
                "inputs": [{"id": "n", "type": "int"}]
            }),
            ".",
        )
    }

    #[test]
    fn parenthesized_expression_is_returned_directly() {
        let document = scoped_document();
        let mut settings = Settings::default();
        settings.args.insert("n".into(), json!(2));
        let scope = EvaluationScope::new(&document, &settings);

        let expression = find_expression("$(inputs.n + 1)").expect("expression");
        let function = wrap_expression(&expression, &scope).expect("function");
        assert!(function.contains("const runtime = {};"));
        assert!(function.contains(r#"const inputs = {"n":2};"#));
        assert!(function.contains("const self = null;"));
        assert!(function.contains("return inputs.n + 1;"));
    }

    #[test]
    fn braced_expression_becomes_immediate_function() {
        let document = scoped_document();
        let settings = Settings::default();
        let scope = EvaluationScope::new(&document, &settings);

        let expression = find_expression("${ return 42; }").expect("expression");
        let function = wrap_expression(&expression, &scope).expect("function");
        assert!(function.contains("return (function() { return 42; })();"));
        assert!(program_for(&function).starts_with("'use strict'"));
    }

    #[test]
    fn error_reports_become_unresolved() {
        assert_eq!(
            interpret_reply(json!("ReferenceError: foo is not defined")),
            Evaluated::Unresolved("ReferenceError: foo is not defined".into())
        );
        assert_eq!(interpret_reply(json!("plain text")), Evaluated::Resolved(json!("plain text")));
        assert_eq!(interpret_reply(json!(3)), Evaluated::Resolved(json!(3)));
    }

    #[test]
    fn multi_line_error_reports_become_unresolved() {
        let message = "Error: line one\nline two";
        assert_eq!(interpret_reply(json!(message)), Evaluated::Unresolved(message.into()));
    }

    #[test]
    fn program_compiles_the_function_inside_try() {
        let program = program_for("function() {\n  return inputs.n +;\n}");
        assert!(program.contains(r#"const fn = eval("(function() {\n  return inputs.n +;\n})")"#));
        let try_start = program.find("try {").expect("try block");
        assert!(program.find("eval(").expect("eval") > try_start);
    }

    #[test]
    fn configured_executable_must_exist() {
        let engine = ScriptEngine::new(Some(PathBuf::from("/definitely/not/node")));
        let error = engine.locate_executable().expect_err("missing executable");
        assert!(error.to_string().contains("is not executable or does not exist"));
    }

    #[cfg(unix)]
    fn fake_script(directory: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = directory.join("fake-node");
        std::fs::write(&script, format!("#!/bin/sh\ncat > /dev/null\n{body}\n")).expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        script
    }

    #[cfg(unix)]
    fn fake_engine(directory: &Path, reply: &str) -> PathBuf {
        fake_script(directory, &format!("echo '{reply}'"))
    }

    #[cfg(unix)]
    #[test]
    fn collaborator_reply_is_parsed() {
        let directory = tempfile::tempdir().expect("tempdir");
        let engine = ScriptEngine::new(Some(fake_engine(directory.path(), r#"{"answer": [1, 2]}"#)));
        let document = scoped_document();
        let settings = Settings::default();
        let scope = EvaluationScope::new(&document, &settings);
        let expression = find_expression("$(anything)").expect("expression");

        let outcome = engine.evaluate(&expression, &scope).expect("evaluated");
        assert_eq!(outcome, Evaluated::Resolved(json!({"answer": [1, 2]})));
    }

    #[cfg(unix)]
    #[test]
    fn collaborator_error_report_is_soft() {
        let directory = tempfile::tempdir().expect("tempdir");
        let engine = ScriptEngine::new(Some(fake_engine(directory.path(), r#""TypeError: x is undefined""#)));
        let document = scoped_document();
        let settings = Settings::default();
        let scope = EvaluationScope::new(&document, &settings);
        let expression = find_expression("$(x.y)").expect("expression");

        assert!(matches!(engine.evaluate(&expression, &scope).expect("evaluated"), Evaluated::Unresolved(_)));
    }

    #[cfg(unix)]
    #[test]
    fn garbage_reply_is_a_hard_error() {
        let directory = tempfile::tempdir().expect("tempdir");
        let engine = ScriptEngine::new(Some(fake_engine(directory.path(), "not json")));
        let document = scoped_document();
        let settings = Settings::default();
        let scope = EvaluationScope::new(&document, &settings);
        let expression = find_expression("$(1)").expect("expression");

        assert!(matches!(engine.evaluate(&expression, &scope), Err(InspectError::Collaborator { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn silent_failed_exit_is_a_hard_error() {
        let directory = tempfile::tempdir().expect("tempdir");
        let engine = ScriptEngine::new(Some(fake_script(directory.path(), "exit 3")));
        let document = scoped_document();
        let settings = Settings::default();
        let scope = EvaluationScope::new(&document, &settings);
        let expression = find_expression("$(1)").expect("expression");

        let error = engine.evaluate(&expression, &scope).expect_err("failed exit");
        assert!(matches!(error, InspectError::Collaborator { ref message } if message.contains("without a reply")));
    }

    #[test]
    fn syntax_error_in_expression_is_soft() {
        let Some(node) = find_on_path(&NODE_CANDIDATES) else {
            return;
        };
        let engine = ScriptEngine::new(Some(node));
        let document = scoped_document();
        let mut settings = Settings::default();
        settings.args.insert("n".into(), json!(2));
        let scope = EvaluationScope::new(&document, &settings);
        let expression = find_expression("x-$(inputs.n +)").expect("expression");

        match engine.evaluate(&expression, &scope).expect("evaluated") {
            Evaluated::Unresolved(report) => assert!(report.starts_with("SyntaxError: "), "{report}"),
            other => panic!("expected an error report, got {other:?}"),
        }
    }
}
