//! Template parsing for embedded `$(...)` and `${...}` expressions.
//!
//! A template holds at most one embedded expression. Parenthesized forms take
//! precedence over braced ones, and each form extends to the last matching
//! closing delimiter in the string.

use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHESIZED_EXPRESSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\((.+)\)").expect("valid expression pattern"));
static BRACED_EXPRESSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\{(.+)\}").expect("valid expression pattern"));

/// Delimiter style of an embedded expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionForm {
    /// `$(...)`: a bare expression.
    Parenthesized,
    /// `${...}`: a function body.
    Braced,
}

/// An embedded expression located inside a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedExpression<'a> {
    pub form: ExpressionForm,
    /// Text between the delimiters.
    pub body: &'a str,
    /// Literal text before the expression.
    pub prefix: &'a str,
    /// Literal text after the expression.
    pub suffix: &'a str,
}

impl EmbeddedExpression<'_> {
    /// True when the expression is the whole template, in which case its
    /// value is returned as-is instead of being spliced into text.
    pub fn is_standalone(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }
}

/// Finds the embedded expression in `template`, if any.
pub fn find_expression(template: &str) -> Option<EmbeddedExpression<'_>> {
    let (form, captures) = match PARENTHESIZED_EXPRESSION.captures(template) {
        Some(captures) => (ExpressionForm::Parenthesized, captures),
        None => (ExpressionForm::Braced, BRACED_EXPRESSION.captures(template)?),
    };
    let whole = captures.get(0)?;
    let body = captures.get(1)?;
    Some(EmbeddedExpression {
        form,
        body: &template[body.start()..body.end()],
        prefix: &template[..whole.start()],
        suffix: &template[whole.end()..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_standalone_parenthesized_expression() {
        let expression = find_expression("$(inputs.reads.path)").expect("expression");
        assert_eq!(expression.form, ExpressionForm::Parenthesized);
        assert_eq!(expression.body, "inputs.reads.path");
        assert!(expression.is_standalone());
    }

    #[test]
    fn keeps_surrounding_literal_text() {
        let expression = find_expression("out/$(inputs.name).txt").expect("expression");
        assert_eq!(expression.prefix, "out/");
        assert_eq!(expression.body, "inputs.name");
        assert_eq!(expression.suffix, ".txt");
        assert!(!expression.is_standalone());
    }

    #[test]
    fn braced_expression_spans_to_last_brace() {
        let expression = find_expression("${ if (x) { return 1; } return 2; }").expect("expression");
        assert_eq!(expression.form, ExpressionForm::Braced);
        assert_eq!(expression.body, " if (x) { return 1; } return 2; ");
    }

    #[test]
    fn multiline_bodies_are_matched() {
        let expression = find_expression("${\n  return inputs.n + 1;\n}\n").expect("expression");
        assert_eq!(expression.body, "\n  return inputs.n + 1;\n");
        assert_eq!(expression.suffix, "\n");
    }

    #[test]
    fn plain_text_has_no_expression() {
        assert!(find_expression("output.txt").is_none());
        assert!(find_expression("$input").is_none());
        assert!(find_expression("$()").is_none());
    }
}
