//! Call rendering for verification diagnostics.

use crate::ledger::CallRecord;
use crate::matcher::ArgMatcher;

/// Renders calls and call specifications as diagnostic text
#[derive(Debug, Clone, Copy, Default)]
pub struct CallFormatter;

impl CallFormatter {
    /// `method(arg1, arg2)` with literal argument values
    #[must_use]
    pub fn format_call(record: &CallRecord) -> String {
        let args: Vec<String> = record.args.iter().map(ToString::to_string).collect();
        format!("{}({})", record.method, args.join(", "))
    }

    /// `method(matcher1, matcher2)` with matcher descriptions
    #[must_use]
    pub fn format_spec(method: &str, matchers: &[ArgMatcher]) -> String {
        let described: Vec<String> = matchers.iter().map(ArgMatcher::describe).collect();
        format!("{method}({})", described.join(", "))
    }

    /// One formatted call per line
    #[must_use]
    pub fn format_calls<'a>(records: impl IntoIterator<Item = &'a CallRecord>) -> String {
        records
            .into_iter()
            .map(Self::format_call)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
