//! Value pipelines: filters, modifiers and switches.
//!
//! Every property and table cell read from a device runs through an
//! [`OperatorPipeline`] before it reaches a record:
//!
//! ```text
//!  "RouterOS 7.12.1 (stable)"
//!        │
//!        ▼  modify: regexSubmatch  'RouterOS ([0-9.]+)' → "$1"
//!  "7.12.1"
//!        │
//!        ▼  filter: !equals ""
//!  "7.12.1"
//! ```
//!
//! An operator failure aborts the pipeline, unless the operator sets
//! `return_on_mismatch`, in which case the pipeline stops and yields the
//! value the operator received.

mod modify;
mod switch;

pub use modify::{ArithmeticOp, Modifier};
pub use switch::{Switch, SwitchCase, SwitchValue};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::trace;

use crate::context::OperationContext;
use crate::error::{Error, Result};
use crate::matcher::StringMatcher;
use crate::value::Value;

/// What an operator does with its input.
#[derive(Debug, Clone)]
pub enum OperatorKind {
    /// Fail with [`Error::DidNotMatch`] unless the value matches.
    Filter(StringMatcher),

    /// Transform the value.
    Modify(Modifier),

    /// Pick a sub-pipeline by a switch key.
    Switch(Switch),
}

/// One step of a pipeline.
#[derive(Debug, Clone)]
pub struct Operator {
    kind: OperatorKind,
    return_on_mismatch: bool,
}

impl Operator {
    pub fn new(kind: OperatorKind) -> Self {
        Self {
            kind,
            return_on_mismatch: false,
        }
    }

    pub fn filter(matcher: StringMatcher) -> Self {
        Self::new(OperatorKind::Filter(matcher))
    }

    pub fn modify(modifier: Modifier) -> Self {
        Self::new(OperatorKind::Modify(modifier))
    }

    pub fn switch(switch: Switch) -> Self {
        Self::new(OperatorKind::Switch(switch))
    }

    /// On failure, end the pipeline with the input value instead.
    pub fn return_on_mismatch(mut self, enabled: bool) -> Self {
        self.return_on_mismatch = enabled;
        self
    }

    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    async fn apply(&self, ctx: &OperationContext, value: Value) -> Result<Value> {
        match &self.kind {
            OperatorKind::Filter(matcher) => {
                if matcher.matches(&value.as_str()) {
                    Ok(value)
                } else {
                    Err(Error::DidNotMatch(format!(
                        "'{value}' does not {} {:?}",
                        matcher.mode(),
                        matcher.values()
                    )))
                }
            }
            OperatorKind::Modify(modifier) => modifier.apply(ctx, value).await,
            OperatorKind::Switch(switch) => switch.apply(ctx, value).await,
        }
    }
}

/// Operators applied in order.
#[derive(Debug, Clone, Default)]
pub struct OperatorPipeline(Vec<Operator>);

impl OperatorPipeline {
    pub fn new(operators: Vec<Operator>) -> Self {
        Self(operators)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Run `value` through every operator.
    pub fn apply<'a>(
        &'a self,
        ctx: &'a OperationContext,
        value: Value,
    ) -> BoxFuture<'a, Result<Value>> {
        async move {
            let mut value = value;
            for operator in &self.0 {
                ctx.ensure_active()?;
                match operator.apply(ctx, value.clone()).await {
                    Ok(next) => value = next,
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(e) if operator.return_on_mismatch => {
                        trace!("operator failed ({e}), returning '{value}'");
                        return Ok(value);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(value)
        }
        .boxed()
    }
}

impl FromIterator<Operator> for OperatorPipeline {
    fn from_iter<I: IntoIterator<Item = Operator>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchMode, compile};

    fn matcher(mode: MatchMode, values: &[&str]) -> StringMatcher {
        StringMatcher::new(mode, values.iter().map(|v| v.to_string()).collect()).unwrap()
    }

    fn submatch(regex: &str, format: &str) -> Operator {
        Operator::modify(Modifier::RegexSubmatch {
            regex: compile(regex).unwrap(),
            format: format.to_string(),
        })
    }

    #[tokio::test]
    async fn test_filter() {
        let ctx = OperationContext::new();
        let pipeline = OperatorPipeline::new(vec![Operator::filter(matcher(
            MatchMode::NotEquals,
            &["0"],
        ))]);
        assert_eq!(pipeline.apply(&ctx, "5".into()).await.unwrap().to_string(), "5");
        assert!(matches!(
            pipeline.apply(&ctx, "0".into()).await,
            Err(Error::DidNotMatch(_))
        ));
    }

    #[tokio::test]
    async fn test_return_on_mismatch_stops_pipeline() {
        let ctx = OperationContext::new();
        let pipeline = OperatorPipeline::new(vec![
            submatch(r"Version (\d+)", "$1").return_on_mismatch(true),
            Operator::modify(Modifier::AddPrefix("v".into())),
        ]);
        assert_eq!(pipeline.apply(&ctx, "Version 7".into()).await.unwrap().to_string(), "v7");
        assert_eq!(pipeline.apply(&ctx, "unknown".into()).await.unwrap().to_string(), "unknown");
    }

    #[tokio::test]
    async fn test_operators_in_order() {
        let ctx = OperationContext::new();
        let pipeline: OperatorPipeline = [
            submatch(r"RouterOS ([0-9.]+)", "$1"),
            Operator::modify(Modifier::AddSuffix("-stable".into())),
            Operator::modify(Modifier::ToUpperCase),
        ]
        .into_iter()
        .collect();
        assert_eq!(pipeline.len(), 3);
        let out = pipeline.apply(&ctx, "RouterOS 7.12.1 (stable)".into()).await.unwrap();
        assert_eq!(out.to_string(), "7.12.1-STABLE");
    }

    #[tokio::test]
    async fn test_cancelled_pipeline() {
        let ctx = OperationContext::new();
        ctx.cancellation_token().cancel();
        let pipeline = OperatorPipeline::new(vec![
            Operator::modify(Modifier::ToLowerCase).return_on_mismatch(true),
        ]);
        assert!(matches!(pipeline.apply(&ctx, "A".into()).await, Err(Error::Cancelled)));
        assert!(OperatorPipeline::default().apply(&ctx, "A".into()).await.is_ok());
    }
}
