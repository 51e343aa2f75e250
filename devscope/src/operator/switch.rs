use log::trace;

use super::OperatorPipeline;
use crate::context::OperationContext;
use crate::error::Result;
use crate::matcher::StringMatcher;
use crate::oid::Oid;
use crate::value::Value;

/// Where the switch key comes from.
#[derive(Debug, Clone)]
pub enum SwitchValue {
    /// The operator input.
    Default,

    /// Number of entries below `oid`, optionally only those whose value
    /// (or OID, with `use_oid`) passes `filter`.
    WalkCount {
        oid: Oid,
        filter: Option<StringMatcher>,
        use_oid: bool,
    },
}

impl SwitchValue {
    async fn key(&self, ctx: &OperationContext, input: &Value) -> Result<Value> {
        match self {
            SwitchValue::Default => Ok(input.clone()),
            SwitchValue::WalkCount {
                oid,
                filter,
                use_oid,
            } => {
                let responses = match ctx.snmp_walk(oid).await {
                    Ok(responses) => responses,
                    Err(e) if e.is_not_found() => Vec::new(),
                    Err(e) => return Err(e),
                };
                let count = responses
                    .iter()
                    .filter(|r| match filter {
                        None => true,
                        Some(f) if *use_oid => f.matches(r.oid.as_str()),
                        Some(f) => f.matches(&r.value_string()),
                    })
                    .count();
                Ok(Value::from(count))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub matcher: StringMatcher,
    pub operators: OperatorPipeline,
}

/// Runs the pipeline of the first case matching the switch key.
#[derive(Debug, Clone)]
pub struct Switch {
    pub value: SwitchValue,
    pub cases: Vec<SwitchCase>,
}

impl Switch {
    pub(super) async fn apply(&self, ctx: &OperationContext, value: Value) -> Result<Value> {
        let key = self.value.key(ctx, &value).await?;
        let key_str = key.as_str();
        match self.cases.iter().find(|c| c.matcher.matches(&key_str)) {
            Some(case) => case.operators.apply(ctx, value).await,
            None => {
                trace!("no switch case for '{key_str}'");
                Ok(value)
            }
        }
    }
}
