//! First-match rule evaluation for a single node

use crate::compartment::EvalContext;
use crate::core::error::Result;
use crate::core::types::StatusCode;
use crate::rules::table::RuleTable;

/// Evaluate the rules leaving the node's current status
/// Returns the target of the first rule whose compartment fires; later
/// rules are not evaluated.
pub fn evaluate_rules(rules: &RuleTable, ctx: &mut EvalContext<'_>) -> Result<Option<StatusCode>> {
    for rule in rules.rules_from(ctx.status()) {
        if rule.compartment.execute(ctx)? {
            return Ok(Some(rule.to));
        }
    }
    Ok(None)
}
