// src/validate/quality.rs

use tracing::{debug, warn};

use super::predicate::Condition;
use crate::{
    error::{ValidationError, ValidationResult},
    table::Table,
};

/// Fail if any row of `column` satisfies `violation`, e.g. `Condition::lt(0)`
/// to reject negative counts. Null cells never violate; a cell that is not a
/// whole number is a parse error rather than a silent pass.
pub fn data_quality_check(
    table: &Table,
    column: &str,
    violation: &Condition,
) -> ValidationResult<()> {
    let values = table.integers(column)?;
    let violations = violation.evaluate(&values)?.true_count();

    if violations > 0 {
        warn!(
            table = table.name(),
            column,
            violations,
            "invalid values where {} {}",
            column,
            violation
        );
        return Err(ValidationError::DataQuality {
            table: table.name().to_string(),
            column: column.to_string(),
            condition: violation.to_string(),
            violations,
        });
    }

    debug!(table = table.name(), column, %violation, "quality check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::table;
    use anyhow::Result;

    #[test]
    fn passes_when_no_row_violates() -> Result<()> {
        let t = table("cases", &[], &[("cases", vec![Some(0), Some(3), None])]);
        data_quality_check(&t, "cases", &Condition::lt(0))?;
        Ok(())
    }

    #[test]
    fn negative_count_is_data_quality_error() {
        let t = table("cases", &[], &[("cases", vec![Some(5), Some(-1), Some(-4)])]);
        let err = data_quality_check(&t, "cases", &Condition::lt(0)).unwrap_err();
        match err {
            ValidationError::DataQuality {
                table,
                column,
                condition,
                violations,
            } => {
                assert_eq!(table, "cases");
                assert_eq!(column, "cases");
                assert_eq!(condition, "< 0");
                assert_eq!(violations, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_that_is_not_an_integer_is_rejected() {
        let t = table("cases", &[("cases", vec![Some("-1.5"), Some("-3e2")])], &[]);
        let err = data_quality_check(&t, "cases", &Condition::lt(0)).unwrap_err();
        assert!(matches!(err, ValidationError::Parse { .. }));
    }

    #[test]
    fn integer_text_is_checked_row_by_row() {
        let t = table("cases", &[("cases", vec![Some("4"), Some("-2")])], &[]);
        let err = data_quality_check(&t, "cases", &Condition::lt(0)).unwrap_err();
        assert!(matches!(err, ValidationError::DataQuality { violations: 1, .. }));
    }

    #[test]
    fn absent_column_is_schema_error() {
        let t = table("population", &[], &[("population", vec![Some(10)])]);
        let err = data_quality_check(&t, "POPESTIMATE2019", &Condition::lt(0)).unwrap_err();
        assert!(matches!(err, ValidationError::Schema { .. }));
    }
}
