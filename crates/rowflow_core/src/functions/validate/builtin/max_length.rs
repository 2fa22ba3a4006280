use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef};
use crate::functions::validate::{ValidateFunctionImpl, ValidationOutcome, arg_or_null};
use crate::functions::{FunctionDefinition, FunctionImpl, FunctionKind, GenericPolicy};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_MAX_LENGTH: FunctionDefinition = FunctionDefinition {
    name: "max_length",
    category: Category::Validate,
    aliases: &[],
    kind: FunctionKind::Validate,
    generic: GenericPolicy::Fixed(DataType::Utf8),
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("length", ParamType::Fixed(DataType::Int64)),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[ParameterDef::single("valid", ParamType::Fixed(DataType::Boolean))],
    doc: &Documentation {
        summary: "Checks a string is no longer than a number of characters.",
        description: r#"
Checks a string is no longer than `length` characters. Longer strings are
truncated.
"#,
        examples: &[Example {
            inputs: "'abcdef', 3",
            output: "'abc', valid = false",
        }],
    },
    factory: |_| Ok(FunctionImpl::Validate(Box::new(MaxLength))),
};

#[derive(Debug, Clone, Copy)]
pub struct MaxLength;

impl ValidateFunctionImpl for MaxLength {
    fn check(&self, args: &[ParamValue]) -> ValidationOutcome {
        let value = arg_or_null(args, 0);
        let max = match arg_or_null(args, 1).try_as_usize() {
            Ok(max) => max,
            Err(_) => return ValidationOutcome::valid(value.clone()),
        };
        let s = match value {
            ScalarValue::Utf8(s) => s,
            other => return ValidationOutcome::valid(other.clone()),
        };

        match s.char_indices().nth(max) {
            Some((end, _)) => ValidationOutcome::invalid(s[..end].into()),
            None => ValidationOutcome::valid(value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema, vars};

    #[test]
    fn truncates_long_values() {
        let schema = schema(&[("s", DataType::Utf8)]);
        let mut f = bind(
            "validate.max_length",
            &schema,
            vec![ParameterSpec::column("s"), ParameterSpec::constant(3)],
        );

        let cases = [
            ("abcdef", "abc", false),
            ("abc", "abc", true),
            ("ééééé", "ééé", false),
            ("", "", true),
        ];
        for case in cases {
            let outcome = f.check(&row(vec![case.0.into()]), &vars()).unwrap();
            assert_eq!(ScalarValue::from(case.1), outcome.value, "case: {case:?}");
            assert_eq!(case.2, outcome.valid, "case: {case:?}");
        }

        let outcome = f.check(&row(vec![ScalarValue::Null]), &vars()).unwrap();
        assert_eq!(ValidationOutcome::valid(ScalarValue::Null), outcome);
    }
}
