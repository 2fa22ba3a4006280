use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{DefaultValue, ParamType, ParamValue, ParameterDef};
use crate::functions::validate::{ValidateFunctionImpl, ValidationOutcome, arg_or_null};
use crate::functions::{FunctionDefinition, FunctionImpl, FunctionKind, GenericPolicy};
use crate::values::datatype::DataType;

pub const FUNCTION_NOT_NULL: FunctionDefinition = FunctionDefinition {
    name: "not_null",
    category: Category::Validate,
    aliases: &[],
    kind: FunctionKind::Validate,
    generic: GenericPolicy::AnyComparable,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("replacement", ParamType::Generic).with_default(DefaultValue::Null),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[ParameterDef::single("valid", ParamType::Fixed(DataType::Boolean))],
    doc: &Documentation {
        summary: "Checks a value is not null.",
        description: "Checks a value is not null. Null values are replaced with `replacement`.",
        examples: &[Example {
            inputs: "null, 'n/a'",
            output: "'n/a', valid = false",
        }],
    },
    factory: |_| Ok(FunctionImpl::Validate(Box::new(NotNull))),
};

#[derive(Debug, Clone, Copy)]
pub struct NotNull;

impl ValidateFunctionImpl for NotNull {
    fn check(&self, args: &[ParamValue]) -> ValidationOutcome {
        match arg_or_null(args, 0) {
            v if v.is_null() => ValidationOutcome::invalid(arg_or_null(args, 1).clone()),
            v => ValidationOutcome::valid(v.clone()),
        }
    }
}
