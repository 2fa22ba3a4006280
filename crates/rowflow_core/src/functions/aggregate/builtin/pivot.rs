use indexmap::IndexMap;
use rowflow_error::Result;
use tracing::trace;

use crate::functions::aggregate::AggregateFunctionImpl;
use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{
    BoundParameter,
    ParamType,
    ParamValue,
    ParameterDef,
    arg,
    group_arg,
};
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_PIVOT_TO_COLUMNS: FunctionDefinition = FunctionDefinition {
    name: "pivot_to_columns",
    category: Category::Aggregate,
    aliases: &["pivot"],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyComparable,
    inputs: &[
        ParameterDef::single("label", ParamType::Fixed(DataType::Utf8)),
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::linked("labels", ParamType::Fixed(DataType::Utf8), "labels"),
    ],
    returns: Some(ParamType::Fixed(DataType::Boolean)),
    outputs: &[ParameterDef::linked("values", ParamType::Generic, "labels")],
    doc: &Documentation {
        summary: "Pivots label/value rows into one column per expected label.",
        description: r#"
Collects the value of each row under its label. The expected labels are
given as a group, and the output group has one column per label in the same
order. Labels never seen produce null. Returns true only if every expected
label was observed. Rows with unexpected labels are ignored.
"#,
        examples: &[Example {
            inputs: "('q1', 10), ('q2', 20); labels ['q1', 'q2', 'q3']",
            output: "false; values [10, 20, NULL]",
        }],
    },
    factory: bind_pivot,
};

fn bind_pivot(ctx: &BindContext) -> Result<FunctionImpl> {
    // Constant labels are known up front, otherwise they're read from the
    // first row of each group.
    let seeded = match ctx.inputs.get(2) {
        Some(BoundParameter::Group(params)) => params
            .iter()
            .map(|p| p.as_constant().map(|v| v.try_into_string()))
            .collect::<Option<Result<Vec<_>>>>()
            .transpose()?,
        _ => None,
    };

    let mut pivot = Pivot {
        seeded: seeded.is_some(),
        values: IndexMap::new(),
    };
    if let Some(labels) = seeded {
        pivot.seed(labels);
    }

    Ok(FunctionImpl::Aggregate(Box::new(pivot)))
}

#[derive(Debug)]
pub struct Pivot {
    /// If labels came from constants and survive a reset.
    seeded: bool,
    /// Expected label to observed value, None if not yet seen.
    values: IndexMap<String, Option<ScalarValue>>,
}

impl Pivot {
    fn seed(&mut self, labels: impl IntoIterator<Item = String>) {
        self.values = labels.into_iter().map(|label| (label, None)).collect();
    }
}

impl AggregateFunctionImpl for Pivot {
    fn reset(&mut self) {
        if self.seeded {
            self.values.values_mut().for_each(|v| *v = None);
        } else {
            self.values.clear();
        }
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        if self.values.is_empty() {
            let labels = group_arg(args, 2)?
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| v.try_into_string())
                .collect::<Result<Vec<_>>>()?;
            self.seed(labels);
        }

        let label = arg(args, 0)?;
        if label.is_null() {
            return Ok(());
        }
        let label = label.try_as_str()?;
        match self.values.get_mut(label) {
            Some(slot) => *slot = Some(arg(args, 1)?.clone()),
            None => trace!(%label, "ignoring unexpected pivot label"),
        }
        Ok(())
    }

    fn finalize(&mut self, _index: usize) -> Result<FunctionOutput> {
        let complete = self.values.values().all(|v| v.is_some());
        let values = self
            .values
            .values()
            .map(|v| v.clone().unwrap_or(ScalarValue::Null))
            .collect();
        Ok(FunctionOutput::with_outputs(
            complete,
            vec![ParamValue::Group(values)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::transform::TransformConfig;
    use crate::functions::bound::BoundFunction;
    use crate::functions::catalog::FunctionCatalog;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{row, schema, vars};
    use crate::values::schema::{ColumnDef, RowSchema};

    fn bind_pivot(schema: &RowSchema, labels: ParameterSpec, outputs: &[&str]) -> BoundFunction {
        FunctionCatalog::builtin()
            .resolve("aggregate.pivot_to_columns")
            .unwrap()
            .with_input(ParameterSpec::column("label"))
            .with_input(ParameterSpec::column("value"))
            .with_input(labels)
            .with_return("complete")
            .with_output(ParameterSpec::output_group(outputs.iter().copied()))
            .bind(schema, None, &TransformConfig::default())
            .unwrap()
    }

    #[test]
    fn constant_labels() {
        let schema = schema(&[("label", DataType::Utf8), ("value", DataType::Int32)]);
        let labels = ParameterSpec::constant(vec![
            ScalarValue::from("q1"),
            ScalarValue::from("q2"),
            ScalarValue::from("q3"),
        ]);
        let mut f = bind_pivot(&schema, labels, &["c1", "c2", "c3"]);

        for (label, value) in [("q2", 20), ("q1", 10), ("q9", 90)] {
            f.accumulate(&row(vec![label.into(), value.into()]), &vars())
                .unwrap();
        }
        let out = f.result(0).unwrap();
        assert_eq!(ScalarValue::Boolean(false), out.value);
        assert_eq!(
            vec![ParamValue::Group(vec![10.into(), 20.into(), ScalarValue::Null])],
            out.outputs
        );

        f.accumulate(&row(vec!["q3".into(), 30.into()]), &vars())
            .unwrap();
        assert_eq!(ScalarValue::Boolean(true), f.result(0).unwrap().value);

        // Labels survive the reset.
        f.reset();
        f.accumulate(&row(vec!["q3".into(), 3.into()]), &vars())
            .unwrap();
        let out = f.result(0).unwrap();
        assert_eq!(
            vec![ParamValue::Group(vec![ScalarValue::Null, ScalarValue::Null, 3.into()])],
            out.outputs
        );
    }

    #[test]
    fn labels_from_array_column() {
        let schema = RowSchema::try_from_columns([
            ColumnDef::new("label", DataType::Utf8),
            ColumnDef::new("value", DataType::Int32),
            ColumnDef::new("expected", DataType::Utf8).with_rank(1),
        ])
        .unwrap();
        let mut f = bind_pivot(&schema, ParameterSpec::column("expected"), &["a", "b"]);

        let expected = ScalarValue::List(vec!["x".into(), "y".into()]);
        f.accumulate(&row(vec!["y".into(), 2.into(), expected.clone()]), &vars())
            .unwrap();
        f.accumulate(&row(vec!["x".into(), 1.into(), expected.clone()]), &vars())
            .unwrap();
        let out = f.result(0).unwrap();
        assert_eq!(ScalarValue::Boolean(true), out.value);
        assert_eq!(vec![ParamValue::Group(vec![1.into(), 2.into()])], out.outputs);

        // Different cardinality than the bound outputs.
        let err = f
            .accumulate(
                &row(vec!["x".into(), 1.into(), ScalarValue::List(vec!["x".into()])]),
                &vars(),
            )
            .unwrap_err();
        assert!(err.is_runtime());
    }
}
