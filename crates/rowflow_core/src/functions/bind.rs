//! Resolve a descriptor's parameter specs against a schema.
use indexmap::IndexMap;
use rowflow_error::{ErrorFieldExt, Result, ResultExt, RowflowError};
use tracing::debug;

use super::bound::{BoundFunction, BoundLink};
use super::descriptor::FunctionDescriptor;
use super::parameter::{
    Arity,
    BoundOutput,
    BoundOutputParam,
    BoundParameter,
    ParamType,
    ParameterDef,
    ParameterSpec,
};
use super::{FunctionDefinition, GenericPolicy};
use crate::config::transform::TransformConfig;
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;
use crate::values::schema::RowSchema;

/// State available to a function factory.
#[derive(Debug)]
pub struct BindContext<'a> {
    pub definition: &'static FunctionDefinition,
    /// Resolved generic type.
    pub datatype: DataType,
    /// Bound inputs in declared order, defaults filled in.
    pub inputs: &'a [BoundParameter],
    pub outputs: &'a [BoundOutputParam],
    pub config: &'a TransformConfig,
}

impl BindContext<'_> {
    /// Get the input at `idx` if it's a constant.
    pub fn constant(&self, idx: usize) -> Option<&ScalarValue> {
        self.inputs.get(idx).and_then(|p| p.as_constant())
    }

    /// Get the input at `idx`, requiring that it's a constant.
    pub fn try_constant(&self, idx: usize) -> Result<&ScalarValue> {
        self.constant(idx).ok_or_else(|| {
            let name = self
                .definition
                .inputs
                .get(idx)
                .map(|def| def.name)
                .unwrap_or("?");
            RowflowError::binding("Parameter must be a constant")
                .with_field("function", self.definition.qualified_name())
                .with_field("parameter", name)
        })
    }

    /// Number of columns bound to the output at `idx`.
    pub fn output_len(&self, idx: usize) -> usize {
        self.outputs.get(idx).map(|o| o.columns().len()).unwrap_or(0)
    }
}

pub(crate) fn bind_function(
    descriptor: &FunctionDescriptor,
    schema: &RowSchema,
    generic_override: Option<DataType>,
    config: &TransformConfig,
) -> Result<BoundFunction> {
    let definition = descriptor.definition();
    let name = definition.qualified_name();

    let mut inputs = bind_inputs(definition, descriptor.inputs(), schema)
        .with_field("function", &name)?;

    let datatype = resolve_datatype(definition, &inputs, generic_override)
        .with_field("function", &name)?;

    for (def, param) in definition.inputs.iter().zip(inputs.iter_mut()) {
        let target = concrete_type(def.datatype, datatype);
        apply_type(param, target)
            .context_fn(|| format!("Failed to convert parameter '{}'", def.name))
            .with_field("function", &name)?;
    }

    let returns = match (descriptor.return_column(), definition.returns) {
        (Some(column), Some(ret)) => Some(BoundOutput {
            name: column.to_string(),
            datatype: output_type(ret, datatype)?,
        }),
        (Some(_), None) => {
            return Err(RowflowError::binding("Function has no return value")
                .with_field("function", &name));
        }
        (None, _) => None,
    };

    let outputs =
        bind_outputs(definition, descriptor.outputs(), datatype).with_field("function", &name)?;

    let links = bind_links(definition, &inputs, &outputs).with_field("function", &name)?;

    let context = BindContext {
        definition,
        datatype,
        inputs: &inputs,
        outputs: &outputs,
        config,
    };
    let function = (definition.factory)(&context).with_field("function", &name)?;
    if function.kind() != definition.kind {
        return Err(RowflowError::new("Function implementation has unexpected kind")
            .with_field("function", &name)
            .with_field("expected", definition.kind)
            .with_field("got", function.kind()));
    }

    debug!(function = %name, %datatype, kind = %definition.kind, "bound function");

    Ok(BoundFunction {
        definition,
        datatype,
        inputs,
        returns,
        outputs,
        links,
        function,
    })
}

fn bind_inputs(
    definition: &FunctionDefinition,
    specs: &[ParameterSpec],
    schema: &RowSchema,
) -> Result<Vec<BoundParameter>> {
    if specs.len() > definition.inputs.len() {
        return Err(RowflowError::binding("Too many input parameters")
            .with_field("expected", definition.inputs.len())
            .with_field("got", specs.len()));
    }

    definition
        .inputs
        .iter()
        .enumerate()
        .map(|(idx, def)| {
            let bound = match specs.get(idx) {
                Some(spec) => bind_input(def, spec, schema),
                None => match def.default {
                    Some(default) => Ok(BoundParameter::Constant(default.to_scalar())),
                    None => Err(RowflowError::binding("Missing required parameter")),
                },
            };
            bound.with_field("parameter", def.name)
        })
        .collect()
}

fn bind_input(
    def: &ParameterDef,
    spec: &ParameterSpec,
    schema: &RowSchema,
) -> Result<BoundParameter> {
    if let Arity::Single = def.arity {
        return bind_single(spec, schema);
    }

    Ok(match spec {
        ParameterSpec::Group(specs) => BoundParameter::Group(
            specs
                .iter()
                .map(|spec| bind_single(spec, schema))
                .collect::<Result<Vec<_>>>()?,
        ),
        ParameterSpec::Column(name) => {
            let (ordinal, column) = schema.try_column(name)?;
            if column.is_array() {
                BoundParameter::ArrayColumn {
                    ordinal,
                    datatype: column.datatype,
                    cast: None,
                }
            } else {
                BoundParameter::Group(vec![BoundParameter::Column {
                    ordinal,
                    datatype: column.datatype,
                    cast: None,
                }])
            }
        }
        ParameterSpec::Constant(ScalarValue::List(values)) => BoundParameter::Group(
            values
                .iter()
                .map(|v| BoundParameter::Constant(v.clone()))
                .collect(),
        ),
        other => BoundParameter::Group(vec![bind_single(other, schema)?]),
    })
}

fn bind_single(spec: &ParameterSpec, schema: &RowSchema) -> Result<BoundParameter> {
    match spec {
        ParameterSpec::Constant(value) => Ok(BoundParameter::Constant(value.clone())),
        ParameterSpec::Column(name) => {
            let (ordinal, column) = schema.try_column(name)?;
            if column.is_array() {
                return Err(RowflowError::binding(
                    "Array column cannot be bound to a single value parameter",
                )
                .with_field("column", name));
            }
            Ok(BoundParameter::Column {
                ordinal,
                datatype: column.datatype,
                cast: None,
            })
        }
        ParameterSpec::Variable(kind) => Ok(BoundParameter::Variable(*kind)),
        ParameterSpec::Group(_) => Err(RowflowError::binding(
            "Group spec cannot be bound to a single value parameter",
        )),
        ParameterSpec::OutputColumn(name) => {
            Err(RowflowError::binding("Output column spec used as an input")
                .with_field("column", name))
        }
    }
}

/// Resolve the generic type for the function.
///
/// Uses the override if given, otherwise the first column feeding a generic
/// parameter, otherwise the first generic constant.
fn resolve_datatype(
    definition: &FunctionDefinition,
    inputs: &[BoundParameter],
    generic_override: Option<DataType>,
) -> Result<DataType> {
    let resolved = match definition.generic {
        GenericPolicy::Fixed(fixed) => {
            if let Some(datatype) = generic_override {
                if datatype != fixed {
                    return Err(RowflowError::type_error(
                        "Generic override conflicts with fixed function type",
                    )
                    .with_field("expected", fixed)
                    .with_field("got", datatype));
                }
            }
            fixed
        }
        _ => {
            let generic_inputs = || {
                definition
                    .inputs
                    .iter()
                    .zip(inputs)
                    .filter(|(def, _)| def.datatype == ParamType::Generic)
                    .map(|(_, param)| param)
            };

            generic_override
                .or_else(|| generic_inputs().find_map(first_column_type))
                .or_else(|| generic_inputs().find_map(first_constant_type))
                .ok_or_else(|| {
                    RowflowError::type_error(
                        "Unable to resolve generic type, no typed column or constant inputs",
                    )
                })?
        }
    };

    if !definition.generic.accepts(resolved) {
        return Err(
            RowflowError::type_error("Type not supported by function")
                .with_field("datatype", resolved),
        );
    }

    Ok(resolved)
}

fn first_column_type(param: &BoundParameter) -> Option<DataType> {
    match param {
        BoundParameter::Column { datatype, .. } | BoundParameter::ArrayColumn { datatype, .. } => {
            Some(*datatype)
        }
        BoundParameter::Group(params) => params.iter().find_map(first_column_type),
        _ => None,
    }
}

fn first_constant_type(param: &BoundParameter) -> Option<DataType> {
    match param {
        BoundParameter::Constant(v) => v.datatype(),
        BoundParameter::Group(params) => params.iter().find_map(first_constant_type),
        _ => None,
    }
}

fn concrete_type(param: ParamType, generic: DataType) -> Option<DataType> {
    match param {
        ParamType::Generic => Some(generic),
        ParamType::Fixed(datatype) => Some(datatype),
        ParamType::Any => None,
    }
}

fn output_type(param: ParamType, generic: DataType) -> Result<DataType> {
    concrete_type(param, generic)
        .ok_or_else(|| RowflowError::new("Output parameters must have a concrete type"))
}

/// Convert constants to the parameter type, and record casts for columns.
fn apply_type(param: &mut BoundParameter, target: Option<DataType>) -> Result<()> {
    let target = match target {
        Some(target) => target,
        None => return Ok(()),
    };

    match param {
        BoundParameter::Constant(value) => {
            *value = value.cast_to(target)?;
        }
        BoundParameter::Column { datatype, cast, .. }
        | BoundParameter::ArrayColumn { datatype, cast, .. } => {
            if *datatype != target {
                *cast = Some(target);
            }
        }
        BoundParameter::Group(params) => {
            for param in params {
                apply_type(param, Some(target))?;
            }
        }
        BoundParameter::Variable(_) => (),
    }

    Ok(())
}

fn bind_outputs(
    definition: &FunctionDefinition,
    specs: &[ParameterSpec],
    generic: DataType,
) -> Result<Vec<BoundOutputParam>> {
    if specs.len() > definition.outputs.len() {
        return Err(RowflowError::binding("Too many output parameters")
            .with_field("expected", definition.outputs.len())
            .with_field("got", specs.len()));
    }

    definition
        .outputs
        .iter()
        .enumerate()
        .map(|(idx, def)| {
            let spec = match specs.get(idx) {
                Some(spec) => spec,
                None => return Ok(BoundOutputParam::Unused),
            };
            bind_output(def, spec, generic).with_field("parameter", def.name)
        })
        .collect()
}

fn bind_output(
    def: &ParameterDef,
    spec: &ParameterSpec,
    generic: DataType,
) -> Result<BoundOutputParam> {
    let datatype = output_type(def.datatype, generic)?;
    let output_name = |spec: &ParameterSpec| match spec {
        ParameterSpec::OutputColumn(name) => Ok(BoundOutput {
            name: name.clone(),
            datatype,
        }),
        _ => Err(RowflowError::binding("Expected an output column spec")),
    };

    match (def.arity, spec) {
        (Arity::Single, spec) => Ok(BoundOutputParam::Single(output_name(spec)?)),
        (Arity::Group { .. }, ParameterSpec::Group(specs)) => Ok(BoundOutputParam::Group(
            specs.iter().map(output_name).collect::<Result<Vec<_>>>()?,
        )),
        (Arity::Group { .. }, _) => Err(RowflowError::binding(
            "Group output requires a group of output column specs",
        )),
    }
}

/// Check linked group cardinalities.
///
/// Returns the links whose cardinality can only be checked per row.
fn bind_links(
    definition: &FunctionDefinition,
    inputs: &[BoundParameter],
    outputs: &[BoundOutputParam],
) -> Result<Vec<BoundLink>> {
    let mut links: IndexMap<&'static str, BoundLink> = IndexMap::new();

    for (idx, def) in definition.inputs.iter().enumerate() {
        if let Some(link) = def.link() {
            let entry = links.entry(link).or_insert_with(|| BoundLink::new(link));
            entry.inputs.push(idx);
            if inputs[idx].group_len().is_none() {
                entry.dynamic = true;
            }
        }
    }
    for (idx, def) in definition.outputs.iter().enumerate() {
        if let Some(link) = def.link() {
            if let BoundOutputParam::Unused = outputs[idx] {
                continue;
            }
            links
                .entry(link)
                .or_insert_with(|| BoundLink::new(link))
                .outputs
                .push(idx);
        }
    }

    for link in links.values() {
        let lens = link
            .inputs
            .iter()
            .filter_map(|&idx| inputs[idx].group_len())
            .chain(link.outputs.iter().filter_map(|&idx| outputs[idx].group_len()));

        let mut expected: Option<usize> = None;
        for len in lens {
            match expected {
                None => expected = Some(len),
                Some(expected) if expected != len => {
                    return Err(RowflowError::binding(
                        "Linked parameters have different cardinality",
                    )
                    .with_field("link", link.name)
                    .with_field("expected", expected)
                    .with_field("got", len));
                }
                Some(_) => (),
            }
        }
    }

    Ok(links.into_values().filter(|link| link.dynamic).collect())
}
