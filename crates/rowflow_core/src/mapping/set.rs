use std::collections::BTreeMap;

use rowflow_error::{Result, RowflowError};
use tracing::{debug, trace};

use super::{InputRow, Mapping, MappingKind};
use crate::config::transform::TransformConfig;
use crate::functions::parameter::ExecutionVariables;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;
use crate::values::scalar::key::ScalarKey;
use crate::values::schema::RowSchema;

/// Drives a list of mappings as one pipeline stage.
///
/// For each input row the set:
///
/// 1. Reads series keys, feeding the series key variable.
/// 2. Applies filters, joins and conditions, dropping rejected rows before
///    they reach any group state.
/// 3. Reads group values. A change in group values ends the current group,
///    emitting its result rows and resetting every mapping.
/// 4. Runs the remaining mappings in order.
/// 5. Emits the output row, or the rows generated from it.
///
/// Sets containing aggregating mappings only emit result rows, one per
/// result index for the group. Each result row starts from the output row
/// at the same position in the group, or the last output row if the group
/// had fewer rows. Sets with a series mapping keep the first output row of
/// each distinct series key instead, in key order, so result row `i` lines
/// up with position `i` of the series functions.
#[derive(Debug)]
pub struct MappingSet {
    mappings: Vec<Box<dyn Mapping>>,
    output_schema: RowSchema,
    initialized: bool,
    aggregating: bool,
    row_index: u64,
    /// Group values of the current group, None before the first row.
    group: Option<Vec<ScalarKey>>,
    /// Output rows of the current group, kept for aggregating sets.
    group_rows: Vec<Row>,
    /// If any mapping reads series keys.
    series: bool,
    /// First output row per series key of the current group.
    series_rows: BTreeMap<ScalarKey, Row>,
}

impl MappingSet {
    pub fn new(mappings: Vec<Box<dyn Mapping>>) -> Self {
        MappingSet {
            mappings,
            output_schema: RowSchema::new(),
            initialized: false,
            aggregating: false,
            row_index: 0,
            group: None,
            group_rows: Vec::new(),
            series: false,
            series_rows: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, mapping: impl Mapping + 'static) {
        self.mappings.push(Box::new(mapping));
    }

    pub fn output_schema(&self) -> &RowSchema {
        &self.output_schema
    }

    /// Resolve every mapping against the input schemas and build the output
    /// schema.
    pub fn initialize(
        &mut self,
        input: &RowSchema,
        join: Option<&RowSchema>,
        config: &TransformConfig,
    ) -> Result<&RowSchema> {
        let mut output = RowSchema::new();
        for mapping in &mut self.mappings {
            mapping.initialize_input_ordinals(input, join, config)?;
            mapping.add_output_columns(&mut output)?;
        }

        self.aggregating = self.mappings.iter().any(|m| m.is_aggregating());
        self.series = self
            .mappings
            .iter()
            .any(|m| m.kind() == MappingKind::Series);
        self.output_schema = output;
        self.initialized = true;
        self.row_index = 0;
        self.group = None;
        self.group_rows.clear();
        self.series_rows.clear();

        debug!(
            mappings = self.mappings.len(),
            columns = self.output_schema.len(),
            aggregating = self.aggregating,
            "initialized mapping set"
        );

        Ok(&self.output_schema)
    }

    /// Process one input row, returning the rows it produces.
    pub fn process_row(&mut self, row: &Row, join: Option<&Row>) -> Result<Vec<Row>> {
        if !self.initialized {
            return Err(RowflowError::new("Mapping set not initialized"));
        }

        let mut vars = ExecutionVariables {
            row_index: self.row_index,
            series_key: None,
        };
        self.row_index += 1;

        let mut input = InputRow::new(row, &vars);
        input.join = join;

        for mapping in self.with_kinds(&[MappingKind::Series]) {
            mapping.process_input_row(&input)?;
        }
        vars.series_key = self
            .mappings
            .iter()
            .find_map(|m| m.series_value())
            .cloned();

        let mut input = InputRow::new(row, &vars);
        input.join = join;

        for mapping in self.with_kinds(&[MappingKind::Filter, MappingKind::Join]) {
            if !mapping.process_input_row(&input)? {
                trace!(row_index = vars.row_index, "row rejected");
                return Ok(Vec::new());
            }
        }
        for mapping in self.mappings.iter_mut().filter(|m| m.is_condition()) {
            if !mapping.process_input_row(&input)? {
                trace!(row_index = vars.row_index, "row rejected by condition");
                return Ok(Vec::new());
            }
        }

        let mut emitted = Vec::new();

        for mapping in self.with_kinds(&[MappingKind::Group]) {
            mapping.process_input_row(&input)?;
        }
        let group: Vec<_> = self
            .mappings
            .iter()
            .filter_map(|m| m.group_value())
            .map(|v| ScalarKey(v.clone()))
            .collect();
        if self.group.as_ref().is_some_and(|current| *current != group) {
            trace!(row_index = vars.row_index, "group boundary");
            emitted.extend(self.end_group()?);
        }
        self.group = Some(group);

        const HANDLED: &[MappingKind] = &[
            MappingKind::Series,
            MappingKind::Filter,
            MappingKind::Join,
            MappingKind::Group,
        ];
        for mapping in &mut self.mappings {
            if HANDLED.contains(&mapping.kind()) || mapping.is_condition() {
                continue;
            }
            mapping.process_input_row(&input)?;
        }

        let mut output = Row::new_null(self.output_schema.len());
        for mapping in &mut self.mappings {
            mapping.process_output_row(&mut output)?;
        }

        if self.aggregating {
            if self.series {
                let key = ScalarKey(vars.series_key.clone().unwrap_or(ScalarValue::Null));
                self.series_rows.entry(key).or_insert(output);
            } else {
                self.group_rows.push(output);
            }
            return Ok(emitted);
        }

        let generators: Vec<_> = (0..self.mappings.len())
            .filter(|&idx| self.mappings[idx].is_generator())
            .collect();
        if generators.is_empty() {
            emitted.push(output);
            return Ok(emitted);
        }

        for idx in generators {
            let mut generated = output.clone();
            while self.mappings[idx].next_generated_row(&input, &mut generated)? {
                emitted.push(generated.clone());
            }
        }

        Ok(emitted)
    }

    /// End the input stream, returning the result rows of the last group.
    pub fn finish(&mut self) -> Result<Vec<Row>> {
        let rows = self.end_group()?;
        self.group = None;
        Ok(rows)
    }

    fn end_group(&mut self) -> Result<Vec<Row>> {
        let rows = if self.series {
            std::mem::take(&mut self.series_rows).into_values().collect()
        } else {
            std::mem::take(&mut self.group_rows)
        };
        let mut results = Vec::new();

        if self.aggregating {
            if let Some(last) = rows.last() {
                let count = self
                    .mappings
                    .iter()
                    .map(|m| m.result_count())
                    .max()
                    .unwrap_or(0);

                for index in 0..count {
                    let mut row = rows.get(index).unwrap_or(last).clone();
                    for mapping in &mut self.mappings {
                        mapping.process_result_row(index, &mut row)?;
                    }
                    results.push(row);
                }
            }
        }

        for mapping in &mut self.mappings {
            mapping.reset();
        }

        Ok(results)
    }

    fn with_kinds<'a>(
        &'a mut self,
        kinds: &'a [MappingKind],
    ) -> impl Iterator<Item = &'a mut Box<dyn Mapping>> + 'a {
        self.mappings
            .iter_mut()
            .filter(move |m| kinds.contains(&m.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::catalog::FunctionCatalog;
    use crate::functions::condition::CompareOperator;
    use crate::functions::descriptor::FunctionDescriptor;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::schema;
    use crate::mapping::testutil::run;
    use crate::mapping::{
        MapAggregate,
        MapColumn,
        MapFilter,
        MapFunction,
        MapGroup,
        MapJoin,
        MapSeries,
        SeriesGrain,
    };
    use crate::values::datatype::DataType;

    fn descriptor(name: &str) -> FunctionDescriptor {
        FunctionCatalog::builtin().resolve(name).unwrap()
    }

    #[test]
    fn sum_per_group() {
        logutil::init_test();
        let input = schema(&[("region", DataType::Utf8), ("amount", DataType::Int64)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapGroup::column("region", "region")),
            Box::new(MapAggregate::new(
                descriptor("aggregate.sum")
                    .with_input(ParameterSpec::column("amount"))
                    .with_return("total"),
            )),
        ]);
        set.initialize(&input, None, &TransformConfig::default())
            .unwrap();
        assert_eq!(
            vec!["region", "total"],
            set.output_schema().names().collect::<Vec<_>>()
        );

        let got = run(
            &mut set,
            vec![
                vec!["east".into(), 1_i64.into()],
                vec!["east".into(), 2_i64.into()],
                vec!["west".into(), 5_i64.into()],
                vec!["east".into(), 7_i64.into()],
            ],
        );
        assert_eq!(
            vec![
                vec![ScalarValue::from("east"), ScalarValue::Int64(3)],
                vec![ScalarValue::from("west"), ScalarValue::Int64(5)],
                vec![ScalarValue::from("east"), ScalarValue::Int64(7)],
            ],
            got
        );
    }

    #[test]
    fn positional_results_per_group() {
        let input = schema(&[("k", DataType::Utf8), ("v", DataType::Int32)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapGroup::column("k", "k")),
            Box::new(MapColumn::column("v", "v")),
            Box::new(MapAggregate::new(
                descriptor("aggregate.rank")
                    .with_input(ParameterSpec::column("v"))
                    .with_return("r"),
            )),
        ]);
        set.initialize(&input, None, &TransformConfig::default())
            .unwrap();

        let got = run(
            &mut set,
            vec![
                vec!["a".into(), ScalarValue::Int32(5)],
                vec!["a".into(), ScalarValue::Int32(3)],
                vec!["b".into(), ScalarValue::Int32(1)],
            ],
        );
        assert_eq!(
            vec![
                vec!["a".into(), ScalarValue::Int32(5), ScalarValue::Int64(2)],
                vec!["a".into(), ScalarValue::Int32(3), ScalarValue::Int64(1)],
                vec!["b".into(), ScalarValue::Int32(1), ScalarValue::Int64(1)],
            ],
            got
        );
    }

    #[test]
    fn filter_then_fan_out() {
        let input = schema(&[("id", DataType::Int32), ("tags", DataType::Utf8)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapColumn::column("id", "id")),
            Box::new(MapFunction::new(
                descriptor("rows.split_rows")
                    .with_input(ParameterSpec::column("tags"))
                    .with_return("tag"),
            )),
            Box::new(MapFilter::new(
                "id",
                CompareOperator::GreaterThan,
                ParameterSpec::constant(1),
            )),
        ]);
        set.initialize(&input, None, &TransformConfig::default())
            .unwrap();

        let got = run(
            &mut set,
            vec![
                vec![ScalarValue::Int32(1), "a,b".into()],
                vec![ScalarValue::Int32(2), "x,y".into()],
                vec![ScalarValue::Int32(3), ScalarValue::Null],
            ],
        );
        assert_eq!(
            vec![
                vec![ScalarValue::Int32(2), ScalarValue::from("x")],
                vec![ScalarValue::Int32(2), ScalarValue::from("y")],
            ],
            got
        );
    }

    #[test]
    fn condition_gates_output() {
        let input = schema(&[("v", DataType::Int32)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapFunction::new(
                descriptor("condition.is_null").with_input(ParameterSpec::column("v")),
            ).negated()),
            Box::new(MapColumn::column("v", "v")),
        ]);
        set.initialize(&input, None, &TransformConfig::default())
            .unwrap();

        let got = run(
            &mut set,
            vec![vec![ScalarValue::Int32(1)], vec![ScalarValue::Null], vec![ScalarValue::Int32(3)]],
        );
        assert_eq!(
            vec![vec![ScalarValue::Int32(1)], vec![ScalarValue::Int32(3)]],
            got
        );
    }

    #[test]
    fn series_keys_feed_series_functions() {
        logutil::init_test();
        let input = schema(&[("ts", DataType::Utf8), ("v", DataType::Int64)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapFunction::new(
                descriptor("series.moving_sum")
                    .with_input(ParameterSpec::column("v"))
                    .with_input(ParameterSpec::constant(1))
                    .with_return("ms"),
            )),
            Box::new(MapSeries::new("ts", SeriesGrain::Day)),
        ]);
        set.initialize(&input, None, &TransformConfig::default())
            .unwrap();

        let got = run(
            &mut set,
            vec![
                vec!["2024-01-02 08:00:00".into(), 2_i64.into()],
                vec!["2024-01-01".into(), 1_i64.into()],
                vec!["2024-01-03".into(), 3_i64.into()],
            ],
        );
        assert_eq!(
            vec![
                vec![ScalarValue::Int64(1)],
                vec![ScalarValue::Int64(3)],
                vec![ScalarValue::Int64(5)],
            ],
            got
        );
    }

    #[test]
    fn series_results_follow_key_order() {
        let input = schema(&[("ts", DataType::Utf8), ("v", DataType::Int64)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapSeries::new("ts", SeriesGrain::Day).with_output("day")),
            Box::new(MapColumn::column("v", "v")),
            Box::new(MapFunction::new(
                descriptor("series.moving_sum")
                    .with_input(ParameterSpec::column("v"))
                    .with_input(ParameterSpec::constant(1))
                    .with_return("ms"),
            )),
        ]);
        set.initialize(&input, None, &TransformConfig::default())
            .unwrap();

        let got = run(
            &mut set,
            vec![
                vec!["2024-01-02".into(), 20_i64.into()],
                vec!["2024-01-01".into(), 10_i64.into()],
                vec!["2024-01-01 12:00:00".into(), 5_i64.into()],
            ],
        );
        let day = |s: &str| SeriesGrain::Day.normalize(&s.into()).unwrap();
        assert_eq!(
            vec![
                vec![day("2024-01-01"), ScalarValue::Int64(10), ScalarValue::Int64(15)],
                vec![day("2024-01-02"), ScalarValue::Int64(20), ScalarValue::Int64(35)],
            ],
            got
        );
    }

    #[test]
    fn condition_before_aggregate() {
        let input = schema(&[("k", DataType::Utf8), ("v", DataType::Int64)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapGroup::column("k", "k")),
            Box::new(MapAggregate::new(
                descriptor("aggregate.sum")
                    .with_input(ParameterSpec::column("v"))
                    .with_return("total"),
            )),
            Box::new(MapFunction::new(
                descriptor("condition.greater_than")
                    .with_input(ParameterSpec::column("v"))
                    .with_input(ParameterSpec::constant(1_i64)),
            )),
        ]);
        set.initialize(&input, None, &TransformConfig::default())
            .unwrap();

        let got = run(
            &mut set,
            vec![
                vec!["a".into(), 1_i64.into()],
                vec!["a".into(), 5_i64.into()],
                vec!["b".into(), 1_i64.into()],
            ],
        );
        assert_eq!(
            vec![vec![ScalarValue::from("a"), ScalarValue::Int64(5)]],
            got
        );
    }

    #[test]
    fn join_rows() {
        let input = schema(&[("id", DataType::Int32)]);
        let join = schema(&[("owner", DataType::Int32)]);
        let mut set = MappingSet::new(vec![
            Box::new(MapJoin::new("id", CompareOperator::Equal, "owner")),
            Box::new(MapColumn::column("id", "id")),
        ]);
        set.initialize(&input, Some(&join), &TransformConfig::default())
            .unwrap();

        let row = Row::from(vec![ScalarValue::Int32(1)]);
        let matched = set
            .process_row(&row, Some(&Row::from(vec![ScalarValue::Int32(1)])))
            .unwrap();
        assert_eq!(vec![row.clone()], matched);

        let unmatched = set
            .process_row(&row, Some(&Row::from(vec![ScalarValue::Int32(2)])))
            .unwrap();
        assert!(unmatched.is_empty());
    }

    #[test]
    fn process_before_initialize() {
        let mut set = MappingSet::new(Vec::new());
        set.push(MapColumn::constant(1, "one"));
        let err = set.process_row(&Row::from(Vec::new()), None).unwrap_err();
        assert_eq!("Mapping set not initialized", err.get_msg());

        set.initialize(&RowSchema::new(), None, &TransformConfig::default())
            .unwrap();
        let rows = set.process_row(&Row::from(Vec::new()), None).unwrap();
        assert_eq!(vec![Row::from(vec![ScalarValue::Int32(1)])], rows);
    }
}
