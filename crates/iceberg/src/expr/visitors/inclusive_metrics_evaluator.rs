// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashMap;

use fnv::FnvHashSet;
use serde_bytes::ByteBuf;

use crate::expr::visitors::bound_predicate_visitor::{BoundPredicateVisitor, visit};
use crate::expr::{Bind, BoundPredicate, BoundReference, Predicate};
use crate::spec::{Datum, FileMetrics, PrimitiveType, Schema, SchemaRef};
use crate::{Error, ErrorKind};

const ROWS_MIGHT_MATCH: crate::Result<bool> = Ok(true);
const ROWS_CANNOT_MATCH: crate::Result<bool> = Ok(false);

/// Evaluates a filter against the column statistics of a data file.
///
/// The answer is inclusive: `true` means some row in the file *might* match, `false` means no
/// row can. Missing statistics never rule a file out.
///
/// The filter is bound once, so one evaluator can be shared across tasks and used to test many
/// files concurrently.
#[derive(Debug, Clone)]
pub struct InclusiveMetricsEvaluator {
    schema: SchemaRef,
    filter: BoundPredicate,
}

impl InclusiveMetricsEvaluator {
    /// Creates an evaluator for `filter`. `Not` nodes are rewritten away before the filter is
    /// bound to `schema`.
    pub fn new(schema: SchemaRef, filter: Predicate, case_sensitive: bool) -> crate::Result<Self> {
        let filter = filter.rewrite_not().bind(schema.clone(), case_sensitive)?;
        Ok(Self { schema, filter })
    }

    /// The bound filter this evaluator tests files against.
    pub fn filter(&self) -> &BoundPredicate {
        &self.filter
    }

    /// Test whether the file described by `metrics` may contain rows matching the filter.
    pub fn eval<M: FileMetrics + ?Sized>(&self, metrics: &M) -> crate::Result<bool> {
        if metrics.record_count() <= 0 {
            return ROWS_CANNOT_MATCH;
        }

        let mut visitor = MetricsVisitor {
            schema: &self.schema,
            value_counts: metrics.value_counts(),
            null_counts: metrics.null_value_counts(),
            lower_bounds: metrics.lower_bounds(),
            upper_bounds: metrics.upper_bounds(),
        };
        visit(&mut visitor, &self.filter)
    }
}

/// Traversal state for a single [`InclusiveMetricsEvaluator::eval`] call.
struct MetricsVisitor<'a> {
    schema: &'a Schema,
    value_counts: &'a HashMap<i32, u64>,
    null_counts: &'a HashMap<i32, u64>,
    lower_bounds: &'a HashMap<i32, ByteBuf>,
    upper_bounds: &'a HashMap<i32, ByteBuf>,
}

impl MetricsVisitor<'_> {
    /// Statistics are only kept for top-level columns, so a predicate on anything else can
    /// not be evaluated here.
    fn field_id(&self, reference: &BoundReference) -> crate::Result<i32> {
        let id = reference.field().id;
        if self.schema.as_struct().field_by_id(id).is_none() {
            return Err(Error::new(
                ErrorKind::Binding,
                format!("Cannot filter by nested column: {reference}"),
            )
            .with_context("field_id", id.to_string()));
        }
        Ok(id)
    }

    fn primitive_type<'r>(&self, reference: &'r BoundReference) -> crate::Result<&'r PrimitiveType> {
        reference
            .field()
            .field_type
            .as_primitive_type()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::Binding,
                    format!("Cannot compare bounds of non-primitive column: {reference}"),
                )
            })
    }

    fn decode(
        &self,
        reference: &BoundReference,
        bytes: Option<&ByteBuf>,
    ) -> crate::Result<Option<Datum>> {
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let data_type = self.primitive_type(reference)?;
        Datum::try_from_bytes(bytes, data_type.clone())
            .map(Some)
            .map_err(|e| e.with_context("column", reference.to_string()))
    }

    fn lower_bound(&self, reference: &BoundReference) -> crate::Result<Option<Datum>> {
        let id = self.field_id(reference)?;
        self.decode(reference, self.lower_bounds.get(&id))
    }

    fn upper_bound(&self, reference: &BoundReference) -> crate::Result<Option<Datum>> {
        let id = self.field_id(reference)?;
        self.decode(reference, self.upper_bounds.get(&id))
    }

    /// Rows cannot match when the known bound satisfies `cannot_match(bound, literal)`.
    fn visit_bound(
        &self,
        bound: Option<Datum>,
        literal: &Datum,
        cannot_match: fn(&Datum, &Datum) -> bool,
    ) -> crate::Result<bool> {
        match bound {
            Some(bound) if cannot_match(&bound, literal) => ROWS_CANNOT_MATCH,
            _ => ROWS_MIGHT_MATCH,
        }
    }
}

impl BoundPredicateVisitor for MetricsVisitor<'_> {
    type T = bool;

    fn always_true(&mut self) -> crate::Result<bool> {
        ROWS_MIGHT_MATCH
    }

    fn always_false(&mut self) -> crate::Result<bool> {
        ROWS_CANNOT_MATCH
    }

    fn and(&mut self, lhs: bool, rhs: bool) -> crate::Result<bool> {
        Ok(lhs && rhs)
    }

    fn or(&mut self, lhs: bool, rhs: bool) -> crate::Result<bool> {
        Ok(lhs || rhs)
    }

    fn not(&mut self, inner: bool) -> crate::Result<bool> {
        Ok(!inner)
    }

    fn is_null(
        &mut self,
        reference: &BoundReference,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        let id = self.field_id(reference)?;
        match self.null_counts.get(&id) {
            Some(0) => ROWS_CANNOT_MATCH,
            _ => ROWS_MIGHT_MATCH,
        }
    }

    fn not_null(
        &mut self,
        reference: &BoundReference,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        let id = self.field_id(reference)?;
        match (self.value_counts.get(&id), self.null_counts.get(&id)) {
            (Some(values), Some(nulls)) if values == nulls => {
                ROWS_CANNOT_MATCH
            }
            _ => ROWS_MIGHT_MATCH,
        }
    }

    fn less_than(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        let lower = self.lower_bound(reference)?;
        self.visit_bound(lower, literal, |lower, v| lower >= v)
    }

    fn less_than_or_eq(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        let lower = self.lower_bound(reference)?;
        self.visit_bound(lower, literal, |lower, v| lower > v)
    }

    fn greater_than(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        let upper = self.upper_bound(reference)?;
        self.visit_bound(upper, literal, |upper, v| upper <= v)
    }

    fn greater_than_or_eq(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        let upper = self.upper_bound(reference)?;
        self.visit_bound(upper, literal, |upper, v| upper < v)
    }

    fn eq(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        let lower = self.lower_bound(reference)?;
        if !self.visit_bound(lower, literal, |lower, v| lower > v)? {
            return ROWS_CANNOT_MATCH;
        }

        let upper = self.upper_bound(reference)?;
        self.visit_bound(upper, literal, |upper, v| upper < v)
    }

    fn not_eq(
        &mut self,
        reference: &BoundReference,
        _literal: &Datum,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        // Min/max bounds can not prove that every row equals the literal.
        self.field_id(reference)?;
        ROWS_MIGHT_MATCH
    }

    fn r#in(
        &mut self,
        reference: &BoundReference,
        _literals: &FnvHashSet<Datum>,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        self.field_id(reference)?;
        ROWS_MIGHT_MATCH
    }

    fn not_in(
        &mut self,
        reference: &BoundReference,
        _literals: &FnvHashSet<Datum>,
        _predicate: &BoundPredicate,
    ) -> crate::Result<bool> {
        self.field_id(reference)?;
        ROWS_MIGHT_MATCH
    }
}
