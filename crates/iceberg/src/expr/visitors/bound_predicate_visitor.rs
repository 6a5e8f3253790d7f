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

use fnv::FnvHashSet;

use crate::expr::{BoundPredicate, BoundReference, PredicateOperator};
use crate::spec::Datum;
use crate::{Error, ErrorKind, Result};

/// A visitor for [`BoundPredicate`]s. Visits in post-order: the children of a logical
/// node are visited before the node itself.
pub trait BoundPredicateVisitor {
    /// The return type of this visitor
    type T;

    /// Called when an `AlwaysTrue` predicate is visited
    fn always_true(&mut self) -> Result<Self::T>;

    /// Called when an `AlwaysFalse` predicate is visited
    fn always_false(&mut self) -> Result<Self::T>;

    /// Called after both sides of an `And` predicate are visited
    fn and(&mut self, lhs: Self::T, rhs: Self::T) -> Result<Self::T>;

    /// Called after both sides of an `Or` predicate are visited
    fn or(&mut self, lhs: Self::T, rhs: Self::T) -> Result<Self::T>;

    /// Called after the child of a `Not` predicate is visited
    fn not(&mut self, inner: Self::T) -> Result<Self::T>;

    /// `reference IS NULL`
    fn is_null(&mut self, reference: &BoundReference, predicate: &BoundPredicate)
    -> Result<Self::T>;

    /// `reference IS NOT NULL`
    fn not_null(
        &mut self,
        reference: &BoundReference,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference < literal`
    fn less_than(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference <= literal`
    fn less_than_or_eq(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference > literal`
    fn greater_than(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference >= literal`
    fn greater_than_or_eq(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference = literal`
    fn eq(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference != literal`
    fn not_eq(
        &mut self,
        reference: &BoundReference,
        literal: &Datum,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference IN (literals)`
    fn r#in(
        &mut self,
        reference: &BoundReference,
        literals: &FnvHashSet<Datum>,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;

    /// `reference NOT IN (literals)`
    fn not_in(
        &mut self,
        reference: &BoundReference,
        literals: &FnvHashSet<Datum>,
        predicate: &BoundPredicate,
    ) -> Result<Self::T>;
}

fn unexpected_op(kind: &str, op: PredicateOperator) -> Error {
    Error::new(
        ErrorKind::Unexpected,
        format!("Unexpected op for {kind} predicate: {op}"),
    )
}

/// Visits a [`BoundPredicate`] with the provided visitor, in post-order.
pub(crate) fn visit<V: BoundPredicateVisitor>(
    visitor: &mut V,
    predicate: &BoundPredicate,
) -> Result<V::T> {
    match predicate {
        BoundPredicate::AlwaysTrue => visitor.always_true(),
        BoundPredicate::AlwaysFalse => visitor.always_false(),
        BoundPredicate::And(expr) => {
            let [lhs, rhs] = expr.inputs();
            let lhs = visit(visitor, lhs)?;
            let rhs = visit(visitor, rhs)?;
            visitor.and(lhs, rhs)
        }
        BoundPredicate::Or(expr) => {
            let [lhs, rhs] = expr.inputs();
            let lhs = visit(visitor, lhs)?;
            let rhs = visit(visitor, rhs)?;
            visitor.or(lhs, rhs)
        }
        BoundPredicate::Not(expr) => {
            let [inner] = expr.inputs();
            let inner = visit(visitor, inner)?;
            visitor.not(inner)
        }
        BoundPredicate::Unary(expr) => match expr.op() {
            PredicateOperator::IsNull => visitor.is_null(expr.term(), predicate),
            PredicateOperator::NotNull => visitor.not_null(expr.term(), predicate),
            op => Err(unexpected_op("unary", op)),
        },
        BoundPredicate::Binary(expr) => {
            let reference = expr.term();
            let literal = expr.literal();
            match expr.op() {
                PredicateOperator::LessThan => visitor.less_than(reference, literal, predicate),
                PredicateOperator::LessThanOrEq => {
                    visitor.less_than_or_eq(reference, literal, predicate)
                }
                PredicateOperator::GreaterThan => {
                    visitor.greater_than(reference, literal, predicate)
                }
                PredicateOperator::GreaterThanOrEq => {
                    visitor.greater_than_or_eq(reference, literal, predicate)
                }
                PredicateOperator::Eq => visitor.eq(reference, literal, predicate),
                PredicateOperator::NotEq => visitor.not_eq(reference, literal, predicate),
                op => Err(unexpected_op("binary", op)),
            }
        }
        BoundPredicate::Set(expr) => {
            let reference = expr.term();
            let literals = expr.literals();
            match expr.op() {
                PredicateOperator::In => visitor.r#in(reference, literals, predicate),
                PredicateOperator::NotIn => visitor.not_in(reference, literals, predicate),
                op => Err(unexpected_op("set", op)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Not;
    use std::sync::Arc;

    use fnv::FnvHashSet;
    use pretty_assertions::assert_eq;

    use super::{BoundPredicateVisitor, visit};
    use crate::expr::{Bind, BoundPredicate, BoundReference, Predicate, Reference};
    use crate::spec::{Datum, NestedField, PrimitiveType, Schema, SchemaRef, Type};

    /// Records each callback it receives, so tests can check visiting order.
    #[derive(Default)]
    struct RecordingVisitor {
        calls: Vec<String>,
    }

    impl RecordingVisitor {
        fn leaf(&mut self, name: &str, reference: &BoundReference) -> crate::Result<bool> {
            self.calls.push(format!("{name}({reference})"));
            Ok(true)
        }
    }

    impl BoundPredicateVisitor for RecordingVisitor {
        type T = bool;

        fn always_true(&mut self) -> crate::Result<bool> {
            self.calls.push("true".to_string());
            Ok(true)
        }

        fn always_false(&mut self) -> crate::Result<bool> {
            self.calls.push("false".to_string());
            Ok(false)
        }

        fn and(&mut self, lhs: bool, rhs: bool) -> crate::Result<bool> {
            self.calls.push("and".to_string());
            Ok(lhs && rhs)
        }

        fn or(&mut self, lhs: bool, rhs: bool) -> crate::Result<bool> {
            self.calls.push("or".to_string());
            Ok(lhs || rhs)
        }

        fn not(&mut self, inner: bool) -> crate::Result<bool> {
            self.calls.push("not".to_string());
            Ok(!inner)
        }

        fn is_null(
            &mut self,
            reference: &BoundReference,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("is_null", reference)
        }

        fn not_null(
            &mut self,
            reference: &BoundReference,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("not_null", reference)
        }

        fn less_than(
            &mut self,
            reference: &BoundReference,
            _literal: &Datum,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("lt", reference)
        }

        fn less_than_or_eq(
            &mut self,
            reference: &BoundReference,
            _literal: &Datum,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("lt_eq", reference)
        }

        fn greater_than(
            &mut self,
            reference: &BoundReference,
            _literal: &Datum,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("gt", reference)
        }

        fn greater_than_or_eq(
            &mut self,
            reference: &BoundReference,
            _literal: &Datum,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("gt_eq", reference)
        }

        fn eq(
            &mut self,
            reference: &BoundReference,
            _literal: &Datum,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("eq", reference)
        }

        fn not_eq(
            &mut self,
            reference: &BoundReference,
            _literal: &Datum,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("not_eq", reference)
        }

        fn r#in(
            &mut self,
            reference: &BoundReference,
            _literals: &FnvHashSet<Datum>,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("in", reference)
        }

        fn not_in(
            &mut self,
            reference: &BoundReference,
            _literals: &FnvHashSet<Datum>,
            _predicate: &BoundPredicate,
        ) -> crate::Result<bool> {
            self.leaf("not_in", reference)
        }
    }

    fn create_test_schema() -> SchemaRef {
        Arc::new(
            Schema::builder()
                .with_fields(vec![
                    NestedField::optional(1, "a", Type::Primitive(PrimitiveType::Int)).into(),
                    NestedField::optional(2, "b", Type::Primitive(PrimitiveType::Long)).into(),
                ])
                .build()
                .unwrap(),
        )
    }

    fn visit_unbound(predicate: Predicate) -> (bool, Vec<String>) {
        let bound = predicate.bind(create_test_schema(), true).unwrap();
        let mut visitor = RecordingVisitor::default();
        let result = visit(&mut visitor, &bound).unwrap();
        (result, visitor.calls)
    }

    #[test]
    fn test_always_true_and_false() {
        assert_eq!(visit_unbound(Predicate::AlwaysTrue), (true, vec![
            "true".to_string()
        ]));
        assert_eq!(visit_unbound(Predicate::AlwaysFalse), (false, vec![
            "false".to_string()
        ]));
    }

    #[test]
    fn test_logical_nodes_are_visited_post_order() {
        let predicate = Reference::new("a")
            .less_than(Datum::int(10))
            .and(Reference::new("b").is_null().not())
            .or(Reference::new("a").is_in([Datum::int(1), Datum::int(2)]));

        let (result, calls) = visit_unbound(predicate);

        assert!(result);
        assert_eq!(calls, vec![
            "lt(a)", "is_null(b)", "not", "and", "in(a)", "or"
        ]);
    }

    #[test]
    fn test_every_leaf_operator_is_dispatched() {
        let cases = [
            (Reference::new("a").is_not_null(), "not_null(a)"),
            (
                Reference::new("a").less_than_or_equal_to(Datum::int(1)),
                "lt_eq(a)",
            ),
            (Reference::new("a").greater_than(Datum::int(1)), "gt(a)"),
            (
                Reference::new("a").greater_than_or_equal_to(Datum::int(1)),
                "gt_eq(a)",
            ),
            (Reference::new("b").equal_to(Datum::long(1)), "eq(b)"),
            (Reference::new("b").not_equal_to(Datum::long(1)), "not_eq(b)"),
            (
                Reference::new("b").is_not_in([Datum::long(1)]),
                "not_in(b)",
            ),
        ];

        for (predicate, expected) in cases {
            let (_, calls) = visit_unbound(predicate);
            assert_eq!(calls, vec![expected.to_string()]);
        }
    }
}
