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

//! This module contains predicate expressions.
//! Predicate expressions are used to filter data, and evaluates to a boolean value. For example,
//! `a > 10` is a predicate expression, and it evaluates to `true` if `a` is greater than `10`,

use std::fmt::{Debug, Display, Formatter};
use std::ops::Not;

use fnv::FnvHashSet;

use crate::error::Result;
use crate::expr::{Bind, BoundReference, PredicateOperator, Reference};
use crate::spec::{Datum, PrimitiveType, SchemaRef};
use crate::{Error, ErrorKind};

/// Logical expression, such as `AND`, `OR`, `NOT`.
#[derive(PartialEq, Clone)]
pub struct LogicalExpression<T, const N: usize> {
    inputs: [Box<T>; N],
}

impl<T: Debug, const N: usize> Debug for LogicalExpression<T, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalExpression")
            .field("inputs", &self.inputs)
            .finish()
    }
}

impl<T, const N: usize> LogicalExpression<T, N> {
    fn new(inputs: [Box<T>; N]) -> Self {
        Self { inputs }
    }

    /// Return inputs of this logical expression.
    pub fn inputs(&self) -> [&T; N] {
        let mut ret: [&T; N] = [self.inputs[0].as_ref(); N];
        for (i, item) in ret.iter_mut().enumerate() {
            *item = &self.inputs[i];
        }
        ret
    }
}

/// Unary predicate, for example, `a IS NULL`.
#[derive(PartialEq, Clone)]
pub struct UnaryExpression<T> {
    /// Operator of this predicate, must be single operand operator.
    op: PredicateOperator,
    /// Term of this predicate, for example, `a` in `a IS NULL`.
    term: T,
}

impl<T: Debug> Debug for UnaryExpression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnaryExpression")
            .field("op", &self.op)
            .field("term", &self.term)
            .finish()
    }
}

impl<T: Display> Display for UnaryExpression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.term, self.op)
    }
}

impl<T> UnaryExpression<T> {
    pub(crate) fn new(op: PredicateOperator, term: T) -> Self {
        debug_assert!(op.is_unary());
        Self { op, term }
    }

    /// Return the operator of this predicate.
    pub fn op(&self) -> PredicateOperator {
        self.op
    }

    /// Return the term of this predicate.
    pub fn term(&self) -> &T {
        &self.term
    }
}

/// Binary predicate, for example, `a > 10`.
#[derive(PartialEq, Clone)]
pub struct BinaryExpression<T> {
    /// Operator of this predicate, must be binary operator, such as `=`, `>`, `<`, etc.
    op: PredicateOperator,
    /// Term of this predicate, for example, `a` in `a > 10`.
    term: T,
    /// Literal of this predicate, for example, `10` in `a > 10`.
    literal: Datum,
}

impl<T: Debug> Debug for BinaryExpression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryExpression")
            .field("op", &self.op)
            .field("term", &self.term)
            .field("literal", &self.literal)
            .finish()
    }
}

impl<T> BinaryExpression<T> {
    pub(crate) fn new(op: PredicateOperator, term: T, literal: Datum) -> Self {
        debug_assert!(op.is_binary());
        Self { op, term, literal }
    }

    /// Return the operator of this predicate.
    pub fn op(&self) -> PredicateOperator {
        self.op
    }

    /// Return the term of this predicate.
    pub fn term(&self) -> &T {
        &self.term
    }

    /// Return the literal of this predicate.
    pub fn literal(&self) -> &Datum {
        &self.literal
    }
}

impl<T: Display> Display for BinaryExpression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.term, self.op, self.literal)
    }
}

/// Set predicates, for example, `a in (1, 2, 3)`.
#[derive(PartialEq, Clone)]
pub struct SetExpression<T> {
    /// Operator of this predicate, must be set operator, such as `IN`, `NOT IN`, etc.
    op: PredicateOperator,
    /// Term of this predicate, for example, `a` in `a in (1, 2, 3)`.
    term: T,
    /// Literals of this predicate, for example, `(1, 2, 3)` in `a in (1, 2, 3)`.
    literals: FnvHashSet<Datum>,
}

impl<T: Debug> Debug for SetExpression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetExpression")
            .field("op", &self.op)
            .field("term", &self.term)
            .field("literal", &self.literals)
            .finish()
    }
}

impl<T> SetExpression<T> {
    pub(crate) fn new(op: PredicateOperator, term: T, literals: FnvHashSet<Datum>) -> Self {
        debug_assert!(op.is_set());
        Self { op, term, literals }
    }

    /// Return the operator of this predicate.
    pub fn op(&self) -> PredicateOperator {
        self.op
    }

    /// Return the term of this predicate.
    pub fn term(&self) -> &T {
        &self.term
    }

    /// Return the literals of this predicate.
    pub fn literals(&self) -> &FnvHashSet<Datum> {
        &self.literals
    }
}

impl<T: Display> Display for SetExpression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut literal_strs: Vec<String> = self.literals.iter().map(|l| l.to_string()).collect();
        literal_strs.sort();
        write!(f, "{} {} ({})", self.term, self.op, literal_strs.join(", "))
    }
}

/// Unbound predicate expression before binding to a schema.
#[derive(Debug, PartialEq, Clone)]
pub enum Predicate {
    /// An expression always evaluates to true.
    AlwaysTrue,
    /// An expression always evaluates to false.
    AlwaysFalse,
    /// And predicate, for example, `a > 10 AND b < 20`.
    And(LogicalExpression<Predicate, 2>),
    /// Or predicate, for example, `a > 10 OR b < 20`.
    Or(LogicalExpression<Predicate, 2>),
    /// Not predicate, for example, `NOT (a > 10)`.
    Not(LogicalExpression<Predicate, 1>),
    /// Unary expression, for example, `a IS NULL`.
    Unary(UnaryExpression<Reference>),
    /// Binary expression, for example, `a > 10`.
    Binary(BinaryExpression<Reference>),
    /// Set predicates, for example, `a in (1, 2, 3)`.
    Set(SetExpression<Reference>),
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::AlwaysTrue => write!(f, "TRUE"),
            Predicate::AlwaysFalse => write!(f, "FALSE"),
            Predicate::And(expr) => {
                write!(f, "({}) AND ({})", expr.inputs()[0], expr.inputs()[1])
            }
            Predicate::Or(expr) => {
                write!(f, "({}) OR ({})", expr.inputs()[0], expr.inputs()[1])
            }
            Predicate::Not(expr) => {
                write!(f, "NOT ({})", expr.inputs()[0])
            }
            Predicate::Unary(expr) => write!(f, "{expr}"),
            Predicate::Binary(expr) => write!(f, "{expr}"),
            Predicate::Set(expr) => write!(f, "{expr}"),
        }
    }
}

impl Predicate {
    /// Combines two predicates with `AND`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use iceberg_core::expr::Predicate::{AlwaysFalse, AlwaysTrue};
    /// use iceberg_core::expr::Reference;
    /// use iceberg_core::spec::Datum;
    /// let expr1 = Reference::new("a").less_than(Datum::long(10));
    ///
    /// let expr2 = Reference::new("b").less_than(Datum::long(20));
    ///
    /// let expr3 = expr1.and(expr2);
    ///
    /// assert_eq!(&format!("{expr3}"), "(a < 10) AND (b < 20)");
    ///
    /// let expr4 = AlwaysTrue.and(AlwaysFalse);
    ///
    /// assert_eq!(&format!("{expr4}"), "FALSE");
    /// ```
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (_, Predicate::AlwaysFalse) | (Predicate::AlwaysFalse, _) => Predicate::AlwaysFalse,
            (Predicate::AlwaysTrue, rhs) => rhs,
            (lhs, Predicate::AlwaysTrue) => lhs,
            (lhs, rhs) => Predicate::And(LogicalExpression::new([Box::new(lhs), Box::new(rhs)])),
        }
    }

    /// Combines two predicates with `OR`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use iceberg_core::expr::Predicate::{AlwaysFalse, AlwaysTrue};
    /// use iceberg_core::expr::Reference;
    /// use iceberg_core::spec::Datum;
    /// let expr1 = Reference::new("a").less_than(Datum::long(10));
    ///
    /// let expr2 = Reference::new("b").less_than(Datum::long(20));
    ///
    /// let expr3 = expr1.or(expr2);
    ///
    /// assert_eq!(&format!("{expr3}"), "(a < 10) OR (b < 20)");
    ///
    /// let expr4 = AlwaysTrue.or(AlwaysFalse);
    ///
    /// assert_eq!(&format!("{expr4}"), "TRUE");
    /// ```
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (_, Predicate::AlwaysTrue) | (Predicate::AlwaysTrue, _) => Predicate::AlwaysTrue,
            (Predicate::AlwaysFalse, rhs) => rhs,
            (lhs, Predicate::AlwaysFalse) => lhs,
            (lhs, rhs) => Predicate::Or(LogicalExpression::new([Box::new(lhs), Box::new(rhs)])),
        }
    }

    /// Returns a predicate representing the negation ('NOT') of this one,
    /// by using inverse predicates rather than wrapping in a `NOT`.
    /// Used for `NOT` elimination.
    ///
    /// # Example
    ///
    /// ```rust
    /// use iceberg_core::expr::Reference;
    /// use iceberg_core::spec::Datum;
    /// let expr1 = Reference::new("a").less_than(Datum::long(10));
    /// let expr2 = Reference::new("b")
    ///     .less_than(Datum::long(5))
    ///     .and(Reference::new("c").less_than(Datum::long(10)));
    ///
    /// let result = expr1.negate();
    /// assert_eq!(&format!("{result}"), "a >= 10");
    ///
    /// let result = expr2.negate();
    /// assert_eq!(&format!("{result}"), "(b >= 5) OR (c >= 10)");
    /// ```
    pub fn negate(self) -> Predicate {
        match self {
            Predicate::AlwaysTrue => Predicate::AlwaysFalse,
            Predicate::AlwaysFalse => Predicate::AlwaysTrue,
            Predicate::And(expr) => {
                let [lhs, rhs] = expr.inputs;
                lhs.negate().or(rhs.negate())
            }
            Predicate::Or(expr) => {
                let [lhs, rhs] = expr.inputs;
                lhs.negate().and(rhs.negate())
            }
            Predicate::Not(expr) => {
                let [inner] = expr.inputs;
                *inner
            }
            Predicate::Unary(expr) => {
                Predicate::Unary(UnaryExpression::new(expr.op.negate(), expr.term))
            }
            Predicate::Binary(expr) => Predicate::Binary(BinaryExpression::new(
                expr.op.negate(),
                expr.term,
                expr.literal,
            )),
            Predicate::Set(expr) => Predicate::Set(SetExpression::new(
                expr.op.negate(),
                expr.term,
                expr.literals,
            )),
        }
    }

    /// Simplifies the expression by removing `NOT` predicates,
    /// directly negating the inner expressions instead. The transformation
    /// applies logical laws (such as De Morgan's laws) to
    /// recursively negate and simplify inner expressions within `NOT`
    /// predicates.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::ops::Not;
    ///
    /// use iceberg_core::expr::Reference;
    /// use iceberg_core::spec::Datum;
    ///
    /// let expression = Reference::new("b").less_than(Datum::long(5)).not();
    /// let result = expression.rewrite_not();
    ///
    /// assert_eq!(&format!("{result}"), "b >= 5");
    /// ```
    pub fn rewrite_not(self) -> Predicate {
        match self {
            Predicate::And(expr) => {
                let [lhs, rhs] = expr.inputs;
                lhs.rewrite_not().and(rhs.rewrite_not())
            }
            Predicate::Or(expr) => {
                let [lhs, rhs] = expr.inputs;
                lhs.rewrite_not().or(rhs.rewrite_not())
            }
            Predicate::Not(expr) => {
                let [inner] = expr.inputs;
                inner.rewrite_not().negate()
            }
            leaf => leaf,
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    /// Create a predicate which is the reverse of this predicate. For example: `NOT (a > 10)`.
    ///
    /// This is different from [`Predicate::negate()`] since it doesn't rewrite expression, but
    /// just adds a `NOT` operator.
    ///
    /// # Example
    ///
    ///```rust
    /// use iceberg_core::expr::Predicate::AlwaysTrue;
    /// use iceberg_core::expr::Reference;
    /// use iceberg_core::spec::Datum;
    /// let expr1 = Reference::new("a").less_than(Datum::long(10));
    ///
    /// let expr2 = !expr1;
    ///
    /// assert_eq!(&format!("{expr2}"), "NOT (a < 10)");
    ///
    /// let expr3 = !AlwaysTrue;
    ///
    /// assert_eq!(&format!("{expr3}"), "FALSE");
    ///```
    fn not(self) -> Self::Output {
        match self {
            Predicate::AlwaysTrue => Predicate::AlwaysFalse,
            Predicate::AlwaysFalse => Predicate::AlwaysTrue,
            other => Predicate::Not(LogicalExpression::new([Box::new(other)])),
        }
    }
}

fn primitive_type_of(reference: &BoundReference) -> Result<&PrimitiveType> {
    reference.field().field_type.as_primitive_type().ok_or_else(|| {
        Error::new(
            ErrorKind::Binding,
            format!(
                "Cannot compare nested column {} with a literal",
                reference
            ),
        )
    })
}

fn bind_literal(reference: &BoundReference, literal: &Datum) -> Result<Datum> {
    let target = primitive_type_of(reference)?;
    literal.clone().to(target).map_err(|e| {
        Error::new(
            ErrorKind::Binding,
            format!(
                "Cannot bind literal {literal} to column {reference} of type {target}"
            ),
        )
        .with_source(e)
    })
}

impl Bind for Predicate {
    type Bound = BoundPredicate;

    fn bind(&self, schema: SchemaRef, case_sensitive: bool) -> Result<BoundPredicate> {
        match self {
            Predicate::AlwaysTrue => Ok(BoundPredicate::AlwaysTrue),
            Predicate::AlwaysFalse => Ok(BoundPredicate::AlwaysFalse),
            Predicate::And(expr) => {
                let [lhs, rhs] = expr.inputs();
                let lhs = lhs.bind(schema.clone(), case_sensitive)?;
                let rhs = rhs.bind(schema, case_sensitive)?;
                Ok(lhs.and(rhs))
            }
            Predicate::Or(expr) => {
                let [lhs, rhs] = expr.inputs();
                let lhs = lhs.bind(schema.clone(), case_sensitive)?;
                let rhs = rhs.bind(schema, case_sensitive)?;
                Ok(lhs.or(rhs))
            }
            Predicate::Not(expr) => {
                let [inner] = expr.inputs();
                Ok(!inner.bind(schema, case_sensitive)?)
            }
            Predicate::Unary(expr) => {
                let term = expr.term.bind(schema, case_sensitive)?;
                if term.field().required {
                    match expr.op {
                        PredicateOperator::IsNull => return Ok(BoundPredicate::AlwaysFalse),
                        PredicateOperator::NotNull => return Ok(BoundPredicate::AlwaysTrue),
                        _ => {}
                    }
                }
                Ok(BoundPredicate::Unary(UnaryExpression::new(expr.op, term)))
            }
            Predicate::Binary(expr) => {
                let term = expr.term.bind(schema, case_sensitive)?;
                let literal = bind_literal(&term, &expr.literal)?;
                Ok(BoundPredicate::Binary(BinaryExpression::new(
                    expr.op, term, literal,
                )))
            }
            Predicate::Set(expr) => {
                let term = expr.term.bind(schema, case_sensitive)?;
                let literals = expr
                    .literals
                    .iter()
                    .map(|l| bind_literal(&term, l))
                    .collect::<Result<FnvHashSet<Datum>>>()?;

                if literals.is_empty() {
                    return match expr.op {
                        PredicateOperator::In => Ok(BoundPredicate::AlwaysFalse),
                        _ => Ok(BoundPredicate::AlwaysTrue),
                    };
                }

                Ok(BoundPredicate::Set(SetExpression::new(
                    expr.op, term, literals,
                )))
            }
        }
    }
}

/// Bound predicate expression after binding to a schema.
#[derive(Debug, PartialEq, Clone)]
pub enum BoundPredicate {
    /// An expression always evaluates to true.
    AlwaysTrue,
    /// An expression always evaluates to false.
    AlwaysFalse,
    /// An expression combined by `AND`, for example, `a > 10 AND b < 20`.
    And(LogicalExpression<BoundPredicate, 2>),
    /// An expression combined by `OR`, for example, `a > 10 OR b < 20`.
    Or(LogicalExpression<BoundPredicate, 2>),
    /// An expression combined by `NOT`, for example, `NOT (a > 10)`.
    Not(LogicalExpression<BoundPredicate, 1>),
    /// Unary expression, for example, `a IS NULL`.
    Unary(UnaryExpression<BoundReference>),
    /// Binary expression, for example, `a > 10`.
    Binary(BinaryExpression<BoundReference>),
    /// Set predicates, for example, `a in (1, 2, 3)`.
    Set(SetExpression<BoundReference>),
}

impl BoundPredicate {
    pub(crate) fn and(self, other: BoundPredicate) -> BoundPredicate {
        match (self, other) {
            (_, BoundPredicate::AlwaysFalse) | (BoundPredicate::AlwaysFalse, _) => {
                BoundPredicate::AlwaysFalse
            }
            (BoundPredicate::AlwaysTrue, rhs) => rhs,
            (lhs, BoundPredicate::AlwaysTrue) => lhs,
            (lhs, rhs) => {
                BoundPredicate::And(LogicalExpression::new([Box::new(lhs), Box::new(rhs)]))
            }
        }
    }

    pub(crate) fn or(self, other: BoundPredicate) -> BoundPredicate {
        match (self, other) {
            (_, BoundPredicate::AlwaysTrue) | (BoundPredicate::AlwaysTrue, _) => {
                BoundPredicate::AlwaysTrue
            }
            (BoundPredicate::AlwaysFalse, rhs) => rhs,
            (lhs, BoundPredicate::AlwaysFalse) => lhs,
            (lhs, rhs) => {
                BoundPredicate::Or(LogicalExpression::new([Box::new(lhs), Box::new(rhs)]))
            }
        }
    }
}

impl Display for BoundPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundPredicate::AlwaysTrue => write!(f, "True"),
            BoundPredicate::AlwaysFalse => write!(f, "False"),
            BoundPredicate::And(expr) => {
                write!(f, "({}) AND ({})", expr.inputs()[0], expr.inputs()[1])
            }
            BoundPredicate::Or(expr) => {
                write!(f, "({}) OR ({})", expr.inputs()[0], expr.inputs()[1])
            }
            BoundPredicate::Not(expr) => {
                write!(f, "NOT ({})", expr.inputs()[0])
            }
            BoundPredicate::Unary(expr) => write!(f, "{expr}"),
            BoundPredicate::Binary(expr) => write!(f, "{expr}"),
            BoundPredicate::Set(expr) => write!(f, "{expr}"),
        }
    }
}

impl Not for BoundPredicate {
    type Output = BoundPredicate;

    fn not(self) -> Self::Output {
        match self {
            BoundPredicate::AlwaysTrue => BoundPredicate::AlwaysFalse,
            BoundPredicate::AlwaysFalse => BoundPredicate::AlwaysTrue,
            other => BoundPredicate::Not(LogicalExpression::new([Box::new(other)])),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Not;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::ErrorKind;
    use crate::expr::Predicate::{AlwaysFalse, AlwaysTrue};
    use crate::expr::{Bind, BoundPredicate, Reference};
    use crate::spec::{Datum, NestedField, PrimitiveType, Schema, SchemaRef, StructType, Type};

    fn table_schema_simple() -> SchemaRef {
        Arc::new(
            Schema::builder()
                .with_schema_id(1)
                .with_fields(vec![
                    NestedField::optional(1, "foo", Type::Primitive(PrimitiveType::String))
                        .into(),
                    NestedField::required(2, "bar", Type::Primitive(PrimitiveType::Int)).into(),
                    NestedField::optional(3, "baz", Type::Primitive(PrimitiveType::Boolean))
                        .into(),
                    NestedField::optional(4, "qux", Type::Primitive(PrimitiveType::Float)).into(),
                    NestedField::optional(5, "day", Type::Primitive(PrimitiveType::Date)).into(),
                    NestedField::optional(
                        6,
                        "point",
                        Type::Struct(StructType::new(vec![
                            NestedField::optional(7, "x", Type::Primitive(PrimitiveType::Long))
                                .into(),
                        ])),
                    )
                    .into(),
                ])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_logical_or_rewrite_not() {
        let expression = Reference::new("b")
            .less_than(Datum::long(5))
            .or(Reference::new("c").less_than(Datum::long(10)))
            .not();

        let expected = Reference::new("b")
            .greater_than_or_equal_to(Datum::long(5))
            .and(Reference::new("c").greater_than_or_equal_to(Datum::long(10)));

        let result = expression.rewrite_not();

        assert_eq!(result, expected);
    }

    #[test]
    fn test_logical_and_rewrite_not() {
        let expression = Reference::new("b")
            .less_than(Datum::long(5))
            .and(Reference::new("c").less_than(Datum::long(10)))
            .not();

        let expected = Reference::new("b")
            .greater_than_or_equal_to(Datum::long(5))
            .or(Reference::new("c").greater_than_or_equal_to(Datum::long(10)));

        let result = expression.rewrite_not();

        assert_eq!(result, expected);
    }

    #[test]
    fn test_double_not_rewrite_not() {
        let expression = Reference::new("a").is_null().not().not();
        assert_eq!(expression.rewrite_not(), Reference::new("a").is_null());
    }

    #[test]
    fn test_set_rewrite_not() {
        let expression = Reference::new("a")
            .is_in([Datum::int(5), Datum::int(6)])
            .not();

        let expected = Reference::new("a").is_not_in([Datum::int(5), Datum::int(6)]);

        assert_eq!(expression.rewrite_not(), expected);
    }

    #[test]
    fn test_constant_folding() {
        let leaf = Reference::new("a").is_null();
        assert_eq!(AlwaysTrue.and(leaf.clone()), leaf);
        assert_eq!(leaf.clone().and(AlwaysFalse), AlwaysFalse);
        assert_eq!(AlwaysFalse.or(leaf.clone()), leaf);
        assert_eq!(leaf.clone().or(AlwaysTrue), AlwaysTrue);
        assert_eq!(AlwaysTrue.not(), AlwaysFalse);
    }

    #[test]
    fn test_bind_is_null() {
        let schema = table_schema_simple();
        let expr = Reference::new("foo").is_null();
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(&format!("{bound_expr}"), "foo IS NULL");
    }

    #[test]
    fn test_bind_is_null_required() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").is_null();
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(bound_expr, BoundPredicate::AlwaysFalse);
    }

    #[test]
    fn test_bind_is_not_null_required() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").is_not_null();
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(bound_expr, BoundPredicate::AlwaysTrue);
    }

    #[test]
    fn test_bind_less_than() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").less_than(Datum::int(10));
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(&format!("{bound_expr}"), "bar < 10");
    }

    #[test]
    fn test_bind_converts_literal_to_column_type() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").less_than(Datum::long(10));
        let BoundPredicate::Binary(bound) = expr.bind(schema.clone(), true).unwrap() else {
            panic!("expected a binary predicate");
        };
        assert_eq!(bound.literal(), &Datum::int(10));

        let expr = Reference::new("qux").equal_to(Datum::int(3));
        let BoundPredicate::Binary(bound) = expr.bind(schema.clone(), true).unwrap() else {
            panic!("expected a binary predicate");
        };
        assert_eq!(bound.literal(), &Datum::float(3.0));

        let expr = Reference::new("day").greater_than(Datum::string("1970-01-02"));
        let BoundPredicate::Binary(bound) = expr.bind(schema, true).unwrap() else {
            panic!("expected a binary predicate");
        };
        assert_eq!(bound.literal(), &Datum::date(1));
    }

    #[test]
    fn test_bind_less_than_wrong_type() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").less_than(Datum::string("abcd"));
        let err = expr.bind(schema, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Binding);
    }

    #[test]
    fn test_bind_long_out_of_int_range() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").less_than(Datum::long(i64::MAX));
        let err = expr.bind(schema, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Binding);
    }

    #[test]
    fn test_bind_nested_struct_with_literal() {
        let schema = table_schema_simple();
        let expr = Reference::new("point").equal_to(Datum::long(1));
        let err = expr.bind(schema, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Binding);
    }

    #[test]
    fn test_bind_nested_leaf() {
        let schema = table_schema_simple();
        let expr = Reference::new("point.x").equal_to(Datum::long(1));
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(&format!("{bound_expr}"), "point.x = 1");
    }

    #[test]
    fn test_bind_in() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").is_in([Datum::int(10), Datum::int(20)]);
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(&format!("{bound_expr}"), "bar IN (10, 20)");
    }

    #[test]
    fn test_bind_empty_in() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").is_in(vec![]);
        let bound_expr = expr.bind(schema.clone(), true).unwrap();
        assert_eq!(bound_expr, BoundPredicate::AlwaysFalse);

        let expr = Reference::new("bar").is_not_in(vec![]);
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(bound_expr, BoundPredicate::AlwaysTrue);
    }

    #[test]
    fn test_bind_in_single_value_stays_set() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar").is_in([Datum::int(10)]);
        let bound_expr = expr.bind(schema, true).unwrap();
        assert!(matches!(bound_expr, BoundPredicate::Set(_)));
    }

    #[test]
    fn test_bind_and_folds_constants() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar")
            .is_null()
            .and(Reference::new("foo").is_null());
        let bound_expr = expr.bind(schema.clone(), true).unwrap();
        assert_eq!(bound_expr, BoundPredicate::AlwaysFalse);

        let expr = Reference::new("bar")
            .is_not_null()
            .and(Reference::new("foo").is_null());
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(&format!("{bound_expr}"), "foo IS NULL");
    }

    #[test]
    fn test_bind_or() {
        let schema = table_schema_simple();
        let expr = Reference::new("bar")
            .less_than(Datum::int(10))
            .or(Reference::new("foo").is_null());
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(&format!("{bound_expr}"), "(bar < 10) OR (foo IS NULL)");
    }

    #[test]
    fn test_bind_not() {
        let schema = table_schema_simple();
        let expr = !Reference::new("bar").less_than(Datum::int(10));
        let bound_expr = expr.bind(schema, true).unwrap();
        assert_eq!(&format!("{bound_expr}"), "NOT (bar < 10)");
    }

    #[test]
    fn test_bind_unknown_column() {
        let schema = table_schema_simple();
        let expr = Reference::new("missing").less_than(Datum::int(10));
        let err = expr.bind(schema, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Binding);
    }
}
