// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node translator
//!
//! Maps one clause node onto a native expression bound to the parameter of
//! its translator context. Names resolve against the context's alias map
//! first, then against members of the current shape; nothing outside the
//! active parameter is ever visible.

use super::context::TranslatorContext;
use super::error::{Clause, TranslationError, TranslationResult};
use super::resolver::OperatorResolver;
use crate::ast::{
    BinaryOperator, ConvertNode, FunctionCallNode, PropertyPath, QueryNode, UnaryOperator,
};
use crate::expr::{eval, BinaryOp, Expr, ExprType, Lambda, UnaryOp};
use crate::functions::BuiltinFunction;
use crate::model::{Member, MemberType, Multiplicity, Shape};
use crate::types::{TypeCoercion, Value, ValueType};
use std::sync::Arc;

fn binary_op(operator: BinaryOperator) -> BinaryOp {
    match operator {
        BinaryOperator::Equal => BinaryOp::Eq,
        BinaryOperator::NotEqual => BinaryOp::Ne,
        BinaryOperator::LessThan => BinaryOp::Lt,
        BinaryOperator::LessEqual => BinaryOp::Le,
        BinaryOperator::GreaterThan => BinaryOp::Gt,
        BinaryOperator::GreaterEqual => BinaryOp::Ge,
        BinaryOperator::And => BinaryOp::And,
        BinaryOperator::Or => BinaryOp::Or,
        BinaryOperator::Add => BinaryOp::Add,
        BinaryOperator::Subtract => BinaryOp::Sub,
        BinaryOperator::Multiply => BinaryOp::Mul,
        BinaryOperator::Divide => BinaryOp::Div,
        BinaryOperator::Modulo => BinaryOp::Mod,
    }
}

pub struct NodeTranslator<'a> {
    context: &'a TranslatorContext,
    clause: Clause,
}

impl<'a> NodeTranslator<'a> {
    pub fn new(context: &'a TranslatorContext, clause: Clause) -> Self {
        Self { context, clause }
    }

    pub fn clause(&self) -> Clause {
        self.clause
    }

    pub fn translate(&self, node: &QueryNode) -> TranslationResult<Expr> {
        match node {
            QueryNode::Property(path) => self.resolve_path(path),
            QueryNode::Literal(value) => self.literal(value),
            QueryNode::Binary(node) => {
                let left = self.translate(&node.left)?;
                let right = self.translate(&node.right)?;
                self.build_binary(binary_op(node.operator), left, right)
            }
            QueryNode::Unary(node) => {
                let operand = self.translate(&node.operand)?;
                self.build_unary(node.operator, operand)
            }
            QueryNode::FunctionCall(node) => self.translate_call(node),
            QueryNode::Convert(node) => self.translate_convert(node),
            QueryNode::CollectionCount(path) => self.collection_count(path),
        }
    }

    /// Translate a keep/discard predicate into a lambda over the current row
    pub fn translate_predicate(&self, node: &QueryNode) -> TranslationResult<Lambda> {
        let body = self.translate(node)?;
        let ty = body.ty();
        if !ty.is_boolean() {
            return Err(self.mismatch(format!("predicate {} must be Boolean, found {}", node, ty)));
        }
        Ok(Lambda::new(self.context.parameter().clone(), body))
    }

    fn mismatch(&self, message: String) -> TranslationError {
        TranslationError::TypeMismatch {
            clause: self.clause,
            path: self.context.path().clone(),
            message,
        }
    }

    fn unresolved(&self, name: &str, shape: &Shape) -> TranslationError {
        TranslationError::UnresolvedName {
            clause: self.clause,
            path: self.context.path().clone(),
            name: name.to_string(),
            shape: shape.name().to_string(),
        }
    }

    // ==============================================================================
    // NAME RESOLUTION
    // ==============================================================================

    /// Resolve a property path against the active parameter
    pub fn resolve_path(&self, path: &PropertyPath) -> TranslationResult<Expr> {
        let full = path.to_string();
        let parameter = self.context.parameter();
        let shape = self.context.shape();

        if let Some(member) = self.context.aliases().and_then(|a| a.member(&full)) {
            log::trace!("{} resolved through alias to {}", full, member);
            let (expr, _) = self.member_access(parameter.to_expr(), shape, member, false, &full)?;
            return Ok(expr);
        }

        // Projected members carry the full path as their name
        if !path.is_single() && shape.member(&full).is_some() {
            let (expr, _) = self.member_access(parameter.to_expr(), shape, &full, false, &full)?;
            return Ok(expr);
        }

        let mut target = parameter.to_expr();
        let mut current = shape.clone();
        let mut optional = false;
        let last = path.segments.len().saturating_sub(1);

        for (i, segment) in path.segments.iter().enumerate() {
            let name = match (i, self.context.aliases()) {
                (0, Some(aliases)) => aliases.member(segment).unwrap_or(segment.as_str()),
                _ => segment.as_str(),
            };
            let (expr, hop_optional) = self.member_access(target, &current, name, optional, &full)?;
            optional |= hop_optional;

            if i < last {
                current = match expr.ty() {
                    ExprType::Record(next) => next,
                    ExprType::Collection(_) => {
                        return Err(self.mismatch(format!(
                            "'{}' in {} is collection-valued and has no member '{}'",
                            segment,
                            full,
                            path.segments[i + 1]
                        )))
                    }
                    _ => return Err(self.unresolved(&full, &current)),
                };
            }
            target = expr;
        }

        log::trace!("{} resolved against {}", full, shape.name());
        Ok(target)
    }

    /// Member access on `target`; also reports whether the hop may yield a
    /// missing record
    fn member_access(
        &self,
        target: Expr,
        shape: &Shape,
        name: &str,
        optional: bool,
        full: &str,
    ) -> TranslationResult<(Expr, bool)> {
        let member: &Member = shape
            .member(name)
            .ok_or_else(|| self.unresolved(full, shape))?;

        let (ty, hop_optional) = match &member.ty {
            MemberType::Scalar { ty, nullable } => (ExprType::scalar(*ty, *nullable || optional), false),
            MemberType::Navigation {
                target: target_type,
                multiplicity,
            } => {
                let target_shape = self
                    .context
                    .navigation_target(self.clause, name, target_type)?;
                if multiplicity.is_many() {
                    (ExprType::Collection(target_shape), false)
                } else {
                    (
                        ExprType::Record(target_shape),
                        *multiplicity == Multiplicity::ZeroOrOne,
                    )
                }
            }
            MemberType::Record(nested) => (ExprType::Record(nested.clone()), true),
            MemberType::Collection(nested) => (ExprType::Collection(nested.clone()), false),
        };

        Ok((Expr::member(target, name, ty), hop_optional))
    }

    fn literal(&self, value: &Value) -> TranslationResult<Expr> {
        match value {
            Value::Record(_) | Value::List(_) => {
                Err(self.mismatch(format!("structured literal {} is not supported", value)))
            }
            other => Ok(Expr::Constant(other.clone())),
        }
    }

    // ==============================================================================
    // OPERATORS
    // ==============================================================================

    /// Build a binary expression, applying null-test rewriting for
    /// `eq null`/`ne null` and numeric promotion for mixed operand types
    pub fn build_binary(&self, op: BinaryOp, left: Expr, right: Expr) -> TranslationResult<Expr> {
        let (left_ty, right_ty) = (left.ty(), right.ty());

        if op.is_logical() {
            if !left_ty.is_boolean() || !right_ty.is_boolean() {
                return Err(self.mismatch(format!(
                    "{} {} {} requires Boolean operands",
                    left_ty,
                    op.symbol(),
                    right_ty
                )));
            }
            let nullable = left_ty.is_nullable() || right_ty.is_nullable();
            return Ok(self.fold_binary(op, left, right, ExprType::scalar(ValueType::Boolean, nullable)));
        }

        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let test = if op == BinaryOp::Eq {
                UnaryOp::IsNull
            } else {
                UnaryOp::IsNotNull
            };
            if right_ty == ExprType::Null {
                return self.null_test(test, left);
            }
            if left_ty == ExprType::Null {
                return self.null_test(test, right);
            }
        }

        if left_ty == ExprType::Null || right_ty == ExprType::Null {
            let other = if left_ty == ExprType::Null {
                &right_ty
            } else {
                &left_ty
            };
            if matches!(other, ExprType::Record(_) | ExprType::Collection(_)) {
                return Err(self.mismatch(format!("{} cannot be compared", other)));
            }
            let ty = match other {
                _ if op.is_comparison() => ExprType::scalar(ValueType::Boolean, true),
                ExprType::Scalar { ty, .. } if ty.is_numeric() => ExprType::scalar(*ty, true),
                ExprType::Null => ExprType::Null,
                _ => {
                    return Err(self.mismatch(format!(
                        "{} {} {} requires numeric operands",
                        left_ty,
                        op.symbol(),
                        right_ty
                    )))
                }
            };
            return Ok(self.fold_binary(op, left, right, ty));
        }

        let (l, r) = match (left_ty.value_type(), right_ty.value_type()) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                return Err(self.mismatch(format!(
                    "{} {} {} has non-scalar operands",
                    left_ty,
                    op.symbol(),
                    right_ty
                )))
            }
        };
        let common = TypeCoercion::find_common_type(l, r).ok_or_else(|| {
            self.mismatch(format!("{} {} {} has incompatible operands", l, op.symbol(), r))
        })?;
        if !op.is_comparison() && !common.is_numeric() {
            return Err(self.mismatch(format!(
                "arithmetic {} requires numeric operands, found {}",
                op.symbol(),
                common
            )));
        }

        let nullable = left_ty.is_nullable() || right_ty.is_nullable();
        let ty = if op.is_comparison() {
            ExprType::scalar(ValueType::Boolean, nullable)
        } else {
            ExprType::scalar(common, nullable)
        };
        let left = self.promote(left, common);
        let right = self.promote(right, common);
        Ok(self.fold_binary(op, left, right, ty))
    }

    fn null_test(&self, op: UnaryOp, operand: Expr) -> TranslationResult<Expr> {
        if let ExprType::Collection(shape) = operand.ty() {
            return Err(self.mismatch(format!("Collection({}) is never null", shape.name())));
        }
        Ok(self.fold_unary(op, operand, ExprType::scalar(ValueType::Boolean, false)))
    }

    fn build_unary(&self, operator: UnaryOperator, operand: Expr) -> TranslationResult<Expr> {
        let ty = operand.ty();
        match operator {
            UnaryOperator::Not => {
                if !ty.is_boolean() {
                    return Err(self.mismatch(format!("not requires a Boolean, found {}", ty)));
                }
                let nullable = ty.is_nullable();
                Ok(self.fold_unary(
                    UnaryOp::Not,
                    operand,
                    ExprType::scalar(ValueType::Boolean, nullable),
                ))
            }
            UnaryOperator::Negate => match ty {
                ExprType::Null => Ok(operand),
                ExprType::Scalar { ty: value_type, .. } if value_type.is_numeric() => {
                    Ok(self.fold_unary(UnaryOp::Negate, operand, ty))
                }
                other => Err(self.mismatch(format!("negation requires a number, found {}", other))),
            },
        }
    }

    /// Widen `expr` to `to`; literals are converted in place
    fn promote(&self, expr: Expr, to: ValueType) -> Expr {
        match expr.ty() {
            ExprType::Scalar { ty, nullable } if ty != to => match &expr {
                Expr::Constant(value) => match eval::convert(value, to) {
                    Ok(converted) => Expr::Constant(converted),
                    Err(_) => Expr::Convert {
                        operand: Box::new(expr),
                        to,
                        nullable,
                    },
                },
                _ => Expr::Convert {
                    operand: Box::new(expr),
                    to,
                    nullable,
                },
            },
            _ => expr,
        }
    }

    fn fold_binary(&self, op: BinaryOp, left: Expr, right: Expr, ty: ExprType) -> Expr {
        if let (Some(l), Some(r)) = (left.constant(), right.constant()) {
            if let Ok(value) = eval::binary(op, l, r) {
                return Expr::Constant(value);
            }
        }
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        }
    }

    fn fold_unary(&self, op: UnaryOp, operand: Expr, ty: ExprType) -> Expr {
        if let Some(value) = operand.constant() {
            if let Ok(value) = eval::unary(op, value) {
                return Expr::Constant(value);
            }
        }
        Expr::Unary {
            op,
            operand: Box::new(operand),
            ty,
        }
    }

    // ==============================================================================
    // FUNCTIONS AND CASTS
    // ==============================================================================

    fn translate_call(&self, node: &FunctionCallNode) -> TranslationResult<Expr> {
        let function = BuiltinFunction::lookup(&node.name).ok_or_else(|| {
            TranslationError::UnsupportedFunction {
                clause: self.clause,
                path: self.context.path().clone(),
                name: node.name.clone(),
            }
        })?;

        let arguments = node
            .arguments
            .iter()
            .map(|argument| self.translate(argument))
            .collect::<TranslationResult<Vec<_>>>()?;

        let overload = function
            .overloads()
            .iter()
            .find(|parameters| parameters.len() == arguments.len())
            .ok_or_else(|| {
                self.mismatch(format!(
                    "{} does not take {} arguments",
                    function.name(),
                    arguments.len()
                ))
            })?;

        let mut nullable = false;
        let mut converted = Vec::with_capacity(arguments.len());
        for (i, (argument, expected)) in arguments.into_iter().zip(overload.iter()).enumerate() {
            match argument.ty() {
                ExprType::Null => {
                    nullable = true;
                    converted.push(argument);
                }
                ExprType::Scalar {
                    ty,
                    nullable: argument_nullable,
                } if TypeCoercion::find_common_type(ty, *expected) == Some(*expected) => {
                    nullable |= argument_nullable;
                    converted.push(self.promote(argument, *expected));
                }
                other => {
                    return Err(self.mismatch(format!(
                        "{} expects {} as argument {}, found {}",
                        function.name(),
                        expected,
                        i + 1,
                        other
                    )))
                }
            }
        }

        let constants: Option<Vec<Value>> = converted
            .iter()
            .map(|argument| argument.constant().cloned())
            .collect();
        if let Some(values) = constants {
            if let Ok(value) = function.evaluate(&values) {
                return Ok(Expr::Constant(value));
            }
        }

        Ok(Expr::Call {
            function,
            arguments: converted,
            ty: ExprType::scalar(function.return_type(), nullable),
        })
    }

    fn translate_convert(&self, node: &ConvertNode) -> TranslationResult<Expr> {
        let operand = self.translate(&node.source)?;
        match operand.ty() {
            ExprType::Null => Ok(operand),
            ExprType::Scalar { ty, nullable } => {
                if ty == node.target {
                    return Ok(operand);
                }
                if !TypeCoercion::can_convert(ty, node.target) {
                    return Err(self.mismatch(format!("cannot cast {} to {}", ty, node.target)));
                }
                if let Some(value) = operand.constant() {
                    return eval::convert(value, node.target)
                        .map(Expr::Constant)
                        .map_err(|e| self.mismatch(e.to_string()));
                }
                Ok(Expr::Convert {
                    operand: Box::new(operand),
                    to: node.target,
                    nullable,
                })
            }
            other => Err(self.mismatch(format!("cannot cast {} to {}", other, node.target))),
        }
    }

    /// `Nav/$count`: number of related rows
    fn collection_count(&self, path: &PropertyPath) -> TranslationResult<Expr> {
        let collection = self.resolve_path(path)?;
        if !matches!(collection.ty(), ExprType::Collection(_)) {
            return Err(self.mismatch(format!("{}/$count requires a collection", path)));
        }
        let resolver = OperatorResolver::new(self.clause, self.context.path());
        let source = resolver.collection(collection)?;
        let count = resolver.count(source)?;
        Ok(Expr::Query(Box::new(count)))
    }

    /// Shape behind the current parameter
    pub fn shape(&self) -> &Arc<Shape> {
        self.context.shape()
    }
}
