// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Select stage
//!
//! Projects each row to a synthesized record holding the selected
//! properties, computed values and expanded navigations. Expanded
//! navigations run their own nested pipeline (filter, select, order, skip,
//! take) over the navigation's rows.
//!
//! Ordering keys that later stages still need are carried as hidden members
//! so that `$orderby` and the skip-token keep resolving after projection.

use super::{filter, order_by, paging, StageOutput};
use crate::ast::{ExpandItem, OrderByItem, SelectExpandClause, SelectItem};
use crate::expr::{Expr, ExprType, Lambda, QueryExpr, QueryOperator};
use crate::model::{Member, MemberType, Shape, ShapeKind};
use crate::plan::context::TranslatorContext;
use crate::plan::entry_factory::{EntryFactory, EntryField, FieldAccessor};
use crate::plan::error::{Clause, TranslationError, TranslationResult};
use crate::plan::options::TranslationOptions;
use crate::plan::resolver::OperatorResolver;
use std::sync::Arc;

/// Projected members, their values and the output fields read from them
#[derive(Default)]
struct Projection {
    members: Vec<Member>,
    values: Vec<Expr>,
    fields: Vec<EntryField>,
}

impl Projection {
    fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    fn push(&mut self, member: Member, value: Expr, accessor: Option<FieldAccessor>) {
        if let Some(accessor) = accessor {
            self.fields.push(EntryField {
                name: member.name.clone(),
                accessor,
            });
        }
        self.members.push(member);
        self.values.push(value);
    }
}

fn unsupported(context: &TranslatorContext, reason: String) -> TranslationError {
    TranslationError::UnsupportedShape {
        clause: Clause::Select,
        path: context.path().clone(),
        operator: QueryOperator::Select,
        shape: context.shape().name().to_string(),
        reason,
    }
}

fn scalar_member(name: &str, ty: &ExprType) -> Option<Member> {
    match ty {
        ExprType::Scalar { ty, nullable } => Some(Member::scalar(name, *ty, *nullable)),
        _ => None,
    }
}

/// Every visible property of the current shape, named as clients address
/// them (tuple members by their alias)
fn select_all(projection: &mut Projection, context: &TranslatorContext) {
    let parameter = context.parameter();
    for member in context.shape().output_members() {
        let name = context
            .aliases()
            .and_then(|aliases| aliases.alias(&member.name))
            .unwrap_or(member.name.as_str());
        if projection.contains(name) {
            continue;
        }
        let value = Expr::member(parameter.to_expr(), &member.name, member_type(member));
        let mut projected = member.clone();
        projected.name = name.to_string();
        projection.push(
            projected,
            value,
            Some(FieldAccessor::Member(name.to_string())),
        );
    }
}

fn member_type(member: &Member) -> ExprType {
    match &member.ty {
        MemberType::Scalar { ty, nullable } => ExprType::scalar(*ty, *nullable),
        MemberType::Record(shape) => ExprType::Record(shape.clone()),
        MemberType::Collection(shape) => ExprType::Collection(shape.clone()),
        MemberType::Navigation { .. } => ExprType::Null,
    }
}

/// Nested pipeline of one expanded navigation
fn expand(
    projection: &mut Projection,
    item: &ExpandItem,
    context: &TranslatorContext,
    options: &TranslationOptions,
) -> TranslationResult<()> {
    let navigation = item.navigation.as_str();
    let (target, many) = match context.shape().member(navigation).map(|m| &m.ty) {
        Some(MemberType::Navigation {
            target,
            multiplicity,
        }) => (target.clone(), multiplicity.is_many()),
        Some(_) => {
            return Err(unsupported(
                context,
                format!("'{}' is not a navigation property", navigation),
            ))
        }
        None => {
            return Err(TranslationError::UnresolvedName {
                clause: Clause::Select,
                path: context.path().clone(),
                name: navigation.to_string(),
                shape: context.shape().name().to_string(),
            })
        }
    };

    let child_path = context.path().child(navigation);
    if child_path.depth() > options.max_expand_depth {
        return Err(TranslationError::InvalidBound {
            clause: Clause::Select,
            path: child_path,
            reason: format!("expansion deeper than {} levels", options.max_expand_depth),
        });
    }

    let target_shape = context.navigation_target(Clause::Select, navigation, &target)?;
    let navigation_expr = Expr::member(
        context.parameter().to_expr(),
        navigation,
        if many {
            ExprType::Collection(target_shape.clone())
        } else {
            ExprType::Record(target_shape.clone())
        },
    );

    let nested = context.nested(target_shape.clone(), navigation);
    let source = OperatorResolver::new(Clause::Select, nested.path()).collection(navigation_expr)?;

    let nested_options = &item.options;
    let order_items = nested_options
        .order_by
        .as_ref()
        .map(|c| c.items.clone())
        .unwrap_or_default();
    let protected: &[OrderByItem] = if nested_options.select.is_some() {
        &order_items
    } else {
        &[]
    };
    let entity_set = context
        .model()
        .entity_set_for_type(target_shape.name())
        .map(|set| set.name.clone());

    let StageOutput {
        expression,
        context: filtered,
        ..
    } = filter::apply(source, nested_options.filter.as_ref(), &nested)?;
    let StageOutput {
        expression,
        context: selected,
        entry_factory,
    } = apply(
        expression,
        nested_options.select.as_ref(),
        protected,
        entity_set.clone(),
        &filtered,
        options,
    )?;
    let StageOutput {
        expression,
        context: ordered,
        ..
    } = order_by::apply(expression, &order_items, &selected)?;
    let StageOutput {
        expression,
        context: skipped,
        ..
    } = paging::skip(expression, nested_options.skip, &ordered)?;
    let StageOutput {
        expression,
        context: taken,
        ..
    } = paging::take(expression, nested_options.top, &skipped)?;

    let nested_shape = taken.shape().clone();
    let factory =
        entry_factory.unwrap_or_else(|| EntryFactory::from_shape(&nested_shape, entity_set));

    let (value, ty) = if many {
        (
            Expr::Query(Box::new(expression)),
            MemberType::Collection(nested_shape),
        )
    } else {
        (
            Expr::Single(Box::new(expression)),
            MemberType::Record(nested_shape),
        )
    };

    log::debug!("Expanded {} at {}", navigation, taken.path());

    projection.push(
        Member {
            name: navigation.to_string(),
            ty,
            hidden: false,
        },
        value,
        Some(FieldAccessor::Nested {
            member: navigation.to_string(),
            factory: Box::new(factory),
            many,
        }),
    );
    Ok(())
}

/// Project the rows of `source`
///
/// Without a clause the stage only fires when `protected` is non-empty; it
/// then keeps every visible property and adds the ordering keys.
pub fn apply(
    source: QueryExpr,
    clause: Option<&SelectExpandClause>,
    protected: &[OrderByItem],
    entity_set: Option<String>,
    context: &TranslatorContext,
    options: &TranslationOptions,
) -> TranslationResult<StageOutput> {
    if clause.is_none() && protected.is_empty() {
        return Ok(StageOutput::passthrough(source, context));
    }

    let translator = context.translator(Clause::Select);
    let mut projection = Projection::default();

    if clause.map_or(true, |c| c.all_selected) {
        select_all(&mut projection, context);
    }

    for item in clause.map(|c| c.items.as_slice()).unwrap_or_default() {
        match item {
            SelectItem::Property(path) => {
                let name = path.to_string();
                if projection.contains(&name) {
                    continue;
                }
                if projection.has_field(&name) {
                    return Err(unsupported(context, format!("duplicate field '{}'", name)));
                }
                let value = translator.resolve_path(path)?;
                let member = scalar_member(&name, &value.ty()).ok_or_else(|| {
                    unsupported(
                        context,
                        format!("'{}' is not a structural property; expand it instead", name),
                    )
                })?;
                projection.push(member, value, Some(FieldAccessor::Member(name)));
            }
            SelectItem::Computed(computed) => {
                if projection.contains(&computed.alias) || projection.has_field(&computed.alias) {
                    return Err(unsupported(
                        context,
                        format!("duplicate field '{}'", computed.alias),
                    ));
                }
                let value = translator.translate(&computed.expression)?;
                if let Some(constant) = value.constant() {
                    projection.fields.push(EntryField {
                        name: computed.alias.clone(),
                        accessor: FieldAccessor::Constant(constant.clone()),
                    });
                    continue;
                }
                let member = scalar_member(&computed.alias, &value.ty()).ok_or_else(|| {
                    unsupported(
                        context,
                        format!("computed '{}' must be a scalar", computed.alias),
                    )
                })?;
                projection.push(
                    member,
                    value,
                    Some(FieldAccessor::Member(computed.alias.clone())),
                );
            }
            SelectItem::Expand(expand_item) => {
                if projection.contains(&expand_item.navigation) {
                    return Err(unsupported(
                        context,
                        format!("'{}' expanded twice", expand_item.navigation),
                    ));
                }
                expand(&mut projection, expand_item, context, options)?;
            }
        }
    }

    // Ordering expressions keep every property they read
    for path in protected.iter().flat_map(|item| item.expression.property_paths()) {
        let name = path.to_string();
        if projection.contains(&name) {
            continue;
        }
        let value = translator.resolve_path(path)?;
        let member = match value.ty() {
            ExprType::Collection(shape) => Some(Member {
                name,
                ty: MemberType::Collection(shape),
                hidden: true,
            }),
            ty => scalar_member(&name, &ty).map(|mut member| {
                member.hidden = true;
                member
            }),
        };
        if let Some(member) = member {
            projection.push(member, value, None);
        }
    }

    // The projection keeps its identity only when every key survives
    let parameter = context.parameter();
    let keys: Option<Vec<String>> = context
        .shape()
        .keys()
        .iter()
        .map(|key| {
            projection
                .values
                .iter()
                .position(|value| value.member_of(parameter) == Some(key.as_str()))
                .map(|i| projection.members[i].name.clone())
        })
        .collect();

    let Projection {
        members,
        values,
        fields,
    } = projection;

    let shape = Arc::new(Shape::new(
        &format!("{}Projection", context.shape().name()),
        ShapeKind::Projection,
        members,
        keys.unwrap_or_default(),
    ));
    let selector = Lambda::new(
        parameter.clone(),
        Expr::Record {
            shape: shape.clone(),
            fields: values,
        },
    );
    let expression = OperatorResolver::new(Clause::Select, context.path()).select(source, selector)?;

    log::debug!(
        "Projected {} to {} fields ({} members)",
        context.shape().name(),
        fields.len(),
        shape.members().len()
    );

    let factory = EntryFactory::new(entity_set, fields);
    Ok(StageOutput::rebound(expression, context.rebind(shape), Some(factory)))
}
