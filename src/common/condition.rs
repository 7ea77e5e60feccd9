use crate::common;

use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};
use std::collections;

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogicalOperator {
    /// All conditions must be true.
    #[default]
    And,
    /// At least one condition must be true.
    Or,
}

impl LogicalOperator {
    fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Condition on a single attribute.
///
/// Key conditions on a sort key accept every variant except `Exists`, `NotExists` and
/// `NotEqual`; DynamoDB rejects those in a key condition expression.
///
/// ```rust
/// use dynamo_counter::common::condition;
///
/// let pending = condition::Condition::Equals("pending".to_string());
/// let recent: condition::Condition<String> = condition::Condition::BeginsWith("2024-".to_string());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition<T> {
    /// String prefix match.
    BeginsWith(String),
    /// Inclusive range.
    Between(T, T),
    /// `=`
    Equals(T),
    /// Attribute is present.
    Exists,
    /// `>`
    GreaterThan(T),
    /// `>=`
    GreaterThanOrEqual(T),
    /// `<`
    LessThan(T),
    /// `<=`
    LessThanOrEqual(T),
    /// `<>`
    NotEqual(T),
    /// Attribute is absent.
    NotExists,
}

impl<T: Serialize> Condition<T> {
    fn comparison(
        operator: &str,
        suffix: &str,
        value: T,
        path: &str,
        stem: &str,
        index: &mut usize,
    ) -> Result<(String, common::Item)> {
        let value = to_attribute_value(value)?;
        let value_placeholder = format!(":{stem}_{suffix}{index}");
        *index += 1;
        let expression = format!("{path} {operator} {value_placeholder}");
        Ok((expression, common::Item::from([(value_placeholder, value)])))
    }

    fn render(self, name: &str, index: &mut usize) -> Result<common::ExpressionInput> {
        let path = common::name_placeholder(name);
        let stem = common::placeholder_stem(name);
        let (expression, expression_attribute_values) = match self {
            Self::BeginsWith(prefix) => {
                let value_placeholder = format!(":{stem}_begins_with{index}");
                *index += 1;
                let expression = format!("begins_with({path}, {value_placeholder})");
                let values = common::Item::from([(
                    value_placeholder,
                    aws_sdk_dynamodb::types::AttributeValue::S(prefix),
                )]);
                (expression, values)
            }
            Self::Between(low, high) => {
                let low = to_attribute_value(low)?;
                let high = to_attribute_value(high)?;
                let low_placeholder = format!(":{stem}_between{index}");
                *index += 1;
                let high_placeholder = format!(":{stem}_between{index}");
                *index += 1;
                let expression = format!("{path} BETWEEN {low_placeholder} AND {high_placeholder}");
                let values = common::Item::from([(low_placeholder, low), (high_placeholder, high)]);
                (expression, values)
            }
            Self::Equals(value) => Self::comparison("=", "eq", value, &path, &stem, index)?,
            Self::Exists => (format!("attribute_exists({path})"), common::Item::new()),
            Self::GreaterThan(value) => Self::comparison(">", "gt", value, &path, &stem, index)?,
            Self::GreaterThanOrEqual(value) => {
                Self::comparison(">=", "gte", value, &path, &stem, index)?
            }
            Self::LessThan(value) => Self::comparison("<", "lt", value, &path, &stem, index)?,
            Self::LessThanOrEqual(value) => {
                Self::comparison("<=", "lte", value, &path, &stem, index)?
            }
            Self::NotEqual(value) => Self::comparison("<>", "ne", value, &path, &stem, index)?,
            Self::NotExists => (format!("attribute_not_exists({path})"), common::Item::new()),
        };
        let expression_attribute_names = collections::HashMap::from([(path, name.to_string())]);
        Ok(common::ExpressionInput {
            expression,
            expression_attribute_names,
            expression_attribute_values,
        })
    }
}

/// Condition applied to a named attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeCondition<T> {
    /// The condition to apply to the attribute.
    pub condition: Condition<T>,
    /// The name of the attribute to apply the condition to.
    pub name: String,
}

impl<T> AttributeCondition<T> {
    /// `condition` on attribute `name`.
    pub fn new(name: impl Into<String>, condition: Condition<T>) -> Self {
        Self {
            condition,
            name: name.into(),
        }
    }
}

impl<T: Serialize> AttributeCondition<T> {
    pub(crate) fn render(self, index: &mut usize) -> Result<common::ExpressionInput> {
        self.condition.render(&self.name, index)
    }
}

/// Key condition expression: equality on the partition key, optionally followed by a
/// condition on the sort key.
pub(crate) fn key_condition<T: Serialize>(
    partition_key: common::key::Key<T>,
    sort_key_condition: Option<AttributeCondition<T>>,
    index: &mut usize,
) -> Result<common::ExpressionInput> {
    let mut conditions = vec![AttributeCondition::new(
        partition_key.name,
        Condition::Equals(partition_key.value),
    )];
    conditions.extend(sort_key_condition);
    let mut operations = Vec::with_capacity(conditions.len());
    for condition in conditions {
        operations.push(condition.render(index)?);
    }
    Ok(common::ExpressionInput::merge(
        LogicalOperator::And.separator(),
        operations,
    ))
}

/// Conditions joined by one logical operator, used as a filter or as a write condition.
///
/// ```rust
/// use dynamo_counter::common::condition;
///
/// let filter = condition::Filter::all(vec![condition::AttributeCondition::new(
///     "status",
///     condition::Condition::Equals("pending".to_string()),
/// )]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Filter<T> {
    /// The conditions to combine.
    pub conditions: Vec<AttributeCondition<T>>,
    /// How the conditions are combined.
    pub operator: LogicalOperator,
}

impl<T> Filter<T> {
    /// Every condition must hold.
    pub fn all(conditions: Vec<AttributeCondition<T>>) -> Self {
        Self {
            conditions,
            operator: LogicalOperator::And,
        }
    }

    /// At least one condition must hold.
    pub fn any(conditions: Vec<AttributeCondition<T>>) -> Self {
        Self {
            conditions,
            operator: LogicalOperator::Or,
        }
    }
}

impl<T: Serialize> Filter<T> {
    /// Render with value placeholders numbered from `index`.
    pub(crate) fn render(self, index: &mut usize) -> Result<common::ExpressionInput> {
        let mut operations = Vec::with_capacity(self.conditions.len());
        for condition in self.conditions {
            operations.push(condition.render(index)?);
        }
        Ok(common::ExpressionInput::merge(
            self.operator.separator(),
            operations,
        ))
    }
}

impl<T: Serialize> TryFrom<Filter<T>> for common::ExpressionInput {
    type Error = Error;

    fn try_from(filter: Filter<T>) -> Result<Self> {
        filter.render(&mut 0)
    }
}
