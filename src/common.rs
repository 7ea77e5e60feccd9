//! Keys and condition expressions.
//!
//! Attribute names are always referenced through `#name` placeholders and values through
//! `:name` placeholders, so reserved words such as `status` can be used as attribute names
//! without any special handling by the caller.

/// Condition expressions for key conditions, filters and conditional writes.
pub mod condition;

/// Key types for identifying items in DynamoDB tables.
pub mod key;

use aws_sdk_dynamodb::types;
use std::collections;

/// A DynamoDB item: attribute name to attribute value.
pub type Item = collections::HashMap<String, types::AttributeValue>;

/// Placeholder-safe form of an attribute name: anything but ASCII alphanumerics and `_`
/// becomes `_`. Distinct names may share a stem; merging renames the later placeholder.
pub(crate) fn placeholder_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// `#name` placeholder for an attribute name.
pub(crate) fn name_placeholder(name: &str) -> String {
    format!("#{}", placeholder_stem(name))
}

fn join_expressions(left: String, separator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{separator}{right}")
    }
}

/// Rendered expression plus the placeholders it uses.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: Item,
}

/// Replace every `from` placeholder token in `expression` with `to`. A token ends at the
/// first character that cannot appear in a placeholder.
fn rename_placeholder(expression: &str, from: &str, to: &str) -> String {
    let mut renamed = String::with_capacity(expression.len());
    let mut rest = expression;
    while let Some(position) = rest.find(from) {
        let end = position + from.len();
        let whole_token = rest[end..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
        renamed.push_str(&rest[..position]);
        renamed.push_str(if whole_token { to } else { from });
        rest = &rest[end..];
    }
    renamed.push_str(rest);
    renamed
}

/// Move `placeholders` into `claimed`. A placeholder already claimed for a different name or
/// value gets the first free `_1`, `_2`, ... suffix, and `expression` is rewritten to match.
fn claim_placeholders<V: PartialEq>(
    claimed: &mut collections::HashMap<String, V>,
    placeholders: collections::HashMap<String, V>,
    expression: &mut String,
) {
    let incoming: Vec<String> = placeholders.keys().cloned().collect();
    for (placeholder, value) in placeholders {
        let placeholder = match claimed.get(&placeholder) {
            Some(existing) if *existing != value => {
                let mut suffix = 1;
                let free = loop {
                    let candidate = format!("{placeholder}_{suffix}");
                    let available = !incoming.contains(&candidate)
                        && claimed
                            .get(&candidate)
                            .is_none_or(|existing| *existing == value);
                    if available {
                        break candidate;
                    }
                    suffix += 1;
                };
                *expression = rename_placeholder(expression, &placeholder, &free);
                free
            }
            _ => placeholder,
        };
        claimed.insert(placeholder, value);
    }
}

impl ExpressionInput {
    /// Join expressions with `separator`, collecting their placeholders.
    pub(crate) fn merge(separator: &str, items: Vec<Self>) -> Self {
        let mut merged = Self::default();
        for item in items {
            let mut expression = item.expression;
            claim_placeholders(
                &mut merged.expression_attribute_names,
                item.expression_attribute_names,
                &mut expression,
            );
            claim_placeholders(
                &mut merged.expression_attribute_values,
                item.expression_attribute_values,
                &mut expression,
            );
            merged.expression = join_expressions(merged.expression, separator, expression);
        }
        merged
    }

    /// Move the placeholders into a request's maps and hand back the expression string.
    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<Item>,
    ) -> String {
        let mut expression = self.expression;
        if !self.expression_attribute_names.is_empty() {
            claim_placeholders(
                names.get_or_insert_with(collections::HashMap::new),
                self.expression_attribute_names,
                &mut expression,
            );
        }
        if !self.expression_attribute_values.is_empty() {
            claim_placeholders(
                values.get_or_insert_with(collections::HashMap::new),
                self.expression_attribute_values,
                &mut expression,
            );
        }
        expression
    }
}
