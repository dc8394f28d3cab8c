use async_graphql_parser::{
    types::{ExecutableDocument, Field, Selection, SelectionSet},
    Positioned,
};
use itertools::Itertools;

use crate::Location;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub(crate) enum ValidationError {
    #[error("Query is nested too deep.")]
    QueryTooDeep { depth: usize, location: Location },
    #[error("Fragment cycle detected: {}", .cycle.iter().join(", "))]
    FragmentCycle { cycle: Vec<String>, location: Location },
}

impl ValidationError {
    pub fn location(&self) -> Location {
        match self {
            ValidationError::QueryTooDeep { location, .. } | ValidationError::FragmentCycle { location, .. } => {
                *location
            }
        }
    }
}

/// Checks run before binding: fragments spreading themselves would never finish binding.
pub(crate) fn validate(
    document: &ExecutableDocument,
    selection_set: &Positioned<SelectionSet>,
    max_depth: Option<usize>,
) -> Result<(), ValidationError> {
    Visitor {
        document,
        current_fragments_stack: Vec::new(),
        current_depth: 0,
        max_depth: max_depth.unwrap_or(usize::MAX),
    }
    .visit_selection_set(selection_set)
}

struct Visitor<'p> {
    document: &'p ExecutableDocument,
    current_fragments_stack: Vec<&'p str>,
    current_depth: usize,
    max_depth: usize,
}

impl<'p> Visitor<'p> {
    fn visit_selection_set(&mut self, selection_set: &'p Positioned<SelectionSet>) -> Result<(), ValidationError> {
        for item in &selection_set.node.items {
            match &item.node {
                Selection::Field(field) => self.visit_field(field)?,
                Selection::FragmentSpread(spread) => {
                    let name = &spread.node.fragment_name;
                    self.visit_fragment_spread(name.node.as_str(), name.pos.into())?;
                }
                Selection::InlineFragment(fragment) => self.visit_selection_set(&fragment.node.selection_set)?,
            }
        }
        Ok(())
    }

    fn visit_field(&mut self, field: &'p Positioned<Field>) -> Result<(), ValidationError> {
        self.current_depth += 1;
        if self.current_depth > self.max_depth {
            return Err(ValidationError::QueryTooDeep {
                depth: self.current_depth,
                location: field.node.name.pos.into(),
            });
        }
        self.visit_selection_set(&field.node.selection_set)?;
        self.current_depth -= 1;
        Ok(())
    }

    fn visit_fragment_spread(&mut self, fragment_name: &'p str, location: Location) -> Result<(), ValidationError> {
        if self.current_fragments_stack.contains(&fragment_name) {
            self.current_fragments_stack.push(fragment_name);
            return Err(ValidationError::FragmentCycle {
                cycle: std::mem::take(&mut self.current_fragments_stack)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                location,
            });
        }

        // Unknown fragments are reported while binding.
        let Some(fragment) = self
            .document
            .fragments
            .iter()
            .find_map(|(name, fragment)| (name.as_str() == fragment_name).then_some(fragment))
        else {
            return Ok(());
        };

        self.current_fragments_stack.push(fragment_name);
        self.visit_selection_set(&fragment.node.selection_set)?;
        self.current_fragments_stack.pop();

        Ok(())
    }
}
