use indexmap::{map::Entry, IndexMap};
use remote::{Expr, Remote, Typed, ValueType};
use value::Value;

use crate::{CompileError, CompiledSchema, StepGenerator};

/// Authoring-time description of a schema: object types and their fields.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub(crate) query: String,
    pub(crate) objects: IndexMap<String, ObjectDefinition>,
}

impl SchemaDefinition {
    /// `query` names the root object type.
    pub fn builder(query: impl Into<String>) -> SchemaDefinitionBuilder {
        SchemaDefinitionBuilder {
            query: query.into(),
            objects: IndexMap::new(),
        }
    }

    pub fn query_type(&self) -> &str {
        &self.query
    }

    pub fn object(&self, name: &str) -> Option<&ObjectDefinition> {
        self.objects.get(name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.objects.values()
    }

    pub fn compile(&self) -> Result<CompiledSchema, CompileError> {
        StepGenerator::new(self).generate()
    }
}

pub struct SchemaDefinitionBuilder {
    query: String,
    objects: IndexMap<String, ObjectDefinition>,
}

impl SchemaDefinitionBuilder {
    /// Declaring an object that already exists extends it. Fields declared again replace the
    /// earlier declaration, which is how a resolver set is partially overridden.
    #[must_use]
    pub fn object(mut self, object: ObjectDefinition) -> Self {
        match self.objects.entry(object.name.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().extend(object),
            Entry::Vacant(entry) => {
                entry.insert(object);
            }
        }
        self
    }

    pub fn build(self) -> SchemaDefinition {
        SchemaDefinition {
            query: self.query,
            objects: self.objects,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub(crate) name: String,
    pub(crate) fields: IndexMap<String, FieldDefinition>,
}

impl ObjectDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectDefinition {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// The last declaration of a field name wins. It keeps the position of the first one.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FieldDefinition) -> Self {
        self.declare(name.into(), field);
        self
    }

    fn declare(&mut self, name: String, field: FieldDefinition) {
        if let Some(previous) = self.fields.get(&name) {
            tracing::debug!(
                r#type = %self.name,
                field = %name,
                previous = previous.binding.kind_name(),
                current = field.binding.kind_name(),
                "field redeclared, the last declaration wins"
            );
        }
        // Replacing keeps the original index.
        self.fields.insert(name, field);
    }

    fn extend(&mut self, other: ObjectDefinition) {
        for (name, field) in other.fields {
            self.declare(name, field);
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub(crate) ty: String,
    pub(crate) arguments: IndexMap<String, ArgumentDefinition>,
    pub(crate) binding: Binding,
}

/// How a field gets its value.
#[derive(Debug, Clone, Default)]
pub enum Binding {
    /// Reads the field's own name off the current value.
    #[default]
    NoResolver,
    Constant(Value),
    Expression {
        expr: Expr,
        /// Static result type of the builder the expression came from.
        output: ValueType,
    },
}

impl Binding {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Binding::NoResolver => "passthrough",
            Binding::Constant(_) => "constant",
            Binding::Expression { .. } => "expression",
        }
    }
}

impl FieldDefinition {
    /// `ty` is a GraphQL type reference such as `Int!` or `[Bar]`, checked when compiling.
    pub fn new(ty: impl Into<String>) -> Self {
        FieldDefinition {
            ty: ty.into(),
            arguments: IndexMap::new(),
            binding: Binding::NoResolver,
        }
    }

    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, argument: impl Into<ArgumentDefinition>) -> Self {
        self.arguments.insert(name.into(), argument.into());
        self
    }

    #[must_use]
    pub fn constant(self, value: impl Into<Value>) -> Self {
        self.bind(Binding::Constant(value.into()))
    }

    #[must_use]
    pub fn resolve<A: Typed>(self, remote: Remote<A>) -> Self {
        self.bind(Binding::Expression {
            expr: remote.into_expr(),
            output: A::value_type(),
        })
    }

    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    fn bind(mut self, binding: Binding) -> Self {
        if !matches!(self.binding, Binding::NoResolver) {
            tracing::debug!(
                previous = self.binding.kind_name(),
                current = binding.kind_name(),
                "resolver rebound, the last binding wins"
            );
        }
        self.binding = binding;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub(crate) ty: String,
    pub(crate) default: Option<Value>,
}

impl ArgumentDefinition {
    pub fn new(ty: impl Into<String>) -> Self {
        ArgumentDefinition {
            ty: ty.into(),
            default: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

impl From<&str> for ArgumentDefinition {
    fn from(ty: &str) -> Self {
        ArgumentDefinition::new(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclared_field_keeps_position_and_takes_last_binding() {
        let object = ObjectDefinition::new("Foo")
            .field("a", FieldDefinition::new("Int").constant(1))
            .field("b", FieldDefinition::new("Int"))
            .field("a", FieldDefinition::new("Int").constant(2));

        let fields = object.fields().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(fields, ["a", "b"]);
        assert!(matches!(object.fields["a"].binding, Binding::Constant(Value::Int(2))));
    }

    #[test]
    fn rebinding_keeps_only_the_last() {
        let field = FieldDefinition::new("Int")
            .resolve(Remote::<i64>::current(["x"]))
            .constant(3);
        assert!(matches!(field.binding(), Binding::Constant(Value::Int(3))));
    }

    #[test]
    fn redeclared_object_extends_the_first() {
        let schema = SchemaDefinition::builder("Query")
            .object(
                ObjectDefinition::new("Foo")
                    .field("a", FieldDefinition::new("Int"))
                    .field("c", FieldDefinition::new("Int")),
            )
            .object(ObjectDefinition::new("Foo").field("c", FieldDefinition::new("Int").constant(3)))
            .build();

        let foo = schema.object("Foo").unwrap();
        assert_eq!(foo.fields().map(|(name, _)| name).collect::<Vec<_>>(), ["a", "c"]);
        assert!(matches!(foo.fields["c"].binding, Binding::Constant(Value::Int(3))));
    }
}
