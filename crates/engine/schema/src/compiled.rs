use indexmap::IndexMap;
use value::Value;

use crate::{ObjectId, Step, TypeRef};

/// Output of the [`crate::StepGenerator`].
///
/// Immutable once built and meant to be shared: an engine wraps it in an `Arc` and every
/// execution reads from it concurrently. It also serializes, so a compiled schema can be stored
/// and loaded without the authoring code.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompiledSchema {
    pub(crate) query: ObjectId,
    pub(crate) objects: Vec<CompiledObject>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompiledObject {
    pub name: String,
    /// In declaration order, which is the order of response keys by default.
    pub fields: IndexMap<String, CompiledField>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompiledField {
    pub name: String,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, CompiledArgument>,
    pub step: Step,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompiledArgument {
    pub ty: TypeRef,
    pub default: Option<Value>,
}

impl CompiledSchema {
    pub fn query_id(&self) -> ObjectId {
        self.query
    }

    pub fn query(&self) -> &CompiledObject {
        &self[self.query]
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &CompiledObject)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (ObjectId::from(index), object))
    }

    pub fn object_by_name(&self, name: &str) -> Option<&CompiledObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    /// The step bound to `type_name.field_name`.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&CompiledField> {
        self.object_by_name(type_name)?.fields.get(field_name)
    }
}

impl std::ops::Index<ObjectId> for CompiledSchema {
    type Output = CompiledObject;

    fn index(&self, id: ObjectId) -> &Self::Output {
        &self.objects[usize::from(id)]
    }
}
