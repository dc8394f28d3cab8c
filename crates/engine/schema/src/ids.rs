/// Index of an object type inside a [`crate::CompiledSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ObjectId(u32);

impl From<usize> for ObjectId {
    fn from(index: usize) -> Self {
        ObjectId(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl From<ObjectId> for usize {
    fn from(id: ObjectId) -> Self {
        id.0 as usize
    }
}
