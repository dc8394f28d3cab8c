/// The bare tag of a [`crate::Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Record,
    Sequence,
    Optional,
}
