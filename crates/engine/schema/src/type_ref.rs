use std::{fmt, str::FromStr};

use async_graphql_parser::types as ast;

/// Output or input type of a field, in GraphQL notation: `Int`, `[Bar]`, `[Bar!]!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TypeRef {
    pub base: BaseType,
    /// Non-null.
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BaseType {
    Named(String),
    List(Box<TypeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid type reference")]
pub struct TypeRefError(pub String);

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            base: BaseType::Named(name.into()),
            required: false,
        }
    }

    pub fn list(item: TypeRef) -> Self {
        TypeRef {
            base: BaseType::List(Box::new(item)),
            required: false,
        }
    }

    #[must_use]
    pub fn non_null(self) -> Self {
        TypeRef { required: true, ..self }
    }

    /// Name of the innermost named type.
    pub fn named_type(&self) -> &str {
        match &self.base {
            BaseType::Named(name) => name,
            BaseType::List(item) => item.named_type(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.base, BaseType::List(_))
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ast::Type::new(s.trim())
            .map(TypeRef::from)
            .ok_or_else(|| TypeRefError(s.to_owned()))
    }
}

impl From<ast::Type> for TypeRef {
    fn from(ty: ast::Type) -> Self {
        let base = match ty.base {
            ast::BaseType::Named(name) => BaseType::Named(name.to_string()),
            ast::BaseType::List(item) => BaseType::List(Box::new(TypeRef::from(*item))),
        };
        TypeRef {
            base,
            required: !ty.nullable,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            BaseType::Named(name) => f.write_str(name)?,
            BaseType::List(item) => write!(f, "[{item}]")?,
        }
        if self.required {
            f.write_str("!")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Int")]
    #[case("Int!")]
    #[case("[Bar]")]
    #[case("[Bar!]!")]
    #[case("[[Float]!]")]
    fn parse_and_display(#[case] source: &str) {
        assert_eq!(source.parse::<TypeRef>().unwrap().to_string(), source);
    }

    #[test]
    fn structure() {
        let ty: TypeRef = "[Bar!]!".parse().unwrap();
        assert_eq!(ty, TypeRef::list(TypeRef::named("Bar").non_null()).non_null());
        assert_eq!(ty.named_type(), "Bar");
        assert!(ty.is_list());
    }

    #[test]
    fn invalid() {
        assert_eq!("[Bar".parse::<TypeRef>(), Err(TypeRefError("[Bar".into())));
    }
}
