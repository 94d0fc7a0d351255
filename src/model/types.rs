//! Declared field types and their textual form, e.g. `List<OrderLine>` or `Map<String,Long>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared type of a record field.
///
/// `Named` is either another record type or an alias declared in the schema
/// document (a user collection type whose supertype is a collection).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeTag {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    String,
    Instant,
    Object,
    List(Box<TypeTag>),
    Set(Box<TypeTag>),
    Collection(Box<TypeTag>),
    Map(Box<TypeTag>, Box<TypeTag>),
    Named(String),
}

/// Concrete container used to initialize a collection field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    List,
    Set,
    Map,
}

impl TypeTag {
    pub fn named(name: impl Into<String>) -> Self {
        TypeTag::Named(name.into())
    }

    pub fn list_of(element: TypeTag) -> Self {
        TypeTag::List(Box::new(element))
    }

    /// Structural collection check; aliases must be resolved through the type catalog first.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            TypeTag::List(_) | TypeTag::Set(_) | TypeTag::Collection(_) | TypeTag::Map(_, _)
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, TypeTag::Boolean)
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, TypeTag::Integer | TypeTag::Long)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, TypeTag::Float | TypeTag::Double)
    }

    pub fn container(&self) -> Option<ContainerKind> {
        match self {
            TypeTag::List(_) | TypeTag::Collection(_) => Some(ContainerKind::List),
            TypeTag::Set(_) => Some(ContainerKind::Set),
            TypeTag::Map(_, _) => Some(ContainerKind::Map),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeTag::Named(n) => Some(n.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Boolean => f.write_str("Boolean"),
            TypeTag::Integer => f.write_str("Integer"),
            TypeTag::Long => f.write_str("Long"),
            TypeTag::Float => f.write_str("Float"),
            TypeTag::Double => f.write_str("Double"),
            TypeTag::String => f.write_str("String"),
            TypeTag::Instant => f.write_str("Instant"),
            TypeTag::Object => f.write_str("Object"),
            TypeTag::List(t) => write!(f, "List<{}>", t),
            TypeTag::Set(t) => write!(f, "Set<{}>", t),
            TypeTag::Collection(t) => write!(f, "Collection<{}>", t),
            TypeTag::Map(k, v) => write!(f, "Map<{},{}>", k, v),
            TypeTag::Named(n) => f.write_str(n),
        }
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let mut parser = Parser { src: &compact, pos: 0 };
        let tag = parser.parse_tag()?;
        if parser.pos != compact.len() {
            return Err(format!("unexpected trailing input in type '{}'", s));
        }
        Ok(tag)
    }
}

impl TryFrom<String> for TypeTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.to_string()
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn parse_tag(&mut self) -> Result<TypeTag, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let ident = &self.src[start..self.pos];
        if ident.is_empty() {
            return Err(format!("expected type name at offset {} in '{}'", start, self.src));
        }
        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                args.push(self.parse_tag()?);
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(format!("unclosed type arguments in '{}'", self.src)),
                }
            }
        }
        build(ident, args)
    }
}

fn build(ident: &str, mut args: Vec<TypeTag>) -> Result<TypeTag, String> {
    // java.util.List and List are the same thing here
    let simple = ident.rsplit('.').next().unwrap_or(ident);
    let object = || Box::new(TypeTag::Object);
    let tag = match (simple, args.len()) {
        ("boolean" | "Boolean", 0) => TypeTag::Boolean,
        ("int" | "Integer" | "short" | "Short" | "byte" | "Byte", 0) => TypeTag::Integer,
        ("long" | "Long", 0) => TypeTag::Long,
        ("float" | "Float", 0) => TypeTag::Float,
        ("double" | "Double" | "BigDecimal", 0) => TypeTag::Double,
        ("String", 0) => TypeTag::String,
        ("Instant" | "Date" | "OffsetDateTime" | "LocalDateTime", 0) => TypeTag::Instant,
        ("Object", 0) => TypeTag::Object,
        ("List", 0) => TypeTag::List(object()),
        ("Set", 0) => TypeTag::Set(object()),
        ("Collection", 0) => TypeTag::Collection(object()),
        ("Map", 0) => TypeTag::Map(object(), object()),
        ("List", 1) => TypeTag::List(Box::new(args.remove(0))),
        ("Set", 1) => TypeTag::Set(Box::new(args.remove(0))),
        ("Collection", 1) => TypeTag::Collection(Box::new(args.remove(0))),
        ("Map", 2) => {
            let value = args.remove(1);
            let key = args.remove(0);
            TypeTag::Map(Box::new(key), Box::new(value))
        }
        (_, 0) => TypeTag::Named(simple.to_string()),
        (_, n) => return Err(format!("type '{}' does not take {} type argument(s)", ident, n)),
    };
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_generics() {
        let tag: TypeTag = "Map<String, List<OrderLine>>".parse().unwrap();
        assert_eq!(
            tag,
            TypeTag::Map(
                Box::new(TypeTag::String),
                Box::new(TypeTag::list_of(TypeTag::named("OrderLine")))
            )
        );
        assert_eq!(tag.to_string(), "Map<String,List<OrderLine>>");
    }

    #[test]
    fn raw_collections_default_to_object_elements() {
        assert_eq!("java.util.Set".parse::<TypeTag>().unwrap(), TypeTag::Set(Box::new(TypeTag::Object)));
        assert_eq!(
            "Map".parse::<TypeTag>().unwrap(),
            TypeTag::Map(Box::new(TypeTag::Object), Box::new(TypeTag::Object))
        );
    }

    #[test]
    fn rejects_malformed_types() {
        assert!("List<String".parse::<TypeTag>().is_err());
        assert!("Long<String>".parse::<TypeTag>().is_err());
        assert!("".parse::<TypeTag>().is_err());
        assert!("List<String>>".parse::<TypeTag>().is_err());
    }
}
