//! Identifier casing for synthesized names: accessors, collection helpers, artifact names.

/// Upper-case the first character: "lineItems" -> "LineItems".
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "paid" (boolean) -> "isPaid", "total" -> "getTotal".
pub fn getter_name(field: &str, boolean: bool) -> String {
    let prefix = if boolean { "is" } else { "get" };
    format!("{}{}", prefix, capitalize(field))
}

pub fn setter_name(field: &str) -> String {
    format!("set{}", capitalize(field))
}

pub fn add_item_name(field: &str) -> String {
    format!("add{}Item", capitalize(field))
}

pub fn put_entry_name(field: &str) -> String {
    format!("put{}Entry", capitalize(field))
}

pub fn clear_name(field: &str) -> String {
    format!("clear{}", capitalize(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_names() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("éclair"), "Éclair");
        assert_eq!(getter_name("paid", true), "isPaid");
        assert_eq!(getter_name("total", false), "getTotal");
        assert_eq!(setter_name("lineItems"), "setLineItems");
        assert_eq!(add_item_name("tags"), "addTagsItem");
        assert_eq!(put_entry_name("attributes"), "putAttributesEntry");
        assert_eq!(clear_name("tags"), "clearTags");
    }
}
