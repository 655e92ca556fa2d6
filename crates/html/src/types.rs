use std::collections::HashMap;

use crate::style::{parse_style_declarations, render_style_declarations};

/// Opaque atom identifier for interned tag and attribute names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtomId(pub u32);

/// Name table shared by one token stream.
///
/// Invariant: names are stored ASCII-lowercased.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<String>,
    map: HashMap<String, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_ascii_lowercase(&mut self, name: &str) -> AtomId {
        if !name.bytes().any(|b| b.is_ascii_uppercase()) {
            if let Some(id) = self.map.get(name) {
                return *id;
            }
            return self.insert(name.to_string());
        }
        let folded = name.to_ascii_lowercase();
        if let Some(id) = self.map.get(folded.as_str()) {
            return *id;
        }
        self.insert(folded)
    }

    fn insert(&mut self, name: String) -> AtomId {
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(name.clone());
        self.map.insert(name, id);
        id
    }

    /// Resolve an id produced by this table. Ids from another table resolve to "".
    pub fn resolve(&self, id: AtomId) -> &str {
        self.atoms
            .get(id.0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[derive(Debug)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: AtomId,
        attributes: Vec<(AtomId, Option<String>)>,
        self_closing: bool,
    },
    EndTag(AtomId),
    Comment(String),
    Text(String),
}

/// Tokens plus the atom table their names resolve against.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    atoms: AtomTable,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, atoms: AtomTable) -> Self {
        Self { tokens, atoms }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

/// Owned HTML fragment tree.
///
/// `attributes` keeps source order and values and is what gets serialized.
/// `style` is the ordered declaration list parsed from the `style` attribute;
/// both views are kept in sync by [`Node::set_attr`] and
/// [`Node::set_style_property`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Fragment {
        children: Vec<Node>,
    },
    Element {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        style: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl Node {
    pub fn fragment(children: Vec<Node>) -> Self {
        Node::Fragment { children }
    }

    /// Build an element; `style` is derived from a `style` attribute if present.
    pub fn element(
        name: impl Into<String>,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<Node>,
    ) -> Self {
        let style = attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("style"))
            .and_then(|(_, v)| v.as_deref())
            .map(parse_style_declarations)
            .unwrap_or_default();
        Node::Element {
            name: name.into(),
            attributes,
            style,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, target: &str) -> bool {
        self.name().is_some_and(|name| name.eq_ignore_ascii_case(target))
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        let Node::Element { attributes, .. } = self else {
            return None;
        };
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_deref())
    }

    /// True if the whitespace-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    /// Replace or append an attribute, keeping the position of an existing one.
    pub fn set_attr(&mut self, key: &str, value: Option<String>) {
        let Node::Element {
            attributes, style, ..
        } = self
        else {
            return;
        };
        if key.eq_ignore_ascii_case("style") {
            *style = value
                .as_deref()
                .map(parse_style_declarations)
                .unwrap_or_default();
        }
        match attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some((_, v)) => *v = value,
            None => attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        if let Node::Element {
            attributes, style, ..
        } = self
        {
            if key.eq_ignore_ascii_case("style") {
                style.clear();
            }
            attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        }
    }

    /// Set one declaration and re-render the `style` attribute from the list.
    pub fn set_style_property(&mut self, property: &str, value: &str) {
        let Node::Element {
            attributes, style, ..
        } = self
        else {
            return;
        };
        match style
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
        {
            Some((_, v)) => *v = value.to_string(),
            None => style.push((property.to_string(), value.to_string())),
        }
        let rendered = render_style_declarations(style);
        match attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case("style"))
        {
            Some((_, v)) => *v = Some(rendered),
            None => attributes.push(("style".to_string(), Some(rendered))),
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Fragment { children } | Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Fragment { children } => Some(children),
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn into_children(self) -> Vec<Node> {
        match self {
            Node::Fragment { children } | Node::Element { children, .. } => children,
            _ => Vec::new(),
        }
    }

    /// Copy of this element without its children.
    pub fn shell(&self) -> Node {
        match self {
            Node::Element {
                name,
                attributes,
                style,
                ..
            } => Node::Element {
                name: name.clone(),
                attributes: attributes.clone(),
                style: style.clone(),
                children: Vec::new(),
            },
            Node::Fragment { .. } => Node::Fragment {
                children: Vec::new(),
            },
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_table_folds_ascii_case() {
        let mut atoms = AtomTable::new();
        let a = atoms.intern_ascii_lowercase("DIV");
        let b = atoms.intern_ascii_lowercase("div");
        assert_eq!(a, b);
        assert_eq!(atoms.resolve(a), "div");
        assert_eq!(atoms.len(), 1);
    }

    #[test]
    fn element_parses_style_attribute_once() {
        let node = Node::element(
            "span",
            vec![("style".into(), Some("color: red; font-weight:bold".into()))],
            Vec::new(),
        );
        let Node::Element { style, .. } = &node else {
            panic!("expected element");
        };
        assert_eq!(
            style,
            &vec![
                ("color".to_string(), "red".to_string()),
                ("font-weight".to_string(), "bold".to_string())
            ]
        );
    }

    #[test]
    fn set_style_property_keeps_views_in_sync() {
        let mut node = Node::element(
            "span",
            vec![
                ("class".into(), Some("x".into())),
                ("style".into(), Some("color: red;".into())),
            ],
            Vec::new(),
        );
        node.set_style_property("color", "green");
        node.set_style_property("text-decoration", "underline");
        assert_eq!(
            node.attr("style"),
            Some("color: green; text-decoration: underline;")
        );
        let Node::Element { attributes, .. } = &node else {
            panic!("expected element");
        };
        assert_eq!(attributes[0].0, "class", "attribute order must be kept");
    }

    #[test]
    fn has_class_matches_whole_tokens_only() {
        let node = Node::element(
            "span",
            vec![("class".into(), Some("os-line-number line-number-3".into()))],
            Vec::new(),
        );
        assert!(node.has_class("os-line-number"));
        assert!(node.has_class("line-number-3"));
        assert!(!node.has_class("line-number"));
    }
}
