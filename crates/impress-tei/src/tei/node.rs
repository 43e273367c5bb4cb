//! In-memory element tree

/// An attribute as written in the source, prefix included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A child of an element, or a top-level node outside the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, unescaped
    Text(String),
    CData(String),
    /// Raw comment body
    Comment(String),
    /// Raw processing-instruction body (target and data)
    ProcessingInstruction(String),
    /// Raw DOCTYPE body; only valid in the prolog
    DocType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    fn is_character_data(&self) -> bool {
        matches!(self, Node::Text(_) | Node::CData(_))
    }
}

/// An element with its qualified name as written and its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn with_attributes(
        name: String,
        namespace: Option<String>,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            name,
            namespace,
            attributes,
            children: Vec::new(),
        }
    }

    /// Qualified name, e.g. `biblStruct` or `tei:biblStruct`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// True if the element has the given namespace URI and local name.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace() == Some(namespace) && self.local_name() == local_name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn push_node(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Leading character data before the first non-text child.
    ///
    /// `None` when the element starts with a child element or is empty.
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for node in self.children.iter().take_while(|n| n.is_character_data()) {
            let chunk = match node {
                Node::Text(t) | Node::CData(t) => t.as_str(),
                _ => continue,
            };
            text.get_or_insert_with(String::new).push_str(chunk);
        }
        text
    }

    /// Replace the leading character data, leaving child elements alone.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let leading = self
            .children
            .iter()
            .take_while(|n| n.is_character_data())
            .count();
        self.children.drain(..leading);
        self.children.insert(0, Node::Text(text.into()));
    }

    /// Append an element as the last child.
    pub fn append_child(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// An unattached element in this element's namespace, reusing its prefix.
    pub fn new_child(&self, local_name: &str) -> Element {
        let name = match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local_name),
            None => local_name.to_string(),
        };
        Element::new(name, self.namespace.clone())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First direct child element matching `pred`.
    pub fn find_child(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.child_elements().find(|el| pred(el))
    }

    pub fn find_child_mut(&mut self, pred: impl Fn(&Element) -> bool) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|el| pred(el))
    }

    /// First descendant (not self) matching `pred`, in document order.
    pub fn find_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_descendant_mut(
        &mut self,
        pred: &dyn Fn(&Element) -> bool,
    ) -> Option<&mut Element> {
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (not self) matching `pred`, in document order.
    pub fn find_descendants(&self, pred: &dyn Fn(&Element) -> bool) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(pred, &mut found);
        found
    }

    fn collect_descendants<'a>(
        &'a self,
        pred: &dyn Fn(&Element) -> bool,
        found: &mut Vec<&'a Element>,
    ) {
        for child in self.child_elements() {
            if pred(child) {
                found.push(child);
            }
            child.collect_descendants(pred, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";

    fn el(name: &str) -> Element {
        Element::new(name, Some(NS.to_string()))
    }

    #[test]
    fn test_names() {
        let prefixed = el("tei:imprint");
        assert_eq!(prefixed.prefix(), Some("tei"));
        assert_eq!(prefixed.local_name(), "imprint");
        assert!(prefixed.is(NS, "imprint"));
        assert!(!prefixed.is("urn:other", "imprint"));

        let plain = el("imprint");
        assert_eq!(plain.prefix(), None);
        assert_eq!(plain.local_name(), "imprint");
    }

    #[test]
    fn test_new_child_reuses_prefix() {
        let parent = el("tei:imprint");
        let child = parent.new_child("date");
        assert_eq!(child.name(), "tei:date");
        assert_eq!(child.namespace(), Some(NS));
    }

    #[test]
    fn test_text_and_set_text() {
        let mut date = el("date");
        assert_eq!(date.text(), None);

        date.set_text("1859");
        assert_eq!(date.text().as_deref(), Some("1859"));

        date.set_text("1860-03");
        assert_eq!(date.children().len(), 1);
        assert_eq!(date.text().as_deref(), Some("1860-03"));
    }

    #[test]
    fn test_set_text_keeps_child_elements() {
        let mut note = el("note");
        note.push_node(Node::Text("old ".into()));
        note.push_node(Node::CData("cdata".into()));
        note.append_child(el("ref"));
        note.push_node(Node::Text(" tail".into()));

        assert_eq!(note.text().as_deref(), Some("old cdata"));
        note.set_text("new");
        assert_eq!(note.text().as_deref(), Some("new"));
        assert_eq!(note.children().len(), 3);
        assert_eq!(note.child_elements().count(), 1);
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut note = el("note");
        note.set_attr("type", "summary");
        note.set_attr("n", "1");
        note.set_attr("type", "bibliographic");
        assert_eq!(note.attr("type"), Some("bibliographic"));
        assert_eq!(note.attributes()[0].name, "type");
        assert_eq!(note.attributes().len(), 2);
    }

    #[test]
    fn test_find_descendants_in_document_order() {
        let mut root = el("listBibl");
        let mut first = el("biblStruct");
        first.set_attr("n", "1");
        let mut nested = el("biblStruct");
        nested.set_attr("n", "2");
        first.append_child(nested);
        let mut second = el("biblStruct");
        second.set_attr("n", "3");
        root.append_child(first);
        root.append_child(second);

        let is_bibl = |e: &Element| e.local_name() == "biblStruct";
        let order: Vec<_> = root
            .find_descendants(&is_bibl)
            .iter()
            .filter_map(|e| e.attr("n"))
            .collect();
        assert_eq!(order, vec!["1", "2", "3"]);

        assert_eq!(root.find_descendant(&is_bibl).and_then(|e| e.attr("n")), Some("1"));
        assert!(root.find_descendant(&|e: &Element| e.local_name() == "listBibl").is_none());

        let second = root
            .find_descendant_mut(&|e: &Element| e.attr("n") == Some("3"))
            .unwrap();
        second.set_text("found");
        assert_eq!(
            root.find_descendant(&|e: &Element| e.attr("n") == Some("3"))
                .and_then(Element::text)
                .as_deref(),
            Some("found")
        );
    }

    #[test]
    fn test_find_child_is_direct_only() {
        let mut imprint = el("imprint");
        let mut publisher = el("publisher");
        publisher.append_child(el("date"));
        imprint.append_child(publisher);

        assert!(imprint.find_child(|e| e.local_name() == "date").is_none());
        assert!(imprint.find_child_mut(|e| e.local_name() == "publisher").is_some());
    }
}
