use super::*;

/// Class attribute parsed once into its whole-token form. Membership is exact
/// token equality; substrings of longer tokens never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    pub(crate) fn parse(class_attr: Option<&str>) -> Self {
        let tokens = class_attr
            .map(|value| {
                value
                    .split_whitespace()
                    .map(ToOwned::to_owned)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Self { tokens }
    }

    pub(crate) fn contains(&self, class_name: &str) -> bool {
        self.tokens.iter().any(|token| token == class_name)
    }

    /// Returns `true` if the token was absent and got appended.
    pub(crate) fn add(&mut self, class_name: &str) -> bool {
        if self.contains(class_name) {
            return false;
        }
        self.tokens.push(class_name.to_string());
        true
    }

    /// Returns `true` if the token was present and got dropped.
    pub(crate) fn remove(&mut self, class_name: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|token| token != class_name);
        self.tokens.len() != before
    }

    /// Serialized attribute value, `None` when the token set is empty.
    pub(crate) fn to_attr(&self) -> Option<String> {
        if self.tokens.is_empty() {
            None
        } else {
            Some(self.tokens.join(" "))
        }
    }
}

impl Dom {
    /// Whole-token class membership. `false` for non-elements and for missing
    /// or empty class attributes; never an error.
    pub fn has_class(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id).is_some_and(|element| {
            ClassList::parse(element.attrs.get("class").map(String::as_str)).contains(class_name)
        })
    }

    /// Appends `class_name` to the element's class attribute unless already
    /// present. No-op on non-element nodes.
    pub fn add_class(&mut self, node_id: NodeId, class_name: &str) {
        self.mutate_class_list(node_id, |classes| classes.add(class_name));
    }

    /// Drops `class_name` from the element's class attribute. Removing the
    /// last token removes the attribute. No-op when absent or on non-element
    /// nodes.
    pub fn remove_class(&mut self, node_id: NodeId, class_name: &str) {
        self.mutate_class_list(node_id, |classes| classes.remove(class_name));
    }

    /// Flips membership of `class_name` and returns the new state. `false`
    /// for non-element nodes.
    pub fn toggle_class(&mut self, node_id: NodeId, class_name: &str) -> bool {
        if self.has_class(node_id, class_name) {
            self.remove_class(node_id, class_name);
            false
        } else if self.is_element(node_id) {
            self.add_class(node_id, class_name);
            true
        } else {
            false
        }
    }

    fn mutate_class_list(&mut self, node_id: NodeId, mutate: impl FnOnce(&mut ClassList) -> bool) {
        let Some(element) = self.element_mut(node_id) else {
            return;
        };
        let mut classes = ClassList::parse(element.attrs.get("class").map(String::as_str));
        if !mutate(&mut classes) {
            return;
        }
        match classes.to_attr() {
            Some(value) => {
                element.attrs.insert("class".to_string(), value);
            }
            None => {
                element.attrs.remove("class");
            }
        }
    }
}
