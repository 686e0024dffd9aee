//! Selection actions.
use serde::{Deserialize, Serialize};

/// How a [`SelectAction`] describes the elements to deselect.
///
/// The protocol allows either an explicit id list or a "drop the whole
/// current selection first" flag; the two are mutually exclusive on the
/// wire (`deselectedElementsIDs` vs `deselectAll`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deselect {
    /// Deselect exactly these element ids.
    Ids(Vec<String>),
    /// Deselect everything currently selected (`true`) or nothing (`false`).
    All(bool),
}

/// Changes the current element selection (`elementSelected`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectAction {
    /// Ids of the elements to add to the selection.
    #[serde(rename = "selectedElementsIDs", default)]
    pub selected_elements_ids: Vec<String>,
    /// Ids of the elements to remove from the selection.
    #[serde(rename = "deselectedElementsIDs", default)]
    pub deselected_elements_ids: Vec<String>,
    /// Whether the whole current selection is dropped before selecting.
    #[serde(rename = "deselectAll", default)]
    pub deselect_all: bool,
}

impl SelectAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "elementSelected";

    /// An empty selection change: nothing selected, nothing deselected.
    pub fn new() -> Self {
        Self {
            selected_elements_ids: Vec::new(),
            deselected_elements_ids: Vec::new(),
            deselect_all: false,
        }
    }

    /// Select `selected` and deselect per `deselect`.
    ///
    /// With [`Deselect::Ids`] the list is used verbatim and `deselectAll`
    /// stays false; with [`Deselect::All`] the flag is taken as given and
    /// the id list stays empty.
    pub fn create(selected: Vec<String>, deselect: Deselect) -> Self {
        match deselect {
            Deselect::Ids(ids) => Self {
                selected_elements_ids: selected,
                deselected_elements_ids: ids,
                deselect_all: false,
            },
            Deselect::All(flag) => Self {
                selected_elements_ids: selected,
                deselected_elements_ids: Vec::new(),
                deselect_all: flag,
            },
        }
    }

    /// Select `selected` without deselecting anything.
    pub fn selecting(selected: Vec<String>) -> Self {
        Self::create(selected, Deselect::Ids(Vec::new()))
    }

    /// Replace the current selection with `selected`.
    pub fn replacing(selected: Vec<String>) -> Self {
        Self::create(selected, Deselect::All(true))
    }
}

impl Default for SelectAction {
    fn default() -> Self {
        Self::new()
    }
}

/// Selects or deselects all elements (`allSelected`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectAllAction {
    /// `true` selects everything, `false` clears the selection.
    #[serde(default = "default_select")]
    pub select: bool,
}

fn default_select() -> bool {
    true
}

impl SelectAllAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "allSelected";

    /// Select (`true`) or deselect (`false`) all elements.
    pub fn new(select: bool) -> Self {
        Self { select }
    }
}

impl Default for SelectAllAction {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_new_defaults() {
        let action = SelectAction::new();
        assert!(action.selected_elements_ids.is_empty());
        assert!(action.deselected_elements_ids.is_empty());
        assert!(!action.deselect_all);
    }

    #[test]
    fn select_create_with_id_list() {
        let action = SelectAction::create(
            vec!["a".into()],
            Deselect::Ids(vec!["b".into(), "c".into()]),
        );
        assert_eq!(action.selected_elements_ids, vec!["a"]);
        assert_eq!(action.deselected_elements_ids, vec!["b", "c"]);
        assert!(!action.deselect_all);
    }

    #[test]
    fn select_create_with_deselect_all_flag() {
        let action = SelectAction::create(vec!["a".into()], Deselect::All(true));
        assert_eq!(action.selected_elements_ids, vec!["a"]);
        assert!(action.deselected_elements_ids.is_empty());
        assert!(action.deselect_all);
    }

    #[test]
    fn select_create_with_deselect_all_false() {
        let action = SelectAction::create(vec![], Deselect::All(false));
        assert!(!action.deselect_all);
        assert!(action.deselected_elements_ids.is_empty());
    }

    #[test]
    fn select_replacing_sets_flag() {
        let action = SelectAction::replacing(vec!["x".into()]);
        assert!(action.deselect_all);
        assert_eq!(action.selected_elements_ids, vec!["x"]);
    }

    #[test]
    fn select_wire_field_names() {
        let action = SelectAction::create(
            vec!["n1".into()],
            Deselect::Ids(vec!["n2".into()]),
        );
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["selectedElementsIDs"][0], "n1");
        assert_eq!(value["deselectedElementsIDs"][0], "n2");
        assert_eq!(value["deselectAll"], false);
    }

    #[test]
    fn select_deserialize_missing_fields_defaults() {
        let action: SelectAction = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(action, SelectAction::new());
    }

    #[test]
    fn select_all_defaults_to_true() {
        assert!(SelectAllAction::default().select);
        let action: SelectAllAction = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(action.select);
    }

    #[test]
    fn select_all_explicit_false() {
        let action = SelectAllAction::new(false);
        let value = serde_json::to_value(action).unwrap();
        assert_eq!(value["select"], false);
    }
}
