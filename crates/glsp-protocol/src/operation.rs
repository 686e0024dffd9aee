//! Operations — actions that mutate the model.
//!
//! Operations are undoable requests. On the wire they carry
//! `isOperation: true` in addition to their `kind`; the [`crate::action`]
//! module injects and recognizes that marker.
use serde::{Deserialize, Serialize};

/// A position in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Creates a new node element (`createNode`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeOperation {
    /// The element type to instantiate.
    pub element_type_id: String,
    /// Where the node is placed, if the caller has a position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Point>,
    /// Id of the container element, absent for top-level nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl CreateNodeOperation {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "createNode";

    /// Create a top-level node of `element_type_id` with no position.
    pub fn new(element_type_id: impl Into<String>) -> Self {
        Self {
            element_type_id: element_type_id.into(),
            location: None,
            container_id: None,
        }
    }

    /// Place the node at `location`.
    pub fn at(mut self, location: Point) -> Self {
        self.location = Some(location);
        self
    }

    /// Create the node inside the container with `container_id`.
    pub fn in_container(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = Some(container_id.into());
        self
    }
}

/// Deletes elements from the model (`deleteElement`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteElementOperation {
    /// Ids of the elements to delete.
    pub element_ids: Vec<String>,
}

impl DeleteElementOperation {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "deleteElement";

    /// Delete the elements with the given ids.
    pub fn new(element_ids: Vec<String>) -> Self {
        Self { element_ids }
    }
}

/// Applies an ordered list of operations as a single undo step
/// (`compound`).
///
/// Consumers must apply `operationList` strictly in order and treat the
/// whole compound as atomic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundOperation {
    /// The operations to apply, in order.
    #[serde(rename = "operationList")]
    pub operation_list: Vec<crate::action::Action>,
}

impl CompoundOperation {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "compound";

    /// Wrap `operation_list` into one atomic operation.
    pub fn new(operation_list: Vec<crate::action::Action>) -> Self {
        Self { operation_list }
    }
}
