use serde::Deserialize;

/// Body for checking an item off (or back on) the list.
#[derive(Debug, Deserialize)]
pub struct ToggleItemRequest {
    pub name: String,
}
