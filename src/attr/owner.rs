//! The `owner` view (§4.5): a single file-owner principal.

use std::time::SystemTime;

use super::{AttributeProvider, AttributeSpec};
use crate::error::{FsErrorKind, FsResult};
use crate::file::{AttributeValue, File};

const ATTRIBUTES: &[AttributeSpec] = &[AttributeSpec {
    name: "owner",
    gettable: true,
    settable: true,
    settable_on_create: true,
    accepted_types: &["text"],
}];

/// The storage key this view's attribute is kept under in a file's generic
/// attribute map.
const OWNER_KEY: &str = "owner:owner";

/// The file-owner principal view.
#[derive(Debug, Clone)]
pub struct OwnerAttributeView {
    default_owner: String,
}

impl OwnerAttributeView {
    /// Construct a view whose newly created files default to `default_owner`.
    pub fn new(default_owner: impl Into<String>) -> Self {
        OwnerAttributeView {
            default_owner: default_owner.into(),
        }
    }
}

impl Default for OwnerAttributeView {
    fn default() -> Self {
        OwnerAttributeView::new("nobody")
    }
}

impl AttributeProvider for OwnerAttributeView {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        ATTRIBUTES
    }

    fn set_initial(&self, file: &File, _now: SystemTime) {
        file.state_mut()
            .attributes
            .insert(OWNER_KEY.to_string(), AttributeValue::Text(self.default_owner.clone()));
    }

    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue> {
        if attr != "owner" {
            return None;
        }
        file.state().attributes.get(OWNER_KEY).cloned()
    }

    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()> {
        if attr != "owner" {
            return Err(FsErrorKind::IllegalAttribute.into());
        }
        file.state_mut().attributes.insert(OWNER_KEY.to_string(), value);
        Ok(())
    }
}
