//! The `user` view (§4.5): arbitrarily named, caller-defined attributes,
//! stored as raw bytes. Unlike every other view, its attribute names are not
//! a fixed table known in advance (see
//! [`AttributeProvider::is_dynamic`]).

use std::time::SystemTime;

use super::{AttributeProvider, AttributeSpec};
use crate::error::FsResult;
use crate::file::{AttributeValue, File};

/// User-defined attributes: any name, stored under `"user:<name>"` in the
/// file's generic attribute map.
#[derive(Debug, Default)]
pub struct UserAttributeView;

impl AttributeProvider for UserAttributeView {
    fn name(&self) -> &'static str {
        "user"
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        &[]
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn set_initial(&self, _file: &File, _now: SystemTime) {
        // No user-defined attributes exist until the caller sets one.
    }

    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue> {
        file.state().attributes.get(&format!("user:{attr}")).cloned()
    }

    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()> {
        file.state_mut().attributes.insert(format!("user:{attr}"), value);
        Ok(())
    }
}
