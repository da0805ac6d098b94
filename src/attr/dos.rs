//! The `dos` view (§4.5): legacy FAT/DOS attribute bits. Inherits `basic`.

use std::time::SystemTime;

use super::{AttributeProvider, AttributeSpec};
use crate::error::{FsErrorKind, FsResult};
use crate::file::{AttributeValue, File};

const ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec { name: "readonly", gettable: true, settable: true, settable_on_create: false, accepted_types: &["bool"] },
    AttributeSpec { name: "hidden", gettable: true, settable: true, settable_on_create: false, accepted_types: &["bool"] },
    AttributeSpec { name: "archive", gettable: true, settable: true, settable_on_create: false, accepted_types: &["bool"] },
    AttributeSpec { name: "system", gettable: true, settable: true, settable_on_create: false, accepted_types: &["bool"] },
];

fn key(attr: &str) -> String {
    format!("dos:{attr}")
}

/// Legacy FAT/DOS boolean attribute bits, none settable at creation time.
#[derive(Debug, Default)]
pub struct DosAttributeView;

impl AttributeProvider for DosAttributeView {
    fn name(&self) -> &'static str {
        "dos"
    }

    fn inherits(&self) -> &'static [&'static str] {
        &["basic"]
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        ATTRIBUTES
    }

    fn set_initial(&self, file: &File, _now: SystemTime) {
        let mut state = file.state_mut();
        for attr_spec in ATTRIBUTES {
            state.attributes.insert(key(attr_spec.name), AttributeValue::Bool(false));
        }
    }

    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue> {
        if !ATTRIBUTES.iter().any(|s| s.name == attr) {
            return None;
        }
        file.state().attributes.get(&key(attr)).cloned()
    }

    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()> {
        if !ATTRIBUTES.iter().any(|s| s.name == attr) {
            return Err(FsErrorKind::IllegalAttribute.into());
        }
        file.state_mut().attributes.insert(key(attr), value);
        Ok(())
    }
}
