//! The `posix` view (§4.5): POSIX permission bits plus a group principal.
//! Inherits `basic` and `owner`.

use std::time::SystemTime;

use super::{AttributeProvider, AttributeSpec};
use crate::error::{FsErrorKind, FsResult};
use crate::file::{AttributeValue, File};

const ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "permissions",
        gettable: true,
        settable: true,
        settable_on_create: true,
        accepted_types: &["string-set"],
    },
    AttributeSpec {
        name: "group",
        gettable: true,
        settable: true,
        settable_on_create: true,
        accepted_types: &["text"],
    },
];

const PERMISSIONS_KEY: &str = "posix:permissions";
const GROUP_KEY: &str = "posix:group";

/// The default permission set a newly created file gets: owner read/write,
/// group/other read-only.
fn default_permissions() -> Vec<String> {
    ["OWNER_READ", "OWNER_WRITE", "GROUP_READ", "OTHERS_READ"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// POSIX permission bits and group ownership.
#[derive(Debug, Clone)]
pub struct PosixAttributeView {
    default_group: String,
}

impl PosixAttributeView {
    /// Construct a view whose newly created files default to `default_group`.
    pub fn new(default_group: impl Into<String>) -> Self {
        PosixAttributeView {
            default_group: default_group.into(),
        }
    }
}

impl Default for PosixAttributeView {
    fn default() -> Self {
        PosixAttributeView::new("nogroup")
    }
}

impl AttributeProvider for PosixAttributeView {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn inherits(&self) -> &'static [&'static str] {
        &["basic", "owner"]
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        ATTRIBUTES
    }

    fn set_initial(&self, file: &File, _now: SystemTime) {
        let mut state = file.state_mut();
        state
            .attributes
            .insert(PERMISSIONS_KEY.to_string(), AttributeValue::StringSet(default_permissions()));
        state
            .attributes
            .insert(GROUP_KEY.to_string(), AttributeValue::Text(self.default_group.clone()));
    }

    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue> {
        let key = match attr {
            "permissions" => PERMISSIONS_KEY,
            "group" => GROUP_KEY,
            _ => return None,
        };
        file.state().attributes.get(key).cloned()
    }

    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()> {
        let key = match attr {
            "permissions" => PERMISSIONS_KEY,
            "group" => GROUP_KEY,
            _ => return Err(FsErrorKind::IllegalAttribute.into()),
        };
        file.state_mut().attributes.insert(key.to_string(), value);
        Ok(())
    }
}
