//! The `basic` view (§4.5): attributes every file has, computed directly
//! from shared file metadata and content rather than the generic attribute
//! map.

use std::time::SystemTime;

use super::{AttributeProvider, AttributeSpec};
use crate::error::{FsErrorKind, FsResult};
use crate::file::{AttributeValue, File, FileContent};

const ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec { name: "size", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
    AttributeSpec { name: "isDirectory", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
    AttributeSpec { name: "isRegularFile", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
    AttributeSpec { name: "isSymbolicLink", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
    AttributeSpec { name: "isOther", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
    AttributeSpec { name: "fileKey", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
    AttributeSpec {
        name: "creationTime",
        gettable: true,
        settable: true,
        settable_on_create: false,
        accepted_types: &["time"],
    },
    AttributeSpec {
        name: "lastModifiedTime",
        gettable: true,
        settable: true,
        settable_on_create: false,
        accepted_types: &["time"],
    },
    AttributeSpec {
        name: "lastAccessTime",
        gettable: true,
        settable: true,
        settable_on_create: false,
        accepted_types: &["time"],
    },
];

/// Every file's baseline attribute view; present in every configuration
/// regardless of which other views are selected.
#[derive(Debug, Default)]
pub struct BasicAttributeView;

impl AttributeProvider for BasicAttributeView {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        ATTRIBUTES
    }

    fn set_initial(&self, _file: &File, _now: SystemTime) {
        // Timestamps are already seeded by `FileState::new`; nothing to add.
    }

    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue> {
        let state = file.state();
        match attr {
            "size" => Some(AttributeValue::UInt(match file.content() {
                FileContent::RegularFile(f) => f.size(),
                _ => 0,
            })),
            "isDirectory" => Some(AttributeValue::Bool(file.is_directory())),
            "isRegularFile" => Some(AttributeValue::Bool(file.is_regular_file())),
            "isSymbolicLink" => Some(AttributeValue::Bool(file.is_symbolic_link())),
            "isOther" => Some(AttributeValue::Bool(false)),
            "fileKey" => Some(AttributeValue::Text(file.id().to_string())),
            "creationTime" => Some(AttributeValue::Time(state.creation_time)),
            "lastModifiedTime" => Some(AttributeValue::Time(state.last_modified_time)),
            "lastAccessTime" => Some(AttributeValue::Time(state.last_access_time)),
            _ => None,
        }
    }

    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()> {
        let mut state = file.state_mut();
        match (attr, value) {
            ("creationTime", AttributeValue::Time(t)) => state.creation_time = t,
            ("lastModifiedTime", AttributeValue::Time(t)) => state.last_modified_time = t,
            ("lastAccessTime", AttributeValue::Time(t)) => state.last_access_time = t,
            _ => return Err(FsErrorKind::IllegalType.into()),
        }
        Ok(())
    }
}
