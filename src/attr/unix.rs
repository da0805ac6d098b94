//! The `unix` view (§4.5): numeric uid/gid/mode plus link count and inode
//! number. Inherits `posix`.

use std::time::SystemTime;

use super::{AttributeProvider, AttributeSpec};
use crate::error::{FsErrorKind, FsResult};
use crate::file::{AttributeValue, File};

const ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec { name: "uid", gettable: true, settable: true, settable_on_create: true, accepted_types: &["uint"] },
    AttributeSpec { name: "gid", gettable: true, settable: true, settable_on_create: true, accepted_types: &["uint"] },
    AttributeSpec { name: "mode", gettable: true, settable: true, settable_on_create: true, accepted_types: &["uint"] },
    AttributeSpec { name: "ino", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
    AttributeSpec { name: "nlink", gettable: true, settable: false, settable_on_create: false, accepted_types: &[] },
];

const UID_KEY: &str = "unix:uid";
const GID_KEY: &str = "unix:gid";
const MODE_KEY: &str = "unix:mode";

/// Numeric Unix identity: uid, gid, mode, plus the read-only inode number
/// and link count (the latter two are derived, never stored).
#[derive(Debug, Clone, Default)]
pub struct UnixAttributeView {
    default_uid: u64,
    default_gid: u64,
    default_mode: u64,
}

impl UnixAttributeView {
    /// Construct a view whose newly created files default to the given
    /// uid/gid/mode.
    pub fn new(default_uid: u64, default_gid: u64, default_mode: u64) -> Self {
        UnixAttributeView {
            default_uid,
            default_gid,
            default_mode,
        }
    }
}

impl AttributeProvider for UnixAttributeView {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn inherits(&self) -> &'static [&'static str] {
        &["posix"]
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        ATTRIBUTES
    }

    fn set_initial(&self, file: &File, _now: SystemTime) {
        let mut state = file.state_mut();
        state.attributes.insert(UID_KEY.to_string(), AttributeValue::UInt(self.default_uid));
        state.attributes.insert(GID_KEY.to_string(), AttributeValue::UInt(self.default_gid));
        state.attributes.insert(MODE_KEY.to_string(), AttributeValue::UInt(self.default_mode));
    }

    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue> {
        match attr {
            "uid" => file.state().attributes.get(UID_KEY).cloned(),
            "gid" => file.state().attributes.get(GID_KEY).cloned(),
            "mode" => file.state().attributes.get(MODE_KEY).cloned(),
            "ino" => Some(AttributeValue::UInt(file.id().into())),
            "nlink" => Some(AttributeValue::UInt(file.state().link_count)),
            _ => None,
        }
    }

    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()> {
        let key = match attr {
            "uid" => UID_KEY,
            "gid" => GID_KEY,
            "mode" => MODE_KEY,
            _ => return Err(FsErrorKind::IllegalAttribute.into()),
        };
        file.state_mut().attributes.insert(key.to_string(), value);
        Ok(())
    }
}
