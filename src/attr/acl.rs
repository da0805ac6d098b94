//! The `acl` view (§4.5): an ordered access-control-entry list. Inherits
//! `owner`.

use std::time::SystemTime;

use super::{AttributeProvider, AttributeSpec};
use crate::error::{FsErrorKind, FsResult};
use crate::file::{AttributeValue, File};

const ATTRIBUTES: &[AttributeSpec] = &[AttributeSpec {
    name: "acl",
    gettable: true,
    settable: true,
    settable_on_create: false,
    accepted_types: &["string-set"],
}];

const ACL_KEY: &str = "acl:acl";

/// An ordered list of ACL entry descriptors, stored opaquely as strings (the
/// core does not interpret or enforce them).
#[derive(Debug, Default)]
pub struct AclAttributeView;

impl AttributeProvider for AclAttributeView {
    fn name(&self) -> &'static str {
        "acl"
    }

    fn inherits(&self) -> &'static [&'static str] {
        &["owner"]
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        ATTRIBUTES
    }

    fn set_initial(&self, file: &File, _now: SystemTime) {
        file.state_mut()
            .attributes
            .insert(ACL_KEY.to_string(), AttributeValue::StringSet(Vec::new()));
    }

    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue> {
        if attr != "acl" {
            return None;
        }
        file.state().attributes.get(ACL_KEY).cloned()
    }

    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()> {
        if attr != "acl" {
            return Err(FsErrorKind::IllegalAttribute.into());
        }
        file.state_mut().attributes.insert(ACL_KEY.to_string(), value);
        Ok(())
    }
}
