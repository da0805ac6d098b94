//! The attribute service: composes pluggable per-view attribute providers
//! with inheritance resolution (§4.5).
//!
//! Each provider declares a fixed, static table of attributes it defines
//! (name, gettable/settable/settable-on-create, accepted value types) plus
//! the other view names it inherits from. The service resolves the
//! inheritance graph once, at filesystem construction, into a flat
//! `view name -> provider` map plus each view's precomputed inherits chain —
//! no runtime-dynamic inheritance walk (§9).

mod acl;
mod basic;
mod dos;
mod owner;
mod posix;
mod unix;
mod user;

pub use acl::AclAttributeView;
pub use basic::BasicAttributeView;
pub use dos::DosAttributeView;
pub use owner::OwnerAttributeView;
pub use posix::PosixAttributeView;
pub use unix::UnixAttributeView;
pub use user::UserAttributeView;

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use crate::error::{FsErrorKind, FsResult};
use crate::file::{AttributeValue, File};

/// One attribute a provider defines: its name, which operations are
/// permitted, and the runtime value types it accepts on `set`.
#[derive(Clone, Copy, Debug)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub gettable: bool,
    pub settable: bool,
    pub settable_on_create: bool,
    pub accepted_types: &'static [&'static str],
}

/// A single view's attribute logic: what it defines, how to read/write the
/// values, and what defaults a newly created file gets.
pub trait AttributeProvider: Send + Sync {
    /// This provider's view name (e.g. `"basic"`).
    fn name(&self) -> &'static str;

    /// Other view names this provider proxies attributes from.
    fn inherits(&self) -> &'static [&'static str] {
        &[]
    }

    /// The fixed set of attributes this provider defines. Empty for a
    /// provider that accepts arbitrary attribute names (see
    /// [`AttributeProvider::is_dynamic`]).
    fn attributes(&self) -> &'static [AttributeSpec];

    /// Apply this view's default attribute values to a freshly created file.
    fn set_initial(&self, file: &File, now: SystemTime);

    /// Read `attr`'s current value, or `None` if this provider has no value
    /// for it (distinct from "not defined", which the service checks via
    /// [`AttributeProvider::attributes`] before calling this).
    fn get(&self, file: &File, attr: &str) -> Option<AttributeValue>;

    /// Write `attr`'s value. Only called after the service has validated
    /// settability and accepted type (for non-dynamic providers).
    fn set(&self, file: &File, attr: &str, value: AttributeValue) -> FsResult<()>;

    /// Whether this provider accepts attribute names outside its fixed
    /// [`AttributeProvider::attributes`] table. True only for the `user`
    /// view's arbitrarily-named, user-defined attributes.
    fn is_dynamic(&self) -> bool {
        false
    }
}

/// Composes a set of attribute providers, resolving their inheritance graph
/// once at construction (§4.5, §9).
pub struct AttributeService {
    providers: HashMap<&'static str, Box<dyn AttributeProvider>>,
    resolved_inherits: HashMap<&'static str, Vec<&'static str>>,
}

impl std::fmt::Debug for AttributeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeService")
            .field("views", &self.supported_file_attribute_views())
            .finish()
    }
}

impl AttributeService {
    /// Compose `providers` into a service. Fails with
    /// [`FsErrorKind::DuplicateView`] if two providers share a view name.
    pub fn new(providers: Vec<Box<dyn AttributeProvider>>) -> FsResult<Self> {
        let mut map: HashMap<&'static str, Box<dyn AttributeProvider>> = HashMap::new();
        for provider in providers {
            if map.contains_key(provider.name()) {
                return Err(FsErrorKind::DuplicateView.into());
            }
            map.insert(provider.name(), provider);
        }

        let mut resolved = HashMap::new();
        for (name, provider) in &map {
            let mut chain = Vec::new();
            let mut seen: HashSet<&str> = HashSet::new();
            let mut stack: Vec<&str> = provider.inherits().to_vec();
            while let Some(inherited) = stack.pop() {
                if !seen.insert(inherited) {
                    continue;
                }
                if let Some(inherited_provider) = map.get(inherited) {
                    chain.push(inherited);
                    stack.extend(inherited_provider.inherits().iter().copied());
                }
            }
            resolved.insert(*name, chain);
        }

        Ok(AttributeService {
            providers: map,
            resolved_inherits: resolved,
        })
    }

    /// The union of every composed provider's view name.
    pub fn supported_file_attribute_views(&self) -> Vec<&'static str> {
        let mut views: Vec<&'static str> = self.providers.keys().copied().collect();
        views.sort_unstable();
        views
    }

    /// Apply every provider's initial defaults to a freshly created file.
    pub fn apply_initial(&self, file: &File, now: SystemTime) {
        for provider in self.providers.values() {
            provider.set_initial(file, now);
        }
    }

    fn chain(&self, view: &str) -> Option<Vec<&'static str>> {
        let provider = self.providers.get(view)?;
        let mut chain = vec![provider.name()];
        chain.extend(self.resolved_inherits.get(view).into_iter().flatten().copied());
        Some(chain)
    }

    /// `getAttribute(file, "view:attr")` (§4.5): search `view` then its
    /// inherits chain for the first provider that defines `attr` as gettable.
    pub fn get_attribute(&self, file: &File, spec: &str) -> FsResult<AttributeValue> {
        let (view, attr) = split_spec(spec)?;
        let chain = self.chain(view).ok_or(FsErrorKind::IllegalAttribute)?;
        for name in chain {
            let provider = &self.providers[name];
            if provider.is_dynamic() {
                if let Some(value) = provider.get(file, attr) {
                    return Ok(value);
                }
                continue;
            }
            if provider.attributes().iter().any(|s| s.name == attr && s.gettable) {
                return provider.get(file, attr).ok_or_else(|| FsErrorKind::IllegalAttribute.into());
            }
        }
        Err(FsErrorKind::IllegalAttribute.into())
    }

    /// `setAttribute(file, "view:attr", value, onCreate?)` (§4.5).
    pub fn set_attribute(&self, file: &File, spec: &str, value: AttributeValue, on_create: bool) -> FsResult<()> {
        let (view, attr) = split_spec(spec)?;
        let chain = self.chain(view).ok_or(FsErrorKind::IllegalAttribute)?;
        for name in chain {
            let provider = &self.providers[name];
            if provider.is_dynamic() {
                return provider.set(file, attr, value);
            }
            if let Some(attr_spec) = provider.attributes().iter().find(|s| s.name == attr) {
                if !attr_spec.settable {
                    return Err(FsErrorKind::IllegalAttribute.into());
                }
                if on_create && !attr_spec.settable_on_create {
                    return Err(FsErrorKind::UnsupportedOnCreate.into());
                }
                if !attr_spec.accepted_types.is_empty() && !attr_spec.accepted_types.contains(&value.type_name()) {
                    return Err(FsErrorKind::IllegalType.into());
                }
                return provider.set(file, attr, value);
            }
        }
        Err(FsErrorKind::IllegalAttribute.into())
    }

    /// `readAttributes(file, "view:a,b,c" | "view:*")` (§4.5). Mixing `*`
    /// with explicit names is rejected.
    pub fn read_attributes(&self, file: &File, spec: &str) -> FsResult<Vec<(String, AttributeValue)>> {
        let (view, names) = split_spec(spec)?;
        let chain = self.chain(view).ok_or(FsErrorKind::IllegalAttribute)?;

        if names == "*" {
            let mut result = Vec::new();
            for name in &chain {
                let provider = &self.providers[name];
                for attr_spec in provider.attributes() {
                    if attr_spec.gettable {
                        if let Some(value) = provider.get(file, attr_spec.name) {
                            result.push((attr_spec.name.to_string(), value));
                        }
                    }
                }
            }
            return Ok(result);
        }
        if names.contains('*') {
            return Err(FsErrorKind::IllegalAttribute.into());
        }

        let mut result = Vec::new();
        for requested in names.split(',') {
            let mut found = None;
            for name in &chain {
                let provider = &self.providers[name];
                if provider.is_dynamic() {
                    if let Some(value) = provider.get(file, requested) {
                        found = Some(value);
                        break;
                    }
                    continue;
                }
                if provider.attributes().iter().any(|s| s.name == requested && s.gettable) {
                    found = provider.get(file, requested);
                    break;
                }
            }
            match found {
                Some(value) => result.push((requested.to_string(), value)),
                None => return Err(FsErrorKind::IllegalAttribute.into()),
            }
        }
        Ok(result)
    }
}

fn split_spec(spec: &str) -> FsResult<(&str, &str)> {
    spec.split_once(':').ok_or_else(|| FsErrorKind::IllegalAttribute.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{Directory, FileContent, FileId};
    use std::sync::Arc;

    fn new_service() -> AttributeService {
        AttributeService::new(vec![
            Box::new(BasicAttributeView),
            Box::new(OwnerAttributeView::default()),
            Box::new(PosixAttributeView::default()),
        ])
        .unwrap()
    }

    fn new_file() -> Arc<File> {
        let f = File::new(FileId::test_id(1), FileContent::Directory(Directory::new()), SystemTime::now());
        f.as_directory().unwrap().bind_self(&f);
        f
    }

    #[test]
    fn rejects_duplicate_view() {
        let err = AttributeService::new(vec![Box::new(BasicAttributeView), Box::new(BasicAttributeView)]).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::DuplicateView);
    }

    #[test]
    fn get_basic_size_attribute() {
        let service = new_service();
        let file = new_file();
        let value = service.get_attribute(&file, "basic:isDirectory").unwrap();
        assert_eq!(value, AttributeValue::Bool(true));
    }

    #[test]
    fn inherited_view_resolves_through_chain() {
        let service = new_service();
        let file = new_file();
        service.apply_initial(&file, SystemTime::now());
        // "posix" inherits "owner"; owner:owner should be reachable through posix.
        let value = service.get_attribute(&file, "posix:owner").unwrap();
        assert!(matches!(value, AttributeValue::Text(_)));
    }

    #[test]
    fn unknown_attribute_is_illegal() {
        let service = new_service();
        let file = new_file();
        let err = service.get_attribute(&file, "basic:nonexistent").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::IllegalAttribute);
    }

    #[test]
    fn set_rejects_unsettable_attribute() {
        let service = new_service();
        let file = new_file();
        let err = service
            .set_attribute(&file, "basic:isDirectory", AttributeValue::Bool(false), false)
            .unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::IllegalAttribute);
    }

    #[test]
    fn set_rejects_wrong_type() {
        let service = new_service();
        let file = new_file();
        let err = service
            .set_attribute(&file, "owner:owner", AttributeValue::Bool(true), false)
            .unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::IllegalType);
    }

    #[test]
    fn read_all_wildcard_returns_gettable_attributes() {
        let service = new_service();
        let file = new_file();
        service.apply_initial(&file, SystemTime::now());
        let all = service.read_attributes(&file, "basic:*").unwrap();
        assert!(all.iter().any(|(name, _)| name == "size"));
        assert!(all.iter().any(|(name, _)| name == "isDirectory"));
    }

    #[test]
    fn read_mixed_wildcard_and_names_is_error() {
        let service = new_service();
        let file = new_file();
        assert!(service.read_attributes(&file, "basic:size,*").is_err());
    }
}
