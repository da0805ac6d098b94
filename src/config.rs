//! Filesystem configuration surface: path grammar, normalization policy,
//! disk sizing, attribute views, and feature flags (§6), exposed as a
//! validated [`Configuration`] built through a fluent [`FileSystemBuilder`] —
//! mirroring the teacher's enumerated, validated `MountOption` surface and
//! its `check_option_conflicts` validation step (`src/mount_options.rs`).

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::{FsErrorKind, FsResult};
use crate::name::NormalizationSet;
use crate::path::{PathType, UnixPathType, WindowsPathType};

bitflags! {
    /// Optional capabilities a filesystem may advertise (§6).
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct SupportedFeatures: u32 {
        /// Symbolic links may be created and resolved.
        const SYMBOLIC_LINKS = 0b0001;
        /// Hard links (multiple directory entries referencing one file).
        const LINKS = 0b0010;
        /// Directory streams resistant to concurrent-modification races
        /// (advertised only; the core's point-in-time snapshots are
        /// inherently race-free).
        const SECURE_DIRECTORY_STREAMS = 0b0100;
        /// A dedicated file-channel type distinct from byte-stream channels.
        const FILE_CHANNEL = 0b1000;
    }
}

/// The default block size used by the [`Configuration::unix`] and
/// [`Configuration::windows`] presets.
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// An attribute view selectable from the built-in set (§4.5). Custom
/// providers are supplied directly to [`FileSystemBuilder::attribute_provider`]
/// rather than through this enum.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AttributeView {
    Basic,
    Owner,
    Posix,
    Unix,
    Dos,
    Acl,
    User,
}

impl AttributeView {
    fn build(self) -> Box<dyn crate::attr::AttributeProvider> {
        match self {
            AttributeView::Basic => Box::new(crate::attr::BasicAttributeView),
            AttributeView::Owner => Box::new(crate::attr::OwnerAttributeView::default()),
            AttributeView::Posix => Box::new(crate::attr::PosixAttributeView::default()),
            AttributeView::Unix => Box::new(crate::attr::UnixAttributeView::default()),
            AttributeView::Dos => Box::new(crate::attr::DosAttributeView),
            AttributeView::Acl => Box::new(crate::attr::AclAttributeView),
            AttributeView::User => Box::new(crate::attr::UserAttributeView),
        }
    }
}

/// A fully validated filesystem configuration (§6). Construct one through
/// [`Configuration::unix`] / [`Configuration::windows`] or
/// [`FileSystemBuilder::new`].
#[derive(Clone)]
pub struct Configuration {
    pub(crate) path_type: Arc<dyn PathType>,
    pub(crate) working_directory: String,
    pub(crate) display_normalization: NormalizationSet,
    pub(crate) canonical_normalization: NormalizationSet,
    pub(crate) path_equality_uses_canonical_form: bool,
    pub(crate) attribute_views: Vec<AttributeView>,
    pub(crate) custom_providers_present: bool,
    pub(crate) block_size: usize,
    pub(crate) max_size: u64,
    pub(crate) max_cache_size: u64,
    pub(crate) supported_features: SupportedFeatures,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("path_type", &self.path_type)
            .field("working_directory", &self.working_directory)
            .field("block_size", &self.block_size)
            .field("max_size", &self.max_size)
            .field("max_cache_size", &self.max_cache_size)
            .field("supported_features", &self.supported_features)
            .finish()
    }
}

impl Configuration {
    /// A single-root Unix-style preset: root `/`, working directory `/`,
    /// no normalization, `basic`+`owner`+`posix`+`unix` attribute views,
    /// symbolic links and hard links supported.
    pub fn unix() -> FileSystemBuilder {
        FileSystemBuilder::new()
            .path_type(Arc::new(UnixPathType::new()))
            .working_directory("/")
            .attribute_views(vec![
                AttributeView::Basic,
                AttributeView::Owner,
                AttributeView::Posix,
                AttributeView::Unix,
            ])
            .supported_features(SupportedFeatures::SYMBOLIC_LINKS | SupportedFeatures::LINKS)
    }

    /// A Windows-style preset over the given drive-letter/UNC roots (e.g.
    /// `["C:\\"]`): working directory at the first root, case-insensitive
    /// ASCII-folded canonical form, `basic`+`owner`+`dos`+`acl` attribute
    /// views, symbolic links supported, hard links not.
    pub fn windows(roots: Vec<String>) -> FsResult<FileSystemBuilder> {
        let path_type = WindowsPathType::new(roots.clone())?;
        let working_directory = roots.first().cloned().ok_or(FsErrorKind::InvalidPath)?;
        Ok(FileSystemBuilder::new()
            .path_type(Arc::new(path_type))
            .working_directory(working_directory)
            .canonical_normalization(NormalizationSet::new([crate::name::Normalization::CaseFoldAscii]))
            .attribute_views(vec![
                AttributeView::Basic,
                AttributeView::Owner,
                AttributeView::Dos,
                AttributeView::Acl,
            ])
            .supported_features(SupportedFeatures::SYMBOLIC_LINKS))
    }

    /// The configured path grammar.
    pub fn path_type(&self) -> &Arc<dyn PathType> {
        &self.path_type
    }

    /// The initial working directory path string.
    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    /// The normalization applied to produce a name's display form.
    pub fn display_normalization(&self) -> &NormalizationSet {
        &self.display_normalization
    }

    /// The normalization applied to produce a name's canonical (comparison)
    /// form.
    pub fn canonical_normalization(&self) -> &NormalizationSet {
        &self.canonical_normalization
    }

    /// Whether path equality (distinct from name lookup) compares canonical
    /// forms rather than display forms.
    pub fn path_equality_uses_canonical_form(&self) -> bool {
        self.path_equality_uses_canonical_form
    }

    /// The configured block size, in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The total byte cap (already rounded down to a multiple of
    /// [`Configuration::block_size`]).
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// The cached free-bytes cap.
    pub fn max_cache_size(&self) -> u64 {
        self.max_cache_size
    }

    /// The advertised optional capabilities.
    pub fn supported_features(&self) -> SupportedFeatures {
        self.supported_features
    }
}

/// A fluent, validating builder for [`Configuration`] (§6 "Ambient
/// addition").
pub struct FileSystemBuilder {
    path_type: Option<Arc<dyn PathType>>,
    working_directory: Option<String>,
    display_normalization: NormalizationSet,
    canonical_normalization: NormalizationSet,
    path_equality_uses_canonical_form: bool,
    attribute_views: Vec<AttributeView>,
    custom_providers: Vec<Box<dyn crate::attr::AttributeProvider>>,
    block_size: usize,
    max_size: u64,
    max_cache_size: u64,
    supported_features: SupportedFeatures,
}

impl FileSystemBuilder {
    /// An empty builder: no path type or working directory, no
    /// normalization, no attribute views, the default block size, an
    /// effectively unbounded disk, and no advertised optional features.
    /// [`FileSystemBuilder::build`] fails until a path type and working
    /// directory are set.
    pub fn new() -> Self {
        FileSystemBuilder {
            path_type: None,
            working_directory: None,
            display_normalization: NormalizationSet::none(),
            canonical_normalization: NormalizationSet::none(),
            path_equality_uses_canonical_form: false,
            attribute_views: vec![AttributeView::Basic],
            custom_providers: Vec::new(),
            block_size: DEFAULT_BLOCK_SIZE,
            max_size: u64::MAX,
            max_cache_size: 0,
            supported_features: SupportedFeatures::empty(),
        }
    }

    /// Set the path grammar.
    pub fn path_type(mut self, path_type: Arc<dyn PathType>) -> Self {
        self.path_type = Some(path_type);
        self
    }

    /// Set the initial working directory path string.
    pub fn working_directory(mut self, path: impl Into<String>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Set the display-form normalization.
    pub fn display_normalization(mut self, normalization: NormalizationSet) -> Self {
        self.display_normalization = normalization;
        self
    }

    /// Set the canonical-form normalization.
    pub fn canonical_normalization(mut self, normalization: NormalizationSet) -> Self {
        self.canonical_normalization = normalization;
        self
    }

    /// Whether path equality compares canonical forms rather than display
    /// forms.
    pub fn path_equality_uses_canonical_form(mut self, value: bool) -> Self {
        self.path_equality_uses_canonical_form = value;
        self
    }

    /// Select built-in attribute views. `basic` is always included even if
    /// omitted here, matching every real filesystem's baseline view.
    pub fn attribute_views(mut self, views: Vec<AttributeView>) -> Self {
        self.attribute_views = views;
        self
    }

    /// Register an additional, caller-supplied attribute provider (for a
    /// custom view name not among the built-ins).
    pub fn attribute_provider(mut self, provider: Box<dyn crate::attr::AttributeProvider>) -> Self {
        self.custom_providers.push(provider);
        self
    }

    /// Set the disk's block size, in bytes. Must be positive.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the disk's total byte cap (rounded down to a multiple of the
    /// block size at build time).
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the disk's cached free-bytes cap.
    pub fn max_cache_size(mut self, max_cache_size: u64) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    /// Set the advertised optional capabilities.
    pub fn supported_features(mut self, features: SupportedFeatures) -> Self {
        self.supported_features = features;
        self
    }

    /// Validate and finalize the configuration.
    ///
    /// Fails with [`FsErrorKind::InvalidPath`] if no path type or working
    /// directory was set, the block size is zero, or the working directory
    /// is not an absolute path recognized by the path type.
    pub fn build(self) -> FsResult<Configuration> {
        let path_type = self.path_type.ok_or(FsErrorKind::InvalidPath)?;
        let working_directory = self.working_directory.ok_or(FsErrorKind::InvalidPath)?;
        if self.block_size == 0 {
            return Err(FsErrorKind::InvalidPath.into());
        }
        let parsed = path_type.parse(&working_directory)?;
        if !parsed.is_absolute() {
            return Err(FsErrorKind::InvalidPath.into());
        }

        let max_size = (self.max_size / self.block_size as u64) * self.block_size as u64;

        Ok(Configuration {
            path_type,
            working_directory,
            display_normalization: self.display_normalization,
            canonical_normalization: self.canonical_normalization,
            path_equality_uses_canonical_form: self.path_equality_uses_canonical_form,
            attribute_views: self.attribute_views,
            custom_providers_present: !self.custom_providers.is_empty(),
            block_size: self.block_size,
            max_size,
            max_cache_size: self.max_cache_size,
            supported_features: self.supported_features,
        })
    }

    /// Finalize both the configuration and the resolved provider set used to
    /// build the filesystem's [`crate::attr::AttributeService`].
    pub(crate) fn into_providers(mut self) -> FsResult<(Configuration, Vec<Box<dyn crate::attr::AttributeProvider>>)> {
        let mut providers: Vec<Box<dyn crate::attr::AttributeProvider>> =
            self.attribute_views.iter().copied().map(AttributeView::build).collect();
        let had_custom_providers = !self.custom_providers.is_empty();
        providers.append(&mut self.custom_providers);
        if !providers.iter().any(|p| p.name() == "basic") {
            providers.push(Box::new(crate::attr::BasicAttributeView));
        }
        let mut config = self.build()?;
        config.custom_providers_present = had_custom_providers;
        Ok((config, providers))
    }
}

impl Default for FileSystemBuilder {
    fn default() -> Self {
        FileSystemBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_preset_builds() {
        let config = Configuration::unix().build().unwrap();
        assert_eq!(config.working_directory(), "/");
        assert_eq!(config.block_size(), DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn windows_preset_requires_root() {
        assert!(Configuration::windows(vec![]).is_err());
    }

    #[test]
    fn windows_preset_builds() {
        let config = Configuration::windows(vec!["C:\\".to_string()]).unwrap().build().unwrap();
        assert_eq!(config.working_directory(), "C:\\");
    }

    #[test]
    fn build_fails_without_path_type() {
        assert!(FileSystemBuilder::new().working_directory("/").build().is_err());
    }

    #[test]
    fn build_fails_on_relative_working_directory() {
        let builder = FileSystemBuilder::new()
            .path_type(Arc::new(UnixPathType::new()))
            .working_directory("relative/path");
        assert!(builder.build().is_err());
    }

    #[test]
    fn max_size_rounds_down_to_block_size_multiple() {
        let config = FileSystemBuilder::new()
            .path_type(Arc::new(UnixPathType::new()))
            .working_directory("/")
            .block_size(4096)
            .max_size(10_000)
            .build()
            .unwrap();
        assert_eq!(config.max_size(), 8192);
    }
}
