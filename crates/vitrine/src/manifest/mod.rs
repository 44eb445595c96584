//! Manifest System
//!
//! Discovers theme plugins on disk and describes them as manifests.

pub mod lister;
pub mod scanner;
pub mod types;

pub use lister::{DirEntryStat, DirectoryLister, FsLister};
pub use scanner::{compare_names, DirectorySignature, ManifestScanner, ScannerCache};
pub use types::{
    humanize_name, ConfigSchema, FieldDescriptor, FieldKind, PluginManifest, SubFieldDescriptor,
    DEFAULT_VERSION,
};
