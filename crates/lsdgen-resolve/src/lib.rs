//! lsdgen resolution
//!
//! Everything the generator needs to know beyond a package's own declarations:
//! which classes its entry point exports, where its dependency packages are
//! installed, and which components those dependencies already publish.

pub mod exports;
pub mod external;
pub mod locator;
pub mod module_state;
pub mod registry;
pub mod type_index;

pub use exports::{ExportResolver, ExportSource, FileExports, ImportedElement, ImportedFile};
pub use external::{
    dump_module_state, ExternalComponents, ExternalModulesLoader, ModuleComponents, PackageScope,
    PackagesBeingGenerated, DEBUG_STATE_FILE,
};
pub use locator::NodeModuleLocator;
pub use module_state::ModuleState;
pub use registry::{ComponentRegistry, RegisteredComponent};
pub use type_index::TypeIndex;
