// Adapters layer: concrete collaborators for the filesystem and the registry.

pub mod lock_verify;
pub mod project;
pub mod registry;

pub use lock_verify::LockfileVerifier;
pub use project::LocalProject;
pub use registry::RegistryClient;
