pub mod books;

use shelf_kernel::ModuleRegistry;

use crate::bootstrap::Collaborators;

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    collaborators: &Collaborators,
) -> anyhow::Result<()> {
    registry.register(books::create_module(
        collaborators.verifier.clone(),
        collaborators.books.clone(),
    ))?;
    Ok(())
}
