pub mod books;

use bookshelf_kernel::ModuleRegistry;

use books::repository::SharedBookRepository;

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    books: SharedBookRepository,
) -> anyhow::Result<()> {
    registry.register(books::create_module(books))?;
    Ok(())
}
