pub mod books;

use bookshelf_kernel::ModuleRegistry;

/// Register every application module, in start order.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(books::create_module());
}
