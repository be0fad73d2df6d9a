//! Mask Description File access: the container abstraction, the expected
//! table layout and typed loading.

pub mod container;
pub mod json;
pub mod loader;
pub mod memory;
pub mod sample;
pub mod schema;

pub use container::{CellValue, ContainerError, ContainerReader, DataKind, MdfContainer, RowView};
pub use json::JsonContainerReader;
pub use loader::load_mask_file;
pub use memory::{MemoryContainer, MemoryTable};
pub use sample::SampleMdf;
