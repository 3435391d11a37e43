pub mod entity;
pub mod source;

pub use entity::{
    BaseEntity, Breadcrumb, CodeFileEntity, DeletionEntity, DeletionStatus, FieldSpec, FileEntity,
    PolymorphicEntity, SourceEntity, SparseEmbedding, SystemMetadata,
};
pub use source::{
    AuthenticationMethod, EntityStream, Source, SourceDescriptor, SourceRegistry,
    SourceValidationError,
};

pub mod prelude {
    pub use crate::entity::{BaseEntity, FieldSpec, SourceEntity};
    pub use crate::source::{Source, SourceDescriptor, SourceRegistry};
}
