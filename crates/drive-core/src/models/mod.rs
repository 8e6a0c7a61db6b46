pub mod inbound;
pub mod operation;
pub mod profile;
pub mod staged;

pub use inbound::InboundFile;
pub use operation::{FlipAxis, ImageOperation, IMAGE_VOCABULARY, MAX_EDGE, MAX_PIXELS};
pub use profile::{ContentType, OperationSpec, Profile};
pub use staged::StagedFile;
