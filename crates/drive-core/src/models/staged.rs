/// A copy of inbound content inside a session's scratch namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Storage key of the copy, relative to the disk root
    pub key: String,
    /// Random token naming the copy within the scratch directory
    pub token: String,
}
