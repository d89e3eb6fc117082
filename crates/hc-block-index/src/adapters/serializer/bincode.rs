use crate::domain::errors::SerializationError;
use crate::ports::outbound::HeaderSerializer;
use shared_types::BlockHeader;

/// Default header serializer using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeHeaderSerializer;

impl HeaderSerializer for BincodeHeaderSerializer {
    fn serialize(&self, header: &BlockHeader) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(header).map_err(|e| SerializationError::new("header", e.to_string()))
    }

    fn deserialize(&self, data: &[u8]) -> Result<BlockHeader, SerializationError> {
        bincode::deserialize(data).map_err(|e| SerializationError::new("header", e.to_string()))
    }
}
