//! Message flag bits carried on interaction replies

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Flags of a message sent in reply to an interaction
    ///
    /// Combinable with `|`; serialized as the raw integer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageFlags: u64 {
        /// Do not include any embeds when serializing this message
        const SUPPRESS_EMBEDS = 1 << 2;
        /// Only the user who invoked the interaction can see this message
        const EPHEMERAL       = 1 << 6;
    }
}

impl Serialize for MessageFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for MessageFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(MessageFlags::from_bits_truncate(bits))
    }
}
