pub mod encode;
pub mod location;
pub mod rate_limit;
pub mod signature;
pub mod version;

pub use encode::Encodable;
pub use location::LocationSample;
pub use rate_limit::RateLimitInfo;
pub use signature::{FieldValue, SessionFields, Signature, SESSION_HASH_FIELD};
pub use version::{HashSeed, VersionPolicy, WireRevision, VERSION_POLICIES};
