pub mod crypto;
pub mod hash;
pub mod logger;
pub mod redact;
