// doc constants
pub const DOC_ID: &str = "_id";
pub const FIELD_SEPARATOR: &str = ".";

// update operators
pub const SET_OPERATOR: &str = "$set";

// projection constants
pub const DEFAULT_MAX_DEPTH: usize = 32;

// store constants
pub const MEMORY_SCHEME: &str = "memory";
pub const DEFAULT_DATABASE: &str = "test";
pub const SYSTEM_COLLECTION_PREFIX: &str = "system.";
pub const RESERVED_COLLECTION_CHARS: [char; 2] = ['$', '\0'];
