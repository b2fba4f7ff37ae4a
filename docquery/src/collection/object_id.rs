use crate::errors::{ErrorKind, QueryError, QueryResult};
use chrono::{DateTime, TimeZone, Utc};
use log::info;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::Rng;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

static ID_GENERATOR: Lazy<ObjectIdGenerator> = Lazy::new(ObjectIdGenerator::new);

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// A 12-byte identifier generated by the store for documents inserted without `_id`.
///
/// The layout follows the usual document database object id:
///
/// * 4 bytes: seconds since the Unix epoch, big-endian
/// * 5 bytes: random value unique to this process
/// * 3 bytes: incrementing counter, big-endian, starting at a random value
///
/// Ids generated by one process are therefore unique and roughly ordered by
/// creation time.
///
/// # Examples
///
/// ```rust
/// use docquery::collection::ObjectId;
///
/// let id = ObjectId::new();
/// let parsed: ObjectId = id.to_hex().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    /// Generates a new unique `ObjectId`.
    pub fn new() -> Self {
        ObjectId {
            bytes: ID_GENERATOR.next_bytes(),
        }
    }

    /// Creates an `ObjectId` from raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId { bytes }
    }

    /// Parses a 24 character hexadecimal string.
    pub fn parse_str(hex: &str) -> QueryResult<ObjectId> {
        if hex.len() != 24 || !hex.is_ascii() {
            log::error!("Invalid object id {}", hex);
            return Err(QueryError::new(
                &format!("Object id '{}' must be 24 hexadecimal characters", hex),
                ErrorKind::InvalidId,
            ));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|err| {
                log::error!("Invalid object id {}: {}", hex, err);
                QueryError::new(
                    &format!("Object id '{}' is not hexadecimal", hex),
                    ErrorKind::InvalidId,
                )
            })?;
        }
        Ok(ObjectId { bytes })
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// Returns the creation time encoded in the first four bytes.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]);
        Utc.timestamp_opt(seconds as i64, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// The all-zero id, which is also the [Default] value.
    pub const fn nil() -> Self {
        ObjectId { bytes: [0u8; 12] }
    }

    pub fn is_nil(&self) -> bool {
        self.bytes == [0u8; 12]
    }
}

// the zero value of the type, never a generated id
impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::nil()
    }
}

impl FromStr for ObjectId {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub(crate) struct ObjectIdGenerator {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    pub(crate) fn new() -> Self {
        let uuid = uuid::Uuid::new_v4();
        let uid = uuid.as_bytes();
        let mut process_unique = [0u8; 5];
        for (i, byte) in process_unique.iter_mut().enumerate() {
            *byte = uid[uid.len() - 1 - i] ^ OsRng.gen::<u8>();
        }

        let generator = ObjectIdGenerator {
            process_unique,
            counter: AtomicU32::new(OsRng.gen::<u32>() & COUNTER_MASK),
        };
        info!(
            "Initialized object id generator with process id: {:02x?}",
            generator.process_unique
        );
        generator
    }

    pub(crate) fn next_bytes(&self) -> [u8; 12] {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_unique);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        bytes
    }
}
