//! Time-ordered 64-bit identifiers.
//!
//! Every entity (user, project, issue, comment, webhook) is keyed by an
//! [`Id`] produced by an [`IdGenerator`]. The packed layout, most
//! significant bit first:
//!
//! ```text
//! | 41 bits: ms since epoch | 13 bits: shard | 10 bits: sequence |
//! ```
//!
//! The upper 54 bits let any consumer recover creation time and shard
//! without a lookup (see [`decode`]).

use crate::error::{ErrorlyError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

pub const TIMESTAMP_BITS: u32 = 41;
pub const SHARD_BITS: u32 = 13;
pub const SEQUENCE_BITS: u32 = 10;

/// Largest shard id that fits in the shard field.
pub const MAX_SHARD: u16 = (1 << SHARD_BITS) - 1;

/// Number of distinct sequence values per millisecond.
pub const SEQUENCES_PER_MS: u64 = 1 << SEQUENCE_BITS;

/// 2020-10-12T13:01:14.941Z
pub const DEFAULT_EPOCH_MS: i64 = 1_602_507_674_941;

const TIMESTAMP_MASK: i64 = (1 << TIMESTAMP_BITS) - 1;
const SHARD_MASK: i64 = (1 << SHARD_BITS) - 1;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

/// Opaque entity identifier.
///
/// `Id(0)` means "no id": anonymous callers, unassigned issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id(pub i64);

impl Id {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// `None` for the zero id, which the store persists as NULL.
    #[must_use]
    pub const fn non_zero(self) -> Option<i64> {
        if self.0 == 0 { None } else { Some(self.0) }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = ErrorlyError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ErrorlyError::validation("id", format!("not a numeric id: {s:?}")))
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Generator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    /// Reference instant, in Unix milliseconds, that timestamps count from.
    pub epoch_ms: i64,
    /// Static shard id distinguishing concurrent generator instances.
    pub shard_id: u16,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            epoch_ms: DEFAULT_EPOCH_MS,
            shard_id: 0,
        }
    }
}

/// The three sub-fields of a packed [`Id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdParts {
    /// Milliseconds since the generator's epoch.
    pub timestamp_ms: i64,
    pub shard_id: u16,
    pub sequence: u16,
}

impl IdParts {
    /// Pack the fields into an id. Out-of-range fields are masked.
    #[must_use]
    pub fn encode(self) -> Id {
        Id(((self.timestamp_ms & TIMESTAMP_MASK) << (SHARD_BITS + SEQUENCE_BITS))
            | ((i64::from(self.shard_id) & SHARD_MASK) << SEQUENCE_BITS)
            | (i64::from(self.sequence) & SEQUENCE_MASK))
    }
}

/// Split an id into its time, shard and sequence fields.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn decode(id: Id) -> IdParts {
    IdParts {
        timestamp_ms: (id.0 >> (SHARD_BITS + SEQUENCE_BITS)) & TIMESTAMP_MASK,
        shard_id: ((id.0 >> SEQUENCE_BITS) & SHARD_MASK) as u16,
        sequence: (id.0 & SEQUENCE_MASK) as u16,
    }
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

#[derive(Debug, Default)]
struct GeneratorState {
    /// Never reset; only its low bits reach the id.
    counter: u64,
    /// Millisecond and sequence of the last issued id.
    last: Option<(i64, u16)>,
}

/// Mutex-protected id generator, one per logical shard.
///
/// A wall clock that steps backwards is clamped to the last issued
/// millisecond. When the sequence wraps inside a single millisecond (more
/// than 1024 ids in that millisecond), `next` spins until the clock passes
/// the last issued millisecond. Issued ids are therefore strictly
/// increasing per instance.
///
/// The spin holds the internal lock. After the clock steps back by a large
/// amount, a wrap blocks every caller of `next` until the clock catches up
/// with the last issued millisecond, which can take as long as the step.
pub struct IdGenerator {
    config: IdConfig,
    clock: Clock,
    state: Mutex<GeneratorState>,
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IdGenerator {
    /// Create a generator reading the system wall clock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShard` if the shard id does not fit in 13 bits.
    pub fn new(config: IdConfig) -> Result<Self> {
        Self::with_clock(config, || Utc::now().timestamp_millis())
    }

    /// Create a generator with an injected Unix-millisecond clock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShard` if the shard id does not fit in 13 bits.
    pub fn with_clock<F>(config: IdConfig, clock: F) -> Result<Self>
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        if config.shard_id > MAX_SHARD {
            return Err(ErrorlyError::InvalidShard {
                shard: config.shard_id,
                max: MAX_SHARD,
            });
        }
        Ok(Self {
            config,
            clock: Box::new(clock),
            state: Mutex::new(GeneratorState::default()),
        })
    }

    #[must_use]
    pub const fn config(&self) -> IdConfig {
        self.config
    }

    /// Issue the next id.
    #[allow(clippy::cast_possible_truncation)]
    pub fn next(&self) -> Id {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        state.counter = state.counter.wrapping_add(1);
        let sequence = (state.counter % SEQUENCES_PER_MS) as u16;
        let mut ms = self.elapsed_ms();

        if let Some((last_ms, last_sequence)) = state.last {
            ms = ms.max(last_ms);
            if ms == last_ms && sequence <= last_sequence {
                ms = self.wait_past(last_ms);
            }
        }
        state.last = Some((ms, sequence));

        IdParts {
            timestamp_ms: ms,
            shard_id: self.config.shard_id,
            sequence,
        }
        .encode()
    }

    /// Wall-clock creation time of an id issued under this generator's epoch.
    #[must_use]
    pub fn created_at(&self, id: Id) -> Option<DateTime<Utc>> {
        let parts = decode(id);
        Utc.timestamp_millis_opt(self.config.epoch_ms + parts.timestamp_ms)
            .single()
    }

    fn elapsed_ms(&self) -> i64 {
        ((self.clock)() - self.config.epoch_ms).max(0) & TIMESTAMP_MASK
    }

    fn wait_past(&self, last_ms: i64) -> i64 {
        loop {
            let ms = self.elapsed_ms();
            if ms > last_ms {
                return ms;
            }
            std::thread::yield_now();
        }
    }
}
