//! Key Namespaces
//!
//! Fixed key prefixes and default TTLs for each game subsystem.

use std::fmt;

/// Id used by the world state namespace, which holds a single global value.
pub const WORLD_STATE_ID: &str = "global";

// == Namespace ==
/// Subsystem a cache key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    UserSession,
    AiMemory,
    FactionState,
    MissionCache,
    PlayerStats,
    WorldState,
    Temporary,
}

impl Namespace {
    pub const ALL: [Namespace; 7] = [
        Namespace::UserSession,
        Namespace::AiMemory,
        Namespace::FactionState,
        Namespace::MissionCache,
        Namespace::PlayerStats,
        Namespace::WorldState,
        Namespace::Temporary,
    ];

    /// Key prefix, without the trailing separator.
    pub const fn prefix(&self) -> &'static str {
        match self {
            Namespace::UserSession => "session:user",
            Namespace::AiMemory => "ai:memory",
            Namespace::FactionState => "faction:state",
            Namespace::MissionCache => "mission:cache",
            Namespace::PlayerStats => "player:stats",
            Namespace::WorldState => "world:state",
            Namespace::Temporary => "temp",
        }
    }

    /// Default TTL in seconds.
    pub const fn default_ttl(&self) -> u64 {
        match self {
            Namespace::UserSession => 3600,
            Namespace::AiMemory => 86400,
            Namespace::FactionState => 1800,
            Namespace::MissionCache => 300,
            Namespace::PlayerStats => 600,
            Namespace::WorldState => 120,
            Namespace::Temporary => 60,
        }
    }

    /// Full key for `id`. World state ignores `id` and always resolves to
    /// `world:state:global`.
    pub fn key(&self, id: &str) -> String {
        match self {
            Namespace::WorldState => format!("{}:{}", self.prefix(), WORLD_STATE_ID),
            _ => format!("{}:{}", self.prefix(), id),
        }
    }

    /// Glob matching every key in the namespace.
    pub fn pattern(&self) -> String {
        format!("{}:*", self.prefix())
    }

    /// Glob matching the key for `id` and anything nested under it.
    pub fn id_pattern(&self, id: &str) -> String {
        format!("{}*", self.key(&escape_glob(id)))
    }

    /// TTL to apply: the caller's override or the namespace default.
    pub fn ttl_or_default(&self, ttl: Option<u64>) -> u64 {
        ttl.unwrap_or_else(|| self.default_ttl())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Escapes glob metacharacters so an id is matched literally.
fn escape_glob(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for c in id.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
