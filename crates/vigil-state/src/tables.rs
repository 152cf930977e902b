//! redb table definitions for the Vigil key-value store.

use redb::TableDefinition;

/// Plain string values keyed by `{namespace}:{name}`, e.g. `health:last_alert`.
pub const KV: TableDefinition<&str, &str> = TableDefinition::new("kv");
