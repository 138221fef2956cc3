//! Storage inspection and migration commands.
//!
//! # Usage
//!
//! ```bash
//! # Print availability, key, schema version, item count and size
//! qb-cli info
//!
//! # Move a cart stored under a legacy key to the current key
//! qb-cli migrate
//! ```

use quickbasket_cart_storage::{CartStore, StorageBackend};

use super::CommandError;

/// Print storage diagnostics as JSON.
pub fn info<B: StorageBackend>(store: &CartStore<B>) -> Result<(), CommandError> {
    let rendered = serde_json::to_string_pretty(&store.storage_info())?;

    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}

/// Run the legacy migrator and report the outcome.
pub fn migrate<B: StorageBackend>(store: &CartStore<B>) -> Result<(), CommandError> {
    let migrated = store.migrate_from_legacy();

    #[allow(clippy::print_stdout)]
    {
        if migrated {
            println!("Legacy cart migrated");
        } else {
            println!("Nothing to migrate");
        }
    }
    Ok(())
}
