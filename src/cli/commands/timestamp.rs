//! Show how fresh the local database is.

use anyhow::anyhow;

use crate::config::Config;
use crate::error::Result;
use crate::store::LocalStore;
use crate::util::time::short_date;

/// Execute the timestamp command.
///
/// Prints the date of the newest `changed_at` value in the store, which
/// is when the loaded snapshot was effectively taken.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or holds no issues.
pub fn execute(config: &Config) -> Result<()> {
    let store = LocalStore::open(&config.db_path)?;
    let newest = store
        .max_changed_at()?
        .ok_or_else(|| anyhow!("the local database holds no issues; run: tm fetch, then tm populate"))?;
    println!("{}", short_date(newest));
    Ok(())
}
