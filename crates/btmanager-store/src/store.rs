//! Main store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row};
use tokio::sync::watch;
use tracing::{debug, info};

use btmanager_types::Device;

use crate::error::{Error, Result};
use crate::feed::DeviceFeed;
use crate::schema;

const DEVICE_COLUMNS: &str = "address, name, strength, created_at, sync_state";

/// SQLite-based store for device records and settings.
///
/// The connection sits behind a mutex, so one `Store` can be shared
/// (e.g. in an `Arc`) between the worker queue and network continuations.
/// Every write republishes the ordered device table to live
/// [`DeviceFeed`]s.
pub struct Store {
    conn: Mutex<Connection>,
    feed: watch::Sender<Vec<Device>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("subscribers", &self.feed.receiver_count())
            .finish()
    }
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Self::from_connection(conn)
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize(&conn)?;
        let initial = query_ordered(&conn)?;
        let (feed, _) = watch::channel(initial);
        Ok(Self {
            conn: Mutex::new(conn),
            feed,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Poisoned)
    }

    /// Republish the ordered table. Called with the lock held so feeds
    /// observe writes in the order they were applied.
    fn publish(&self, conn: &Connection) -> Result<()> {
        let devices = query_ordered(conn)?;
        self.feed.send_replace(devices);
        Ok(())
    }
}

// Device operations
impl Store {
    /// Insert a device, replacing any existing row with the same address.
    pub fn upsert_device(&self, device: &Device) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO devices (address, name, strength, created_at, sync_state)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(address) DO UPDATE SET
                name = excluded.name,
                strength = excluded.strength,
                created_at = excluded.created_at,
                sync_state = excluded.sync_state",
            rusqlite::params![
                device.address,
                device.name,
                device.strength,
                device.created_at,
                device.sync_state,
            ],
        )?;
        debug!(
            address = %device.address,
            synced = device.sync_state,
            "Upserted device"
        );
        self.publish(&conn)
    }

    /// Live view of all devices ordered by `created_at` ascending.
    pub fn read_devices(&self) -> DeviceFeed {
        DeviceFeed::from_receiver(self.feed.subscribe())
    }

    /// Snapshot of all devices ordered by `created_at` ascending.
    pub fn list_devices(&self) -> Result<Vec<Device>> {
        let conn = self.conn()?;
        query_ordered(&conn)
    }

    /// Snapshot of devices not yet confirmed by the remote backend,
    /// ordered by `created_at` ascending.
    pub fn read_unsynced(&self) -> Result<Vec<Device>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE sync_state = 0
             ORDER BY created_at ASC, address ASC"
        ))?;
        let devices = stmt
            .query_map([], device_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(devices)
    }

    /// Get a device by address.
    pub fn get_device(&self, address: &str) -> Result<Option<Device>> {
        let conn = self.conn()?;
        let device = conn
            .query_row(
                &format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE address = ?"),
                [address],
                device_from_row,
            )
            .optional()?;
        Ok(device)
    }

    /// Count stored devices.
    pub fn count_devices(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete every device row.
    pub fn delete_all(&self) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM devices", [])?;
        info!("Cleared {} device(s) from local store", deleted);
        self.publish(&conn)?;
        Ok(deleted)
    }
}

// Settings operations
impl Store {
    /// Read an integer setting.
    pub fn get_setting_i64(&self, key: &str) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write an integer setting.
    pub fn put_setting_i64(&self, key: &str, value: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        debug!(key, value, "Updated setting");
        Ok(())
    }

    /// Remove a setting. Returns whether it existed.
    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(removed > 0)
    }
}

fn query_ordered(conn: &Connection) -> Result<Vec<Device>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY created_at ASC, address ASC"
    ))?;
    let devices = stmt
        .query_map([], device_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(devices)
}

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        address: row.get(0)?,
        name: row.get(1)?,
        strength: row.get(2)?,
        created_at: row.get(3)?,
        sync_state: row.get(4)?,
    })
}
