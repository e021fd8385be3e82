use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::VectorStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn serialize_vector(v: &[f32]) -> Vec<u8> {
        v.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_vector(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Persistence(e.to_string()))
    }
}

impl VectorStore for SqliteVectorStore {
    fn store(&self, id: &str, vector: &[f32]) -> Result<(), DomainError> {
        let conn = self.lock()?;
        let blob = Self::serialize_vector(vector);
        conn.execute(
            "INSERT OR REPLACE INTO vectors (id, vector) VALUES (?1, ?2)",
            params![id, blob],
        ).map_err(|e| DomainError::Persistence(format!("Failed to store vector: {e}")))?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(String, Vec<f32>)>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, vector FROM vectors")?;
        let vectors = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, Self::deserialize_vector(&blob)))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vectors)
    }

    fn get_stored_dimension(&self) -> Result<Option<usize>, DomainError> {
        let conn = self.lock()?;
        let len: Option<i64> = conn
            .query_row("SELECT length(vector) FROM vectors LIMIT 1", [], |r| r.get(0))
            .optional()?;
        Ok(len.map(|bytes| bytes as usize / 4))
    }
}
