use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use xpssynth_data::{AugerRecord, ElementRecord, SampleTable, ShellDatabase};

use crate::builtin::builtin_database;
use crate::error::{Result, XpsError};

struct InitializedDb {
    data: ShellDatabase,
    index: HashMap<String, usize>,
}

impl InitializedDb {
    fn new(data: ShellDatabase) -> Self {
        // Keys, symbols and names all resolve, case-insensitively
        let mut index = HashMap::new();
        for (i, elem) in data.elements.iter().enumerate() {
            for id in [&elem.key, &elem.symbol, &elem.name] {
                index.entry(id.to_lowercase()).or_insert(i);
            }
        }
        InitializedDb { data, index }
    }
}

static BUILTIN: OnceLock<Arc<InitializedDb>> = OnceLock::new();

/// The shell database the synthesizer reads from.
///
/// Cheap to clone: the tables sit behind an `Arc` and are never mutated.
#[derive(Clone)]
pub struct XpsDb {
    db: Arc<InitializedDb>,
}

impl XpsDb {
    /// The built-in noble gas table.
    pub fn new() -> Self {
        let db = BUILTIN.get_or_init(|| Arc::new(InitializedDb::new(builtin_database())));
        XpsDb { db: Arc::clone(db) }
    }

    pub fn from_database(data: ShellDatabase) -> Self {
        XpsDb {
            db: Arc::new(InitializedDb::new(data)),
        }
    }

    /// Decode a blob written by `xpssynth-generate` (postcard, zstd-compressed).
    pub fn from_compressed(bytes: &[u8]) -> Result<Self> {
        let mut decoder = ruzstd::decoding::StreamingDecoder::new(bytes)
            .map_err(|e| XpsError::DataError(format!("zstd header: {e}")))?;
        let mut decompressed = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut decompressed)
            .map_err(|e| XpsError::DataError(format!("zstd decode: {e}")))?;

        let data: ShellDatabase = postcard::from_bytes(&decompressed)
            .map_err(|e| XpsError::DataError(format!("postcard decode: {e}")))?;
        tracing::debug!(elements = data.elements.len(), "loaded shell database");
        Ok(Self::from_database(data))
    }

    /// Access the raw database.
    pub fn raw(&self) -> &ShellDatabase {
        &self.db.data
    }

    /// Resolve an element identifier (key, symbol or name) to its record.
    pub fn element(&self, element: &str) -> Result<&ElementRecord> {
        self.db
            .index
            .get(&element.to_lowercase())
            .map(|&i| &self.db.data.elements[i])
            .ok_or_else(|| XpsError::UnknownElement(element.to_string()))
    }

    /// Canonical key of an element identifier.
    pub fn resolve_element(&self, element: &str) -> Result<&str> {
        Ok(&self.element(element)?.key)
    }

    /// Keys of every element in table order.
    pub fn element_keys(&self) -> Vec<&str> {
        self.db.data.elements.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn element_name(&self, element: &str) -> Result<&str> {
        Ok(&self.element(element)?.name)
    }

    pub fn symbol(&self, element: &str) -> Result<&str> {
        Ok(&self.element(element)?.symbol)
    }

    /// Binding energies (eV) in shell order.
    pub fn binding_energies(&self, element: &str) -> Result<Vec<(&str, f64)>> {
        Ok(self
            .element(element)?
            .shells
            .iter()
            .map(|s| (s.name.as_str(), s.binding_energy))
            .collect())
    }

    pub fn binding_energy(&self, element: &str, shell: &str) -> Result<f64> {
        let elem = self.element(element)?;
        elem.shells
            .iter()
            .find(|s| s.name == shell)
            .map(|s| s.binding_energy)
            .ok_or_else(|| unknown_shell(element, shell))
    }

    /// Sample table of a shell, following the reuse-last-table rule.
    pub fn shell_samples(&self, element: &str, shell: &str) -> Result<&SampleTable> {
        let elem = self.element(element)?;
        elem.shell_index(shell)
            .and_then(|i| elem.samples_for(i))
            .ok_or_else(|| unknown_shell(element, shell))
    }

    pub fn auger_lines(&self, element: &str) -> Result<&[AugerRecord]> {
        Ok(&self.element(element)?.auger)
    }
}

impl Default for XpsDb {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_shell(element: &str, shell: &str) -> XpsError {
    XpsError::UnknownShell {
        element: element.to_string(),
        shell: shell.to_string(),
    }
}
