use alloy::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Compiled contract: name and creation bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub name: String,
    pub bytecode: Bytes,
}

// Waffle/solc-js write `"bytecode": "0x..."`, Foundry and Hardhat nest it
// as `"bytecode": { "object": "0x..." }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Plain(String),
    Nested { object: String },
}

#[derive(Deserialize)]
struct ArtifactFile {
    bytecode: BytecodeField,
}

impl ContractArtifact {
    pub fn from_json(name: &str, raw: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(raw)
            .with_context(|| format!("Artifact '{}' is not valid JSON with a bytecode field", name))?;

        let hex_code = match file.bytecode {
            BytecodeField::Plain(code) => code,
            BytecodeField::Nested { object } => object,
        };

        let bytecode = hex::decode(hex_code.trim_start_matches("0x"))
            .with_context(|| format!("Artifact '{}' has malformed bytecode", name))?;
        if bytecode.is_empty() {
            anyhow::bail!("Artifact '{}' has empty bytecode (abstract contract or interface?)", name);
        }

        Ok(Self {
            name: name.to_string(),
            bytecode: Bytes::from(bytecode),
        })
    }
}

/// Loads artifacts from a build directory, once per name.
pub struct ArtifactStore {
    dir: PathBuf,
    cache: HashMap<String, ContractArtifact>,
}

impl ArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    pub fn load(&mut self, name: &str) -> Result<&ContractArtifact> {
        if !self.cache.contains_key(name) {
            let path = self.dir.join(format!("{}.json", name));
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read artifact {}", path.display()))?;
            let artifact = ContractArtifact::from_json(name, &raw)?;
            info!("📦 Loaded artifact {} ({} bytes of bytecode)", name, artifact.bytecode.len());
            self.cache.insert(name.to_string(), artifact);
        }
        self.cache
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Artifact not cached: {}", name))
    }

    /// Load every named artifact, failing on the first one missing.
    pub fn load_all<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Result<HashMap<String, ContractArtifact>> {
        let mut loaded = HashMap::new();
        for name in names {
            let artifact = self.load(name)?.clone();
            loaded.insert(name.to_string(), artifact);
        }
        Ok(loaded)
    }
}
