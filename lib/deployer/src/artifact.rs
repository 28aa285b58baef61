use std::path::{Path, PathBuf};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use eyre::{bail, WrapErr};
use serde::Deserialize;

/// A compiled contract: its ABI and creation bytecode.
///
/// Artifacts are produced outside of this crate, by `forge build` or
/// `hardhat compile`.
#[derive(Clone, Debug)]
pub struct Artifact {
    /// Contract name, e.g. `RandomSVG`.
    pub name: String,
    /// Contract interface.
    pub abi: JsonAbi,
    /// Creation bytecode, without constructor arguments.
    pub bytecode: Bytes,
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: RawBytecode,
}

/// Hardhat stores the bytecode as a hex string, Foundry nests it under
/// `object`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

impl Artifact {
    /// Load the artifact of contract `name` from `dir`.
    ///
    /// Looks for `<dir>/<name>.json` first and falls back to Foundry's
    /// `<dir>/<name>.sol/<name>.json` layout.
    ///
    /// # Errors
    ///
    /// May fail if no artifact exists, it can't be parsed, or it holds no
    /// bytecode (an interface or abstract contract).
    pub fn load(dir: impl AsRef<Path>, name: &str) -> eyre::Result<Self> {
        let path = Self::locate(dir.as_ref(), name)?;
        let json = std::fs::read_to_string(&path).wrap_err(format!(
            "failed to read artifact {}",
            path.display()
        ))?;
        Self::from_json(name, &json)
            .wrap_err(format!("invalid artifact {}", path.display()))
    }

    /// Parse an artifact from its JSON representation.
    ///
    /// # Errors
    ///
    /// May fail if `json` is malformed or has empty bytecode.
    pub fn from_json(name: &str, json: &str) -> eyre::Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        let bytecode = match raw.bytecode {
            RawBytecode::Hex(bytes) | RawBytecode::Object { object: bytes } => {
                bytes
            }
        };
        if bytecode.is_empty() {
            bail!("artifact {name} has no bytecode");
        }

        Ok(Self { name: name.to_owned(), abi: raw.abi, bytecode })
    }

    fn locate(dir: &Path, name: &str) -> eyre::Result<PathBuf> {
        let candidates = [
            dir.join(format!("{name}.json")),
            dir.join(format!("{name}.sol")).join(format!("{name}.json")),
        ];
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Ok(path.clone()),
            None => bail!(
                "no artifact for {name} in {}: compile the contracts first",
                dir.display()
            ),
        }
    }
}
