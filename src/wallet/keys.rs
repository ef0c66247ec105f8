//! Development keys and their on-disk wallet layout.
//!
//! Keys are derived deterministically from a dev URI such as `//Alice` so the same URI always
//! names the same account. Signing is left to the node's own wallet tooling; these handles only
//! carry the seed and the public identifier that tooling reads from the key files.

use std::{
    fmt::{Debug, Formatter},
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{HarnessError, HarnessResult};

const SEED_DOMAIN: &[u8] = b"localnet_harness.dev_seed";
const PUBLIC_DOMAIN: &[u8] = b"localnet_harness.dev_public";

#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    uri: String,
    seed: [u8; 32],
    public: [u8; 32],
}

impl Debug for Keypair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("uri", &self.uri)
            .field("public", &self.public_hex())
            .finish_non_exhaustive()
    }
}

impl Keypair {
    pub fn from_uri(uri: &str) -> HarnessResult<Self> {
        if uri.trim().is_empty() {
            return Err(HarnessError::InvalidWalletUri(uri.to_string()));
        }
        let seed: [u8; 32] = Sha256::new()
            .chain_update(SEED_DOMAIN)
            .chain_update(uri.as_bytes())
            .finalize()
            .into();
        let public: [u8; 32] = Sha256::new()
            .chain_update(PUBLIC_DOMAIN)
            .chain_update(seed)
            .finalize()
            .into();
        Ok(Self {
            uri: uri.to_string(),
            seed,
            public,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn seed_hex(&self) -> String {
        hex::encode(self.seed)
    }

    pub fn public_hex(&self) -> String {
        hex::encode(self.public)
    }
}

/// JSON key file as written under the wallet directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFile {
    pub uri: String,
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secret_seed: Option<String>,
}

/// A wallet directory holding a cold key and one hot key for the same keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub name: String,
    pub hotkey: String,
    pub path: PathBuf,
}

impl Wallet {
    /// Writes the key files of `keypair` below `path/name`.
    pub fn create(path: &Path, name: &str, hotkey: &str, keypair: &Keypair) -> HarnessResult<Self> {
        let wallet = Self {
            name: name.to_string(),
            hotkey: hotkey.to_string(),
            path: path.to_path_buf(),
        };
        fs::create_dir_all(wallet.hotkeys_dir())?;

        let public = KeyFile {
            uri: keypair.uri.clone(),
            public_key: keypair.public_hex(),
            secret_seed: None,
        };
        let secret = KeyFile {
            secret_seed: Some(keypair.seed_hex()),
            ..public.clone()
        };
        write_key_file(&wallet.coldkeypub_path(), &public)?;
        write_key_file(&wallet.coldkey_path(), &secret)?;
        write_key_file(&wallet.hotkey_path(), &secret)?;

        debug!(path:% = wallet.dir().display(), public_key = public.public_key.as_str(); "Wallet key files written");
        Ok(wallet)
    }

    pub fn dir(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    pub fn hotkeys_dir(&self) -> PathBuf {
        self.dir().join("hotkeys")
    }

    pub fn coldkey_path(&self) -> PathBuf {
        self.dir().join("coldkey.json")
    }

    pub fn coldkeypub_path(&self) -> PathBuf {
        self.dir().join("coldkeypub.json")
    }

    pub fn hotkey_path(&self) -> PathBuf {
        self.hotkeys_dir().join(format!("{}.json", self.hotkey))
    }
}

fn write_key_file(path: &Path, key: &KeyFile) -> HarnessResult<()> {
    fs::write(path, serde_json::to_vec_pretty(key)?)?;
    Ok(())
}
