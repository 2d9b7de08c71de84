//! Route manifests: the routes of an application plus generator options,
//! in YAML or JSON, as consumed by the command-line tool.
//!
//! ```yaml
//! title: Accounts API
//! version: 2.1.0
//! source_root: src
//! routes:
//!   - method: GET
//!     path: /users/:id
//!     handler: app::handlers::users::get_user
//!     response:
//!       name: User
//!       fields:
//!         - { name: id, kind: integer, validate: required }
//!     auth:
//!       name: BearerAuth
//!       scheme: { kind: bearer, format: JWT }
//! ```

use crate::config::GeneratorConfig;
use crate::descriptor::RouteInfo;
use crate::error::Result;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A parsed route manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteManifest {
    #[serde(flatten)]
    pub config: GeneratorConfig,
    #[serde(default)]
    pub routes: Vec<RouteInfo>,
}

impl RouteManifest {
    /// Loads a manifest, choosing JSON for `.json` files and YAML otherwise.
    ///
    /// A relative `source_root` is taken relative to the manifest's directory.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading route manifest {}", path.display());
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut manifest = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };

        if manifest.config.source_root.is_relative() {
            if let Some(dir) = path.parent() {
                manifest.config.source_root = dir.join(&manifest.config.source_root);
            }
        }

        debug!("Manifest lists {} routes", manifest.routes.len());
        Ok(manifest)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
