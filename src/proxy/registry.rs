use crate::models::server::{builtin_servers, SafeServerView, ServerDescriptor};
use icu_collator::{Collator, CollatorOptions, Strength};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no default server (a descriptor without an id) is configured")]
    NoDefaultServer,

    #[error("more than one default server configured: {0:?}")]
    MultipleDefaultServers(Vec<String>),

    #[error("duplicate server id: {0}")]
    DuplicateId(String),

    #[error("server '{name}' has an invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        name: String,
        endpoint: String,
        reason: String,
    },

    #[error("failed to read servers file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

// Immutable table of upstream deployments, built once at startup and shared
// behind an `Arc`. Lookups are index based; nothing is recomputed per request.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    descriptors: Vec<ServerDescriptor>,
    by_id: HashMap<String, usize>,
    default_index: usize,
    presentation: Vec<usize>,
    public: Vec<SafeServerView>,
}

// Root-locale ICU collation, the same ordering a browser's `localeCompare`
// applies: accents and case only break ties.
fn name_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            warn!("Name collation unavailable, sorting by code point: {}", e);
            None
        }
    }
}

fn compare_names(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| b.cmp(a)),
    }
}

fn validate_endpoint(server: &ServerDescriptor) -> Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidEndpoint {
        name: server.name.clone(),
        endpoint: server.endpoint.clone(),
        reason,
    };
    let parsed = url::Url::parse(&server.endpoint).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

impl ServerRegistry {
    pub fn load(raw: Vec<ServerDescriptor>) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::new();
        let mut defaults = Vec::new();

        for (index, server) in raw.iter().enumerate() {
            validate_endpoint(server)?;
            if server.is_default() {
                defaults.push(index);
                continue;
            }
            if by_id.insert(server.id_str().to_string(), index).is_some() {
                return Err(RegistryError::DuplicateId(server.id_str().to_string()));
            }
        }

        let default_index = match defaults.as_slice() {
            [] => return Err(RegistryError::NoDefaultServer),
            [single] => *single,
            many => {
                return Err(RegistryError::MultipleDefaultServers(
                    many.iter().map(|i| raw[*i].name.clone()).collect(),
                ))
            }
        };

        let mut pinned: Vec<usize> = (0..raw.len()).filter(|i| raw[*i].pinned).collect();
        let mut unpinned: Vec<usize> = (0..raw.len()).filter(|i| !raw[*i].pinned).collect();
        let collator = name_collator();
        unpinned.sort_by(|a, b| compare_names(collator.as_ref(), &raw[*a].name, &raw[*b].name));
        pinned.append(&mut unpinned);
        let presentation = pinned;

        let public: Vec<SafeServerView> = presentation
            .iter()
            .map(|i| &raw[*i])
            .filter(|server| !server.disabled)
            .map(ServerDescriptor::safe_view)
            .collect();

        info!(
            "Server registry loaded: {} servers ({} public), default '{}'",
            raw.len(),
            public.len(),
            raw[default_index].name
        );

        Ok(Self {
            descriptors: raw,
            by_id,
            default_index,
            presentation,
            public,
        })
    }

    pub fn load_from_file(path: &Path) -> Result<Self, RegistryError> {
        let unreadable = |reason: String| RegistryError::Unreadable {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        let raw: Vec<ServerDescriptor> =
            serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))?;
        debug!("Read {} server descriptors from {}", raw.len(), path.display());
        Self::load(raw)
    }

    pub fn builtin() -> Result<Self, RegistryError> {
        Self::load(builtin_servers())
    }

    pub fn default_server(&self) -> &ServerDescriptor {
        &self.descriptors[self.default_index]
    }

    // Exact id match over every descriptor, disabled ones included.
    pub fn resolve(&self, id: &str) -> Option<&ServerDescriptor> {
        if id.is_empty() {
            return Some(self.default_server());
        }
        self.by_id.get(id).map(|i| &self.descriptors[*i])
    }

    // Forks are addressed by subdomain (`gdps.example.com`). A host without a
    // subdomain maps to the default server; an unknown subdomain maps to none.
    pub fn resolve_host(&self, host: &str) -> Option<&ServerDescriptor> {
        let hostname = host.split(':').next().unwrap_or_default().to_ascii_lowercase();
        let labels: Vec<&str> = hostname.split('.').filter(|l| !l.is_empty()).collect();
        let has_subdomain = match labels.as_slice() {
            [_, last] => *last == "localhost",
            [_, _, _, ..] => true,
            _ => false,
        };
        if !has_subdomain {
            return Some(self.default_server());
        }
        let label = labels[0];
        self.descriptors
            .iter()
            .find(|server| !server.is_default() && server.id_str().eq_ignore_ascii_case(label))
    }

    pub fn public_view(&self) -> &[SafeServerView] {
        &self.public
    }

    // Every descriptor in presentation order, disabled ones included.
    pub fn iter(&self) -> impl Iterator<Item = &ServerDescriptor> {
        self.presentation.iter().map(|i| &self.descriptors[*i])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
