use std::path::Path;

use crate::config::Config;
use crate::models::Ecosystem;

/// Decide which ecosystem a changed file belongs to.
///
/// The first configured depfile that matches the trailing components of
/// `path` wins, so `requirements.txt` matches `services/api/requirements.txt`
/// but not `requirements.txt.bak`. Unmatched paths map to [`Ecosystem::None`].
pub fn detect_ecosystem(path: &Path, config: &Config) -> Ecosystem {
    let matched = config
        .ecosystems
        .iter()
        .find(|eco| !eco.depfile.is_empty() && path.ends_with(&eco.depfile));

    match matched {
        Some(eco) => {
            let ecosystem = Ecosystem::from_name(&eco.name);
            if ecosystem == Ecosystem::None {
                tracing::warn!(name = %eco.name, depfile = %eco.depfile, "unknown ecosystem in config");
            }
            ecosystem
        }
        None => {
            tracing::debug!(path = %path.display(), "not a configured dependency file");
            Ecosystem::None
        }
    }
}
