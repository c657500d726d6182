use std::path::PathBuf;

use hashlink::LinkedHashMap;
use saphyr::{Scalar, Yaml};
use tracing::debug;

use crate::snapshot::DEFAULT_MAX_DEPTH;

/// One named scan target: which directory to snapshot and how.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanProfile {
    pub name: String,
    pub root: PathBuf,
    pub max_depth: i64,
    pub hash_contents: bool,
}

impl ScanProfile {
    pub fn new(name: String, root: PathBuf, max_depth: i64, hash_contents: bool) -> Self {
        ScanProfile {
            name,
            root,
            max_depth,
            hash_contents,
        }
    }

    /// Builds a profile from one `profiles:` mapping entry. Returns `None`
    /// when the entry has no usable `root`, leaving the caller to skip it.
    pub fn from_profile_yaml(
        profile_name: &str,
        profile_data: &LinkedHashMap<Yaml, Yaml>,
    ) -> Option<Self> {
        debug!("Parsing profile '{}'", profile_name);

        let root = profile_data
            .get(&Yaml::Value(Scalar::String("root".into())))?
            .as_str()?;
        let max_depth = match profile_data.get(&Yaml::Value(Scalar::String("maxDepth".into()))) {
            Some(Yaml::Value(Scalar::Integer(depth))) => *depth,
            _ => DEFAULT_MAX_DEPTH,
        };
        let hash_contents = matches!(
            profile_data.get(&Yaml::Value(Scalar::String("hashContents".into()))),
            Some(Yaml::Value(Scalar::Boolean(true)))
        );

        Some(ScanProfile {
            name: profile_name.to_string(),
            root: PathBuf::from(root),
            max_depth,
            hash_contents,
        })
    }
}
