use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

use crate::config::ScanProfile;
use crate::ext::BestEffortPathExt;

const PROFILE_FILE_NAME: &str = "treesnap.yaml";

fn get_profile_file_path(root: &Path) -> PathBuf {
    root.join(PROFILE_FILE_NAME)
}

/// The scan profiles configured in `treesnap.yaml`.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<String, ScanProfile>,
}

impl ProfileRegistry {
    pub fn empty() -> Self {
        ProfileRegistry {
            profiles: HashMap::new(),
        }
    }

    pub async fn read(root: &Path) -> Result<Self, ProfileRegistryCreationError> {
        Self::from_path(get_profile_file_path(root)).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, ProfileRegistryCreationError> {
        debug!("Reading profile file: {}", path.best_effort_path_display());
        let bytes = fs::read(&path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        let contents = String::from_utf8(bytes).context(NotUtf8Snafu {
            file_path: path.best_effort_path_display(),
        })?;
        contents.as_str().try_into()
    }

    pub fn get_profile_by_name(&self, name: impl AsRef<str>) -> Option<&ScanProfile> {
        self.profiles.get(name.as_ref())
    }

    pub fn get_profiles_iter(&self) -> impl Iterator<Item = &ScanProfile> {
        self.profiles.values()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn parse_profiles_from_yaml(
        top_level: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<Vec<ScanProfile>, ProfileRegistryCreationError> {
        let profiles = top_level
            .get(&Yaml::Value(Scalar::String(Cow::Borrowed("profiles"))))
            .unwrap_or(&Yaml::Mapping(LinkedHashMap::new()))
            .as_mapping()
            .ok_or(ProfileRegistryCreationError::ProfilesNotMap)?
            .iter()
            .filter_map(|(key, value)| {
                if let Yaml::Value(Scalar::String(profile_name)) = key {
                    if let Yaml::Mapping(profile_data) = value {
                        return Some((profile_name, profile_data));
                    }
                }
                debug!("Skipping invalid profile entry: {:?}", key);
                None
            })
            .filter_map(|(profile_name, profile_data)| {
                ScanProfile::from_profile_yaml(profile_name, profile_data)
            })
            .collect::<Vec<_>>();

        Ok(profiles)
    }
}

impl TryFrom<&str> for ProfileRegistry {
    type Error = ProfileRegistryCreationError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents)
            .map_err(|e| ProfileRegistryCreationError::ParseError { source: e })?;
        let contents = documents
            .first()
            .ok_or(ProfileRegistryCreationError::MalformedConfig)?;

        let top_level = contents
            .as_mapping()
            .ok_or(ProfileRegistryCreationError::TopLevelNotMap)?;

        let profiles = Self::parse_profiles_from_yaml(top_level)?
            .into_iter()
            .map(|profile| (profile.name.clone(), profile))
            .try_fold(HashMap::new(), |mut acc, (name, profile)| {
                if acc.contains_key(&name) {
                    // saphyr rejects duplicate mapping keys while parsing,
                    // so this is a guard
                    Err(ProfileRegistryCreationError::DuplicateProfile { profile_name: name })
                } else {
                    acc.insert(name, profile);
                    Ok(acc)
                }
            })?;

        Ok(ProfileRegistry { profiles })
    }
}

#[derive(Debug, Snafu)]
pub enum ProfileRegistryCreationError {
    #[snafu(display("Failed to read the profile file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Profile file {} is not valid UTF-8", file_path))]
    NotUtf8 {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the profile file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted profile file"))]
    MalformedConfig,
    #[snafu(display("Top level of the profile file should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Profiles section should be a map"))]
    ProfilesNotMap,
    #[snafu(display("Profile '{}' is defined multiple times", profile_name))]
    DuplicateProfile { profile_name: String },
}
