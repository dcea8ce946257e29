use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display, path::Path, str::FromStr};

use crate::model::ParseError;
use log::{debug, error};
use toml::{map::Map, Value};

/// Location of a remote repository, `forge/organization/repository`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Coordinate {
    pub forge: String,
    pub organization: String,
    pub repository: String,
    pub protocol: Option<Protocol>,
}

impl Coordinate {
    pub fn from_url_protocol(
        url: &str,
        protocol: Option<Protocol>,
    ) -> Result<Coordinate, ParseError> {
        let re: Regex = Regex::new(
            r"^(?:(?:https|ssh)://)?(?:git@)?(?P<forge>[^/]+)/(?P<organization>[^/]+)/(?P<repository>[^/]+?)(?:\.git)?/?$",
        )
        .unwrap();
        let url_parse_results = re.captures(url);
        let url_parse_results = url_parse_results.as_ref();

        Ok(Coordinate {
            forge: url_parse_results
                .and_then(|c| c.name("forge"))
                .map(|s| s.as_str().to_string())
                .ok_or_else(|| {
                    ParseError::MissingUrlComponent("forge".to_string(), url.to_string())
                })?,
            organization: url_parse_results
                .and_then(|c| c.name("organization"))
                .map(|s| s.as_str().to_string())
                .ok_or_else(|| {
                    ParseError::MissingUrlComponent("organization".to_string(), url.to_string())
                })?,
            repository: url_parse_results
                .and_then(|c| c.name("repository"))
                .map(|s| s.as_str().to_string())
                .ok_or_else(|| {
                    ParseError::MissingUrlComponent("repository".to_string(), url.to_string())
                })?,
            protocol,
        })
    }

    pub fn from_url(url: &str) -> Result<Coordinate, ParseError> {
        Self::from_url_protocol(url, None)
    }

    pub fn to_git_url(&self, default_protocol: Protocol) -> String {
        match self.protocol.unwrap_or(default_protocol) {
            Protocol::Https => format!(
                "https://{}/{}/{}",
                self.forge, self.organization, self.repository
            ),
            Protocol::Ssh => format!(
                "ssh://git@{}/{}/{}.git",
                self.forge, self.organization, self.repository
            ),
        }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.forge, self.organization, self.repository
        )
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize, Ord, PartialOrd)]
pub enum Protocol {
    #[serde(rename = "https")]
    Https,
    #[serde(rename = "ssh")]
    Ssh,
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.to_ascii_lowercase();
        match value.as_str() {
            "https" => Ok(Protocol::Https),
            "ssh" => Ok(Protocol::Ssh),
            _ => Err(ParseError::InvalidProtocol(value)),
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Protocol::Https => f.write_str("https"),
            Protocol::Ssh => f.write_str("ssh"),
        }
    }
}

/// Name of the directory a dependency is checked out into.
#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct DependencyName(String);

impl DependencyName {
    pub fn new(s: String) -> Self {
        DependencyName(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DependencyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DependencyName {
    fn from(s: &str) -> Self {
        DependencyName(s.to_string())
    }
}

/// What to check out: a branch or tag to fetch single-branch, and
/// optionally an exact commit on it that overrides the tip.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RevisionSpecification {
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub revision: Option<String>,
}

impl RevisionSpecification {
    pub fn branch(branch: impl Into<String>) -> Self {
        RevisionSpecification {
            branch: branch.into(),
            revision: None,
        }
    }

    pub fn pinned(branch: impl Into<String>, revision: impl Into<String>) -> Self {
        RevisionSpecification {
            branch: branch.into(),
            revision: Some(revision.into()),
        }
    }
}

impl Display for RevisionSpecification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.revision {
            None => write!(f, "{}", self.branch),
            Some(revision) => write!(f, "{}@{}", self.branch, revision),
        }
    }
}

fn validate_revision(revision: &str) -> Result<(), ParseError> {
    let re = Regex::new(r"^[0-9a-f]{7,40}$").unwrap();
    if re.is_match(revision) {
        Ok(())
    } else {
        Err(ParseError::InvalidRevision(revision.to_string()))
    }
}

#[derive(Debug, PartialEq, PartialOrd, Ord, Eq, Clone)]
pub struct Dependency {
    pub name: DependencyName,
    pub coordinate: Coordinate,
    pub specification: RevisionSpecification,
}

impl Dependency {
    /// Dependency named after its repository.
    pub fn new(coordinate: Coordinate, specification: RevisionSpecification) -> Dependency {
        let name = DependencyName::new(coordinate.repository.clone());
        Dependency {
            name,
            coordinate,
            specification,
        }
    }

    pub fn renamed(
        name: impl Into<String>,
        coordinate: Coordinate,
        specification: RevisionSpecification,
    ) -> Dependency {
        Dependency {
            name: DependencyName::new(name.into()),
            coordinate,
            specification,
        }
    }
}

/// Ordered list of dependencies to materialize. Order is part of the
/// contract: trees are fetched strictly in manifest order.
#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Manifest {
    pub dependencies: Vec<Dependency>,
}

impl Manifest {
    /// The fixed dependency set this tool was built around.
    pub fn builtin() -> Manifest {
        fn dep(url: &str, branch: &str) -> Dependency {
            Dependency::new(
                Coordinate::from_url(url).unwrap(),
                RevisionSpecification::branch(branch),
            )
        }
        fn pinned(url: &str, branch: &str, revision: &str) -> Dependency {
            Dependency::new(
                Coordinate::from_url(url).unwrap(),
                RevisionSpecification::pinned(branch, revision),
            )
        }

        Manifest {
            dependencies: vec![
                dep("github.com/yurablok/cpp-adaptive-benchmark", "main"),
                dep("github.com/giacomodrago/minijson_reader", "1.0"),
                dep("github.com/giacomodrago/minijson_writer", "master"),
                Dependency::renamed(
                    "nlohmann_json",
                    Coordinate::from_url("github.com/nlohmann/json").unwrap(),
                    RevisionSpecification::branch("v3.10.5"),
                ),
                pinned(
                    "github.com/Tencent/rapidjson",
                    "master",
                    "232389d4f1012dddec4ef84861face2d2ba85709",
                ),
                pinned(
                    "github.com/martinmoene/string-view-lite",
                    "master",
                    "f7aca36f5caa05e451f6887aa707df89197e6de6",
                ),
                dep("github.com/yurablok/switch-str", "main"),
                pinned(
                    "github.com/mpark/variant",
                    "master",
                    "23cb94f027d4ef33bf48133acc2695c7e5c6f1e7",
                ),
            ],
        }
    }

    pub fn from_file(path: &Path) -> Result<Manifest, ParseError> {
        debug!(
            "Attempting to read manifest from depfetch file {}",
            path.display()
        );
        let contents = std::fs::read_to_string(path)?;

        let manifest = Manifest::from_toml_str(&contents);
        if let Err(err) = &manifest {
            error!("Could not build a valid manifest from a depfetch toml file due to err {err}")
        }
        manifest
    }

    pub fn from_toml_str(data: &str) -> Result<Manifest, ParseError> {
        let toml_value = toml::from_str::<HashMap<String, Value>>(data)?;

        let mut dependencies = toml_value
            .into_iter()
            .map(|(k, v)| parse_dependency(k, &v))
            .collect::<Result<Vec<_>, _>>()?;
        dependencies.sort();

        Ok(Manifest { dependencies })
    }

    pub fn into_toml(self) -> Value {
        let mut root = Map::new();
        for d in self.dependencies {
            let mut dependency = Map::new();
            dependency.insert("url".to_string(), Value::String(d.coordinate.to_string()));
            if let Some(protocol) = d.coordinate.protocol {
                dependency.insert("protocol".to_string(), Value::String(protocol.to_string()));
            }
            dependency.insert(
                "branch".to_string(),
                Value::String(d.specification.branch.clone()),
            );
            if let Some(revision) = d.specification.revision {
                dependency.insert("revision".to_string(), Value::String(revision));
            }
            root.insert(d.name.to_string(), Value::Table(dependency));
        }
        Value::Table(root)
    }
}

fn parse_dependency(name: String, value: &toml::Value) -> Result<Dependency, ParseError> {
    let protocol = match value.get("protocol") {
        None => None,
        Some(toml) => Some(toml.clone().try_into::<Protocol>()?),
    };

    let name = DependencyName::new(name);

    let coordinate = value
        .get("url")
        .ok_or_else(|| ParseError::MissingKey("url".to_string()))
        .and_then(|x| x.clone().try_into::<String>().map_err(|e| e.into()))
        .and_then(|url| Coordinate::from_url_protocol(&url, protocol))?;

    let branch = value
        .get("branch")
        .ok_or_else(|| ParseError::MissingKey("branch".to_string()))
        .and_then(|v| v.clone().try_into::<String>().map_err(|e| e.into()))?;

    let revision = value
        .get("revision")
        .map(|v| v.clone().try_into::<String>())
        .map_or(Ok(None), |v| v.map(Some))?;
    if let Some(revision) = &revision {
        validate_revision(revision)?;
    }

    Ok(Dependency {
        name,
        coordinate,
        specification: RevisionSpecification { branch, revision },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_coordinate_from_bare_url() {
        let coordinate = Coordinate::from_url("github.com/mpark/variant").unwrap();
        assert_eq!(
            coordinate,
            Coordinate {
                forge: "github.com".to_string(),
                organization: "mpark".to_string(),
                repository: "variant".to_string(),
                protocol: None,
            }
        );
    }

    #[test]
    fn parse_coordinate_strips_scheme_and_git_suffix() {
        let coordinate =
            Coordinate::from_url("https://github.com/Tencent/rapidjson.git").unwrap();
        assert_eq!(coordinate.forge, "github.com");
        assert_eq!(coordinate.organization, "Tencent");
        assert_eq!(coordinate.repository, "rapidjson");
    }

    #[test]
    fn parse_coordinate_rejects_partial_url() {
        Coordinate::from_url("github.com/nlohmann").expect_err("should reject url without repo");
    }

    #[test]
    fn coordinate_to_git_url() {
        let coordinate = Coordinate::from_url("github.com/nlohmann/json").unwrap();
        assert_eq!(
            coordinate.to_git_url(Protocol::Https),
            "https://github.com/nlohmann/json"
        );
        assert_eq!(
            coordinate.to_git_url(Protocol::Ssh),
            "ssh://git@github.com/nlohmann/json.git"
        );
    }

    #[test]
    fn builtin_manifest_shape() {
        let manifest = Manifest::builtin();
        assert_eq!(manifest.dependencies.len(), 8);

        let names: Vec<&str> = manifest
            .dependencies
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec![
            "cpp-adaptive-benchmark",
            "minijson_reader",
            "minijson_writer",
            "nlohmann_json",
            "rapidjson",
            "string-view-lite",
            "switch-str",
            "variant",
        ]);

        let pinned: Vec<&str> = manifest
            .dependencies
            .iter()
            .filter(|d| d.specification.revision.is_some())
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(pinned, vec!["rapidjson", "string-view-lite", "variant"]);
    }

    #[test]
    fn builtin_manifest_pins_are_valid_revisions() {
        for dependency in Manifest::builtin().dependencies {
            if let Some(revision) = &dependency.specification.revision {
                validate_revision(revision).unwrap();
            }
        }
    }

    #[test]
    fn parse_manifest_toml() {
        let manifest = Manifest::from_toml_str(
            r#"
            [nlohmann_json]
            url = "github.com/nlohmann/json"
            branch = "v3.10.5"

            [rapidjson]
            url = "github.com/Tencent/rapidjson"
            branch = "master"
            revision = "232389d4f1012dddec4ef84861face2d2ba85709"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.dependencies.len(), 2);
        let json = &manifest.dependencies[0];
        assert_eq!(json.name, DependencyName::from("nlohmann_json"));
        assert_eq!(json.coordinate.repository, "json");
        assert_eq!(json.specification, RevisionSpecification::branch("v3.10.5"));

        let rapidjson = &manifest.dependencies[1];
        assert_eq!(
            rapidjson.specification,
            RevisionSpecification::pinned(
                "master",
                "232389d4f1012dddec4ef84861face2d2ba85709"
            )
        );
    }

    #[test]
    fn parse_manifest_missing_branch() {
        let err = Manifest::from_toml_str(
            r#"
            [variant]
            url = "github.com/mpark/variant"
            "#,
        )
        .expect_err("should require a branch");
        assert!(matches!(err, ParseError::MissingKey(key) if key == "branch"));
    }

    #[test]
    fn parse_manifest_rejects_bad_revision() {
        let err = Manifest::from_toml_str(
            r#"
            [variant]
            url = "github.com/mpark/variant"
            branch = "master"
            revision = "not-a-sha"
            "#,
        )
        .expect_err("should reject a non-hex revision");
        assert!(matches!(err, ParseError::InvalidRevision(_)));
    }

    #[test]
    fn manifest_toml_round_trip() {
        let manifest = Manifest::builtin();
        let rendered = toml::to_string_pretty(&manifest.clone().into_toml()).unwrap();
        let parsed = Manifest::from_toml_str(&rendered).unwrap();

        let mut expected = manifest;
        expected.dependencies.sort();
        assert_eq!(parsed, expected);
    }
}
