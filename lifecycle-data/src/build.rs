use crate::build_plan::Require;
use serde::{Deserialize, Serialize};

/// The `build.toml` document a buildpack with API 0.5 or later writes at the
/// root of its layers directory.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BuildToml {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom: Vec<Require>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmet: Vec<Unmet>,
}

/// A requirement from the incoming buildpack plan the buildpack did not
/// satisfy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Unmet {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parses_unmet_entries() {
        let build = toml::from_str::<BuildToml>(indoc! {r#"
            unmet = [{ name = "water" }, { name = "tea" }]
        "#})
        .unwrap();

        assert_eq!(
            build.unmet,
            [
                Unmet {
                    name: String::from("water")
                },
                Unmet {
                    name: String::from("tea")
                }
            ]
        );
    }

    #[test]
    fn absent_file_equivalent_parses_empty() {
        let build = toml::from_str::<BuildToml>("").unwrap();
        assert!(build.bom.is_empty());
        assert!(build.unmet.is_empty());
    }
}
