//! Starter template flavors.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::cms::error::CmsError;
use crate::config::TemplateConfig;

/// A starter project variant, named after the language of its build script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Python build script.
    #[default]
    Python,
    /// Bun (TypeScript) build script.
    Bun,
}

impl Flavor {
    /// All supported flavors.
    pub const ALL: [Self; 2] = [Self::Python, Self::Bun];

    /// The name accepted by [`Flavor::from_str`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Bun => "bun",
        }
    }

    /// The archive URL configured for this flavor.
    #[must_use]
    pub fn source_url(self, templates: &TemplateConfig) -> &str {
        match self {
            Self::Python => &templates.python_url,
            Self::Bun => &templates.bun_url,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = CmsError;

    /// Parses a flavor name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flavor| flavor.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CmsError::InvalidFlavor {
                flavor: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("python".parse::<Flavor>().unwrap(), Flavor::Python);
        assert_eq!("Bun".parse::<Flavor>().unwrap(), Flavor::Bun);
        assert_eq!("PYTHON".parse::<Flavor>().unwrap(), Flavor::Python);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "ruby".parse::<Flavor>().unwrap_err();
        assert!(matches!(err, CmsError::InvalidFlavor { ref flavor } if flavor == "ruby"));
        assert!("".parse::<Flavor>().is_err());
    }

    #[test]
    fn source_url_follows_templates() {
        let templates = TemplateConfig {
            python_url: "http://py".to_string(),
            bun_url: "http://bun".to_string(),
        };
        assert_eq!(Flavor::Python.source_url(&templates), "http://py");
        assert_eq!(Flavor::Bun.source_url(&templates), "http://bun");
    }

    #[test]
    fn default_is_python() {
        assert_eq!(Flavor::default(), Flavor::Python);
        assert_eq!(Flavor::default().to_string(), "python");
    }
}
