use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AliasError {
    #[error("Failed to parse alias table: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid alias pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
}

/// One family of provider spellings collapsed onto a canonical name.
struct AliasFamily {
    pattern: Regex,
    canonical: String,
}

/// Maps the many spellings OCR and extraction produce for a provider onto
/// one canonical name. Matching is a case-insensitive substring search, so
/// "ADANI Power" and "adan electric" both land on "Adani Electricity".
pub struct ProviderAliases {
    families: Vec<AliasFamily>,
}

#[derive(Debug, Deserialize)]
struct AliasRule {
    pattern: String,
    canonical: String,
}

#[derive(Debug, Deserialize)]
struct AliasFile {
    #[serde(default)]
    alias: Vec<AliasRule>,
}

impl Default for ProviderAliases {
    fn default() -> Self {
        // Built-in family observed in the field: any "adan" fragment is the
        // same provider mangled by OCR.
        ProviderAliases {
            families: vec![AliasFamily {
                pattern: Regex::new("(?i)adan").expect("invalid built-in alias pattern"),
                canonical: "Adani Electricity".to_string(),
            }],
        }
    }
}

impl ProviderAliases {
    /// Extend the built-in table with `[[alias]]` entries from a TOML
    /// document. User entries are checked before the built-ins.
    pub fn from_toml(toml_content: &str) -> Result<Self, AliasError> {
        let file: AliasFile = toml::from_str(toml_content)?;
        let mut families = Vec::with_capacity(file.alias.len());
        for rule in file.alias {
            let pattern = Regex::new(&format!("(?i){}", rule.pattern)).map_err(|source| {
                AliasError::Pattern {
                    pattern: rule.pattern.clone(),
                    source,
                }
            })?;
            families.push(AliasFamily {
                pattern,
                canonical: rule.canonical,
            });
        }
        families.extend(ProviderAliases::default().families);
        Ok(ProviderAliases { families })
    }

    /// Canonicalize a provider name: alias families win, anything else is
    /// returned trimmed. Empty input stays empty.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        for family in &self.families {
            if family.pattern.is_match(trimmed) {
                return family.canonical.clone();
            }
        }
        trimmed.to_string()
    }
}
