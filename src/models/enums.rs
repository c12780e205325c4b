use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate an ordered enum with as_str + std::str::FromStr pattern.
/// Variants are declared lowest-first; the derived `Ord` follows that order.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Severity tier of a diagnosis. MILD < MODERATE < CRITICAL.
str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Critical => "critical",
});

// Kinds of precomputed artifacts held in the recency cache.
str_enum!(CachedArtifact {
    UserSummary => "user_summary",
});

impl Severity {
    /// All tiers, least urgent first.
    pub const ALL: [Severity; 3] = [Severity::Mild, Severity::Moderate, Severity::Critical];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn severity_round_trip() {
        for (variant, s) in [
            (Severity::Mild, "mild"),
            (Severity::Moderate, "moderate"),
            (Severity::Critical, "critical"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Severity::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn severity_orders_critical_highest() {
        assert!(Severity::Mild < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Critical);
        assert_eq!(Severity::ALL.iter().max(), Some(&Severity::Critical));
    }

    #[test]
    fn invalid_severity_rejected() {
        let err = Severity::from_str("severe").unwrap_err();
        match err {
            ModelError::InvalidEnum { field, value } => {
                assert_eq!(field, "Severity");
                assert_eq!(value, "severe");
            }
            other => panic!("Expected InvalidEnum, got: {other}"),
        }
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn artifact_display_matches_as_str() {
        assert_eq!(CachedArtifact::UserSummary.to_string(), "user_summary");
    }
}
