//! Attire, background and enhancement options.

use crate::error::HeadshotError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the subject should be wearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Attire {
    /// Dark tailored suit with shirt and tie.
    #[default]
    BusinessSuit,
    /// Blazer over an open-collar shirt.
    Blazer,
    /// Smart casual shirt or sweater.
    BusinessCasual,
    /// Dark fitted turtleneck.
    Turtleneck,
    /// Clean medical scrubs.
    MedicalScrubs,
}

impl Attire {
    /// All attire options, in display order.
    pub const ALL: [Attire; 5] = [
        Self::BusinessSuit,
        Self::Blazer,
        Self::BusinessCasual,
        Self::Turtleneck,
        Self::MedicalScrubs,
    ];

    /// Stable label, as used on the wire and in the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessSuit => "business-suit",
            Self::Blazer => "blazer",
            Self::BusinessCasual => "business-casual",
            Self::Turtleneck => "turtleneck",
            Self::MedicalScrubs => "medical-scrubs",
        }
    }

    /// Phrase describing the clothing for the model.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BusinessSuit => "a well-fitted dark business suit with a crisp shirt and tie",
            Self::Blazer => "a tailored blazer over an open-collar shirt",
            Self::BusinessCasual => "a smart business-casual shirt",
            Self::Turtleneck => "a fitted dark turtleneck sweater",
            Self::MedicalScrubs => "clean, professional medical scrubs",
        }
    }
}

/// What appears behind the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Background {
    /// Softly blurred modern office.
    #[default]
    Office,
    /// Neutral gray studio backdrop.
    StudioGray,
    /// Plain white studio backdrop.
    StudioWhite,
    /// Blurred outdoor greenery.
    Outdoor,
    /// Blurred bookshelf.
    Bookshelf,
}

impl Background {
    /// All background options, in display order.
    pub const ALL: [Background; 5] = [
        Self::Office,
        Self::StudioGray,
        Self::StudioWhite,
        Self::Outdoor,
        Self::Bookshelf,
    ];

    /// Stable label, as used on the wire and in the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::StudioGray => "studio-gray",
            Self::StudioWhite => "studio-white",
            Self::Outdoor => "outdoor",
            Self::Bookshelf => "bookshelf",
        }
    }

    /// Phrase describing the backdrop for the model.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Office => "a softly blurred modern office interior",
            Self::StudioGray => "a seamless neutral gray studio backdrop",
            Self::StudioWhite => "a clean white studio backdrop",
            Self::Outdoor => "softly blurred outdoor greenery in natural daylight",
            Self::Bookshelf => "a softly blurred wooden bookshelf",
        }
    }
}

macro_rules! impl_label {
    ($ty:ty, $kind:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = HeadshotError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase().replace('_', "-");
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| {
                        let known: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        HeadshotError::InvalidRequest(format!(
                            "unknown {} '{}' (expected one of: {})",
                            $kind,
                            s,
                            known.join(", ")
                        ))
                    })
            }
        }
    };
}

impl_label!(Attire, "attire");
impl_label!(Background, "background");

/// User-selected style parameters, read once when generation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleOptions {
    /// Clothing.
    pub attire: Attire,
    /// Backdrop.
    pub background: Background,
    /// Ask for extra retouching (skin, lighting, sharpness).
    pub enhanced: bool,
}

impl StyleOptions {
    /// Creates options with the given attire and background, unenhanced.
    pub fn new(attire: Attire, background: Background) -> Self {
        Self {
            attire,
            background,
            enhanced: false,
        }
    }

    /// Sets the attire.
    pub fn with_attire(mut self, attire: Attire) -> Self {
        self.attire = attire;
        self
    }

    /// Sets the background.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Enables or disables enhancement.
    pub fn with_enhanced(mut self, enhanced: bool) -> Self {
        self.enhanced = enhanced;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for attire in Attire::ALL {
            assert_eq!(attire.as_str().parse::<Attire>().unwrap(), attire);
        }
        for background in Background::ALL {
            assert_eq!(background.as_str().parse::<Background>().unwrap(), background);
        }
    }

    #[test]
    fn test_from_str_is_forgiving_about_case_and_underscores() {
        assert_eq!("Business_Suit".parse::<Attire>().unwrap(), Attire::BusinessSuit);
        assert_eq!(" studio_gray ".parse::<Background>().unwrap(), Background::StudioGray);
    }

    #[test]
    fn test_unknown_label_lists_choices() {
        let err = "tuxedo".parse::<Attire>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown attire 'tuxedo'"));
        assert!(msg.contains("business-suit"));
    }

    #[test]
    fn test_serde_uses_labels() {
        let opts = StyleOptions::new(Attire::MedicalScrubs, Background::StudioWhite)
            .with_enhanced(true);
        let json = serde_json::to_value(opts).unwrap();
        assert_eq!(json["attire"], "medical-scrubs");
        assert_eq!(json["background"], "studio-white");
        assert_eq!(json["enhanced"], true);
    }

    #[test]
    fn test_defaults() {
        let opts = StyleOptions::default();
        assert_eq!(opts.attire, Attire::BusinessSuit);
        assert_eq!(opts.background, Background::Office);
        assert!(!opts.enhanced);
    }
}
