//! Per-user UI preferences.
//!
//! The schema is closed: every setting is an explicit field with a validated
//! type, and updates can only touch those fields.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a settings enum stored as text, with its wire/database spelling.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::InvalidInput(
                        stringify!($name).to_string(),
                        format!("unknown value '{}'", other),
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Light/dark mode.
    Theme {
        Light => "light",
        Dark => "dark",
        System => "system",
    }
);

text_enum!(
    /// Accent colour theme, by CSS class.
    ColorTheme {
        Blue => "theme-blue",
        DarkBlue => "theme-dark-blue",
        Green => "theme-green",
        Red => "theme-red",
        Rose => "theme-rose",
        Violet => "theme-violet",
        Orange => "theme-orange",
        Yellow => "theme-yellow",
        Slate => "theme-slate",
    }
);

text_enum!(
    /// The date-range preset last picked in the table filter.
    FilterRange {
        Today => "today",
        Yesterday => "yesterday",
        Last7Days => "last_7_days",
        ThisMonth => "this_month",
        LastMonth => "last_month",
    }
);

impl Default for Theme {
    fn default() -> Self {
        Theme::System
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        ColorTheme::Blue
    }
}

impl Default for FilterRange {
    fn default() -> Self {
        FilterRange::Today
    }
}

/// Base font size in pixels, limited to a readable range. Serialized as `"16px"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FontSize(u8);

impl FontSize {
    pub const MIN: u8 = 12;
    pub const MAX: u8 = 24;

    pub fn new(px: u8) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&px) {
            Ok(Self(px))
        } else {
            Err(CoreError::InvalidInput(
                "font_size".to_string(),
                format!("{}px is outside {}-{}px", px, Self::MIN, Self::MAX),
            ))
        }
    }

    pub fn px(self) -> u8 {
        self.0
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self(16)
    }
}

impl FromStr for FontSize {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches("px");
        let px = digits.parse::<u8>().map_err(|_| {
            CoreError::InvalidInput("font_size".to_string(), format!("'{}' is not a pixel size", s))
        })?;
        Self::new(px)
    }
}

impl TryFrom<String> for FontSize {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FontSize> for String {
    fn from(size: FontSize) -> Self {
        format!("{}px", size.0)
    }
}

/// Background style CSS class, e.g. `bg-gradient-default`.
///
/// Only lowercase letters, digits and dashes after a `bg-` prefix are accepted.
pub fn validate_background_style(style: &str) -> Result<(), CoreError> {
    let valid = style.len() <= 64
        && style.starts_with("bg-")
        && style.len() > 3
        && style
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidInput(
            "background_style".to_string(),
            format!("'{}' is not a background style class", style),
        ))
    }
}

pub const DEFAULT_BACKGROUND_STYLE: &str = "bg-gradient-default";

/// A user's stored preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub sidebar_collapsed: bool,
    pub theme: Theme,
    pub color_theme: ColorTheme,
    pub last_filter_range: FilterRange,
    pub background_style: String,
    pub font_size: FontSize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            sidebar_collapsed: false,
            theme: Theme::default(),
            color_theme: ColorTheme::default(),
            last_filter_range: FilterRange::default(),
            background_style: DEFAULT_BACKGROUND_STYLE.to_string(),
            font_size: FontSize::default(),
        }
    }
}

/// A partial update. Absent fields keep their stored value; unknown fields are
/// rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSettingsUpdate {
    pub sidebar_collapsed: Option<bool>,
    pub theme: Option<Theme>,
    pub color_theme: Option<ColorTheme>,
    pub last_filter_range: Option<FilterRange>,
    pub background_style: Option<String>,
    pub font_size: Option<FontSize>,
}

impl UserSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::InvalidInput(
                "settings".to_string(),
                "no settings provided".to_string(),
            ));
        }
        if let Some(style) = &self.background_style {
            validate_background_style(style)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_rejects_unknown_fields() {
        let json = serde_json::json!({ "theme": "dark", "is_admin": true });
        assert!(serde_json::from_value::<UserSettingsUpdate>(json).is_err());
    }

    #[test]
    fn update_rejects_unknown_enum_values() {
        let json = serde_json::json!({ "color_theme": "theme-neon" });
        assert!(serde_json::from_value::<UserSettingsUpdate>(json).is_err());
    }

    #[test]
    fn empty_update_is_invalid() {
        let update: UserSettingsUpdate = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn font_size_is_bounded_and_round_trips_as_px() {
        let update: UserSettingsUpdate =
            serde_json::from_value(serde_json::json!({ "font_size": "18px" })).unwrap();
        assert_eq!(update.font_size.map(FontSize::px), Some(18));
        assert!(serde_json::from_value::<UserSettingsUpdate>(
            serde_json::json!({ "font_size": "40px" })
        )
        .is_err());
        assert_eq!(String::from(FontSize::default()), "16px");
    }

    #[test]
    fn background_style_must_be_a_bg_class() {
        assert!(validate_background_style("bg-gradient-ocean").is_ok());
        assert!(validate_background_style("bg-").is_err());
        assert!(validate_background_style("x; DROP TABLE users").is_err());
    }

    #[test]
    fn defaults_match_a_fresh_user_row() {
        let json = serde_json::to_value(UserSettings::default()).unwrap();
        assert_eq!(json["theme"], "system");
        assert_eq!(json["color_theme"], "theme-blue");
        assert_eq!(json["font_size"], "16px");
        assert_eq!(json["background_style"], DEFAULT_BACKGROUND_STYLE);
    }

    #[test]
    fn text_enums_parse_their_stored_spelling() {
        assert_eq!("theme-dark-blue".parse::<ColorTheme>().unwrap(), ColorTheme::DarkBlue);
        assert_eq!(FilterRange::Last7Days.as_str(), "last_7_days");
        assert!("sepia".parse::<Theme>().is_err());
    }
}
