//! Core type definitions for the NG word filter
//!
//! These types are shared by the parser, the adapters, the matcher and the
//! hide/reveal engine.

use std::fmt;

// =============================================================================
// Fields
// =============================================================================

/// Text category a rule can target inside a result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Site,
    Description,
}

impl Field {
    /// Evaluation order. First field match wins.
    pub const ALL: [Field; 3] = [Field::Title, Field::Site, Field::Description];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Site => "site",
            Field::Description => "desc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Field::Title),
            "site" => Some(Field::Site),
            "desc" | "description" => Some(Field::Description),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rule Options (bracket suffix of a block-list line)
// =============================================================================

bitflags::bitflags! {
    /// Options parsed from the trailing `[opt,opt]` suffix.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RuleOptions: u8 {
        /// Pattern is a regular expression
        const REGEX = 1 << 0;
        /// Do not test title text
        const NO_TITLE = 1 << 1;
        /// Do not test site / source text
        const NO_SITE = 1 << 2;
        /// Do not test description text
        const NO_DESC = 1 << 3;
    }
}

impl RuleOptions {
    /// Parse one option name. Unknown names yield None and are ignored by the parser.
    pub fn from_option(name: &str) -> Option<Self> {
        match name {
            "regex" => Some(Self::REGEX),
            "notitle" => Some(Self::NO_TITLE),
            "nosite" => Some(Self::NO_SITE),
            "nodesc" => Some(Self::NO_DESC),
            _ => None,
        }
    }

    /// Option names in persisted order.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::NO_TITLE) {
            names.push("notitle");
        }
        if self.contains(Self::NO_SITE) {
            names.push("nosite");
        }
        if self.contains(Self::NO_DESC) {
            names.push("nodesc");
        }
        if self.contains(Self::REGEX) {
            names.push("regex");
        }
        names
    }

    /// Whether text of `field` is excluded from matching.
    pub fn suppresses(self, field: Field) -> bool {
        match field {
            Field::Title => self.contains(Self::NO_TITLE),
            Field::Site => self.contains(Self::NO_SITE),
            Field::Description => self.contains(Self::NO_DESC),
        }
    }
}

// =============================================================================
// Sites and Page Types
// =============================================================================

/// Search engine the page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteType {
    Bing,
    Google,
}

impl SiteType {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteType::Bing => "bing",
            SiteType::Google => "google",
        }
    }
}

/// Result page flavour, derived from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    BingMain,
    BingImage,
    BingVideo,
    BingNews,
    BingShop,
    GoogleMain,
    GoogleVideo,
    GoogleNews,
    GoogleImage,
    GoogleShop,
    GoogleNewsSite,
}

impl PageType {
    pub fn site(self) -> SiteType {
        match self {
            PageType::BingMain
            | PageType::BingImage
            | PageType::BingVideo
            | PageType::BingNews
            | PageType::BingShop => SiteType::Bing,
            _ => SiteType::Google,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageType::BingMain => "bing-main",
            PageType::BingImage => "bing-image",
            PageType::BingVideo => "bing-video",
            PageType::BingNews => "bing-news",
            PageType::BingShop => "bing-shop",
            PageType::GoogleMain => "google-main",
            PageType::GoogleVideo => "google-video",
            PageType::GoogleNews => "google-news",
            PageType::GoogleImage => "google-image",
            PageType::GoogleShop => "google-shop",
            PageType::GoogleNewsSite => "google-news-site",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Card State
// =============================================================================

/// Observable state of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardState {
    Visible,
    /// Visible and evaluated clean during the last pass
    Checked,
    /// Hidden by the listed rule lines
    Hidden(Vec<String>),
}

impl CardState {
    pub fn is_hidden(&self) -> bool {
        matches!(self, CardState::Hidden(_))
    }
}

/// Result of a hide request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideOutcome {
    /// Card entered Hidden
    Hidden,
    /// Word added to an already hidden card
    Merged,
    /// Word was already recorded
    Unchanged,
    /// Target lies inside page chrome
    Refused,
}
