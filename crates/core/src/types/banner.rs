//! Marketing banners and their scheduling rules.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::BannerId;

/// Where a banner renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerPosition {
    HomeHero,
    HomeMiddle,
    Sidebar,
    Popup,
    CategoryTop,
    /// A placement this client does not know. Never selected for display.
    #[serde(other)]
    Unknown,
}

impl BannerPosition {
    pub const ALL: [Self; 5] = [
        Self::HomeHero,
        Self::HomeMiddle,
        Self::Sidebar,
        Self::Popup,
        Self::CategoryTop,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HomeHero => "home_hero",
            Self::HomeMiddle => "home_middle",
            Self::Sidebar => "sidebar",
            Self::Popup => "popup",
            Self::CategoryTop => "category_top",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BannerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BannerPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("invalid banner position: {s}"))
    }
}

/// Visual style of a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BannerType {
    #[default]
    Image,
    Text,
    Promotion,
}

impl fmt::Display for BannerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Text => write!(f, "text"),
            Self::Promotion => write!(f, "promotion"),
        }
    }
}

impl std::str::FromStr for BannerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "text" => Ok(Self::Text),
            "promotion" => Ok(Self::Promotion),
            _ => Err(format!("invalid banner type: {s}")),
        }
    }
}

/// A scheduled marketing placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(alias = "_id")]
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    pub position: BannerPosition,
    #[serde(default, rename = "type")]
    pub banner_type: BannerType,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl Banner {
    /// Active and inside its date range.
    #[must_use]
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.is_none_or(|start| now >= start)
            && self.end_date.is_none_or(|end| now <= end)
    }

    /// Every visible banner with a known placement, ordered by `display_order`.
    #[must_use]
    pub fn visible(banners: &[Self], now: DateTime<Utc>) -> Vec<&Self> {
        let mut selected: Vec<&Self> = banners
            .iter()
            .filter(|b| b.position != BannerPosition::Unknown && b.is_visible_at(now))
            .collect();
        selected.sort_by_key(|b| b.display_order);
        selected
    }

    /// Visible banners for one placement, ordered by `display_order`.
    #[must_use]
    pub fn select_for(banners: &[Self], position: BannerPosition, now: DateTime<Utc>) -> Vec<&Self> {
        if position == BannerPosition::Unknown {
            return Vec::new();
        }
        let mut selected: Vec<&Self> = banners
            .iter()
            .filter(|b| b.position == position && b.is_visible_at(now))
            .collect();
        selected.sort_by_key(|b| b.display_order);
        selected
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn banner(id: &str, position: BannerPosition, order: i32) -> Banner {
        Banner {
            id: BannerId::new(id),
            title: id.to_string(),
            subtitle: None,
            image_url: None,
            link: None,
            position,
            banner_type: BannerType::Image,
            background_color: None,
            text_color: None,
            start_date: None,
            end_date: None,
            display_order: order,
            is_active: true,
        }
    }

    #[test]
    fn test_visibility_window() {
        let now = Utc::now();
        let mut b = banner("b1", BannerPosition::HomeHero, 0);
        assert!(b.is_visible_at(now));

        b.end_date = Some(now - Duration::minutes(1));
        assert!(!b.is_visible_at(now));

        b.end_date = None;
        b.is_active = false;
        assert!(!b.is_visible_at(now));
    }

    #[test]
    fn test_select_for_position_sorted() {
        let now = Utc::now();
        let mut hidden = banner("late", BannerPosition::HomeHero, 0);
        hidden.start_date = Some(now + Duration::days(1));

        let banners = vec![
            banner("second", BannerPosition::HomeHero, 2),
            banner("side", BannerPosition::Sidebar, 0),
            banner("first", BannerPosition::HomeHero, 1),
            hidden,
        ];

        let selected = Banner::select_for(&banners, BannerPosition::HomeHero, now);
        let ids: Vec<&str> = selected.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_unknown_position_decodes_but_is_never_shown() {
        let banners: Vec<Banner> = serde_json::from_value(serde_json::json!([
            {"_id": "b1", "title": "Mới", "position": "footer_strip"},
            {"_id": "b2", "title": "Combo", "position": "home_hero"}
        ]))
        .unwrap();
        assert_eq!(banners[0].position, BannerPosition::Unknown);

        let shown = Banner::visible(&banners, Utc::now());
        let titles: Vec<&str> = shown.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Combo"]);
        assert!("unknown".parse::<BannerPosition>().is_err());
    }

    #[test]
    fn test_position_round_trip_str() {
        for position in BannerPosition::ALL {
            assert_eq!(position.as_str().parse::<BannerPosition>(), Ok(position));
        }
    }
}
