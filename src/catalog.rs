/// Static game data: buildings, farm market, vegetables and ranks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kinds of buildings (passive vibe producers).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingId {
    Cursor,
    Grandma,
    Groupchat,
    Influencer,
    Clown,
    Botfarm,
    GardenPatch,
    Rocket,
    Satellite,
    Portal,
}

impl BuildingId {
    /// All buildings in shop order.
    pub fn all() -> &'static [BuildingId] {
        &[
            BuildingId::Cursor,
            BuildingId::Grandma,
            BuildingId::Groupchat,
            BuildingId::Influencer,
            BuildingId::Clown,
            BuildingId::Botfarm,
            BuildingId::GardenPatch,
            BuildingId::Rocket,
            BuildingId::Satellite,
            BuildingId::Portal,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildingId::Cursor => "cursor",
            BuildingId::Grandma => "grandma",
            BuildingId::Groupchat => "groupchat",
            BuildingId::Influencer => "influencer",
            BuildingId::Clown => "clown",
            BuildingId::Botfarm => "botfarm",
            BuildingId::GardenPatch => "garden_patch",
            BuildingId::Rocket => "rocket",
            BuildingId::Satellite => "satellite",
            BuildingId::Portal => "portal",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildingId::Cursor => "Cursor",
            BuildingId::Grandma => "Grandma",
            BuildingId::Groupchat => "Group Chat",
            BuildingId::Influencer => "Influencer",
            BuildingId::Clown => "Clown",
            BuildingId::Botfarm => "Bot Farm",
            BuildingId::GardenPatch => "Garden Patch",
            BuildingId::Rocket => "Rocket",
            BuildingId::Satellite => "Satellite",
            BuildingId::Portal => "Portal",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            BuildingId::Cursor => "👆",
            BuildingId::Grandma => "👵",
            BuildingId::Groupchat => "💬",
            BuildingId::Influencer => "🤳",
            BuildingId::Clown => "🤡",
            BuildingId::Botfarm => "🤖",
            BuildingId::GardenPatch => "🌱",
            BuildingId::Rocket => "🚀",
            BuildingId::Satellite => "🛰️",
            BuildingId::Portal => "🌀",
        }
    }

    /// Cost of the first unit.
    pub fn base_cost(&self) -> f64 {
        match self {
            BuildingId::Cursor => 15.0,
            BuildingId::Grandma => 100.0,
            BuildingId::Groupchat => 1_100.0,
            BuildingId::Influencer => 12_000.0,
            BuildingId::Clown => 130_000.0,
            BuildingId::Botfarm => 1_400_000.0,
            BuildingId::GardenPatch => 5_000.0,
            BuildingId::Rocket => 20_000_000.0,
            BuildingId::Satellite => 330_000_000.0,
            BuildingId::Portal => 5_100_000_000.0,
        }
    }

    /// Vibes per second per owned unit.
    pub fn base_prod(&self) -> f64 {
        match self {
            BuildingId::Cursor => 0.5,
            BuildingId::Grandma => 3.0,
            BuildingId::Groupchat => 8.0,
            BuildingId::Influencer => 47.0,
            BuildingId::Clown => 260.0,
            BuildingId::Botfarm => 1_400.0,
            BuildingId::GardenPatch => 20.0,
            BuildingId::Rocket => 7_800.0,
            BuildingId::Satellite => 44_000.0,
            BuildingId::Portal => 260_000.0,
        }
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildingId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildingId::all()
            .iter()
            .find(|b| b.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownId(s.to_string()))
    }
}

/// Vegetables that can be planted in a plot.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VeggieId {
    #[default]
    Carrot,
    Tomato,
    Corn,
}

impl VeggieId {
    pub fn all() -> &'static [VeggieId] {
        &[VeggieId::Carrot, VeggieId::Tomato, VeggieId::Corn]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VeggieId::Carrot => "carrot",
            VeggieId::Tomato => "tomato",
            VeggieId::Corn => "corn",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VeggieId::Carrot => "Carrot",
            VeggieId::Tomato => "Tomato",
            VeggieId::Corn => "Corn",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            VeggieId::Carrot => "🥕",
            VeggieId::Tomato => "🍅",
            VeggieId::Corn => "🌽",
        }
    }

    /// Base stock gained per harvest, before fertilizer.
    pub fn base_yield(&self) -> f64 {
        match self {
            VeggieId::Carrot => 240.0,
            VeggieId::Tomato => 300.0,
            VeggieId::Corn => 400.0,
        }
    }

    /// Bio-vibes per unit of stock when converted.
    pub fn factory_rate(&self) -> f64 {
        match self {
            VeggieId::Carrot => 0.5,
            VeggieId::Tomato => 0.6,
            VeggieId::Corn => 0.75,
        }
    }

    /// Bio-vibes needed to unlock. Carrot is unlocked from the start.
    pub fn unlock_cost(&self) -> f64 {
        match self {
            VeggieId::Carrot => 0.0,
            VeggieId::Tomato => 1_000.0,
            VeggieId::Corn => 5_000.0,
        }
    }

    /// The market item that halves this veggie's grow time.
    pub fn gmo_item(&self) -> MarketItemId {
        match self {
            VeggieId::Carrot => MarketItemId::GmoCarrot,
            VeggieId::Tomato => MarketItemId::GmoTomato,
            VeggieId::Corn => MarketItemId::GmoCorn,
        }
    }
}

impl fmt::Display for VeggieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VeggieId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VeggieId::all()
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownId(s.to_string()))
    }
}

/// Items sold at the farm market for bio-vibes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketItemId {
    Fertilizer,
    CursorFeed,
    GmoCarrot,
    GmoTomato,
    GmoCorn,
    Factory,
    Conveyor,
    ExtraPlot,
}

impl MarketItemId {
    pub fn all() -> &'static [MarketItemId] {
        &[
            MarketItemId::Fertilizer,
            MarketItemId::CursorFeed,
            MarketItemId::GmoCarrot,
            MarketItemId::GmoTomato,
            MarketItemId::GmoCorn,
            MarketItemId::Factory,
            MarketItemId::Conveyor,
            MarketItemId::ExtraPlot,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketItemId::Fertilizer => "fertilizer",
            MarketItemId::CursorFeed => "cursor_feed",
            MarketItemId::GmoCarrot => "gmo_carrot",
            MarketItemId::GmoTomato => "gmo_tomato",
            MarketItemId::GmoCorn => "gmo_corn",
            MarketItemId::Factory => "factory",
            MarketItemId::Conveyor => "conveyor",
            MarketItemId::ExtraPlot => "extra_plot",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MarketItemId::Fertilizer => "Fertilizer",
            MarketItemId::CursorFeed => "Cursor Feed",
            MarketItemId::GmoCarrot => "GMO Carrots",
            MarketItemId::GmoTomato => "GMO Tomatoes",
            MarketItemId::GmoCorn => "GMO Corn",
            MarketItemId::Factory => "Veggie Factory",
            MarketItemId::Conveyor => "Conveyor Belt",
            MarketItemId::ExtraPlot => "Extra Plot",
        }
    }

    /// Listed price in bio-vibes. `ExtraPlot` is priced dynamically by
    /// [`crate::economy::extra_plot_cost`]; this is its first-purchase price.
    pub fn cost(&self) -> f64 {
        match self {
            MarketItemId::Fertilizer => 10.0,
            MarketItemId::CursorFeed => 50.0,
            MarketItemId::GmoCarrot => 150.0,
            MarketItemId::GmoTomato => 400.0,
            MarketItemId::GmoCorn => 800.0,
            MarketItemId::Factory => 300.0,
            MarketItemId::Conveyor => 500.0,
            MarketItemId::ExtraPlot => 500.0,
        }
    }

    /// Stackable items can be bought repeatedly.
    pub fn stackable(&self) -> bool {
        matches!(
            self,
            MarketItemId::Fertilizer
                | MarketItemId::CursorFeed
                | MarketItemId::Conveyor
                | MarketItemId::ExtraPlot
        )
    }
}

impl fmt::Display for MarketItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketItemId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketItemId::all()
            .iter()
            .find(|i| i.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownId(s.to_string()))
    }
}

/// Returned when a catalog id string does not match any entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown catalog id `{0}`")]
pub struct UnknownId(pub String);

/// A milestone tier reached through lifetime vibes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rank {
    pub name: &'static str,
    pub threshold: f64,
}

/// Rank ladder, ascending by threshold. The first entry is always reached.
pub const RANKS: &[Rank] = &[
    Rank { name: "Lurker", threshold: 0.0 },
    Rank { name: "Poster", threshold: 1_000.0 },
    Rank { name: "Main Character", threshold: 10_000.0 },
    Rank { name: "Trendsetter", threshold: 100_000.0 },
    Rank { name: "Influencer", threshold: 1_000_000.0 },
    Rank { name: "Vibe Lord", threshold: 100_000_000.0 },
    Rank { name: "Cosmic Entity", threshold: 10_000_000_000.0 },
    Rank { name: "Ascended", threshold: 1_000_000_000_000.0 },
];

/// Plots every farm starts with.
pub const BASE_PLOTS: usize = 9;
/// Maximum number of extra plots that can be bought.
pub const MAX_EXTRA_PLOTS: u32 = 6;
/// Bio-vibes spent to plant any seed.
pub const PLANT_COST: f64 = 100.0;
/// Grow time in seconds without GMO.
pub const BASE_GROW_SECS: f64 = 10.0;
/// Bio-vibes granted when the farm is first unlocked.
pub const STARTER_BIO_VIBES: f64 = 100.0;
