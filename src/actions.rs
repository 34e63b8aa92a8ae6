//! Player commands and the semantic action IDs the UI binds to them.
//!
//! A UI registers each clickable element with one of the IDs below and hands
//! it back on click; `Command::from_action_id` turns it into a command for
//! `VibeGame::handle_command`. Range-based IDs add an index to a base.

use crate::catalog::{BuildingId, MarketItemId, VeggieId};
use crate::effects::{BoundingBox, ScreenPoint};

// ── Core actions ────────────────────────────────────────────────
pub const CLICK_VIBE: u16 = 0;
pub const CONVERT_ALL: u16 = 1;
pub const RESET_GAME: u16 = 2;

// ── Shop (index into BuildingId::all()) ─────────────────────────
pub const BUY_BUILDING_BASE: u16 = 100;

// ── Farm plots (plot id) ────────────────────────────────────────
pub const PLANT_BASE: u16 = 200;
pub const HARVEST_BASE: u16 = 300;

// ── Farm market (index into MarketItemId::all()) ────────────────
pub const BUY_MARKET_BASE: u16 = 400;

// ── Veggies (index into VeggieId::all()) ────────────────────────
pub const CONVERT_VEGGIE_BASE: u16 = 500;
pub const UNLOCK_VEGGIE_BASE: u16 = 600;
pub const SELECT_VEGGIE_BASE: u16 = 700;

/// Width of each ID range.
const RANGE: u16 = 100;

/// One player intent.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Click {
        pointer: Option<ScreenPoint>,
    },
    BuyBuilding(BuildingId),
    /// Plant the currently selected veggie.
    Plant {
        plot: usize,
    },
    Harvest {
        plot: usize,
        pointer: Option<ScreenPoint>,
        element: Option<BoundingBox>,
    },
    BuyMarketItem(MarketItemId),
    ConvertVeggie(VeggieId),
    ConvertAll,
    UnlockVeggie(VeggieId),
    SelectVeggie(VeggieId),
    Reset,
}

impl Command {
    /// Map a registered click target back to its command.
    pub fn from_action_id(id: u16) -> Option<Command> {
        match id {
            CLICK_VIBE => return Some(Command::Click { pointer: None }),
            CONVERT_ALL => return Some(Command::ConvertAll),
            RESET_GAME => return Some(Command::Reset),
            _ => {}
        }
        let base = id - id % RANGE;
        let index = (id % RANGE) as usize;
        match base {
            BUY_BUILDING_BASE => BuildingId::all()
                .get(index)
                .map(|b| Command::BuyBuilding(*b)),
            PLANT_BASE => Some(Command::Plant { plot: index }),
            HARVEST_BASE => Some(Command::Harvest {
                plot: index,
                pointer: None,
                element: None,
            }),
            BUY_MARKET_BASE => MarketItemId::all()
                .get(index)
                .map(|m| Command::BuyMarketItem(*m)),
            CONVERT_VEGGIE_BASE => VeggieId::all()
                .get(index)
                .map(|v| Command::ConvertVeggie(*v)),
            UNLOCK_VEGGIE_BASE => VeggieId::all()
                .get(index)
                .map(|v| Command::UnlockVeggie(*v)),
            SELECT_VEGGIE_BASE => VeggieId::all()
                .get(index)
                .map(|v| Command::SelectVeggie(*v)),
            _ => None,
        }
    }

    /// Keyboard shortcuts: space clicks, digits buy buildings in shop order,
    /// `f` runs the factory.
    pub fn from_key(key: char) -> Option<Command> {
        match key {
            ' ' | 'c' => Some(Command::Click { pointer: None }),
            'f' => Some(Command::ConvertAll),
            '1'..='9' => {
                let index = key as usize - '1' as usize;
                BuildingId::all()
                    .get(index)
                    .map(|b| Command::BuyBuilding(*b))
            }
            '0' => BuildingId::all()
                .get(9)
                .map(|b| Command::BuyBuilding(*b)),
            _ => None,
        }
    }
}

/// Click-target ID for buying `building`.
pub fn buy_building_id(building: BuildingId) -> u16 {
    BUY_BUILDING_BASE + index_of(BuildingId::all(), &building)
}

/// Click-target ID for buying `item`.
pub fn buy_market_id(item: MarketItemId) -> u16 {
    BUY_MARKET_BASE + index_of(MarketItemId::all(), &item)
}

fn index_of<T: PartialEq>(all: &[T], value: &T) -> u16 {
    all.iter().position(|v| v == value).unwrap_or(0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_ids() {
        assert_eq!(
            Command::from_action_id(CLICK_VIBE),
            Some(Command::Click { pointer: None })
        );
        assert_eq!(Command::from_action_id(CONVERT_ALL), Some(Command::ConvertAll));
        assert_eq!(Command::from_action_id(RESET_GAME), Some(Command::Reset));
        assert_eq!(Command::from_action_id(3), None);
    }

    #[test]
    fn building_ids_roundtrip() {
        for b in BuildingId::all() {
            assert_eq!(
                Command::from_action_id(buy_building_id(*b)),
                Some(Command::BuyBuilding(*b))
            );
        }
        assert_eq!(Command::from_action_id(BUY_BUILDING_BASE + 99), None);
    }

    #[test]
    fn market_ids_roundtrip() {
        for m in MarketItemId::all() {
            assert_eq!(
                Command::from_action_id(buy_market_id(*m)),
                Some(Command::BuyMarketItem(*m))
            );
        }
    }

    #[test]
    fn plot_ids() {
        assert_eq!(
            Command::from_action_id(PLANT_BASE + 4),
            Some(Command::Plant { plot: 4 })
        );
        assert_eq!(
            Command::from_action_id(HARVEST_BASE + 14),
            Some(Command::Harvest {
                plot: 14,
                pointer: None,
                element: None
            })
        );
    }

    #[test]
    fn veggie_ids() {
        assert_eq!(
            Command::from_action_id(UNLOCK_VEGGIE_BASE + 1),
            Some(Command::UnlockVeggie(VeggieId::Tomato))
        );
        assert_eq!(
            Command::from_action_id(SELECT_VEGGIE_BASE + 2),
            Some(Command::SelectVeggie(VeggieId::Corn))
        );
        assert_eq!(
            Command::from_action_id(CONVERT_VEGGIE_BASE),
            Some(Command::ConvertVeggie(VeggieId::Carrot))
        );
        assert_eq!(Command::from_action_id(UNLOCK_VEGGIE_BASE + 3), None);
    }

    #[test]
    fn unknown_range() {
        assert_eq!(Command::from_action_id(950), None);
        assert_eq!(Command::from_action_id(u16::MAX), None);
    }

    #[test]
    fn keys() {
        assert_eq!(
            Command::from_key('1'),
            Some(Command::BuyBuilding(BuildingId::Cursor))
        );
        assert_eq!(
            Command::from_key('0'),
            Some(Command::BuyBuilding(BuildingId::Portal))
        );
        assert_eq!(Command::from_key('f'), Some(Command::ConvertAll));
        assert_eq!(Command::from_key('x'), None);
    }
}
