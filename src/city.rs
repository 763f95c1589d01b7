use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// World dimensions, in cells. The snapshot wire format depends on these.
pub const WORLD_W: usize = 120;
pub const WORLD_H: usize = 100;

/// The editing tools a participant can apply to their city. Codes 0..=19;
/// anything else is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditingTool {
    Residential,
    Commercial,
    Industrial,
    FireStation,
    PoliceStation,
    Query,
    Wire,
    Bulldozer,
    Railroad,
    Road,
    Stadium,
    Park,
    Seaport,
    CoalPower,
    NuclearPower,
    Airport,
    Network,
    Water,
    Land,
    Forest,
}

impl EditingTool {
    pub fn from_code(code: i64) -> Option<Self> {
        let tool = match code {
            0 => Self::Residential,
            1 => Self::Commercial,
            2 => Self::Industrial,
            3 => Self::FireStation,
            4 => Self::PoliceStation,
            5 => Self::Query,
            6 => Self::Wire,
            7 => Self::Bulldozer,
            8 => Self::Railroad,
            9 => Self::Road,
            10 => Self::Stadium,
            11 => Self::Park,
            12 => Self::Seaport,
            13 => Self::CoalPower,
            14 => Self::NuclearPower,
            15 => Self::Airport,
            16 => Self::Network,
            17 => Self::Water,
            18 => Self::Land,
            19 => Self::Forest,
            _ => return None,
        };
        Some(tool)
    }

    /// Base tile value the tool stamps onto the map. Query inspects without
    /// drawing anything.
    pub fn tile_code(&self) -> u16 {
        match self {
            Self::Residential => 240,
            Self::Commercial => 423,
            Self::Industrial => 612,
            Self::FireStation => 761,
            Self::PoliceStation => 770,
            Self::Query => 0,
            Self::Wire => 208,
            Self::Bulldozer => 0,
            Self::Railroad => 224,
            Self::Road => 64,
            Self::Stadium => 779,
            Self::Park => 840,
            Self::Seaport => 693,
            Self::CoalPower => 745,
            Self::NuclearPower => 811,
            Self::Airport => 709,
            Self::Network => 948,
            Self::Water => 2,
            Self::Land => 0,
            Self::Forest => 21,
        }
    }
}

/// Capability interface over one participant's simulated city. The rollup
/// core only ever creates a city, applies a tool, and reads the grid back;
/// any simulation honoring that contract is substitutable.
pub trait CityEngine: Default {
    fn apply_tool(&mut self, tool: EditingTool, x: i32, y: i32);

    /// Full observable map, flattened with the outer loop over x and the
    /// inner loop over y.
    fn snapshot_grid(&self) -> Vec<u16>;
}

/// The concrete simulation shipped with the node: a fixed-size tile grid,
/// default-initialized to open land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCity {
    tiles: Vec<u16>,
}

impl Default for GridCity {
    fn default() -> Self {
        Self {
            tiles: vec![0; WORLD_W * WORLD_H],
        }
    }
}

impl GridCity {
    pub fn get_tile(&self, x: usize, y: usize) -> u16 {
        self.tiles[x * WORLD_H + y]
    }
}

impl CityEngine for GridCity {
    fn apply_tool(&mut self, tool: EditingTool, x: i32, y: i32) {
        if tool == EditingTool::Query {
            return;
        }
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x >= WORLD_W || y >= WORLD_H {
            return;
        }
        self.tiles[x * WORLD_H + y] = tool.tile_code();
    }

    fn snapshot_grid(&self) -> Vec<u16> {
        // tiles are stored x-major, so storage order is snapshot order
        self.tiles.clone()
    }
}

/// Owns every participant's city, keyed by sender address text. Entries are
/// created lazily and never evicted, so the map only grows.
pub struct CityRegistry<E> {
    cities: HashMap<String, E>,
}

impl<E: CityEngine> CityRegistry<E> {
    pub fn new() -> Self {
        Self {
            cities: HashMap::new(),
        }
    }

    pub fn get_or_create(&mut self, identity: &str) -> &mut E {
        self.cities.entry(identity.to_string()).or_default()
    }

    pub fn exists(&self, identity: &str) -> bool {
        self.cities.contains_key(identity)
    }

    pub fn get(&self, identity: &str) -> Option<&E> {
        self.cities.get(identity)
    }

    pub fn get_mut(&mut self, identity: &str) -> Option<&mut E> {
        self.cities.get_mut(identity)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl<E: CityEngine> Default for CityRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
