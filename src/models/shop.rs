use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopItemKind {
    Frame,
    Background,
    Theme,
}

impl ShopItemKind {
    /// Profile column holding the equipped item of this kind.
    pub fn column(&self) -> &'static str {
        match self {
            ShopItemKind::Frame => "equipped_frame",
            ShopItemKind::Background => "equipped_background",
            ShopItemKind::Theme => "equipped_theme",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ShopItemKind,
    pub price: i64,
    pub preview: &'static str,
}

pub const SHOP_ITEMS: &[ShopItem] = &[
    ShopItem {
        id: "frame-stars",
        name: "Starry Frame",
        kind: ShopItemKind::Frame,
        price: 30,
        preview: "⭐",
    },
    ShopItem {
        id: "frame-flowers",
        name: "Flower Crown Frame",
        kind: ShopItemKind::Frame,
        price: 40,
        preview: "🌸",
    },
    ShopItem {
        id: "frame-rainbow",
        name: "Rainbow Frame",
        kind: ShopItemKind::Frame,
        price: 80,
        preview: "🌈",
    },
    ShopItem {
        id: "bg-forest",
        name: "Cozy Forest Room",
        kind: ShopItemKind::Background,
        price: 50,
        preview: "🌲",
    },
    ShopItem {
        id: "bg-ocean",
        name: "Underwater Room",
        kind: ShopItemKind::Background,
        price: 60,
        preview: "🌊",
    },
    ShopItem {
        id: "bg-space",
        name: "Space Station Room",
        kind: ShopItemKind::Background,
        price: 100,
        preview: "🚀",
    },
    ShopItem {
        id: "theme-sunny",
        name: "Sunny Theme",
        kind: ShopItemKind::Theme,
        price: 25,
        preview: "☀️",
    },
    ShopItem {
        id: "theme-night",
        name: "Night Sky Theme",
        kind: ShopItemKind::Theme,
        price: 45,
        preview: "🌙",
    },
];

pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    SHOP_ITEMS.iter().find(|i| i.id == id)
}
